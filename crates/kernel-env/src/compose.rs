//! Launch environment composition.
//!
//! Resolves the effective interpreter for a kernel launch, gathers activation
//! and custom variables from the injected services, merges everything with
//! [`merge`](crate::merge::merge), and decides whether user-site packages
//! should be suppressed. Composition never fails: any sub-resolution that
//! errors or comes back empty simply contributes nothing.

use std::path::Path;
use std::sync::Arc;

use log::{debug, info};

use crate::interpreter::{
    ActivationService, CustomEnvVarsProvider, InterpreterDetails, InterpreterService, KernelSpec,
};
use crate::merge::{merge, EnvMap};

/// Variable set to keep a private environment's kernel from importing the
/// user's global site-packages.
pub const PYTHON_NO_USER_SITE: &str = "PYTHONNOUSERSITE";

/// Snapshot the ambient process environment.
pub fn process_env() -> EnvMap {
    std::env::vars().collect()
}

/// Composes the full environment for a kernel launch.
pub struct KernelEnvironmentComposer {
    interpreters: Arc<dyn InterpreterService>,
    activation: Arc<dyn ActivationService>,
    custom_vars: Arc<dyn CustomEnvVarsProvider>,
}

impl KernelEnvironmentComposer {
    pub fn new(
        interpreters: Arc<dyn InterpreterService>,
        activation: Arc<dyn ActivationService>,
        custom_vars: Arc<dyn CustomEnvVarsProvider>,
    ) -> Self {
        KernelEnvironmentComposer {
            interpreters,
            activation,
            custom_vars,
        }
    }

    /// Build the launch environment for `kernel_spec`.
    ///
    /// The explicit `interpreter` wins; otherwise the interpreter recorded in
    /// the spec is resolved through the interpreter service. `base` is the
    /// ambient process environment (see [`process_env`]).
    pub async fn compose(
        &self,
        resource: Option<&Path>,
        interpreter: Option<&InterpreterDetails>,
        kernel_spec: &KernelSpec,
        base: &EnvMap,
    ) -> EnvMap {
        let effective = match interpreter {
            Some(details) => Some(details.clone()),
            None => match &kernel_spec.interpreter_path {
                Some(path) => self.interpreters.interpreter_details(path).await,
                None => None,
            },
        };

        let (activated, has_activation_commands) = match &effective {
            Some(details) => {
                let vars = self
                    .activation
                    .activated_environment_variables(resource, details, kernel_spec)
                    .await
                    .filter(|vars| !vars.is_empty());
                let has_commands = self
                    .activation
                    .has_activation_commands(resource, details)
                    .await;
                (vars, has_commands)
            }
            None => {
                debug!(
                    "no interpreter resolved for kernel spec {}, launching with base env",
                    kernel_spec.name
                );
                (None, false)
            }
        };

        let custom = self.custom_vars.custom_environment_variables(resource).await;
        let bin_dir = effective.as_ref().and_then(|d| d.bin_dir());

        let mut env = merge(Some(base), activated.as_ref(), custom.as_ref(), bin_dir)
            .unwrap_or_default();

        // Suppress user-site packages only when we are certain this is a
        // private environment: activation produced variables, activation
        // commands exist, and the environment kind isolates packages. Any
        // one condition failing leaves user-site visibility untouched.
        let suppress_user_site = activated.is_some()
            && has_activation_commands
            && effective
                .as_ref()
                .map(|d| d.kind.isolates_site_packages())
                .unwrap_or(false);
        if suppress_user_site {
            env.insert(PYTHON_NO_USER_SITE.to_string(), "True".to_string());
        }

        info!(
            "composed launch env for kernel {}: {} vars, activated={}, user_site_suppressed={}",
            kernel_spec.name,
            env.len(),
            activated.is_some(),
            suppress_user_site
        );

        env
    }
}
