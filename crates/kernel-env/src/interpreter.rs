//! Interpreter metadata and the external services consumed during launch
//! composition.
//!
//! All three services are lookup-shaped: a miss (unknown interpreter, no
//! activation support, no user overrides) is `None`/`false`, never an error.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::merge::EnvMap;

/// The kind of Python environment an interpreter belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PythonEnvironmentKind {
    Global,
    System,
    Conda,
    VirtualEnv,
    Venv,
    Poetry,
    Pipenv,
    Unknown,
}

impl PythonEnvironmentKind {
    /// Whether this kind of environment isolates its site-packages from the
    /// user's global site directory. Global/System/Unknown do not.
    pub fn isolates_site_packages(&self) -> bool {
        matches!(
            self,
            PythonEnvironmentKind::Conda
                | PythonEnvironmentKind::VirtualEnv
                | PythonEnvironmentKind::Venv
                | PythonEnvironmentKind::Poetry
                | PythonEnvironmentKind::Pipenv
        )
    }
}

/// Metadata for a discovered interpreter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpreterDetails {
    /// Path to the interpreter executable.
    pub uri: PathBuf,
    pub kind: PythonEnvironmentKind,
    /// The environment's installation prefix (`sys.prefix`).
    pub sys_prefix: PathBuf,
}

impl InterpreterDetails {
    /// Directory containing the interpreter executable.
    pub fn bin_dir(&self) -> Option<&Path> {
        self.uri.parent()
    }
}

/// A declarative kernel descriptor: name, launch argv, display name, and the
/// interpreter recorded when the spec was registered (if any).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelSpec {
    pub name: String,
    pub display_name: String,
    pub argv: Vec<String>,
    /// Interpreter path recorded in the spec's metadata at registration time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpreter_path: Option<PathBuf>,
}

/// Interpreter discovery service.
#[async_trait]
pub trait InterpreterService: Send + Sync {
    /// Look up metadata for the interpreter at `path`. `None` when the
    /// interpreter is unknown or discovery failed.
    async fn interpreter_details(&self, path: &Path) -> Option<InterpreterDetails>;
}

/// Environment activation service.
#[async_trait]
pub trait ActivationService: Send + Sync {
    /// Variables produced by activating `interpreter`'s environment.
    /// `None` when activation failed or produced nothing.
    async fn activated_environment_variables(
        &self,
        resource: Option<&Path>,
        interpreter: &InterpreterDetails,
        kernel_spec: &KernelSpec,
    ) -> Option<EnvMap>;

    /// Whether activation commands are known for this interpreter.
    async fn has_activation_commands(
        &self,
        resource: Option<&Path>,
        interpreter: &InterpreterDetails,
    ) -> bool;
}

/// User-configured environment variable overrides (e.g. from an `.env` file).
#[async_trait]
pub trait CustomEnvVarsProvider: Send + Sync {
    async fn custom_environment_variables(&self, resource: Option<&Path>) -> Option<EnvMap>;
}
