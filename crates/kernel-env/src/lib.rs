//! Environment composition for kernel launches.
//!
//! This crate builds the process environment a kernel is launched with. It
//! layers three sources on top of the ambient process environment:
//!
//! - the interpreter's bin directory (prepended to PATH)
//! - activation variables produced by activating the interpreter's
//!   environment (conda/venv/poetry/pipenv)
//! - user-configured custom variables (highest precedence)
//!
//! PATH-like variables are joined rather than replaced, so no layer can
//! accidentally hide the others. All lookups (interpreter metadata,
//! activation variables, custom variables) go through injected service
//! traits; a failed lookup contributes nothing instead of failing the launch.
//!
//! ```ignore
//! use kernel_env::{KernelEnvironmentComposer, process_env};
//!
//! let composer = KernelEnvironmentComposer::new(interpreters, activation, custom);
//! let env = composer.compose(None, Some(&interpreter), &spec, &process_env()).await;
//! ```

pub mod compose;
pub mod interpreter;
pub mod merge;

// Re-export key types
pub use compose::{process_env, KernelEnvironmentComposer};
pub use interpreter::{
    ActivationService, CustomEnvVarsProvider, InterpreterDetails, InterpreterService, KernelSpec,
    PythonEnvironmentKind,
};
pub use merge::{merge, path_delimiter, EnvMap};
