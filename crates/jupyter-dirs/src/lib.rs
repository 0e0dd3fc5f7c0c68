//! Jupyter search path resolution.
//!
//! Computes the ordered list of Jupyter data directories and kernel-spec root
//! directories from OS conventions (`APPDATA`, XDG, `~/Library/Jupyter`),
//! environment overrides (`JUPYTER_PATH`, `JUPYTER_DATA_DIR`), and an
//! optional interpreter's install prefix. Order encodes precedence: the first
//! match wins in downstream consumers.
//!
//! All platform facts (OS family, home directory, environment variables,
//! directory probes) come in through the [`Platform`] trait, the kernel-spec
//! root list is cached through an explicit [`PathCache`] handle owned by the
//! caller, and the per-environment data directory probe shells out through a
//! [`PythonRunner`]. This keeps resolution idempotent and testable without a
//! live host.

pub mod cache;
pub mod cancel;
pub mod paths;
pub mod platform;
pub mod script;

// Re-export key types
pub use cache::{MemoryPathCache, PathCache};
pub use cancel::{CancelToken, Cancelled};
pub use paths::JupyterPathResolver;
pub use platform::{HostPlatform, OsFamily, Platform};
pub use script::{DataDirScriptRunner, PythonRunner};
