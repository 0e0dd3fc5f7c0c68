//! Per-environment data directory probe.
//!
//! Python environments can carry their own Jupyter data directory
//! (`jupyter_core.paths.jupyter_data_dir()` resolved inside the
//! environment). A small bundled helper script prints that directory; this
//! module runs it with the target interpreter and captures the answer.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use kernel_env::InterpreterDetails;
use log::debug;

/// Runs the bundled data-dir helper script with a target interpreter.
#[async_trait]
pub trait PythonRunner: Send + Sync {
    /// The environment-specific Jupyter data directory reported by
    /// `interpreter`, `None` when the probe fails in any way.
    async fn env_data_dir(&self, interpreter: &InterpreterDetails) -> Option<PathBuf>;
}

/// Real runner: spawns `<interpreter> <script>` and reads the printed path.
pub struct DataDirScriptRunner {
    /// Absolute path to the bundled `print_jupyter_data_dir.py`.
    script_path: PathBuf,
}

impl DataDirScriptRunner {
    pub fn new(script_path: PathBuf) -> Self {
        DataDirScriptRunner { script_path }
    }

    async fn run(&self, interpreter: &Path) -> Result<PathBuf> {
        let output = tokio::process::Command::new(interpreter)
            .arg(&self.script_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await?;

        if !output.status.success() {
            return Err(anyhow!(
                "data dir helper exited with status {}",
                output.status
            ));
        }

        let printed = String::from_utf8(output.stdout)?;
        let printed = printed.trim();
        if printed.is_empty() {
            return Err(anyhow!("data dir helper printed nothing"));
        }
        Ok(PathBuf::from(printed))
    }
}

#[async_trait]
impl PythonRunner for DataDirScriptRunner {
    async fn env_data_dir(&self, interpreter: &InterpreterDetails) -> Option<PathBuf> {
        match self.run(&interpreter.uri).await {
            Ok(path) => Some(path),
            Err(e) => {
                debug!(
                    "env data dir probe failed for {}: {}",
                    interpreter.uri.display(),
                    e
                );
                None
            }
        }
    }
}
