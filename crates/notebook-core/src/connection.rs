//! Kernel connection descriptors.
//!
//! A connection is one of three kinds: launch a kernel for a bare Python
//! interpreter, launch from a registered kernel spec, or attach to an already
//! running kernel. Consumers match exhaustively on the kind; there is no
//! capability probing.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use kernel_env::{InterpreterDetails, KernelSpec};

/// How to reach a kernel for a notebook session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KernelConnection {
    /// Launch a fresh kernel directly against a Python interpreter.
    PythonInterpreter { interpreter: InterpreterDetails },
    /// Launch a fresh kernel from a registered kernel spec. The spec may pin
    /// an interpreter of its own.
    KernelSpec { spec: KernelSpec },
    /// Attach to a kernel that is already running elsewhere.
    LiveKernel {
        /// Path to the kernel's connection file (ports, key, transport).
        connection_file: PathBuf,
    },
}

impl KernelConnection {
    /// The interpreter this connection launches with, if launching one.
    /// A live kernel has no local interpreter to compose an environment for.
    pub fn interpreter_path(&self) -> Option<&Path> {
        match self {
            KernelConnection::PythonInterpreter { interpreter } => {
                Some(interpreter.uri.as_path())
            }
            KernelConnection::KernelSpec { spec } => spec.interpreter_path.as_deref(),
            KernelConnection::LiveKernel { .. } => None,
        }
    }

    /// Whether establishing this connection spawns a new kernel process.
    pub fn launches_process(&self) -> bool {
        match self {
            KernelConnection::PythonInterpreter { .. } => true,
            KernelConnection::KernelSpec { .. } => true,
            KernelConnection::LiveKernel { .. } => false,
        }
    }

    /// Human-readable label for logs and pickers.
    pub fn display_name(&self) -> String {
        match self {
            KernelConnection::PythonInterpreter { interpreter } => {
                interpreter.uri.display().to_string()
            }
            KernelConnection::KernelSpec { spec } => spec.display_name.clone(),
            KernelConnection::LiveKernel { connection_file } => {
                format!("live kernel ({})", connection_file.display())
            }
        }
    }
}
