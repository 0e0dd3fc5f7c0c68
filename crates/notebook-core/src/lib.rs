//! Cell execution tracking and output handling for notebook kernels.
//!
//! This crate owns the document-facing half of the kernel integration:
//!
//! - the cell model and per-cell execution state machine
//!   (Pending → Executing → Idle), driven by kernel protocol messages
//! - normalization of kernel MIME bundles into an ordered, renderable output
//!   sequence, including display-id updates and stream coalescing
//! - mapping of kernel tracebacks back to source ranges inside a cell
//! - the nbformat-style on-disk notebook model with a byte-stable
//!   serialize/deserialize round trip
//! - the kernel connection descriptor (interpreter launch, kernel-spec
//!   launch, or attach to a live kernel)
//!
//! Kernel-reported errors (the executed code raised) are not errors of this
//! crate: they normalize into error outputs on the Idle transition. Timeouts
//! waiting for completion are the only surfaced failures.

pub mod cell;
pub mod connection;
pub mod execution;
pub mod format;
pub mod messages;
pub mod output;
pub mod traceback;

// Re-export key types
pub use cell::{Cell, CellExecutionState, CellOutput, ErrorOutput, OutputItem, StreamName};
pub use connection::KernelConnection;
pub use execution::{CellExecutionTracker, ExecutionWaitError};
pub use format::{deserialize_notebook, serialize_notebook, Notebook, NotebookCell};
pub use messages::{ExecutionStatus, KernelMessage, MimeBundle, ReplyStatus, Transient};
pub use output::{to_error_output, to_renderable_output};
pub use traceback::{locate, ErrorLocation};
