//! The cell model: source, execution state, and accumulated outputs.
//!
//! Cell identity is owned by the host document model; this crate only mutates
//! the observable execution fields (state, execution order, outputs).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Execution state of a cell.
///
/// `Unset` is both the initial state and a valid "never ran" terminal state;
/// querying it is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellExecutionState {
    #[default]
    Unset,
    Pending,
    Executing,
    Idle,
}

/// One renderable representation of a result: a MIME type plus its payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputItem {
    pub mime_type: String,
    pub payload: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub metadata: IndexMap<String, Value>,
}

impl OutputItem {
    pub fn new(mime_type: impl Into<String>, payload: impl Into<String>) -> Self {
        OutputItem {
            mime_type: mime_type.into(),
            payload: payload.into(),
            metadata: IndexMap::new(),
        }
    }
}

/// Stream a text output was written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamName {
    Stdout,
    Stderr,
}

/// A kernel-reported execution error, normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorOutput {
    /// Exception class name.
    pub name: String,
    /// Exception value/message.
    pub value: String,
    /// Traceback lines, in kernel order.
    pub traceback: Vec<String>,
}

/// One entry in a cell's output sequence. Emission order is significant and
/// reproducible; a display update replaces the entry sharing its display id
/// instead of appending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "output_type", rename_all = "snake_case")]
pub enum CellOutput {
    DisplayData {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        display_id: Option<String>,
        items: Vec<OutputItem>,
    },
    ExecuteResult {
        execution_count: Option<u32>,
        items: Vec<OutputItem>,
    },
    Stream {
        name: StreamName,
        text: String,
    },
    Error {
        error: ErrorOutput,
    },
}

/// A unit of submitted source code plus its run metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub id: String,
    pub source: String,
    /// Assigned monotonically by the kernel when execution starts.
    pub execution_order: Option<u32>,
    pub state: CellExecutionState,
    pub outputs: Vec<CellOutput>,
    pub has_error: bool,
}

impl Cell {
    pub fn new(source: impl Into<String>) -> Self {
        Cell::with_id(Uuid::new_v4().to_string(), source)
    }

    pub fn with_id(id: impl Into<String>, source: impl Into<String>) -> Self {
        Cell {
            id: id.into(),
            source: source.into(),
            execution_order: None,
            state: CellExecutionState::Unset,
            outputs: Vec::new(),
            has_error: false,
        }
    }

    /// The cell ran to completion and produced a real execution count.
    pub fn is_success(&self) -> bool {
        self.execution_order.map_or(false, |n| n > 0)
            && self.state == CellExecutionState::Idle
            && !self.has_error
    }

    /// The cell completed without any executable effect (e.g. comments only).
    pub fn is_empty_completion(&self) -> bool {
        self.execution_order.unwrap_or(0) == 0 && self.state == CellExecutionState::Idle
    }
}
