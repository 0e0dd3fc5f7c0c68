//! Per-cell execution state tracking.
//!
//! Kernel protocol messages (status busy/idle, outputs, execute_reply) drive
//! each cell through Pending → Executing → Idle. State is tracked per cell
//! identity, never globally, so concurrent executions are fine. Waiters
//! subscribe through watch channels rather than a host event bus.

use std::collections::HashMap;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use log::{debug, warn};
use serde_json::json;
use tokio::sync::watch;

use crate::cell::{Cell, CellExecutionState, CellOutput};
use crate::messages::{ExecutionStatus, KernelMessage, ReplyStatus};
use crate::output::{append_stream, apply_display_update, to_error_output, to_renderable_output};

/// Grace period after Idle is observed, letting in-flight secondary
/// mutations (e.g. a final stream flush) land before waiters resume.
const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Failure to observe a cell reach Idle.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionWaitError {
    #[error("cell {cell_id} did not reach idle within {timeout:?} (last state: {state:?})")]
    Timeout {
        cell_id: String,
        timeout: Duration,
        state: CellExecutionState,
    },
    #[error("unknown cell: {0}")]
    UnknownCell(String),
}

/// Tracks execution state and outputs for the cells of one kernel session.
pub struct CellExecutionTracker {
    cells: StdMutex<HashMap<String, Cell>>,
    watchers: StdMutex<HashMap<String, watch::Sender<CellExecutionState>>>,
    settle_delay: Duration,
}

impl Default for CellExecutionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl CellExecutionTracker {
    pub fn new() -> Self {
        Self::with_settle_delay(DEFAULT_SETTLE_DELAY)
    }

    pub fn with_settle_delay(settle_delay: Duration) -> Self {
        CellExecutionTracker {
            cells: StdMutex::new(HashMap::new()),
            watchers: StdMutex::new(HashMap::new()),
            settle_delay,
        }
    }

    /// Start tracking a host-owned cell.
    pub fn register(&self, cell: Cell) {
        let (tx, _rx) = watch::channel(cell.state);
        self.watchers.lock().unwrap().insert(cell.id.clone(), tx);
        self.cells.lock().unwrap().insert(cell.id.clone(), cell);
    }

    /// Stop tracking a cell (it was deleted from the notebook). Waiters see
    /// the watch channel close.
    pub fn remove(&self, cell_id: &str) -> Option<Cell> {
        self.watchers.lock().unwrap().remove(cell_id);
        self.cells.lock().unwrap().remove(cell_id)
    }

    /// Snapshot of the tracked cell.
    pub fn snapshot(&self, cell_id: &str) -> Option<Cell> {
        self.cells.lock().unwrap().get(cell_id).cloned()
    }

    /// Current state; `Unset` for a cell that never ran (or is unknown),
    /// which is a valid answer rather than an error.
    pub fn state(&self, cell_id: &str) -> CellExecutionState {
        self.cells
            .lock()
            .unwrap()
            .get(cell_id)
            .map(|c| c.state)
            .unwrap_or_default()
    }

    /// Mark a cell submitted: clears prior run artifacts and enters Pending.
    pub fn mark_pending(&self, cell_id: &str) {
        self.mutate(cell_id, |cell| {
            cell.outputs.clear();
            cell.execution_order = None;
            cell.has_error = false;
            cell.state = CellExecutionState::Pending;
        });
    }

    /// Observe the cell's state transitions.
    pub fn subscribe(&self, cell_id: &str) -> Option<watch::Receiver<CellExecutionState>> {
        self.watchers
            .lock()
            .unwrap()
            .get(cell_id)
            .map(|tx| tx.subscribe())
    }

    /// Feed a kernel message routed to `cell_id` through the state machine.
    ///
    /// Busy precedes any output; idle is terminal for the run. Messages for
    /// unknown cells are dropped with a warning (the cell may have been
    /// deleted mid-flight).
    pub fn handle_message(&self, cell_id: &str, message: &KernelMessage) {
        let known = self.mutate(cell_id, |cell| match message {
            KernelMessage::Status { execution_state } => match execution_state {
                ExecutionStatus::Busy => {
                    if cell.state != CellExecutionState::Idle {
                        cell.state = CellExecutionState::Executing;
                    }
                }
                ExecutionStatus::Idle => {
                    cell.state = CellExecutionState::Idle;
                }
            },
            KernelMessage::Stream { name, text } => {
                append_stream(&mut cell.outputs, *name, text);
            }
            KernelMessage::DisplayData {
                data,
                metadata,
                transient,
            } => {
                cell.outputs.push(CellOutput::DisplayData {
                    display_id: transient.as_ref().and_then(|t| t.display_id.clone()),
                    items: to_renderable_output(data, metadata),
                });
            }
            KernelMessage::UpdateDisplayData {
                data,
                metadata,
                transient,
            } => {
                if let Some(display_id) = &transient.display_id {
                    apply_display_update(
                        &mut cell.outputs,
                        display_id,
                        to_renderable_output(data, metadata),
                    );
                }
            }
            KernelMessage::ExecuteResult {
                execution_count,
                data,
                metadata,
            } => {
                if cell.execution_order.is_none() {
                    cell.execution_order = Some(*execution_count);
                }
                cell.outputs.push(CellOutput::ExecuteResult {
                    execution_count: Some(*execution_count),
                    items: to_renderable_output(data, metadata),
                });
            }
            KernelMessage::Error {
                ename,
                evalue,
                traceback,
            } => {
                cell.has_error = true;
                if let Some(error) = to_error_output(&json!({
                    "ename": ename,
                    "evalue": evalue,
                    "traceback": traceback,
                })) {
                    cell.outputs.push(CellOutput::Error { error });
                }
            }
            KernelMessage::ExecuteReply {
                status,
                execution_count,
            } => {
                // Assign or preserve: the first reported count wins.
                if let Some(count) = execution_count {
                    if cell.execution_order.is_none() && *count > 0 {
                        cell.execution_order = Some(*count);
                    }
                }
                if *status == ReplyStatus::Error {
                    cell.has_error = true;
                }
            }
        });

        if !known {
            warn!(
                "dropping {} message for unknown cell {}",
                message_kind(message),
                cell_id
            );
        }
    }

    /// Suspend until the cell reaches Idle, then wait out the settle delay
    /// and return a snapshot. Idempotent: waiting on an already-idle cell
    /// resolves immediately (modulo the settle delay).
    pub async fn wait_for_completion(
        &self,
        cell_id: &str,
        timeout: Duration,
    ) -> Result<Cell, ExecutionWaitError> {
        let mut rx = self
            .subscribe(cell_id)
            .ok_or_else(|| ExecutionWaitError::UnknownCell(cell_id.to_string()))?;

        let reached_idle = tokio::time::timeout(timeout, async {
            loop {
                if *rx.borrow_and_update() == CellExecutionState::Idle {
                    return true;
                }
                if rx.changed().await.is_err() {
                    // Tracker dropped the cell while we waited.
                    return false;
                }
            }
        })
        .await;

        match reached_idle {
            Ok(true) => {
                debug!("cell {} reached idle, settling", cell_id);
            }
            Ok(false) => {
                return Err(ExecutionWaitError::UnknownCell(cell_id.to_string()));
            }
            Err(_) => {
                return Err(ExecutionWaitError::Timeout {
                    cell_id: cell_id.to_string(),
                    timeout,
                    state: self.state(cell_id),
                });
            }
        }

        tokio::time::sleep(self.settle_delay).await;
        self.snapshot(cell_id)
            .ok_or_else(|| ExecutionWaitError::UnknownCell(cell_id.to_string()))
    }

    /// Apply `f` to the tracked cell, notifying watchers of state changes.
    /// Returns whether the cell is known.
    fn mutate(&self, cell_id: &str, f: impl FnOnce(&mut Cell)) -> bool {
        let new_state = {
            let mut cells = self.cells.lock().unwrap();
            let Some(cell) = cells.get_mut(cell_id) else {
                return false;
            };
            let before = cell.state;
            f(cell);
            (cell.state != before).then_some(cell.state)
        };
        if let Some(state) = new_state {
            if let Some(tx) = self.watchers.lock().unwrap().get(cell_id) {
                // send_replace updates the channel value even with no live
                // receivers, so a later subscriber sees the current state.
                tx.send_replace(state);
            }
        }
        true
    }
}

fn message_kind(message: &KernelMessage) -> &'static str {
    match message {
        KernelMessage::Status { .. } => "status",
        KernelMessage::Stream { .. } => "stream",
        KernelMessage::DisplayData { .. } => "display_data",
        KernelMessage::UpdateDisplayData { .. } => "update_display_data",
        KernelMessage::ExecuteResult { .. } => "execute_result",
        KernelMessage::Error { .. } => "error",
        KernelMessage::ExecuteReply { .. } => "execute_reply",
    }
}
