//! Kernel protocol messages consumed by the execution tracker.
//!
//! A tagged union over the message content this core reacts to, in the shape
//! the host's kernel transport delivers them (already routed to a cell via
//! the parent-header message id).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cell::StreamName;

/// MIME type → payload bundle, insertion-ordered as emitted by the kernel.
pub type MimeBundle = IndexMap<String, Value>;

/// Kernel execution state reported on the iopub status channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Busy,
    Idle,
}

/// Status carried by an execute_reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyStatus {
    Ok,
    Error,
    Aborted,
}

/// Transient display fields (the display id used by update_display_data).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transient {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_id: Option<String>,
}

/// Kernel message content, tagged by protocol message type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "msg_type", rename_all = "snake_case")]
pub enum KernelMessage {
    Status {
        execution_state: ExecutionStatus,
    },
    Stream {
        name: StreamName,
        text: String,
    },
    DisplayData {
        data: MimeBundle,
        #[serde(default)]
        metadata: IndexMap<String, Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        transient: Option<Transient>,
    },
    UpdateDisplayData {
        data: MimeBundle,
        #[serde(default)]
        metadata: IndexMap<String, Value>,
        transient: Transient,
    },
    ExecuteResult {
        execution_count: u32,
        data: MimeBundle,
        #[serde(default)]
        metadata: IndexMap<String, Value>,
    },
    Error {
        ename: String,
        evalue: String,
        traceback: Vec<String>,
    },
    ExecuteReply {
        status: ReplyStatus,
        execution_count: Option<u32>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_round_trip_by_msg_type_tag() {
        let msg = KernelMessage::Status {
            execution_state: ExecutionStatus::Busy,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["msg_type"], "status");
        assert_eq!(json["execution_state"], "busy");

        let parsed: KernelMessage = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_execute_result_deserializes_from_wire_shape() {
        let json = serde_json::json!({
            "msg_type": "execute_result",
            "execution_count": 3,
            "data": { "text/plain": "42" }
        });
        let msg: KernelMessage = serde_json::from_value(json).unwrap();
        match msg {
            KernelMessage::ExecuteResult {
                execution_count,
                data,
                metadata,
            } => {
                assert_eq!(execution_count, 3);
                assert_eq!(data.get("text/plain").unwrap(), "42");
                assert!(metadata.is_empty());
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_update_display_data_requires_transient() {
        let json = serde_json::json!({
            "msg_type": "update_display_data",
            "data": { "text/plain": "updated" },
            "transient": { "display_id": "disp-1" }
        });
        let msg: KernelMessage = serde_json::from_value(json).unwrap();
        match msg {
            KernelMessage::UpdateDisplayData { transient, .. } => {
                assert_eq!(transient.display_id.as_deref(), Some("disp-1"));
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }
}
