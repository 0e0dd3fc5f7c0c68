//! Output normalization: kernel MIME bundles → ordered renderable items.
//!
//! When a kernel emits several representations of one logical result, a fixed
//! preference ranking decides their order. An empty-string payload is demoted
//! below every non-empty representation regardless of rank, so an empty
//! "preferred" MIME type can never hide a populated fallback.

use indexmap::IndexMap;
use log::debug;
use serde_json::Value;

use crate::cell::{CellOutput, ErrorOutput, OutputItem, StreamName};
use crate::messages::MimeBundle;

/// Preference ranking, highest first. Unlisted MIME types rank below every
/// listed one; the table order breaks ties between simultaneous
/// representations.
const MIME_PREFERENCE: &[&str] = &[
    "application/vnd.jupyter.widget-view+json",
    "application/vnd.vegalite.v4+json",
    "application/vnd.vegalite.v3+json",
    "application/vnd.vegalite.v2+json",
    "application/vnd.vega.v5+json",
    "image/svg+xml",
    "image/png",
    "text/html",
    "text/latex",
    "application/javascript",
    "text/plain",
];

fn mime_rank(mime_type: &str) -> usize {
    MIME_PREFERENCE
        .iter()
        .position(|m| *m == mime_type)
        .unwrap_or(MIME_PREFERENCE.len())
}

/// Convert a payload value to its string form: strings as-is, everything
/// else JSON-serialized.
fn payload_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

fn item_metadata(metadata: &IndexMap<String, Value>, mime_type: &str) -> IndexMap<String, Value> {
    match metadata.get(mime_type) {
        Some(Value::Object(map)) => map.clone().into_iter().collect(),
        _ => IndexMap::new(),
    }
}

/// Order the representations of one kernel result for rendering.
///
/// Stable over the bundle's emission order: equal-rank entries keep their
/// relative position.
pub fn to_renderable_output(data: &MimeBundle, metadata: &IndexMap<String, Value>) -> Vec<OutputItem> {
    let mut items: Vec<OutputItem> = data
        .iter()
        .map(|(mime_type, payload)| OutputItem {
            mime_type: mime_type.clone(),
            payload: payload_to_string(payload),
            metadata: item_metadata(metadata, mime_type),
        })
        .collect();
    // Empty payloads sink below all non-empty ones, then rank decides.
    items.sort_by_key(|item| (item.payload.is_empty(), mime_rank(&item.mime_type)));
    items
}

/// Validate a kernel error payload into the normalized error structure.
///
/// Structural passthrough, not a reordering: traceback lines stay in kernel
/// order. `None` when the payload is not shaped like a kernel error.
pub fn to_error_output(result: &Value) -> Option<ErrorOutput> {
    let name = result.get("ename")?.as_str()?.to_string();
    let value = result.get("evalue")?.as_str()?.to_string();
    let traceback = match result.get("traceback") {
        Some(Value::Array(lines)) => lines
            .iter()
            .filter_map(|l| l.as_str())
            .map(|l| l.to_string())
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    };
    Some(ErrorOutput {
        name,
        value,
        traceback,
    })
}

/// Append stream text to a cell's output sequence, coalescing with a trailing
/// entry on the same stream.
pub fn append_stream(outputs: &mut Vec<CellOutput>, name: StreamName, text: &str) {
    if let Some(CellOutput::Stream {
        name: last_name,
        text: last_text,
    }) = outputs.last_mut()
    {
        if *last_name == name {
            last_text.push_str(text);
            return;
        }
    }
    outputs.push(CellOutput::Stream {
        name,
        text: text.to_string(),
    });
}

/// Replace the display entry carrying `display_id` in place.
///
/// Returns whether a target was found; an update without a target is dropped
/// by the caller.
pub fn apply_display_update(
    outputs: &mut [CellOutput],
    display_id: &str,
    items: Vec<OutputItem>,
) -> bool {
    for output in outputs.iter_mut() {
        if let CellOutput::DisplayData {
            display_id: Some(id),
            items: existing,
        } = output
        {
            if id == display_id {
                *existing = items;
                return true;
            }
        }
    }
    debug!("display update for unknown display_id {}", display_id);
    false
}
