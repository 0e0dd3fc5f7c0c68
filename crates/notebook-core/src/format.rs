//! The nbformat v4 on-disk notebook model.
//!
//! One canonical in-memory output shape lives in [`crate::cell`]; this module
//! owns the JSON document schema and the adapters between the two. The
//! serializer is deterministic: serialize → deserialize → serialize produces
//! byte-identical text, so a save/load cycle never dirties a document.
//!
//! nbformat allows multiline text (cell source, stream text) as either a
//! single string or an array of newline-terminated lines; both parse, and the
//! array form is always written.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::cell::{CellOutput, ErrorOutput, OutputItem, StreamName};
use crate::messages::MimeBundle;
use crate::output::to_renderable_output;

const SUPPORTED_NBFORMAT_MAJOR: u32 = 4;

#[derive(Debug, thiserror::Error)]
pub enum NotebookFormatError {
    #[error("invalid notebook JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported notebook format version {major} (expected {SUPPORTED_NBFORMAT_MAJOR})")]
    UnsupportedVersion { major: u32 },
}

/// A notebook document as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    pub cells: Vec<NotebookCell>,
    #[serde(default)]
    pub metadata: IndexMap<String, Value>,
    pub nbformat: u32,
    pub nbformat_minor: u32,
}

impl Notebook {
    pub fn new() -> Self {
        Notebook {
            cells: Vec::new(),
            metadata: IndexMap::new(),
            nbformat: 4,
            nbformat_minor: 5,
        }
    }
}

impl Default for Notebook {
    fn default() -> Self {
        Notebook::new()
    }
}

/// One cell as stored on disk, tagged by `cell_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cell_type", rename_all = "lowercase")]
pub enum NotebookCell {
    Code {
        id: String,
        #[serde(default)]
        metadata: IndexMap<String, Value>,
        execution_count: Option<u32>,
        #[serde(deserialize_with = "string_or_lines")]
        source: Vec<String>,
        outputs: Vec<DiskOutput>,
    },
    Markdown {
        id: String,
        #[serde(default)]
        metadata: IndexMap<String, Value>,
        #[serde(deserialize_with = "string_or_lines")]
        source: Vec<String>,
    },
    Raw {
        id: String,
        #[serde(default)]
        metadata: IndexMap<String, Value>,
        #[serde(deserialize_with = "string_or_lines")]
        source: Vec<String>,
    },
}

impl NotebookCell {
    pub fn id(&self) -> &str {
        match self {
            NotebookCell::Code { id, .. } => id,
            NotebookCell::Markdown { id, .. } => id,
            NotebookCell::Raw { id, .. } => id,
        }
    }

    pub fn source_text(&self) -> String {
        match self {
            NotebookCell::Code { source, .. } => source.concat(),
            NotebookCell::Markdown { source, .. } => source.concat(),
            NotebookCell::Raw { source, .. } => source.concat(),
        }
    }
}

/// One output block as stored on disk, tagged by `output_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "output_type", rename_all = "snake_case")]
pub enum DiskOutput {
    Stream {
        name: StreamName,
        #[serde(deserialize_with = "string_or_lines")]
        text: Vec<String>,
    },
    DisplayData {
        data: MimeBundle,
        #[serde(default)]
        metadata: IndexMap<String, Value>,
    },
    ExecuteResult {
        execution_count: Option<u32>,
        data: MimeBundle,
        #[serde(default)]
        metadata: IndexMap<String, Value>,
    },
    Error {
        ename: String,
        evalue: String,
        traceback: Vec<String>,
    },
}

/// Split a source string into nbformat's newline-terminated line array.
pub fn source_to_lines(source: &str) -> Vec<String> {
    if source.is_empty() {
        return Vec::new();
    }
    source.split_inclusive('\n').map(|s| s.to_string()).collect()
}

fn string_or_lines<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum MultilineText {
        Lines(Vec<String>),
        Single(String),
    }
    Ok(match MultilineText::deserialize(deserializer)? {
        MultilineText::Lines(lines) => lines,
        MultilineText::Single(text) => source_to_lines(&text),
    })
}

/// Parse a notebook JSON document.
pub fn deserialize_notebook(json: &str) -> Result<Notebook, NotebookFormatError> {
    let notebook: Notebook = serde_json::from_str(json)?;
    if notebook.nbformat != SUPPORTED_NBFORMAT_MAJOR {
        return Err(NotebookFormatError::UnsupportedVersion {
            major: notebook.nbformat,
        });
    }
    Ok(notebook)
}

/// Write a notebook document as pretty-printed JSON with a trailing newline.
pub fn serialize_notebook(notebook: &Notebook) -> Result<String, NotebookFormatError> {
    let mut json = serde_json::to_string_pretty(notebook)?;
    json.push('\n');
    Ok(json)
}

/// Adapt a live cell output to its on-disk form.
pub fn output_to_disk(output: &CellOutput) -> DiskOutput {
    match output {
        CellOutput::Stream { name, text } => DiskOutput::Stream {
            name: *name,
            text: source_to_lines(text),
        },
        CellOutput::DisplayData { items, .. } => {
            let (data, metadata) = items_to_bundle(items);
            DiskOutput::DisplayData { data, metadata }
        }
        CellOutput::ExecuteResult {
            execution_count,
            items,
        } => {
            let (data, metadata) = items_to_bundle(items);
            DiskOutput::ExecuteResult {
                execution_count: *execution_count,
                data,
                metadata,
            }
        }
        CellOutput::Error { error } => DiskOutput::Error {
            ename: error.name.clone(),
            evalue: error.value.clone(),
            traceback: error.traceback.clone(),
        },
    }
}

/// Adapt an on-disk output block to the live form. Display ids are transient
/// session state and never persisted, so a loaded display output has none.
pub fn output_from_disk(output: &DiskOutput) -> CellOutput {
    match output {
        DiskOutput::Stream { name, text } => CellOutput::Stream {
            name: *name,
            text: text.concat(),
        },
        DiskOutput::DisplayData { data, metadata } => CellOutput::DisplayData {
            display_id: None,
            items: to_renderable_output(data, metadata),
        },
        DiskOutput::ExecuteResult {
            execution_count,
            data,
            metadata,
        } => CellOutput::ExecuteResult {
            execution_count: *execution_count,
            items: to_renderable_output(data, metadata),
        },
        DiskOutput::Error {
            ename,
            evalue,
            traceback,
        } => CellOutput::Error {
            error: ErrorOutput {
                name: ename.clone(),
                value: evalue.clone(),
                traceback: traceback.clone(),
            },
        },
    }
}

fn items_to_bundle(items: &[OutputItem]) -> (MimeBundle, IndexMap<String, Value>) {
    let mut data = MimeBundle::new();
    let mut metadata = IndexMap::new();
    for item in items {
        data.insert(item.mime_type.clone(), Value::String(item.payload.clone()));
        if !item.metadata.is_empty() {
            metadata.insert(
                item.mime_type.clone(),
                Value::Object(item.metadata.clone().into_iter().collect()),
            );
        }
    }
    (data, metadata)
}
