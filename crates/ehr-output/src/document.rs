//! Graph documents on disk.
//!
//! A document is the graph identifier plus every assertion in sorted order,
//! so the same graph always serializes to the same bytes.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use ehr_model::{Assertion, Graph, Iri};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::info;

use crate::error::OutputError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub iri: Iri,
    pub assertions: Vec<Assertion>,
}

impl GraphDocument {
    pub fn from_graph(graph: &Graph) -> Self {
        Self {
            iri: graph.iri().clone(),
            assertions: graph.iter().cloned().collect(),
        }
    }

    /// Rebuilds the graph, re-checking node kinds.
    pub fn into_graph(self) -> Result<Graph, ehr_model::GraphError> {
        Graph::from_assertions(self.iri, self.assertions)
    }
}

/// Writes `graph` to `path`.
///
/// The document goes to a temporary file next to `path` and is renamed into
/// place once complete; on any failure `path` is left as it was.
pub fn write_graph(graph: &Graph, path: &Path) -> Result<(), OutputError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| OutputError::io("create directory", parent, e))?;

    let temp = NamedTempFile::new_in(parent).map_err(|e| OutputError::io("create", parent, e))?;
    let mut writer = BufWriter::new(temp);
    serde_json::to_writer_pretty(&mut writer, &GraphDocument::from_graph(graph)).map_err(
        |source| OutputError::Json {
            path: path.to_path_buf(),
            source,
        },
    )?;
    writer
        .write_all(b"\n")
        .map_err(|e| OutputError::io("write", path, e))?;
    let temp = writer
        .into_inner()
        .map_err(|e| OutputError::io("write", path, e.into_error()))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| OutputError::io("sync", path, e))?;
    temp.persist(path)
        .map_err(|e| OutputError::AtomicWriteFailed {
            target_path: path.to_path_buf(),
            source: e.error,
        })?;

    info!(
        path = %path.display(),
        assertions = graph.len(),
        "graph written"
    );
    Ok(())
}

pub fn read_graph(path: &Path) -> Result<Graph, OutputError> {
    let file = File::open(path).map_err(|e| OutputError::io("open", path, e))?;
    let document: GraphDocument =
        serde_json::from_reader(BufReader::new(file)).map_err(|source| OutputError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    let graph = document.into_graph().map_err(|source| OutputError::Graph {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), assertions = graph.len(), "graph read");
    Ok(graph)
}
