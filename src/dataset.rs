//! Question dataset: immutable question → answer table.
//! Loaded once from a JSON object (`{"question": {"answer": bool, "explanation": str|null}}`)
//! and shared read-only between queries. Key order of the document is preserved.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

/// Answer record stored against a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub answer: bool,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// Read-only question table. Iteration order is load order.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    entries: Vec<(String, QuestionRecord)>,
}

#[derive(Debug)]
pub enum DatasetError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    InvalidRecord { question: String, source: serde_json::Error },
}

impl std::fmt::Display for DatasetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetError::Io(e) => write!(f, "dataset IO error: {e}"),
            DatasetError::Parse(e) => write!(f, "dataset parse error: {e}"),
            DatasetError::InvalidRecord { question, source } => {
                write!(f, "invalid record for question {question:?}: {source}")
            }
        }
    }
}

impl std::error::Error for DatasetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DatasetError::Io(e) => Some(e),
            DatasetError::Parse(e) => Some(e),
            DatasetError::InvalidRecord { source, .. } => Some(source),
        }
    }
}

impl From<std::io::Error> for DatasetError {
    fn from(e: std::io::Error) -> Self {
        DatasetError::Io(e)
    }
}

impl From<serde_json::Error> for DatasetError {
    fn from(e: serde_json::Error) -> Self {
        DatasetError::Parse(e)
    }
}

impl Dataset {
    /// Build a dataset from already-materialized entries. A repeated question
    /// keeps its first position and takes the last record, as a JSON object would.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, QuestionRecord)>,
        S: Into<String>,
    {
        let mut out: Vec<(String, QuestionRecord)> = Vec::new();
        let mut position: HashMap<String, usize> = HashMap::new();
        for (question, record) in entries {
            let question = question.into();
            match position.get(&question) {
                Some(&i) => out[i].1 = record,
                None => {
                    position.insert(question.clone(), out.len());
                    out.push((question, record));
                }
            }
        }
        Self { entries: out }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a dataset from a JSON document.
    pub fn from_json_str(content: &str) -> Result<Self, DatasetError> {
        let raw: serde_json::Map<String, serde_json::Value> = serde_json::from_str(content)?;
        let mut entries = Vec::with_capacity(raw.len());
        for (question, value) in raw {
            let record: QuestionRecord = serde_json::from_value(value).map_err(|source| {
                DatasetError::InvalidRecord {
                    question: question.clone(),
                    source,
                }
            })?;
            entries.push((question, record));
        }
        Ok(Self { entries })
    }

    /// Load a dataset from a JSON file.
    pub fn load_from_file(path: &Path) -> Result<Self, DatasetError> {
        let content = std::fs::read_to_string(path)?;
        let dataset = Self::from_json_str(&content)?;
        info!(path = %path.display(), entries = dataset.len(), "dataset loaded");
        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact lookup (case- and accent-sensitive).
    pub fn get(&self, question: &str) -> Option<&QuestionRecord> {
        self.entries
            .iter()
            .find(|(q, _)| q == question)
            .map(|(_, r)| r)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QuestionRecord)> {
        self.entries.iter().map(|(q, r)| (q.as_str(), r))
    }
}
