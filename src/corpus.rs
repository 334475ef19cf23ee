//! Structured input content for one generation.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Pre-structured content: the ingestion side has already reduced the source
/// text to a title, an author and an ordered list of key points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentCorpus {
    pub title: String,
    #[serde(default)]
    pub author: String,
    pub key_points: Vec<String>,
    #[serde(default)]
    pub hashtags: Vec<String>,
}

impl ContentCorpus {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            key_points: Vec::new(),
            hashtags: Vec::new(),
        }
    }

    pub fn with_key_points<I, S>(mut self, points: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_points = points.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_hashtags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hashtags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
