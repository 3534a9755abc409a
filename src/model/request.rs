//! Request and response shapes of the `out` step.
//!
//! The request arrives as JSON on stdin; the response leaves as JSON on stdout.

use std::path::PathBuf;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct OutRequest {
    pub source: Source,

    #[serde(default)]
    pub params: Params,
}

/// Where the tracker lives and which project to work in.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Source {
    /// Tracker base URL. Empty or missing means the public tracker.
    #[serde(default)]
    pub tracker_url: Option<String>,

    #[serde(default)]
    pub token: String,

    /// Numeric project id, as a string.
    #[serde(default)]
    pub project_id: String,

    /// Items requested per page when listing stories or activity.
    #[serde(default)]
    pub page_size: Option<usize>,

    /// Upper bound on pages fetched by any single listing.
    #[serde(default)]
    pub max_pages: Option<usize>,
}

/// Per-invocation instructions.
///
/// Paths are relative to the sources directory given on the command line.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Params {
    /// File whose text becomes the name of a new story.
    #[serde(default, rename = "content")]
    pub content_path: Option<PathBuf>,

    /// File whose text is posted on every delivered story.
    #[serde(default, rename = "comment")]
    pub comment_path: Option<PathBuf>,

    /// Repositories whose commit messages are scanned for story references.
    #[serde(default)]
    pub repos: Vec<String>,

    /// Only scan commits after this revision.
    #[serde(default)]
    pub since: Option<String>,

    /// Upper bound on commits read per repository.
    #[serde(default)]
    pub max_commits: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutResponse {
    pub version: Version,
    pub metadata: Vec<MetadataPair>,
}

/// A resource version: the moment the step completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Version {
    pub time: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataPair {
    pub name: String,
    pub value: String,
}

impl MetadataPair {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}
