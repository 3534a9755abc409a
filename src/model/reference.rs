//! Commit references: where a story was mentioned in source control.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// A commit whose message mentions a story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReference {
    /// The repository as named in the request params.
    pub repo: String,

    pub sha: String,

    pub committed_at: Timestamp,

    /// First line of the commit message.
    pub subject: String,
}

impl CommitReference {
    pub fn short_sha(&self) -> &str {
        self.sha.get(..7).unwrap_or(&self.sha)
    }
}
