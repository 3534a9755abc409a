//! Errors that end a run.
//!
//! Each variant's message is the single diagnostic line printed on stderr:
//! `error <what was being done>: <cause>`.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::model::StoryId;
use crate::resolve::ActivityError;
use crate::tracker::{ListingError, TrackerError};

#[derive(Debug, Error)]
pub enum OutError {
    #[error("error reading request: {0}")]
    Request(#[source] serde_json::Error),

    #[error("error {0}")]
    Config(#[from] ConfigError),

    #[error("error reading content file: {0}")]
    ContentFile(#[source] FileError),

    #[error("error reading comment file: {0}")]
    CommentFile(#[source] FileError),

    #[error("error building tracker client: {0}")]
    Client(#[source] TrackerError),

    #[error("error creating story: {0}")]
    CreateStory(#[source] TrackerError),

    #[error("error scanning repositories: none of the {0} repositories could be scanned")]
    NothingScanned(usize),

    #[error("error listing stories: {0}")]
    Listing(#[from] ListingError),

    #[error("error fetching activity for story #{story}: {source}")]
    Activity {
        story: StoryId,
        #[source]
        source: TrackerError,
    },

    #[error("error delivering story #{story}: {message}; remaining stories were not attempted")]
    DeliveryAborted { story: StoryId, message: String },

    #[error("error delivering stories: {failed} of {attempted} failed ({stories})")]
    DeliveryFailures {
        failed: usize,
        attempted: usize,
        stories: String,
    },

    #[error("error writing response: {0}")]
    Response(#[source] serde_json::Error),
}

impl From<ActivityError> for OutError {
    fn from(e: ActivityError) -> Self {
        Self::Activity {
            story: e.story,
            source: e.source,
        }
    }
}

/// A request file that could not be read.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is not valid UTF-8", .0.display())]
    NotUtf8(PathBuf),
}
