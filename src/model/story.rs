//! Story types: the unit of tracked work in the tracker.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A tracker story identifier.
///
/// Assigned by the tracker when the story is created and never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoryId(pub u64);

impl fmt::Display for StoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A story as listed by the tracker.
///
/// Only `current_state` is ever written back, and only to deliver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub id: StoryId,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub story_type: StoryType,

    pub current_state: StoryState,
}

/// The fields sent when creating a story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewStory {
    pub name: String,
    pub story_type: StoryType,
    pub current_state: StoryState,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryType {
    #[default]
    Feature,
    Bug,
    Chore,
    Release,
}

/// Where a story stands in the tracker's workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryState {
    Unscheduled,
    Planned,
    Unstarted,
    Started,
    Finished,
    Delivered,
    Accepted,
    Rejected,
}

impl StoryState {
    /// Whether the story may be moved to `Delivered` automatically.
    ///
    /// Only `Finished` qualifies. Earlier states are not done yet and later
    /// ones have already been delivered.
    pub fn is_deliverable(self) -> bool {
        self == Self::Finished
    }

    /// A transition into this state hands the work back to someone.
    pub fn reopens_work(self) -> bool {
        matches!(self, Self::Unstarted | Self::Started | Self::Rejected)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unscheduled => "unscheduled",
            Self::Planned => "planned",
            Self::Unstarted => "unstarted",
            Self::Started => "started",
            Self::Finished => "finished",
            Self::Delivered => "delivered",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for StoryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
