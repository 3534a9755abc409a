//! Activity: timestamped events the tracker records against a story.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::story::{StoryId, StoryState};

/// One entry of a story's activity feed.
///
/// The tracker returns feeds newest first. Only the fields needed to spot
/// state changes are modeled; everything else in the payload is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    /// Activity kind, e.g. `story_update_activity`.
    pub kind: String,

    #[serde(default)]
    pub message: Option<String>,

    /// Short verb the tracker shows for the event, e.g. `finished`.
    #[serde(default)]
    pub highlight: Option<String>,

    pub occurred_at: Timestamp,

    #[serde(default)]
    pub changes: Vec<Change>,
}

/// A single resource change carried by an activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Change {
    /// Resource kind, e.g. `story`, `comment`, `task`.
    pub kind: String,

    #[serde(default)]
    pub id: Option<u64>,

    #[serde(default)]
    pub change_type: Option<String>,

    #[serde(default)]
    pub new_values: Option<ChangeValues>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeValues {
    #[serde(default)]
    pub current_state: Option<StoryState>,
}

impl Activity {
    /// The state this activity moved `story` into, if it changed its state.
    pub fn state_change(&self, story: StoryId) -> Option<StoryState> {
        self.changes
            .iter()
            .filter(|c| c.kind == "story" && c.id == Some(story.0))
            .find_map(|c| c.new_values.as_ref()?.current_state)
    }
}
