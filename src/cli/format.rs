//! Output formatting for CLI display.

use crate::deliver::StoryOutcome;
use crate::model::StoryId;
use crate::resolve::SkipReason;

/// Why a candidate story was left alone.
pub(super) fn format_skip(story: StoryId, reason: &SkipReason) -> String {
    match reason {
        SkipReason::NotDeliverable(state) => format!("Skipping story #{story}: {state}"),
        SkipReason::ReopenedAfterCommit { state, at } => {
            format!("Skipping story #{story}: moved to {state} at {at}, after its last commit")
        }
    }
}

pub(super) fn format_outcome(story: StoryId, outcome: &StoryOutcome) -> String {
    match outcome {
        StoryOutcome::Delivered => format!("Delivered story #{story}"),
        StoryOutcome::DeliveryFailed(e) => format!("Failed to deliver story #{story}: {e}"),
        StoryOutcome::CommentFailed(e) => {
            format!("Delivered story #{story} but failed to comment: {e}")
        }
    }
}

/// `#1, #2, #3`
pub(super) fn format_story_ids(stories: &[StoryId]) -> String {
    stories
        .iter()
        .map(|s| format!("#{s}"))
        .collect::<Vec<_>>()
        .join(", ")
}
