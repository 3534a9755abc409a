//! Activity resolution: which candidates are ready to deliver.
//!
//! A candidate is ready when the tracker has it in `finished` and nothing in
//! its activity feed says the work was handed back after the commits that
//! reference it were written. A rejection followed by a manual re-finish,
//! with no new commit, leaves the story waiting for that commit.
//!
//! Every activity fetch happens here, before anything is delivered. A failed
//! fetch stops the run.

use std::fmt::Write as _;

use jiff::Timestamp;
use thiserror::Error;
use tracing::{debug, info};

use crate::matcher::Candidate;
use crate::model::{Activity, CommitReference, Story, StoryId, StoryState};
use crate::tracker::{Paging, Tracker, TrackerError, fetch_activity};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    Skip(SkipReason),
}

/// Why a candidate is left alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The story's state rules out automated delivery.
    NotDeliverable(StoryState),

    /// The work was moved back to `state` after the newest referencing commit.
    ReopenedAfterCommit { state: StoryState, at: Timestamp },
}

/// A story cleared for delivery, with the comment to post on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyStory {
    pub story: Story,
    pub comment: String,
}

#[derive(Debug, Default)]
pub struct Resolution {
    pub ready: Vec<ReadyStory>,
    pub skipped: Vec<(StoryId, SkipReason)>,
}

#[derive(Debug, Error)]
#[error("{source}")]
pub struct ActivityError {
    pub story: StoryId,
    #[source]
    pub source: TrackerError,
}

/// Classify every candidate, in order.
///
/// Activity is fetched only for stories whose state allows delivery; for the
/// rest the state alone decides.
pub fn resolve(
    tracker: &impl Tracker,
    candidates: Vec<Candidate>,
    comment: &str,
    paging: Paging,
) -> Result<Resolution, ActivityError> {
    let mut resolution = Resolution::default();

    for Candidate { story, references } in candidates {
        let activity = if story.current_state.is_deliverable() {
            fetch_activity(tracker, story.id, paging).map_err(|source| ActivityError {
                story: story.id,
                source,
            })?
        } else {
            Vec::new()
        };

        match readiness(&story, &references, &activity) {
            Readiness::Ready => {
                debug!(story = %story.id, events = activity.len(), "ready for delivery");
                resolution.ready.push(ReadyStory {
                    comment: render_comment(comment, &references),
                    story,
                });
            }
            Readiness::Skip(reason) => {
                info!(story = %story.id, ?reason, "not delivering");
                resolution.skipped.push((story.id, reason));
            }
        }
    }

    Ok(resolution)
}

/// Decide whether `story` may be delivered.
pub fn readiness(
    story: &Story,
    references: &[CommitReference],
    activity: &[Activity],
) -> Readiness {
    if !story.current_state.is_deliverable() {
        return Readiness::Skip(SkipReason::NotDeliverable(story.current_state));
    }

    let Some(last_commit) = references.iter().map(|r| r.committed_at).max() else {
        return Readiness::Ready;
    };

    activity
        .iter()
        .filter(|a| a.occurred_at > last_commit)
        .filter_map(|a| {
            let state = a.state_change(story.id)?;
            state.reopens_work().then_some((a.occurred_at, state))
        })
        .max_by_key(|(at, _)| *at)
        .map_or(Readiness::Ready, |(at, state)| {
            Readiness::Skip(SkipReason::ReopenedAfterCommit { state, at })
        })
}

/// The comment for a delivered story.
///
/// Non-empty comment text is posted exactly as given. Empty text is replaced
/// by a list of the referencing commits.
pub fn render_comment(comment: &str, references: &[CommitReference]) -> String {
    if !comment.is_empty() {
        return comment.to_string();
    }

    let mut body = String::from("Delivered by:");
    for reference in references {
        let _ = write!(
            body,
            "\n- {}@{}: {}",
            reference.repo,
            reference.short_sha(),
            reference.subject
        );
    }
    body
}
