//! Delivery: move ready stories to `delivered` and comment on them.
//!
//! Stories are processed in the order given. A failure on one story is
//! recorded and the next story is still attempted, except when the tracker
//! rejects the credentials: then no later call can succeed and the run stops.
//! A delivery is never undone because its comment failed.

use tracing::{error, info, warn};

use crate::model::StoryId;
use crate::resolve::ReadyStory;
use crate::tracker::{Tracker, TrackerError};

/// What happened to one story.
#[derive(Debug)]
pub enum StoryOutcome {
    /// Delivered and commented.
    Delivered,

    /// The state change failed; no comment was posted.
    DeliveryFailed(TrackerError),

    /// Delivered, but the comment failed.
    CommentFailed(TrackerError),
}

#[derive(Debug, Default)]
pub struct DeliveryReport {
    pub outcomes: Vec<(StoryId, StoryOutcome)>,

    /// A fatal error on the last recorded story stopped the run.
    pub aborted: bool,
}

impl DeliveryReport {
    /// Stories now in the delivered state, whether or not the comment landed.
    pub fn delivered(&self) -> Vec<StoryId> {
        self.outcomes
            .iter()
            .filter(|(_, o)| {
                matches!(o, StoryOutcome::Delivered | StoryOutcome::CommentFailed(_))
            })
            .map(|(id, _)| *id)
            .collect()
    }

    /// Stories with any failure.
    pub fn failed(&self) -> Vec<StoryId> {
        self.outcomes
            .iter()
            .filter(|(_, o)| !matches!(o, StoryOutcome::Delivered))
            .map(|(id, _)| *id)
            .collect()
    }

    /// The error that stopped the run, if one did.
    pub fn fatal(&self) -> Option<(StoryId, &TrackerError)> {
        if !self.aborted {
            return None;
        }
        match self.outcomes.last()? {
            (id, StoryOutcome::DeliveryFailed(e) | StoryOutcome::CommentFailed(e)) => {
                Some((*id, e))
            }
            (_, StoryOutcome::Delivered) => None,
        }
    }
}

/// Result of one tracker call, classified for the delivery loop.
enum Step {
    Done,
    Isolated(TrackerError),
    Fatal(TrackerError),
}

impl From<Result<(), TrackerError>> for Step {
    fn from(result: Result<(), TrackerError>) -> Self {
        match result {
            Ok(()) => Self::Done,
            Err(e) if e.rejects_credentials() => Self::Fatal(e),
            Err(e) => Self::Isolated(e),
        }
    }
}

/// Deliver each story, then comment on it.
pub fn deliver_all(tracker: &impl Tracker, ready: &[ReadyStory]) -> DeliveryReport {
    let mut report = DeliveryReport::default();

    for ReadyStory { story, comment } in ready {
        let id = story.id;

        match Step::from(tracker.deliver_story(id)) {
            Step::Done => {}
            Step::Isolated(e) => {
                warn!(story = %id, error = %e, "delivery failed; skipping comment");
                report.outcomes.push((id, StoryOutcome::DeliveryFailed(e)));
                continue;
            }
            Step::Fatal(e) => {
                error!(story = %id, error = %e, "delivery refused; stopping");
                report.outcomes.push((id, StoryOutcome::DeliveryFailed(e)));
                report.aborted = true;
                break;
            }
        }

        // Comment through the delivering call so a comment never lands on a
        // story the tracker did not deliver.
        let outcome = match Step::from(tracker.deliver_story_with_comment(id, comment)) {
            Step::Done => StoryOutcome::Delivered,
            Step::Isolated(e) => {
                warn!(story = %id, error = %e, "delivered but comment failed");
                StoryOutcome::CommentFailed(e)
            }
            Step::Fatal(e) => {
                error!(story = %id, error = %e, "comment refused; stopping");
                report.outcomes.push((id, StoryOutcome::CommentFailed(e)));
                report.aborted = true;
                break;
            }
        };

        if matches!(outcome, StoryOutcome::Delivered) {
            info!(story = %id, "delivered");
        }
        report.outcomes.push((id, outcome));
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    use crate::model::StoryState;
    use crate::tracker::fake::{Call, FakeTracker, story};

    fn ready(ids: &[u64]) -> Vec<ReadyStory> {
        ids.iter()
            .map(|&id| ReadyStory {
                story: story(id, StoryState::Finished),
                comment: format!("comment {id}"),
            })
            .collect()
    }

    #[test]
    fn delivers_then_comments_in_order() {
        let tracker = FakeTracker::new();

        let report = deliver_all(&tracker, &ready(&[123_456]));

        assert_eq!(
            tracker.calls(),
            vec![
                Call::DeliverStory(StoryId(123_456)),
                Call::DeliverStoryWithComment(StoryId(123_456), "comment 123456".into()),
            ]
        );
        assert_eq!(report.delivered(), vec![StoryId(123_456)]);
        assert!(report.failed().is_empty());
    }

    #[test]
    fn failed_delivery_skips_comment_and_continues() {
        let tracker = FakeTracker::new().failing_delivery(StoryId(1), 500);

        let report = deliver_all(&tracker, &ready(&[1, 2]));

        assert_eq!(
            tracker.calls(),
            vec![
                Call::DeliverStory(StoryId(1)),
                Call::DeliverStory(StoryId(2)),
                Call::DeliverStoryWithComment(StoryId(2), "comment 2".into()),
            ]
        );
        assert_eq!(report.failed(), vec![StoryId(1)]);
        assert_eq!(report.delivered(), vec![StoryId(2)]);
        assert!(matches!(report.outcomes[0].1, StoryOutcome::DeliveryFailed(_)));
    }

    #[test]
    fn failed_comment_keeps_delivery() {
        let tracker = FakeTracker::new().failing_comment(StoryId(1), 422);

        let report = deliver_all(&tracker, &ready(&[1, 2]));

        assert_eq!(report.delivered(), vec![StoryId(1), StoryId(2)]);
        assert_eq!(report.failed(), vec![StoryId(1)]);
        assert!(!tracker.writes().is_empty());
    }

    #[test]
    fn rejected_credentials_stop_the_run() {
        let tracker = FakeTracker::new().failing_delivery(StoryId(1), 401);

        let report = deliver_all(&tracker, &ready(&[1, 2]));

        assert_eq!(tracker.calls(), vec![Call::DeliverStory(StoryId(1))]);
        assert!(report.aborted);
        assert_eq!(
            report.fatal().map(|(id, e)| (id, e.status())),
            Some((StoryId(1), Some(401)))
        );
        assert_eq!(report.failed(), vec![StoryId(1)]);
        assert!(report.delivered().is_empty());
    }

    #[test]
    fn rejected_comment_keeps_delivery_and_stops() {
        let tracker = FakeTracker::new().failing_comment(StoryId(1), 403);

        let report = deliver_all(&tracker, &ready(&[1, 2]));

        assert!(report.aborted);
        assert_eq!(report.delivered(), vec![StoryId(1)]);
        assert!(!tracker.calls().contains(&Call::DeliverStory(StoryId(2))));
    }

    #[test]
    fn nothing_ready_means_no_writes() {
        let tracker = FakeTracker::new();

        let report = deliver_all(&tracker, &[]);

        assert!(tracker.calls().is_empty());
        assert!(report.outcomes.is_empty());
    }
}
