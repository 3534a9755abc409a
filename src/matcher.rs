//! Story matching: which referenced stories exist in the tracker.
//!
//! The tracker's listing is authoritative. Ids that commits mention but the
//! project doesn't contain are dropped with a warning.

use std::collections::HashMap;

use tracing::warn;

use crate::model::{CommitReference, Story};
use crate::scan::References;
use crate::tracker::{ListingError, Paging, Tracker, fetch_all_stories};

/// A story that commits reference and the tracker confirms exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub story: Story,
    pub references: Vec<CommitReference>,
}

/// Fetch the full story listing and intersect it with the scanned references.
///
/// No references means no candidates, and the listing is not fetched.
pub fn find_candidates(
    tracker: &impl Tracker,
    references: &References,
    paging: Paging,
) -> Result<Vec<Candidate>, ListingError> {
    if references.is_empty() {
        return Ok(Vec::new());
    }

    let stories = fetch_all_stories(tracker, paging)?;
    Ok(match_stories(references, stories))
}

/// Intersect by id. The result is in ascending id order.
pub fn match_stories(references: &References, stories: Vec<Story>) -> Vec<Candidate> {
    let mut listed: HashMap<_, _> = stories.into_iter().map(|s| (s.id, s)).collect();

    references
        .iter()
        .filter_map(|(id, refs)| {
            let Some(story) = listed.remove(id) else {
                warn!(story = %id, "referenced story is not in the project; skipping");
                return None;
            };
            Some(Candidate {
                story,
                references: refs.clone(),
            })
        })
        .collect()
}
