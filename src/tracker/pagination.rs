//! Paginated fetches over a [`Tracker`].
//!
//! Story listings must be complete: matching against a partial listing would
//! silently skip stories, so running out of pages is an error. Activity feeds
//! are read until a short page comes back or the page bound is hit.

use thiserror::Error;
use tracing::{debug, warn};

use crate::model::{Activity, Story, StoryId};

use super::{Page, Tracker, TrackerError};

/// Page size and page bound for every paginated fetch in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub page_size: usize,
    pub max_pages: usize,
}

#[derive(Debug, Error)]
pub enum ListingError {
    #[error(transparent)]
    Tracker(#[from] TrackerError),

    #[error("more stories remain after {pages} pages ({fetched} fetched); raise max_pages")]
    Incomplete { fetched: usize, pages: usize },

    #[error("tracker reported {total} stories but stopped returning them after {fetched}")]
    Truncated { fetched: usize, total: usize },
}

/// Fetch every story in the project.
pub fn fetch_all_stories(
    tracker: &impl Tracker,
    paging: Paging,
) -> Result<Vec<Story>, ListingError> {
    let mut stories = Vec::new();

    for _ in 0..paging.max_pages {
        let page = Page {
            limit: paging.page_size,
            offset: stories.len(),
        };
        let (batch, pagination) = tracker.list_stories(page)?;
        let returned = batch.len();
        stories.extend(batch);
        debug!(offset = page.offset, returned, total = ?pagination.total, "listed stories");

        match pagination.total {
            Some(total) if stories.len() >= total => return Ok(stories),
            Some(total) if returned == 0 => {
                return Err(ListingError::Truncated {
                    fetched: stories.len(),
                    total,
                });
            }
            Some(_) => {}
            // Without a reported total, a short page is the last one.
            None if returned < paging.page_size => return Ok(stories),
            None => {}
        }
    }

    Err(ListingError::Incomplete {
        fetched: stories.len(),
        pages: paging.max_pages,
    })
}

/// Fetch a story's activity feed, newest first, in tracker order.
pub fn fetch_activity(
    tracker: &impl Tracker,
    story: StoryId,
    paging: Paging,
) -> Result<Vec<Activity>, TrackerError> {
    let mut activity = Vec::new();

    for _ in 0..paging.max_pages {
        let batch = tracker.story_activity(
            story,
            Page {
                limit: paging.page_size,
                offset: activity.len(),
            },
        )?;
        let exhausted = batch.len() < paging.page_size;
        activity.extend(batch);
        if exhausted {
            return Ok(activity);
        }
    }

    warn!(
        story = %story,
        fetched = activity.len(),
        "activity feed has more pages than max_pages; older events were not read"
    );
    Ok(activity)
}
