//! Tracker client: the verbs the pipeline needs from the issue tracker.
//!
//! The pipeline depends only on the [`Tracker`] trait. [`HttpTracker`] talks to
//! the Pivotal Tracker v5 API; tests use a recording fake.
//!
//! A client is scoped to one project when it is built, so none of the verbs
//! take a project id.

mod client;
mod error;
#[cfg(test)]
pub mod fake;
mod pagination;

pub use client::HttpTracker;
pub use error::TrackerError;
pub use pagination::{ListingError, Paging, fetch_activity, fetch_all_stories};

use crate::model::{Activity, NewStory, Story, StoryId};

/// One page of a listing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

/// Pagination metadata that accompanies a listing response.
///
/// Each field is `None` when the tracker did not report it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    pub total: Option<usize>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub returned: Option<usize>,
}

/// The tracker capabilities the pipeline consumes.
///
/// Calls are made sequentially from one thread; implementations may cache
/// connection and auth state between calls but never story state.
pub trait Tracker {
    /// List one page of the project's stories.
    fn list_stories(&self, page: Page) -> Result<(Vec<Story>, Pagination), TrackerError>;

    /// Fetch one page of a story's activity feed, newest first.
    fn story_activity(&self, story: StoryId, page: Page) -> Result<Vec<Activity>, TrackerError>;

    /// Move a story to the delivered state.
    fn deliver_story(&self, story: StoryId) -> Result<(), TrackerError>;

    /// Append a comment to a story.
    fn post_comment(&self, story: StoryId, text: &str) -> Result<(), TrackerError>;

    /// Deliver a story, then comment on it.
    ///
    /// The comment is only posted once the delivery call has succeeded.
    fn deliver_story_with_comment(&self, story: StoryId, text: &str) -> Result<(), TrackerError> {
        self.deliver_story(story)?;
        self.post_comment(story, text)
    }

    /// Create a story and return it as the tracker stored it.
    fn create_story(&self, story: &NewStory) -> Result<Story, TrackerError>;
}
