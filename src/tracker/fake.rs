//! Recording in-memory tracker for tests.

use std::cell::RefCell;
use std::collections::HashMap;

use jiff::Timestamp;

use crate::model::{Activity, Change, ChangeValues, NewStory, Story, StoryId, StoryState, StoryType};

use super::{Page, Pagination, Tracker, TrackerError};

/// A call the pipeline made, in the order it made it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListStories { offset: usize },
    StoryActivity { story: StoryId, offset: usize },
    DeliverStory(StoryId),
    PostComment(StoryId, String),
    DeliverStoryWithComment(StoryId, String),
    CreateStory(String),
}

#[derive(Default)]
pub struct FakeTracker {
    stories: Vec<Story>,
    report_total: Option<Option<usize>>,
    activity: HashMap<StoryId, Vec<Activity>>,
    fail_listing: Option<u16>,
    fail_activity: HashMap<StoryId, u16>,
    fail_delivery: HashMap<StoryId, u16>,
    fail_comment: HashMap<StoryId, u16>,
    next_id: u64,
    calls: RefCell<Vec<Call>>,
}

impl FakeTracker {
    pub fn new() -> Self {
        Self {
            next_id: 2300,
            ..Self::default()
        }
    }

    pub fn with_stories(mut self, stories: Vec<Story>) -> Self {
        self.stories = stories;
        self
    }

    /// Report this total in every listing response instead of the real count.
    pub fn with_reported_total(mut self, total: usize) -> Self {
        self.report_total = Some(Some(total));
        self
    }

    pub fn without_pagination_headers(mut self) -> Self {
        self.report_total = Some(None);
        self
    }

    pub fn with_activity(mut self, story: StoryId, feed: Vec<Activity>) -> Self {
        self.activity.insert(story, feed);
        self
    }

    pub fn failing_listing(mut self, status: u16) -> Self {
        self.fail_listing = Some(status);
        self
    }

    pub fn failing_activity(mut self, story: StoryId, status: u16) -> Self {
        self.fail_activity.insert(story, status);
        self
    }

    pub fn failing_delivery(mut self, story: StoryId, status: u16) -> Self {
        self.fail_delivery.insert(story, status);
        self
    }

    pub fn failing_comment(mut self, story: StoryId, status: u16) -> Self {
        self.fail_comment.insert(story, status);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// Calls that change tracker state.
    pub fn writes(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| {
                !matches!(
                    c,
                    Call::ListStories { .. } | Call::StoryActivity { .. }
                )
            })
            .collect()
    }

    pub fn listing_offsets(&self) -> Vec<usize> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::ListStories { offset } => Some(offset),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

fn failure(status: Option<&u16>) -> Result<(), TrackerError> {
    match status {
        Some(&status) => Err(TrackerError::Status {
            status,
            message: "fake failure".into(),
        }),
        None => Ok(()),
    }
}

fn window<T: Clone>(items: &[T], page: Page) -> Vec<T> {
    items
        .iter()
        .skip(page.offset)
        .take(page.limit)
        .cloned()
        .collect()
}

impl Tracker for FakeTracker {
    fn list_stories(&self, page: Page) -> Result<(Vec<Story>, Pagination), TrackerError> {
        self.record(Call::ListStories {
            offset: page.offset,
        });
        failure(self.fail_listing.as_ref())?;

        let batch = window(&self.stories, page);
        let pagination = match self.report_total {
            Some(None) => Pagination::default(),
            Some(Some(total)) => Pagination {
                total: Some(total),
                ..Pagination::default()
            },
            None => Pagination {
                total: Some(self.stories.len()),
                limit: Some(page.limit),
                offset: Some(page.offset),
                returned: Some(batch.len()),
            },
        };
        Ok((batch, pagination))
    }

    fn story_activity(&self, story: StoryId, page: Page) -> Result<Vec<Activity>, TrackerError> {
        self.record(Call::StoryActivity {
            story,
            offset: page.offset,
        });
        failure(self.fail_activity.get(&story))?;

        Ok(self
            .activity
            .get(&story)
            .map(|feed| window(feed, page))
            .unwrap_or_default())
    }

    fn deliver_story(&self, story: StoryId) -> Result<(), TrackerError> {
        self.record(Call::DeliverStory(story));
        failure(self.fail_delivery.get(&story))
    }

    fn post_comment(&self, story: StoryId, text: &str) -> Result<(), TrackerError> {
        self.record(Call::PostComment(story, text.to_string()));
        failure(self.fail_comment.get(&story))
    }

    fn deliver_story_with_comment(&self, story: StoryId, text: &str) -> Result<(), TrackerError> {
        self.record(Call::DeliverStoryWithComment(story, text.to_string()));
        failure(self.fail_delivery.get(&story))?;
        failure(self.fail_comment.get(&story))
    }

    fn create_story(&self, story: &NewStory) -> Result<Story, TrackerError> {
        self.record(Call::CreateStory(story.name.clone()));
        Ok(Story {
            id: StoryId(self.next_id),
            name: story.name.clone(),
            story_type: story.story_type,
            current_state: story.current_state,
        })
    }
}

pub fn story(id: u64, state: StoryState) -> Story {
    Story {
        id: StoryId(id),
        name: format!("story {id}"),
        story_type: StoryType::Feature,
        current_state: state,
    }
}

/// An activity with no state changes.
pub fn activity_at(occurred_at: &str) -> Activity {
    Activity {
        kind: "comment_create_activity".into(),
        message: None,
        highlight: None,
        occurred_at: occurred_at.parse().unwrap(),
        changes: Vec::new(),
    }
}

/// An activity that moved `story` into `state`.
pub fn state_change(story: StoryId, state: StoryState, occurred_at: &str) -> Activity {
    Activity {
        kind: "story_update_activity".into(),
        message: Some(format!("someone {state} this feature")),
        highlight: Some(state.to_string()),
        occurred_at: occurred_at.parse::<Timestamp>().unwrap(),
        changes: vec![Change {
            kind: "story".into(),
            id: Some(story.0),
            change_type: Some("update".into()),
            new_values: Some(ChangeValues {
                current_state: Some(state),
            }),
        }],
    }
}
