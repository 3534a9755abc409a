//! Core data model for the tracker resource.
//!
//! These types represent the pieces the `out` step reconciles:
//! tracker stories and their activity, commits that reference them,
//! and the request/response exchanged with the CI system.

mod activity;
mod reference;
mod request;
mod story;

pub use activity::Activity;
#[cfg(test)]
pub use activity::{Change, ChangeValues};
pub use reference::CommitReference;
pub use request::{MetadataPair, OutRequest, OutResponse, Params, Source, Version};
pub use story::{NewStory, Story, StoryId, StoryState, StoryType};
