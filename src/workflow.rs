//! The two `out` workflows, wired end to end.
//!
//! Delivery runs scan → match → resolve → deliver, one pass, nothing kept
//! between runs. Every fatal step returns before the next stage starts, so
//! a failed listing or activity fetch means nothing is delivered.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::config::{Settings, Workflow};
use crate::deliver::{DeliveryReport, deliver_all};
use crate::error::{FileError, OutError};
use crate::matcher::find_candidates;
use crate::model::{NewStory, Story, StoryId, StoryState, StoryType};
use crate::resolve::{SkipReason, resolve};
use crate::scan::{Repository, ScanOptions, scan_repositories};
use crate::tracker::{Paging, Tracker};

/// What a successful run did.
#[derive(Debug)]
pub enum Completed {
    Created(Story),

    /// The delivery pass ran to the end. Individual stories may still have
    /// failed; the report says which.
    Delivered {
        skipped: Vec<(StoryId, SkipReason)>,
        report: DeliveryReport,
    },
}

/// Run the workflow the settings select.
pub fn run(settings: &Settings, tracker: &impl Tracker) -> Result<Completed, OutError> {
    match &settings.workflow {
        Workflow::Create { content } => create(tracker, content),
        Workflow::Deliver {
            comment,
            repos,
            scan,
        } => deliver(tracker, comment, repos, scan, settings.paging),
    }
}

fn create(tracker: &impl Tracker, content: &Path) -> Result<Completed, OutError> {
    let name = read_text(content).map_err(OutError::ContentFile)?;

    let story = tracker
        .create_story(&NewStory {
            name: name.trim().to_string(),
            story_type: StoryType::Chore,
            current_state: StoryState::Unscheduled,
        })
        .map_err(OutError::CreateStory)?;

    Ok(Completed::Created(story))
}

fn deliver(
    tracker: &impl Tracker,
    comment: &Path,
    repos: &[Repository],
    scan: &ScanOptions,
    paging: Paging,
) -> Result<Completed, OutError> {
    let comment = read_text(comment).map_err(OutError::CommentFile)?;

    if repos.is_empty() {
        warn!("no repositories listed in params; nothing to deliver");
    }
    let scanned = scan_repositories(repos, scan);
    if scanned.nothing_scanned(repos.len()) {
        return Err(OutError::NothingScanned(repos.len()));
    }
    info!(stories = scanned.references.len(), "found story references");

    let candidates = find_candidates(tracker, &scanned.references, paging)?;
    let resolution = resolve(tracker, candidates, &comment, paging)?;
    let report = deliver_all(tracker, &resolution.ready);

    Ok(Completed::Delivered {
        skipped: resolution.skipped,
        report,
    })
}

/// Read a request file as text, byte for byte.
fn read_text(path: &Path) -> Result<String, FileError> {
    let bytes = fs::read(path).map_err(|source| FileError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    String::from_utf8(bytes).map_err(|_| FileError::NotUtf8(path.to_path_buf()))
}
