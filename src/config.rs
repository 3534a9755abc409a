//! Run settings.
//!
//! Resolved once from the request's `source` and `params` before any file is
//! read or any tracker call is made. Defaults are filled in here so the rest
//! of the run never looks at the raw request.

use std::num::ParseIntError;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::{OutRequest, Params, Source};
use crate::scan::{Repository, ScanOptions};
use crate::tracker::Paging;

/// The public tracker, used when `tracker_url` is empty or missing.
pub const DEFAULT_TRACKER_URL: &str = "https://www.pivotaltracker.com";

pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Largest page the tracker will return.
pub const MAX_PAGE_SIZE: usize = 500;

pub const DEFAULT_MAX_PAGES: usize = 50;

pub const DEFAULT_MAX_COMMITS: usize = 500;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("converting the project ID to an integer: {0}")]
    ProjectId(#[source] ParseIntError),

    #[error("loading params: no content file specified")]
    NoContentFile,

    #[error("loading params: content and comment files are mutually exclusive")]
    ConflictingFiles,
}

/// Everything a run needs, validated.
#[derive(Debug, Clone)]
pub struct Settings {
    pub tracker_url: String,
    pub token: String,
    pub project_id: u64,
    pub paging: Paging,
    pub workflow: Workflow,
}

/// Which of the two `out` workflows this request selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Workflow {
    /// Create one story named after the content file.
    Create { content: PathBuf },

    /// Deliver finished stories referenced by commits, commenting on each.
    Deliver {
        comment: PathBuf,
        repos: Vec<Repository>,
        scan: ScanOptions,
    },
}

impl Settings {
    /// Validate a request. Relative paths resolve against `sources`.
    pub fn resolve(request: &OutRequest, sources: &Path) -> Result<Self, ConfigError> {
        let Source {
            tracker_url,
            token,
            project_id,
            page_size,
            max_pages,
        } = &request.source;

        let project_id = project_id
            .trim()
            .parse()
            .map_err(ConfigError::ProjectId)?;

        let tracker_url = tracker_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or(DEFAULT_TRACKER_URL)
            .to_string();

        let paging = Paging {
            page_size: page_size
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
            max_pages: max_pages.unwrap_or(DEFAULT_MAX_PAGES).max(1),
        };

        Ok(Self {
            tracker_url,
            token: token.clone(),
            project_id,
            paging,
            workflow: Workflow::select(&request.params, sources)?,
        })
    }
}

impl Workflow {
    fn select(params: &Params, sources: &Path) -> Result<Self, ConfigError> {
        // An empty path counts as not given.
        let given = |p: &Option<PathBuf>| {
            p.as_ref()
                .filter(|p| !p.as_os_str().is_empty())
                .map(|p| sources.join(p))
        };

        match (given(&params.content_path), given(&params.comment_path)) {
            (Some(_), Some(_)) => Err(ConfigError::ConflictingFiles),
            (Some(content), None) => Ok(Self::Create { content }),
            (None, Some(comment)) => Ok(Self::Deliver {
                comment,
                repos: params
                    .repos
                    .iter()
                    .map(|name| Repository {
                        name: name.clone(),
                        path: sources.join(name),
                    })
                    .collect(),
                scan: ScanOptions {
                    since: params.since.clone().filter(|s| !s.trim().is_empty()),
                    max_commits: params.max_commits.unwrap_or(DEFAULT_MAX_COMMITS).max(1),
                },
            }),
            (None, None) => Err(ConfigError::NoContentFile),
        }
    }
}
