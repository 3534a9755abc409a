//! Commit reference scanning.
//!
//! Reads each repository's history with `git log` and collects the story ids
//! its commit messages mention as `#<digits>`. Repositories are scanned
//! independently: one that is missing or not a repository is reported and
//! skipped so the others still count.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;

use jiff::Timestamp;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::{CommitReference, StoryId};

/// Commits that mention each story, keyed in ascending id order.
pub type References = BTreeMap<StoryId, Vec<CommitReference>>;

/// Field and record separators in the `git log` format string.
const FIELD_SEP: char = '\x1f';
const RECORD_SEP: char = '\x1e';

/// `#123`, not preceded by a word character, `&` (HTML entities) or another
/// `#`. The digits must end at a word boundary.
static STORY_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\w&#])#(\d+)\b").expect("story reference pattern is valid")
});

/// A repository to scan, as named in the request and as found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub name: String,
    pub path: PathBuf,
}

/// How much history to read from each repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Only read commits after this revision.
    pub since: Option<String>,

    /// Read at most this many commits.
    pub max_commits: usize,
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("{} is not the root of a git repository", .0.display())]
    NotARepository(PathBuf),

    #[error("unknown revision {0:?}")]
    UnknownRevision(String),

    #[error("failed to run git: {0}")]
    Spawn(#[source] io::Error),

    #[error("git log failed: {0}")]
    Git(String),
}

/// What a scan across all repositories produced.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub references: References,

    /// Repositories that could not be scanned, by name.
    pub failures: Vec<(String, ScanError)>,
}

impl ScanReport {
    /// Every listed repository failed, so nothing was scanned at all.
    pub fn nothing_scanned(&self, listed: usize) -> bool {
        listed > 0 && self.failures.len() == listed
    }
}

/// A commit as read from `git log`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Commit {
    sha: String,
    committed_at: Timestamp,
    message: String,
}

/// Scan every repository in order.
pub fn scan_repositories(repos: &[Repository], options: &ScanOptions) -> ScanReport {
    let mut report = ScanReport::default();

    for repo in repos {
        let commits = match read_commits(&repo.path, options) {
            Ok(commits) => commits,
            Err(e) => {
                warn!(repo = %repo.name, error = %e, "skipping repository");
                report.failures.push((repo.name.clone(), e));
                continue;
            }
        };
        debug!(repo = %repo.name, commits = commits.len(), "scanned repository");

        for commit in commits {
            let subject = commit.message.lines().next().unwrap_or_default();
            for id in story_references(&commit.message) {
                report
                    .references
                    .entry(id)
                    .or_default()
                    .push(CommitReference {
                        repo: repo.name.clone(),
                        sha: commit.sha.clone(),
                        committed_at: commit.committed_at,
                        subject: subject.to_string(),
                    });
            }
        }
    }

    report
}

/// Story ids mentioned in a commit message, each once.
///
/// Numbers too large for an id are skipped.
pub fn story_references(message: &str) -> BTreeSet<StoryId> {
    STORY_REFERENCE
        .captures_iter(message)
        .filter_map(|c| c[1].parse().ok().map(StoryId))
        .collect()
}

fn read_commits(path: &Path, options: &ScanOptions) -> Result<Vec<Commit>, ScanError> {
    if !path.is_dir() {
        return Err(ScanError::NotADirectory(path.to_path_buf()));
    }

    ensure_repository_root(path)?;

    let format = format!("--format=%H{FIELD_SEP}%ct{FIELD_SEP}%B{RECORD_SEP}");
    let max_count = format!("--max-count={}", options.max_commits);
    let mut args = vec!["log", format.as_str(), max_count.as_str(), "--end-of-options"];

    let range = match &options.since {
        Some(since) => Some(format!("{}..HEAD", verify_revision(path, since)?)),
        None => None,
    };
    if let Some(range) = &range {
        args.push(range.as_str());
    }

    let output = run_git(path, &args)?;
    Ok(parse_log(&output))
}

/// Git looks for a repository in parent directories too. Only accept `path`
/// when it is the top level of its own work tree.
fn ensure_repository_root(path: &Path) -> Result<(), ScanError> {
    let not_a_repository = || ScanError::NotARepository(path.to_path_buf());

    let toplevel = match run_git(path, &["rev-parse", "--show-toplevel"]) {
        Ok(toplevel) => toplevel,
        Err(ScanError::Git(_)) => return Err(not_a_repository()),
        Err(e) => return Err(e),
    };

    let toplevel = fs::canonicalize(toplevel.trim()).map_err(|_| not_a_repository())?;
    let path = fs::canonicalize(path).map_err(|_| not_a_repository())?;
    if toplevel == path {
        Ok(())
    } else {
        Err(not_a_repository())
    }
}

/// Resolve `since` to a commit id. The revision is never read as an option.
fn verify_revision(path: &Path, since: &str) -> Result<String, ScanError> {
    let spec = format!("{since}^{{commit}}");
    match run_git(
        path,
        &["rev-parse", "--verify", "--quiet", "--end-of-options", spec.as_str()],
    ) {
        Ok(sha) => Ok(sha.trim().to_string()),
        Err(ScanError::Git(_)) => Err(ScanError::UnknownRevision(since.to_string())),
        Err(e) => Err(e),
    }
}

/// Split `git log` output into commits, skipping records that don't parse.
fn parse_log(output: &str) -> Vec<Commit> {
    output
        .split(RECORD_SEP)
        .map(|record| record.trim_start_matches('\n'))
        .filter(|record| !record.is_empty())
        .filter_map(|record| {
            let mut fields = record.splitn(3, FIELD_SEP);
            let sha = fields.next()?;
            let seconds = fields.next()?.parse().ok()?;
            let message = fields.next()?;
            Some(Commit {
                sha: sha.to_string(),
                committed_at: Timestamp::from_second(seconds).ok()?,
                message: message.trim_end().to_string(),
            })
        })
        .collect()
}

/// Run a git command in `dir` and return its stdout on success.
fn run_git(dir: &Path, args: &[&str]) -> Result<String, ScanError> {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .output()
        .map_err(ScanError::Spawn)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ScanError::Git(stderr.trim().to_string()));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
