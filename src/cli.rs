//! CLI interface.
//!
//! The binary is a pipeline resource step: the request arrives as JSON on
//! stdin, progress and diagnostics go to stderr, and the response JSON is the
//! only thing written to stdout.
//!
//! `out <sources>` either creates a story (`params.content`) or delivers the
//! finished stories that commits in `params.repos` reference
//! (`params.comment`). Request paths resolve against `<sources>`.

mod format;

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use jiff::Timestamp;

use crate::config::Settings;
use crate::deliver::DeliveryReport;
use crate::error::OutError;
use crate::model::{MetadataPair, OutRequest, OutResponse, Version};
use crate::tracker::HttpTracker;
use crate::workflow::{self, Completed};

use format::{format_outcome, format_skip, format_story_ids};

/// Tracker story resource: deliver finished stories referenced by commits.
#[derive(Debug, Parser)]
#[command(name = "tracker-story-resource", version, after_long_help = REQUEST_HELP)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

const REQUEST_HELP: &str = r#"Request (stdin):
  {
    "source": {"token": "...", "project_id": "1234", "tracker_url": "..."},
    "params": {"comment": "comment.txt", "repos": ["middle/git3"]}
  }

Use "content" instead of "comment" to create a story named after the file."#;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the put step.
    ///
    /// Reads the request from stdin and writes the new version to stdout.
    Out {
        /// Directory the request's relative paths resolve against.
        sources: PathBuf,
    },
}

/// Run the CLI.
pub fn run(cli: Cli) -> Result<(), OutError> {
    match cli.command {
        Command::Out { sources } => cmd_out(&sources, io::stdin().lock(), io::stdout().lock()),
    }
}

fn cmd_out(sources: &Path, input: impl Read, mut output: impl Write) -> Result<(), OutError> {
    let request: OutRequest = serde_json::from_reader(input).map_err(OutError::Request)?;
    let settings = Settings::resolve(&request, sources)?;
    let tracker = HttpTracker::new(&settings.tracker_url, &settings.token, settings.project_id)
        .map_err(OutError::Client)?;

    let metadata = match workflow::run(&settings, &tracker)? {
        Completed::Created(story) => {
            eprintln!("Story created with ID: {} Name: {}", story.id, story.name);
            vec![
                MetadataPair::new("id", story.id.to_string()),
                MetadataPair::new("name", story.name),
            ]
        }
        Completed::Delivered { skipped, report } => {
            for (story, reason) in &skipped {
                eprintln!("{}", format_skip(*story, reason));
            }
            for (story, outcome) in &report.outcomes {
                eprintln!("{}", format_outcome(*story, outcome));
            }
            if report.outcomes.is_empty() {
                eprintln!("No stories ready for delivery");
            }
            delivery_metadata(&report)?
        }
    };

    let response = OutResponse {
        version: Version {
            time: Timestamp::now(),
        },
        metadata,
    };
    serde_json::to_writer(&mut output, &response).map_err(OutError::Response)?;
    let _ = writeln!(output);
    Ok(())
}

/// Metadata for a clean delivery pass, or the error that fails the step.
fn delivery_metadata(report: &DeliveryReport) -> Result<Vec<MetadataPair>, OutError> {
    if let Some((story, e)) = report.fatal() {
        return Err(OutError::DeliveryAborted {
            story,
            message: e.to_string(),
        });
    }

    let failed = report.failed();
    if !failed.is_empty() {
        return Err(OutError::DeliveryFailures {
            failed: failed.len(),
            attempted: report.outcomes.len(),
            stories: format_story_ids(&failed),
        });
    }

    Ok(report
        .delivered()
        .into_iter()
        .map(|story| MetadataPair::new("delivered", format!("#{story}")))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    use crate::deliver::StoryOutcome;
    use crate::model::StoryId;
    use crate::tracker::TrackerError;

    fn status(status: u16) -> TrackerError {
        TrackerError::Status {
            status,
            message: "nope".into(),
        }
    }

    #[test]
    fn clean_pass_lists_delivered_stories() {
        let report = DeliveryReport {
            outcomes: vec![
                (StoryId(1), StoryOutcome::Delivered),
                (StoryId(2), StoryOutcome::Delivered),
            ],
            aborted: false,
        };

        assert_eq!(
            delivery_metadata(&report).unwrap(),
            vec![
                MetadataPair::new("delivered", "#1"),
                MetadataPair::new("delivered", "#2"),
            ]
        );
    }

    #[test]
    fn any_failure_fails_the_step() {
        let report = DeliveryReport {
            outcomes: vec![
                (StoryId(1), StoryOutcome::DeliveryFailed(status(500))),
                (StoryId(2), StoryOutcome::Delivered),
                (StoryId(3), StoryOutcome::CommentFailed(status(422))),
            ],
            aborted: false,
        };

        let err = delivery_metadata(&report).unwrap_err();

        assert_eq!(
            err.to_string(),
            "error delivering stories: 2 of 3 failed (#1, #3)"
        );
    }

    #[test]
    fn rejected_credentials_are_reported_as_abort() {
        let report = DeliveryReport {
            outcomes: vec![(StoryId(7), StoryOutcome::DeliveryFailed(status(401)))],
            aborted: true,
        };

        let err = delivery_metadata(&report).unwrap_err();

        assert!(matches!(
            err,
            OutError::DeliveryAborted {
                story: StoryId(7),
                ..
            }
        ));
    }

    #[test]
    fn empty_pass_has_no_metadata() {
        assert!(
            delivery_metadata(&DeliveryReport::default())
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn malformed_request_is_rejected_before_anything_else() {
        let mut output = Vec::new();

        let err = cmd_out(Path::new("."), "{not json".as_bytes(), &mut output).unwrap_err();

        assert!(matches!(err, OutError::Request(_)));
        assert!(output.is_empty());
    }

    #[test]
    fn missing_files_param_is_rejected() {
        let request = r#"{"source": {"token": "abc", "project_id": "1234"}, "params": {}}"#;
        let mut output = Vec::new();

        let err = cmd_out(Path::new("."), request.as_bytes(), &mut output).unwrap_err();

        assert_eq!(
            err.to_string(),
            "error loading params: no content file specified"
        );
        assert!(output.is_empty());
    }
}
