//! Pivotal Tracker v5 client over blocking HTTP.

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::HeaderMap;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use crate::model::{Activity, NewStory, Story, StoryId};

use super::{Page, Pagination, Tracker, TrackerError};

const TOKEN_HEADER: &str = "X-TrackerToken";

/// A tracker client scoped to one project.
///
/// Holds a single connection pool and the API token for the whole run.
pub struct HttpTracker {
    client: Client,
    project_url: String,
    token: String,
}

impl HttpTracker {
    pub fn new(
        base_url: &str,
        token: impl Into<String>,
        project_id: u64,
    ) -> Result<Self, TrackerError> {
        let client = Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self {
            client,
            project_url: format!(
                "{}/services/v5/projects/{project_id}",
                base_url.trim_end_matches('/')
            ),
            token: token.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.project_url)
    }

    /// Send with the token attached, turning non-success statuses into errors.
    fn send(&self, request: RequestBuilder) -> Result<Response, TrackerError> {
        let response = request.header(TOKEN_HEADER, &self.token).send()?;
        let status = response.status();
        debug!(url = %response.url(), status = status.as_u16(), "tracker response");

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        Err(TrackerError::Status {
            status: status.as_u16(),
            message: error_message(&body, status.canonical_reason()),
        })
    }
}

impl Tracker for HttpTracker {
    fn list_stories(&self, page: Page) -> Result<(Vec<Story>, Pagination), TrackerError> {
        let request = self
            .client
            .get(self.url("/stories"))
            .query(&[("limit", page.limit), ("offset", page.offset)]);
        let response = self.send(request)?;
        let pagination = pagination(response.headers());
        Ok((decode(response)?, pagination))
    }

    fn story_activity(&self, story: StoryId, page: Page) -> Result<Vec<Activity>, TrackerError> {
        let request = self
            .client
            .get(self.url(&format!("/stories/{story}/activity")))
            .query(&[("limit", page.limit), ("offset", page.offset)]);
        decode(self.send(request)?)
    }

    fn deliver_story(&self, story: StoryId) -> Result<(), TrackerError> {
        let request = self
            .client
            .put(self.url(&format!("/stories/{story}")))
            .json(&json!({ "current_state": "delivered" }));
        self.send(request)?;
        Ok(())
    }

    fn post_comment(&self, story: StoryId, text: &str) -> Result<(), TrackerError> {
        let request = self
            .client
            .post(self.url(&format!("/stories/{story}/comments")))
            .json(&json!({ "text": text }));
        self.send(request)?;
        Ok(())
    }

    fn create_story(&self, story: &NewStory) -> Result<Story, TrackerError> {
        let request = self.client.post(self.url("/stories")).json(story);
        decode(self.send(request)?)
    }
}

fn decode<T: DeserializeOwned>(response: Response) -> Result<T, TrackerError> {
    response.json().map_err(TrackerError::Decode)
}

/// Read the `X-Tracker-Pagination-*` headers.
fn pagination(headers: &HeaderMap) -> Pagination {
    let field = |name: &str| {
        headers
            .get(format!("X-Tracker-Pagination-{name}"))
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
    };

    Pagination {
        total: field("Total"),
        limit: field("Limit"),
        offset: field("Offset"),
        returned: field("Returned"),
    }
}

/// Error body shape returned by the tracker.
#[derive(Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    general_problem: Option<String>,
}

fn error_message(body: &str, reason: Option<&str>) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return match parsed.general_problem {
            Some(problem) => format!("{} ({problem})", parsed.error),
            None => parsed.error,
        };
    }

    let body = body.trim();
    if body.is_empty() {
        reason.unwrap_or("no response body").to_string()
    } else {
        body.to_string()
    }
}
