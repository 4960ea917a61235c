// ABOUTME: Blocking HTTP client for the Notion REST API
// ABOUTME: Handles throttling, auth headers, and maps HTTP failures to error kinds

use crate::fetch::BlockSource;
use crate::model::{ChildrenPage, RawRecord};
use crate::{Error, Result};
use rand::Rng;
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.notion.com";
pub const NOTION_VERSION: &str = "2022-06-28";

const PAGE_SIZE: &str = "100";

fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.len() <= max_chars {
        return s.to_string();
    }

    // Find a valid UTF-8 boundary at or before max_chars
    let mut boundary = max_chars;
    while boundary > 0 && !s.is_char_boundary(boundary) {
        boundary -= 1;
    }

    if boundary == 0 {
        return String::new();
    }

    format!("{}...", &s[..boundary])
}

/// Prefer the service's own `message` over the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| truncate_str(body, 100))
}

pub struct NotionClient {
    client: Client,
    base_url: String,
    token: String,
    throttle_min: u64,
    throttle_max: u64,
}

impl NotionClient {
    pub fn new(token: String, base_url: Option<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(NotionClient {
            client,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_API_BASE.into())
                .trim_end_matches('/')
                .to_string(),
            token,
            throttle_min: 350,
            throttle_max: 500,
        })
    }

    pub fn with_throttle(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.throttle_min = min_ms;
        self.throttle_max = max_ms;
        self
    }

    pub fn disable_throttle(mut self) -> Self {
        self.throttle_min = 0;
        self.throttle_max = 0;
        self
    }

    fn throttle(&self) {
        if self.throttle_max > 0 {
            let sleep_ms = rand::thread_rng().gen_range(self.throttle_min..=self.throttle_max);
            std::thread::sleep(Duration::from_millis(sleep_ms));
        }
    }

    fn get<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);

        let response = self
            .client
            .get(&url)
            .query(query)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Notion-Version", NOTION_VERSION)
            .header("Accept", "application/json")
            .header("User-Agent", "notion2md/0.1 (Rust)")
            .send()?;

        self.throttle();

        let status = response.status();
        if !status.is_success() {
            return Err(classify_failure(endpoint, response));
        }

        let body = response.text()?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(
                endpoint,
                error = %e,
                body = %truncate_str(&body, 500),
                "failed to parse response"
            );
            Error::Parse(e)
        })
    }

    pub fn list_children(&self, block_id: &str, cursor: Option<&str>) -> Result<ChildrenPage> {
        let endpoint = format!("/v1/blocks/{}/children", block_id);
        let mut query = vec![("page_size", PAGE_SIZE)];
        if let Some(cursor) = cursor {
            query.push(("start_cursor", cursor));
        }
        self.get(&endpoint, &query)
    }

    pub fn retrieve_page(&self, page_id: &str) -> Result<RawRecord> {
        self.get(&format!("/v1/pages/{}", page_id), &[])
    }
}

impl BlockSource for NotionClient {
    fn list_children(&self, block_id: &str, cursor: Option<&str>) -> Result<ChildrenPage> {
        NotionClient::list_children(self, block_id, cursor)
    }

    fn retrieve_page(&self, page_id: &str) -> Result<RawRecord> {
        NotionClient::retrieve_page(self, page_id)
    }
}

fn classify_failure(endpoint: &str, response: Response) -> Error {
    let status = response.status();
    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok());
    let message = error_message(&response.text().unwrap_or_default());

    classify_status(endpoint, status, message, retry_after)
}

fn classify_status(
    endpoint: &str,
    status: StatusCode,
    message: String,
    retry_after: Option<u64>,
) -> Error {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::Auth(format!("{} on {}: {}", status.as_u16(), endpoint, message))
        }
        StatusCode::NOT_FOUND => Error::NotFound(format!("{}: {}", endpoint, message)),
        StatusCode::TOO_MANY_REQUESTS => Error::RateLimited {
            endpoint: endpoint.into(),
            retry_after,
        },
        s if s.is_server_error() => Error::Transient {
            endpoint: endpoint.into(),
            status: s.as_u16(),
            message,
        },
        s => Error::Api {
            endpoint: endpoint.into(),
            status: s.as_u16(),
            message,
        },
    }
}
