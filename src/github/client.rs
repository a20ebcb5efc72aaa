// GitHub API HTTP client.
// Handles authentication, rate limiting, pagination links, and response checking.

use reqwest::{
    Client, Response, StatusCode, Url,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, LINK, USER_AGENT},
};
use serde::de::DeserializeOwned;

use crate::error::{GhselError, Result};

use super::types::{Page, RateLimit};

pub const GITHUB_API_BASE: &str = "https://api.github.com";
const GITHUB_API_VERSION: &str = "2022-11-28";

/// GitHub API client with authentication and rate limit tracking.
pub struct GitHubClient {
    client: Client,
    base_url: String,
    rate_limit: RateLimit,
}

impl GitHubClient {
    /// Create a new GitHub client with the given token.
    pub fn new(token: &str) -> Result<Self> {
        Self::with_base_url(token, GITHUB_API_BASE)
    }

    /// Create a client against a different API root (GitHub Enterprise, tests).
    pub fn with_base_url(token: &str, base_url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();

        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| GhselError::Other(e.to_string()))?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("ghsel"));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(GhselError::Api)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            rate_limit: RateLimit::default(),
        })
    }

    /// Get the current rate limit information.
    pub fn rate_limit(&self) -> &RateLimit {
        &self.rate_limit
    }

    /// Make a GET request with query parameters.
    pub async fn get_with_params<T: serde::Serialize + ?Sized>(
        &mut self,
        endpoint: &str,
        params: &T,
    ) -> Result<Response> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(GhselError::Api)?;

        self.update_rate_limit(&response);
        self.check_response(response).await
    }

    /// GET one page of a list endpoint, decoding the body and the next-page link.
    pub async fn get_page<T: DeserializeOwned>(
        &mut self,
        endpoint: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Page<T>> {
        let params = [
            ("page", page.to_string()),
            ("per_page", per_page.to_string()),
        ];
        let response = self.get_with_params(endpoint, &params).await?;
        let next_page = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(next_page_from_link);
        let body = response.text().await.map_err(GhselError::Api)?;
        let items: Vec<T> = serde_json::from_str(&body)?;
        Ok(Page { items, next_page })
    }

    /// Update rate limit from response headers.
    fn update_rate_limit(&mut self, response: &Response) {
        if let Some(limit) = header_u64(response, "x-ratelimit-limit") {
            self.rate_limit.limit = limit;
        }
        if let Some(remaining) = header_u64(response, "x-ratelimit-remaining") {
            self.rate_limit.remaining = remaining;
        }
        if let Some(reset) = header_u64(response, "x-ratelimit-reset") {
            self.rate_limit.reset = reset;
        }
    }

    /// Check response status and convert errors.
    async fn check_response(&self, response: Response) -> Result<Response> {
        match response.status() {
            StatusCode::OK => Ok(response),
            StatusCode::UNAUTHORIZED => Err(GhselError::Unauthorized),
            StatusCode::NOT_FOUND => {
                let url = response.url().to_string();
                Err(GhselError::NotFound(url))
            }
            StatusCode::FORBIDDEN if self.rate_limit.limit > 0 && self.rate_limit.remaining == 0 => {
                let reset_at = chrono::DateTime::from_timestamp(self.rate_limit.reset as i64, 0)
                    .map(|dt| dt.format("%H:%M:%S").to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                Err(GhselError::RateLimited { reset_at })
            }
            StatusCode::FORBIDDEN => Err(GhselError::Forbidden(
                response.text().await.unwrap_or_default(),
            )),
            status => Err(GhselError::Status {
                status,
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }
}

fn header_u64(response: &Response, name: &str) -> Option<u64> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

/// Extract the `page` query parameter of the `rel="next"` entry of a Link header.
///
/// `<https://api.github.com/organizations/1/repos?page=2>; rel="next", <...>; rel="last"`
pub fn next_page_from_link(link: &str) -> Option<u32> {
    link.split(',').find_map(|entry| {
        let (target, params) = entry.split_once(';')?;
        let is_next = params
            .split(';')
            .any(|p| p.trim().trim_start_matches("rel=").trim_matches('"') == "next");
        if !is_next {
            return None;
        }
        let url = target.trim().trim_start_matches('<').trim_end_matches('>');
        Url::parse(url)
            .ok()?
            .query_pairs()
            .find(|(key, _)| key == "page")
            .and_then(|(_, value)| value.parse().ok())
    })
}
