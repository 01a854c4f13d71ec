//! Robots.txt handling module
//!
//! The crawl engine asks an [`AccessPolicy`] a yes/no question before each
//! fetch. [`RobotsPolicy`] answers it from robots.txt, fetched once per origin
//! and cached for a day; [`AllowAll`] answers yes.

mod cache;
mod parser;

pub use cache::CachedRobots;
pub use parser::ParsedRobots;

use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use url::Url;

/// Boolean allow/deny collaborator consulted before every fetch
#[async_trait]
pub trait AccessPolicy: Send {
    async fn is_allowed(&mut self, url: &str) -> bool;
}

/// Policy that never denies
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

#[async_trait]
impl AccessPolicy for AllowAll {
    async fn is_allowed(&mut self, _url: &str) -> bool {
        true
    }
}

/// Policy backed by each origin's robots.txt
pub struct RobotsPolicy {
    client: Client,
    agent_token: String,
    cache: HashMap<String, CachedRobots>,
}

impl RobotsPolicy {
    /// Creates a policy evaluating rules for `agent_token` (e.g. `SumiScribe`)
    pub fn new(client: Client, agent_token: impl Into<String>) -> Self {
        Self {
            client,
            agent_token: agent_token.into(),
            cache: HashMap::new(),
        }
    }

    /// Number of origins with cached rules
    pub fn cached_origins(&self) -> usize {
        self.cache.len()
    }
}

#[async_trait]
impl AccessPolicy for RobotsPolicy {
    async fn is_allowed(&mut self, url: &str) -> bool {
        let origin = match Url::parse(url) {
            Ok(parsed) => parsed.origin().ascii_serialization(),
            Err(_) => return true,
        };

        let needs_fetch = self.cache.get(&origin).map_or(true, |c| c.is_stale());
        if needs_fetch {
            tracing::debug!("Fetching robots.txt for {}", origin);
            let rules = fetch_robots(&self.client, &origin).await;
            self.cache.insert(origin.clone(), CachedRobots::new(rules));
        }

        self.cache
            .get(&origin)
            .map_or(true, |cached| cached.is_allowed(url, &self.agent_token))
    }
}

/// Fetches robots.txt for an origin such as `https://example.org`
///
/// Network failures and non-success statuses yield [`ParsedRobots::allow_all`].
pub async fn fetch_robots(client: &Client, origin: &str) -> ParsedRobots {
    let robots_url = format!("{}/robots.txt", origin.trim_end_matches('/'));

    match client.get(&robots_url).send().await {
        Ok(response) if response.status().is_success() => match response.text().await {
            Ok(body) => ParsedRobots::from_content(&body),
            Err(e) => {
                tracing::debug!("Failed to read {}: {}", robots_url, e);
                ParsedRobots::allow_all()
            }
        },
        Ok(response) => {
            tracing::debug!("{} returned HTTP {}", robots_url, response.status().as_u16());
            ParsedRobots::allow_all()
        }
        Err(e) => {
            tracing::debug!("Failed to fetch {}: {}", robots_url, e);
            ParsedRobots::allow_all()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_allow_all_policy() {
        let mut policy = AllowAll;
        assert!(policy.is_allowed("https://example.org/private").await);
    }

    #[tokio::test]
    async fn test_robots_policy_denies_disallowed_paths() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut policy = RobotsPolicy::new(Client::new(), "TestBot");
        let base = server.uri();

        assert!(policy.is_allowed(&format!("{}/docs", base)).await);
        assert!(!policy.is_allowed(&format!("{}/private/page", base)).await);
        assert_eq!(policy.cached_origins(), 1);
    }

    #[tokio::test]
    async fn test_missing_robots_allows_everything() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let mut policy = RobotsPolicy::new(Client::new(), "TestBot");
        assert!(policy.is_allowed(&format!("{}/anything", server.uri())).await);
    }
}
