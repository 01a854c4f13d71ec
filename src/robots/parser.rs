//! Robots.txt evaluation
//!
//! Matching is delegated to the robotstxt crate, which follows Google's
//! reference parser. An empty or missing file allows everything.

use robotstxt::DefaultMatcher;

/// Robots.txt rules for one origin
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    /// Raw robots.txt content (empty string means allow all)
    content: String,
}

impl ParsedRobots {
    /// Wraps raw robots.txt content
    ///
    /// # Arguments
    ///
    /// * `content` - The body of a robots.txt response
    ///
    /// # Returns
    ///
    /// A rule set that parses `content` lazily on each check
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }

    /// A permissive rule set, used when robots.txt is missing or unreachable
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
        }
    }

    /// Checks if a URL is allowed for the given user agent token
    ///
    /// # Arguments
    ///
    /// * `url` - The absolute URL to check
    /// * `user_agent` - The product token (e.g. `SumiScribe`), not the full header
    ///
    /// # Returns
    ///
    /// * `true` - The URL may be fetched
    /// * `false` - A matching `Disallow` rule applies
    ///
    /// # Example
    ///
    /// ```
    /// use sumi_scribe::robots::ParsedRobots;
    ///
    /// let robots = ParsedRobots::from_content("User-agent: *\nDisallow: /private");
    /// assert!(robots.is_allowed("https://example.org/docs", "SumiScribe"));
    /// assert!(!robots.is_allowed("https://example.org/private/a", "SumiScribe"));
    /// ```
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.content.trim().is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }
}
