//! Robots.txt parser implementation
//!
//! Allow/deny decisions are delegated to the robotstxt crate's matcher. The
//! crawl-delay directive is not covered by that crate, so rule groups are
//! scanned here to find the delay of the group that applies to us.

use robotstxt::DefaultMatcher;
use std::time::Duration;

/// One `User-agent` group of a robots.txt file
#[derive(Debug, Clone, Default, PartialEq)]
struct RobotsGroup {
    /// Lowercased agent names of this group
    agents: Vec<String>,
    /// Crawl-delay in seconds, if declared
    crawl_delay: Option<f64>,
}

/// Parsed robots.txt data
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    /// Raw robots.txt content (empty string means allow all)
    content: String,
    /// Whether to allow all (true = allow all, false = parse content)
    allow_all: bool,
    /// Rule groups in file order
    groups: Vec<RobotsGroup>,
}

impl ParsedRobots {
    /// Creates a new ParsedRobots from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
            groups: parse_groups(content),
        }
    }

    /// Creates a permissive ParsedRobots that allows everything
    ///
    /// This is used as the default when robots.txt cannot be fetched.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
            groups: Vec::new(),
        }
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// # Arguments
    ///
    /// * `url` - The absolute URL (or path) to check
    /// * `user_agent` - The user agent string; only its product token is matched
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.allow_all || self.content.is_empty() {
            return true;
        }

        // The matcher compares whole agent names, so pass only `Name` of `Name/1.0 (+url)`
        let token = product_token(user_agent);
        let agent = if token.is_empty() { user_agent } else { token.as_str() };

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, agent, url)
    }

    /// Gets the crawl delay declared for a specific user agent
    ///
    /// Selects the same group as [`ParsedRobots::is_allowed`]: a group whose
    /// agent name equals our product token wins, and the `*` group is used
    /// only when no group names us. The delay of the selected group is
    /// returned, even if another group declares one.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<Duration> {
        if self.allow_all {
            return None;
        }

        let token = product_token(user_agent);

        let specific = self.groups.iter().find(|group| {
            !token.is_empty() && group.agents.iter().any(|agent| *agent == token)
        });

        let group = specific.or_else(|| {
            self.groups
                .iter()
                .find(|group| group.agents.iter().any(|agent| agent == "*"))
        })?;

        group
            .crawl_delay
            .filter(|secs| secs.is_finite() && *secs >= 0.0)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }
}

/// Extracts the lowercased product token (`Name` of `Name/1.0 (+url)`)
fn product_token(user_agent: &str) -> String {
    user_agent
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect::<String>()
        .to_lowercase()
}

/// Agent name of a `User-agent` value as the matcher reads it
///
/// The leading run of letters, `-` and `_`, lowercased; `*` for the wildcard.
fn group_agent(value: &str) -> String {
    if value.starts_with('*') {
        return "*".to_string();
    }

    value
        .chars()
        .take_while(|c| c.is_ascii_alphabetic() || *c == '-' || *c == '_')
        .collect::<String>()
        .to_lowercase()
}

/// Splits robots.txt content into user-agent groups
///
/// Consecutive `User-agent` lines share a group; the first `User-agent` line
/// after any rule line starts a new one.
fn parse_groups(content: &str) -> Vec<RobotsGroup> {
    let mut groups: Vec<RobotsGroup> = Vec::new();
    let mut current: Option<RobotsGroup> = None;
    let mut in_rules = false;

    for line in content.lines() {
        let line = match line.split_once('#') {
            Some((before, _)) => before,
            None => line,
        }
        .trim();

        if line.is_empty() {
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_lowercase();
        let value = value.trim();

        match key.as_str() {
            "user-agent" => {
                if in_rules {
                    if let Some(group) = current.take() {
                        groups.push(group);
                    }
                    in_rules = false;
                }
                current
                    .get_or_insert_with(RobotsGroup::default)
                    .agents
                    .push(group_agent(value));
            }
            "crawl-delay" => {
                in_rules = true;
                if let (Some(group), Ok(delay)) = (current.as_mut(), value.parse::<f64>()) {
                    group.crawl_delay = Some(delay);
                }
            }
            // Sitemap lines are global and do not close a group
            "sitemap" => {}
            _ => in_rules = true,
        }
    }

    if let Some(group) = current {
        groups.push(group);
    }

    groups
}
