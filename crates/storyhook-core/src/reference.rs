use regex::Regex;
use std::fmt;

/// A pointer from a work issue back to its story issue.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoryReference {
    pub repo: String,
    pub number: u64,
}

impl StoryReference {
    /// REST locator for the story issue, e.g.
    /// `https://api.github.com/repos/acme/stories/issues/4`.
    pub fn api_url(&self, api_base: &str) -> String {
        format!(
            "{}/repos/{}/issues/{}",
            api_base.trim_end_matches('/'),
            self.repo,
            self.number
        )
    }
}

impl fmt::Display for StoryReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.repo, self.number)
    }
}

/// Finds references to one story repository in free-form issue text.
///
/// Two forms are recognised, matched case-sensitively:
///
/// - `https://github.com/<story_repo>/issues/<n>`
/// - `<story_repo>#<n>`
///
/// The shorthand form must not be glued onto a longer owner name, so
/// `bigacme/stories#4` is not a reference to `acme/stories`.
#[derive(Debug, Clone)]
pub struct StoryResolver {
    repo: String,
    pattern: Regex,
}

impl StoryResolver {
    pub fn new(story_repo: &str) -> Self {
        let repo = regex::escape(story_repo);
        let url = regex::escape("https://github.com/");
        let source =
            format!(r"{url}{repo}/issues/([0-9]+)|(?:^|[^A-Za-z0-9_.\-]){repo}#([0-9]+)");
        let pattern = Regex::new(&source).expect("escaped story repo always forms a valid regex");
        Self {
            repo: story_repo.to_string(),
            pattern,
        }
    }

    /// The first reference in `body`, if any.
    pub fn resolve(&self, body: &str) -> Option<StoryReference> {
        let caps = self.pattern.captures(body)?;
        let digits = caps.get(1).or_else(|| caps.get(2))?.as_str();
        Some(StoryReference {
            repo: self.repo.clone(),
            number: digits.parse().ok()?,
        })
    }
}

/// One-off resolution without keeping the compiled pattern around.
pub fn find_story(story_repo: &str, body: &str) -> Option<StoryReference> {
    StoryResolver::new(story_repo).resolve(body)
}
