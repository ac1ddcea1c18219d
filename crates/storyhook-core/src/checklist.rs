use regex::Regex;

pub const UNCHECKED: &str = "- [ ]";
pub const CHECKED: &str = "- [x]";

/// Result of [`tick`]: the rewritten body and how many lines were ticked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticked {
    pub body: String,
    pub lines: usize,
}

impl Ticked {
    pub fn changed(&self) -> bool {
        self.lines > 0
    }
}

/// Tick every open checklist line that names `owner/repo#number`.
///
/// A line qualifies when it contains an unchecked marker `- [ ]`, at least one
/// character of text, and then the literal token `(owner/repo#number)`. Only
/// the first marker on a qualifying line is rewritten; every other byte of the
/// body is left as it was. Already-ticked lines do not match, so applying this
/// twice is the same as applying it once.
pub fn tick(body: &str, owner: &str, repo: &str, number: u64) -> Ticked {
    let pattern = line_pattern(owner, repo, number);
    let mut lines = 0;
    let body = pattern
        .replace_all(body, |caps: &regex::Captures<'_>| {
            lines += 1;
            caps[0].replacen(UNCHECKED, CHECKED, 1)
        })
        .into_owned();
    Ticked { body, lines }
}

fn line_pattern(owner: &str, repo: &str, number: u64) -> Regex {
    // `.` never crosses a newline, so each match stays within one line.
    let source = format!(
        r"- \[ \].+\({}/{}#{}\)",
        regex::escape(owner),
        regex::escape(repo),
        number
    );
    Regex::new(&source).expect("escaped reference token always forms a valid regex")
}
