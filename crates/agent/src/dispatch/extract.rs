//! Argument extractors for action text.
//!
//! Each matcher is independent of which keyword classified the text and
//! returns the first match, trimmed, or `None` when nothing usable is found.

use regex_lite::Regex;
use std::sync::LazyLock;

static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)https?://[^\s<>"'`()\[\]{}]+"#).expect("valid url pattern"));

static COMMAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)run command:[ \t]*(.+)").expect("valid command pattern"));

static TASK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)add task:[ \t]*(.+)").expect("valid task pattern"));

static SEARCH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)search:[ \t]*(.+)").expect("valid search pattern"));

// Code runs to the end of the text, newlines included.
static CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)write code:(.+)").expect("valid code pattern"));

fn capture(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// First `http(s)://` URL, without trailing sentence punctuation.
pub fn url(text: &str) -> Option<String> {
    URL.find(text)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?']))
        .filter(|u| !u.ends_with("://"))
        .map(String::from)
}

/// Rest of the line after `run command:`.
pub fn command(text: &str) -> Option<String> {
    capture(&COMMAND, text)
}

/// Rest of the line after `add task:`.
pub fn task(text: &str) -> Option<String> {
    capture(&TASK, text)
}

/// Rest of the line after `search:`.
pub fn search_query(text: &str) -> Option<String> {
    capture(&SEARCH, text)
}

/// Everything after `write code:`.
pub fn code(text: &str) -> Option<String> {
    capture(&CODE, text)
}
