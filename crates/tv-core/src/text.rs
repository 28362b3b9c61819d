//! Title cleanup, tag extraction, and boilerplate row detection.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static BRACKETED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[(.*?)\]").unwrap());
static PARENTHETICAL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(.*?\)").unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// A title with its annotations removed and `[#tag]` tokens collected.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CleanTitle {
    pub title: String,
    pub tags: Vec<String>,
}

impl CleanTitle {
    /// The first tag, which doubles as the entry's category.
    pub fn category(&self) -> &str {
        self.tags.first().map_or("", String::as_str)
    }
}

/// Strips `[...]` and `(...)` segments from a title.
///
/// A bracketed segment starting with `#` contributes the rest of its content
/// as a tag. Whitespace runs collapse to one space and the result is trimmed.
pub fn extract_tags(raw: &str) -> CleanTitle {
    let mut tags = Vec::new();
    let without_brackets = BRACKETED_RE.replace_all(raw, |caps: &Captures<'_>| {
        if let Some(tag) = caps[1].strip_prefix('#') {
            tags.push(tag.to_string());
        }
        ""
    });
    let without_parens = PARENTHETICAL_RE.replace_all(&without_brackets, "");
    let title = WHITESPACE_RE
        .replace_all(&without_parens, " ")
        .trim()
        .to_string();
    CleanTitle { title, tags }
}

/// Language of a boilerplate phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locale {
    En,
    Zh,
}

/// A known instructional or disclaimer string found in calendar exports.
#[derive(Debug, Clone, Copy)]
pub struct NoisePhrase {
    pub text: &'static str,
    pub locale: Locale,
}

/// Boilerplate that marks a whole row as non-data.
pub const NOISE_PHRASES: &[NoisePhrase] = &[
    NoisePhrase {
        text: "如需隐藏节假日",
        locale: Locale::Zh,
    },
    NoisePhrase {
        text: "To hide observances",
        locale: Locale::En,
    },
    NoisePhrase {
        text: "This is a half-day holiday",
        locale: Locale::En,
    },
    NoisePhrase {
        text: "这是半天假",
        locale: Locale::Zh,
    },
    NoisePhrase {
        text: "请前往 Google 日历的\"设置\"",
        locale: Locale::Zh,
    },
    NoisePhrase {
        text: "Go to Google Calendar settings",
        locale: Locale::En,
    },
    NoisePhrase {
        text: "中国节假日",
        locale: Locale::Zh,
    },
    NoisePhrase {
        text: "Chinese holidays",
        locale: Locale::En,
    },
];

static LOWERED_PHRASES: LazyLock<Vec<String>> = LazyLock::new(|| {
    NOISE_PHRASES
        .iter()
        .map(|phrase| phrase.text.to_lowercase())
        .collect()
});

/// True if `value` contains any boilerplate phrase, ignoring case.
pub fn is_noise(value: &str) -> bool {
    let lowered = value.to_lowercase();
    LOWERED_PHRASES
        .iter()
        .any(|phrase| lowered.contains(phrase.as_str()))
}

/// True if any of `values` is boilerplate.
pub fn any_noise<'a>(values: impl IntoIterator<Item = &'a str>) -> bool {
    values.into_iter().any(is_noise)
}
