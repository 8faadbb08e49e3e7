use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static DISALLOWED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9-]").unwrap());

/// Titles that apply to every project. Matched byte-for-byte.
pub const UNIVERSAL_SECTIONS: &[&str] = &[
    "Core Philosophy",
    "Inclusive Design Principles",
    "Code Quality Standards",
    "Contribution & Attribution Model",
    "The Hypothesis-Plan-Confirm Protocol",
    "Strategic Rollback & Post-Change Summary",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Universal,
    Situational,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Universal => "universal",
            Category::Situational => "situational",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn classify(title: &str) -> Category {
    if UNIVERSAL_SECTIONS.contains(&title) {
        Category::Universal
    } else {
        Category::Situational
    }
}

/// Storage key for a section title: lowercase, whitespace runs → `-`,
/// anything outside `[a-z0-9-]` dropped. Distinct titles may collide.
pub fn derive_id(title: &str) -> String {
    let lower = title.to_lowercase();
    let hyphenated = WHITESPACE_RE.replace_all(&lower, "-");
    DISALLOWED_RE.replace_all(&hyphenated, "").into_owned()
}
