//! Tag and mention extraction from free text
//!
//! A token starts at the beginning of the text or right after a whitespace
//! character, begins with a marker (`#` for tags, `@` for mentions) and
//! continues with word characters (letters, digits, underscore), at least one
//! of which is an ASCII letter. The stored value is the token without its
//! marker. `#123`, `#__` and `#日本` are not tags; `plain#tag` is not a tag
//! either because the marker is not on a boundary.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static TAG_RE: OnceLock<Regex> = OnceLock::new();
static MENTION_RE: OnceLock<Regex> = OnceLock::new();

// `\w*[A-Za-z]\w*` is greedy on both sides, so the capture is the whole word
// run following the marker whenever that run holds an ASCII letter.
const TAG_PATTERN: &str = r"(?:^|\s)#(\w*[A-Za-z]\w*)";
const MENTION_PATTERN: &str = r"(?:^|\s)@(\w*[A-Za-z]\w*)";

fn tag_regex() -> &'static Regex {
    TAG_RE.get_or_init(|| Regex::new(TAG_PATTERN).expect("Invalid tag regex pattern"))
}

fn mention_regex() -> &'static Regex {
    MENTION_RE.get_or_init(|| Regex::new(MENTION_PATTERN).expect("Invalid mention regex pattern"))
}

/// Tags and mentions found in one piece of text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotations {
    pub tags: BTreeSet<String>,
    pub mentions: BTreeSet<String>,
}

/// Extract the tag and mention sets from `text`.
///
/// Total and deterministic: text without markers yields empty sets.
/// Repeated tokens collapse into one member; case is preserved.
pub fn extract(text: &str) -> Annotations {
    Annotations {
        tags: capture_all(tag_regex(), text),
        mentions: capture_all(mention_regex(), text),
    }
}

fn capture_all(re: &Regex, text: &str) -> BTreeSet<String> {
    re.captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}
