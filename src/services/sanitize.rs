use std::sync::LazyLock;

use regex::Regex;

// Elements whose content is dropped along with the tags. The regex crate has
// no backreferences, so each one gets its own pattern.
const NON_TEXT_TAGS: [&str; 5] = ["script", "style", "noscript", "textarea", "iframe"];

static NON_TEXT_BLOCKS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    NON_TEXT_TAGS
        .iter()
        .map(|tag| {
            Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")).expect("static pattern")
        })
        .collect()
});

// An opening non-text tag that is never closed swallows the rest of the input.
static UNCLOSED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style|noscript|textarea|iframe)\b.*$").expect("static pattern")
});

static COMMENTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?(-->|$)").expect("static pattern"));

static TAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[A-Za-z!/][^>]*(>|$)").expect("static pattern"));

/// Reduces user input to plain text: no tags, no attributes, no script or
/// style content. Text between tags survives.
pub fn strip_markup(input: &str) -> String {
    let mut text = input.to_string();
    for block in NON_TEXT_BLOCKS.iter() {
        text = block.replace_all(&text, "").into_owned();
    }
    let text = UNCLOSED_BLOCK.replace_all(&text, "");
    let text = COMMENTS.replace_all(&text, "");
    let text = TAGS.replace_all(&text, "");
    text.trim().to_string()
}
