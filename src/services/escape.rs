//! One encoder per output context. Everything the script generator
//! interpolates goes through exactly one of these.

use serde_json::Value;

/// Value placed inside a double-quoted HTML attribute.
pub fn html_attr(value: &str) -> String {
    html_escape::encode_double_quoted_attribute(value).into_owned()
}

/// Value placed in a URL query string or path segment.
pub fn url_component(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Quoted JavaScript string literal that is also safe inside an inline
/// `<script>` element.
pub fn js_string(value: &str) -> String {
    harden_for_script(Value::String(value.to_string()).to_string())
}

/// A JSON value as a JavaScript expression literal, with the same
/// `<script>` hardening as [`js_string`].
pub fn js_literal(value: &Value) -> String {
    harden_for_script(value.to_string())
}

/// Restricts a value to characters valid in a CSS class fragment.
pub fn css_ident(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect()
}

fn harden_for_script(json: String) -> String {
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\'' => out.push_str("\\u0027"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            _ => out.push(c),
        }
    }
    out
}
