//! Server-side rendering of the embeddable widget scripts.
//!
//! Each renderer bakes the record into a single `CONFIG` object literal
//! (built with [`escape::js_literal`]) in front of a fixed runtime. The
//! runtimes only ever put dynamic values into the page through
//! `textContent`, DOM properties or `encodeURIComponent`, so a value that
//! slipped past write-time sanitization still renders as inert text.

use crate::models::{WidgetConfig, WidgetSettings};
use crate::services::escape;

mod chat;
mod reviews;

/// Deployment facts the scripts need at runtime.
pub struct ScriptContext<'a> {
    pub base_url: &'a str,
}

impl ScriptContext<'_> {
    fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

/// Renders the script for one stored record. Pure: same record, same text.
pub fn render(config: &WidgetConfig, ctx: &ScriptContext) -> String {
    match &config.settings {
        WidgetSettings::Chat(chat) => chat::render(&config.id, chat, ctx),
        WidgetSettings::Reviews(reviews) => reviews::render(&config.id, reviews, ctx),
    }
}

/// Harmless stand-in served when no record matches: logs and does nothing else.
pub fn not_found(requested: Option<&str>) -> String {
    format!(
        "(function () {{\n  if (window.console && console.error) {{\n    console.error(\"Widget configuration not found:\", {});\n  }}\n}})();\n",
        escape::js_string(requested.unwrap_or(""))
    )
}

fn wrap(banner: &str, config: &serde_json::Value, runtime: &str) -> String {
    format!(
        "/* {banner} */\n(function () {{\n  \"use strict\";\n  var CONFIG = {config};\n{runtime}\n}})();\n",
        banner = banner,
        config = escape::js_literal(config),
        runtime = runtime,
    )
}
