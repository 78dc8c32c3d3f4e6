use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use sieve_core::contains_marker;

/// Message bodies in the public channel archive.
pub const MESSAGE_TEXT_SELECTOR: &str = ".tgme_widget_message_text";

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("static regex"));
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<.*?>").expect("static regex"));

pub trait Extractor: Send + Sync {
    /// Raw candidate lines, in document order.
    fn extract(&self, html: &str) -> Vec<String>;
}

/// Splits every message body on line breaks and keeps the lines that mention
/// a proxy scheme, with tags removed. Entities stay escaped.
#[derive(Debug, Default, Clone, Copy)]
pub struct MessageExtractor;

impl Extractor for MessageExtractor {
    fn extract(&self, html: &str) -> Vec<String> {
        let Ok(selector) = Selector::parse(MESSAGE_TEXT_SELECTOR) else {
            return Vec::new();
        };
        let doc = Html::parse_document(html);

        let mut lines = Vec::new();
        for message in doc.select(&selector) {
            let markup = message.inner_html();
            lines.extend(
                LINE_BREAK
                    .split(&markup)
                    .filter(|line| contains_marker(line))
                    .map(|line| TAG.replace_all(line, "").into_owned()),
            );
        }
        lines
    }
}
