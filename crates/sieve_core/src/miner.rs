use std::collections::BTreeSet;
use std::sync::LazyLock;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use regex::Regex;

use crate::normalize::decode_component;

/// Channel identifiers shorter than this are ignored everywhere.
pub const MIN_CHANNEL_LEN: usize = 5;

const BASE64_PREFIXES: [&str; 2] = ["vmess://", "ssr://"];

static CHANNEL_MENTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:@|%40|t\.me(?:/|%2F)|t\.me-)([A-Za-z0-9_]{5,})").expect("static regex")
});

const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);
const LENIENT_URL_SAFE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Scan config text for channel mentions, one line at a time.
///
/// Each line is also scanned after one and two levels of percent decoding and
/// after base64 decoding (whole line, or the payload of a `vmess://` /
/// `ssr://` link).
pub fn mine_channels(text: &str) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        for variant in decodings(line) {
            collect_mentions(&variant, &mut found);
        }
    }
    found
}

/// Lowercased, ASCII-only form of a channel identifier, if long enough.
pub fn clean_channel(name: &str) -> Option<String> {
    let clean: String = name
        .chars()
        .filter(char::is_ascii)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    (clean.len() >= MIN_CHANNEL_LEN).then_some(clean)
}

fn collect_mentions(text: &str, found: &mut BTreeSet<String>) {
    for captures in CHANNEL_MENTION.captures_iter(text) {
        if let Some(name) = captures.get(1).and_then(|m| clean_channel(m.as_str())) {
            found.insert(name);
        }
    }
}

fn decodings(line: &str) -> Vec<String> {
    let mut variants = vec![line.to_string()];

    if let Some(once) = decode_component(line) {
        if let Some(twice) = decode_component(&once) {
            variants.push(twice);
        }
        variants.push(once);
    }

    let mut decoded = Vec::new();
    for variant in &variants {
        if let Some(text) = decode_base64(variant) {
            decoded.push(text);
        }
        for prefix in BASE64_PREFIXES {
            if let Some(payload) = variant.strip_prefix(prefix) {
                let payload = payload.split('#').next().unwrap_or_default();
                if let Some(text) = decode_base64(payload) {
                    decoded.push(text);
                }
            }
        }
    }
    variants.extend(decoded);
    variants
}

fn decode_base64(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    LENIENT_STANDARD
        .decode(text)
        .or_else(|_| LENIENT_URL_SAFE.decode(text))
        .ok()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::clean_channel;

    #[test]
    fn short_names_are_rejected() {
        assert_eq!(clean_channel("abcd"), None);
        assert_eq!(clean_channel("AbCdE").as_deref(), Some("abcde"));
    }

    #[test]
    fn non_ascii_is_dropped_before_length_check() {
        assert_eq!(clean_channel("abcдеж"), None);
    }
}
