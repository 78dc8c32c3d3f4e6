use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::protocol::{Protocol, Rule};

/// Shortest accepted config is one character longer than this.
pub const MIN_CONFIG_CHARS: usize = 13;

const DIRECT_XTLS_FLOW: &str = "flow=xtls-rprx-direct";
const TRUNCATION_MARKER: char = '…';
const FRAGMENT_MARKER: char = '#';

static ENCODED_LINE_BREAKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%0A|%250A|%0D").expect("static regex"));
static INLINE_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s\x00\x01\x{FEFF}]|amp;").expect("static regex"));
static FINGERPRINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"fp=(?:firefox|safari|edge|360|qq|ios|android|randomized|random)")
        .expect("static regex")
});
static TRUNCATION_RESIDUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"…»?|»|%{1,2}|`$").expect("static regex"));

/// A cleaned connection string tagged with its protocol family.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedConfig {
    protocol: Protocol,
    value: String,
}

impl NormalizedConfig {
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_string(self) -> String {
        self.value
    }
}

impl fmt::Display for NormalizedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// Clean one raw message line and validate it against its scheme's rule.
///
/// Returns zero outputs when no scheme is recognized or the structural check
/// fails, one output for most schemes, and one output per alias for the
/// `sn`/`husi`/`exclave` family.
pub fn normalize(raw: &str) -> Vec<NormalizedConfig> {
    let cleaned = strip_noise(raw);
    let cleaned = canonical_fingerprint(&cleaned);
    let decoded = decode_percent(&cleaned);

    let Some(protocol) = Protocol::detect(&decoded) else {
        return Vec::new();
    };
    let body = decoded.split(protocol.marker()).nth(1).unwrap_or_default();

    apply_rule(protocol, body)
        .into_iter()
        .filter_map(|(protocol, value)| {
            let value = value.trim();
            (!value.is_empty()).then(|| NormalizedConfig {
                protocol,
                value: value.to_string(),
            })
        })
        .collect()
}

/// Admission heuristics for a normalized config: longer than
/// [`MIN_CONFIG_CHARS`], no truncation ellipsis unless a fragment follows,
/// then leftover ellipsis, quote and percent characters removed.
pub fn admit(config: NormalizedConfig) -> Option<NormalizedConfig> {
    let NormalizedConfig { protocol, value } = config;
    if value.chars().count() <= MIN_CONFIG_CHARS {
        return None;
    }
    if value.contains(TRUNCATION_MARKER) && !value.contains(FRAGMENT_MARKER) {
        return None;
    }
    let value = TRUNCATION_RESIDUE.replace_all(&value, "");
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    Some(NormalizedConfig {
        protocol,
        value: value.to_string(),
    })
}

/// Everything one message line contributes to the config set.
pub fn configs_from_line(raw: &str) -> Vec<NormalizedConfig> {
    normalize(raw).into_iter().filter_map(admit).collect()
}

pub(crate) fn strip_noise(raw: &str) -> String {
    let without_breaks = ENCODED_LINE_BREAKS.replace_all(raw, "");
    INLINE_NOISE.replace_all(&without_breaks, "").into_owned()
}

pub(crate) fn canonical_fingerprint(text: &str) -> Cow<'_, str> {
    FINGERPRINT.replace_all(text, "fp=chrome")
}

/// Decode twice when possible, otherwise once, otherwise leave as-is.
pub fn decode_percent(text: &str) -> String {
    match decode_component(text) {
        Some(once) => decode_component(&once).unwrap_or(once),
        None => text.to_string(),
    }
}

/// Strict URI-component decoding: a stray `%` or non-UTF-8 result is a failure.
pub fn decode_component(text: &str) -> Option<String> {
    if !has_well_formed_escapes(text) {
        return None;
    }
    urlencoding::decode(text).ok().map(Cow::into_owned)
}

fn has_well_formed_escapes(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut idx = 0;
    while idx < bytes.len() {
        if bytes[idx] == b'%' {
            let hex = bytes.get(idx + 1..idx + 3);
            match hex {
                Some(pair) if pair.iter().all(u8::is_ascii_hexdigit) => idx += 3,
                _ => return false,
            }
        } else {
            idx += 1;
        }
    }
    true
}

fn apply_rule(protocol: Protocol, body: &str) -> Vec<(Protocol, String)> {
    let url = format!("{}{}", protocol.marker(), body);
    let keep = match protocol.rule() {
        Rule::PassThrough => true,
        Rule::Vless => {
            !url.contains(DIRECT_XTLS_FLOW)
                && url.contains('@')
                && colon_after(&url, protocol.marker().len())
        }
        Rule::CollapseSeparators => {
            return vec![(protocol, url.replace(";;", ";"))];
        }
        Rule::AuthAndPort { offset } => url.contains('@') && colon_after(&url, offset),
        Rule::PortAndParams { offset } => colon_after(&url, offset) && url.contains('='),
        Rule::Port { offset } => colon_after(&url, offset),
        Rule::Alias => {
            return Protocol::ALIASES
                .into_iter()
                .map(|alias| (alias, format!("{}{}", alias.marker(), body)))
                .collect();
        }
    };
    if keep {
        vec![(protocol, url)]
    } else {
        Vec::new()
    }
}

fn colon_after(url: &str, offset: usize) -> bool {
    url.chars().skip(offset).any(|c| c == ':')
}

#[cfg(test)]
mod tests {
    use super::{canonical_fingerprint, decode_component, decode_percent, strip_noise};

    #[test]
    fn stray_percent_fails_strict_decoding() {
        assert_eq!(decode_component("100%"), None);
        assert_eq!(decode_component("%zz"), None);
        assert_eq!(decode_component("%C3%A9").as_deref(), Some("é"));
    }

    #[test]
    fn invalid_utf8_fails_strict_decoding() {
        assert_eq!(decode_component("%FF"), None);
    }

    #[test]
    fn double_decoding_falls_back_to_single() {
        assert_eq!(decode_percent("a%2540b"), "a@b");
        // Second pass would see a stray `%`.
        assert_eq!(decode_percent("a%25zz"), "a%zz");
        assert_eq!(decode_percent("50%off"), "50%off");
    }

    #[test]
    fn noise_removal_is_single_pass() {
        assert_eq!(strip_noise("a b\tc\u{0}d\u{1}e&amp;f"), "abcde&f");
        assert_eq!(strip_noise("x%0Ay%250Az%0D"), "xyz");
        assert_eq!(strip_noise("am p;"), "amp;");
    }

    #[test]
    fn fingerprint_variants_become_chrome() {
        assert_eq!(canonical_fingerprint("fp=randomized&x=1"), "fp=chrome&x=1");
        assert_eq!(canonical_fingerprint("fp=ios"), "fp=chrome");
        assert_eq!(canonical_fingerprint("fp=chrome"), "fp=chrome");
    }
}
