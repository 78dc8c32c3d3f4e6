/// Proxy protocol families recognized in message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Protocol {
    Vless,
    Ss,
    Vmess,
    Trojan,
    Tuic,
    Hysteria,
    Hy2,
    Hysteria2,
    Juicity,
    Nekoray,
    Sn,
    Husi,
    Exclave,
    Ulink,
    Socks4,
    Socks5,
    Socks,
    Naive,
    Wireguard,
    Wg,
}

/// Structural check applied to a candidate once its scheme is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Re-anchor at the marker, no validation.
    PassThrough,
    /// `@` present, `:` after the prefix, no direct-XTLS flow.
    Vless,
    /// Collapse `;;` into `;`.
    CollapseSeparators,
    /// `@` present and `:` after `offset` characters.
    AuthAndPort { offset: usize },
    /// `:` after `offset` characters and a `=` anywhere.
    PortAndParams { offset: usize },
    /// `:` after `offset` characters.
    Port { offset: usize },
    /// Emit the payload under every alias scheme.
    Alias,
}

impl Protocol {
    /// Every family, in the order message lines are screened.
    pub const ALL: [Protocol; 20] = [
        Protocol::Vless,
        Protocol::Ss,
        Protocol::Vmess,
        Protocol::Trojan,
        Protocol::Tuic,
        Protocol::Hysteria,
        Protocol::Hy2,
        Protocol::Hysteria2,
        Protocol::Juicity,
        Protocol::Nekoray,
        Protocol::Sn,
        Protocol::Husi,
        Protocol::Exclave,
        Protocol::Ulink,
        Protocol::Socks4,
        Protocol::Socks5,
        Protocol::Socks,
        Protocol::Naive,
        Protocol::Wireguard,
        Protocol::Wg,
    ];

    /// Dispatch priority for normalization. The first family whose marker
    /// occurs anywhere in the text wins, so `vless://` must be tried before
    /// `ss://`, which it contains.
    pub const DISPATCH_ORDER: [Protocol; 20] = [
        Protocol::Juicity,
        Protocol::Nekoray,
        Protocol::Ulink,
        Protocol::Wireguard,
        Protocol::Wg,
        Protocol::Vmess,
        Protocol::Vless,
        Protocol::Ss,
        Protocol::Trojan,
        Protocol::Tuic,
        Protocol::Hysteria,
        Protocol::Hysteria2,
        Protocol::Hy2,
        Protocol::Sn,
        Protocol::Husi,
        Protocol::Exclave,
        Protocol::Socks4,
        Protocol::Socks5,
        Protocol::Socks,
        Protocol::Naive,
    ];

    /// Families sharing one payload format.
    pub const ALIASES: [Protocol; 3] = [Protocol::Sn, Protocol::Husi, Protocol::Exclave];

    pub fn marker(self) -> &'static str {
        match self {
            Protocol::Vless => "vless://",
            Protocol::Ss => "ss://",
            Protocol::Vmess => "vmess://",
            Protocol::Trojan => "trojan://",
            Protocol::Tuic => "tuic://",
            Protocol::Hysteria => "hysteria://",
            Protocol::Hy2 => "hy2://",
            Protocol::Hysteria2 => "hysteria2://",
            Protocol::Juicity => "juicity://",
            Protocol::Nekoray => "nekoray://",
            Protocol::Sn => "sn://",
            Protocol::Husi => "husi://",
            Protocol::Exclave => "exclave://",
            Protocol::Ulink => "ulink://",
            Protocol::Socks4 => "socks4://",
            Protocol::Socks5 => "socks5://",
            Protocol::Socks => "socks://",
            Protocol::Naive => "naive+",
            Protocol::Wireguard => "wireguard://",
            Protocol::Wg => "wg://",
        }
    }

    pub fn rule(self) -> Rule {
        match self {
            Protocol::Juicity
            | Protocol::Nekoray
            | Protocol::Ulink
            | Protocol::Wireguard
            | Protocol::Wg
            | Protocol::Vmess => Rule::PassThrough,
            Protocol::Vless => Rule::Vless,
            Protocol::Ss => Rule::CollapseSeparators,
            Protocol::Trojan | Protocol::Tuic | Protocol::Hysteria2 | Protocol::Hy2 => {
                Rule::AuthAndPort {
                    offset: self.marker().len(),
                }
            }
            // `naive+https://` keeps its port check past the inner scheme.
            Protocol::Naive => Rule::AuthAndPort { offset: 13 },
            Protocol::Hysteria => Rule::PortAndParams {
                offset: self.marker().len(),
            },
            Protocol::Sn | Protocol::Husi | Protocol::Exclave => Rule::Alias,
            Protocol::Socks4 | Protocol::Socks5 | Protocol::Socks => Rule::Port {
                offset: self.marker().len(),
            },
        }
    }

    /// First family in dispatch order whose marker occurs in `text`.
    pub fn detect(text: &str) -> Option<Protocol> {
        Self::DISPATCH_ORDER
            .into_iter()
            .find(|protocol| text.contains(protocol.marker()))
    }
}

/// True when `line` mentions any recognized scheme marker.
pub fn contains_marker(line: &str) -> bool {
    Protocol::ALL
        .iter()
        .any(|protocol| line.contains(protocol.marker()))
}
