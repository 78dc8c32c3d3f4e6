//! Sieve core: pure text processing for harvested proxy configs.
//!
//! Nothing here performs I/O. The engine crate feeds page text in and
//! persists what comes out.
mod dedupe;
mod ledger;
mod miner;
mod normalize;
mod protocol;

pub use dedupe::dedupe;
pub use ledger::{ChannelLedger, Classification};
pub use miner::{clean_channel, mine_channels, MIN_CHANNEL_LEN};
pub use normalize::{
    admit, configs_from_line, decode_component, decode_percent, normalize, NormalizedConfig,
    MIN_CONFIG_CHARS,
};
pub use protocol::{contains_marker, Protocol, Rule};
