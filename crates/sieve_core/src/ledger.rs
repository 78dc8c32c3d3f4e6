use std::collections::BTreeSet;

/// Outcome of one run: disjoint, sorted channel sets.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Classification {
    pub valid: Vec<String>,
    pub invalid: Vec<String>,
    /// Channels fetched this run that produced nothing.
    pub newly_invalid: Vec<String>,
}

/// Tracks which channels produced configs during a run.
///
/// Every known channel ends up in exactly one output set. Channels never
/// recorded this run count as invalid so the stores stay closed over all
/// channels seen so far.
#[derive(Debug, Clone, Default)]
pub struct ChannelLedger {
    known: BTreeSet<String>,
    previously_invalid: BTreeSet<String>,
    valid: BTreeSet<String>,
    newly_invalid: BTreeSet<String>,
}

impl ChannelLedger {
    pub fn new<K, P>(known: K, previously_invalid: P) -> Self
    where
        K: IntoIterator<Item = String>,
        P: IntoIterator<Item = String>,
    {
        Self {
            known: known.into_iter().collect(),
            previously_invalid: previously_invalid.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Record a finished channel. Output counts after normalization.
    pub fn record(&mut self, channel: &str, produced: usize) {
        self.known.insert(channel.to_string());
        if produced > 0 {
            self.newly_invalid.remove(channel);
            self.valid.insert(channel.to_string());
        } else if !self.valid.contains(channel) {
            self.newly_invalid.insert(channel.to_string());
        }
    }

    pub fn finish(self) -> Classification {
        let unprocessed = self
            .known
            .iter()
            .filter(|channel| !self.valid.contains(*channel) && !self.newly_invalid.contains(*channel));

        let invalid: BTreeSet<String> = self
            .previously_invalid
            .iter()
            .chain(self.newly_invalid.iter())
            .chain(unprocessed)
            .filter(|channel| !self.valid.contains(*channel))
            .cloned()
            .collect();

        Classification {
            valid: self.valid.into_iter().collect(),
            invalid: invalid.into_iter().collect(),
            newly_invalid: self.newly_invalid.into_iter().collect(),
        }
    }
}
