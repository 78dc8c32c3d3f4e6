use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::Context;
use chrono::Local;
use sieve_core::{mine_channels, MIN_CHANNEL_LEN};
use sieve_engine::{
    ChannelListStore, ConfigTextStore, Engine, HarvestInput, HarvestOutcome, ProgressSink,
};
use sieve_logging::{sieve_info, sieve_warn};

use crate::console::{format_elapsed, ConsoleSink};
use crate::settings::Settings;

/// The three files a run reads at start and replaces at the end.
pub struct Stores {
    pub channels: ChannelListStore,
    pub invalid: ChannelListStore,
    pub configs: ConfigTextStore,
}

impl Stores {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            channels: ChannelListStore::new(&settings.channels),
            invalid: ChannelListStore::new(&settings.invalid),
            configs: ConfigTextStore::new(&settings.configs),
        }
    }
}

/// Channel sets assembled from the stores before any fetching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prepared {
    /// Sorted, unique channels to fetch.
    pub scrape: Vec<String>,
    pub previously_invalid: Vec<String>,
    /// Channels listed in the store, after dropping short and invalid ones.
    pub listed: usize,
    /// Names mined from the config store.
    pub mined: usize,
    /// Mined names that were neither listed nor known invalid.
    pub new_mined: usize,
}

/// Load the stores and build the scrape list. Any unreadable or malformed
/// store aborts here, before anything is fetched or written.
pub fn prepare(stores: &Stores) -> anyhow::Result<Prepared> {
    let invalid = stores
        .invalid
        .load()
        .context("loading invalid-channel store")?;
    let invalid_set: BTreeSet<&str> = invalid.iter().map(String::as_str).collect();

    let listed: BTreeSet<String> = stores
        .channels
        .load()
        .context("loading channel store")?
        .into_iter()
        .filter(|channel| channel.chars().count() >= MIN_CHANNEL_LEN)
        .filter(|channel| !invalid_set.contains(channel.as_str()))
        .collect();

    let text = stores
        .configs
        .load_text()
        .context("loading config store")?;
    let mined = mine_channels(&text);
    let fresh: Vec<String> = mined
        .iter()
        .filter(|name| !invalid_set.contains(name.as_str()) && !listed.contains(*name))
        .cloned()
        .collect();

    let listed_count = listed.len();
    let new_mined = fresh.len();
    let mut scrape = listed;
    scrape.extend(fresh);

    Ok(Prepared {
        scrape: scrape.into_iter().collect(),
        previously_invalid: invalid,
        listed: listed_count,
        mined: mined.len(),
        new_mined,
    })
}

/// Replace all three stores with the run's results.
pub fn save(stores: &Stores, outcome: &HarvestOutcome) -> anyhow::Result<()> {
    stores
        .channels
        .save(&outcome.classification.valid)
        .context("writing channel store")?;
    stores
        .invalid
        .save(&outcome.classification.invalid)
        .context("writing invalid-channel store")?;
    stores
        .configs
        .save(&outcome.configs)
        .context("writing config store")?;
    Ok(())
}

/// Channels whose archive walk stopped because fetching gave up.
pub fn incomplete_channels(outcome: &HarvestOutcome) -> Vec<&str> {
    let mut channels: Vec<&str> = outcome
        .reports
        .iter()
        .filter(|report| !report.complete)
        .map(|report| report.channel.as_str())
        .collect();
    channels.sort_unstable();
    channels
}

/// Console summary printed after all channels finish.
pub fn summary(outcome: &HarvestOutcome, previously_invalid: usize) -> Vec<String> {
    let mut lines = vec![
        format!(
            "New invalid channels: {}, old invalid channels: {}",
            outcome.classification.newly_invalid.len(),
            previously_invalid
        ),
        format!(
            "Results: {} valid channels, {} invalid channels, {} configs",
            outcome.classification.valid.len(),
            outcome.classification.invalid.len(),
            outcome.configs.len()
        ),
    ];

    let incomplete = incomplete_channels(outcome);
    if !incomplete.is_empty() {
        sieve_warn!("fetching gave up early for: {}", incomplete.join(", "));
        lines.push(format!(
            "Incomplete channels (retries exhausted): {} - {}",
            incomplete.len(),
            incomplete.join(", ")
        ));
    }
    lines
}

pub async fn run(settings: &Settings) -> anyhow::Result<()> {
    let started = Local::now();
    let stores = Stores::from_settings(settings);

    println!("Extracting channel names from {}...", stores.configs.path().display());
    let prepared = prepare(&stores)?;
    println!(
        "Found {} extracted channels, {} new",
        prepared.mined, prepared.new_mined
    );
    println!(
        "Channels to scrape: {} (listed {}), known invalid: {}",
        prepared.scrape.len(),
        prepared.listed,
        prepared.previously_invalid.len()
    );

    let engine = Engine::new(settings.engine_config()).context("building fetch engine")?;
    sieve_info!(
        "starting run: {} channel(s), threads {}, depth {}",
        prepared.scrape.len(),
        settings.threads,
        settings.depth
    );
    println!("Starting parallel parsing...\n");

    let sink: Arc<dyn ProgressSink> = Arc::new(ConsoleSink);
    let previously_invalid = prepared.previously_invalid.len();
    let outcome = engine
        .harvest(
            HarvestInput {
                known: prepared.scrape.clone(),
                channels: prepared.scrape,
                previously_invalid: prepared.previously_invalid,
            },
            sink,
        )
        .await;

    println!(
        "\nParsing completed - {}",
        format_elapsed(Local::now() - started)
    );
    for line in summary(&outcome, previously_invalid) {
        println!("{line}");
    }

    save(&stores, &outcome)?;
    println!("Files saved.");
    println!("\nCompleted in {}", format_elapsed(Local::now() - started));
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use sieve_core::Classification;
    use sieve_engine::{ChannelListStore, ChannelReport, ConfigTextStore, HarvestOutcome};
    use tempfile::TempDir;

    use super::{prepare, save, summary, Stores};

    fn stores_in(dir: &TempDir) -> Stores {
        Stores {
            channels: ChannelListStore::new(dir.path().join("telegram_channels.json")),
            invalid: ChannelListStore::new(dir.path().join("invalid_channels.json")),
            configs: ConfigTextStore::new(dir.path().join("config-tg.txt")),
        }
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn first_run_with_no_stores_has_nothing_to_scrape() {
        let temp = TempDir::new().unwrap();
        let prepared = prepare(&stores_in(&temp)).unwrap();
        assert!(prepared.scrape.is_empty());
        assert!(prepared.previously_invalid.is_empty());
    }

    #[test]
    fn scrape_list_merges_mined_names_and_skips_invalid() {
        let temp = TempDir::new().unwrap();
        let stores = stores_in(&temp);
        fs::write(
            stores.channels.path(),
            r#"["zulu_feed", "abcd", "dead_feed", "alpha_feed"]"#,
        )
        .unwrap();
        fs::write(stores.invalid.path(), r#"["dead_feed", "gone_feed"]"#).unwrap();
        fs::write(
            stores.configs.path(),
            "trojan://pw@h:443#@Mined_Feed\nss://abc@h:1#t.me/gone_feed\n",
        )
        .unwrap();

        let prepared = prepare(&stores).unwrap();
        assert_eq!(
            prepared.scrape,
            strings(&["alpha_feed", "mined_feed", "zulu_feed"])
        );
        assert_eq!(prepared.listed, 2);
        assert_eq!(prepared.mined, 2);
        assert_eq!(prepared.new_mined, 1);
        assert_eq!(
            prepared.previously_invalid,
            strings(&["dead_feed", "gone_feed"])
        );
    }

    #[test]
    fn malformed_store_aborts_before_anything_is_written() {
        let temp = TempDir::new().unwrap();
        let stores = stores_in(&temp);
        fs::write(stores.invalid.path(), "not json").unwrap();

        assert!(prepare(&stores).is_err());
        assert!(!stores.configs.path().exists());
        assert!(!stores.channels.path().exists());
    }

    #[test]
    fn save_replaces_all_three_stores() {
        let temp = TempDir::new().unwrap();
        let stores = stores_in(&temp);
        fs::write(stores.configs.path(), "stale\n").unwrap();

        let outcome = HarvestOutcome {
            configs: strings(&["trojan://pw@alpha.example:443#x"]),
            classification: Classification {
                valid: strings(&["alpha_feed"]),
                invalid: strings(&["bravo_feed"]),
                newly_invalid: strings(&["bravo_feed"]),
            },
            reports: Vec::new(),
        };
        save(&stores, &outcome).unwrap();

        assert_eq!(stores.channels.load().unwrap(), strings(&["alpha_feed"]));
        assert_eq!(stores.invalid.load().unwrap(), strings(&["bravo_feed"]));
        assert_eq!(
            stores.configs.load_text().unwrap(),
            "trojan://pw@alpha.example:443#x\n"
        );
    }

    fn report(channel: &str, configs: &[&str], complete: bool) -> ChannelReport {
        ChannelReport {
            channel: channel.to_string(),
            pages: 1,
            candidates: configs.len(),
            configs: strings(configs),
            complete,
        }
    }

    #[test]
    fn summary_names_channels_cut_short_by_retry_caps() {
        let outcome = HarvestOutcome {
            configs: strings(&["trojan://pw@alpha.example:443#x"]),
            classification: Classification {
                valid: strings(&["alpha_feed"]),
                invalid: strings(&["down_feed", "slow_feed"]),
                newly_invalid: strings(&["down_feed", "slow_feed"]),
            },
            reports: vec![
                report("slow_feed", &[], false),
                report("alpha_feed", &["trojan://pw@alpha.example:443#x"], true),
                report("down_feed", &[], false),
            ],
        };

        let lines = summary(&outcome, 0);
        assert_eq!(
            lines,
            strings(&[
                "New invalid channels: 2, old invalid channels: 0",
                "Results: 1 valid channels, 2 invalid channels, 1 configs",
                "Incomplete channels (retries exhausted): 2 - down_feed, slow_feed",
            ])
        );
    }

    #[test]
    fn summary_omits_incomplete_line_when_every_walk_finished() {
        let outcome = HarvestOutcome {
            configs: Vec::new(),
            classification: Classification::default(),
            reports: vec![report("bravo_feed", &[], true)],
        };
        assert_eq!(summary(&outcome, 3).len(), 2);
    }
}
