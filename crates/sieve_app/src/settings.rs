use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use ron::extensions::Extensions;
use ron::Options;
use serde::Deserialize;
use sieve_engine::{
    EngineConfig, FetchSettings, RetryPolicy, ScheduleSettings, DEFAULT_DEPTH, DEFAULT_HOST,
    DEFAULT_THREADS, DEFAULT_USER_AGENT,
};

use crate::logging::LogDestination;

pub const CHANNELS_FILE: &str = "telegram_channels.json";
pub const INVALID_FILE: &str = "invalid_channels.json";
pub const CONFIGS_FILE: &str = "config-tg.txt";

const DEFAULT_MIN_DELAY_SECS: u64 = 5;
const DEFAULT_MAX_DELAY_SECS: u64 = 25;

/// Scrape proxy configs from public channel archives.
#[derive(Debug, Default, Parser)]
#[command(name = "sieve", version)]
pub struct Cli {
    /// Channels fetched concurrently
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Archive pages per channel (about 20 posts each)
    #[arg(short, long)]
    pub depth: Option<usize>,

    /// Archive host
    #[arg(long)]
    pub host: Option<String>,

    #[arg(long)]
    pub user_agent: Option<String>,

    /// Channel list store
    #[arg(long)]
    pub channels: Option<PathBuf>,

    /// Invalid-channel store
    #[arg(long)]
    pub invalid: Option<PathBuf>,

    /// Config text store
    #[arg(long)]
    pub configs: Option<PathBuf>,

    #[arg(long)]
    pub min_delay_secs: Option<u64>,

    #[arg(long)]
    pub max_delay_secs: Option<u64>,

    /// Give up on a page after this many attempts (default: never)
    #[arg(long)]
    pub max_attempts: Option<usize>,

    /// Give up on a page after retrying this long (default: never)
    #[arg(long)]
    pub max_elapsed_secs: Option<u64>,

    /// Per-request deadline (default: none)
    #[arg(long)]
    pub request_timeout_secs: Option<u64>,

    #[arg(long, value_enum)]
    pub log: Option<LogDestination>,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,

    /// RON file with any of the settings above
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Ask for threads and depth before starting
    #[arg(short, long)]
    pub interactive: bool,
}

/// Settings read from the optional RON file. Every field may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileSettings {
    pub threads: Option<usize>,
    pub depth: Option<usize>,
    pub host: Option<String>,
    pub user_agent: Option<String>,
    pub channels: Option<PathBuf>,
    pub invalid: Option<PathBuf>,
    pub configs: Option<PathBuf>,
    pub min_delay_secs: Option<u64>,
    pub max_delay_secs: Option<u64>,
    pub max_attempts: Option<usize>,
    pub max_elapsed_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub log: Option<LogDestination>,
}

impl FileSettings {
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Options::default()
            .with_default_extension(Extensions::IMPLICIT_SOME)
            .from_str(text)
            .context("malformed settings file")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("in {}", path.display()))
    }
}

/// Fully resolved run parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub threads: usize,
    pub depth: usize,
    pub host: String,
    pub user_agent: String,
    pub channels: PathBuf,
    pub invalid: PathBuf,
    pub configs: PathBuf,
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: Option<usize>,
    pub max_elapsed: Option<Duration>,
    pub request_timeout: Option<Duration>,
    pub log: LogDestination,
    pub log_level: LevelFilter,
}

impl Settings {
    /// Read the settings file named on the command line, if any, and resolve.
    pub fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        let file = match &cli.config {
            Some(path) => FileSettings::load(path)?,
            None => FileSettings::default(),
        };
        Ok(Self::resolve(cli, file))
    }

    /// Command line beats the settings file, which beats built-in defaults.
    pub fn resolve(cli: &Cli, file: FileSettings) -> Self {
        let secs = Duration::from_secs;
        Self {
            threads: cli.threads.or(file.threads).unwrap_or(DEFAULT_THREADS).max(1),
            depth: cli.depth.or(file.depth).unwrap_or(DEFAULT_DEPTH).max(1),
            host: cli
                .host
                .clone()
                .or(file.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            user_agent: cli
                .user_agent
                .clone()
                .or(file.user_agent)
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            channels: cli
                .channels
                .clone()
                .or(file.channels)
                .unwrap_or_else(|| PathBuf::from(CHANNELS_FILE)),
            invalid: cli
                .invalid
                .clone()
                .or(file.invalid)
                .unwrap_or_else(|| PathBuf::from(INVALID_FILE)),
            configs: cli
                .configs
                .clone()
                .or(file.configs)
                .unwrap_or_else(|| PathBuf::from(CONFIGS_FILE)),
            min_delay: secs(
                cli.min_delay_secs
                    .or(file.min_delay_secs)
                    .unwrap_or(DEFAULT_MIN_DELAY_SECS),
            ),
            max_delay: secs(
                cli.max_delay_secs
                    .or(file.max_delay_secs)
                    .unwrap_or(DEFAULT_MAX_DELAY_SECS),
            ),
            max_attempts: cli.max_attempts.or(file.max_attempts),
            max_elapsed: cli.max_elapsed_secs.or(file.max_elapsed_secs).map(secs),
            request_timeout: cli.request_timeout_secs.or(file.request_timeout_secs).map(secs),
            log: cli.log.or(file.log).unwrap_or_default(),
            log_level: if cli.verbose {
                LevelFilter::Debug
            } else {
                LevelFilter::Info
            },
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        let mut retry = RetryPolicy::default().with_delays(self.min_delay, self.max_delay);
        if let Some(max_attempts) = self.max_attempts {
            retry = retry.with_max_attempts(max_attempts);
        }
        if let Some(max_elapsed) = self.max_elapsed {
            retry = retry.with_max_elapsed(max_elapsed);
        }

        EngineConfig {
            host: self.host.clone(),
            fetch: FetchSettings {
                user_agent: self.user_agent.clone(),
                request_timeout: self.request_timeout,
                ..FetchSettings::default()
            },
            retry,
            schedule: ScheduleSettings {
                threads: self.threads,
                depth: self.depth,
            },
        }
    }
}
