mod console;
mod logging;
mod prompt;
mod settings;
mod workflow;

use anyhow::Context;
use clap::Parser;

use settings::{Cli, Settings};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::from_cli(&cli)?;
    if cli.interactive {
        settings = prompt::ask(settings)?;
    }

    logging::initialize(settings.log, settings.log_level);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;
    runtime.block_on(workflow::run(&settings))
}
