use anyhow::Context;
use dialoguer::Input;

use crate::settings::Settings;

/// Ask for threads and depth, offering the resolved values as defaults.
pub fn ask(mut settings: Settings) -> anyhow::Result<Settings> {
    let threads: usize = Input::new()
        .with_prompt("Threads for parsing")
        .default(settings.threads)
        .interact_text()
        .context("reading thread count")?;
    let depth: usize = Input::new()
        .with_prompt("Parsing depth (1 page = about 20 posts)")
        .default(settings.depth)
        .interact_text()
        .context("reading depth")?;

    settings.threads = threads.max(1);
    settings.depth = depth.max(1);
    Ok(settings)
}
