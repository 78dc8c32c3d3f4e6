use chrono::TimeDelta;
use sieve_engine::{EngineEvent, ProgressSink};

/// Prints one `<index>/<total> - <channel>` line per finished page walk.
pub struct ConsoleSink;

impl ProgressSink for ConsoleSink {
    fn emit(&self, event: EngineEvent) {
        if let EngineEvent::PagesFetched(progress) = event {
            println!("{}/{} - {}", progress.index + 1, progress.total, progress.channel);
        }
    }
}

/// `H:MM:SS`, hours unpadded.
pub fn format_elapsed(elapsed: TimeDelta) -> String {
    let secs = elapsed.num_seconds().max(0);
    format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}
