//! Logging setup for the `wordrank` binary.

use std::io::Write;
use std::time::Instant;

/// Install an `env_logger` backend writing to stderr.
///
/// Filter comes from `WORDRANK_LOG` (default `warn`), color choice from
/// `WORDRANK_LOG_STYLE`. Calling this twice is harmless.
pub fn setup() {
    let start_time = Instant::now();
    let _ = env_logger::Builder::from_env(
        env_logger::Env::new()
            .filter_or("WORDRANK_LOG", "warn")
            .write_style("WORDRANK_LOG_STYLE"),
    )
    .format(move |buf, record| {
        let level = record.level();
        writeln!(
            buf,
            "{:>9.2?} {} {}: {}",
            start_time.elapsed(),
            format_args!(
                "{style}{level}{style:#}",
                style = buf.default_level_style(level)
            ),
            record.target(),
            record.args()
        )
    })
    .try_init();
}
