//! Logging Infrastructure
//!
//! `RUST_LOG` takes precedence; otherwise the given level applies to the
//! panel crates and everything else stays at `warn`.

use tracing_subscriber::EnvFilter;

/// Initialize the logger at `info`
pub fn init_logger() {
    init_logger_with_level(None, false);
}

/// Initialize the logger with an optional level and JSON output
pub fn init_logger_with_level(log_level: Option<&str>, json: bool) {
    let level = log_level.unwrap_or("info");
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(level)));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

fn default_filter(level: &str) -> String {
    format!("warn,klip_panel={level},klip_client={level},shared={level}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        let directives = default_filter("debug");
        assert!(directives.contains("klip_client=debug"));
        assert!(EnvFilter::try_new(directives).is_ok());
    }
}
