//! Logger setup shared by the command-line tools.

use std::io::Write;

const DEFAULT_FILTER: &str = "info";

/// Filter directives to apply: an explicit `--log-level` value wins over
/// `RUST_LOG`, which wins over `info`. Module directives such as
/// `zonation_core=debug` are kept as written.
pub fn filter_directives(cli: Option<&str>, env: Option<String>) -> String {
    cli.map(str::to_owned)
        .or(env.filter(|v| !v.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_FILTER.to_owned())
}

pub fn builder(directives: &str) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    builder
        .parse_filters(directives)
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()));
    builder
}

/// Install the global logger.
pub fn init(cli: Option<&str>) {
    let directives = filter_directives(cli, std::env::var("RUST_LOG").ok());
    builder(&directives).init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::{Level, Log, Metadata};

    fn enabled(directives: &str, target: &str, level: Level) -> bool {
        let logger = builder(directives).build();
        logger.enabled(&Metadata::builder().target(target).level(level).build())
    }

    #[test]
    fn cli_level_overrides_env() {
        assert_eq!(filter_directives(Some("warn"), Some("debug".into())), "warn");
        assert_eq!(filter_directives(None, Some("debug".into())), "debug");
        assert_eq!(filter_directives(None, Some("  ".into())), "info");
        assert_eq!(filter_directives(None, None), "info");
    }

    #[test]
    fn module_directives_survive() {
        let d = filter_directives(None, Some("warn,zonation_core=debug".into()));
        assert!(enabled(&d, "zonation_core::zones", Level::Debug));
        assert!(!enabled(&d, "zones", Level::Info));
        assert!(enabled(&d, "zones", Level::Warn));
    }
}
