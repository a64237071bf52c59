//! Logging setup utilities for the Irori binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// Logging is enabled for the library crate and for the binary itself.
/// The filter can be overridden with the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `crate_name` - The library crate emitting most events (e.g., "irori-server")
/// * `binary_name` - The name of the binary (e.g., "irori-server")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use irori_shared::logger::setup_logger;
///
/// setup_logger("irori-server", "irori-server", "info");
/// ```
pub fn setup_logger(crate_name: &str, binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(crate_name, binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build the `EnvFilter` directive used when `RUST_LOG` is not set.
fn default_filter(crate_name: &str, binary_name: &str, level: &str) -> String {
    let crate_target = crate_name.replace('-', "_");
    let binary_target = binary_name.replace('-', "_");
    if crate_target == binary_target {
        format!("{}={},tower_http={}", crate_target, level, level)
    } else {
        format!(
            "{}={},{}={},tower_http={}",
            crate_target, level, binary_target, level, level
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_normalizes_dashes() {
        // テスト項目: クレート名のハイフンがアンダースコアに変換される
        // given (前提条件):
        let crate_name = "irori-server";

        // when (操作):
        let filter = default_filter(crate_name, "server", "debug");

        // then (期待する結果):
        assert_eq!(filter, "irori_server=debug,server=debug,tower_http=debug");
    }

    #[test]
    fn test_default_filter_deduplicates_same_target() {
        // テスト項目: クレート名とバイナリ名が同じ場合は 1 回だけ出力される
        // given (前提条件):

        // when (操作):
        let filter = default_filter("irori-server", "irori_server", "info");

        // then (期待する結果):
        assert_eq!(filter, "irori_server=info,tower_http=info");
    }
}
