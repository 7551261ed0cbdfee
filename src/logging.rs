// Logging bootstrap for desktop and Android builds
//
// `log` records from components are bridged into `tracing`, which is rendered
// by the fmt subscriber on desktop and forwarded to logcat on Android.

use std::sync::Once;

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// Install the platform subscriber once; later calls are no-ops
pub fn init_logging(config: &LoggingConfig) {
    INIT.call_once(|| install(config));
}

cfg_if::cfg_if! {
    if #[cfg(target_os = "android")] {
        fn install(config: &LoggingConfig) {
            use tracing_subscriber::filter::LevelFilter;
            use tracing_subscriber::prelude::*;

            let filter = LevelFilter::from_level(config.max_level());
            match tracing_android::layer(&config.tag) {
                Ok(layer) => {
                    let _ = tracing_subscriber::registry()
                        .with(layer.with_filter(filter))
                        .try_init();
                }
                Err(err) => {
                    eprintln!("[Logging] Failed to create logcat layer: {err}");
                }
            }
        }
    } else {
        fn install(config: &LoggingConfig) {
            let _ = tracing_subscriber::fmt()
                .with_max_level(config.max_level())
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}
