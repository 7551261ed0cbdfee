// Steppo Core - Rust step tracking engine
// Step counter sensor -> session-relative steps -> distance, published to the UI

// Module declarations
pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod fixtures;
pub mod logging;
pub mod managers;
pub mod telemetry;
pub mod tracking;

// Re-exports for convenience
pub use engine::TrackerHandle;
pub use tracking::{SensorDeltaFilter, SessionSnapshot, StepTracker, TrackingSession};

/// JNI_OnLoad is called when the native library is loaded by Android
///
/// Initializes logcat logging before any tracker call can log.
#[cfg(target_os = "android")]
#[no_mangle]
pub extern "system" fn JNI_OnLoad(
    _vm: jni::JavaVM,
    _reserved: *mut std::ffi::c_void,
) -> jni::sys::jint {
    logging::init_logging(&config::AppConfig::load_android().logging);
    log::info!("JNI_OnLoad called - Steppo core loaded");

    jni::sys::JNI_VERSION_1_6
}
