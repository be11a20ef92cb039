//! Structured logging configuration.
//!
//! The library logs through the `log` facade; `init` installs a `tracing`
//! subscriber that also captures those records.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels come from `RUST_LOG`, defaulting to `info` with noisy HTTP
/// internals at `warn`.
///
/// # Example
///
/// ```no_run
/// use mp_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,reqwest=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a connection-level room event with structured data
///
/// # Arguments
///
/// * `event_type` - Type of event (connect, reconnect, disconnect)
/// * `user_id` - Player identity
/// * `room_id` - Room the player sits in, if any
/// * `message` - Event message
///
/// # Example
///
/// ```
/// use mp_server::logging::log_room_event;
///
/// log_room_event("reconnect", "0xabc", Some("lobby"), "Player resumed seat");
/// ```
pub fn log_room_event(event_type: &str, user_id: &str, room_id: Option<&str>, message: &str) {
    tracing::info!(
        event_type = event_type,
        user_id = user_id,
        room_id = room_id,
        "ROOM: {}",
        message
    );
}

/// Log performance metric
///
/// # Arguments
///
/// * `operation` - Operation name
/// * `duration_ms` - Duration in milliseconds
/// * `metadata` - Additional metadata
///
/// # Example
///
/// ```
/// use mp_server::logging::log_performance;
/// use std::time::Instant;
///
/// let start = Instant::now();
/// // ... do work ...
/// let duration = start.elapsed().as_millis() as u64;
/// log_performance("websocket_session", duration, Some("0xabc"));
/// ```
pub fn log_performance(operation: &str, duration_ms: u64, metadata: Option<&str>) {
    if duration_ms > 1000 {
        tracing::debug!(
            operation = operation,
            duration_ms = duration_ms,
            metadata = metadata,
            "Long-running operation"
        );
    } else {
        tracing::trace!(
            operation = operation,
            duration_ms = duration_ms,
            metadata = metadata,
            "Performance metric"
        );
    }
}
