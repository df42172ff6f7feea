/*!
 * Structured Tracing
 * Subscriber setup and timing spans for native calls using the tracing crate
 *
 * Features:
 * - JSON-formatted logs for structured parsing
 * - Compact human-readable output for development
 * - Per-call spans that flag slow native calls
 */

use std::time::{Duration, Instant};
use tracing::{debug, info, span, warn, Level, Span};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Native calls slower than this are logged at warn level
pub const SLOW_NATIVE_CALL: Duration = Duration::from_millis(100);

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - TOKENIZERS_BRIDGE_TRACE_JSON: Enable JSON output (default: false)
///
/// Returns `false` when a global subscriber was already installed, so the
/// call is safe to repeat.
pub fn init_tracing() -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("TOKENIZERS_BRIDGE_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        // JSON output for production/parsing
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
            .is_ok()
    } else {
        // Human-readable output for development
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()
            .is_ok()
    };

    if installed {
        info!(json = use_json, "tokenizer bridge tracing initialized");
    }
    installed
}

/// Span timing one call across the native boundary
pub struct NativeCallSpan {
    span: Span,
    start: Instant,
    call: &'static str,
}

impl NativeCallSpan {
    pub fn new(call: &'static str, items: usize) -> Self {
        let span = span!(
            Level::TRACE,
            "native_call",
            call = call,
            items = items,
            duration_us = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
            call,
        }
    }

    /// Enter the span context
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for NativeCallSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        self.span.record("duration_us", duration.as_micros() as u64);
        let _entered = self.span.enter();

        if duration > SLOW_NATIVE_CALL {
            warn!(
                call = self.call,
                duration_ms = duration.as_millis() as u64,
                slow = true,
                "slow native call"
            );
        } else {
            debug!(
                call = self.call,
                duration_us = duration.as_micros() as u64,
                "native call completed"
            );
        }
    }
}

/// Start timing a native call
pub fn span_native_call(call: &'static str, items: usize) -> NativeCallSpan {
    NativeCallSpan::new(call, items)
}
