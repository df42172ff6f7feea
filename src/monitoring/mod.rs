/*!
 * Monitoring
 * Structured logging setup and native call tracing
 */

pub mod tracer;

pub use tracer::{init_tracing, span_native_call, NativeCallSpan};
