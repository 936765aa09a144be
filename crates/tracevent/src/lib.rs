//! In-process execution tracer writing Chrome trace-event JSON.
//!
//! Call-sites mark the start and end of logical spans; each mark is
//! recorded as a timestamped event, multiplexed across threads, into a
//! single trace file that standard trace viewers (chrome://tracing,
//! Perfetto) import directly.
//!
//! # Output format
//!
//! The trace is one JSON array. Each element is an object:
//!
//! | Field  | Type   | Contents                                     |
//! |--------|--------|----------------------------------------------|
//! | `name` | string | caller-supplied name, at most 32 characters  |
//! | `ph`   | string | `"B"` (begin) or `"E"` (end)                 |
//! | `ts`   | u64    | microseconds since session start             |
//! | `tid`  | i64    | recording thread's identity (`-1` untracked) |
//!
//! Within a thread, events appear in recording order. Across threads the
//! file order is write-lock acquisition order, not timestamp order, so
//! consumers sort by `ts` before rendering a timeline.
//!
//! # Usage
//!
//! ```no_run
//! fn work() {
//!     let _span = tracevent::span("work");
//!     // ... ends on every exit path when the guard drops
//! }
//!
//! fn main() -> Result<(), tracevent::TraceError> {
//!     tracevent::init("trace.json")?;
//!     work();
//!     tracevent::terminate()
//! }
//! ```
//!
//! Worker threads register their own identity:
//!
//! ```no_run
//! fn worker(id: i64) {
//!     tracevent::thread::init(id);
//!     let _span = tracevent::span("worker");
//!     // ...
//!     tracevent::thread::terminate();
//! }
//! ```

pub mod clock;
mod error;
mod eventbuf;
mod protocol;
mod session;
pub mod thread;

pub use clock::{default_clock, Clock, ManualClock, MonotonicClock, Timestamp};
pub use error::TraceError;
pub use protocol::{Phase, MAX_NAME_CHARS};
pub use session::{end, init, session, span, start, terminate, Session, SpanGuard, DISABLE_ENV};
pub use thread::{ThreadId, MAIN_THREAD, UNTRACKED_THREAD};

#[cfg(target_arch = "x86_64")]
pub use clock::TickClock;

/// Expands to the name of the enclosing function, without a trailing
/// generic path segment.
#[macro_export]
macro_rules! function_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        name.strip_suffix("::f").unwrap_or(name)
    }};
}

/// Opens a span named after the enclosing function on the process-wide
/// session.
///
/// ```no_run
/// fn step() {
///     let _span = tracevent::span_fn!();
///     // ...
/// }
/// ```
#[macro_export]
macro_rules! span_fn {
    () => {
        $crate::span($crate::function_name!())
    };
}
