//! Session lifecycle and the serialized event sink.
//!
//! A [`Session`] owns the output sink and the time origin for every event
//! recorded through it. Formatting happens in the recording thread's own
//! buffer; the shared lock is held only for the final append, so the
//! critical section is one separator byte plus one write regardless of how
//! expensive formatting was.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use once_cell::sync::OnceCell;

use crate::clock::{default_clock, Clock, Timestamp};
use crate::error::TraceError;
use crate::protocol::{encode_event, Phase};
use crate::thread;

/// Environment variable that disables tracing process-wide.
///
/// When set to a non-empty value, [`init`] installs a disabled session:
/// every operation succeeds and nothing is recorded.
pub const DISABLE_ENV: &str = "TRACEVENT_DISABLE";

/// A tracing session: owner of the output sink and the epoch all recorded
/// timestamps are relative to.
pub struct Session {
    /// `None` is a disabled session in which every operation is a no-op.
    inner: Option<Inner>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("enabled", &self.inner.is_some())
            .finish()
    }
}

struct Inner {
    clock: Arc<dyn Clock>,
    epoch: Timestamp,
    out: Mutex<Output>,
}

struct Output {
    /// Taken on terminate; `None` means the sink is closed.
    sink: Option<Box<dyn Write + Send>>,
    /// Events already written. Only the first event goes unseparated.
    events: u64,
}

/// Locks the sink, recovering it if another thread panicked mid-append.
fn lock(out: &Mutex<Output>) -> MutexGuard<'_, Output> {
    out.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Session {
    /// Opens `path` for writing (truncating any existing content) and
    /// starts a session over it, registering the calling thread as the
    /// driving thread (id 0).
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Session, TraceError> {
        let path = path.as_ref();
        let file = File::create(path)?;
        let session = Session::with_sink(Box::new(file), default_clock())?;
        log::debug!("trace session started, writing to {}", path.display());
        Ok(session)
    }

    /// Starts a session over a caller-supplied sink and clock.
    ///
    /// Captures the epoch, writes the array-opening byte, and registers
    /// the calling thread as the driving thread (id 0).
    pub fn with_sink(
        mut sink: Box<dyn Write + Send>,
        clock: Arc<dyn Clock>,
    ) -> Result<Session, TraceError> {
        let epoch = clock.now();
        sink.write_all(b"[")?;
        thread::init(thread::MAIN_THREAD);
        Ok(Session {
            inner: Some(Inner {
                clock,
                epoch,
                out: Mutex::new(Output {
                    sink: Some(sink),
                    events: 0,
                }),
            }),
        })
    }

    /// A disabled session: every operation succeeds and records nothing.
    pub fn noop() -> Session {
        Session { inner: None }
    }

    /// Reports whether this session actually records events.
    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Records a Begin event for `name`.
    #[inline]
    pub fn start(&self, name: &str) -> Result<(), TraceError> {
        self.record(name, Phase::Begin)
    }

    /// Records an End event for `name`.
    ///
    /// The timestamp is sampled at call time, not carried over from the
    /// matching `start`; a span's duration is the difference between the
    /// two independently sampled events.
    #[inline]
    pub fn end(&self, name: &str) -> Result<(), TraceError> {
        self.record(name, Phase::End)
    }

    /// Records one event, tagged with the calling thread's identity.
    ///
    /// The event is fully formatted in the thread's private buffer before
    /// the shared lock is taken.
    pub fn record(&self, name: &str, phase: Phase) -> Result<(), TraceError> {
        let Some(inner) = &self.inner else {
            return Ok(());
        };
        let ts = inner.clock.elapsed_since(inner.epoch);
        thread::with(|ctx| {
            ctx.buf.clear();
            encode_event(&mut ctx.buf, name, phase, ts, ctx.thread_id);
            inner.write_event(ctx.buf.as_ref())
        })
    }

    /// Opens a span: records Begin now and the matching End when the
    /// returned guard drops, on every exit path.
    pub fn span<'a>(&'a self, name: &'a str) -> SpanGuard<'a> {
        let active = match self.start(name) {
            Ok(()) => true,
            Err(err) => {
                log::error!("failed to record begin event for {name:?}: {err}");
                false
            }
        };
        SpanGuard {
            session: self,
            name,
            active,
        }
    }

    /// Ends the session: deregisters the calling thread, writes the
    /// array-closing byte, and closes the sink.
    ///
    /// Recording calls made after this return [`TraceError::NotInitialized`].
    pub fn terminate(&self) -> Result<(), TraceError> {
        let Some(inner) = &self.inner else {
            return Ok(());
        };
        thread::terminate();

        let mut out = lock(&inner.out);
        let mut sink = out.sink.take().ok_or(TraceError::NotInitialized)?;
        sink.write_all(b"]")?;
        sink.flush()?;
        log::debug!("trace session terminated after {} events", out.events);
        Ok(())
    }
}

impl Inner {
    /// Appends one formatted event under the write lock, placing the
    /// separator only between events so the array never ends in a comma.
    fn write_event(&self, event: &[u8]) -> Result<(), TraceError> {
        let mut out = lock(&self.out);
        let Output { sink, events } = &mut *out;
        let sink = sink.as_mut().ok_or(TraceError::NotInitialized)?;
        if *events > 0 {
            sink.write_all(b",")?;
        }
        sink.write_all(event)?;
        *events += 1;
        Ok(())
    }
}

/// Scoped recording guard returned by [`Session::span`] and [`span`].
///
/// The Begin event is recorded on construction and the matching End event
/// when the guard drops, which covers normal returns, early returns, and
/// unwinding alike.
#[must_use = "the span ends when the guard is dropped"]
pub struct SpanGuard<'a> {
    session: &'a Session,
    name: &'a str,
    active: bool,
}

impl Drop for SpanGuard<'_> {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        // Drop cannot propagate a Result, so a failed End write is
        // reported through the log instead of being silently dropped.
        if let Err(err) = self.session.end(self.name) {
            log::error!("failed to record end event for {:?}: {err}", self.name);
        }
    }
}

static SESSION: OnceCell<Session> = OnceCell::new();

static NOOP_SESSION: Session = Session { inner: None };

/// Starts the process-wide tracing session, writing to `path`.
///
/// Honors [`DISABLE_ENV`]: when it is set to a non-empty value the
/// session is installed disabled and no file is created.
pub fn init<P: AsRef<Path>>(path: P) -> Result<(), TraceError> {
    if SESSION.get().is_some() {
        return Err(TraceError::AlreadyInitialized);
    }

    let disabled = std::env::var(DISABLE_ENV).is_ok_and(|v| !v.is_empty());
    let session = if disabled {
        log::debug!("{DISABLE_ENV} is set, tracing disabled");
        Session::noop()
    } else {
        Session::create(path)?
    };

    SESSION
        .set(session)
        .map_err(|_| TraceError::AlreadyInitialized)
}

/// The process-wide session, if [`init`] has been called.
pub fn session() -> Option<&'static Session> {
    SESSION.get()
}

/// Ends the process-wide session.
pub fn terminate() -> Result<(), TraceError> {
    session().ok_or(TraceError::NotInitialized)?.terminate()
}

/// Records a Begin event on the process-wide session.
pub fn start(name: &str) -> Result<(), TraceError> {
    session().ok_or(TraceError::NotInitialized)?.start(name)
}

/// Records an End event on the process-wide session.
pub fn end(name: &str) -> Result<(), TraceError> {
    session().ok_or(TraceError::NotInitialized)?.end(name)
}

/// Opens a span on the process-wide session.
///
/// Without a prior [`init`] this returns an inert guard, so instrumented
/// code does not need its own initialization check.
pub fn span(name: &str) -> SpanGuard<'_> {
    match session() {
        Some(s) => s.span(name),
        None => SpanGuard {
            session: &NOOP_SESSION,
            name: "",
            active: false,
        },
    }
}
