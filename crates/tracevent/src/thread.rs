//! Per-thread tracing identity and scratch state.
//!
//! Everything here is thread-local: there is no cross-thread visibility
//! and therefore no synchronization.

use std::cell::RefCell;

use crate::eventbuf::EventBuffer;

/// Identity of a participating thread, as recorded in the `tid` field.
pub type ThreadId = i64;

/// Identity the session assigns the driving thread at init.
pub const MAIN_THREAD: ThreadId = 0;

/// Sentinel for threads that deregistered, or never registered at all.
pub const UNTRACKED_THREAD: ThreadId = -1;

const EVENT_BUF_CAPACITY: usize = 128;

pub(crate) struct ThreadContext {
    pub thread_id: ThreadId,
    pub buf: EventBuffer,
}

thread_local! {
    static CONTEXT: RefCell<ThreadContext> = RefCell::new(ThreadContext {
        thread_id: UNTRACKED_THREAD,
        buf: EventBuffer::with_capacity(EVENT_BUF_CAPACITY),
    });
}

/// Registers the calling thread under `id`.
///
/// Re-initializing with a different id on the same thread simply
/// overwrites the previous one.
pub fn init(id: ThreadId) {
    CONTEXT.with(|ctx| ctx.borrow_mut().thread_id = id);
}

/// Deregisters the calling thread.
///
/// Events recorded afterwards still work but carry the `-1` sentinel,
/// telling consumers they came from an untracked thread.
pub fn terminate() {
    init(UNTRACKED_THREAD);
}

/// The calling thread's current identity.
pub fn current_thread_id() -> ThreadId {
    CONTEXT.with(|ctx| ctx.borrow().thread_id)
}

/// Runs `f` with exclusive access to the calling thread's context.
pub(crate) fn with<R>(f: impl FnOnce(&mut ThreadContext) -> R) -> R {
    CONTEXT.with(|ctx| f(&mut ctx.borrow_mut()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregistered_thread_is_untracked() {
        // Each test runs on a fresh thread, so no init has happened here.
        assert_eq!(current_thread_id(), UNTRACKED_THREAD);
    }

    #[test]
    fn init_overwrites_freely() {
        init(7);
        assert_eq!(current_thread_id(), 7);
        init(9);
        assert_eq!(current_thread_id(), 9);
    }

    #[test]
    fn terminate_sets_sentinel() {
        init(4);
        terminate();
        assert_eq!(current_thread_id(), UNTRACKED_THREAD);
    }

    #[test]
    fn identity_is_thread_local() {
        init(1);
        let other = std::thread::spawn(|| {
            init(2);
            current_thread_id()
        })
        .join()
        .unwrap();
        assert_eq!(other, 2);
        assert_eq!(current_thread_id(), 1);
    }
}
