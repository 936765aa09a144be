//! Formats events in the Chrome trace-event JSON shape.

use crate::clock::Timestamp;
use crate::eventbuf::EventBuffer;
use crate::thread::ThreadId;

/// Maximum number of characters of an event name that are recorded.
/// Longer names are silently truncated.
pub const MAX_NAME_CHARS: usize = 32;

/// The role of an event within a span.
///
/// The discriminants are the wire bytes of the `ph` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Phase {
    Begin = b'B',
    End = b'E',
}

/// Formats one event into `buf` as a self-contained JSON object.
///
/// The bytes are appended to the trace verbatim; separators between events
/// are the session's concern, not the event's.
pub(crate) fn encode_event(
    buf: &mut EventBuffer,
    name: &str,
    phase: Phase,
    ts: Timestamp,
    tid: ThreadId,
) {
    buf.bytes(b"{\"name\":");
    buf.json_str_truncated(name, MAX_NAME_CHARS);
    buf.bytes(b",\"ph\":\"");
    buf.byte(phase as u8);
    buf.bytes(b"\",\"ts\":");
    buf.uint(ts);
    buf.bytes(b",\"tid\":");
    buf.int(tid);
    buf.byte(b'}');
}
