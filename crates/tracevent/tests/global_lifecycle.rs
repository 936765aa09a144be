//! Lifecycle of the process-wide session. A single ordered test, since
//! the session is a once-per-process singleton.

use assert_matches::assert_matches;
use serde::Deserialize;
use tracevent::TraceError;

#[derive(Debug, Deserialize)]
struct Event {
    name: String,
    ph: String,
    ts: u64,
    tid: i64,
}

#[test]
fn global_session_lifecycle() {
    std::env::remove_var(tracevent::DISABLE_ENV);

    // Recording before init is an error, not a silent no-op.
    assert_matches!(tracevent::start("early"), Err(TraceError::NotInitialized));
    assert_matches!(tracevent::end("early"), Err(TraceError::NotInitialized));
    assert_matches!(tracevent::terminate(), Err(TraceError::NotInitialized));
    {
        // The guard form stays usable before init; it just records nothing.
        let _inert = tracevent::span("early");
    }

    let path = std::env::temp_dir().join(format!("tracevent-global-{}.json", std::process::id()));
    tracevent::init(&path).unwrap();
    assert_matches!(tracevent::init(&path), Err(TraceError::AlreadyInitialized));

    tracevent::start("f").unwrap();
    {
        let _span = tracevent::span("g");
    }
    tracevent::end("f").unwrap();
    tracevent::terminate().unwrap();

    // The window is closed: recording and terminating are rejected again.
    assert_matches!(tracevent::start("late"), Err(TraceError::NotInitialized));
    assert_matches!(tracevent::terminate(), Err(TraceError::NotInitialized));

    let contents = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let events: Vec<Event> = serde_json::from_str(&contents).unwrap();
    let shape: Vec<(&str, &str)> = events
        .iter()
        .map(|e| (e.name.as_str(), e.ph.as_str()))
        .collect();
    assert_eq!(
        shape,
        vec![("f", "B"), ("g", "B"), ("g", "E"), ("f", "E")]
    );
    for event in &events {
        assert_eq!(event.tid, 0);
    }
    assert!(events.windows(2).all(|w| w[0].ts <= w[1].ts));
}
