//! The environment opt-out installs a disabled session.

#[test]
fn disable_env_installs_a_noop_session() {
    std::env::set_var(tracevent::DISABLE_ENV, "1");

    let path =
        std::env::temp_dir().join(format!("tracevent-disabled-{}.json", std::process::id()));
    tracevent::init(&path).unwrap();

    let session = tracevent::session().unwrap();
    assert!(!session.is_enabled());

    tracevent::start("a").unwrap();
    tracevent::end("a").unwrap();
    {
        let _span = tracevent::span("b");
    }
    tracevent::terminate().unwrap();

    assert!(!path.exists());
}
