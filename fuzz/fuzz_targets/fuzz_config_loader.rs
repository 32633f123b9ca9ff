#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parsing and validation may reject input but must never panic.
    if let Ok(cfg) = funnel_config::load_toml(data)
        && cfg.validate().is_ok()
    {
        // Whatever passes file validation must also pass core validation.
        let timing = funnel_core::FunnelConfig::from(&cfg.funnel);
        assert!(timing.validate().is_ok(), "{cfg:?}");
    }
    let _ = funnel_config::parse_trace_csv(data.as_bytes());
});
