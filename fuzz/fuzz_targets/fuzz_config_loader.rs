#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Arbitrary text must be rejected gracefully by both the TOML loader and
    // the request decoder; neither may panic.
    if let Ok(cfg) = lift_config::load_toml(data) {
        if cfg.validate().is_ok() {
            let sim = lift_core::SimConfig::from(&cfg);
            let _ = lift_core::Engine::new(&sim);
        }
    }

    if let Ok(lift_core::Request::Configure {
        min_floor,
        max_floor,
        capacity,
        start_floor,
        cycle_time,
    }) = lift_core::protocol::decode(data)
    {
        let _ = lift_core::protocol::sim_config(
            &lift_core::SimConfig::default(),
            min_floor,
            max_floor,
            capacity,
            start_floor,
            cycle_time,
        );
    }
});
