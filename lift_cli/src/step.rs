//! `lift step`: scripted, clock-free run of the engine.

use crate::cli::CallSpec;
use eyre::WrapErr;
use lift_core::conversions::policy_from;
use lift_core::{Engine, SimConfig};

pub fn step(cfg: &lift_config::Config, calls: &[CallSpec], ticks: u32, json: bool) -> eyre::Result<()> {
    let sim_cfg = SimConfig::from(cfg);
    let mut engine = Engine::new(&sim_cfg)?;
    let policy = policy_from(&cfg.boarding);

    for (i, c) in calls.iter().enumerate() {
        engine
            .submit_call(c.floor, c.destination, c.count)
            .wrap_err_with(|| format!("call {} ({}:{}:{})", i + 1, c.floor, c.destination, c.count))?;
    }

    for t in 1..=ticks {
        engine.tick(policy.as_ref());
        if json {
            println!("{}", engine.snapshot(0, sim_cfg.cycle_s).to_json()?);
        } else {
            println!("{t:>3} | {}", engine.status_line());
        }
    }
    Ok(())
}
