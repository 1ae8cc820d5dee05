#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! `lift` command-line front end.

mod cli;
mod error_fmt;
mod logging;
mod run;
mod step;

use clap::Parser;
use cli::{Cli, Commands, JSON_MODE};
use error_fmt::{exit_code_for_error, format_error_json, humanize};
use lift_core::LiftError;

fn load_config(cli: &Cli) -> eyre::Result<lift_config::Config> {
    if !cli.config.exists() {
        eyre::bail!("read config {}: file not found", cli.config.display());
    }
    lift_config::load_file(&cli.config)
        .map_err(|e| eyre::Report::new(LiftError::Config(format!("{e:#}"))))
}

fn check(cfg: &lift_config::Config, json: bool) {
    let b = &cfg.building;
    let t = &cfg.timing;
    if json {
        let v = serde_json::json!({
            "status": "ok",
            "lowest_floor": b.lowest_floor,
            "highest_floor": b.highest_floor,
            "capacity": b.capacity,
            "start_floor": b.start_floor,
            "cycle_s": t.cycle_s,
            "min_tick_ms": t.min_tick_ms,
            "cancel_timeout_ms": t.cancel_timeout_ms,
            "partial_limit": cfg.boarding.partial_limit,
        });
        println!("{v}");
        return;
    }
    println!(
        "config ok: floors {}..{} capacity {} start {}",
        lift_core::display_floor(b.lowest_floor),
        lift_core::display_floor(b.highest_floor),
        b.capacity,
        lift_core::display_floor(b.start_floor)
    );
    println!(
        "timing: cycle {}s, min tick {}ms, cancel timeout {}ms",
        t.cycle_s, t.min_tick_ms, t.cancel_timeout_ms
    );
    match cfg.boarding.partial_limit {
        Some(n) => println!("boarding: at most {n} from a group that does not fit"),
        None => println!("boarding: as many as fit"),
    }
}

fn real_main(cli: &Cli) -> eyre::Result<()> {
    let cfg = load_config(cli)?;
    logging::init(cli.json, cli.log_level.as_deref(), &cfg.logging)?;
    tracing::debug!(config = %cli.config.display(), "config loaded");

    match &cli.cmd {
        Commands::Run { ticks } => run::run(&cfg, *ticks),
        Commands::Check => {
            check(&cfg, cli.json);
            Ok(())
        }
        Commands::Step { calls, ticks } => step::step(&cfg, calls, *ticks, cli.json),
    }
}

fn main() {
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(err) = real_main(&cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        std::process::exit(exit_code_for_error(&err));
    }
}
