//! `lift run`: JSON-lines transport over stdin/stdout.
//!
//! Requests are read one per line from stdin and handed to the simulation.
//! Every broadcast snapshot is written to stdout as one JSON line; rejected
//! requests produce an `{"type":"error",...}` line instead.

use crossbeam_channel as xch;
use eyre::WrapErr;
use lift_core::protocol::{Reply, decode};
use lift_core::harness::SimulationBuilder;
use lift_core::{SimConfig, Simulation, Snapshot};
use std::io::{BufRead, Write};
use std::sync::Arc;

/// Snapshots buffered between the cycle task and the stdout writer.
const OBSERVER_BACKLOG: usize = 64;

fn write_line(line: &str) -> eyre::Result<()> {
    let mut out = std::io::stdout().lock();
    writeln!(out, "{line}").wrap_err("write stdout")?;
    out.flush().wrap_err("flush stdout")
}

fn write_snapshot(s: &Snapshot) -> eyre::Result<()> {
    write_line(&s.to_json().wrap_err("encode snapshot")?)
}

/// Feed stdin lines to the simulation until EOF, then signal `eof`.
fn spawn_reader(sim: Arc<Simulation>, eof: xch::Sender<()>) -> eyre::Result<()> {
    std::thread::Builder::new()
        .name("lift-stdin".into())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let line = match line {
                    Ok(l) => l,
                    Err(e) => {
                        tracing::warn!(error = %e, "stdin read failed");
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                if let Err(e) = decode(&line).and_then(|req| sim.handle(req)) {
                    tracing::warn!(error = %e, "request rejected");
                    match serde_json::to_string(&Reply::from(&e)) {
                        Ok(json) => {
                            if let Err(e) = write_line(&json) {
                                tracing::warn!(error = %e, "reply not written");
                            }
                        }
                        Err(e) => tracing::warn!(error = %e, "reply not encoded"),
                    }
                }
            }
            tracing::debug!("stdin closed");
            let _ = eof.send(());
        })
        .wrap_err("spawn stdin reader")?;
    Ok(())
}

pub fn run(cfg: &lift_config::Config, ticks: Option<u64>) -> eyre::Result<()> {
    let sim = Arc::new(SimulationBuilder::from_config(cfg).build());
    let snapshots = sim.subscribe_channel(OBSERVER_BACKLOG);

    let (stop_tx, stop_rx) = xch::bounded::<()>(1);
    ctrlc::set_handler(move || {
        let _ = stop_tx.try_send(());
    })
    .wrap_err("install Ctrl-C handler")?;

    sim.configure(SimConfig::from(cfg))?;

    let (eof_tx, eof_rx) = xch::bounded::<()>(1);
    spawn_reader(Arc::clone(&sim), eof_tx)?;

    let idle = xch::never::<()>();
    let mut stdin_closed = false;
    let mut written: u64 = 0;
    loop {
        let eof = if stdin_closed { &idle } else { &eof_rx };
        xch::select! {
            recv(snapshots) -> msg => {
                let Ok(snapshot) = msg else { break };
                write_snapshot(&snapshot)?;
                written += 1;
                if ticks.is_some_and(|n| written >= n) {
                    break;
                }
            }
            recv(stop_rx) -> _ => {
                tracing::info!("interrupted");
                break;
            }
            recv(eof) -> _ => {
                if ticks.is_none() {
                    break;
                }
                // Keep running until the tick budget is spent.
                stdin_closed = true;
            }
        }
    }

    sim.shutdown()?;
    tracing::info!(snapshots = written, "run finished");
    Ok(())
}
