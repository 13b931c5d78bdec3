//! Entry point for hostmon. Polls the host monitors once per tick and prints a report line.

use std::env;
use std::io::{self, Write};
use std::time::Duration;

use anyhow::Context;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use hostmon::args::{parse_args, ArgsExit};
use hostmon::config::{config_path, Config};
use hostmon::monitors::Monitors;

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let parsed = match parse_args(env::args()) {
        Ok(v) => v,
        Err(ArgsExit::Help(msg)) => {
            eprintln!("{msg}");
            return Ok(());
        }
        Err(ArgsExit::Invalid(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
    };

    // file < environment < command line
    let path = parsed.config.clone().unwrap_or_else(config_path);
    let (mut cfg, load_err) = match Config::load_from(&path) {
        Ok(c) => (c, None),
        Err(e) => (Config::default(), Some(e)),
    };
    let env_err = cfg.apply_env().err();
    if let Some(ms) = parsed.interval_ms {
        cfg.interval_ms = ms;
    }
    cfg.json |= parsed.json;
    cfg.validate();

    init_logging(&cfg.log_level);
    if let Some(e) = load_err {
        warn!(path = %path.display(), error = %e, "config unusable; using defaults");
    }
    if let Some(v) = env_err {
        warn!(value = %v, "ignoring non-numeric HOSTMON_INTERVAL_MS");
    }
    debug!(?cfg, "effective configuration");

    let mut monitors = Monitors::start(&cfg.monitors);
    if monitors.is_empty() {
        anyhow::bail!("no monitor could be initialized");
    }

    let mut ticker = tokio::time::interval(Duration::from_millis(cfg.interval_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick completes immediately; the baseline is already primed
    ticker.tick().await;

    let mut stdout = io::stdout().lock();
    let mut ticks: u64 = 0;
    loop {
        if parsed.count.is_some_and(|n| ticks >= n) {
            break;
        }
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }
        monitors.update();
        let report = monitors.report();
        let line = if cfg.json {
            report.to_json().context("serializing report")?
        } else {
            report.render_text(cfg.byte_precision, cfg.percent_precision)
        };
        writeln!(stdout, "{line}")?;
        stdout.flush()?;
        ticks += 1;
    }
    Ok(())
}
