use clap::{App, Arg};
use colored::*;
use riobus::config::EmulatorConfig;
use riobus::manager::{AcquireState, StateManager};
use riobus::publisher::{SnapshotKind, SnapshotPublisher};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

fn positive_number(v: String) -> Result<(), String> {
    match v.parse::<u64>() {
        Ok(n) if n > 0 => Ok(()),
        _ => Err("must be a positive number".into()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let matches = App::new("riobus-sim")
        .version("0.1.0")
        .about("Emulated robot controller: register state with periodic snapshot export")
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("FILE")
                .help("JSON emulator configuration")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("period")
                .short("p")
                .long("period")
                .value_name("MS")
                .help("Snapshot publish period in milliseconds")
                .takes_value(true)
                .validator(positive_number),
        )
        .arg(
            Arg::with_name("deep-every")
                .long("deep-every")
                .value_name("N")
                .help("Publish a deep snapshot every N periods")
                .takes_value(true)
                .validator(positive_number),
        )
        .arg(
            Arg::with_name("print")
                .long("print")
                .help("Write every snapshot to stdout"),
        )
        .get_matches();

    let mut config = match matches.value_of("config") {
        Some(path) => EmulatorConfig::load(path)?,
        None => EmulatorConfig::default(),
    };
    if let Some(period) = matches.value_of("period") {
        config.flush_period_ms = period.parse()?;
    }
    if let Some(deep_every) = matches.value_of("deep-every") {
        config.deep_every = deep_every.parse()?;
    }
    let print = matches.is_present("print");

    println!("{}", "riobus - emulated robot controller".bright_blue().bold());
    println!(
        "{} {} ms, {} {}",
        "publish period".dimmed(),
        config.flush_period_ms,
        "deep every".dimmed(),
        config.deep_every
    );

    let manager = Arc::new(StateManager::new());
    let installed = manager.acquire().with_mut(|state| config.apply_joysticks(state))??;
    if installed > 0 {
        info!(installed, "joystick presets applied");
    }

    let publisher = SnapshotPublisher::new(Arc::clone(&manager), &config);
    let mut snapshots = publisher.subscribe();

    let consumer = tokio::spawn(async move {
        loop {
            match snapshots.recv().await {
                Ok(snapshot) => {
                    let kind = match snapshot.kind {
                        SnapshotKind::Deep => "deep",
                        SnapshotKind::Shallow => "shallow",
                    };
                    info!(sequence = snapshot.sequence, kind, bytes = snapshot.text.len(), "snapshot");
                    if print {
                        print!("{}", snapshot.text);
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "snapshot consumer lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl-C: {}", e);
        }
    };
    let published = publisher.run(shutdown).await?;
    consumer.await?;

    println!(
        "{} {} snapshots, {} state acquisitions",
        "stopped after".bright_green(),
        published,
        manager.acquisitions()
    );
    Ok(())
}
