//! Radio Simulator
//!
//! Emits a scripted stream of platform radio callbacks as JSON lines, for
//! piping into the bridge without beacon hardware:
//!
//! Usage: cargo run --bin radio-sim -- --uuid <REGION_UUID> | cargo run --bin fanmaker-beacons

use clap::Parser;
use fanmaker_beacons::beacons::{AuthorizationStatus, Proximity, RadioEvent, RangedBeacon};
use std::io::Write;
use tokio::time::{sleep, Duration};

#[derive(Parser)]
#[command(name = "radio-sim")]
#[command(about = "Emit simulated beacon radio events as JSON lines")]
struct Args {
    /// Region (proximity) UUID to report
    #[arg(long, default_value = "B9407F30-F5F8-466E-AFF9-25556B57FE6D")]
    uuid: String,

    /// Major value of every simulated beacon
    #[arg(long, default_value_t = 1)]
    major: u16,

    /// Number of beacons in view
    #[arg(long, default_value_t = 3)]
    beacons: u16,

    /// Ranging callbacks to emit while inside the region
    #[arg(long, default_value_t = 90)]
    ticks: u32,

    /// Delay between ranging callbacks, in milliseconds
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    eprintln!("📡 FanMaker Radio Simulator");
    eprintln!("  Region: {}", args.uuid);
    eprintln!("  Beacons: {} (major {})", args.beacons, args.major);
    eprintln!();

    // Let the bridge fetch its catalog before the first boundary crossing
    sleep(Duration::from_secs(2)).await;

    emit(&RadioEvent::Authorization {
        status: AuthorizationStatus::AuthorizedAlways,
    })?;
    emit(&RadioEvent::Enter {
        identifier: args.uuid.clone(),
    })?;

    for tick in 0..args.ticks {
        sleep(Duration::from_millis(args.interval_ms)).await;
        let beacons = (1..=args.beacons)
            .map(|minor| simulated_beacon(&args, minor, tick))
            .collect();
        emit(&RadioEvent::Range {
            identifier: args.uuid.clone(),
            beacons,
        })?;
    }

    emit(&RadioEvent::Exit {
        identifier: args.uuid.clone(),
    })?;

    eprintln!("✨ Simulation complete!");
    Ok(())
}

/// Signal drifts as the simulated visitor walks past the beacons
fn simulated_beacon(args: &Args, minor: u16, tick: u32) -> RangedBeacon {
    let phase = (tick + u32::from(minor) * 7) % 30;
    let rssi = -45 - phase as i32 * 2;
    let accuracy = 0.3 + f64::from(phase) * 0.25;
    let proximity = match phase {
        0..=4 => Proximity::Immediate,
        5..=14 => Proximity::Near,
        _ => Proximity::Far,
    };
    RangedBeacon {
        uuid: args.uuid.clone(),
        major: args.major,
        minor,
        proximity,
        rssi,
        accuracy,
    }
}

fn emit(event: &RadioEvent) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer(&mut stdout, event)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}
