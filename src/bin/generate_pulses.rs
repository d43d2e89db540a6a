use std::{env, process};

use nalgebra::Vector3;
use radar_sim::{load_config, PulseWriter, Radar, RadarResult, Target};
use tracing::{info, Level};

const DEFAULT_COUNT: usize = 100;

fn run(config: &str, out: &str, count: usize) -> RadarResult<()> {
    let config = load_config(config)?;
    let mut radar = Radar::new(&config)?;

    // One target 5 km out along the initial boresight
    let pos = radar.boresight() * 5000. + Vector3::new(0., 0., 100.);
    let targets = [Target::stationary(pos, 1.)];

    let mut writer = PulseWriter::create(out)?;
    for _ in 0..count {
        writer.write(&radar.generate(&targets, None))?;
    }
    writer.finish()?;

    info!(count, sim_time = radar.time(), path = out, "Pulses recorded");
    Ok(())
}

fn main() {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let args = env::args().collect::<Vec<_>>();
    if args.len() < 3 || args.len() > 4 {
        eprintln!("usage: {} <config> <out.bin> [count]", args[0]);
        process::exit(2);
    }
    let count = match args.get(3).map(|n| n.parse::<usize>()) {
        None => DEFAULT_COUNT,
        Some(Ok(n)) => n,
        Some(Err(_)) => {
            eprintln!("count must be a non-negative integer");
            process::exit(2);
        }
    };

    if let Err(e) = run(&args[1], &args[2], count) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}
