use std::{env, process, thread, time::Duration};

use nalgebra::Vector3;
use radar_sim::{load_config, RadarInterface, RadarResult, Target};
use tracing::Level;

const PULSES: usize = 10;
const BINS: std::ops::Range<usize> = 250..260;

fn run(config: &str) -> RadarResult<()> {
    let config = load_config(config)?;
    let targets = vec![
        Target::stationary(Vector3::new(0., 4800., 0.), 1.),
        Target::linear(Vector3::new(3000., 3000., 0.), Vector3::new(-100., 0., 0.), 60., 5.)?,
    ];
    let mut interface = RadarInterface::new(&config, targets, None)?;
    interface.set_statistics(true)?;
    interface.start(None)?;

    let mut shown = 0;
    while shown < PULSES {
        if !interface.data_ready() {
            thread::sleep(Duration::from_millis(10));
            continue;
        }
        let pulse = interface.get_data()?;
        let end = BINS.end.min(pulse.num_bins());
        let start = BINS.start.min(end);
        println!(
            "t = {:.6} s, {:.0}-{:.0} m: {:?}",
            pulse.start_time,
            interface.range_of_bin(start),
            interface.range_of_bin(end),
            pulse.registry.slice(ndarray::s![start..end]).to_vec()
        );
        shown += 1;
    }

    interface.stop()
}

fn main() {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let args = env::args().collect::<Vec<_>>();
    if args.len() != 2 {
        eprintln!("usage: {} <config>", args[0]);
        process::exit(2);
    }
    if let Err(e) = run(&args[1]) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}
