//! Real-time front end. A worker thread keeps the simulation paced with the wall clock
//! and the caller drains pulses from the queue.

use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use tracing::{error, info};

use crate::{
    error::{RadarError, RadarResult},
    pulse::PulseData,
    queue::{queue, QueueConsumer, QueueProducer},
    radar::{config::RadarConfig, config::RadarParameters, state::RadarState, Radar, SimulationFlags},
    scene::Target,
};

pub const DEFAULT_TIME_STEP: f64 = 0.15; // s

// State the worker and the caller both touch.
struct Shared {
    // f64 bits of the last published simulation time
    sim_time: AtomicU64,
    on: AtomicBool,
}

impl Shared {
    fn publish(&self, t: f64) {
        self.sim_time.store(t.to_bits(), Ordering::Release);
    }

    fn sim_time(&self) -> f64 {
        f64::from_bits(self.sim_time.load(Ordering::Acquire))
    }
}

// Everything needed to rebuild an engine that was lost with a thread that never ran.
// The random source is not kept, the rebuilt engine draws from fresh entropy.
struct EngineSnapshot {
    params: RadarParameters,
    flags: SimulationFlags,
    state: RadarState,
}

impl EngineSnapshot {
    fn take(radar: &Radar) -> EngineSnapshot {
        EngineSnapshot {
            params: radar.parameters().clone(),
            flags: radar.flags(),
            state: radar.state().clone(),
        }
    }

    fn restore(self) -> RadarResult<Radar> {
        let mut radar = Radar::from_parameters(self.params)?;
        radar.set_flags(self.flags);
        radar.restore_state(self.state);
        Ok(radar)
    }
}

struct WorkerExit {
    radar: Radar,
    producer: QueueProducer,
    // Time spent generating, excluding sleeps
    work: Duration,
    wall: Duration,
}

struct WorkerSettings {
    targets: Arc<[Target]>,
    time_step: f64,
    override_power: Option<f64>,
    first_start: bool,
}

fn run_worker(
    mut radar: Radar,
    mut producer: QueueProducer,
    shared: Arc<Shared>,
    settings: WorkerSettings,
) -> WorkerExit {
    let WorkerSettings {
        targets,
        time_step,
        override_power,
        first_start,
    } = settings;
    let timer = Instant::now();
    let mut work = Duration::ZERO;

    if first_start {
        radar.reset(0.);
    }
    let start_time = radar.time();
    shared.publish(start_time);

    let mut failed = false;
    if !producer.is_initialized() {
        if let Err(e) = producer.push_initial(radar.generate(&targets, override_power)) {
            error!(error = %e, "Could not seed the pulse queue");
            failed = true;
        }
    }

    let mut checkpoint = start_time + time_step;
    while !failed && shared.on.load(Ordering::Acquire) {
        let period_start = timer.elapsed();

        loop {
            if let Err(e) = producer.push(radar.generate(&targets, override_power)) {
                error!(error = %e, "Simulation worker stopped");
                failed = true;
                break;
            }
            if radar.time() >= checkpoint {
                break;
            }
        }

        shared.publish(radar.time());
        work += timer.elapsed() - period_start;

        // Hold the simulation level with the wall clock
        let ahead = radar.time() - start_time - timer.elapsed().as_secs_f64();
        if ahead > 0. {
            thread::sleep(Duration::from_secs_f64(ahead));
        }

        checkpoint += time_step;
    }

    WorkerExit {
        radar,
        producer,
        work,
        wall: timer.elapsed(),
    }
}

/// Runs a [`Radar`] on a background thread and hands out its pulses.
pub struct RadarInterface {
    consumer: QueueConsumer,
    // Present while stopped
    idle: Option<(Radar, QueueProducer)>,
    worker: Option<JoinHandle<WorkerExit>>,
    shared: Arc<Shared>,
    targets: Arc<[Target]>,
    time_step: f64,
    started_once: bool,
    statistics: bool,
    params: RadarParameters,
}

impl RadarInterface {
    /// `time_step` is the simulated time between published checkpoints, 0.15 s by default.
    pub fn new(config: &RadarConfig, targets: Vec<Target>, time_step: Option<f64>) -> RadarResult<RadarInterface> {
        let radar = Radar::new(config)?;
        Ok(RadarInterface::from_radar(radar, targets, time_step))
    }

    pub fn from_radar(radar: Radar, targets: Vec<Target>, time_step: Option<f64>) -> RadarInterface {
        let (producer, consumer) = queue();
        let params = radar.parameters().clone();
        RadarInterface {
            consumer,
            idle: Some((radar, producer)),
            worker: None,
            shared: Arc::new(Shared {
                sim_time: AtomicU64::new(0f64.to_bits()),
                on: AtomicBool::new(false),
            }),
            targets: targets.into(),
            time_step: time_step.unwrap_or(DEFAULT_TIME_STEP),
            started_once: false,
            statistics: false,
            params,
        }
    }

    // The stopped engine and producer, or why they are unavailable.
    fn idle_mut(&mut self, operation: &'static str) -> RadarResult<&mut (Radar, QueueProducer)> {
        match (&mut self.idle, &self.worker) {
            (Some(idle), _) => Ok(idle),
            (None, Some(_)) => Err(RadarError::SimulationRunning(operation)),
            (None, None) => Err(RadarError::WorkerPanicked),
        }
    }

    /// Starts the worker. With `override_power` every target returns that boresight power.
    pub fn start(&mut self, override_power: Option<f64>) -> RadarResult<()> {
        if self.is_running() {
            return Err(RadarError::AlreadyRunning);
        }
        let (radar, producer) = self.idle.take().ok_or(RadarError::WorkerPanicked)?;
        let snapshot = EngineSnapshot::take(&radar);

        let settings = WorkerSettings {
            targets: self.targets.clone(),
            time_step: self.time_step,
            override_power,
            first_start: !self.started_once,
        };
        self.shared.on.store(true, Ordering::Release);
        let shared = self.shared.clone();

        // Spawning only fails when the OS refuses a thread. The closure and its
        // engine are lost with it, so rebuild the engine from the snapshot.
        // Pulses still queued are lost along with the producer.
        let handle = thread::Builder::new()
            .name("radar-sim".to_owned())
            .spawn(move || run_worker(radar, producer, shared, settings));
        let handle = match handle {
            Ok(handle) => handle,
            Err(e) => {
                self.shared.on.store(false, Ordering::Release);
                let (producer, consumer) = queue();
                self.consumer = consumer;
                self.idle = Some((snapshot.restore()?, producer));
                return Err(e.into());
            }
        };

        info!(time_step = self.time_step, first_start = !self.started_once, "Simulation started");
        self.started_once = true;
        self.worker = Some(handle);
        Ok(())
    }

    /// Stops and joins the worker. Does nothing when already stopped.
    pub fn stop(&mut self) -> RadarResult<()> {
        self.shared.on.store(false, Ordering::Release);
        let handle = match self.worker.take() {
            Some(handle) => handle,
            None => return Ok(()),
        };

        let exit = handle.join().map_err(|_| RadarError::WorkerPanicked)?;
        info!(sim_time = exit.radar.time(), "Simulation stopped");
        if self.statistics && exit.wall > Duration::ZERO {
            info!(
                work_fraction = 100. * exit.work.as_secs_f64() / exit.wall.as_secs_f64(),
                "Simulation work fraction (%)"
            );
        }
        self.idle = Some((exit.radar, exit.producer));
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// True once a worker panic has taken the engine with it. Only
    /// [`get_data`](Self::get_data) and the parameter queries still work.
    pub fn is_dead(&self) -> bool {
        self.idle.is_none() && self.worker.is_none()
    }

    /// Drops queued pulses and moves the engine to time `t`.
    pub fn reset(&mut self, t: f64) -> RadarResult<()> {
        let (radar, producer) = match (&mut self.idle, &self.worker) {
            (Some(idle), _) => (&mut idle.0, &mut idle.1),
            (None, Some(_)) => return Err(RadarError::SimulationRunning("reset")),
            (None, None) => return Err(RadarError::WorkerPanicked),
        };
        self.consumer.clear(producer)?;
        radar.reset(t);
        self.shared.publish(t);
        // An explicit reset replaces the reset to zero of the first start
        self.started_once = true;
        Ok(())
    }

    /// Simulation time of the newest published checkpoint, s.
    pub fn sim_time(&self) -> f64 {
        self.shared.sim_time()
    }

    pub fn data_ready(&mut self) -> bool {
        if self.consumer.observed() <= 1 {
            self.consumer.len();
        }
        self.consumer.observed() > 1
    }

    pub fn get_data(&mut self) -> RadarResult<PulseData> {
        if self.consumer.observed() <= 1 {
            return Err(RadarError::DataNotReady);
        }
        self.consumer.pop()
    }

    pub fn set_add_noise(&mut self, on: bool) -> RadarResult<()> {
        let (radar, _) = self.idle_mut("set_add_noise")?;
        radar.set_add_noise(on);
        Ok(())
    }

    pub fn set_statistics(&mut self, on: bool) -> RadarResult<()> {
        if self.is_running() {
            return Err(RadarError::SimulationRunning("set_statistics"));
        }
        self.statistics = on;
        Ok(())
    }

    /// Range of the middle of bin `n`, m.
    pub fn range_of_bin(&self, n: usize) -> f64 {
        self.params.range_of_bin(n)
    }

    pub fn parameters(&self) -> &RadarParameters {
        &self.params
    }

    pub fn time_step(&self) -> f64 {
        self.time_step
    }
}

impl Drop for RadarInterface {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            error!(error = %e, "Simulation worker failed");
        }
    }
}
