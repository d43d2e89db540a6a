//! Error types shared by the simulator

use std::io;
use thiserror::Error;

/// Result type for simulator operations
pub type RadarResult<T> = Result<T, RadarError>;

/// Errors reported by the radar simulator.
///
/// Two classes exist. Configuration faults come out of constructors and mean the
/// input has to be corrected before trying again. Usage faults mean a caller broke
/// a protocol (queue, interface or stream) and are never retried internally.
#[derive(Error, Debug)]
pub enum RadarError {
    /// Interpolation table rejected at construction
    #[error("Invalid interpolation table: {0}")]
    InvalidTable(String),

    /// ADC resolution or power bounds out of range
    #[error("Invalid ADC configuration: {0}")]
    InvalidAdc(String),

    /// A required radar parameter was never set
    #[error("Missing required radar parameter '{0}'")]
    MissingParameter(&'static str),

    /// Parameters are set but contradict each other
    #[error("Inconsistent radar parameters: {0}")]
    InconsistentParameters(String),

    /// Config text could not be parsed
    #[error("Config line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Recorded pulse file has a version this reader does not know
    #[error("Unsupported pulse file version {0}")]
    UnsupportedVersion(i32),

    /// `push_initial` called a second time
    #[error("Queue already holds its initial pulse")]
    QueueAlreadyInitialized,

    /// `push` called before `push_initial`
    #[error("Queue has not received its initial pulse")]
    QueueNotInitialized,

    /// `pop` called while the consumer has seen at most one node
    #[error("Queue holds {0} pulse(s), pop requires at least two")]
    QueueExhausted(usize),

    /// Producer and consumer handles come from different queues
    #[error("Queue handles belong to different queues")]
    QueueMismatch,

    /// `start` called while the worker is running
    #[error("Simulation is already running")]
    AlreadyRunning,

    /// Operation only allowed while the worker is stopped
    #[error("Cannot {0} while the simulation is running")]
    SimulationRunning(&'static str),

    /// `get_data` called without a ready pulse
    #[error("No pulse data ready, check data_ready() first")]
    DataNotReady,

    /// The simulation worker died and took the engine with it
    #[error("Simulation worker panicked")]
    WorkerPanicked,

    /// Write after the recorder was finished
    #[error("Pulse stream is closed")]
    StreamClosed,

    /// Read past the last recorded pulse
    #[error("Pulse stream is exhausted")]
    StreamExhausted,

    /// End of file inside a pulse record
    #[error("Pulse record truncated while reading {0}")]
    TruncatedRecord(&'static str),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl RadarError {
    /// Check if this error comes from bad construction input
    pub fn is_config_fault(&self) -> bool {
        matches!(
            self,
            RadarError::InvalidTable(_)
                | RadarError::InvalidAdc(_)
                | RadarError::MissingParameter(_)
                | RadarError::InconsistentParameters(_)
                | RadarError::Parse { .. }
                | RadarError::UnsupportedVersion(_)
        )
    }

    /// Check if this error is a caller contract violation
    pub fn is_usage_fault(&self) -> bool {
        matches!(
            self,
            RadarError::QueueAlreadyInitialized
                | RadarError::QueueNotInitialized
                | RadarError::QueueExhausted(_)
                | RadarError::QueueMismatch
                | RadarError::AlreadyRunning
                | RadarError::SimulationRunning(_)
                | RadarError::DataNotReady
                | RadarError::StreamClosed
                | RadarError::StreamExhausted
        )
    }
}
