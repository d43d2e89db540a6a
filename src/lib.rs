// Do this because numerics calls for a lot of non-standard names
#![allow(non_snake_case)]
#![allow(non_upper_case_globals)]
pub mod antenna;
pub mod error;
pub mod helper;
pub mod helper_traits;
pub mod interface;
pub mod pulse;
pub mod queue;
pub mod radar;
pub mod rng;
pub mod scene;
pub mod signal;

pub use error::{RadarError, RadarResult};
pub use interface::RadarInterface;
pub use pulse::{PulseData, PulseReader, PulseWriter};
pub use radar::{config::RadarConfig, parser::load_config, Radar};
pub use scene::Target;
