pub mod adapter;
pub mod config;
pub mod error;
pub mod model;
pub mod privilege;
pub mod rate;
pub mod sampler;
pub mod sensor;

pub use adapter::{ChannelAdapter, PresentationAdapter};
pub use config::{CliConfig, Config, GpuConfig, ALLOWED_INTERVALS};
pub use error::{CoreError, Result, SensorError};
pub use model::*;
pub use privilege::{Elevation, Elevator, PrivilegeGate};
pub use rate::RateCounter;
pub use sampler::{Sampler, SamplerState};
pub use sensor::{default_sensors, SampleContext, Sensor};
