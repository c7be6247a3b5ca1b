pub mod config;
pub mod cooking;
pub mod engine;
pub mod media;
pub mod sensors;
pub mod thermostat;
pub mod types;

pub use config::{ApplianceSettings, OvenConfig, RuntimeConfig};
pub use cooking::{CookMode, CookPlan, CookProfile, Food};
pub use engine::ApplianceEngine;
pub use media::MediaPlayer;
pub use sensors::{CameraFeed, Entropy, SmokeSensor, ThreadEntropy, WeightSensor};
pub use thermostat::Thermostat;
pub use types::{
    ApplianceError, ApplianceStatus, CookStatusPayload, KeepWarmOutcome, MediaCommand,
    MediaOutcome, SensorName, SetOutcome, SettingName,
};
