use serde::Serialize;
use thiserror::Error;

use crate::cooking::CookPlan;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingName {
    Defrost,
    Temperature,
    AmbientLight,
    Ventilation,
    SilentMode,
}

impl SettingName {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "defrost" => Some(Self::Defrost),
            "temperature" => Some(Self::Temperature),
            "ambient_light" => Some(Self::AmbientLight),
            "ventilation" => Some(Self::Ventilation),
            "silent_mode" => Some(Self::SilentMode),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Defrost => "defrost",
            Self::Temperature => "temperature",
            Self::AmbientLight => "ambient_light",
            Self::Ventilation => "ventilation",
            Self::SilentMode => "silent_mode",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorName {
    Thermostat,
    Weight,
    Smoke,
    Camera,
}

impl SensorName {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "thermostat" => Some(Self::Thermostat),
            "weight" => Some(Self::Weight),
            "smoke" => Some(Self::Smoke),
            "camera" => Some(Self::Camera),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Thermostat => "thermostat",
            Self::Weight => "weight",
            Self::Smoke => "smoke",
            Self::Camera => "camera",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaCommand {
    Play,
    Stop,
}

impl MediaCommand {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "play" => Some(Self::Play),
            "stop" => Some(Self::Stop),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Play => "play",
            Self::Stop => "stop",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApplianceError {
    #[error("{0} was not found")]
    UnknownSetting(String),
    #[error("{0} was not found")]
    UnknownSensor(String),
    #[error("{0} is not on the menu")]
    UnknownFood(String),
    #[error("{0} is not a media command")]
    UnknownMediaCommand(String),
    #[error("'{value}' is not a valid value for {name}")]
    InvalidValue { name: String, value: String },
    #[error("silent mode is active, turn it off and try again")]
    SilentModeActive,
    #[error("no food detected on the scale")]
    NoFoodDetected,
    #[error("{0} is a sensor and cannot be set")]
    SensorReadOnly(String),
    #[error("song payload is not valid base64")]
    InvalidSongPayload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    Applied,
    SilentModeEnabled,
    SilentModeDisabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaOutcome {
    Playing,
    Stopped,
}

#[derive(Debug, Clone, PartialEq)]
pub enum KeepWarmOutcome {
    Started {
        plan: CookPlan,
        keep_food_warm: bool,
    },
    Toggled(bool),
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplianceStatus {
    #[serde(rename = "currentTemperature")]
    pub current_temperature: f32,
    #[serde(rename = "targetTemperature")]
    pub target_temperature: f32,
    pub ventilation: u8,
    #[serde(rename = "ambientLight")]
    pub ambient_light: bool,
    #[serde(rename = "silentMode")]
    pub silent_mode: bool,
    pub defrost: bool,
    #[serde(rename = "activeFood")]
    pub active_food: String,
    #[serde(rename = "keepFoodWarm")]
    pub keep_food_warm: bool,
    #[serde(rename = "mediaPlaying")]
    pub media_playing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CookStatusPayload {
    #[serde(rename = "keepFoodWarm")]
    pub keep_food_warm: bool,
    #[serde(rename = "activeFood")]
    pub active_food: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognized_names_round_trip() {
        for name in ["defrost", "temperature", "ambient_light", "ventilation", "silent_mode"] {
            assert_eq!(SettingName::parse(name).unwrap().as_str(), name);
        }
        for name in ["thermostat", "weight", "smoke", "camera"] {
            assert_eq!(SensorName::parse(name).unwrap().as_str(), name);
        }
        assert_eq!(SettingName::parse("turbo"), None);
        assert_eq!(SensorName::parse("sonar"), None);
        assert_eq!(MediaCommand::parse("pause"), None);
    }

    #[test]
    fn cook_status_serializes_camel_case() {
        let payload = CookStatusPayload {
            keep_food_warm: true,
            active_food: "chicken".to_string(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["keepFoodWarm"], true);
        assert_eq!(json["activeFood"], "chicken");
    }
}
