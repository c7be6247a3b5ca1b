use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OvenConfig {
    pub min_temperature_c: f32,
    pub max_temperature_c: f32,
    pub max_ventilation: u8,
    pub silent_ventilation_cap: u8,
    pub base_cook_secs: u64,
    pub cook_tick_ms: u64,
    pub supersede_grace_ms: u64,
    pub smoke_poll_interval_ms: u64,
    pub empty_scale_probability: f64,
    pub smoke_probability: f64,
    pub min_weight: u32,
    pub max_weight: u32,
}

impl Default for OvenConfig {
    fn default() -> Self {
        Self {
            min_temperature_c: 20.0,
            max_temperature_c: 300.0,
            max_ventilation: 6,
            silent_ventilation_cap: 2,
            base_cook_secs: 10,
            cook_tick_ms: 1_000,
            supersede_grace_ms: 1_500,
            smoke_poll_interval_ms: 5_000,
            empty_scale_probability: 0.2,
            smoke_probability: 0.0,
            min_weight: 100,
            max_weight: 800,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplianceSettings {
    pub defrost: bool,
    pub ambient_light: bool,
    pub silent_mode: bool,
    pub ventilation: u8,
    pub target_temperature_c: f32,
}

impl Default for ApplianceSettings {
    fn default() -> Self {
        Self {
            defrost: false,
            ambient_light: false,
            silent_mode: false,
            ventilation: 0,
            target_temperature_c: 20.0,
        }
    }
}

impl ApplianceSettings {
    pub fn sanitize(&mut self, config: &OvenConfig) {
        if !self.target_temperature_c.is_finite() {
            self.target_temperature_c = config.min_temperature_c;
        }
        self.target_temperature_c = self
            .target_temperature_c
            .clamp(config.min_temperature_c, config.max_temperature_c);
        self.ventilation = self.ventilation.min(config.max_ventilation);

        if self.silent_mode {
            self.ventilation = self.ventilation.min(config.silent_ventilation_cap);
            self.ambient_light = false;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub oven: OvenConfig,
    #[serde(default)]
    pub settings: ApplianceSettings,
}
