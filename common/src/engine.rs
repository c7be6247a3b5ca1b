use crate::{
    config::{ApplianceSettings, OvenConfig},
    cooking::{CookMode, CookPlan, Food},
    media::MediaPlayer,
    sensors::{CameraFeed, Entropy, SmokeSensor, ThreadEntropy, WeightSensor},
    thermostat::Thermostat,
    types::{
        ApplianceError, ApplianceStatus, CookStatusPayload, KeepWarmOutcome, MediaCommand,
        MediaOutcome, SensorName, SetOutcome, SettingName,
    },
};

/// The single owned appliance aggregate. Every mutating or reading
/// operation goes through here; callers serialize access behind one lock.
pub struct ApplianceEngine {
    config: OvenConfig,
    settings: ApplianceSettings,
    thermostat: Thermostat,
    cook: CookMode,
    media: MediaPlayer,
    entropy: Box<dyn Entropy>,
}

impl ApplianceEngine {
    pub fn new(config: OvenConfig, settings: ApplianceSettings) -> Self {
        Self::with_entropy(config, settings, Box::new(ThreadEntropy))
    }

    pub fn with_entropy(
        config: OvenConfig,
        mut settings: ApplianceSettings,
        entropy: Box<dyn Entropy>,
    ) -> Self {
        settings.sanitize(&config);
        let thermostat = Thermostat::new(settings.target_temperature_c);
        Self {
            config,
            settings,
            thermostat,
            cook: CookMode::default(),
            media: MediaPlayer::new(),
            entropy,
        }
    }

    pub fn settings(&self) -> &ApplianceSettings {
        &self.settings
    }

    pub fn is_media_playing(&self) -> bool {
        self.media.is_playing()
    }

    pub fn current_temperature(&self, now_ms: u64) -> f32 {
        self.thermostat.current(now_ms)
    }

    pub fn set_setting(
        &mut self,
        name: &str,
        value: &str,
        now_ms: u64,
    ) -> Result<SetOutcome, ApplianceError> {
        // No sensor is writable.
        if SensorName::parse(name).is_some() {
            return Err(ApplianceError::SensorReadOnly(name.to_string()));
        }
        let setting = SettingName::parse(name)
            .ok_or_else(|| ApplianceError::UnknownSetting(name.to_string()))?;

        match setting {
            SettingName::Defrost => {
                self.settings.defrost = parse_bool(setting, value)?;
                Ok(SetOutcome::Applied)
            }
            SettingName::Temperature => {
                let target = self.parse_temperature(value)?;
                self.settings.target_temperature_c = target;
                self.thermostat.reanchor(target, now_ms);
                Ok(SetOutcome::Applied)
            }
            SettingName::AmbientLight => {
                let on = parse_bool(setting, value)?;
                if on && self.settings.silent_mode {
                    return Err(ApplianceError::SilentModeActive);
                }
                self.settings.ambient_light = on;
                Ok(SetOutcome::Applied)
            }
            SettingName::Ventilation => {
                let level = self.parse_ventilation(value)?;
                if self.settings.silent_mode && level > self.config.silent_ventilation_cap {
                    return Err(ApplianceError::SilentModeActive);
                }
                self.settings.ventilation = level;
                Ok(SetOutcome::Applied)
            }
            SettingName::SilentMode => {
                if parse_bool(setting, value)? {
                    self.settings.silent_mode = true;
                    self.settings.ambient_light = false;
                    self.settings.ventilation = self
                        .settings
                        .ventilation
                        .min(self.config.silent_ventilation_cap);
                    self.media.force_stop();
                    Ok(SetOutcome::SilentModeEnabled)
                } else {
                    self.settings.silent_mode = false;
                    self.settings.ambient_light = true;
                    Ok(SetOutcome::SilentModeDisabled)
                }
            }
        }
    }

    pub fn setting_value(&self, name: &str) -> Result<String, ApplianceError> {
        let setting = SettingName::parse(name)
            .ok_or_else(|| ApplianceError::UnknownSetting(name.to_string()))?;

        let value = match setting {
            SettingName::Defrost => self.settings.defrost.to_string(),
            SettingName::Temperature => format!("{}", self.settings.target_temperature_c),
            SettingName::AmbientLight => self.settings.ambient_light.to_string(),
            SettingName::Ventilation => self.settings.ventilation.to_string(),
            SettingName::SilentMode => self.settings.silent_mode.to_string(),
        };
        Ok(value)
    }

    /// Sensor reads always produce a value; only an unrecognized name fails.
    pub fn sensor_value(&mut self, name: &str, now_ms: u64) -> Result<String, ApplianceError> {
        let sensor =
            SensorName::parse(name).ok_or_else(|| ApplianceError::UnknownSensor(name.to_string()))?;

        let value = match sensor {
            SensorName::Thermostat => format!("{:.1}", self.thermostat.current(now_ms)),
            SensorName::Weight => {
                WeightSensor::read(self.entropy.as_mut(), &self.config).to_string()
            }
            SensorName::Smoke => SmokeSensor::read(self.entropy.as_mut(), &self.config).to_string(),
            SensorName::Camera => CameraFeed::status().to_string(),
        };
        Ok(value)
    }

    pub fn smoke_alarm(&mut self) -> bool {
        SmokeSensor::read(self.entropy.as_mut(), &self.config)
    }

    pub fn start_cook(&mut self, food: &str, now_ms: u64) -> Result<CookPlan, ApplianceError> {
        let food =
            Food::parse(food).ok_or_else(|| ApplianceError::UnknownFood(food.to_string()))?;
        let plan = self.preflight(food)?;
        self.apply_plan(&plan, now_ms);
        self.cook.keep_food_warm = false;
        Ok(plan)
    }

    pub fn set_keep_warm(
        &mut self,
        food: &str,
        value: &str,
        now_ms: u64,
    ) -> Result<KeepWarmOutcome, ApplianceError> {
        let food =
            Food::parse(food).ok_or_else(|| ApplianceError::UnknownFood(food.to_string()))?;
        let keep_food_warm = match value {
            "true" => true,
            "false" => false,
            _ => {
                return Err(ApplianceError::InvalidValue {
                    name: "keep_food_warm".to_string(),
                    value: value.to_string(),
                })
            }
        };

        let plan = self.preflight(food)?;
        if self.cook.active_food == Some(food) {
            self.cook.keep_food_warm = keep_food_warm;
            Ok(KeepWarmOutcome::Toggled(keep_food_warm))
        } else {
            self.apply_plan(&plan, now_ms);
            self.cook.keep_food_warm = keep_food_warm;
            Ok(KeepWarmOutcome::Started {
                plan,
                keep_food_warm,
            })
        }
    }

    pub fn cook_status(&self) -> CookStatusPayload {
        CookStatusPayload {
            keep_food_warm: self.cook.keep_food_warm,
            active_food: self
                .cook
                .active_food
                .map(Food::as_str)
                .unwrap_or("")
                .to_string(),
        }
    }

    pub fn media_command(&mut self, command: &str) -> Result<MediaOutcome, ApplianceError> {
        let command = MediaCommand::parse(command)
            .ok_or_else(|| ApplianceError::UnknownMediaCommand(command.to_string()))?;
        self.media.command(command, self.settings.silent_mode)
    }

    pub fn play_song(&mut self, payload: &str) -> Result<MediaOutcome, ApplianceError> {
        self.media.play_song(payload, self.settings.silent_mode)
    }

    pub fn status(&self, now_ms: u64) -> ApplianceStatus {
        ApplianceStatus {
            current_temperature: self.thermostat.current(now_ms),
            target_temperature: self.settings.target_temperature_c,
            ventilation: self.settings.ventilation,
            ambient_light: self.settings.ambient_light,
            silent_mode: self.settings.silent_mode,
            defrost: self.settings.defrost,
            active_food: self
                .cook
                .active_food
                .map(Food::as_str)
                .unwrap_or("")
                .to_string(),
            keep_food_warm: self.cook.keep_food_warm,
            media_playing: self.media.is_playing(),
        }
    }

    /// Weight and silent-mode preconditions shared by cook start and
    /// keep-warm. Does not mutate on rejection.
    fn preflight(&mut self, food: Food) -> Result<CookPlan, ApplianceError> {
        let weight = WeightSensor::read(self.entropy.as_mut(), &self.config);
        if weight == 0 {
            return Err(ApplianceError::NoFoodDetected);
        }

        let profile = food.profile();
        if self.settings.silent_mode && profile.ventilation > self.config.silent_ventilation_cap {
            return Err(ApplianceError::SilentModeActive);
        }

        Ok(CookPlan {
            food,
            weight,
            duration_secs: profile.duration_secs(self.config.base_cook_secs, weight),
            ventilation: profile.ventilation,
            target_temperature_c: profile.target_temperature_c,
        })
    }

    fn apply_plan(&mut self, plan: &CookPlan, now_ms: u64) {
        self.settings.ventilation = plan.ventilation;
        self.settings.target_temperature_c = plan.target_temperature_c;
        self.thermostat.reanchor(plan.target_temperature_c, now_ms);
        self.cook.active_food = Some(plan.food);
    }

    // Numeric syntax is validated before the range check, so malformed
    // text surfaces as InvalidValue instead of aborting the request.
    fn parse_temperature(&self, value: &str) -> Result<f32, ApplianceError> {
        let parsed: f32 = value
            .parse()
            .map_err(|_| invalid(SettingName::Temperature, value))?;
        if !parsed.is_finite()
            || !(self.config.min_temperature_c..=self.config.max_temperature_c).contains(&parsed)
        {
            return Err(invalid(SettingName::Temperature, value));
        }
        Ok(parsed)
    }

    fn parse_ventilation(&self, value: &str) -> Result<u8, ApplianceError> {
        let parsed: u8 = value
            .parse()
            .map_err(|_| invalid(SettingName::Ventilation, value))?;
        if parsed > self.config.max_ventilation {
            return Err(invalid(SettingName::Ventilation, value));
        }
        Ok(parsed)
    }
}

fn parse_bool(setting: SettingName, value: &str) -> Result<bool, ApplianceError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(invalid(setting, value)),
    }
}

fn invalid(setting: SettingName, value: &str) -> ApplianceError {
    ApplianceError::InvalidValue {
        name: setting.as_str().to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::sensors::ScriptedEntropy;

    fn engine() -> ApplianceEngine {
        ApplianceEngine::with_entropy(
            OvenConfig::default(),
            ApplianceSettings::default(),
            Box::new(ScriptedEntropy::new(&[], &[])),
        )
    }

    fn engine_with_scale(chances: &[bool], draws: &[u32]) -> ApplianceEngine {
        ApplianceEngine::with_entropy(
            OvenConfig::default(),
            ApplianceSettings::default(),
            Box::new(ScriptedEntropy::new(chances, draws)),
        )
    }

    #[test]
    fn ventilation_accepts_full_range_outside_silent_mode() {
        let mut engine = engine();

        for level in 0..=6u8 {
            let value = level.to_string();
            assert_eq!(
                engine.set_setting("ventilation", &value, 0),
                Ok(SetOutcome::Applied)
            );
            assert_eq!(engine.setting_value("ventilation").unwrap(), value);
        }
    }

    #[test]
    fn out_of_range_or_malformed_ventilation_is_rejected_unchanged() {
        let mut engine = engine();
        engine.set_setting("ventilation", "4", 0).unwrap();

        for value in ["7", "-1", "2.5", "high"] {
            assert!(matches!(
                engine.set_setting("ventilation", value, 0),
                Err(ApplianceError::InvalidValue { .. })
            ));
        }
        assert_eq!(engine.setting_value("ventilation").unwrap(), "4");
    }

    #[test]
    fn silent_mode_caps_ventilation_and_forces_light_and_media_off() {
        let mut engine = engine();
        engine.set_setting("ventilation", "5", 0).unwrap();
        engine.set_setting("ambient_light", "true", 0).unwrap();
        engine.media_command("play").unwrap();

        assert_eq!(
            engine.set_setting("silent_mode", "true", 0),
            Ok(SetOutcome::SilentModeEnabled)
        );
        assert_eq!(engine.setting_value("ventilation").unwrap(), "2");
        assert_eq!(engine.setting_value("ambient_light").unwrap(), "false");
        assert!(!engine.is_media_playing());
    }

    #[test]
    fn silent_mode_rejects_high_ventilation_and_light_without_mutation() {
        let mut engine = engine();
        engine.set_setting("silent_mode", "true", 0).unwrap();

        assert_eq!(
            engine.set_setting("ventilation", "3", 0),
            Err(ApplianceError::SilentModeActive)
        );
        assert_eq!(
            engine.set_setting("ambient_light", "true", 0),
            Err(ApplianceError::SilentModeActive)
        );
        assert_eq!(engine.setting_value("ventilation").unwrap(), "0");
        assert_eq!(engine.setting_value("ambient_light").unwrap(), "false");

        assert_eq!(
            engine.set_setting("ventilation", "2", 0),
            Ok(SetOutcome::Applied)
        );
    }

    #[test]
    fn leaving_silent_mode_restores_light_but_not_ventilation() {
        let mut engine = engine();
        engine.set_setting("ventilation", "5", 0).unwrap();
        engine.set_setting("silent_mode", "true", 0).unwrap();

        assert_eq!(
            engine.set_setting("silent_mode", "false", 0),
            Ok(SetOutcome::SilentModeDisabled)
        );
        assert_eq!(engine.setting_value("ventilation").unwrap(), "2");
        assert_eq!(engine.setting_value("ambient_light").unwrap(), "true");
    }

    #[test]
    fn temperature_set_reanchors_the_thermostat() {
        let mut engine = engine();
        engine.set_setting("temperature", "100", 0).unwrap();

        assert_eq!(engine.sensor_value("thermostat", 0).unwrap(), "20.0");
        assert_eq!(engine.sensor_value("thermostat", 40_000).unwrap(), "60.0");
        assert_eq!(engine.sensor_value("thermostat", 80_000).unwrap(), "100.0");
        assert_eq!(engine.sensor_value("thermostat", 200_000).unwrap(), "100.0");
    }

    #[test]
    fn malformed_or_out_of_range_temperature_is_rejected() {
        let mut engine = engine();

        for value in ["twohundred", "NaN", "inf", "19", "301"] {
            assert!(matches!(
                engine.set_setting("temperature", value, 0),
                Err(ApplianceError::InvalidValue { .. })
            ));
        }
        assert_eq!(engine.setting_value("temperature").unwrap(), "20");
    }

    #[test]
    fn sensors_are_not_writable() {
        let mut engine = engine();

        for name in ["thermostat", "weight", "smoke", "camera"] {
            assert_eq!(
                engine.set_setting(name, "1", 0),
                Err(ApplianceError::SensorReadOnly(name.to_string()))
            );
        }
    }

    #[test]
    fn unknown_names_are_reported_explicitly() {
        let mut engine = engine();

        assert_eq!(
            engine.set_setting("turbo", "true", 0),
            Err(ApplianceError::UnknownSetting("turbo".to_string()))
        );
        assert_eq!(
            engine.setting_value("turbo"),
            Err(ApplianceError::UnknownSetting("turbo".to_string()))
        );
        assert_eq!(
            engine.sensor_value("sonar", 0),
            Err(ApplianceError::UnknownSensor("sonar".to_string()))
        );
        assert_eq!(
            engine.start_cook("lasagna", 0),
            Err(ApplianceError::UnknownFood("lasagna".to_string()))
        );
    }

    #[test]
    fn cook_rejected_when_scale_reads_empty() {
        let mut engine = engine_with_scale(&[true], &[]);

        assert_eq!(
            engine.start_cook("chicken", 0),
            Err(ApplianceError::NoFoodDetected)
        );
        assert_eq!(engine.cook_status().active_food, "");
    }

    #[test]
    fn chicken_cook_applies_profile_and_arms_plan() {
        let mut engine = engine_with_scale(&[false], &[400]);

        let plan = engine.start_cook("chicken", 0).unwrap();
        assert_eq!(plan.food, Food::Chicken);
        assert_eq!(plan.duration_secs, 30);
        assert_eq!(plan.ventilation, 4);

        assert_eq!(engine.setting_value("ventilation").unwrap(), "4");
        assert_eq!(engine.setting_value("temperature").unwrap(), "200");
        assert_eq!(engine.cook_status().active_food, "chicken");
        assert!(!engine.cook_status().keep_food_warm);
        // Freshly anchored: still at ambient, heading for the profile target.
        assert_eq!(engine.current_temperature(0), 20.0);
        assert_eq!(engine.current_temperature(180_000), 200.0);
    }

    #[test]
    fn silent_mode_blocks_loud_foods_but_not_quiet_ones() {
        let mut engine = engine_with_scale(&[false, false, false], &[400, 400, 400]);
        engine.set_setting("silent_mode", "true", 0).unwrap();

        assert_eq!(
            engine.start_cook("chicken", 0),
            Err(ApplianceError::SilentModeActive)
        );
        assert_eq!(
            engine.start_cook("fish", 0),
            Err(ApplianceError::SilentModeActive)
        );

        let plan = engine.start_cook("pork", 0).unwrap();
        assert_eq!(plan.ventilation, 2);
        assert_eq!(engine.setting_value("ventilation").unwrap(), "2");
    }

    #[test]
    fn keep_warm_toggles_active_cook() {
        let mut engine = engine_with_scale(&[false, false], &[400, 300]);
        engine.start_cook("chicken", 0).unwrap();

        assert_eq!(
            engine.set_keep_warm("chicken", "true", 1_000),
            Ok(KeepWarmOutcome::Toggled(true))
        );
        assert!(engine.cook_status().keep_food_warm);
        assert_eq!(engine.cook_status().active_food, "chicken");
    }

    #[test]
    fn keep_warm_on_inactive_food_starts_the_cook() {
        let mut engine = engine_with_scale(&[false], &[200]);

        let outcome = engine.set_keep_warm("fish", "true", 0).unwrap();
        match outcome {
            KeepWarmOutcome::Started {
                plan,
                keep_food_warm,
            } => {
                assert_eq!(plan.food, Food::Fish);
                assert_eq!(plan.duration_secs, 18);
                assert!(keep_food_warm);
            }
            other => panic!("expected Started, got {other:?}"),
        }
        assert_eq!(engine.cook_status().active_food, "fish");
        assert!(engine.cook_status().keep_food_warm);
    }

    #[test]
    fn keep_warm_requires_a_strict_boolean() {
        let mut engine = engine_with_scale(&[false, false], &[400, 400]);
        engine.start_cook("chicken", 0).unwrap();

        assert!(matches!(
            engine.set_keep_warm("chicken", "maybe", 0),
            Err(ApplianceError::InvalidValue { .. })
        ));
        assert!(!engine.cook_status().keep_food_warm);
    }

    #[test]
    fn keep_warm_revalidates_the_scale() {
        let mut engine = engine_with_scale(&[false, true], &[400]);
        engine.start_cook("chicken", 0).unwrap();

        assert_eq!(
            engine.set_keep_warm("chicken", "true", 0),
            Err(ApplianceError::NoFoodDetected)
        );
        assert!(!engine.cook_status().keep_food_warm);
    }

    #[test]
    fn status_snapshot_reflects_engine_state() {
        let mut engine = engine_with_scale(&[false], &[400]);
        engine.start_cook("vegetables", 0).unwrap();
        engine.media_command("play").unwrap();

        let status = engine.status(0);
        assert_eq!(status.active_food, "vegetables");
        assert_eq!(status.ventilation, 1);
        assert_eq!(status.target_temperature, 100.0);
        assert!(status.media_playing);
        assert!(!status.silent_mode);
    }

    #[test]
    fn concurrent_mutation_never_violates_invariants() {
        let engine = Arc::new(Mutex::new(engine()));
        let mut handles = Vec::new();

        for worker in 0..4u8 {
            let engine = Arc::clone(&engine);
            handles.push(std::thread::spawn(move || {
                for round in 0..50u8 {
                    let mut engine = engine.lock().unwrap();
                    let silent = if (worker + round) % 2 == 0 {
                        "true"
                    } else {
                        "false"
                    };
                    let _ = engine.set_setting("silent_mode", silent, 0);
                    let level = ((worker as u32 * 50 + round as u32) % 7).to_string();
                    let _ = engine.set_setting("ventilation", &level, 0);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let engine = engine.lock().unwrap();
        let settings = engine.settings();
        assert!(settings.ventilation <= 6);
        if settings.silent_mode {
            assert!(settings.ventilation <= 2);
            assert!(!settings.ambient_light);
        }
    }
}
