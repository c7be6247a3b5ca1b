use rand::Rng;

use crate::config::OvenConfig;

/// Randomness seam for the simulated sensors. Tests inject scripted
/// sequences; production draws from the thread RNG.
pub trait Entropy: Send {
    /// Returns true with the given probability.
    fn chance(&mut self, probability: f64) -> bool;

    /// Draws a value from the inclusive range.
    fn draw(&mut self, low: u32, high: u32) -> u32;
}

pub struct ThreadEntropy;

impl Entropy for ThreadEntropy {
    fn chance(&mut self, probability: f64) -> bool {
        rand::rng().random_bool(probability.clamp(0.0, 1.0))
    }

    fn draw(&mut self, low: u32, high: u32) -> u32 {
        rand::rng().random_range(low..=high.max(low))
    }
}

pub struct WeightSensor;

impl WeightSensor {
    /// Zero means the chamber is empty.
    pub fn read(entropy: &mut dyn Entropy, config: &OvenConfig) -> u32 {
        if entropy.chance(config.empty_scale_probability) {
            return 0;
        }
        entropy
            .draw(config.min_weight, config.max_weight)
            .clamp(config.min_weight, config.max_weight)
    }
}

pub struct SmokeSensor;

impl SmokeSensor {
    pub fn read(entropy: &mut dyn Entropy, config: &OvenConfig) -> bool {
        entropy.chance(config.smoke_probability)
    }
}

/// The real device mangles captured frames on disk; here the feed only
/// reports an opaque status line.
pub struct CameraFeed;

impl CameraFeed {
    pub fn status() -> &'static str {
        "feed idle, no frames buffered"
    }
}

#[cfg(test)]
pub(crate) struct ScriptedEntropy {
    chances: std::collections::VecDeque<bool>,
    draws: std::collections::VecDeque<u32>,
}

#[cfg(test)]
impl ScriptedEntropy {
    pub(crate) fn new(chances: &[bool], draws: &[u32]) -> Self {
        Self {
            chances: chances.iter().copied().collect(),
            draws: draws.iter().copied().collect(),
        }
    }
}

#[cfg(test)]
impl Entropy for ScriptedEntropy {
    fn chance(&mut self, _probability: f64) -> bool {
        self.chances.pop_front().unwrap_or(false)
    }

    fn draw(&mut self, low: u32, _high: u32) -> u32 {
        self.draws.pop_front().unwrap_or(low)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_chamber_reads_zero() {
        let config = OvenConfig::default();
        let mut entropy = ScriptedEntropy::new(&[true], &[]);

        assert_eq!(WeightSensor::read(&mut entropy, &config), 0);
    }

    #[test]
    fn loaded_scale_reading_is_clamped_to_bounds() {
        let config = OvenConfig::default();
        let mut entropy = ScriptedEntropy::new(&[false, false], &[900, 350]);

        assert_eq!(WeightSensor::read(&mut entropy, &config), 800);
        assert_eq!(WeightSensor::read(&mut entropy, &config), 350);
    }

    #[test]
    fn smoke_sensor_follows_entropy_verdict() {
        let config = OvenConfig::default();
        let mut entropy = ScriptedEntropy::new(&[false, true], &[]);

        assert!(!SmokeSensor::read(&mut entropy, &config));
        assert!(SmokeSensor::read(&mut entropy, &config));
    }
}
