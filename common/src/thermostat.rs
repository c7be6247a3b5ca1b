#[derive(Debug, Clone)]
pub struct Thermostat {
    target: f32,
    last_value: f32,
    last_command_ms: u64,
}

impl Thermostat {
    pub fn new(initial: f32) -> Self {
        Self {
            target: initial,
            last_value: initial,
            last_command_ms: 0,
        }
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    /// Captures the interpolated value at `now_ms` as the new anchor and
    /// starts approaching `target` from there.
    pub fn reanchor(&mut self, target: f32, now_ms: u64) {
        self.last_value = self.current(now_ms);
        self.last_command_ms = now_ms;
        self.target = target;
    }

    /// Unit-rate (1 degree per second) linear approach toward the target,
    /// clamped once reached. Pure in `now_ms`; no background task involved.
    pub fn current(&self, now_ms: u64) -> f32 {
        let elapsed_s = now_ms.saturating_sub(self.last_command_ms) as f32 / 1000.0;
        let gap = (self.target - self.last_value).abs();

        if elapsed_s >= gap {
            self.target
        } else if self.target > self.last_value {
            self.last_value + elapsed_s
        } else {
            self.last_value - elapsed_s
        }
    }
}
