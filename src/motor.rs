//! Stepper motor pulse-train generator: acceleration/brake velocity curves,
//! bounded angular range, step/angle accounting. Ported from the source
//! daemon's `Motor` class, with the pin-level calls routed through `Hal`.

use crate::astro_math::modulo;
use crate::config::MotorConfig;
use crate::hal::Hal;
use std::f64::consts::PI;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Direction {
    Forward,
    Reverse,
}

impl Direction {
    fn sign(self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Reverse => -1.0,
        }
    }

    pub fn reverse(self) -> Self {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        }
    }

    pub fn from_positive(positive: bool) -> Self {
        if positive {
            Direction::Forward
        } else {
            Direction::Reverse
        }
    }
}

fn build_curve(n: u32, skewness: f64, vend: f64, vstart: f64) -> Vec<f64> {
    (0..n)
        .map(|x| {
            let s = (x as f64 / n as f64).powf(skewness);
            let v = (0.5 - 0.5 * (s * PI).cos()) * (vend - vstart) + vstart;
            1.0 / v
        })
        .collect()
}

pub struct Motor {
    pub name: String,
    hal: Arc<dyn Hal>,
    pul_pin: u8,
    dir_pin: u8,
    enbl_pin: u8,
    min_angle: f64,
    max_angle: f64,
    positive: f64,
    delay: f64,
    brake_margin_steps: u32,
    accel_curve: Vec<f64>,
    brake_curve: Vec<f64>,

    steps_per_rev: AtomicU32,
    angle_bits: AtomicU64,
    steps: AtomicI64,
    stop: AtomicBool,
    enabled: AtomicBool,
}

impl Motor {
    pub fn new(name: impl Into<String>, config: &MotorConfig, hal: Arc<dyn Hal>) -> Self {
        use crate::hal::{Mode, Pull};

        hal.setup(config.pul_pin, Mode::Out, Pull::None);
        hal.setup(config.dir_pin, Mode::Out, Pull::None);
        hal.setup(config.enbl_pin, Mode::Out, Pull::None);

        let accel_curve = build_curve(config.accel_steps, config.skewness, config.vend, config.vstart);
        let brake_curve = build_curve(
            config.brake_steps,
            config.skewness_brake,
            config.vend,
            config.vstart,
        );

        let motor = Self {
            name: name.into(),
            hal,
            pul_pin: config.pul_pin,
            dir_pin: config.dir_pin,
            enbl_pin: config.enbl_pin,
            min_angle: config.min_angle,
            max_angle: config.max_angle,
            positive: config.positive,
            delay: 1.0 / config.vend,
            brake_margin_steps: config.brake_steps,
            accel_curve,
            brake_curve,
            steps_per_rev: AtomicU32::new(0),
            angle_bits: AtomicU64::new(0f64.to_bits()),
            steps: AtomicI64::new(0),
            stop: AtomicBool::new(true),
            enabled: AtomicBool::new(true),
        };
        motor.set_steps_per_rev(config.default_steps_per_rev);
        motor
    }

    pub fn steps_per_rev(&self) -> u32 {
        self.steps_per_rev.load(Ordering::Relaxed)
    }

    pub fn set_steps_per_rev(&self, value: u32) {
        self.steps_per_rev.store(value, Ordering::Relaxed);
    }

    pub fn calibrated(&self) -> bool {
        self.steps_per_rev() > 0
    }

    pub fn angle(&self) -> f64 {
        f64::from_bits(self.angle_bits.load(Ordering::Relaxed))
    }

    pub fn set_angle(&self, value: f64) {
        let wrapped = modulo(value, 360.0);
        if self.min_angle <= wrapped && wrapped <= self.max_angle {
            self.angle_bits.store(wrapped.to_bits(), Ordering::Relaxed);
        }
    }

    /// Set `angle` unconditionally, bypassing the `[min_angle, max_angle]`
    /// bounds check. Used by calibration/sighting actions that declare the
    /// mechanical pointing directly, rather than by stepping into it (the
    /// data model's "barring forced overrides" carve-out).
    pub fn force_set_angle(&self, value: f64) {
        let wrapped = modulo(value, 360.0);
        self.angle_bits.store(wrapped.to_bits(), Ordering::Relaxed);
    }

    pub fn steps(&self) -> i64 {
        self.steps.load(Ordering::Relaxed)
    }

    pub fn set_steps(&self, value: i64) {
        self.steps.store(value, Ordering::Relaxed);
    }

    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
        self.hal.output(self.enbl_pin, enabled);
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    fn minimum(&self) -> f64 {
        let spr = self.steps_per_rev();
        if spr == 0 {
            self.min_angle
        } else {
            self.min_angle + 360.0 / spr as f64 * self.brake_margin_steps as f64
        }
    }

    fn maximum(&self) -> f64 {
        let spr = self.steps_per_rev();
        if spr == 0 {
            self.max_angle
        } else {
            self.max_angle - 360.0 / spr as f64 * self.brake_margin_steps as f64
        }
    }

    fn accel_delay(&self, i: u32, n: u32) -> f64 {
        let idx = i.min(n.saturating_sub(1).saturating_sub(i)) as usize;
        self.accel_curve.get(idx).copied().unwrap_or(self.delay)
    }

    fn closest_brake_index(&self, current_delay: f64) -> usize {
        self.brake_curve
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                (*a - current_delay)
                    .abs()
                    .partial_cmp(&(*b - current_delay).abs())
                    .unwrap()
            })
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    /// Emit one PUL high/low pulse and update (steps, angle) accounting.
    fn emit_pulse(&self, delay: f64, direction: Direction) {
        self.hal.output(self.pul_pin, true);
        spin_sleep::sleep(Duration::from_secs_f64(delay.max(0.0)));
        self.hal.output(self.pul_pin, false);
        spin_sleep::sleep(Duration::from_secs_f64(delay.max(0.0)));

        let step_sign = direction.sign() * self.positive;
        self.steps.fetch_add(step_sign as i64, Ordering::Relaxed);

        let spr = self.steps_per_rev();
        if spr > 0 {
            let delta = step_sign * 360.0 / spr as f64;
            self.set_angle(modulo(self.angle() + delta, 360.0));
        }
    }

    /// Emit `n` pulses with a cosine accel/decel ramp. Never panics or
    /// returns an error: hitting an angular bound triggers `brake` and
    /// returns early, which is the only orderly way this method exits short
    /// of emitting all `n` pulses.
    pub fn step(&self, n: u32, direction: Direction) {
        if n == 0 {
            return;
        }
        self.stop.store(false, Ordering::Relaxed);
        self.hal
            .output(self.dir_pin, direction == Direction::Forward);

        for i in 0..n {
            let step_delay = self.accel_delay(i, n);
            let angle = self.angle();
            let hit_min = direction == Direction::Reverse && angle <= self.minimum();
            let hit_max = direction == Direction::Forward && angle >= self.maximum();

            if self.stop.load(Ordering::Relaxed) || hit_min || hit_max {
                self.brake(step_delay, direction);
                return;
            }

            self.emit_pulse(step_delay, direction);
        }
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Decelerate smoothly from `current_delay`, then emit the same number
    /// of pulses in the opposite direction to null the residual motion.
    /// This doubles the effective halt distance — preserved from the source
    /// daemon rather than "fixed"; see the design notes for why.
    fn brake(&self, current_delay: f64, direction: Direction) {
        self.stop.store(false, Ordering::Relaxed);
        let k = self.closest_brake_index(current_delay);

        for step in 0..k {
            let idx = k - step;
            let step_delay = self.brake_curve[idx];
            self.emit_pulse(step_delay, direction);
        }

        self.step(k as u32, direction.reverse());
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Move to `target_angle_deg` along the shortest arc. No-op unless
    /// calibrated and enabled.
    pub fn move_to(&self, target_angle_deg: f64) {
        if !self.calibrated() || !self.enabled() {
            return;
        }

        let target = modulo(target_angle_deg, 360.0);
        let mut delta = modulo(target - self.angle(), 360.0);
        if delta > 180.0 {
            delta -= 360.0;
        }

        let spr = self.steps_per_rev() as f64;
        let steps = (spr * delta.abs() / 360.0).round() as u32;
        let direction = Direction::from_positive(self.positive * delta > 0.0);
        self.step(steps, direction);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MotorConfig;
    use crate::hal::StubHal;

    fn test_motor(spr: u32) -> Motor {
        let mut config = MotorConfig::azimuth_default();
        config.accel_steps = 8;
        config.brake_steps = 8;
        config.default_steps_per_rev = spr;
        Motor::new("Test", &config, Arc::new(StubHal::new()))
    }

    #[test]
    fn step_updates_steps_and_angle_without_hitting_bounds() {
        let motor = test_motor(4000);
        motor.set_angle(10.0);
        motor.set_steps(0);

        motor.step(20, Direction::Forward);

        assert_eq!(motor.steps(), 20);
        let expected_angle = crate::astro_math::modulo(10.0 + 20.0 * 360.0 / 4000.0, 360.0);
        assert_float_eq::assert_float_absolute_eq!(motor.angle(), expected_angle, 1e-9);
    }

    #[test]
    fn reverse_step_decrements_steps() {
        let motor = test_motor(4000);
        motor.set_angle(10.0);
        motor.set_steps(0);

        motor.step(5, Direction::Reverse);

        assert_eq!(motor.steps(), -5);
    }

    #[test]
    fn move_picks_shortest_arc() {
        // S3: steps_per_rev=4000, angle=10, move(350) -> delta=-20, steps=222, reverse
        let motor = test_motor(4000);
        motor.set_angle(10.0);
        motor.set_steps(0);

        motor.move_to(350.0);

        assert_eq!(motor.steps(), -222);
    }

    #[test]
    fn bounds_brake_halts_before_all_pulses_and_stays_near_max() {
        // S6: approaching max_angle=90 forward from 89.5 degrees halts
        // within the brake margin instead of running all 10000 pulses.
        let mut config = MotorConfig::altitude_default();
        config.min_angle = 0.0;
        config.max_angle = 90.0;
        config.accel_steps = 50;
        config.brake_steps = 50;
        config.default_steps_per_rev = 100_000;
        config.positive = 1.0;
        let motor = Motor::new("Altitude", &config, Arc::new(StubHal::new()));
        motor.set_angle(89.5);
        motor.set_steps(0);

        motor.step(10_000, Direction::Forward);

        assert!(motor.steps() < 10_000);
        assert!(motor.angle() <= 90.0 + 1e-6);
    }

    #[test]
    fn zero_length_step_is_a_no_op() {
        let motor = test_motor(4000);
        motor.set_angle(10.0);
        motor.set_steps(0);

        motor.step(0, Direction::Forward);

        assert_eq!(motor.steps(), 0);
        assert_eq!(motor.angle(), 10.0);
    }
}
