//! Orchestrates the two axis motors, the tracking loop, and the handful of
//! request-driven actions (goto/step/manual motor moves/calibration).
//! Ported end to end from the source daemon's `controller.py`; the
//! thread-per-movement, join-before-redispatch discipline of the original
//! is modeled with `tokio::task::JoinHandle` slots instead of raw threads.

use crate::calibration::AxisSamples;
use crate::config::Config;
use crate::ephemeris::{self, Observer, CATALOG};
use crate::error::EphemerisError;
use crate::hal::Hal;
use crate::motor::{Direction, Motor};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio::time::Duration;

const AZ: usize = 0;
const ALT: usize = 1;
const TRACKING_PERIOD: Duration = Duration::from_millis(100);
const CLIENT_CONNECTED_DECAY: Duration = Duration::from_secs(3);

fn sexagesimal(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();
    let degrees = abs.floor();
    let minutes_full = (abs - degrees) * 60.0;
    let minutes = minutes_full.floor();
    let seconds = (minutes_full - minutes) * 60.0;
    format!("{sign}{degrees}:{minutes:02}:{seconds:04.1}")
}

fn format_float(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

fn axis_name(axis: usize) -> &'static str {
    if axis == AZ {
        "azimuth"
    } else {
        "altitude"
    }
}

pub struct Controller {
    motors: [Arc<Motor>; 2],
    observer: Mutex<Observer>,
    target: Mutex<Option<(f64, f64)>>,
    pending_object: Mutex<Option<usize>>,
    angles_steps: Mutex<[AxisSamples; 2]>,
    calibration_seed_spr: u32,

    is_tracking: AtomicBool,
    tracking_task: AsyncMutex<Option<JoinHandle<()>>>,

    running: [AtomicBool; 2],
    restart_after_motor: [AtomicBool; 2],
    motor_task: [AsyncMutex<Option<JoinHandle<()>>>; 2],

    client_connected: AtomicBool,
    conn_timer: AsyncMutex<Option<JoinHandle<()>>>,
}

impl Controller {
    pub fn new(config: &Config, hal: Arc<dyn Hal>) -> Arc<Self> {
        let azimuth = Motor::new("Azimuth", &config.azimuth_motor, hal.clone());
        let altitude = Motor::new("Altitude", &config.altitude_motor, hal);

        Arc::new(Self {
            motors: [Arc::new(azimuth), Arc::new(altitude)],
            observer: Mutex::new(Observer {
                longitude_deg: config.observing_location.longitude,
                latitude_deg: config.observing_location.latitude,
                elevation_m: config.observing_location.elevation,
            }),
            target: Mutex::new(None),
            pending_object: Mutex::new(None),
            angles_steps: Mutex::new([AxisSamples::new(), AxisSamples::new()]),
            calibration_seed_spr: config.calibration_seed_spr,
            is_tracking: AtomicBool::new(false),
            tracking_task: AsyncMutex::new(None),
            running: [AtomicBool::new(false), AtomicBool::new(false)],
            restart_after_motor: [AtomicBool::new(false), AtomicBool::new(false)],
            motor_task: [AsyncMutex::new(None), AsyncMutex::new(None)],
            client_connected: AtomicBool::new(false),
            conn_timer: AsyncMutex::new(None),
        })
    }

    pub fn is_tracking(&self) -> bool {
        self.is_tracking.load(Ordering::Relaxed)
    }

    pub fn calibrated(&self) -> bool {
        self.motors[AZ].calibrated() && self.motors[ALT].calibrated()
    }

    fn observer_snapshot(&self) -> Observer {
        *self.observer.lock().unwrap()
    }

    async fn join_motor_task(&self, axis: usize) {
        let mut slot = self.motor_task[axis].lock().await;
        if let Some(handle) = slot.take() {
            let _ = handle.await;
        }
    }

    /// Stop the tracking task (if any) and wait for it to exit. Mirrors
    /// `Controller._stop_tracking`: set the flags first, then join.
    async fn stop_tracking(&self) {
        if self.is_tracking.swap(false, Ordering::Relaxed) {
            self.motors[AZ].request_stop();
            self.motors[ALT].request_stop();
            if let Some(handle) = self.tracking_task.lock().await.take() {
                let _ = handle.await;
            }
        }
    }

    /// Start the tracking task if it is not already running. No-op
    /// otherwise, matching the source's `if not self._is_tracking` guard.
    async fn start_tracking(self: &Arc<Self>) {
        if self.is_tracking.swap(true, Ordering::Relaxed) {
            return;
        }
        let controller = self.clone();
        let handle = tokio::spawn(async move { controller.run_tracking().await });
        *self.tracking_task.lock().await = Some(handle);
    }

    async fn run_tracking(self: Arc<Self>) {
        while self.is_tracking.load(Ordering::Relaxed) {
            let target = *self.target.lock().unwrap();
            let Some((ra_h, dec_deg)) = target else {
                self.is_tracking.store(false, Ordering::Relaxed);
                break;
            };
            let observer = self.observer_snapshot();
            let when = Utc::now();
            let (az, alt) = ephemeris::compute_azalt(ra_h, dec_deg, &observer, when);

            let az_motor = self.motors[AZ].clone();
            let alt_motor = self.motors[ALT].clone();
            let az_task = tokio::task::spawn_blocking(move || az_motor.move_to(az));
            let alt_task = tokio::task::spawn_blocking(move || alt_motor.move_to(alt));
            if az_task.await.is_err() || alt_task.await.is_err() {
                self.is_tracking.store(false, Ordering::Relaxed);
                break;
            }

            tokio::time::sleep(TRACKING_PERIOD).await;
        }
    }

    /// Recompute `target` from the motors' current angles. Used after any
    /// direct motion (manual steps, open-ended jogs) to declare the new
    /// mechanical pointing as the new target (§9, preserved verbatim).
    fn rederive_target(&self) {
        let observer = self.observer_snapshot();
        let when = Utc::now();
        let az = self.motors[AZ].angle();
        let alt = self.motors[ALT].angle();
        let (ra, dec) = ephemeris::radec_of(az, alt, &observer, when);
        *self.target.lock().unwrap() = Some((ra, dec));
    }

    pub async fn goto(self: &Arc<Self>, ra_h: f64, dec_deg: f64) {
        *self.target.lock().unwrap() = Some((ra_h, dec_deg));
        self.stop_tracking().await;
        self.start_tracking().await;
    }

    /// Current pointing converted back to (ra, dec) via the motors'
    /// live angles — independent of whatever `target` currently holds.
    pub fn current_pos(&self) -> (f64, f64) {
        let observer = self.observer_snapshot();
        let when = Utc::now();
        ephemeris::radec_of(self.motors[AZ].angle(), self.motors[ALT].angle(), &observer, when)
    }

    pub fn set_observer(&self, lon_rad: f64, lat_rad: f64, elev_m: f64) {
        *self.observer.lock().unwrap() = Observer {
            longitude_deg: lon_rad.to_degrees(),
            latitude_deg: lat_rad.to_degrees(),
            elevation_m: elev_m,
        };
    }

    pub async fn start_calibration(&self) {
        self.stop_tracking().await;
        let mut samples = self.angles_steps.lock().unwrap();
        samples[AZ].clear();
        samples[ALT].clear();
        drop(samples);
        for motor in &self.motors {
            motor.force_set_angle(0.0);
            motor.set_steps(0);
            motor.set_steps_per_rev(self.calibration_seed_spr);
        }
    }

    pub fn stop_calibration(&self) {
        let samples = self.angles_steps.lock().unwrap();
        for axis in [AZ, ALT] {
            if let Some(spr) = samples[axis].estimate_steps_per_rev() {
                self.motors[axis].set_steps_per_rev(spr);
            }
        }
    }

    pub fn set_object(&self, object_id: usize) -> Result<(), EphemerisError> {
        let object = CATALOG
            .get(object_id)
            .ok_or(EphemerisError::UnknownObject(object_id))?;
        let when = Utc::now();
        let (ra, dec) = object.radec(when);
        *self.pending_object.lock().unwrap() = Some(object_id);
        *self.target.lock().unwrap() = Some((ra, dec));
        Ok(())
    }

    pub fn apply_object(&self) {
        let pending = *self.pending_object.lock().unwrap();
        let Some(object_id) = pending else {
            return;
        };
        let Some(object) = CATALOG.get(object_id) else {
            return;
        };
        let observer = self.observer_snapshot();
        let when = Utc::now();
        let (ra, dec) = object.radec(when);
        let (az, alt) = ephemeris::compute_azalt(ra, dec, &observer, when);

        self.motors[AZ].force_set_angle(az);
        self.motors[ALT].force_set_angle(alt);

        let mut samples = self.angles_steps.lock().unwrap();
        for axis in [AZ, ALT] {
            samples[axis].push(self.motors[axis].angle(), self.motors[axis].steps());
        }
    }

    pub async fn make_step(self: &Arc<Self>, az_steps: i16, alt_steps: i16) {
        let restart = self.is_tracking();
        self.stop_tracking().await;

        let az_motor = self.motors[AZ].clone();
        let az_direction = Direction::from_positive(az_steps > 0);
        let az_count = az_steps.unsigned_abs() as u32;
        tokio::task::spawn_blocking(move || az_motor.step(az_count, az_direction))
            .await
            .ok();

        let alt_motor = self.motors[ALT].clone();
        let alt_direction = Direction::from_positive(alt_steps > 0);
        let alt_count = alt_steps.unsigned_abs() as u32;
        tokio::task::spawn_blocking(move || alt_motor.step(alt_count, alt_direction))
            .await
            .ok();

        if self.calibrated() {
            self.rederive_target();
            if restart {
                self.start_tracking().await;
            }
        }
    }

    pub async fn start_stop_motor(self: &Arc<Self>, axis: usize, start: bool, direction: Direction) {
        if axis > ALT {
            return;
        }

        self.motors[axis].request_stop();
        self.join_motor_task(axis).await;
        self.running[axis].store(false, Ordering::Relaxed);

        if start {
            self.restart_after_motor[axis].store(self.is_tracking(), Ordering::Relaxed);
            self.running[axis].store(true, Ordering::Relaxed);
            self.stop_tracking().await;

            let motor = self.motors[axis].clone();
            let handle = tokio::task::spawn_blocking(move || motor.step(u32::MAX, direction));
            *self.motor_task[axis].lock().await = Some(handle);
        } else if self.calibrated()
            && !self.running[AZ].load(Ordering::Relaxed)
            && !self.running[ALT].load(Ordering::Relaxed)
        {
            self.rederive_target();
            if self.restart_after_motor[AZ].load(Ordering::Relaxed)
                || self.restart_after_motor[ALT].load(Ordering::Relaxed)
            {
                self.start_tracking().await;
            }
        }
    }

    pub async fn toggle_tracking(self: &Arc<Self>) {
        if !self.calibrated() {
            tracing::error!("cannot start tracking when not calibrated");
            return;
        }
        if self.is_tracking() {
            self.stop_tracking().await;
        } else {
            self.start_tracking().await;
        }
    }

    pub async fn get_status(self: &Arc<Self>, code: i16) -> String {
        match code {
            1 => {
                let observer = self.observer_snapshot();
                format!(
                    "{} / {} / {}",
                    sexagesimal(observer.longitude_deg),
                    sexagesimal(observer.latitude_deg),
                    format_float(observer.elevation_m)
                )
            }
            2 => match *self.target.lock().unwrap() {
                Some((ra, dec)) => format!("{} / {}", sexagesimal(ra), sexagesimal(dec)),
                None => "no target selected".to_string(),
            },
            3 => format!(
                "{} / {}",
                sexagesimal(self.motors[AZ].angle()),
                sexagesimal(self.motors[ALT].angle())
            ),
            4 => format!("calibrated: {}", if self.calibrated() { "YES" } else { "NO" }),
            5 => {
                self.refresh_client_connected().await;
                format!("tracking: {}", if self.is_tracking() { "YES" } else { "NO" })
            }
            10 => format!(
                "steps per revolution (az/alt): {} / {}",
                self.motors[AZ].steps_per_rev(),
                self.motors[ALT].steps_per_rev()
            ),
            11 | 12 => {
                let axis = if code == 11 { AZ } else { ALT };
                let samples = self.angles_steps.lock().unwrap();
                format!(
                    "angles/steps list for {} motor: {:?}",
                    axis_name(axis),
                    samples[axis].samples()
                )
            }
            13 => {
                let samples = self.angles_steps.lock().unwrap();
                format!("{}", samples[AZ].len())
            }
            20 => format!(
                "current steps (az/alt): {} / {}",
                self.motors[AZ].steps(),
                self.motors[ALT].steps()
            ),
            30 => {
                let observer = self.observer_snapshot();
                let when = Utc::now();
                ephemeris::visible_objects(&observer, when)
                    .into_iter()
                    .map(|(id, name)| format!("{id}-{name}"))
                    .collect::<Vec<_>>()
                    .join(",")
            }
            other => format!("status code {other} not defined"),
        }
    }

    /// Refresh the 3-second "a client is actively polling" decay timer
    /// (§6 TRACKING status). Any prior timer is cancelled before a new one
    /// is spawned, matching the source's `Timer(3, ...).cancel()`/restart.
    async fn refresh_client_connected(self: &Arc<Self>) {
        self.client_connected.store(true, Ordering::Relaxed);
        let mut slot = self.conn_timer.lock().await;
        if let Some(handle) = slot.take() {
            handle.abort();
        }
        let controller = self.clone();
        *slot = Some(tokio::spawn(async move {
            tokio::time::sleep(CLIENT_CONNECTED_DECAY).await;
            controller.client_connected.store(false, Ordering::Relaxed);
        }));
    }

    pub fn client_connected(&self) -> bool {
        self.client_connected.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::StubHal;

    fn fast_config() -> Config {
        let mut config = Config::default();
        for motor in [&mut config.azimuth_motor, &mut config.altitude_motor] {
            motor.accel_steps = 4;
            motor.brake_steps = 4;
            motor.vstart = 4000.0;
            motor.vend = 8000.0;
            motor.default_steps_per_rev = 3600;
        }
        config
    }

    fn test_controller() -> Arc<Controller> {
        Controller::new(&fast_config(), Arc::new(StubHal::new()))
    }

    #[tokio::test]
    async fn uncalibrated_controller_refuses_to_track() {
        let mut config = fast_config();
        config.azimuth_motor.default_steps_per_rev = 0;
        let controller = Controller::new(&config, Arc::new(StubHal::new()));
        assert!(!controller.calibrated());

        controller.toggle_tracking().await;

        assert!(!controller.is_tracking());
    }

    #[tokio::test]
    async fn make_step_moves_both_axes_and_rederives_target() {
        let controller = test_controller();
        assert!(controller.calibrated());
        // Altitude's travel is now bounded to [0,90]; start away from the
        // lower bound so the reverse step below isn't immediately braked.
        controller.motors[ALT].force_set_angle(45.0);

        controller.make_step(10, -5).await;

        assert_eq!(controller.motors[AZ].steps(), 10);
        assert_eq!(controller.motors[ALT].steps(), -5);
        assert!(controller.target.lock().unwrap().is_some());
    }

    #[tokio::test]
    async fn calibration_round_trip_sets_steps_per_rev_from_sightings() {
        let controller = test_controller();
        controller.start_calibration().await;
        assert_eq!(controller.motors[AZ].steps_per_rev(), controller.calibration_seed_spr);

        controller.motors[AZ].set_steps(0);
        controller.motors[AZ].force_set_angle(0.0);
        {
            let mut samples = controller.angles_steps.lock().unwrap();
            samples[AZ].push(0.0, 0);
            samples[AZ].push(90.0, 900);
        }

        controller.stop_calibration();

        assert_eq!(controller.motors[AZ].steps_per_rev(), 3600);
    }

    #[tokio::test]
    async fn set_object_rejects_unknown_catalog_index() {
        let controller = test_controller();
        let result = controller.set_object(CATALOG.len() + 1);
        assert!(result.is_err());
        assert!(controller.target.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn status_reports_calibrated_yes_and_no() {
        let controller = test_controller();
        assert_eq!(controller.get_status(4).await, "calibrated: YES");

        let mut config = fast_config();
        config.azimuth_motor.default_steps_per_rev = 0;
        let uncalibrated = Controller::new(&config, Arc::new(StubHal::new()));
        assert_eq!(uncalibrated.get_status(4).await, "calibrated: NO");
    }

    #[tokio::test]
    async fn status_reports_no_target_selected_before_any_goto() {
        let controller = test_controller();
        assert_eq!(controller.get_status(2).await, "no target selected");
    }

    #[tokio::test]
    async fn unknown_status_code_reports_not_defined() {
        let controller = test_controller();
        assert_eq!(controller.get_status(77).await, "status code 77 not defined");
    }
}
