use serde::{Deserialize, Serialize};

/// Top level configuration, loaded via `confy` from the platform config
/// directory and overridable by CLI flags/environment variables for the
/// network-facing fields (see `cli.rs`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub server: ServerSettings,
    pub observing_location: ObservingLocation,
    pub azimuth_motor: MotorConfig,
    pub altitude_motor: MotorConfig,
    pub calibration_seed_spr: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            observing_location: ObservingLocation::default(),
            azimuth_motor: MotorConfig::azimuth_default(),
            altitude_motor: MotorConfig::altitude_default(),
            calibration_seed_spr: 1_300_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 10000,
        }
    }
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ObservingLocation {
    pub longitude: f64,
    pub latitude: f64,
    pub elevation: f64,
}

impl Default for ObservingLocation {
    fn default() -> Self {
        Self {
            longitude: 0.0,
            latitude: 51.47,
            elevation: 15.0,
        }
    }
}

/// GPIO pin assignment plus velocity-curve shape for one axis's `Motor`.
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct MotorConfig {
    pub pul_pin: u8,
    pub dir_pin: u8,
    pub enbl_pin: u8,
    pub min_angle: f64,
    pub max_angle: f64,
    pub positive: f64,
    pub vend: f64,
    pub vstart: f64,
    pub skewness: f64,
    pub accel_steps: u32,
    pub skewness_brake: f64,
    pub brake_steps: u32,
    pub default_steps_per_rev: u32,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self::azimuth_default()
    }
}

impl MotorConfig {
    fn shared_defaults() -> Self {
        Self {
            pul_pin: 0,
            dir_pin: 0,
            enbl_pin: 0,
            min_angle: -5.0,
            max_angle: 365.0,
            positive: 1.0,
            vend: 8000.0,
            vstart: 20.0,
            skewness: 0.75,
            accel_steps: 500,
            skewness_brake: 0.9,
            brake_steps: 500,
            default_steps_per_rev: 0,
        }
    }

    pub fn azimuth_default() -> Self {
        Self {
            pul_pin: 15,
            dir_pin: 14,
            enbl_pin: 8,
            positive: 1.0,
            default_steps_per_rev: 1_293_009,
            ..Self::shared_defaults()
        }
    }

    pub fn altitude_default() -> Self {
        Self {
            pul_pin: 23,
            dir_pin: 18,
            enbl_pin: 7,
            min_angle: 0.0,
            max_angle: 90.0,
            positive: -1.0,
            default_steps_per_rev: 1_560_660,
            ..Self::shared_defaults()
        }
    }
}
