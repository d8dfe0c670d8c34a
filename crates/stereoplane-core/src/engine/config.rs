use nalgebra::Vector3;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Continuous rotation settings of the alignment controller.
#[derive(Debug, Clone, PartialEq)]
pub struct RotationConfig {
    pub enabled: bool,
    /// Turn rate about the world up axis, in degrees per second.
    pub speed_deg_per_sec: f64,
    /// Dwell time at the 180° and 360° marks, in seconds.
    pub pause_duration: f64,
    /// Minimum time between two bond relabel passes, in seconds.
    pub bond_refresh_interval: f64,
    /// Idle time after manual interaction before auto rotation restarts, in seconds.
    pub resume_after_inactivity: f64,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            speed_deg_per_sec: 30.0,
            pause_duration: 1.0,
            bond_refresh_interval: 0.1,
            resume_after_inactivity: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentConfig {
    /// Depth threshold as a fraction of the molecule radius.
    pub depth_threshold_factor: f64,
    /// Direction the fitted normal is rotated onto on the general path.
    pub target_normal: Vector3<f64>,
    /// World up axis used for auto rotation.
    pub up_axis: Vector3<f64>,
    pub rotation: RotationConfig,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            depth_threshold_factor: 1.0,
            target_normal: Vector3::z(),
            up_axis: Vector3::y(),
            rotation: RotationConfig::default(),
        }
    }
}

#[derive(Default)]
pub struct AlignmentConfigBuilder {
    depth_threshold_factor: Option<f64>,
    target_normal: Option<Vector3<f64>>,
    up_axis: Option<Vector3<f64>>,
    auto_rotation: Option<bool>,
    speed_deg_per_sec: Option<f64>,
    pause_duration: Option<f64>,
    bond_refresh_interval: Option<f64>,
    resume_after_inactivity: Option<f64>,
}

impl AlignmentConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth_threshold_factor(mut self, factor: f64) -> Self {
        self.depth_threshold_factor = Some(factor);
        self
    }
    pub fn target_normal(mut self, normal: Vector3<f64>) -> Self {
        self.target_normal = Some(normal);
        self
    }
    pub fn up_axis(mut self, axis: Vector3<f64>) -> Self {
        self.up_axis = Some(axis);
        self
    }
    pub fn auto_rotation(mut self, enabled: bool) -> Self {
        self.auto_rotation = Some(enabled);
        self
    }
    pub fn rotation_speed(mut self, degrees_per_second: f64) -> Self {
        self.speed_deg_per_sec = Some(degrees_per_second);
        self
    }
    pub fn pause_duration(mut self, seconds: f64) -> Self {
        self.pause_duration = Some(seconds);
        self
    }
    pub fn bond_refresh_interval(mut self, seconds: f64) -> Self {
        self.bond_refresh_interval = Some(seconds);
        self
    }
    pub fn resume_after_inactivity(mut self, seconds: f64) -> Self {
        self.resume_after_inactivity = Some(seconds);
        self
    }

    /// Validates the collected values and fills the rest with defaults.
    pub fn build(self) -> Result<AlignmentConfig, ConfigError> {
        let defaults = AlignmentConfig::default();

        let depth_threshold_factor = self
            .depth_threshold_factor
            .unwrap_or(defaults.depth_threshold_factor);
        positive("depth_threshold_factor", depth_threshold_factor)?;

        let target_normal = unit("target_normal", self.target_normal.unwrap_or(defaults.target_normal))?;
        let up_axis = unit("up_axis", self.up_axis.unwrap_or(defaults.up_axis))?;

        let speed = self
            .speed_deg_per_sec
            .unwrap_or(defaults.rotation.speed_deg_per_sec);
        if !speed.is_finite() {
            return Err(invalid("rotation_speed", "must be finite"));
        }
        let pause_duration = self
            .pause_duration
            .unwrap_or(defaults.rotation.pause_duration);
        non_negative("pause_duration", pause_duration)?;
        let bond_refresh_interval = self
            .bond_refresh_interval
            .unwrap_or(defaults.rotation.bond_refresh_interval);
        positive("bond_refresh_interval", bond_refresh_interval)?;
        let resume_after_inactivity = self
            .resume_after_inactivity
            .unwrap_or(defaults.rotation.resume_after_inactivity);
        non_negative("resume_after_inactivity", resume_after_inactivity)?;

        Ok(AlignmentConfig {
            depth_threshold_factor,
            target_normal,
            up_axis,
            rotation: RotationConfig {
                enabled: self.auto_rotation.unwrap_or(defaults.rotation.enabled),
                speed_deg_per_sec: speed,
                pause_duration,
                bond_refresh_interval,
                resume_after_inactivity,
            },
        })
    }
}

fn invalid(name: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidParameter {
        name,
        reason: reason.to_string(),
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(name, &format!("must be a positive number, got {}", value)))
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(name, &format!("must not be negative, got {}", value)))
    }
}

fn unit(name: &'static str, v: Vector3<f64>) -> Result<Vector3<f64>, ConfigError> {
    if !v.iter().all(|c| c.is_finite()) {
        return Err(invalid(name, "must be finite"));
    }
    v.try_normalize(1e-12)
        .ok_or_else(|| invalid(name, "must be a non-zero vector"))
}
