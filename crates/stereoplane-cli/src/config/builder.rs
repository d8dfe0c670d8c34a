use super::defaults::DefaultsConfig;
use super::file::FileConfig;
use super::models::{AppConfig, CliOverrides};
use crate::cli::{MoleculeArgs, SpinArgs};
use crate::error::{CliError, Result};
use crate::utils::parser::{self, ParseError};
use nalgebra::Vector3;
use stereoplane::engine::config::AlignmentConfigBuilder;
use stereoplane::workflows::spin::SpinSettings;
use tracing::debug;

/// Merges CLI arguments, `--set` values, the config file and defaults, in that order of
/// precedence.
pub fn build_config(args: &MoleculeArgs, spin: Option<&SpinArgs>) -> Result<AppConfig> {
    let overrides = CliOverrides {
        depth_factor: args.depth_factor,
        no_viewer: args.no_viewer,
        speed: spin.and_then(|s| s.speed),
        duration: spin.and_then(|s| s.duration),
        fps: spin.and_then(|s| s.fps),
    };

    let file_config = match &args.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };
    let file_config = apply_set_values(file_config, &args.set_values)?;
    merge(file_config, &overrides)
}

pub fn merge(file_config: FileConfig, overrides: &CliOverrides) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();
    let plane = file_config.plane.unwrap_or_default();
    let rotation = file_config.rotation.unwrap_or_default();
    let viewer = file_config.viewer.unwrap_or_default();
    let spin = file_config.spin.unwrap_or_default();

    let alignment = AlignmentConfigBuilder::new()
        .depth_threshold_factor(
            overrides
                .depth_factor
                .or(plane.depth_threshold_factor)
                .unwrap_or(defaults.depth_threshold_factor),
        )
        .target_normal(Vector3::from(
            plane.target_normal.unwrap_or(defaults.target_normal),
        ))
        .up_axis(Vector3::from(plane.up_axis.unwrap_or(defaults.up_axis)))
        .auto_rotation(rotation.enabled.unwrap_or(defaults.auto_rotation))
        .rotation_speed(
            overrides
                .speed
                .or(rotation.speed)
                .unwrap_or(defaults.rotation_speed),
        )
        .pause_duration(rotation.pause_duration.unwrap_or(defaults.pause_duration))
        .bond_refresh_interval(
            rotation
                .bond_refresh_interval
                .unwrap_or(defaults.bond_refresh_interval),
        )
        .resume_after_inactivity(
            rotation
                .resume_after_inactivity
                .unwrap_or(defaults.resume_after_inactivity),
        )
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    let viewer_enabled = !overrides.no_viewer && viewer.enabled.unwrap_or(defaults.viewer_enabled);
    let viewer_forward = if viewer_enabled {
        let forward = Vector3::from(viewer.forward.unwrap_or(defaults.viewer_forward));
        if !forward.iter().all(|c| c.is_finite()) || forward.norm() == 0.0 {
            return Err(CliError::Config(
                "`viewer.forward` must be a finite, non-zero vector".to_string(),
            ));
        }
        Some(forward)
    } else {
        None
    };

    let duration = overrides
        .duration
        .or(spin.duration)
        .unwrap_or(defaults.spin_duration);
    let fps = overrides.fps.or(spin.fps).unwrap_or(defaults.spin_fps);
    if !(fps.is_finite() && fps > 0.0) {
        return Err(CliError::Config(format!(
            "`spin.fps` must be a positive number, got {}",
            fps
        )));
    }
    if !(duration.is_finite() && duration >= 0.0) {
        return Err(CliError::Config(format!(
            "`spin.duration` must not be negative, got {}",
            duration
        )));
    }

    debug!(?alignment, ?viewer_forward, duration, fps, "Configuration merged.");
    Ok(AppConfig {
        alignment,
        viewer_forward,
        spin: SpinSettings {
            duration,
            frame_dt: 1.0 / fps,
            viewer_forward,
        },
    })
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    let to_config_error = |e: ParseError| CliError::Config(e.to_string());

    for kv_pair in set_values {
        let (key, value) = parser::parse_key_value(kv_pair).map_err(to_config_error)?;
        let float = || parser::parse_f64(key, value).map_err(to_config_error);
        let vector = || parser::parse_vector3(value).map_err(to_config_error);
        let boolean = || parser::parse_bool(key, value).map_err(to_config_error);

        match key {
            "plane.depth-threshold-factor" => {
                config.plane.get_or_insert_with(Default::default).depth_threshold_factor =
                    Some(float()?);
            }
            "plane.target-normal" => {
                config.plane.get_or_insert_with(Default::default).target_normal = Some(vector()?);
            }
            "plane.up-axis" => {
                config.plane.get_or_insert_with(Default::default).up_axis = Some(vector()?);
            }
            "rotation.enabled" => {
                config.rotation.get_or_insert_with(Default::default).enabled = Some(boolean()?);
            }
            "rotation.speed" => {
                config.rotation.get_or_insert_with(Default::default).speed = Some(float()?);
            }
            "rotation.pause-duration" => {
                config.rotation.get_or_insert_with(Default::default).pause_duration =
                    Some(float()?);
            }
            "rotation.bond-refresh-interval" => {
                config
                    .rotation
                    .get_or_insert_with(Default::default)
                    .bond_refresh_interval = Some(float()?);
            }
            "rotation.resume-after-inactivity" => {
                config
                    .rotation
                    .get_or_insert_with(Default::default)
                    .resume_after_inactivity = Some(float()?);
            }
            "viewer.enabled" => {
                config.viewer.get_or_insert_with(Default::default).enabled = Some(boolean()?);
            }
            "viewer.forward" => {
                config.viewer.get_or_insert_with(Default::default).forward = Some(vector()?);
            }
            "spin.duration" => {
                config.spin.get_or_insert_with(Default::default).duration = Some(float()?);
            }
            "spin.fps" => {
                config.spin.get_or_insert_with(Default::default).fps = Some(float()?);
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}
