//! Tuning constants for a sandbox session
//!
//! Every constant has a default; a JSON document may override any subset.

use serde::Deserialize;

use super::error::ConfigError;

/// Session configuration shared by the browser app and the CLI.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Grid unit for snapping dropped/dragged energy components and atoms
    pub grid_unit: f32,
    /// Extra pixels added to an entity's radius for pointer hit tests
    pub hit_margin: f32,
    /// Node pairs closer than this get a cosmetic mesh edge
    pub mesh_link_distance: f32,
    /// Component pairs closer than this get a dashed grid connection
    pub energy_link_distance: f32,
    /// Progress per frame for PING packets
    pub ping_speed: f32,
    /// Progress per frame for MESSAGE packets
    pub message_speed: f32,
    /// Radius gained per frame by a node growing toward its target
    pub radius_growth: f32,
    pub local_radius: f32,
    pub simulated_radius: f32,
    pub remote_radius: f32,
    /// Bond count at which the nano molecule latches stable
    pub stability_threshold: usize,
    /// Upward drift per frame while gravity failure is active
    pub gravity_step: f32,
    /// Speed multiplier applied while overclock is active
    pub overclock_multiplier: f32,
    /// Seconds until gravity failure auto-expires
    pub gravity_duration: f64,
    /// Seconds until overclock auto-expires
    pub overclock_duration: f64,
    /// Seconds between presence announcements
    pub presence_interval: f64,
    /// Frames between state snapshots
    pub publish_every_frames: u64,
    /// Canvas size used before the host reports one
    pub default_width: f32,
    pub default_height: f32,
    /// Flow indicator cycles per frame (energy)
    pub flow_speed: f32,
    /// Electron marker cycles per frame (nano)
    pub electron_speed: f32,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            grid_unit: 20.0,
            hit_margin: 10.0,
            mesh_link_distance: 300.0,
            energy_link_distance: 260.0,
            ping_speed: 0.05,
            message_speed: 0.03,
            radius_growth: 0.5,
            local_radius: 20.0,
            simulated_radius: 15.0,
            remote_radius: 18.0,
            stability_threshold: 3,
            gravity_step: 1.5,
            overclock_multiplier: 5.0,
            gravity_duration: 12.0,
            overclock_duration: 8.0,
            presence_interval: 3.0,
            publish_every_frames: 60,
            default_width: 800.0,
            default_height: 600.0,
            flow_speed: 0.01,
            electron_speed: 0.02,
        }
    }
}

impl SandboxConfig {
    /// Parse a (possibly partial) JSON config and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SandboxConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(field: &'static str, v: f32) -> Result<(), ConfigError> {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("must be positive, got {v}"),
                })
            }
        }

        positive("grid_unit", self.grid_unit)?;
        positive("ping_speed", self.ping_speed)?;
        positive("message_speed", self.message_speed)?;
        positive("radius_growth", self.radius_growth)?;
        positive("overclock_multiplier", self.overclock_multiplier)?;
        positive("default_width", self.default_width)?;
        positive("default_height", self.default_height)?;

        if self.hit_margin < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "hit_margin",
                reason: "must not be negative".into(),
            });
        }
        if self.stability_threshold == 0 {
            return Err(ConfigError::InvalidValue {
                field: "stability_threshold",
                reason: "must be at least 1".into(),
            });
        }
        if self.publish_every_frames == 0 {
            return Err(ConfigError::InvalidValue {
                field: "publish_every_frames",
                reason: "must be at least 1".into(),
            });
        }
        if self.presence_interval <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "presence_interval",
                reason: "must be positive".into(),
            });
        }
        Ok(())
    }

    /// Snap a coordinate to the nearest multiple of the grid unit.
    #[inline]
    pub fn snap(&self, v: f32) -> f32 {
        (v / self.grid_unit).round() * self.grid_unit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = SandboxConfig::from_json(r#"{"grid_unit": 25.0}"#).unwrap();
        assert_eq!(config.grid_unit, 25.0);
        assert_eq!(config.stability_threshold, 3);
        assert_eq!(config.mesh_link_distance, 300.0);
    }

    #[test]
    fn rejects_non_positive_grid() {
        let err = SandboxConfig::from_json(r#"{"grid_unit": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "grid_unit", .. }));
    }

    #[test]
    fn rejects_zero_cadence() {
        let err = SandboxConfig::from_json(r#"{"publish_every_frames": 0}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { field: "publish_every_frames", .. }
        ));
    }

    #[test]
    fn rejects_bad_json() {
        assert!(matches!(
            SandboxConfig::from_json("{not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn snap_rounds_to_nearest_unit() {
        let config = SandboxConfig::default();
        assert_eq!(config.snap(109.0), 100.0);
        assert_eq!(config.snap(111.0), 120.0);
        assert_eq!(config.snap(-9.0), 0.0);
    }
}
