//! Configuration for the lane-keeping environment.

use drive_rl::ImageShape;
use serde::{Deserialize, Serialize};

// ============================================================================
// Road
// ============================================================================

/// Shape of the sinusoidal road.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadConfig {
    /// Distance from the centre line to either edge (m).
    pub half_width: f32,
    /// Peak lateral offset of the centre line (m).
    pub amplitude: f32,
    /// Distance between two identical points of the centre line (m).
    pub wavelength: f32,
}

impl Default for RoadConfig {
    fn default() -> Self {
        Self {
            half_width: 2.5,
            amplitude: 6.0,
            wavelength: 120.0,
        }
    }
}

// ============================================================================
// Vehicle
// ============================================================================

/// Kinematic car limits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    pub max_speed: f32,
    /// Acceleration at full throttle (m/s²).
    pub acceleration: f32,
    /// Deceleration while braking (m/s²).
    pub braking: f32,
    /// Linear drag coefficient (1/s).
    pub drag: f32,
    /// Yaw rate at full steering (rad/s).
    pub max_yaw_rate: f32,
    /// Heading limit relative to the road axis (rad).
    pub max_heading: f32,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            max_speed: 12.0,
            acceleration: 3.0,
            braking: 6.0,
            drag: 0.1,
            max_yaw_rate: 1.2,
            max_heading: std::f32::consts::FRAC_PI_3,
        }
    }
}

// ============================================================================
// Reward
// ============================================================================

/// `exp(-decay · |deviation|) - 0.5 + speed_weight · speed / max_speed`
/// while on the road; `off_road_penalty` on the step that leaves it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    pub decay: f32,
    pub speed_weight: f32,
    pub off_road_penalty: f32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            decay: 1.0,
            speed_weight: 0.5,
            off_road_penalty: -1.0,
        }
    }
}

// ============================================================================
// Environment
// ============================================================================

/// Complete environment configuration.
///
/// # Example
/// ```ignore
/// let config = LaneKeepingConfig::new()
///     .with_max_steps(500)
///     .with_road(RoadConfig { amplitude: 3.0, ..Default::default() });
/// let env = LaneKeeping::new(config)?;
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaneKeepingConfig {
    /// Camera frame shape (channel-last).
    pub image: ImageShape,
    /// Ground covered by one pixel side (m).
    pub meters_per_pixel: f32,
    /// Simulation step (s).
    pub dt: f32,
    /// Steps after which an episode is cut off.
    pub max_steps: usize,
    /// Largest initial lateral offset from the centre line (m).
    pub start_offset: f32,
    pub road: RoadConfig,
    pub vehicle: VehicleConfig,
    pub reward: RewardConfig,
}

impl Default for LaneKeepingConfig {
    fn default() -> Self {
        Self {
            image: ImageShape::new(84, 84, 1),
            meters_per_pixel: 0.25,
            dt: 0.1,
            max_steps: 1_000,
            start_offset: 0.5,
            road: RoadConfig::default(),
            vehicle: VehicleConfig::default(),
            reward: RewardConfig::default(),
        }
    }
}

impl LaneKeepingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, image: ImageShape) -> Self {
        self.image = image;
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_dt(mut self, dt: f32) -> Self {
        self.dt = dt;
        self
    }

    pub fn with_start_offset(mut self, offset: f32) -> Self {
        self.start_offset = offset;
        self
    }

    pub fn with_road(mut self, road: RoadConfig) -> Self {
        self.road = road;
        self
    }

    pub fn with_vehicle(mut self, vehicle: VehicleConfig) -> Self {
        self.vehicle = vehicle;
        self
    }

    pub fn with_reward(mut self, reward: RewardConfig) -> Self {
        self.reward = reward;
        self
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.image.is_empty(), "image shape must be non-empty, got {}", self.image);
        anyhow::ensure!(self.max_steps > 0, "max_steps must be > 0");
        for (name, value) in [
            ("meters_per_pixel", self.meters_per_pixel),
            ("dt", self.dt),
            ("road.half_width", self.road.half_width),
            ("road.wavelength", self.road.wavelength),
            ("vehicle.max_speed", self.vehicle.max_speed),
        ] {
            anyhow::ensure!(value.is_finite() && value > 0.0, "{name} must be > 0, got {value}");
        }
        anyhow::ensure!(
            self.start_offset.abs() < self.road.half_width,
            "start_offset {} must stay inside the road (half width {})",
            self.start_offset,
            self.road.half_width
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = LaneKeepingConfig::default();
        assert_eq!(config.image, ImageShape::new(84, 84, 1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_start_off_road() {
        let config = LaneKeepingConfig::new().with_start_offset(10.0);
        assert!(config.validate().is_err());
        assert!(LaneKeepingConfig::new().with_max_steps(0).validate().is_err());
    }
}
