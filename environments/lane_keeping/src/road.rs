//! Sinusoidal road geometry.

use std::f32::consts::TAU;

use crate::config::RoadConfig;

/// Road whose centre line is `amplitude · sin(2π (s + phase) / wavelength)`
/// at longitudinal position `s`.
#[derive(Clone, Debug, PartialEq)]
pub struct Road {
    config: RoadConfig,
    phase: f32,
}

impl Road {
    pub fn new(config: RoadConfig, phase: f32) -> Self {
        Self { config, phase }
    }

    pub fn config(&self) -> &RoadConfig {
        &self.config
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Lateral position of the centre line.
    #[inline]
    pub fn center(&self, s: f32) -> f32 {
        self.config.amplitude * (TAU * (s + self.phase) / self.config.wavelength).sin()
    }

    /// Signed lateral distance of `(s, x)` from the centre line.
    #[inline]
    pub fn deviation(&self, s: f32, x: f32) -> f32 {
        x - self.center(s)
    }

    #[inline]
    pub fn on_road(&self, s: f32, x: f32) -> bool {
        self.deviation(s, x).abs() <= self.config.half_width
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_straight_road() {
        let road = Road::new(
            RoadConfig {
                amplitude: 0.0,
                ..Default::default()
            },
            0.0,
        );
        assert_eq!(road.center(37.0), 0.0);
        assert!(road.on_road(10.0, 2.5));
        assert!(!road.on_road(10.0, 2.6));
    }

    #[test]
    fn test_centre_line_is_periodic() {
        let road = Road::new(RoadConfig::default(), 13.0);
        let wavelength = road.config().wavelength;
        assert!((road.center(5.0) - road.center(5.0 + wavelength)).abs() < 1e-3);
        // Quarter wavelength before the phase origin is the peak.
        assert!((road.center(wavelength / 4.0 - 13.0) - road.config().amplitude).abs() < 1e-4);
    }
}
