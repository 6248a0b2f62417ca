//! The lane-keeping environment.

use drive_rl::{Image, RawEnvironment, RawReset, RawStep};
use serde_json::{json, Value};

use crate::config::LaneKeepingConfig;
use crate::render::{render, Pose};
use crate::road::Road;

/// Size of the discrete action space.
pub const N_ACTIONS: usize = 6;

/// Discrete driving commands, indexed `0..N_ACTIONS`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriveAction {
    Brake,
    Straight,
    HardRight,
    HardLeft,
    SoftRight,
    SoftLeft,
}

/// Pedal and wheel positions of one command.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Controls {
    pub throttle: f32,
    pub brake: f32,
    /// Fraction of the maximum yaw rate, positive to the right.
    pub steering: f32,
}

impl DriveAction {
    pub const ALL: [DriveAction; N_ACTIONS] = [
        DriveAction::Brake,
        DriveAction::Straight,
        DriveAction::HardRight,
        DriveAction::HardLeft,
        DriveAction::SoftRight,
        DriveAction::SoftLeft,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn controls(self) -> Controls {
        let (throttle, brake, steering) = match self {
            DriveAction::Brake => (0.0, 1.0, 0.0),
            DriveAction::Straight => (1.0, 0.0, 0.0),
            DriveAction::HardRight => (1.0, 0.0, 0.5),
            DriveAction::HardLeft => (1.0, 0.0, -0.5),
            DriveAction::SoftRight => (1.0, 0.0, 0.25),
            DriveAction::SoftLeft => (1.0, 0.0, -0.25),
        };
        Controls {
            throttle,
            brake,
            steering,
        }
    }
}

/// Kinematic state of the car.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CarState {
    pub pose: Pose,
    pub speed: f32,
}

/// A car on a winding road seen from above.
///
/// Speaks the legacy convention: `reset` returns a bare frame and `step`
/// returns `(frame, reward, done, info)`. Leaving the road ends the episode;
/// reaching `max_steps` ends it with `"TimeLimit.truncated": true` in info.
pub struct LaneKeeping {
    config: LaneKeepingConfig,
    road: Road,
    car: CarState,
    steps: usize,
    rng: fastrand::Rng,
    needs_reset: bool,
}

impl LaneKeeping {
    pub fn new(config: LaneKeepingConfig) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self {
            road: Road::new(config.road.clone(), 0.0),
            config,
            car: CarState::default(),
            steps: 0,
            rng: fastrand::Rng::new(),
            needs_reset: true,
        })
    }

    pub fn config(&self) -> &LaneKeepingConfig {
        &self.config
    }

    pub fn road(&self) -> &Road {
        &self.road
    }

    pub fn car(&self) -> CarState {
        self.car
    }

    /// Steps taken in the current episode.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Current camera frame (channel-last).
    pub fn observe(&self) -> Image {
        render(&self.road, self.car.pose, self.config.image, self.config.meters_per_pixel)
    }

    fn integrate(&mut self, controls: Controls) {
        let vehicle = &self.config.vehicle;
        let dt = self.config.dt;
        let car = &mut self.car;

        let accel = controls.throttle * vehicle.acceleration
            - controls.brake * vehicle.braking
            - vehicle.drag * car.speed;
        car.speed = (car.speed + accel * dt).clamp(0.0, vehicle.max_speed);
        car.pose.heading = (car.pose.heading + controls.steering * vehicle.max_yaw_rate * dt)
            .clamp(-vehicle.max_heading, vehicle.max_heading);

        let (sin_h, cos_h) = car.pose.heading.sin_cos();
        car.pose.s += car.speed * cos_h * dt;
        car.pose.x += car.speed * sin_h * dt;
    }
}

impl RawEnvironment for LaneKeeping {
    type Observation = Image;
    type Action = usize;

    fn reset(&mut self, seed: Option<u64>, _options: Option<&Value>) -> anyhow::Result<RawReset<Image>> {
        if let Some(seed) = seed {
            self.rng = fastrand::Rng::with_seed(seed);
        }
        let phase = self.rng.f32() * self.config.road.wavelength;
        self.road = Road::new(self.config.road.clone(), phase);

        let offset = (self.rng.f32() * 2.0 - 1.0) * self.config.start_offset;
        self.car = CarState {
            pose: Pose {
                s: 0.0,
                x: self.road.center(0.0) + offset,
                heading: 0.0,
            },
            speed: 0.25 * self.config.vehicle.max_speed,
        };
        self.steps = 0;
        self.needs_reset = false;
        Ok(RawReset::Observation(self.observe()))
    }

    fn step(&mut self, action: &usize) -> anyhow::Result<RawStep<Image>> {
        anyhow::ensure!(!self.needs_reset, "step called on a finished episode; call reset first");
        let command = DriveAction::from_index(*action).ok_or_else(|| {
            anyhow::anyhow!("action {action} out of range for {N_ACTIONS} actions")
        })?;

        self.integrate(command.controls());
        self.steps += 1;

        let pose = self.car.pose;
        let deviation = self.road.deviation(pose.s, pose.x);
        let off_road = deviation.abs() > self.config.road.half_width;
        let truncated = !off_road && self.steps >= self.config.max_steps;

        let reward = if off_road {
            self.config.reward.off_road_penalty
        } else {
            let rc = &self.config.reward;
            (-rc.decay * deviation.abs()).exp() - 0.5
                + rc.speed_weight * self.car.speed / self.config.vehicle.max_speed
        };

        let mut info = json!({
            "speed": self.car.speed,
            "deviation": deviation,
            "distance": pose.s,
        });
        if truncated {
            info["TimeLimit.truncated"] = Value::Bool(true);
        }

        let done = off_road || truncated;
        self.needs_reset = done;
        Ok(RawStep::Legacy {
            observation: self.observe(),
            reward: reward as f64,
            done,
            info,
        })
    }
}
