//! Top-down ego camera.
//!
//! The car sits at the bottom centre of the frame facing up. Each pixel is
//! projected onto the ground plane around the car and shaded by what lies
//! there: grass, road edge, asphalt, or the dashed centre marking.

use drive_rl::{ChannelOrder, Image, ImageShape};

use crate::road::Road;

pub const GRASS: u8 = 30;
pub const ASPHALT: u8 = 100;
pub const EDGE: u8 = 255;
pub const MARKING: u8 = 200;
pub const CAR: u8 = 160;

const EDGE_WIDTH: f32 = 0.2;
const MARKING_WIDTH: f32 = 0.12;
/// Dash period of the centre marking (m); the first half is painted.
const DASH_PERIOD: f32 = 3.0;

/// Pose of the car on the ground plane.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Pose {
    /// Distance along the road axis (m).
    pub s: f32,
    /// Lateral position, positive to the right (m).
    pub x: f32,
    /// Heading relative to the road axis, positive to the right (rad).
    pub heading: f32,
}

/// Row of the car's centre in a frame of the given shape.
pub fn car_row(shape: ImageShape) -> usize {
    shape.height * 5 / 6
}

/// Render one channel-last frame.
pub fn render(road: &Road, pose: Pose, shape: ImageShape, meters_per_pixel: f32) -> Image {
    let mut image = Image::zeros(shape, ChannelOrder::Last);
    let half_width = road.config().half_width;
    let (sin_h, cos_h) = pose.heading.sin_cos();
    let origin_row = car_row(shape) as f32;
    let origin_col = shape.width as f32 / 2.0;

    for row in 0..shape.height {
        let forward = (origin_row - row as f32 - 0.5) * meters_per_pixel;
        for col in 0..shape.width {
            let lateral = (col as f32 + 0.5 - origin_col) * meters_per_pixel;
            let s = pose.s + forward * cos_h - lateral * sin_h;
            let x = pose.x + forward * sin_h + lateral * cos_h;
            let deviation = road.deviation(s, x).abs();

            let value = if deviation > half_width {
                GRASS
            } else if deviation > half_width - EDGE_WIDTH {
                EDGE
            } else if deviation < MARKING_WIDTH && s.rem_euclid(DASH_PERIOD) < DASH_PERIOD / 2.0 {
                MARKING
            } else {
                ASPHALT
            };
            for channel in 0..shape.channels {
                image.set(row, col, channel, value);
            }
        }
    }

    draw_car(&mut image, shape);
    image
}

fn draw_car(image: &mut Image, shape: ImageShape) {
    let center_row = car_row(shape);
    let center_col = shape.width / 2;
    let rows = center_row.saturating_sub(3)..(center_row + 4).min(shape.height);
    let cols = center_col.saturating_sub(1)..(center_col + 2).min(shape.width);
    for row in rows {
        for col in cols.clone() {
            for channel in 0..shape.channels {
                image.set(row, col, channel, CAR);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoadConfig;

    fn straight_road() -> Road {
        Road::new(
            RoadConfig {
                amplitude: 0.0,
                ..Default::default()
            },
            0.0,
        )
    }

    #[test]
    fn test_frame_layout() {
        let shape = ImageShape::new(84, 84, 1);
        let frame = render(&straight_road(), Pose::default(), shape, 0.25);

        assert_eq!(frame.shape(), shape);
        assert_eq!(frame.order(), ChannelOrder::Last);
        assert_eq!(frame.get(car_row(shape), 42, 0), CAR);
        // 2.5 m half width at 0.25 m/px: grass beyond ten pixels from centre.
        assert_eq!(frame.get(10, 0, 0), GRASS);
        assert_eq!(frame.get(10, 83, 0), GRASS);
        assert_eq!(frame.get(10, 36, 0), ASPHALT);
    }

    #[test]
    fn test_off_centre_car_sees_shifted_road() {
        let shape = ImageShape::new(84, 84, 1);
        let pose = Pose {
            x: 2.0,
            ..Default::default()
        };
        let frame = render(&straight_road(), pose, shape, 0.25);
        // The right edge of the road is 0.5 m (two pixels) right of the car.
        assert_eq!(frame.get(10, 50, 0), GRASS);
        assert_eq!(frame.get(10, 30, 0), ASPHALT);
    }

    #[test]
    fn test_all_channels_match() {
        let shape = ImageShape::new(12, 12, 3);
        let frame = render(&straight_road(), Pose::default(), shape, 0.5);
        for row in 0..12 {
            for col in 0..12 {
                let v = frame.get(row, col, 0);
                assert_eq!(frame.get(row, col, 1), v);
                assert_eq!(frame.get(row, col, 2), v);
            }
        }
    }
}
