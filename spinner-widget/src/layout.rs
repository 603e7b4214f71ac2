/// Number of circles making up the spinner ring.
pub const CIRCLE_COUNT: usize = 8;

// Circles below this radius rasterize as pointy stars instead of dots.
const MIN_CIRCLE_RADIUS: f32 = 1.5;
const RADIUS_STEP: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Circle-center positions and per-circle radii for one bounding square.
///
/// All circle centers lie on a single "big" circle centered in the square;
/// the ring leaves one unit of margin so the largest circle never clips the
/// widget bounds.
#[derive(Debug, Clone)]
pub struct Layout {
    pub positions: Vec<Point>,
    pub radii: [f32; CIRCLE_COUNT],
}

impl Layout {
    /// Computes the layout for a square of `side_length` with
    /// `position_count` rotation slots. Pure; recomputed on every resize.
    pub fn compute(side_length: u32, position_count: usize) -> Self {
        let side = side_length as f32;
        let center = Point { x: side / 2.0, y: side / 2.0 };
        let base_radius = side / 10.0;
        let big_radius = side / 2.0 - base_radius - 1.0;

        let positions = (0..position_count)
            .map(|i| {
                let angle = i as f32 * 360.0 / position_count as f32;
                ring_position(center, big_radius, angle)
            })
            .collect();

        let mut radii = [0.0; CIRCLE_COUNT];
        for (k, radius) in radii.iter_mut().enumerate() {
            *radius = circle_radius(base_radius, k);
        }

        Self { positions, radii }
    }
}

fn ring_position(center: Point, radius: f32, angle_degrees: f32) -> Point {
    let angle = angle_degrees.to_radians();
    Point {
        x: center.x + radius * angle.cos(),
        y: center.y + radius * angle.sin(),
    }
}

fn circle_radius(base_radius: f32, index: usize) -> f32 {
    (base_radius - index as f32 * RADIUS_STEP).max(MIN_CIRCLE_RADIUS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_side_hundred_eight_positions() {
        let layout = Layout::compute(100, 8);

        assert_eq!(layout.positions.len(), 8);
        // base radius 10, big radius 100/2 - 10 - 1 = 39
        assert!((layout.positions[0].x - 89.0).abs() < 1e-4);
        assert!((layout.positions[0].y - 50.0).abs() < 1e-4);
        assert_eq!(layout.radii[0], 10.0);
        assert_eq!(layout.radii[7], 6.5);
    }

    #[test]
    fn positions_equally_spaced_on_big_circle() {
        for &n in &[1usize, 3, 6, 8, 12, 60] {
            let layout = Layout::compute(100, n);
            let big_radius = 100.0 / 2.0 - 10.0 - 1.0;

            assert_eq!(layout.positions.len(), n);
            for (i, p) in layout.positions.iter().enumerate() {
                let dx = p.x - 50.0;
                let dy = p.y - 50.0;
                assert!(((dx * dx + dy * dy).sqrt() - big_radius).abs() < 1e-3);

                let angle = (i as f32 * 360.0 / n as f32).to_radians();
                assert!((dx - big_radius * angle.cos()).abs() < 1e-3);
                assert!((dy - big_radius * angle.sin()).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn radii_decrease_and_never_drop_below_floor() {
        let layout = Layout::compute(40, 8);

        for pair in layout.radii.windows(2) {
            assert!(pair[1] <= pair[0]);
        }
        for &radius in &layout.radii {
            assert!(radius >= 1.5);
        }
        // base radius 4.0: 4.0 - 0.5 * 7 = 0.5, clamped
        assert_eq!(layout.radii[7], 1.5);
    }

    #[test]
    fn tiny_widget_clamps_every_radius() {
        let layout = Layout::compute(10, 1);

        assert_eq!(layout.positions.len(), 1);
        // base radius 1.0 is already under the floor
        for &radius in &layout.radii {
            assert_eq!(radius, 1.5);
        }
    }
}
