use anyhow::{Context, Result};
use tiny_skia::*;

use crate::animation::Rotation;
use crate::config::SpinnerConfig;
use crate::layout::{Layout, CIRCLE_COUNT};

/// Composes spinner frames into an off-screen pixmap.
///
/// The visible surface is never drawn to directly; a full frame is rasterized
/// here and then copied out in one pass, which is what keeps the animation
/// flicker-free.
pub struct SpinnerRenderer {
    pixmap: Pixmap,
    circle_color: Color,
    background_color: Color,
}

impl SpinnerRenderer {
    pub fn new(width: u32, height: u32, config: &SpinnerConfig) -> Result<Self> {
        let pixmap = Pixmap::new(width, height)
            .with_context(|| format!("cannot allocate a {width}x{height} frame"))?;

        Ok(Self {
            pixmap,
            circle_color: config.circle_color,
            background_color: config.background_color,
        })
    }

    /// Paints the background and the eight ring circles at their current
    /// slots, returning the finished frame as premultiplied RGBA bytes.
    pub fn render(&mut self, layout: &Layout, rotation: &Rotation) -> &[u8] {
        self.pixmap.fill(self.background_color);

        let mut paint = Paint::default();
        paint.set_color(self.circle_color);
        paint.anti_alias = true;

        for k in 0..CIRCLE_COUNT {
            let slot = rotation.circle_slot(k);
            let position = layout.positions[slot];
            let radius = layout.radii[k];

            if let Some(circle) = PathBuilder::from_circle(position.x, position.y, radius) {
                self.pixmap.fill_path(
                    &circle,
                    &paint,
                    FillRule::Winding,
                    Transform::identity(),
                    None,
                );
            }
        }

        self.pixmap.data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(data: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
        let offset = ((y * width + x) * 4) as usize;
        [data[offset], data[offset + 1], data[offset + 2], data[offset + 3]]
    }

    const WHITE: [u8; 4] = [255, 255, 255, 255];
    const BLACK: [u8; 4] = [0, 0, 0, 255];

    #[test]
    fn frame_covers_full_bounds() {
        let mut renderer = SpinnerRenderer::new(100, 100, &SpinnerConfig::default()).unwrap();
        let layout = Layout::compute(100, 8);
        let rotation = Rotation::new(8);

        let frame = renderer.render(&layout, &rotation);
        assert_eq!(frame.len(), 100 * 100 * 4);
    }

    #[test]
    fn rejects_zero_sized_frame() {
        assert!(SpinnerRenderer::new(0, 100, &SpinnerConfig::default()).is_err());
    }

    #[test]
    fn background_and_largest_circle_pixels() {
        let mut renderer = SpinnerRenderer::new(100, 100, &SpinnerConfig::default()).unwrap();
        let layout = Layout::compute(100, 8);
        let mut rotation = Rotation::new(8);
        rotation.start();

        let frame = renderer.render(&layout, &rotation);
        // largest circle sits at slot 0 = (89, 50) with radius 10
        assert_eq!(pixel(frame, 100, 89, 50), WHITE);
        // corners are far outside the ring
        assert_eq!(pixel(frame, 100, 0, 0), BLACK);
        assert_eq!(pixel(frame, 100, 99, 99), BLACK);
    }

    #[test]
    fn rotation_moves_the_occupied_slots() {
        // sixteen slots, eight circles: every other slot is empty, so one
        // tick visibly shifts the whole ring by a slot
        let mut renderer = SpinnerRenderer::new(200, 200, &SpinnerConfig::default()).unwrap();
        let layout = Layout::compute(200, 16);
        let mut rotation = Rotation::new(16);
        rotation.start();

        let slot_pixel = |layout: &Layout, slot: usize| {
            let p = layout.positions[slot];
            (p.x.round() as u32, p.y.round() as u32)
        };

        let (x0, y0) = slot_pixel(&layout, 0);
        let (x1, y1) = slot_pixel(&layout, 1);

        let frame = renderer.render(&layout, &rotation);
        assert_eq!(pixel(frame, 200, x0, y0), WHITE);
        assert_eq!(pixel(frame, 200, x1, y1), BLACK);

        rotation.advance();
        let frame = renderer.render(&layout, &rotation);
        assert_eq!(pixel(frame, 200, x0, y0), BLACK);
        assert_eq!(pixel(frame, 200, x1, y1), WHITE);
    }
}
