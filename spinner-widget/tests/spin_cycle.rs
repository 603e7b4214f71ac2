use spinner_widget::animation::Rotation;
use spinner_widget::config::SpinnerConfig;
use spinner_widget::layout::{Layout, CIRCLE_COUNT};
use spinner_widget::renderer::SpinnerRenderer;

fn frame_slots(rotation: &Rotation) -> Vec<usize> {
    (0..CIRCLE_COUNT).map(|k| rotation.circle_slot(k)).collect()
}

#[test]
fn one_full_cycle_of_frames() {
    let mut rotation = Rotation::new(8);
    rotation.start();

    for tick in 0..8 {
        assert_eq!(rotation.index(), tick);
        let expected: Vec<usize> = (0..CIRCLE_COUNT).map(|k| (tick + k) % 8).collect();
        assert_eq!(frame_slots(&rotation), expected);
        rotation.advance();
    }

    // eight ticks with eight positions is one full revolution
    assert_eq!(rotation.index(), 0);
}

#[test]
fn frame_slots_follow_the_spread_formula() {
    for n in [8usize, 16, 24, 64] {
        let mut rotation = Rotation::new(n);
        rotation.start();
        rotation.advance();

        let slots = frame_slots(&rotation);
        for (k, &slot) in slots.iter().enumerate() {
            assert_eq!(slot, (1 + k * n / CIRCLE_COUNT) % n);
        }

        let mut unique = slots.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), CIRCLE_COUNT, "slots collide for n = {n}");
    }
}

#[test]
fn non_multiple_of_eight_doubles_up_slots() {
    let rotation = Rotation::new(6);

    let mut slots = frame_slots(&rotation);
    slots.sort_unstable();
    slots.dedup();
    assert!(slots.len() < CIRCLE_COUNT);
}

#[test]
fn rendered_cycle_tracks_the_largest_circle() {
    let config = SpinnerConfig::default();
    let mut renderer = SpinnerRenderer::new(200, 200, &config).unwrap();
    let layout = Layout::compute(200, 8);
    let mut rotation = Rotation::new(8);
    rotation.start();

    for _ in 0..8 {
        let index = rotation.index();
        let center = layout.positions[index];
        let frame = renderer.render(&layout, &rotation);

        let x = center.x.round() as u32;
        let y = center.y.round() as u32;
        let offset = ((y * 200 + x) * 4) as usize;
        assert_eq!(
            &frame[offset..offset + 4],
            &[255, 255, 255, 255],
            "largest circle missing from slot {index}"
        );

        rotation.advance();
    }
}

#[test]
fn layout_and_rotation_survive_a_resize() {
    let mut rotation = Rotation::new(12);
    rotation.start();
    for _ in 0..5 {
        rotation.advance();
    }

    // a resize recomputes the layout but leaves the rotation alone
    let small = Layout::compute(60, 12);
    let large = Layout::compute(240, 12);

    assert_eq!(small.positions.len(), large.positions.len());
    assert_eq!(rotation.index(), 5);
    assert!(large.radii[0] > small.radii[0]);
}
