use flipcut::{
    AnimationSequence, BACKGROUND, BORDER, BrushSettings, EditorSession, Modifiers, Point, Stage,
    Surface, render,
};

fn stage() -> Stage {
    Stage::new(100, 100).unwrap()
}

#[test]
fn layers_stack_in_order() {
    let mut seq = AnimationSequence::new();
    seq.add_frame(stage());
    seq.add_frame(stage());

    // Opaque green cutout covering the whole stage at both poses.
    let cutout = Surface::filled(100, 100, [0, 200, 0, 255]);

    // Opaque doodle pixel over the cutout.
    let mut doodle = Surface::stage_sized(stage());
    doodle.put_pixel(50, 50, [255, 0, 255, 255]);
    seq.active_frame_mut().unwrap().doodle = Some(doodle);

    let out = render(stage(), &seq, Some(&cutout), true);

    // Doodle occludes the cutout.
    assert_eq!(out.pixel(50, 50), [255, 0, 255, 255]);
    // Cutout occludes the onion ghost and the background.
    assert_eq!(&out.pixel(20, 20)[..3], &[0, 200, 0]);
    // Border is the topmost layer.
    assert_eq!(out.pixel(0, 50), BORDER);
    assert_eq!(out.pixel(99, 99), BORDER);
}

#[test]
fn onion_ghost_sits_under_the_active_cutout() {
    let mut seq = AnimationSequence::new();
    seq.add_frame(stage());
    // Previous frame parked left, active frame parked right.
    seq.active_frame_mut().unwrap().transform.translation = Point::new(25.0, 50.0);
    seq.add_frame(stage());
    seq.active_frame_mut().unwrap().transform.translation = Point::new(75.0, 50.0);

    let cutout = Surface::filled(20, 20, [200, 0, 0, 255]);
    let out = render(stage(), &seq, Some(&cutout), true);

    // Active cutout is full strength.
    assert_eq!(&out.pixel(75, 50)[..3], &[200, 0, 0]);
    // Ghost is visibly weaker than full strength but present.
    let ghost = out.pixel(25, 50);
    assert_ne!(ghost, BACKGROUND);
    assert!(ghost[0] < 150, "ghost red should be attenuated, got {ghost:?}");
}

#[test]
fn erase_gesture_carves_through_a_drawn_stroke() {
    let mut session = EditorSession::new(stage());
    session.sequence.add_frame(stage());
    session
        .set_brush(BrushSettings {
            opacity: 1.0,
            size: 12.0,
            ..Default::default()
        })
        .unwrap();

    // Draw a horizontal stroke with the alt modifier.
    let alt = Modifiers {
        alt: true,
        ..Default::default()
    };
    session.pointer_down(Point::new(20.0, 50.0), alt);
    session.pointer_move(Point::new(80.0, 50.0));
    session.pointer_up();

    let painted = render(stage(), &session.sequence, None, false).pixel(50, 50);
    assert_eq!(&painted[..3], &[0xff, 0x99, 0x00]);

    // Erase a vertical band through it (eraser toggle, no modifiers).
    session
        .set_brush(BrushSettings {
            opacity: 1.0,
            size: 12.0,
            tool: flipcut::BrushTool::Erase,
            ..Default::default()
        })
        .unwrap();
    session.pointer_down(Point::new(50.0, 20.0), Modifiers::default());
    session.pointer_move(Point::new(50.0, 80.0));
    session.pointer_up();

    let out = render(stage(), &session.sequence, None, false);
    // The crossing point is background again; the stroke survives elsewhere.
    assert_eq!(out.pixel(50, 50), BACKGROUND);
    assert_eq!(&out.pixel(25, 50)[..3], &[0xff, 0x99, 0x00]);
}
