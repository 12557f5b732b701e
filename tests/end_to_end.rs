use flipcut::{
    AnimationSequence, EditorSession, Fps, Modifiers, Point, ProcessingParameters, Stage, Surface,
    Ticker, Vec2, export_tick_plan, play_preview, process, render,
};

/// Checkerboard of bright (240) and dark (60) gray pixels.
fn checker_source(w: u32, h: u32) -> Surface {
    let mut s = Surface::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let v = if (x + y) % 2 == 0 { 240 } else { 60 };
            s.put_pixel(x, y, [v, v, v, 255]);
        }
    }
    s
}

#[test]
fn import_threshold_pose_and_play() {
    let stage = Stage::new(64, 64).unwrap();
    let mut session = EditorSession::new(stage);

    // Import and key at the default threshold of 235: brightness-240
    // pixels go transparent, brightness-60 pixels survive untouched.
    session.set_source(checker_source(16, 16));
    let cutout = session.cutout().unwrap();
    assert_eq!(cutout.pixel(0, 0)[3], 0);
    assert_eq!(cutout.pixel(1, 0), [60, 60, 60, 255]);

    // Add the first frame.
    session.sequence.add_frame(stage);
    assert_eq!(session.sequence.len(), 1);
    assert_eq!(session.sequence.active_index(), 0);

    // Move-tool drag by (10, 10).
    let before = session.sequence.active_frame().unwrap().transform.translation;
    session.pointer_down(Point::new(30.0, 30.0), Modifiers::default());
    session.pointer_move(Point::new(40.0, 40.0));
    session.pointer_up();
    let after = session.sequence.active_frame().unwrap().transform.translation;
    assert_eq!(after - before, Vec2::new(10.0, 10.0));

    // Play at 8 fps: each tick is ~125ms and the index cycles in order.
    let fps = Fps::new(8).unwrap();
    assert_eq!(fps.frame_duration().as_millis(), 125);
    session.sequence.add_frame(stage);
    session.sequence.add_frame(stage);

    let ticker = Ticker::new(Fps::new(24).unwrap());
    let mut rendered = 0u32;
    play_preview(&mut session, &ticker, false, |frame| {
        assert_eq!((frame.width, frame.height), (64, 64));
        rendered += 1;
        Ok(if rendered == 6 {
            std::ops::ControlFlow::Break(())
        } else {
            std::ops::ControlFlow::Continue(())
        })
    })
    .unwrap();
    assert_eq!(rendered, 6);
    // Tick 5 was the last applied: 5 % 3 == 2.
    assert_eq!(session.sequence.active_index(), 2);
}

#[test]
fn parameter_changes_are_order_independent() {
    let source = checker_source(8, 8);
    let p_hue = ProcessingParameters {
        hue: 90.0,
        ..Default::default()
    };
    let p_dim = ProcessingParameters {
        brightness: 0.5,
        ..Default::default()
    };

    let mut session = EditorSession::new(Stage::new(32, 32).unwrap());
    session.set_source(source.clone());
    session.set_processing(p_hue).unwrap();
    session.set_processing(p_dim).unwrap();

    // The session's cutout after hue-then-dim equals a direct single
    // process with the dim parameters.
    assert_eq!(*session.cutout().unwrap(), process(&source, &p_dim));
}

#[test]
fn export_plan_covers_every_frame_twice() {
    let counts = {
        let mut counts = [0usize; 4];
        for idx in export_tick_plan(4) {
            counts[idx] += 1;
        }
        counts
    };
    assert_eq!(counts, [2, 2, 2, 2]);
}

#[test]
fn deleting_while_rendering_stays_consistent() {
    let stage = Stage::new(32, 32).unwrap();
    let mut seq = AnimationSequence::new();
    seq.add_frame(stage);
    seq.add_frame(stage);
    seq.add_frame(stage);

    seq.delete_frame(2);
    assert_eq!(seq.active_index(), 1);
    let out = render(stage, &seq, None, true);
    assert_eq!((out.width, out.height), (32, 32));

    seq.delete_frame(0);
    seq.delete_frame(0);
    assert!(seq.is_empty());
    // Empty sequence renders the placeholder, never panics.
    let out = render(stage, &seq, None, true);
    assert_eq!((out.width, out.height), (32, 32));
}
