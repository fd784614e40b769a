use std::time::Duration;

use chrono::Utc;
use unfortunate_core::{colored_item, Animator, RecordingContext, SeededRng, WheelRenderer};

fn main() {
    // Example end-to-end spin on a simulated 60 fps clock
    let items = vec![
        colored_item("dishes", 0.5),
        colored_item("laundry", 0.3),
        colored_item("vacuum", 0.2),
    ];
    let mut rng = SeededRng::new("example-seed", 1);
    let mut animator = Animator::default();
    let renderer = WheelRenderer::default();
    let mut ctx = RecordingContext::default();

    animator
        .plan_spin(&items, &mut rng, Utc::now())
        .expect("items are fully assigned");
    let mut frame_no = 0u32;
    let outcome = loop {
        frame_no += 1;
        let frame = animator.advance(Duration::from_secs_f64(frame_no as f64 / 60.0));
        ctx.commands.clear();
        renderer.draw(&mut ctx, frame.angle, &items);
        if let Some(outcome) = frame.outcome {
            break outcome;
        }
    };
    println!(
        "seed_hash={} frames={} result={} resting_angle={:.4}",
        rng.seed_hash_hex(),
        frame_no,
        outcome.title,
        outcome.resting_angle
    );
}
