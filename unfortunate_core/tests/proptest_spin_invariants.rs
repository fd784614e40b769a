//! Property tests for selection and trajectory invariants.
//!
//! 1. Selection over a complete distribution always lands in the item whose
//!    cumulative range contains the draw.
//! 2. Selection is a pure function of the draw.
//! 3. Planned displacement is whole extra turns plus a remainder in [0, 2π).
//! 4. Trajectories are continuous at the release time and end on the target.
//! 5. Spins terminate in finite simulated time.

use std::f64::consts::TAU;
use std::time::Duration;

use chrono::Utc;
use proptest::prelude::*;
use unfortunate_core::{select, Animator, Item, ScriptedSource, Trajectory};

// ── Helpers ─────────────────────────────────────────────────────────────

/// Random positive parts normalized so the weights sum to one.
fn distribution_strategy() -> impl Strategy<Value = Vec<Item>> {
    prop::collection::vec(1u32..1000, 1..12).prop_map(|parts| {
        let total: u32 = parts.iter().sum();
        let mut items: Vec<Item> = parts
            .iter()
            .enumerate()
            .map(|(i, p)| Item::new(format!("item-{i}"), *p as f64 / total as f64))
            .collect();
        // absorb rounding into the last weight
        let sum: f64 = items[..items.len() - 1].iter().map(|i| i.weight).sum();
        if let Some(last) = items.last_mut() {
            last.weight = 1.0 - sum;
        }
        items
    })
}

fn unit() -> impl Strategy<Value = f64> {
    0.0f64..1.0
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Selected item's cumulative range contains r
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn selection_range_contains_draw(items in distribution_strategy(), r in unit()) {
        let (idx, _) = select(&items, r).expect("complete distribution always selects");
        let before: f64 = items[..idx].iter().map(|i| i.weight).sum();
        let through = before + items[idx].weight;
        prop_assert!(before < r || idx == 0, "r={} before={}", r, before);
        prop_assert!(r <= through + 1e-12, "r={} through={}", r, through);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Deterministic given r
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn selection_is_deterministic(items in distribution_strategy(), r in unit()) {
        let first = select(&items, r).map(|(i, _)| i);
        for _ in 0..3 {
            prop_assert_eq!(select(&items, r).map(|(i, _)| i), first);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Displacement = k·2π + δ
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn displacement_whole_turns_plus_remainder(
        items in distribution_strategy(),
        draws in prop::collection::vec(unit(), 4),
    ) {
        let mut animator = Animator::default();
        let mut rng = ScriptedSource::new(draws);
        let plan = animator.plan_spin(&items, &mut rng, Utc::now()).unwrap();
        let d = plan.trajectory.displacement();
        let whole = plan.extra_turns as f64 * TAU;
        prop_assert!((8..=15).contains(&plan.extra_turns));
        prop_assert!(d >= whole - 1e-9);
        prop_assert!(d - whole < TAU + 1e-9);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Continuity at t1 and exact landing
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn trajectory_continuous_and_lands(
        start in 0.0f64..TAU,
        displacement in 0.0f64..120.0,
        accel_ms in 200u64..=700,
        friction in 0.5f64..20.0,
    ) {
        let traj = Trajectory::solve(start, displacement, Duration::from_millis(accel_ms), friction);
        let t1 = traj.accel_secs();
        let left = traj.angle_at(t1 - 1e-9);
        let right = traj.angle_at(t1 + 1e-9);
        prop_assert!((left - right).abs() < 1e-5, "jump at t1: {} vs {}", left, right);
        let end = traj.angle_at(traj.end_secs());
        prop_assert!((end - traj.target()).abs() < 1e-7);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Termination
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]
    #[test]
    fn spin_terminates(
        items in distribution_strategy(),
        draws in prop::collection::vec(unit(), 4),
    ) {
        let mut animator = Animator::default();
        let mut rng = ScriptedSource::new(draws);
        let plan = animator.plan_spin(&items, &mut rng, Utc::now()).unwrap().clone();
        let limit = plan.trajectory.end_secs() + 1.0;
        let mut t = 0.0;
        let mut finished = false;
        while t <= limit {
            t += 1.0 / 60.0;
            if animator.advance(Duration::from_secs_f64(t)).is_done() {
                finished = true;
                break;
            }
        }
        prop_assert!(finished);
        prop_assert!(!animator.is_spinning());
    }
}
