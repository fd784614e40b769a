use std::f64::consts::TAU;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use unfortunate_shared::{HistoryEntry, Item, WheelError, WheelResult};

use crate::config::SpinConfig;
use crate::items::{is_fulfilled, unassigned_probability};
use crate::rng::UniformSource;
use crate::selector::{sector_span, sector_starts, select_assigned};
use crate::store::{KeyValueStorage, Store};
use crate::trajectory::Trajectory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinPhase {
    Idle,
    Accelerating,
    Decelerating,
}

/// Everything decided when a spin starts.
#[derive(Debug, Clone, PartialEq)]
pub struct SpinPlan {
    pub index: usize,
    pub title: String,
    pub weight: f64,
    pub draw: f64,
    /// Position of the resting point inside the sector, in `[0, 1)`.
    pub jitter: f64,
    pub extra_turns: u32,
    pub trajectory: Trajectory,
    pub started_at: DateTime<Utc>,
}

impl SpinPlan {
    pub fn target_angle(&self) -> f64 {
        self.trajectory.target()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpinOutcome {
    pub index: usize,
    pub title: String,
    pub weight: f64,
    pub resting_angle: f64,
    pub started_at: DateTime<Utc>,
}

impl SpinOutcome {
    pub fn history_entry(&self) -> HistoryEntry {
        HistoryEntry {
            ts: self.started_at,
            title: self.title.clone(),
            weight: self.weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub angle: f64,
    pub phase: SpinPhase,
    /// Set on the single frame that finishes a spin.
    pub outcome: Option<SpinOutcome>,
}

impl Frame {
    pub fn is_done(&self) -> bool {
        self.phase == SpinPhase::Idle
    }
}

#[derive(Debug, Clone)]
pub struct Animator {
    config: SpinConfig,
    resting_angle: f64,
    active: Option<SpinPlan>,
}

impl Default for Animator {
    fn default() -> Self {
        Self::new(SpinConfig::default())
    }
}

impl Animator {
    pub fn new(config: SpinConfig) -> Self {
        Self {
            config,
            resting_angle: 0.0,
            active: None,
        }
    }

    pub fn config(&self) -> &SpinConfig {
        &self.config
    }

    /// Wheel rotation kept between spins, in `[0, 2π)`.
    pub fn resting_angle(&self) -> f64 {
        self.resting_angle
    }

    pub fn is_spinning(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_plan(&self) -> Option<&SpinPlan> {
        self.active.as_ref()
    }

    pub fn plan_spin<R: UniformSource>(
        &mut self,
        items: &[Item],
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> WheelResult<&SpinPlan> {
        if self.active.is_some() {
            return Err(WheelError::SpinInProgress);
        }
        if items.is_empty() {
            return Err(WheelError::NoItems);
        }
        let unassigned = unassigned_probability(items);
        if !is_fulfilled(unassigned, self.config.epsilon) {
            return Err(WheelError::NotFullyAssigned { unassigned });
        }

        let draw = rng.next_f64();
        let (index, item) = select_assigned(items, draw).ok_or(WheelError::NoItems)?;
        let jitter = rng.next_f64();
        let point = sector_starts(items)[index] + jitter * sector_span(item.weight);
        // rotation that brings `point` under the pointer
        let rest = normalize_angle(self.config.pointer_angle - point);
        let forward = normalize_angle(rest - self.resting_angle);

        let (lo, hi) = ordered(self.config.min_extra_turns, self.config.max_extra_turns);
        let extra_turns = rng.range_inclusive(lo, hi);
        let (lo, hi) = ordered(self.config.min_accel_ms, self.config.max_accel_ms);
        let accel_ms = rng.range_f64(lo as f64, (hi + 1) as f64).floor().min(hi as f64);
        let accel_window = Duration::from_millis(accel_ms as u64);

        let displacement = forward + extra_turns as f64 * TAU;
        let trajectory = Trajectory::solve(
            self.resting_angle,
            displacement,
            accel_window,
            self.config.friction,
        );
        debug!(
            index,
            title = %item.title,
            draw,
            jitter,
            extra_turns,
            accel_ms,
            displacement,
            accel = trajectory.acceleration(),
            "spin planned"
        );

        let plan = SpinPlan {
            index,
            title: item.title.clone(),
            weight: item.weight,
            draw,
            jitter,
            extra_turns,
            trajectory,
            started_at: now,
        };
        Ok(&*self.active.insert(plan))
    }

    /// Completion is reported on exactly one frame.
    pub fn advance(&mut self, elapsed: Duration) -> Frame {
        let Some(plan) = self.active.take() else {
            return Frame {
                angle: self.resting_angle,
                phase: SpinPhase::Idle,
                outcome: None,
            };
        };

        let traj = plan.trajectory;
        let t = elapsed.as_secs_f64();
        let angle = traj.angle_at(t);
        let cutoff = traj.end_secs() + self.config.cutoff_grace_ms as f64 / 1000.0;
        let phase = if traj.is_accelerating(t) {
            SpinPhase::Accelerating
        } else if (traj.target() - angle).abs() > self.config.angle_tolerance && t < cutoff {
            SpinPhase::Decelerating
        } else {
            SpinPhase::Idle
        };
        if phase != SpinPhase::Idle {
            self.active = Some(plan);
            return Frame {
                angle,
                phase,
                outcome: None,
            };
        }

        self.resting_angle = normalize_angle(traj.target());
        info!(title = %plan.title, weight = plan.weight, "spin finished");
        Frame {
            angle: self.resting_angle,
            phase,
            outcome: Some(SpinOutcome {
                index: plan.index,
                title: plan.title,
                weight: plan.weight,
                resting_angle: self.resting_angle,
                started_at: plan.started_at,
            }),
        }
    }

    pub fn advance_and_record<S: KeyValueStorage>(
        &mut self,
        elapsed: Duration,
        store: &mut Store<S>,
    ) -> WheelResult<Frame> {
        let frame = self.advance(elapsed);
        if let Some(outcome) = &frame.outcome {
            store.record_spin(outcome.history_entry())?;
        }
        Ok(frame)
    }
}

pub fn normalize_angle(angle: f64) -> f64 {
    let a = angle.rem_euclid(TAU);
    if a >= TAU {
        0.0
    } else {
        a
    }
}

/// Index of the sector under a pointer at `pointer_angle` when the wheel is
/// rotated by `angle`.
pub fn sector_at_pointer(items: &[Item], angle: f64, pointer_angle: f64) -> Option<usize> {
    let point = normalize_angle(pointer_angle - angle);
    let mut end = 0.0;
    for (idx, item) in items.iter().enumerate() {
        end += sector_span(item.weight);
        if point < end {
            return Some(idx);
        }
    }
    None
}

fn ordered<T: PartialOrd>(a: T, b: T) -> (T, T) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedSource;

    fn abc() -> Vec<Item> {
        vec![
            Item::new("A", 0.5),
            Item::new("B", 0.3),
            Item::new("C", 0.2),
        ]
    }

    fn run_to_end(animator: &mut Animator) -> (Frame, u32) {
        let mut frames = 0;
        loop {
            frames += 1;
            let frame = animator.advance(Duration::from_secs_f64(frames as f64 / 60.0));
            if frame.is_done() {
                return (frame, frames);
            }
            assert!(frames < 60 * 120, "spin did not terminate");
        }
    }

    #[test]
    fn rejects_empty_and_unassigned() {
        let mut animator = Animator::default();
        let mut rng = ScriptedSource::new(vec![0.5]);
        assert_eq!(
            animator.plan_spin(&[], &mut rng, Utc::now()).unwrap_err(),
            WheelError::NoItems
        );
        let partial = vec![Item::new("A", 0.99)];
        assert!(matches!(
            animator.plan_spin(&partial, &mut rng, Utc::now()),
            Err(WheelError::NotFullyAssigned { .. })
        ));
        assert!(!animator.is_spinning());
    }

    #[test]
    fn second_request_is_ignored() {
        let mut animator = Animator::default();
        let mut rng = ScriptedSource::new(vec![0.6, 0.5, 0.0, 0.0]);
        let items = abc();
        animator.plan_spin(&items, &mut rng, Utc::now()).unwrap();
        let first = animator.active_plan().cloned();
        assert_eq!(
            animator.plan_spin(&items, &mut rng, Utc::now()).unwrap_err(),
            WheelError::SpinInProgress
        );
        assert_eq!(animator.active_plan().cloned(), first);
    }

    #[test]
    fn phases_follow_the_state_machine() {
        let mut animator = Animator::default();
        let mut rng = ScriptedSource::new(vec![0.1, 0.5, 0.5, 0.5]);
        let plan = animator.plan_spin(&abc(), &mut rng, Utc::now()).unwrap().clone();
        assert_eq!(plan.index, 0);
        let t1 = plan.trajectory.accel_secs();

        let early = animator.advance(Duration::from_secs_f64(t1 / 2.0));
        assert_eq!(early.phase, SpinPhase::Accelerating);
        let late = animator.advance(Duration::from_secs_f64(t1 + 0.5));
        assert_eq!(late.phase, SpinPhase::Decelerating);
        let (done, _) = run_to_end(&mut animator);
        assert!(done.outcome.is_some());
        assert_eq!(animator.advance(Duration::from_secs(1)).phase, SpinPhase::Idle);
    }

    #[test]
    fn cutoff_ends_spin_when_tolerance_is_never_met() {
        let config = SpinConfig {
            // no distance satisfies a negative tolerance
            angle_tolerance: -1.0,
            ..SpinConfig::default()
        };
        let grace = config.cutoff_grace_ms as f64 / 1000.0;
        let mut animator = Animator::new(config);
        let mut rng = ScriptedSource::new(vec![0.6, 0.5, 0.5, 0.5]);
        let plan = animator.plan_spin(&abc(), &mut rng, Utc::now()).unwrap().clone();
        let cutoff = plan.trajectory.end_secs() + grace;

        let (frame, frames) = run_to_end(&mut animator);
        let done_at = frames as f64 / 60.0;
        assert!(done_at >= cutoff - 1e-6, "done at {done_at}, cutoff {cutoff}");
        assert!(done_at < cutoff + 1.0 / 60.0 + 1e-6, "done at {done_at}, cutoff {cutoff}");
        assert_eq!(frame.angle, normalize_angle(plan.target_angle()));
        assert_eq!(frame.outcome.unwrap().index, plan.index);
    }

    #[test]
    fn lands_inside_selected_sector() {
        let items = abc();
        for (draw, expected) in [(0.1, 0), (0.6, 1), (0.95, 2)] {
            let mut animator = Animator::default();
            let mut rng = ScriptedSource::new(vec![draw, 0.37, 0.2, 0.8]);
            animator.plan_spin(&items, &mut rng, Utc::now()).unwrap();
            let (frame, _) = run_to_end(&mut animator);
            let outcome = frame.outcome.unwrap();
            assert_eq!(outcome.index, expected);
            let pointer = animator.config().pointer_angle;
            assert_eq!(sector_at_pointer(&items, outcome.resting_angle, pointer), Some(expected));
        }
    }

    #[test]
    fn displacement_is_whole_turns_plus_remainder() {
        let mut animator = Animator::default();
        let mut rng = ScriptedSource::new(vec![0.3, 0.9, 0.4, 0.1]);
        let plan = animator.plan_spin(&abc(), &mut rng, Utc::now()).unwrap().clone();
        let d = plan.trajectory.displacement();
        let turns = (d / TAU).floor();
        assert_eq!(turns as u32, plan.extra_turns);
        assert!((8..=15).contains(&plan.extra_turns));
        let rem = d - turns * TAU;
        assert!((0.0..TAU).contains(&rem));
    }

    #[test]
    fn resting_angle_carries_into_next_spin() {
        let items = abc();
        let mut animator = Animator::default();
        let mut rng = ScriptedSource::new(vec![0.6, 0.5, 0.5, 0.5]);
        animator.plan_spin(&items, &mut rng, Utc::now()).unwrap();
        run_to_end(&mut animator);
        let rest = animator.resting_angle();
        assert!((0.0..TAU).contains(&rest));
        let plan = animator.plan_spin(&items, &mut rng, Utc::now()).unwrap();
        assert_eq!(plan.trajectory.start(), rest);
    }

    #[test]
    fn completion_records_history_once() {
        let mut store = Store::load(crate::store::MemoryStorage::new());
        store.add_item("A", 0.5).unwrap();
        store.add_item("B", 0.5).unwrap();
        let items = store.items().to_vec();
        let mut animator = Animator::default();
        let mut rng = ScriptedSource::new(vec![0.7, 0.5, 0.0, 0.0]);
        animator.plan_spin(&items, &mut rng, Utc::now()).unwrap();

        let mut frames = 0u32;
        loop {
            frames += 1;
            let frame = animator
                .advance_and_record(Duration::from_secs_f64(frames as f64 / 60.0), &mut store)
                .unwrap();
            if frame.is_done() {
                break;
            }
        }
        for extra in 1..5 {
            let t = Duration::from_secs_f64((frames + extra) as f64 / 60.0);
            animator.advance_and_record(t, &mut store).unwrap();
        }
        assert_eq!(store.history().len(), 1);
        assert_eq!(store.history()[0].title, "B");
    }

    #[test]
    fn normalize_wraps_negative_angles() {
        let up = normalize_angle(-std::f64::consts::FRAC_PI_2);
        assert!((up - 1.5 * std::f64::consts::PI).abs() < 1e-12);
        assert_eq!(normalize_angle(TAU), 0.0);
    }
}
