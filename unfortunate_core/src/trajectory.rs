use std::time::Duration;

const MIN_ACCEL_SECS: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trajectory {
    start: f64,
    displacement: f64,
    accel: f64,
    friction: f64,
    accel_secs: f64,
}

impl Trajectory {
    // D = F·t1²/2 + (F·t1)²/(2f)  =>  F = (−f + sqrt(f² + 8·f·D/t1²)) / 2
    pub fn solve(start: f64, displacement: f64, accel_window: Duration, friction: f64) -> Self {
        let t1 = accel_window.as_secs_f64().max(MIN_ACCEL_SECS);
        let displacement = displacement.max(0.0);
        let friction = friction.abs().max(f64::EPSILON);
        let disc = friction * friction + 8.0 * friction * displacement / (t1 * t1);
        let accel = (-friction + disc.sqrt()) / 2.0;
        Self {
            start,
            displacement,
            accel,
            friction,
            accel_secs: t1,
        }
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn target(&self) -> f64 {
        self.start + self.displacement
    }

    pub fn displacement(&self) -> f64 {
        self.displacement
    }

    pub fn acceleration(&self) -> f64 {
        self.accel
    }

    pub fn friction(&self) -> f64 {
        self.friction
    }

    pub fn accel_secs(&self) -> f64 {
        self.accel_secs
    }

    pub fn peak_velocity(&self) -> f64 {
        self.accel * self.accel_secs
    }

    pub fn end_secs(&self) -> f64 {
        self.accel_secs + self.peak_velocity() / self.friction
    }

    pub fn is_accelerating(&self, t: f64) -> bool {
        t < self.accel_secs
    }

    /// Clamped to the target once the wheel stopped.
    pub fn angle_at(&self, t: f64) -> f64 {
        let t = t.max(0.0);
        if t <= self.accel_secs {
            return self.start + self.accel * t * t / 2.0;
        }
        let tau = (t - self.accel_secs).min(self.peak_velocity() / self.friction);
        let released = self.start + self.accel * self.accel_secs * self.accel_secs / 2.0;
        released + self.peak_velocity() * tau - self.friction * tau * tau / 2.0
    }

    pub fn velocity_at(&self, t: f64) -> f64 {
        let t = t.max(0.0);
        if t <= self.accel_secs {
            self.accel * t
        } else {
            (self.peak_velocity() - self.friction * (t - self.accel_secs)).max(0.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::TAU;

    #[test]
    fn lands_on_target() {
        let traj = Trajectory::solve(1.0, 10.0 * TAU + 0.4, Duration::from_millis(450), 2.5);
        let end = traj.angle_at(traj.end_secs());
        assert!((end - traj.target()).abs() < 1e-9, "end={end} target={}", traj.target());
        assert!(traj.velocity_at(traj.end_secs()).abs() < 1e-9);
    }

    #[test]
    fn continuous_at_release() {
        let traj = Trajectory::solve(0.0, 60.0, Duration::from_millis(300), 2.5);
        let t1 = traj.accel_secs();
        let before = traj.angle_at(t1 - 1e-9);
        let after = traj.angle_at(t1 + 1e-9);
        assert!((before - after).abs() < 1e-6);
    }

    #[test]
    fn monotonic_forward() {
        let traj = Trajectory::solve(0.0, 80.0, Duration::from_millis(700), 2.5);
        let mut last = traj.angle_at(0.0);
        let mut t = 0.0;
        while t < traj.end_secs() + 1.0 {
            t += 1.0 / 60.0;
            let a = traj.angle_at(t);
            assert!(a >= last - 1e-12);
            last = a;
        }
        assert!((last - traj.target()).abs() < 1e-9);
    }

    #[test]
    fn zero_displacement_stays_put() {
        let traj = Trajectory::solve(2.0, 0.0, Duration::from_millis(200), 2.5);
        assert_eq!(traj.acceleration(), 0.0);
        assert_eq!(traj.angle_at(5.0), 2.0);
    }
}
