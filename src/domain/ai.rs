/// Chaser AI: steer straight at the player, wiggle free of walls.
///
/// Two parts:
///   1. **Pursuit**: desired velocity is the unit vector toward the
///      player's current position times `max_speed`, eased in with
///      `acceleration` (same easing shape as the player).
///   2. **Unstick**: on a blocked axis the velocity component flips and is
///      damped, and a random nudge is added on the other axis so the chaser
///      slides off corners instead of pinning itself. Not pathfinding: a
///      chaser behind a long wall may stay stuck.
///
/// Randomness comes from the caller's RNG so a seeded generator gives
/// reproducible trajectories.

use glam::Vec2;
use rand::Rng;

use crate::config::ChaserTuning;
use super::entity::Chaser;
use super::physics::{self, Arena, MoveOutcome, Rect};

/// Desired velocity toward `target`. Zero when already there.
pub fn pursuit_velocity(chaser: &Chaser, target: Vec2) -> Vec2 {
    (target - chaser.pos).normalize_or_zero() * chaser.max_speed
}

/// Reflect and damp blocked components; nudge the perpendicular axis.
pub fn unstick<R: Rng + ?Sized>(
    vel: Vec2,
    blocked_x: bool,
    blocked_y: bool,
    tuning: &ChaserTuning,
    rng: &mut R,
) -> Vec2 {
    let mut v = vel;
    if blocked_x {
        v.x = -v.x * tuning.wall_damping;
        v.y += nudge(tuning, rng);
    }
    if blocked_y {
        v.y = -v.y * tuning.wall_damping;
        v.x += nudge(tuning, rng);
    }
    v
}

fn nudge<R: Rng + ?Sized>(tuning: &ChaserTuning, rng: &mut R) -> f32 {
    if tuning.nudge <= 0.0 {
        return 0.0;
    }
    rng.random_range(-tuning.nudge..=tuning.nudge)
}

/// One tick of chaser motion. Inactive chasers do not move at all.
pub fn advance<R: Rng + ?Sized>(
    chaser: &mut Chaser,
    target: Vec2,
    solids: &[Rect],
    arena: Arena,
    tuning: &ChaserTuning,
    rng: &mut R,
) -> Option<MoveOutcome> {
    if !chaser.active {
        return None;
    }

    let desired = pursuit_velocity(chaser, target);
    chaser.vel += (desired - chaser.vel) * tuning.acceleration;
    chaser.vel = chaser.vel.clamp_length_max(chaser.max_speed * 1.5);

    let outcome = physics::resolve_move(chaser.pos, chaser.vel, chaser.half(), solids, arena);
    chaser.pos = outcome.position;
    chaser.vel = unstick(chaser.vel, outcome.blocked_x, outcome.blocked_y, tuning, rng);
    Some(outcome)
}
