/// Entities: Player (the light), Chaser, Guide, items, keys, gates, platforms.
///
/// Entities own their state and a few small lifecycle methods. Movement
/// through the world goes through `physics::resolve_move` in `sim::step`.

use std::collections::VecDeque;

use glam::Vec2;
use serde::Deserialize;

use crate::config::{ChaserTuning, PlayerTuning};
use super::physics::{MoveOutcome, Rect};

/// Velocity components below this snap to zero while coasting.
const REST_EPSILON: f32 = 0.01;
const TRAIL_LEN: usize = 8;
const TRAIL_MIN_SPEED: f32 = 0.5;

/// Ticks before expiry during which a timed item shows as dissolving.
pub const DISSOLVE_TICKS: u32 = 60;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Latest held state of the four directions. No buffering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeldKeys {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl HeldKeys {
    pub fn set(&mut self, dir: Direction, held: bool) {
        match dir {
            Direction::Up => self.up = held,
            Direction::Down => self.down = held,
            Direction::Left => self.left = held,
            Direction::Right => self.right = held,
        }
    }

    pub fn any(&self) -> bool {
        self.up || self.down || self.left || self.right
    }

    /// Unit-per-key direction; opposite keys cancel. Diagonals are not normalized.
    pub fn axis(&self) -> Vec2 {
        let mut v = Vec2::ZERO;
        if self.up { v.y -= 1.0; }
        if self.down { v.y += 1.0; }
        if self.left { v.x -= 1.0; }
        if self.right { v.x += 1.0; }
        v
    }
}

// ── Player ──

#[derive(Clone, Debug)]
pub struct Player {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    /// Recent positions, oldest first. Presentation only.
    pub trail: VecDeque<Vec2>,
}

impl Player {
    pub fn new(pos: Vec2, size: f32) -> Self {
        Player { pos, vel: Vec2::ZERO, size, trail: VecDeque::with_capacity(TRAIL_LEN) }
    }

    pub fn half(&self) -> f32 {
        self.size / 2.0
    }

    /// Ease velocity toward the held direction, or coast to rest.
    pub fn steer(&mut self, keys: HeldKeys, tuning: &PlayerTuning) {
        if keys.any() {
            let target = keys.axis() * tuning.speed;
            self.vel += (target - self.vel) * tuning.acceleration;
        } else {
            self.vel *= tuning.deceleration;
            if self.vel.x.abs() < REST_EPSILON { self.vel.x = 0.0; }
            if self.vel.y.abs() < REST_EPSILON { self.vel.y = 0.0; }
        }
    }

    /// Take the resolved position. A blocked axis bounces back, damped.
    pub fn settle(&mut self, outcome: MoveOutcome, bounce: f32) {
        if self.vel.length() > TRAIL_MIN_SPEED && outcome.position != self.pos {
            if self.trail.len() == TRAIL_LEN {
                self.trail.pop_front();
            }
            self.trail.push_back(self.pos);
        }
        self.pos = outcome.position;
        if outcome.blocked_x { self.vel.x *= -bounce; }
        if outcome.blocked_y { self.vel.y *= -bounce; }
    }

    pub fn reset(&mut self, pos: Vec2) {
        self.pos = pos;
        self.vel = Vec2::ZERO;
        self.trail.clear();
    }

    pub fn bounds(&self) -> Rect {
        Rect::around(self.pos, self.half())
    }
}

// ── Chaser ──

/// The hostile entity. Inert until the player first moves.
#[derive(Clone, Debug)]
pub struct Chaser {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    pub max_speed: f32,
    pub active: bool,
    spawn: Vec2,
}

impl Chaser {
    pub fn new(spawn: Vec2, max_speed: f32, tuning: &ChaserTuning) -> Self {
        Chaser {
            pos: spawn,
            vel: Vec2::ZERO,
            size: tuning.size,
            max_speed,
            active: false,
            spawn,
        }
    }

    pub fn half(&self) -> f32 {
        self.size / 2.0
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    pub fn reset(&mut self) {
        self.pos = self.spawn;
        self.vel = Vec2::ZERO;
        self.active = false;
    }

    pub fn bounds(&self) -> Rect {
        Rect::around(self.pos, self.half())
    }
}

// ── Guide ──

/// The friendly forest guide. Scenery: bobs in place, never collides.
#[derive(Clone, Debug)]
pub struct Guide {
    pub home: Vec2,
    time: f32,
}

impl Guide {
    pub fn new(home: Vec2) -> Self {
        Guide { home, time: 0.0 }
    }

    pub fn tick(&mut self) {
        self.time += 0.05;
    }

    /// Drawn position with a gentle vertical bob.
    pub fn display_pos(&self) -> Vec2 {
        self.home + Vec2::new(0.0, self.time.sin() * 5.0)
    }
}

// ── Items ──

/// What a level's primary items look like.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    #[default]
    Orb,
    Heart,
    Lantern,
    Note,
    Star,
}

/// Which group an item belongs to. Only `Required` counts toward completion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemRole {
    Required,
    Bonus,
    Timed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemState {
    Available,
    Collected,
    /// A timed item that ran out before pickup.
    Dissolved,
}

#[derive(Clone, Debug)]
pub struct Collectible {
    pub pos: Vec2,
    pub role: ItemRole,
    pub state: ItemState,
    /// Remaining ticks for timed items.
    pub remaining: Option<u32>,
    lifetime: Option<u32>,
}

impl Collectible {
    pub fn new(pos: Vec2, role: ItemRole) -> Self {
        Collectible { pos, role, state: ItemState::Available, remaining: None, lifetime: None }
    }

    pub fn timed(pos: Vec2, ticks: u32) -> Self {
        Collectible {
            pos,
            role: ItemRole::Timed,
            state: ItemState::Available,
            remaining: Some(ticks),
            lifetime: Some(ticks),
        }
    }

    pub fn is_available(&self) -> bool {
        self.state == ItemState::Available
    }

    pub fn is_collected(&self) -> bool {
        self.state == ItemState::Collected
    }

    /// In the last stretch before a timed item vanishes.
    pub fn is_dissolving(&self) -> bool {
        self.is_available() && self.remaining.is_some_and(|r| r <= DISSOLVE_TICKS)
    }

    /// Advance one tick. Returns true if the item just dissolved.
    pub fn tick(&mut self) -> bool {
        if !self.is_available() { return false; }
        match self.remaining.as_mut() {
            Some(r) if *r > 0 => {
                *r -= 1;
                if *r == 0 {
                    self.state = ItemState::Dissolved;
                    return true;
                }
                false
            }
            _ => false,
        }
    }

    pub fn reset(&mut self) {
        self.state = ItemState::Available;
        self.remaining = self.lifetime;
    }
}

/// A key that opens every gate with the same id.
#[derive(Clone, Debug)]
pub struct LevelKey {
    pub pos: Vec2,
    pub id: u32,
    pub collected: bool,
}

#[derive(Clone, Debug)]
pub struct Gate {
    pub rect: Rect,
    pub key_id: u32,
    pub open: bool,
}

// ── Moving platforms ──

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    #[default]
    X,
    Y,
}

/// A solid bar sliding back and forth between `from` and `to`
/// (the top-left coordinate on its axis).
#[derive(Clone, Debug)]
pub struct MovingPlatform {
    pub rect: Rect,
    pub axis: Axis,
    pub from: f32,
    pub to: f32,
    /// +1.0 toward `to`, -1.0 toward `from`.
    pub heading: f32,
    start: Rect,
}

impl MovingPlatform {
    pub fn new(rect: Rect, axis: Axis, from: f32, to: f32) -> Self {
        let (lo, hi) = if from <= to { (from, to) } else { (to, from) };
        MovingPlatform { rect, axis, from: lo, to: hi, heading: 1.0, start: rect }
    }

    /// Where the platform would be after one step, with the heading it
    /// would have afterwards.
    pub fn proposed(&self, speed: f32) -> (Rect, f32) {
        let coord = match self.axis { Axis::X => self.rect.x, Axis::Y => self.rect.y };
        let mut next = coord + speed * self.heading;
        let mut heading = self.heading;
        if next >= self.to {
            next = self.to;
            heading = -1.0;
        } else if next <= self.from {
            next = self.from;
            heading = 1.0;
        }
        let mut rect = self.rect;
        match self.axis {
            Axis::X => rect.x = next,
            Axis::Y => rect.y = next,
        }
        (rect, heading)
    }

    pub fn reset(&mut self) {
        self.rect = self.start;
        self.heading = 1.0;
    }
}
