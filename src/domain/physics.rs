/// Motion & collision layer: single source of truth for "where can it go".
///
/// ## Architecture
///
/// Everything is an axis-aligned box in arena coordinates (top-left origin,
/// y grows downward). Movable entities are squares described by their CENTER
/// and a half-extent; solids are `Rect`s described by their top-left corner.
///
/// ## Per-axis resolution (sliding)
///
///   1. candidate = current + delta, clamped to `[half, dim - half]`
///   2. X test: box at (candidate.x, current.y). Overlap → X rejected.
///   3. Y test: box at (x from step 2, candidate.y). Overlap → Y rejected.
///   4. Unblocked axes apply, so an entity pressed diagonally into a wall
///      keeps moving along it.
///
/// No sub-stepping: a delta larger than an obstacle's thickness can tunnel
/// through it. Speeds are small enough in practice.

use glam::Vec2;
use serde::Deserialize;

// ══════════════════════════════════════════════════════════════
// Layer 1: Shapes
// ══════════════════════════════════════════════════════════════

/// Axis-aligned rectangle, top-left corner plus size.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Rect { x, y, width, height }
    }

    /// Square box of `2 * half` around `center`.
    pub fn around(center: Vec2, half: f32) -> Self {
        Rect::new(center.x - half, center.y - half, half * 2.0, half * 2.0)
    }

    pub fn right(&self) -> f32 { self.x + self.width }
    pub fn bottom(&self) -> f32 { self.y + self.height }

    /// Strict intersection: touching edges do NOT overlap.
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }
}

/// The playable area. Entity centers stay within `[half, dim - half]`.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
}

impl Arena {
    pub fn new(width: f32, height: f32) -> Self {
        Arena { width, height }
    }

    /// Clamp a center so a box of `half` stays fully inside.
    pub fn clamp(&self, pos: Vec2, half: f32) -> Vec2 {
        Vec2::new(
            pos.x.max(half).min(self.width - half),
            pos.y.max(half).min(self.height - half),
        )
    }

    /// Does a box of `half` around `pos` fit entirely inside?
    pub fn contains(&self, pos: Vec2, half: f32) -> bool {
        pos.x >= half && pos.x <= self.width - half
            && pos.y >= half && pos.y <= self.height - half
    }

    pub fn contains_rect(&self, rect: &Rect) -> bool {
        rect.x >= 0.0 && rect.y >= 0.0
            && rect.right() <= self.width && rect.bottom() <= self.height
    }
}

// ══════════════════════════════════════════════════════════════
// Layer 2: Queries
// ══════════════════════════════════════════════════════════════

/// Would a box of `half` around `center` overlap any solid?
#[inline]
pub fn hits_any(center: Vec2, half: f32, solids: &[Rect]) -> bool {
    let probe = Rect::around(center, half);
    solids.iter().any(|s| probe.overlaps(s))
}

// ══════════════════════════════════════════════════════════════
// Layer 3: Resolution
// ══════════════════════════════════════════════════════════════

/// Result of one resolved move.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoveOutcome {
    pub position: Vec2,
    pub blocked_x: bool,
    pub blocked_y: bool,
}

/// Resolve a desired displacement against solids and the arena edge.
///
/// Never fails: anything illegal comes back as a blocked axis.
pub fn resolve_move(
    current: Vec2,
    delta: Vec2,
    half: f32,
    solids: &[Rect],
    arena: Arena,
) -> MoveOutcome {
    let candidate = arena.clamp(current + delta, half);

    let blocked_x = hits_any(Vec2::new(candidate.x, current.y), half, solids);
    let x = if blocked_x { current.x } else { candidate.x };

    let blocked_y = hits_any(Vec2::new(x, candidate.y), half, solids);
    let y = if blocked_y { current.y } else { candidate.y };

    MoveOutcome { position: Vec2::new(x, y), blocked_x, blocked_y }
}
