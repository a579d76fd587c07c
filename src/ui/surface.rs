/// Drawing surface: the only thing screens know about presentation.
///
/// Screens describe WHAT is where (arena coordinates, semantic paint, text
/// slots); the implementation decides how it looks. `ui::renderer` paints
/// terminal cells; tests use `RecordingSurface`.

use glam::Vec2;

use crate::domain::entity::{ItemKind, ItemRole};
use crate::domain::physics::Rect;
use crate::sim::level::Rgb;

/// Where a line of text goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextSlot {
    /// Top status line.
    Hud,
    /// Big centered line.
    Heading,
    /// Centered body lines below the heading.
    Line(u8),
    /// Key help at the bottom.
    Hint,
}

/// Semantic paint for shapes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Paint {
    Obstacle,
    Gate,
    Platform,
    Key,
    Item { kind: ItemKind, role: ItemRole, dissolving: bool },
    Light { color: Rgb, glow: Rgb },
    Trail(Rgb),
    Chaser,
    Guide,
    Heart,
    /// Marker under the selected palette swatch.
    Cursor,
}

pub trait Surface {
    /// Start a fresh frame.
    fn clear(&mut self);
    fn fill_rect(&mut self, rect: Rect, paint: Paint);
    fn fill_disc(&mut self, center: Vec2, radius: f32, paint: Paint);
    fn text(&mut self, slot: TextSlot, text: &str);
    /// Speech from the guide; `opacity` 0.0 (gone) to 1.0.
    fn dialogue(&mut self, text: &str, opacity: f32);
    /// Hide everything further than `radius` from `center` (arena units).
    fn fog(&mut self, center: Vec2, radius: f32);
}

/// Test double: remembers every call in order.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub calls: Vec<Call>,
}

#[cfg(test)]
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Clear,
    Rect(Rect, Paint),
    Disc(Vec2, f32, Paint),
    Text(TextSlot, String),
    Dialogue(String, f32),
    Fog(Vec2, f32),
}

#[cfg(test)]
impl RecordingSurface {
    pub fn texts(&self, slot: TextSlot) -> Vec<&str> {
        self.calls.iter()
            .filter_map(|c| match c {
                Call::Text(s, t) if *s == slot => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn dialogues(&self) -> Vec<&str> {
        self.calls.iter()
            .filter_map(|c| match c {
                Call::Dialogue(t, _) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn count_paint(&self, wanted: fn(&Paint) -> bool) -> usize {
        self.calls.iter()
            .filter(|c| match c {
                Call::Rect(_, p) | Call::Disc(_, _, p) => wanted(p),
                _ => false,
            })
            .count()
    }
}

#[cfg(test)]
impl Surface for RecordingSurface {
    fn clear(&mut self) {
        self.calls.push(Call::Clear);
    }

    fn fill_rect(&mut self, rect: Rect, paint: Paint) {
        self.calls.push(Call::Rect(rect, paint));
    }

    fn fill_disc(&mut self, center: Vec2, radius: f32, paint: Paint) {
        self.calls.push(Call::Disc(center, radius, paint));
    }

    fn text(&mut self, slot: TextSlot, text: &str) {
        self.calls.push(Call::Text(slot, text.to_string()));
    }

    fn dialogue(&mut self, text: &str, opacity: f32) {
        self.calls.push(Call::Dialogue(text.to_string(), opacity));
    }

    fn fog(&mut self, center: Vec2, radius: f32) {
        self.calls.push(Call::Fog(center, radius));
    }
}
