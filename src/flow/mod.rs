/// Screen flow: named screens, the routed input they accept, and the
/// transitions they request.
///
/// ## Graph
///
///   Title ─ack→ NameInput ─submit→ Tutorial ─done→ ColorSelection ─confirm→ Level(0)
///                                      └─done (no palette)────────────────→ Level(0)
///   Level(i) ─complete+ack→ Level(i+1)               (same part)
///            ─complete+ack→ Transition(Interlude)    (part finished)  ─timer→ Level(next)
///            ─complete+ack→ Transition(Finale)       (last part)      ─timer→ Valentine
///            ─contact→ Level(i) reset in place
///   Valentine ─accept→ Celebration (terminal sub-state)
///
/// Screens never switch themselves; they return a `Transition` and the
/// controller performs it.

pub mod controller;
pub mod finale;
pub mod menus;
pub mod play;

use std::fmt;

use crate::config::Tuning;
use crate::domain::entity::Direction;
use crate::sim::level::Content;
use crate::sim::session::SessionState;
use crate::ui::surface::Surface;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScreenId {
    Title,
    NameInput,
    Tutorial,
    ColorSelection,
    Level,
    Transition,
    Valentine,
}

/// Extra data handed to `Screen::enter`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Payload {
    #[default]
    None,
    Level(usize),
    Interlude { finished_part: usize, next_level: usize },
    Finale,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub to: ScreenId,
    pub payload: Payload,
}

impl Transition {
    pub fn to(to: ScreenId) -> Self {
        Transition { to, payload: Payload::None }
    }

    pub fn with(to: ScreenId, payload: Payload) -> Self {
        Transition { to, payload }
    }
}

/// Input after decoding, routed to the active screen only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Input {
    Press(Direction),
    Release(Direction),
    Char(char),
    Backspace,
    Acknowledge,
}

/// Mutable context for enter/input/update.
pub struct Ctx<'a> {
    pub content: &'a Content,
    pub tuning: &'a Tuning,
    pub session: &'a mut SessionState,
}

/// Read-only context for drawing.
pub struct View<'a> {
    pub content: &'a Content,
    pub session: &'a SessionState,
}

pub trait Screen {
    fn id(&self) -> ScreenId;

    /// Reset per-entry state. Called every time the screen becomes active.
    fn enter(&mut self, payload: Payload, ctx: &mut Ctx<'_>) -> Result<(), FlowError>;

    fn handle_input(&mut self, input: Input, ctx: &mut Ctx<'_>) -> Option<Transition>;

    /// One fixed tick.
    fn update(&mut self, ctx: &mut Ctx<'_>) -> Option<Transition>;

    fn draw(&self, view: &View<'_>, surface: &mut dyn Surface);
}

/// A transition that cannot be honored. Always a bug in content or code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowError {
    UnknownLevel(usize),
    BadPayload { screen: ScreenId, payload: Payload },
}

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownLevel(i) => write!(f, "no level with index {i}"),
            Self::BadPayload { screen, payload } => {
                write!(f, "screen {screen:?} cannot be entered with {payload:?}")
            }
        }
    }
}

impl std::error::Error for FlowError {}
