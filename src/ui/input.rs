/// Input state tracker.
///
/// Turns raw terminal key events into routed `Input`s:
///   - Direction keys (arrows, WASD) become Press/Release edges, so the level
///     screen can keep its own held-key state
///   - Printable keys become `Char` on every press or repeat (typing)
///   - Enter becomes `Acknowledge` on the initial press only
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't support it.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, poll};

use crate::domain::entity::Direction;
use crate::flow::Input;

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

const DIRECTIONS: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

fn direction_keys(dir: Direction) -> &'static [KeyCode] {
    match dir {
        Direction::Up => &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')],
        Direction::Down => &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')],
        Direction::Left => &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')],
        Direction::Right => &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')],
    }
}

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Directions reported as held after the previous drain.
    held: HashSet<Direction>,

    /// Raw key events collected during drain, for meta-key handling.
    pub raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            held: HashSet::with_capacity(4),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and return what they mean, in order.
    /// Call this once per frame, before the simulation tick.
    pub fn drain_events(&mut self) -> Vec<Input> {
        self.raw_events.clear();
        let mut inputs = Vec::new();

        // Read all available events without blocking
        while poll(Duration::ZERO).unwrap_or(false) {
            let Ok(Event::Key(key)) = event::read() else { continue };
            self.accept(key, &mut inputs);
        }

        // Expire keys that have timed out (fallback for terminals without Release)
        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);

        let last_active = &self.last_active;
        direction_edges(&mut self.held, |dir| {
            direction_keys(dir).iter().any(|c| last_active.contains_key(c))
        }, &mut inputs);
        inputs
    }

    /// Record one key event. Without Release reporting, auto-repeat arrives
    /// as Press, so a key already in `last_active` is not a fresh press.
    fn accept(&mut self, key: KeyEvent, inputs: &mut Vec<Input>) {
        self.raw_events.push(key);

        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            KeyEventKind::Release => {
                // Enhancement not confirmed: rely on timeout expiry instead
            }
            kind => {
                let was_held = self.last_active.contains_key(&key.code);
                self.last_active.insert(key.code, Instant::now());
                let fresh = kind == KeyEventKind::Press && !was_held;
                inputs.extend(decode_key(key, fresh));
            }
        }
    }

    /// Esc or Ctrl+C this frame.
    pub fn quit_requested(&self) -> bool {
        self.raw_events.iter()
            .filter(|k| k.kind != KeyEventKind::Release)
            .any(|k| {
                k.code == KeyCode::Esc
                    || (k.modifiers.contains(KeyModifiers::CONTROL)
                        && matches!(k.code, KeyCode::Char('c') | KeyCode::Char('C')))
            })
    }
}

/// Non-direction meaning of one key press or repeat. `fresh` is false for
/// a key that was already held.
fn decode_key(key: KeyEvent, fresh: bool) -> Option<Input> {
    if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
        return None;
    }
    match key.code {
        KeyCode::Enter if fresh => Some(Input::Acknowledge),
        KeyCode::Backspace => Some(Input::Backspace),
        KeyCode::Char(c) => Some(Input::Char(c)),
        _ => None,
    }
}

/// Emit Press/Release for every direction whose held state changed.
fn direction_edges(
    held: &mut HashSet<Direction>,
    is_held: impl Fn(Direction) -> bool,
    out: &mut Vec<Input>,
) {
    for dir in DIRECTIONS {
        let now = is_held(dir);
        if now && held.insert(dir) {
            out.push(Input::Press(dir));
        } else if !now && held.remove(&dir) {
            out.push(Input::Release(dir));
        }
    }
}
