/// Menu screens before play starts: Title, NameInput, Tutorial,
/// ColorSelection. Each one owns a small amount of state, reset on enter.

use glam::Vec2;

use crate::domain::entity::{Direction, Guide};
use crate::domain::physics::Rect;
use crate::ui::surface::{Paint, Surface, TextSlot};
use super::{Ctx, FlowError, Input, Payload, Screen, ScreenId, Transition, View};

/// Longest name the input box accepts, in characters.
pub const MAX_NAME_CHARS: usize = 20;

/// Ticks per half-cycle of blinking prompts.
const BLINK_TICKS: u64 = 30;

fn blink_on(ticks: u64) -> bool {
    (ticks / BLINK_TICKS) % 2 == 0
}

// ══════════════════════════════════════════════════════════════
// Title
// ══════════════════════════════════════════════════════════════

#[derive(Default)]
pub struct TitleScreen {
    pub(crate) ticks: u64,
}

impl Screen for TitleScreen {
    fn id(&self) -> ScreenId { ScreenId::Title }

    fn enter(&mut self, _payload: Payload, _ctx: &mut Ctx<'_>) -> Result<(), FlowError> {
        self.ticks = 0;
        Ok(())
    }

    fn handle_input(&mut self, input: Input, _ctx: &mut Ctx<'_>) -> Option<Transition> {
        match input {
            Input::Acknowledge => Some(Transition::to(ScreenId::NameInput)),
            _ => None,
        }
    }

    fn update(&mut self, _ctx: &mut Ctx<'_>) -> Option<Transition> {
        self.ticks += 1;
        None
    }

    fn draw(&self, view: &View<'_>, surface: &mut dyn Surface) {
        surface.clear();
        surface.text(TextSlot::Heading, &view.content.dialogue.title);
        surface.text(TextSlot::Line(1), "A small forest is waiting for its light.");
        if blink_on(self.ticks) {
            surface.text(TextSlot::Hint, "Press Enter to begin");
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Name input
// ══════════════════════════════════════════════════════════════

#[derive(Default)]
pub struct NameInputScreen {
    pub(crate) buffer: String,
    pub(crate) ticks: u64,
}

impl Screen for NameInputScreen {
    fn id(&self) -> ScreenId { ScreenId::NameInput }

    fn enter(&mut self, _payload: Payload, ctx: &mut Ctx<'_>) -> Result<(), FlowError> {
        self.buffer = ctx.session.name().unwrap_or_default().to_string();
        self.ticks = 0;
        Ok(())
    }

    fn handle_input(&mut self, input: Input, ctx: &mut Ctx<'_>) -> Option<Transition> {
        match input {
            Input::Char(c) if !c.is_control() => {
                if self.buffer.chars().count() < MAX_NAME_CHARS {
                    self.buffer.push(c);
                }
                None
            }
            Input::Backspace => {
                self.buffer.pop();
                None
            }
            Input::Acknowledge => {
                ctx.session.set_name(&self.buffer);
                log::info!("name entered: {:?}", ctx.session.name());
                Some(Transition::to(ScreenId::Tutorial))
            }
            _ => None,
        }
    }

    fn update(&mut self, _ctx: &mut Ctx<'_>) -> Option<Transition> {
        self.ticks += 1;
        None
    }

    fn draw(&self, _view: &View<'_>, surface: &mut dyn Surface) {
        surface.clear();
        surface.text(TextSlot::Heading, "What should I call you?");
        let cursor = if blink_on(self.ticks) { "_" } else { " " };
        surface.text(TextSlot::Line(1), &format!("{}{cursor}", self.buffer));
        surface.text(TextSlot::Hint, "Type a name, Enter to continue (blank is fine)");
    }
}

// ══════════════════════════════════════════════════════════════
// Tutorial
// ══════════════════════════════════════════════════════════════

pub struct TutorialScreen {
    pub(crate) line: usize,
    pub(crate) ticks: u64,
    guide: Guide,
}

impl Default for TutorialScreen {
    fn default() -> Self {
        TutorialScreen { line: 0, ticks: 0, guide: Guide::new(Vec2::new(400.0, 260.0)) }
    }
}

impl TutorialScreen {
    fn finished(ctx: &Ctx<'_>) -> Transition {
        if ctx.content.palette.is_empty() {
            Transition::with(ScreenId::Level, Payload::Level(0))
        } else {
            Transition::to(ScreenId::ColorSelection)
        }
    }
}

impl Screen for TutorialScreen {
    fn id(&self) -> ScreenId { ScreenId::Tutorial }

    fn enter(&mut self, _payload: Payload, ctx: &mut Ctx<'_>) -> Result<(), FlowError> {
        self.line = 0;
        self.ticks = 0;
        self.guide = Guide::new(Vec2::new(ctx.content.arena.width / 2.0, ctx.content.arena.height * 0.45));
        Ok(())
    }

    fn handle_input(&mut self, input: Input, ctx: &mut Ctx<'_>) -> Option<Transition> {
        if input != Input::Acknowledge { return None; }
        self.line += 1;
        if self.line >= ctx.content.dialogue.tutorial.len() {
            return Some(Self::finished(ctx));
        }
        None
    }

    fn update(&mut self, ctx: &mut Ctx<'_>) -> Option<Transition> {
        self.ticks += 1;
        self.guide.tick();
        // Nothing to say: move straight on.
        if ctx.content.dialogue.tutorial.is_empty() {
            return Some(Self::finished(ctx));
        }
        None
    }

    fn draw(&self, view: &View<'_>, surface: &mut dyn Surface) {
        surface.clear();
        surface.fill_disc(self.guide.display_pos(), 18.0, Paint::Guide);
        let lines = &view.content.dialogue.tutorial;
        if let Some(line) = lines.get(self.line) {
            surface.dialogue(&view.session.personalize(line), 1.0);
            surface.text(TextSlot::Hint, &format!("Enter to continue ({}/{})", self.line + 1, lines.len()));
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Color selection
// ══════════════════════════════════════════════════════════════

#[derive(Default)]
pub struct ColorSelectionScreen {
    pub(crate) selected: usize,
    pub(crate) ticks: u64,
}

impl ColorSelectionScreen {
    fn swatch_center(index: usize, count: usize, view_width: f32, view_height: f32) -> Vec2 {
        let spacing = view_width / (count as f32 + 1.0);
        Vec2::new(spacing * (index as f32 + 1.0), view_height / 2.0)
    }
}

impl Screen for ColorSelectionScreen {
    fn id(&self) -> ScreenId { ScreenId::ColorSelection }

    fn enter(&mut self, _payload: Payload, ctx: &mut Ctx<'_>) -> Result<(), FlowError> {
        self.ticks = 0;
        self.selected = ctx.session.color()
            .and_then(|chosen| ctx.content.palette.iter().position(|c| c == chosen))
            .unwrap_or(0);
        Ok(())
    }

    fn handle_input(&mut self, input: Input, ctx: &mut Ctx<'_>) -> Option<Transition> {
        let count = ctx.content.palette.len();
        match input {
            Input::Press(Direction::Left) | Input::Press(Direction::Up) if count > 0 => {
                self.selected = (self.selected + count - 1) % count;
                None
            }
            Input::Press(Direction::Right) | Input::Press(Direction::Down) if count > 0 => {
                self.selected = (self.selected + 1) % count;
                None
            }
            Input::Char(c) => {
                if let Some(n) = c.to_digit(10) {
                    let n = n as usize;
                    if n >= 1 && n <= count {
                        self.selected = n - 1;
                    }
                }
                None
            }
            Input::Acknowledge => {
                if let Some(color) = ctx.content.palette.get(self.selected) {
                    log::info!("light color chosen: {}", color.name);
                    ctx.session.set_color(color.clone());
                }
                Some(Transition::with(ScreenId::Level, Payload::Level(0)))
            }
            _ => None,
        }
    }

    fn update(&mut self, _ctx: &mut Ctx<'_>) -> Option<Transition> {
        self.ticks += 1;
        None
    }

    fn draw(&self, view: &View<'_>, surface: &mut dyn Surface) {
        surface.clear();
        surface.text(TextSlot::Heading, &view.session.personalize("Choose your light{name}"));

        let palette = &view.content.palette;
        let arena = view.content.arena;
        for (i, light) in palette.iter().enumerate() {
            let center = Self::swatch_center(i, palette.len(), arena.width, arena.height);
            if i == self.selected {
                surface.fill_rect(Rect::new(center.x - 30.0, center.y + 42.0, 60.0, 8.0), Paint::Cursor);
            }
            surface.fill_disc(center, 24.0, Paint::Light { color: light.color, glow: light.glow });
        }
        if let Some(light) = palette.get(self.selected) {
            surface.text(TextSlot::Line(3), &light.name);
        }
        surface.text(TextSlot::Hint, "Left/Right or 1-9 to choose, Enter to confirm");
    }
}
