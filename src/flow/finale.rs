/// Timed interludes between parts, the closing transition, and the
/// Valentine question with its celebration.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::domain::entity::Guide;
use crate::domain::physics::Arena;
use crate::ui::surface::{Paint, Surface, TextSlot};
use super::{Ctx, FlowError, Input, Payload, Screen, ScreenId, Transition, View};

/// Length of each transition stage.
pub const STAGE_TICKS: u32 = 180;
const FADE_IN_TICKS: u32 = 60;

// ══════════════════════════════════════════════════════════════
// Transition
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Route {
    Interlude { finished_part: usize, next_level: usize },
    Finale,
}

/// Two stages of text, `STAGE_TICKS` each, then on to the next screen.
///
///   Interlude: finished part's outro → next part's intro → Level(next)
///   Finale:    transition line → continued line → Valentine
pub struct TransitionScreen {
    route: Route,
    pub(crate) stage: u8,
    pub(crate) timer: u32,
    pub(crate) ticks: u64,
}

impl Default for TransitionScreen {
    fn default() -> Self {
        TransitionScreen { route: Route::Finale, stage: 0, timer: 0, ticks: 0 }
    }
}

impl Screen for TransitionScreen {
    fn id(&self) -> ScreenId { ScreenId::Transition }

    fn enter(&mut self, payload: Payload, _ctx: &mut Ctx<'_>) -> Result<(), FlowError> {
        self.route = match payload {
            Payload::Interlude { finished_part, next_level } => Route::Interlude { finished_part, next_level },
            Payload::Finale | Payload::None => Route::Finale,
            Payload::Level(_) => {
                return Err(FlowError::BadPayload { screen: ScreenId::Transition, payload });
            }
        };
        self.stage = 0;
        self.timer = 0;
        self.ticks = 0;
        Ok(())
    }

    fn handle_input(&mut self, _input: Input, _ctx: &mut Ctx<'_>) -> Option<Transition> {
        None
    }

    fn update(&mut self, _ctx: &mut Ctx<'_>) -> Option<Transition> {
        self.ticks += 1;
        self.timer += 1;
        if self.timer < STAGE_TICKS { return None; }

        if self.stage == 0 {
            self.stage = 1;
            self.timer = 0;
            return None;
        }
        match self.route {
            Route::Interlude { next_level, .. } => {
                Some(Transition::with(ScreenId::Level, Payload::Level(next_level)))
            }
            Route::Finale => Some(Transition::to(ScreenId::Valentine)),
        }
    }

    fn draw(&self, view: &View<'_>, surface: &mut dyn Surface) {
        surface.clear();
        let opacity = (self.timer as f32 / FADE_IN_TICKS as f32).min(1.0);
        let content = view.content;

        let (heading, line) = match (self.route, self.stage) {
            (Route::Interlude { finished_part, .. }, 0) => {
                let part = content.parts.get(finished_part);
                (
                    part.map(|p| format!("{} is complete", p.name)),
                    part.map(|p| p.outro.as_str()),
                )
            }
            (Route::Interlude { next_level, .. }, _) => {
                let part = content.locate(next_level).and_then(|(i, _)| content.parts.get(i));
                (part.map(|p| p.name.clone()), part.map(|p| p.intro.as_str()))
            }
            (Route::Finale, 0) => (None, Some(content.dialogue.transition.as_str())),
            (Route::Finale, _) => (None, Some(content.dialogue.transition_continued.as_str())),
        };

        if let Some(heading) = heading {
            surface.text(TextSlot::Heading, &heading);
        }
        if let Some(line) = line.filter(|l| !l.is_empty()) {
            surface.dialogue(&view.session.personalize(line), opacity);
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Valentine
// ══════════════════════════════════════════════════════════════

const HEART_EVERY: u32 = 6;
const MAX_HEARTS: usize = 40;
const HEART_SEED: u64 = 0x1402;

#[derive(Clone, Copy, Debug)]
struct FloatingHeart {
    pos: Vec2,
    rise: f32,
    phase: f32,
    size: f32,
}

/// Asks the question. Accepting starts the celebration, which never ends.
pub struct ValentineScreen {
    pub(crate) celebrating: bool,
    pub(crate) celebration_ticks: u32,
    pub(crate) ticks: u64,
    hearts: Vec<FloatingHeart>,
    rng: Pcg32,
    arena: Arena,
    guide: Guide,
}

impl Default for ValentineScreen {
    fn default() -> Self {
        ValentineScreen {
            celebrating: false,
            celebration_ticks: 0,
            ticks: 0,
            hearts: Vec::new(),
            rng: Pcg32::seed_from_u64(HEART_SEED),
            arena: Arena::new(800.0, 600.0),
            guide: Guide::new(Vec2::new(400.0, 260.0)),
        }
    }
}

impl ValentineScreen {
    pub fn is_celebrating(&self) -> bool {
        self.celebrating
    }

    fn spawn_heart(&mut self) -> FloatingHeart {
        FloatingHeart {
            pos: Vec2::new(self.rng.random_range(0.0..self.arena.width), self.arena.height + 20.0),
            rise: self.rng.random_range(0.8..2.2),
            phase: self.rng.random_range(0.0..std::f32::consts::TAU),
            size: self.rng.random_range(6.0..14.0),
        }
    }

    fn float_hearts(&mut self) {
        for heart in &mut self.hearts {
            heart.pos.y -= heart.rise;
            heart.pos.x += (self.ticks as f32 * 0.05 + heart.phase).sin() * 0.5;
        }
        // Hearts that left the top start over at the bottom.
        for i in 0..self.hearts.len() {
            if self.hearts[i].pos.y < -20.0 {
                let fresh = self.spawn_heart();
                self.hearts[i] = fresh;
            }
        }
    }
}

impl Screen for ValentineScreen {
    fn id(&self) -> ScreenId { ScreenId::Valentine }

    fn enter(&mut self, _payload: Payload, ctx: &mut Ctx<'_>) -> Result<(), FlowError> {
        let arena = ctx.content.arena;
        self.celebrating = false;
        self.celebration_ticks = 0;
        self.ticks = 0;
        self.hearts.clear();
        self.rng = Pcg32::seed_from_u64(ctx.tuning.chaser.seed ^ HEART_SEED);
        self.arena = arena;
        self.guide = Guide::new(Vec2::new(arena.width / 2.0, arena.height * 0.45));
        log::info!("reached the valentine question ({} levels completed)", ctx.session.completed_levels().len());
        Ok(())
    }

    fn handle_input(&mut self, input: Input, _ctx: &mut Ctx<'_>) -> Option<Transition> {
        let accepts = matches!(input, Input::Acknowledge | Input::Char('y') | Input::Char('Y'));
        if accepts && !self.celebrating {
            self.celebrating = true;
            log::info!("valentine accepted");
        }
        None
    }

    fn update(&mut self, _ctx: &mut Ctx<'_>) -> Option<Transition> {
        self.ticks += 1;
        self.guide.tick();
        if !self.celebrating { return None; }

        self.celebration_ticks += 1;
        if self.celebration_ticks % HEART_EVERY == 0 && self.hearts.len() < MAX_HEARTS {
            let heart = self.spawn_heart();
            self.hearts.push(heart);
        }
        self.float_hearts();
        None
    }

    fn draw(&self, view: &View<'_>, surface: &mut dyn Surface) {
        surface.clear();
        surface.fill_disc(self.guide.display_pos(), 18.0, Paint::Guide);
        let dialogue = &view.content.dialogue;

        if self.celebrating {
            for heart in &self.hearts {
                surface.fill_disc(heart.pos, heart.size, Paint::Heart);
            }
            surface.text(TextSlot::Heading, &view.session.personalize(&dialogue.celebration));
            surface.text(TextSlot::Hint, "Esc to leave the grove");
        } else {
            surface.dialogue(&view.session.personalize(&dialogue.valentine), 1.0);
            surface.text(TextSlot::Line(4), "[ Yes ]     [ Yes! ]");
            surface.text(TextSlot::Hint, "Enter or Y to answer");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Tuning;
    use crate::sim::level::Content;
    use crate::sim::session::SessionState;
    use crate::ui::surface::RecordingSurface;

    fn run<R>(f: impl FnOnce(&mut Ctx<'_>) -> R) -> R {
        let content = Content::builtin().unwrap();
        let tuning = Tuning::default();
        let mut session = SessionState::new();
        let mut ctx = Ctx { content: &content, tuning: &tuning, session: &mut session };
        f(&mut ctx)
    }

    #[test]
    fn interlude_runs_two_stages_then_next_level() {
        run(|ctx| {
            let mut s = TransitionScreen::default();
            s.enter(Payload::Interlude { finished_part: 0, next_level: 4 }, ctx).unwrap();
            for _ in 0..STAGE_TICKS - 1 {
                assert_eq!(s.update(ctx), None);
            }
            assert_eq!(s.update(ctx), None);
            assert_eq!(s.stage, 1);
            for _ in 0..STAGE_TICKS - 1 {
                assert_eq!(s.update(ctx), None);
            }
            assert_eq!(s.update(ctx), Some(Transition::with(ScreenId::Level, Payload::Level(4))));
        });
    }

    #[test]
    fn finale_ends_at_valentine() {
        run(|ctx| {
            let mut s = TransitionScreen::default();
            s.enter(Payload::Finale, ctx).unwrap();
            let mut result = None;
            for _ in 0..STAGE_TICKS * 2 {
                result = s.update(ctx);
            }
            assert_eq!(result, Some(Transition::to(ScreenId::Valentine)));
        });
    }

    #[test]
    fn transition_rejects_level_payload() {
        run(|ctx| {
            let mut s = TransitionScreen::default();
            assert!(s.enter(Payload::Level(2), ctx).is_err());
        });
    }

    #[test]
    fn finale_shows_both_lines_in_order() {
        let content = Content::builtin().unwrap();
        let tuning = Tuning::default();
        let mut session = SessionState::new();
        let mut s = TransitionScreen::default();
        {
            let mut ctx = Ctx { content: &content, tuning: &tuning, session: &mut session };
            s.enter(Payload::Finale, &mut ctx).unwrap();
        }
        let first = session.personalize(&content.dialogue.transition);
        let mut surface = RecordingSurface::default();
        s.draw(&View { content: &content, session: &session }, &mut surface);
        assert_eq!(surface.dialogues(), vec![first.as_str()]);

        {
            let mut ctx = Ctx { content: &content, tuning: &tuning, session: &mut session };
            for _ in 0..STAGE_TICKS {
                s.update(&mut ctx);
            }
        }
        let second = session.personalize(&content.dialogue.transition_continued);
        let mut surface = RecordingSurface::default();
        s.draw(&View { content: &content, session: &session }, &mut surface);
        assert_eq!(surface.dialogues(), vec![second.as_str()]);
    }

    #[test]
    fn accepting_starts_a_terminal_celebration() {
        run(|ctx| {
            let mut s = ValentineScreen::default();
            s.enter(Payload::None, ctx).unwrap();
            for _ in 0..30 {
                assert_eq!(s.update(ctx), None);
            }
            assert!(!s.is_celebrating());
            assert!(s.hearts.is_empty());

            assert_eq!(s.handle_input(Input::Char('y'), ctx), None);
            assert!(s.is_celebrating());
            for _ in 0..600 {
                assert_eq!(s.update(ctx), None);
            }
            assert_eq!(s.hearts.len(), MAX_HEARTS);
            assert!(s.hearts.iter().all(|h| h.pos.y >= -20.0));

            // Further answers change nothing.
            s.handle_input(Input::Acknowledge, ctx);
            assert_eq!(s.celebration_ticks, 600);
        });
    }

    #[test]
    fn hearts_follow_the_seed() {
        let positions = || run(|ctx| {
            let mut s = ValentineScreen::default();
            s.enter(Payload::None, ctx).unwrap();
            s.handle_input(Input::Acknowledge, ctx);
            for _ in 0..120 {
                s.update(ctx);
            }
            s.hearts.iter().map(|h| h.pos).collect::<Vec<_>>()
        });
        assert_eq!(positions(), positions());
    }
}
