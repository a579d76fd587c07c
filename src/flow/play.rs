/// The level screen: hosts one `LevelWorld`, feeds it held keys every tick,
/// and turns simulation events into session updates and transitions.
///
/// ## Phases
///
///   Playing  ─LevelComplete→  Complete ─ack→ (next level | interlude | finale)
///
/// While Playing the level intro is shown until the player has been moving
/// for `LINGER_TICKS`, then fades over `FADE_TICKS`. Acknowledge hides it at
/// once. While Complete the world is frozen and the outro is shown.

use crate::domain::entity::{HeldKeys, ItemRole};
use crate::sim::event::GameEvent;
use crate::sim::level::AfterLevel;
use crate::sim::step;
use crate::sim::world::LevelWorld;
use crate::ui::surface::{Paint, Surface, TextSlot};
use super::{Ctx, FlowError, Input, Payload, Screen, ScreenId, Transition, View};

const LINGER_TICKS: u32 = 120;
const FADE_TICKS: u32 = 60;
const GUIDE_RADIUS: f32 = 18.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LevelPhase {
    #[default]
    Playing,
    Complete,
}

// ── Intro dialogue fade ──

#[derive(Clone, Copy, Debug, Default)]
pub struct IntroFade {
    moving_ticks: u32,
    dismissed: bool,
}

impl IntroFade {
    /// Count a tick; only ticks after the player started moving count.
    pub fn tick(&mut self, player_has_moved: bool) {
        if player_has_moved {
            self.moving_ticks = self.moving_ticks.saturating_add(1);
        }
    }

    pub fn dismiss(&mut self) {
        self.dismissed = true;
    }

    pub fn opacity(&self) -> f32 {
        if self.dismissed { return 0.0; }
        if self.moving_ticks <= LINGER_TICKS { return 1.0; }
        let faded = (self.moving_ticks - LINGER_TICKS) as f32 / FADE_TICKS as f32;
        (1.0 - faded).max(0.0)
    }

    pub fn visible(&self) -> bool {
        self.opacity() > 0.0
    }
}

// ══════════════════════════════════════════════════════════════
// Screen
// ══════════════════════════════════════════════════════════════

#[derive(Default)]
pub struct LevelScreen {
    pub(crate) index: usize,
    pub(crate) world: Option<LevelWorld>,
    pub(crate) keys: HeldKeys,
    pub(crate) intro: IntroFade,
    pub(crate) phase: LevelPhase,
    pub(crate) ticks: u64,
}

impl LevelScreen {
    fn proceed(&self, ctx: &Ctx<'_>) -> Transition {
        match ctx.content.after_level(self.index) {
            AfterLevel::Next(next) => Transition::with(ScreenId::Level, Payload::Level(next)),
            AfterLevel::PartEnd { finished_part, next_level } => Transition::with(
                ScreenId::Transition,
                Payload::Interlude { finished_part, next_level },
            ),
            AfterLevel::Finale => Transition::with(ScreenId::Transition, Payload::Finale),
        }
    }

    fn record(&mut self, event: GameEvent, ctx: &mut Ctx<'_>) {
        let Some(world) = self.world.as_ref() else { return };
        match event {
            GameEvent::LevelComplete => {
                ctx.session.mark_completed(self.index);
                self.phase = LevelPhase::Complete;
                log::info!(
                    "level {} \"{}\" complete ({} of {} items, {} resets)",
                    self.index, world.name, world.collected_total(), world.items.len(), world.resets,
                );
            }
            GameEvent::HostileContact => {
                log::info!("level {} reset by contact (reset #{})", self.index, world.resets);
            }
            GameEvent::ChaserWoke => log::debug!("chaser woke in level {}", self.index),
            GameEvent::ItemCollected { index, role } => {
                log::debug!("collected item {index} ({role:?})");
            }
            GameEvent::ItemDissolved { index } => log::debug!("item {index} dissolved"),
            GameEvent::KeyCollected { id } => log::debug!("key {id} collected"),
            GameEvent::GateOpened { key_id } => log::debug!("gate {key_id} opened"),
        }
    }
}

impl Screen for LevelScreen {
    fn id(&self) -> ScreenId { ScreenId::Level }

    fn enter(&mut self, payload: Payload, ctx: &mut Ctx<'_>) -> Result<(), FlowError> {
        let index = match payload {
            Payload::Level(i) => i,
            Payload::None => 0,
            other => return Err(FlowError::BadPayload { screen: ScreenId::Level, payload: other }),
        };
        let def = ctx.content.level(index).ok_or(FlowError::UnknownLevel(index))?;
        let light = ctx.session.color_or(&ctx.content.default_color());

        log::info!("entering level {index} \"{}\"", def.name);
        self.world = Some(LevelWorld::new(index, def, ctx.content.arena, light, ctx.tuning));
        self.index = index;
        self.keys = HeldKeys::default();
        self.intro = IntroFade::default();
        self.phase = LevelPhase::Playing;
        self.ticks = 0;
        Ok(())
    }

    fn handle_input(&mut self, input: Input, ctx: &mut Ctx<'_>) -> Option<Transition> {
        match input {
            Input::Press(dir) => self.keys.set(dir, true),
            Input::Release(dir) => self.keys.set(dir, false),
            Input::Acknowledge => match self.phase {
                LevelPhase::Complete => return Some(self.proceed(ctx)),
                LevelPhase::Playing => self.intro.dismiss(),
            },
            Input::Char(_) | Input::Backspace => {}
        }
        None
    }

    fn update(&mut self, ctx: &mut Ctx<'_>) -> Option<Transition> {
        self.ticks += 1;
        let world = self.world.as_mut()?;
        if self.phase == LevelPhase::Complete {
            world.guide.tick();
            return None;
        }

        let events = step::step(world, self.keys);
        self.intro.tick(world.player_has_moved);
        for event in events {
            self.record(event, ctx);
        }
        None
    }

    fn draw(&self, view: &View<'_>, surface: &mut dyn Surface) {
        surface.clear();
        let Some(w) = self.world.as_ref() else { return };

        // ── Scenery ──
        for rect in &w.obstacles {
            surface.fill_rect(*rect, Paint::Obstacle);
        }
        for gate in w.gates.iter().filter(|g| !g.open) {
            surface.fill_rect(gate.rect, Paint::Gate);
        }
        for platform in &w.platforms {
            surface.fill_rect(platform.rect, Paint::Platform);
        }

        // ── Pickups ──
        let pickups = &w.tuning.pickups;
        for key in w.keys.iter().filter(|k| !k.collected) {
            surface.fill_disc(key.pos, pickups.key_size / 2.0, Paint::Key);
        }
        for item in w.items.iter().filter(|c| c.is_available()) {
            let paint = Paint::Item { kind: w.kind, role: item.role, dissolving: item.is_dissolving() };
            surface.fill_disc(item.pos, pickups.collectible_size / 2.0, paint);
        }

        // ── Actors ──
        surface.fill_disc(w.guide.display_pos(), GUIDE_RADIUS, Paint::Guide);
        let trail_len = w.player.trail.len().max(1) as f32;
        for (i, pos) in w.player.trail.iter().enumerate() {
            let radius = w.player.half() * (i as f32 + 1.0) / trail_len * 0.6;
            surface.fill_disc(*pos, radius, Paint::Trail(w.light.glow));
        }
        if let Some(chaser) = w.chaser.as_ref() {
            surface.fill_disc(chaser.pos, chaser.half(), Paint::Chaser);
        }
        surface.fill_disc(
            w.player.pos,
            w.player.half(),
            Paint::Light { color: w.light.color, glow: w.light.glow },
        );
        if let Some(radius) = w.fog_radius {
            surface.fog(w.player.pos, radius);
        }

        // ── Text ──
        let part = view.content.locate(self.index)
            .and_then(|(p, _)| view.content.parts.get(p))
            .map(|p| p.name.as_str())
            .unwrap_or_default();
        let bonus = w.items.iter()
            .filter(|c| c.is_collected() && c.role != ItemRole::Required)
            .count();
        let mut hud = format!(
            "{part} · {}   Collected: {}/{}",
            w.name, w.collected_required().min(w.required), w.required,
        );
        if bonus > 0 {
            hud.push_str(&format!("   bonus {bonus}"));
        }
        surface.text(TextSlot::Hud, &hud);

        let def = view.content.level(self.index);
        match self.phase {
            LevelPhase::Playing => {
                if let Some(def) = def.filter(|_| self.intro.visible()) {
                    surface.dialogue(&view.session.personalize(&def.intro), self.intro.opacity());
                }
                surface.text(TextSlot::Hint, "Arrows/WASD move · Enter hides text · Esc quits");
            }
            LevelPhase::Complete => {
                if let Some(def) = def {
                    surface.dialogue(&view.session.personalize(&def.outro), 1.0);
                }
                surface.text(TextSlot::Hint, "Press Enter to continue");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Tuning;
    use crate::domain::entity::Direction;
    use crate::sim::level::Content;
    use crate::sim::session::SessionState;
    use crate::ui::surface::RecordingSurface;

    struct Rig {
        content: Content,
        tuning: Tuning,
        session: SessionState,
    }

    impl Rig {
        fn new() -> Self {
            Rig { content: Content::builtin().unwrap(), tuning: Tuning::default(), session: SessionState::new() }
        }

        fn ctx(&mut self) -> Ctx<'_> {
            Ctx { content: &self.content, tuning: &self.tuning, session: &mut self.session }
        }
    }

    /// Drop every required item on the player so the next tick finishes the level.
    fn gather_all(screen: &mut LevelScreen) {
        let world = screen.world.as_mut().unwrap();
        let at = world.player.pos;
        for item in world.items.iter_mut().filter(|c| c.role == ItemRole::Required) {
            item.pos = at;
        }
    }

    fn finish(screen: &mut LevelScreen, rig: &mut Rig) {
        gather_all(screen);
        screen.update(&mut rig.ctx());
        assert_eq!(screen.phase, LevelPhase::Complete);
    }

    #[test]
    fn unknown_level_is_an_error() {
        let mut rig = Rig::new();
        let mut s = LevelScreen::default();
        let err = s.enter(Payload::Level(99), &mut rig.ctx()).unwrap_err();
        assert_eq!(err, FlowError::UnknownLevel(99));
    }

    #[test]
    fn finale_payload_is_rejected() {
        let mut rig = Rig::new();
        let mut s = LevelScreen::default();
        assert!(matches!(
            s.enter(Payload::Finale, &mut rig.ctx()),
            Err(FlowError::BadPayload { screen: ScreenId::Level, .. }),
        ));
    }

    #[test]
    fn completion_marks_session_and_waits_for_ack() {
        let mut rig = Rig::new();
        let mut s = LevelScreen::default();
        s.enter(Payload::Level(0), &mut rig.ctx()).unwrap();
        finish(&mut s, &mut rig);
        assert_eq!(rig.session.completed_levels(), &[0]);

        // Frozen until acknowledged.
        assert_eq!(s.update(&mut rig.ctx()), None);
        let t = s.handle_input(Input::Acknowledge, &mut rig.ctx());
        assert_eq!(t, Some(Transition::with(ScreenId::Level, Payload::Level(1))));
    }

    #[test]
    fn last_level_of_a_part_goes_to_interlude() {
        let mut rig = Rig::new();
        let last_of_first = rig.content.parts[0].levels.len() - 1;
        let mut s = LevelScreen::default();
        s.enter(Payload::Level(last_of_first), &mut rig.ctx()).unwrap();
        finish(&mut s, &mut rig);
        let t = s.handle_input(Input::Acknowledge, &mut rig.ctx());
        assert_eq!(t, Some(Transition::with(
            ScreenId::Transition,
            Payload::Interlude { finished_part: 0, next_level: last_of_first + 1 },
        )));
    }

    #[test]
    fn last_level_goes_to_finale() {
        let mut rig = Rig::new();
        let last = rig.content.level_count() - 1;
        let mut s = LevelScreen::default();
        s.enter(Payload::Level(last), &mut rig.ctx()).unwrap();
        finish(&mut s, &mut rig);
        let t = s.handle_input(Input::Acknowledge, &mut rig.ctx());
        assert_eq!(t, Some(Transition::with(ScreenId::Transition, Payload::Finale)));
    }

    #[test]
    fn acknowledge_while_playing_only_hides_intro() {
        let mut rig = Rig::new();
        let mut s = LevelScreen::default();
        s.enter(Payload::Level(0), &mut rig.ctx()).unwrap();
        assert!(s.intro.visible());
        assert_eq!(s.handle_input(Input::Acknowledge, &mut rig.ctx()), None);
        assert!(!s.intro.visible());
        assert_eq!(s.phase, LevelPhase::Playing);
    }

    #[test]
    fn held_keys_drive_the_player_and_clear_on_enter() {
        let mut rig = Rig::new();
        let mut s = LevelScreen::default();
        s.enter(Payload::Level(0), &mut rig.ctx()).unwrap();
        let start = s.world.as_ref().unwrap().player.pos;
        s.handle_input(Input::Press(Direction::Right), &mut rig.ctx());
        for _ in 0..10 {
            s.update(&mut rig.ctx());
        }
        assert!(s.world.as_ref().unwrap().player.pos.x > start.x);

        s.enter(Payload::Level(1), &mut rig.ctx()).unwrap();
        assert_eq!(s.keys, HeldKeys::default());
    }

    #[test]
    fn intro_lingers_then_fades() {
        let mut fade = IntroFade::default();
        for _ in 0..500 {
            fade.tick(false);
        }
        assert_eq!(fade.opacity(), 1.0);
        for _ in 0..LINGER_TICKS {
            fade.tick(true);
        }
        assert_eq!(fade.opacity(), 1.0);
        for _ in 0..FADE_TICKS / 2 {
            fade.tick(true);
        }
        assert!((fade.opacity() - 0.5).abs() < 1e-4);
        for _ in 0..FADE_TICKS {
            fade.tick(true);
        }
        assert!(!fade.visible());
    }

    #[test]
    fn draw_shows_hud_and_outro_after_completion() {
        let mut rig = Rig::new();
        rig.session.set_name("Robin");
        let mut s = LevelScreen::default();
        s.enter(Payload::Level(0), &mut rig.ctx()).unwrap();

        let mut surface = RecordingSurface::default();
        s.draw(&View { content: &rig.content, session: &rig.session }, &mut surface);
        let hud = surface.texts(TextSlot::Hud);
        assert_eq!(hud.len(), 1);
        assert!(hud[0].contains("Collected: 0/"));
        let items = surface.count_paint(|p| matches!(p, Paint::Item { .. }));
        assert_eq!(items, s.world.as_ref().unwrap().items.len());

        finish(&mut s, &mut rig);
        let mut surface = RecordingSurface::default();
        s.draw(&View { content: &rig.content, session: &rig.session }, &mut surface);
        let outro = rig.session.personalize(&rig.content.level(0).unwrap().outro);
        assert_eq!(surface.dialogues(), vec![outro.as_str()]);
    }
}
