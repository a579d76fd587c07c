/// FlowController: owns content, tuning, the session and every screen, and
/// makes exactly one screen active at a time.
///
/// Input, updates and drawing go to the active screen only. A screen asks
/// for a change by returning a `Transition`; `change_screen` swaps the
/// active id and calls `enter` on the new screen with the payload.

use crate::config::Tuning;
use crate::sim::level::Content;
use crate::sim::session::SessionState;
use crate::ui::surface::Surface;
use super::finale::{TransitionScreen, ValentineScreen};
use super::menus::{ColorSelectionScreen, NameInputScreen, TitleScreen, TutorialScreen};
use super::play::LevelScreen;
use super::{Ctx, FlowError, Input, Screen, ScreenId, Transition, View};

#[derive(Default)]
struct Screens {
    title: TitleScreen,
    name_input: NameInputScreen,
    tutorial: TutorialScreen,
    color: ColorSelectionScreen,
    level: LevelScreen,
    transition: TransitionScreen,
    valentine: ValentineScreen,
}

impl Screens {
    fn get(&self, id: ScreenId) -> &dyn Screen {
        match id {
            ScreenId::Title => &self.title,
            ScreenId::NameInput => &self.name_input,
            ScreenId::Tutorial => &self.tutorial,
            ScreenId::ColorSelection => &self.color,
            ScreenId::Level => &self.level,
            ScreenId::Transition => &self.transition,
            ScreenId::Valentine => &self.valentine,
        }
    }

    fn get_mut(&mut self, id: ScreenId) -> &mut dyn Screen {
        match id {
            ScreenId::Title => &mut self.title,
            ScreenId::NameInput => &mut self.name_input,
            ScreenId::Tutorial => &mut self.tutorial,
            ScreenId::ColorSelection => &mut self.color,
            ScreenId::Level => &mut self.level,
            ScreenId::Transition => &mut self.transition,
            ScreenId::Valentine => &mut self.valentine,
        }
    }
}

pub struct FlowController {
    content: Content,
    tuning: Tuning,
    session: SessionState,
    screens: Screens,
    current: ScreenId,
    ticks: u64,
}

impl FlowController {
    /// Build every screen and enter Title.
    pub fn new(content: Content, tuning: Tuning) -> Result<Self, FlowError> {
        let mut flow = FlowController {
            content,
            tuning,
            session: SessionState::new(),
            screens: Screens::default(),
            current: ScreenId::Title,
            ticks: 0,
        };
        flow.change_screen(Transition::to(ScreenId::Title))?;
        Ok(flow)
    }

    pub fn current(&self) -> ScreenId {
        self.current
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// True once the valentine question has been answered.
    pub fn is_celebrating(&self) -> bool {
        self.current == ScreenId::Valentine && self.screens.valentine.is_celebrating()
    }

    pub fn handle_input(&mut self, input: Input) -> Result<(), FlowError> {
        let mut ctx = Ctx { content: &self.content, tuning: &self.tuning, session: &mut self.session };
        let next = self.screens.get_mut(self.current).handle_input(input, &mut ctx);
        match next {
            Some(t) => self.change_screen(t),
            None => Ok(()),
        }
    }

    /// One fixed tick of the active screen.
    pub fn update(&mut self) -> Result<(), FlowError> {
        self.ticks += 1;
        let mut ctx = Ctx { content: &self.content, tuning: &self.tuning, session: &mut self.session };
        let next = self.screens.get_mut(self.current).update(&mut ctx);
        match next {
            Some(t) => self.change_screen(t),
            None => Ok(()),
        }
    }

    pub fn draw(&self, surface: &mut dyn Surface) {
        let view = View { content: &self.content, session: &self.session };
        self.screens.get(self.current).draw(&view, surface);
    }

    /// Make `t.to` the active screen and enter it with the payload.
    /// On failure the previous screen stays active.
    pub fn change_screen(&mut self, t: Transition) -> Result<(), FlowError> {
        let mut ctx = Ctx { content: &self.content, tuning: &self.tuning, session: &mut self.session };
        let screen = self.screens.get_mut(t.to);
        screen.enter(t.payload, &mut ctx)?;
        log::info!("screen {:?} -> {:?} ({:?})", self.current, screen.id(), t.payload);
        self.current = t.to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{Direction, ItemRole};
    use crate::flow::finale::STAGE_TICKS;
    use crate::flow::play::LevelPhase;
    use crate::flow::Payload;
    use crate::ui::surface::{RecordingSurface, TextSlot};

    fn controller() -> FlowController {
        FlowController::new(Content::builtin().unwrap(), Tuning::default()).unwrap()
    }

    fn type_text(flow: &mut FlowController, text: &str) {
        for c in text.chars() {
            flow.handle_input(Input::Char(c)).unwrap();
        }
    }

    /// Put every required item under the player and tick once.
    fn finish_level(flow: &mut FlowController) {
        assert_eq!(flow.current(), ScreenId::Level);
        let world = flow.screens.level.world.as_mut().unwrap();
        let at = world.player.pos;
        for item in world.items.iter_mut().filter(|c| c.role == ItemRole::Required) {
            item.pos = at;
        }
        flow.update().unwrap();
        assert_eq!(flow.screens.level.phase, LevelPhase::Complete);
    }

    fn through_tutorial(flow: &mut FlowController) {
        while flow.current() == ScreenId::Tutorial {
            flow.handle_input(Input::Acknowledge).unwrap();
        }
    }

    #[test]
    fn starts_on_title() {
        let flow = controller();
        assert_eq!(flow.current(), ScreenId::Title);
        assert!(flow.session().name().is_none());
    }

    #[test]
    fn only_the_active_screen_ticks_or_hears_input() {
        let mut flow = controller();
        for _ in 0..10 {
            flow.update().unwrap();
        }
        assert_eq!(flow.screens.title.ticks, 10);
        assert_eq!(flow.screens.name_input.ticks, 0);
        assert_eq!(flow.screens.level.ticks, 0);
        assert_eq!(flow.screens.valentine.ticks, 0);

        flow.handle_input(Input::Acknowledge).unwrap();
        assert_eq!(flow.current(), ScreenId::NameInput);
        type_text(&mut flow, "x");
        flow.update().unwrap();
        assert_eq!(flow.screens.name_input.buffer, "x");
        assert_eq!(flow.screens.name_input.ticks, 1);
        assert_eq!(flow.screens.title.ticks, 10);
        assert_eq!(flow.screens.color.selected, 0);

        let mut surface = RecordingSurface::default();
        flow.draw(&mut surface);
        assert_eq!(surface.texts(TextSlot::Heading), vec!["What should I call you?"]);
    }

    #[test]
    fn onboarding_records_name_and_color() {
        let mut flow = controller();
        flow.handle_input(Input::Acknowledge).unwrap();
        type_text(&mut flow, "Robin");
        flow.handle_input(Input::Acknowledge).unwrap();
        assert_eq!(flow.current(), ScreenId::Tutorial);
        through_tutorial(&mut flow);
        assert_eq!(flow.current(), ScreenId::ColorSelection);

        flow.handle_input(Input::Press(Direction::Right)).unwrap();
        flow.handle_input(Input::Acknowledge).unwrap();
        assert_eq!(flow.current(), ScreenId::Level);
        assert_eq!(flow.screens.level.index, 0);
        assert_eq!(flow.session().name(), Some("Robin"));
        assert_eq!(flow.session().color().map(|c| c.name.as_str()), Some("Rose Blush"));

        let light = &flow.screens.level.world.as_ref().unwrap().light;
        assert_eq!(light.name, "Rose Blush");
    }

    #[test]
    fn empty_palette_skips_color_selection() {
        let mut content = Content::builtin().unwrap();
        content.palette.clear();
        let mut flow = FlowController::new(content, Tuning::default()).unwrap();
        flow.handle_input(Input::Acknowledge).unwrap();
        flow.handle_input(Input::Acknowledge).unwrap();
        through_tutorial(&mut flow);
        assert_eq!(flow.current(), ScreenId::Level);
        assert!(flow.session().color().is_none());
    }

    #[test]
    fn bad_transition_keeps_current_screen() {
        let mut flow = controller();
        let err = flow.change_screen(Transition::with(ScreenId::Level, Payload::Level(99)));
        assert_eq!(err, Err(FlowError::UnknownLevel(99)));
        assert_eq!(flow.current(), ScreenId::Title);
    }

    #[test]
    fn full_journey_reaches_the_celebration() {
        let mut flow = controller();
        flow.handle_input(Input::Acknowledge).unwrap();
        type_text(&mut flow, "Robin");
        flow.handle_input(Input::Acknowledge).unwrap();
        through_tutorial(&mut flow);
        flow.handle_input(Input::Acknowledge).unwrap();

        let total = flow.content.level_count();
        let mut interludes = 0;
        for level in 0..total {
            assert_eq!(flow.current(), ScreenId::Level);
            assert_eq!(flow.screens.level.index, level);
            finish_level(&mut flow);
            flow.handle_input(Input::Acknowledge).unwrap();

            if flow.current() == ScreenId::Transition {
                if level + 1 < total {
                    interludes += 1;
                }
                for _ in 0..STAGE_TICKS * 2 {
                    flow.update().unwrap();
                }
            }
        }
        assert_eq!(interludes, flow.content.parts.len() - 1);
        assert_eq!(flow.current(), ScreenId::Valentine);
        assert_eq!(flow.session().completed_levels().len(), total);

        assert!(!flow.is_celebrating());
        flow.handle_input(Input::Acknowledge).unwrap();
        assert!(flow.is_celebrating());
        for _ in 0..100 {
            flow.update().unwrap();
        }
        assert_eq!(flow.current(), ScreenId::Valentine);
        assert!(flow.is_celebrating());
    }

    #[test]
    fn hostile_contact_stays_on_the_level() {
        let mut flow = controller();
        let winding = (0..flow.content.level_count())
            .find(|&i| flow.content.level(i).is_some_and(|l| l.chaser.is_some()))
            .unwrap();
        flow.change_screen(Transition::with(ScreenId::Level, Payload::Level(winding))).unwrap();

        let world = flow.screens.level.world.as_mut().unwrap();
        world.player_has_moved = true;
        let chaser = world.chaser.as_mut().unwrap();
        chaser.activate();
        chaser.pos = world.player.pos;
        flow.update().unwrap();

        assert_eq!(flow.current(), ScreenId::Level);
        let world = flow.screens.level.world.as_ref().unwrap();
        assert_eq!(world.resets, 1);
        assert_eq!(world.player.pos, world.start());
    }
}
