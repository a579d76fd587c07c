/// LevelWorld: everything alive inside one level.
///
/// Built from a `LevelDef` when the level screen is entered, mutated only by
/// `sim::step`, dropped when the screen leaves. The definition's initial
/// configuration is kept (start position, item lifetimes, platform origins,
/// chaser spawn) so `step::restart_level` can put everything back.
///
/// ## Solids
///
/// What blocks movement is composed at query time:
///   - `obstacles`: static, never change after load
///   - `gates`: solid while closed
///   - `platforms`: solid, moving
/// `solids()` returns the current union.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::config::Tuning;
use crate::domain::entity::{
    Chaser, Collectible, Gate, Guide, ItemKind, ItemRole, LevelKey, MovingPlatform, Player,
};
use crate::domain::physics::{Arena, Rect};
use crate::domain::rules;
use super::level::{LevelDef, LightColor};

pub struct LevelWorld {
    pub index: usize,
    pub name: String,
    pub kind: ItemKind,
    pub arena: Arena,
    pub obstacles: Vec<Rect>,
    pub gates: Vec<Gate>,
    pub platforms: Vec<MovingPlatform>,
    pub player: Player,
    pub chaser: Option<Chaser>,
    pub guide: Guide,
    pub items: Vec<Collectible>,
    pub keys: Vec<LevelKey>,
    pub fog_radius: Option<f32>,
    /// Required items needed to finish.
    pub required: usize,
    pub complete: bool,
    pub player_has_moved: bool,
    /// Times the level was reset by hostile contact.
    pub resets: u32,
    pub light: LightColor,
    pub tuning: Tuning,
    pub(super) start: Vec2,
    pub(super) seed: u64,
    pub(super) rng: Pcg32,
}

impl LevelWorld {
    pub fn new(index: usize, def: &LevelDef, arena: Arena, light: LightColor, tuning: &Tuning) -> Self {
        let start = Vec2::from(def.start);

        let mut items: Vec<Collectible> = def.collectibles.iter()
            .map(|p| Collectible::new(Vec2::from(*p), ItemRole::Required))
            .collect();
        items.extend(def.bonus.iter().map(|p| Collectible::new(Vec2::from(*p), ItemRole::Bonus)));
        items.extend(def.timed.iter().map(|t| Collectible::timed(Vec2::new(t.x, t.y), t.ticks)));

        let seed = level_seed(tuning.chaser.seed, index);

        LevelWorld {
            index,
            name: def.name.clone(),
            kind: def.kind,
            arena,
            obstacles: def.obstacles.clone(),
            gates: def.gates.iter()
                .map(|g| Gate { rect: g.rect(), key_id: g.key, open: false })
                .collect(),
            platforms: def.platforms.iter()
                .map(|p| MovingPlatform::new(p.rect(), p.axis, p.from, p.to))
                .collect(),
            player: Player::new(start, tuning.player.size),
            chaser: def.chaser.map(|c| Chaser::new(Vec2::new(c.x, c.y), c.speed, &tuning.chaser)),
            guide: Guide::new(Vec2::from(def.guide)),
            items,
            keys: def.keys.iter()
                .map(|k| LevelKey { pos: Vec2::new(k.x, k.y), id: k.id, collected: false })
                .collect(),
            fog_radius: def.fog_radius,
            required: rules::required_threshold(def.required_count, def.collectibles.len()),
            complete: false,
            player_has_moved: false,
            resets: 0,
            light,
            tuning: tuning.clone(),
            start,
            seed,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn start(&self) -> Vec2 {
        self.start
    }

    /// Everything that blocks movement right now.
    pub fn solids(&self) -> Vec<Rect> {
        let mut solids = self.obstacles.clone();
        solids.extend(self.gates.iter().filter(|g| !g.open).map(|g| g.rect));
        solids.extend(self.platforms.iter().map(|p| p.rect));
        solids
    }

    pub fn collected_required(&self) -> usize {
        rules::collected_required(&self.items)
    }

    pub fn collected_total(&self) -> usize {
        self.items.iter().filter(|c| c.is_collected()).count()
    }
}

/// Per-level RNG seed so each level has its own reproducible stream.
fn level_seed(base: u64, index: usize) -> u64 {
    base ^ (index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}
