/// Content table: arena, palette, dialogue, parts and their levels.
///
/// ## Sources (priority order):
///   1. `general.content_file` from config.toml, if the file exists
///   2. Built-in table embedded from `content/grove.toml`
///
/// An explicit file that fails to parse or validate is fatal; we never fall
/// back silently to the built-in table in that case.
///
/// ## Format (TOML):
///   ```toml
///   [arena]
///   width = 800.0
///   height = 600.0
///
///   [[palette]]
///   name = "Warm Gold"
///   color = "#ffd89b"
///   glow = "#fff1d6"
///
///   [dialogue]
///   tutorial = ["Welcome{name}!", "..."]
///   transition = "..."
///
///   [[parts]]
///   name = "Discovery"
///
///   [[parts.levels]]
///   name = "Morning Meadow"
///   start = { x = 100.0, y = 500.0 }
///   guide = { x = 700.0, y = 100.0 }
///   collectibles = [{ x = 200.0, y = 400.0 }]
///   obstacles = [{ x = 200.0, y = 350.0, width = 150.0, height = 20.0 }]
///   ```
///
/// Levels are addressed by a single index across all parts, in order.

use std::fmt;
use std::path::Path;

use anyhow::Context;
use glam::Vec2;
use serde::Deserialize;

use crate::config::Tuning;
use crate::domain::entity::{Axis, ItemKind};
use crate::domain::physics::{self, Arena, Rect};

const EMBEDDED: &str = include_str!("../../content/grove.toml");

// ══════════════════════════════════════════════════════════════
// Schema
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl From<Point> for Vec2 {
    fn from(p: Point) -> Vec2 {
        Vec2::new(p.x, p.y)
    }
}

/// 24-bit color parsed from `"#rrggbb"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let hex = s.strip_prefix('#').unwrap_or(&s);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("expected a #rrggbb color, got {s:?}"));
        }
        let byte = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| format!("expected a #rrggbb color, got {s:?}"))
        };
        Ok(Rgb { r: byte(0)?, g: byte(2)?, b: byte(4)? })
    }
}

/// A selectable light color.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct LightColor {
    pub name: String,
    pub color: Rgb,
    pub glow: Rgb,
}

impl Default for LightColor {
    fn default() -> Self {
        LightColor {
            name: "Warm Gold".into(),
            color: Rgb::new(0xff, 0xd8, 0x9b),
            glow: Rgb::new(0xff, 0xf1, 0xd6),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Dialogue {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tutorial: Vec<String>,
    #[serde(default)]
    pub transition: String,
    #[serde(default)]
    pub transition_continued: String,
    #[serde(default)]
    pub valentine: String,
    #[serde(default)]
    pub celebration: String,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct TimedDef {
    pub x: f32,
    pub y: f32,
    /// Ticks before the item dissolves.
    pub ticks: u32,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct PlatformDef {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub axis: Axis,
    pub from: f32,
    pub to: f32,
}

impl PlatformDef {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Every rect the platform can occupy lies inside this one.
    fn sweep(&self) -> Rect {
        let (lo, hi) = if self.from <= self.to { (self.from, self.to) } else { (self.to, self.from) };
        match self.axis {
            Axis::X => Rect::new(lo, self.y, hi - lo + self.width, self.height),
            Axis::Y => Rect::new(self.x, lo, self.width, hi - lo + self.height),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct KeyDef {
    pub x: f32,
    pub y: f32,
    pub id: u32,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct GateDef {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub key: u32,
}

impl GateDef {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct ChaserDef {
    pub x: f32,
    pub y: f32,
    pub speed: f32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LevelDef {
    pub name: String,
    pub start: Point,
    pub guide: Point,
    #[serde(default)]
    pub kind: ItemKind,
    /// Shown on entry.
    #[serde(default)]
    pub intro: String,
    /// Shown when the objective is met.
    #[serde(default)]
    pub outro: String,
    #[serde(default)]
    pub collectibles: Vec<Point>,
    #[serde(default)]
    pub bonus: Vec<Point>,
    #[serde(default)]
    pub timed: Vec<TimedDef>,
    /// Defaults to every primary collectible.
    #[serde(default)]
    pub required_count: Option<usize>,
    #[serde(default)]
    pub obstacles: Vec<Rect>,
    #[serde(default)]
    pub platforms: Vec<PlatformDef>,
    #[serde(default)]
    pub keys: Vec<KeyDef>,
    #[serde(default)]
    pub gates: Vec<GateDef>,
    #[serde(default)]
    pub fog_radius: Option<f32>,
    #[serde(default)]
    pub chaser: Option<ChaserDef>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PartDef {
    pub name: String,
    #[serde(default)]
    pub intro: String,
    #[serde(default)]
    pub outro: String,
    #[serde(default)]
    pub levels: Vec<LevelDef>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Content {
    pub arena: Arena,
    #[serde(default)]
    pub palette: Vec<LightColor>,
    #[serde(default)]
    pub dialogue: Dialogue,
    pub parts: Vec<PartDef>,
}

/// Where play goes after a level's objective is acknowledged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AfterLevel {
    /// Next level in the same part.
    Next(usize),
    /// Part finished; the next part starts at this level.
    PartEnd { finished_part: usize, next_level: usize },
    /// Last level of the last part.
    Finale,
}

// ══════════════════════════════════════════════════════════════
// Errors
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub enum ContentError {
    Parse(String),
    BadArena { width: f32, height: f32 },
    NoLevels,
    EmptyPart { part: String },
    NoCollectibles { level: String },
    RequiredTooHigh { level: String, required: usize, available: usize },
    StartOutOfArena { level: String },
    StartBlocked { level: String },
    BadObstacle { level: String, index: usize },
    BadPlatform { level: String, index: usize },
    BadGate { level: String, index: usize },
    MissingKey { level: String, key: u32 },
    BadTimer { level: String, index: usize },
    BadChaser { level: String },
    /// `what` names the list: "collectible", "bonus", "timed", "key" or "guide".
    ItemOutOfArena { level: String, what: &'static str, index: usize },
    BadFog { level: String },
}

impl fmt::Display for ContentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "content table does not parse: {msg}"),
            Self::BadArena { width, height } => {
                write!(f, "arena must have positive size, got {width}x{height}")
            }
            Self::NoLevels => write!(f, "content table has no levels"),
            Self::EmptyPart { part } => write!(f, "part {part:?} has no levels"),
            Self::NoCollectibles { level } => {
                write!(f, "level {level:?} has no collectibles to finish it")
            }
            Self::RequiredTooHigh { level, required, available } => write!(
                f,
                "level {level:?} requires {required} items but only has {available}"
            ),
            Self::StartOutOfArena { level } => {
                write!(f, "level {level:?} starts the player outside the arena")
            }
            Self::StartBlocked { level } => {
                write!(f, "level {level:?} starts the player inside a solid")
            }
            Self::BadObstacle { level, index } => {
                write!(f, "level {level:?} obstacle #{index} is empty or outside the arena")
            }
            Self::BadPlatform { level, index } => {
                write!(f, "level {level:?} platform #{index} is empty or leaves the arena")
            }
            Self::BadGate { level, index } => {
                write!(f, "level {level:?} gate #{index} is empty or outside the arena")
            }
            Self::MissingKey { level, key } => {
                write!(f, "level {level:?} has a gate for key {key} but no such key")
            }
            Self::BadTimer { level, index } => {
                write!(f, "level {level:?} timed item #{index} has a zero timer")
            }
            Self::BadChaser { level } => {
                write!(f, "level {level:?} chaser needs a positive speed inside the arena")
            }
            Self::BadFog { level } => write!(f, "level {level:?} fog radius must be positive"),
            Self::ItemOutOfArena { level, what, index } => {
                write!(f, "level {level:?} {what} #{index} lies outside the arena")
            }
        }
    }
}

impl std::error::Error for ContentError {}

// ══════════════════════════════════════════════════════════════
// Loading
// ══════════════════════════════════════════════════════════════

impl Content {
    pub fn from_toml(text: &str) -> Result<Self, ContentError> {
        toml::from_str::<Content>(text).map_err(|e| ContentError::Parse(e.to_string()))
    }

    pub fn builtin() -> Result<Self, ContentError> {
        Self::from_toml(EMBEDDED)
    }

    /// Load and validate. `path` of `None` or a missing file means built-in.
    pub fn load(path: Option<&Path>, tuning: &Tuning) -> anyhow::Result<Self> {
        let content = match path {
            Some(p) if p.is_file() => {
                let text = std::fs::read_to_string(p)
                    .with_context(|| format!("reading content file {}", p.display()))?;
                let content = Self::from_toml(&text)
                    .with_context(|| format!("loading content file {}", p.display()))?;
                log::info!("content: {} ({} levels)", p.display(), content.level_count());
                content
            }
            other => {
                if let Some(p) = other {
                    log::warn!("content file {} not found, using built-in table", p.display());
                }
                let content = Self::builtin().context("loading built-in content")?;
                log::info!("content: built-in ({} levels)", content.level_count());
                content
            }
        };
        content.validate(tuning).context("validating content")?;
        Ok(content)
    }

    // ── Queries ──

    pub fn level_count(&self) -> usize {
        self.parts.iter().map(|p| p.levels.len()).sum()
    }

    /// Part index and level for a flat level index.
    pub fn locate(&self, index: usize) -> Option<(usize, &LevelDef)> {
        let mut rest = index;
        for (pi, part) in self.parts.iter().enumerate() {
            if rest < part.levels.len() {
                return Some((pi, &part.levels[rest]));
            }
            rest -= part.levels.len();
        }
        None
    }

    pub fn level(&self, index: usize) -> Option<&LevelDef> {
        self.locate(index).map(|(_, l)| l)
    }

    /// Flat index of a part's first level.
    pub fn first_level_of(&self, part: usize) -> usize {
        self.parts.iter().take(part).map(|p| p.levels.len()).sum()
    }

    pub fn after_level(&self, index: usize) -> AfterLevel {
        let Some((part, _)) = self.locate(index) else { return AfterLevel::Finale };
        let part_end = self.first_level_of(part) + self.parts[part].levels.len();
        if index + 1 < part_end {
            AfterLevel::Next(index + 1)
        } else if part + 1 < self.parts.len() {
            AfterLevel::PartEnd { finished_part: part, next_level: part_end }
        } else {
            AfterLevel::Finale
        }
    }

    /// The palette entry used when nobody picked one.
    pub fn default_color(&self) -> LightColor {
        self.palette.first().cloned().unwrap_or_default()
    }

    // ── Validation ──

    pub fn validate(&self, tuning: &Tuning) -> Result<(), ContentError> {
        let arena = self.arena;
        if !(arena.width > 0.0 && arena.height > 0.0) {
            return Err(ContentError::BadArena { width: arena.width, height: arena.height });
        }
        if self.level_count() == 0 {
            return Err(ContentError::NoLevels);
        }
        for part in &self.parts {
            if part.levels.is_empty() {
                return Err(ContentError::EmptyPart { part: part.name.clone() });
            }
            for level in &part.levels {
                validate_level(level, arena, tuning)?;
            }
        }
        Ok(())
    }
}

fn solid_rect_ok(r: &Rect, arena: Arena) -> bool {
    r.width > 0.0 && r.height > 0.0 && arena.contains_rect(r)
}

fn validate_level(level: &LevelDef, arena: Arena, tuning: &Tuning) -> Result<(), ContentError> {
    let name = || level.name.clone();

    if level.collectibles.is_empty() {
        return Err(ContentError::NoCollectibles { level: name() });
    }
    if let Some(required) = level.required_count {
        if required == 0 || required > level.collectibles.len() {
            return Err(ContentError::RequiredTooHigh {
                level: name(),
                required,
                available: level.collectibles.len(),
            });
        }
    }

    for (index, o) in level.obstacles.iter().enumerate() {
        if !solid_rect_ok(o, arena) {
            return Err(ContentError::BadObstacle { level: name(), index });
        }
    }
    for (index, p) in level.platforms.iter().enumerate() {
        if !solid_rect_ok(&p.rect(), arena) || !arena.contains_rect(&p.sweep()) {
            return Err(ContentError::BadPlatform { level: name(), index });
        }
    }
    for (index, g) in level.gates.iter().enumerate() {
        if !solid_rect_ok(&g.rect(), arena) {
            return Err(ContentError::BadGate { level: name(), index });
        }
        if !level.keys.iter().any(|k| k.id == g.key) {
            return Err(ContentError::MissingKey { level: name(), key: g.key });
        }
    }
    for (index, t) in level.timed.iter().enumerate() {
        if t.ticks == 0 {
            return Err(ContentError::BadTimer { level: name(), index });
        }
    }
    if level.fog_radius.is_some_and(|r| r <= 0.0) {
        return Err(ContentError::BadFog { level: name() });
    }

    // Points only: pickups and the guide have no collision box.
    let points = level.collectibles.iter().map(|&p| ("collectible", Vec2::from(p)))
        .enumerate()
        .chain(level.bonus.iter().map(|&p| ("bonus", Vec2::from(p))).enumerate())
        .chain(level.timed.iter().map(|t| ("timed", Vec2::new(t.x, t.y))).enumerate())
        .chain(level.keys.iter().map(|k| ("key", Vec2::new(k.x, k.y))).enumerate())
        .chain(std::iter::once((0, ("guide", Vec2::from(level.guide)))));
    for (index, (what, pos)) in points {
        if !arena.contains(pos, 0.0) {
            return Err(ContentError::ItemOutOfArena { level: name(), what, index });
        }
    }

    let half = tuning.player.size / 2.0;
    let start = Vec2::from(level.start);
    if !arena.contains(start, half) {
        return Err(ContentError::StartOutOfArena { level: name() });
    }
    let mut solids: Vec<Rect> = level.obstacles.clone();
    solids.extend(level.gates.iter().map(GateDef::rect));
    solids.extend(level.platforms.iter().map(PlatformDef::rect));
    if physics::hits_any(start, half, &solids) {
        return Err(ContentError::StartBlocked { level: name() });
    }

    if let Some(c) = level.chaser {
        let spawn = Vec2::new(c.x, c.y);
        let chaser_half = tuning.chaser.size / 2.0;
        if c.speed <= 0.0
            || !arena.contains(spawn, chaser_half)
            || physics::hits_any(spawn, chaser_half, &solids)
        {
            return Err(ContentError::BadChaser { level: name() });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TINY: &str = r#"
        [arena]
        width = 800.0
        height = 600.0

        [[parts]]
        name = "One"
        [[parts.levels]]
        name = "A"
        start = { x = 100.0, y = 100.0 }
        guide = { x = 700.0, y = 100.0 }
        collectibles = [{ x = 200.0, y = 200.0 }, { x = 300.0, y = 200.0 }]
        [[parts.levels]]
        name = "B"
        start = { x = 100.0, y = 100.0 }
        guide = { x = 700.0, y = 100.0 }
        collectibles = [{ x = 200.0, y = 200.0 }]

        [[parts]]
        name = "Two"
        [[parts.levels]]
        name = "C"
        start = { x = 100.0, y = 100.0 }
        guide = { x = 700.0, y = 100.0 }
        collectibles = [{ x = 200.0, y = 200.0 }]
    "#;

    fn tiny() -> Content {
        Content::from_toml(TINY).unwrap()
    }

    fn first_level_mut(c: &mut Content) -> &mut LevelDef {
        &mut c.parts[0].levels[0]
    }

    #[test]
    fn builtin_table_is_valid() {
        let c = Content::builtin().unwrap();
        c.validate(&Tuning::default()).unwrap();
        assert_eq!(c.parts.len(), 3);
        assert_eq!(c.level_count(), 12);
        assert!(!c.palette.is_empty());
        assert!(!c.dialogue.tutorial.is_empty());
    }

    #[test]
    fn flat_indexing_crosses_parts() {
        let c = tiny();
        assert_eq!(c.level_count(), 3);
        assert_eq!(c.level(1).map(|l| l.name.as_str()), Some("B"));
        assert_eq!(c.locate(2).map(|(p, l)| (p, l.name.as_str())), Some((1, "C")));
        assert!(c.level(3).is_none());
        assert_eq!(c.first_level_of(1), 2);
    }

    #[test]
    fn after_level_walks_parts_then_finale() {
        let c = tiny();
        assert_eq!(c.after_level(0), AfterLevel::Next(1));
        assert_eq!(c.after_level(1), AfterLevel::PartEnd { finished_part: 0, next_level: 2 });
        assert_eq!(c.after_level(2), AfterLevel::Finale);
    }

    #[test]
    fn rgb_parses_hex() {
        assert_eq!(Rgb::try_from("#ff8000".to_string()), Ok(Rgb::new(255, 128, 0)));
        assert!(Rgb::try_from("#ff80".to_string()).is_err());
        assert!(Rgb::try_from("#gg0000".to_string()).is_err());
        assert!(Rgb::try_from("#+1+2+3".to_string()).is_err());
    }

    #[test]
    fn bad_color_is_parse_error() {
        let text = format!("{TINY}\n[[palette]]\nname = \"x\"\ncolor = \"red\"\nglow = \"#000000\"\n");
        assert!(matches!(Content::from_toml(&text), Err(ContentError::Parse(_))));
    }

    #[test]
    fn default_color_without_palette() {
        assert_eq!(tiny().default_color(), LightColor::default());
    }

    #[test]
    fn rejects_required_count_above_available() {
        let mut c = tiny();
        first_level_mut(&mut c).required_count = Some(3);
        assert!(matches!(
            c.validate(&Tuning::default()),
            Err(ContentError::RequiredTooHigh { required: 3, available: 2, .. })
        ));
    }

    #[test]
    fn rejects_start_inside_obstacle() {
        let mut c = tiny();
        first_level_mut(&mut c).obstacles.push(Rect::new(90.0, 90.0, 20.0, 20.0));
        assert!(matches!(c.validate(&Tuning::default()), Err(ContentError::StartBlocked { .. })));
    }

    #[test]
    fn rejects_gate_without_key() {
        let mut c = tiny();
        first_level_mut(&mut c).gates.push(GateDef { x: 400.0, y: 0.0, width: 20.0, height: 100.0, key: 7 });
        assert!(matches!(c.validate(&Tuning::default()), Err(ContentError::MissingKey { key: 7, .. })));
    }

    #[test]
    fn rejects_obstacle_outside_arena() {
        let mut c = tiny();
        first_level_mut(&mut c).obstacles.push(Rect::new(790.0, 0.0, 50.0, 10.0));
        assert!(matches!(c.validate(&Tuning::default()), Err(ContentError::BadObstacle { index: 0, .. })));
    }

    #[test]
    fn rejects_pickups_outside_arena() {
        let mut c = tiny();
        first_level_mut(&mut c).collectibles.push(Point { x: 5000.0, y: -3000.0 });
        assert!(matches!(
            c.validate(&Tuning::default()),
            Err(ContentError::ItemOutOfArena { what: "collectible", index: 2, .. })
        ));

        let mut c = tiny();
        first_level_mut(&mut c).keys.push(KeyDef { x: 9000.0, y: 9000.0, id: 1 });
        assert!(matches!(
            c.validate(&Tuning::default()),
            Err(ContentError::ItemOutOfArena { what: "key", index: 0, .. })
        ));

        let mut c = tiny();
        first_level_mut(&mut c).guide = Point { x: 801.0, y: 100.0 };
        assert!(matches!(
            c.validate(&Tuning::default()),
            Err(ContentError::ItemOutOfArena { what: "guide", .. })
        ));
    }

    #[test]
    fn pickups_on_the_arena_edge_are_fine() {
        let mut c = tiny();
        let level = first_level_mut(&mut c);
        level.bonus.push(Point { x: 0.0, y: 600.0 });
        level.timed.push(TimedDef { x: 800.0, y: 0.0, ticks: 30 });
        c.validate(&Tuning::default()).unwrap();
    }

    #[test]
    fn rejects_platform_sweeping_out() {
        let mut c = tiny();
        first_level_mut(&mut c).platforms.push(PlatformDef {
            x: 600.0, y: 300.0, width: 80.0, height: 15.0,
            axis: Axis::X, from: 600.0, to: 760.0,
        });
        assert!(matches!(c.validate(&Tuning::default()), Err(ContentError::BadPlatform { .. })));
    }

    #[test]
    fn rejects_empty_part() {
        let mut c = tiny();
        c.parts[1].levels.clear();
        assert!(matches!(c.validate(&Tuning::default()), Err(ContentError::EmptyPart { .. })));
    }

    #[test]
    fn missing_file_falls_back_to_builtin() {
        let c = Content::load(Some(Path::new("/nonexistent/grove.toml")), &Tuning::default()).unwrap();
        assert_eq!(c.level_count(), 12);
    }

    #[test]
    fn error_messages_name_the_level() {
        let e = ContentError::StartBlocked { level: "Morning Meadow".into() };
        assert!(e.to_string().contains("Morning Meadow"));
    }
}
