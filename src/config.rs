/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub tuning: Tuning,
    pub general: GeneralConfig,
    /// Where the settings came from, for the startup log line.
    pub source: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct GeneralConfig {
    /// External content table. `None` (or a missing file) means the built-in one.
    pub content_file: Option<PathBuf>,
    pub log_file: PathBuf,
    pub log_level: String,
}

/// Gameplay numbers shared by every level.
#[derive(Clone, Debug, PartialEq)]
pub struct Tuning {
    pub tick_rate_ms: u64,
    pub player: PlayerTuning,
    pub chaser: ChaserTuning,
    pub pickups: PickupTuning,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlayerTuning {
    pub size: f32,
    pub speed: f32,
    pub acceleration: f32,
    pub deceleration: f32,
    pub bounce: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChaserTuning {
    pub size: f32,
    pub acceleration: f32,
    pub wall_damping: f32,
    pub nudge: f32,
    pub seed: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PickupTuning {
    pub collectible_size: f32,
    pub key_size: f32,
    pub platform_speed: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        TomlConfig::default().tuning()
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    player: TomlPlayer,
    #[serde(default)]
    chaser: TomlChaser,
    #[serde(default)]
    pickups: TomlPickups,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default)]
    content_file: Option<String>,
    #[serde(default = "default_log_file")]
    log_file: String,
    #[serde(default = "default_log_level")]
    log_level: String,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlPlayer {
    #[serde(default = "default_player_size")]
    size: f32,
    #[serde(default = "default_player_speed")]
    speed: f32,
    #[serde(default = "default_player_accel")]
    acceleration: f32,
    #[serde(default = "default_player_decel")]
    deceleration: f32,
    #[serde(default = "default_player_bounce")]
    bounce: f32,
}

#[derive(Deserialize, Debug)]
struct TomlChaser {
    #[serde(default = "default_chaser_size")]
    size: f32,
    #[serde(default = "default_chaser_accel")]
    acceleration: f32,
    #[serde(default = "default_wall_damping")]
    wall_damping: f32,
    #[serde(default = "default_nudge")]
    nudge: f32,
    #[serde(default = "default_seed")]
    seed: u64,
}

#[derive(Deserialize, Debug)]
struct TomlPickups {
    #[serde(default = "default_collectible_size")]
    collectible_size: f32,
    #[serde(default = "default_key_size")]
    key_size: f32,
    #[serde(default = "default_platform_speed")]
    platform_speed: f32,
}

// ── Defaults ──

fn default_log_file() -> String { "glowgrove.log".into() }
fn default_log_level() -> String { "info".into() }

fn default_tick_rate() -> u64 { 16 }     // ~60 ticks per second

fn default_player_size() -> f32 { 30.0 }
fn default_player_speed() -> f32 { 4.0 }
fn default_player_accel() -> f32 { 0.25 }
fn default_player_decel() -> f32 { 0.85 }
fn default_player_bounce() -> f32 { 0.3 }

fn default_chaser_size() -> f32 { 28.0 }
fn default_chaser_accel() -> f32 { 0.08 }
fn default_wall_damping() -> f32 { 0.5 }
fn default_nudge() -> f32 { 1.5 }
fn default_seed() -> u64 { 14 }

fn default_collectible_size() -> f32 { 20.0 }
fn default_key_size() -> f32 { 20.0 }
fn default_platform_speed() -> f32 { 1.5 }

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            content_file: None,
            log_file: default_log_file(),
            log_level: default_log_level(),
        }
    }
}

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming { tick_rate_ms: default_tick_rate() }
    }
}

impl Default for TomlPlayer {
    fn default() -> Self {
        TomlPlayer {
            size: default_player_size(),
            speed: default_player_speed(),
            acceleration: default_player_accel(),
            deceleration: default_player_decel(),
            bounce: default_player_bounce(),
        }
    }
}

impl Default for TomlChaser {
    fn default() -> Self {
        TomlChaser {
            size: default_chaser_size(),
            acceleration: default_chaser_accel(),
            wall_damping: default_wall_damping(),
            nudge: default_nudge(),
            seed: default_seed(),
        }
    }
}

impl Default for TomlPickups {
    fn default() -> Self {
        TomlPickups {
            collectible_size: default_collectible_size(),
            key_size: default_key_size(),
            platform_speed: default_platform_speed(),
        }
    }
}

impl TomlConfig {
    fn tuning(&self) -> Tuning {
        Tuning {
            tick_rate_ms: self.timing.tick_rate_ms.max(1),
            player: PlayerTuning {
                size: self.player.size,
                speed: self.player.speed,
                acceleration: self.player.acceleration,
                deceleration: self.player.deceleration,
                bounce: self.player.bounce,
            },
            chaser: ChaserTuning {
                size: self.chaser.size,
                acceleration: self.chaser.acceleration,
                wall_damping: self.chaser.wall_damping,
                nudge: self.chaser.nudge,
                seed: self.chaser.seed,
            },
            pickups: PickupTuning {
                collectible_size: self.pickups.collectible_size,
                key_size: self.pickups.key_size,
                platform_speed: self.pickups.platform_speed,
            },
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let (toml_cfg, source) = load_toml(&search_dirs);

        // Relative content paths resolve against the same directories as config.toml
        let content_file = toml_cfg.general.content_file.as_deref().map(|name| {
            let path = PathBuf::from(name);
            if path.is_absolute() {
                return path;
            }
            search_dirs.iter()
                .map(|d| d.join(name))
                .find(|p| p.is_file())
                .unwrap_or(path)
        });

        GameConfig {
            tuning: toml_cfg.tuning(),
            general: GeneralConfig {
                content_file,
                log_file: PathBuf::from(&toml_cfg.general.log_file),
                log_level: toml_cfg.general.log_level.clone(),
            },
            source,
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
///
/// Runs before the logger exists, so problems go to stderr.
fn load_toml(search_dirs: &[PathBuf]) -> (TomlConfig, Option<PathBuf>) {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match parse(&text) {
                    Ok(cfg) => return (cfg, Some(path)),
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return (TomlConfig::default(), None);
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    (TomlConfig::default(), None)
}

fn parse(text: &str) -> Result<TomlConfig, toml::de::Error> {
    toml::from_str::<TomlConfig>(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = parse("").unwrap();
        let t = cfg.tuning();
        assert_eq!(t.tick_rate_ms, 16);
        assert!((t.player.size - 30.0).abs() < f32::EPSILON);
        assert!((t.player.speed - 4.0).abs() < f32::EPSILON);
        assert!((t.pickups.collectible_size - 20.0).abs() < f32::EPSILON);
        assert!(cfg.general.content_file.is_none());
        assert_eq!(cfg.general.log_level, "info");
    }

    #[test]
    fn partial_table_keeps_other_defaults() {
        let cfg = parse("[player]\nspeed = 6.5\n\n[chaser]\nseed = 99\n").unwrap();
        let t = cfg.tuning();
        assert!((t.player.speed - 6.5).abs() < f32::EPSILON);
        assert!((t.player.acceleration - 0.25).abs() < f32::EPSILON);
        assert_eq!(t.chaser.seed, 99);
        assert!((t.chaser.wall_damping - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn zero_tick_rate_is_raised() {
        let cfg = parse("[timing]\ntick_rate_ms = 0\n").unwrap();
        assert_eq!(cfg.tuning().tick_rate_ms, 1);
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(parse("[player\nspeed = ").is_err());
    }

    #[test]
    fn tuning_default_matches_schema_default() {
        assert_eq!(Tuning::default(), TomlConfig::default().tuning());
    }
}
