/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to the built-in tuning if the file is missing, unreadable
/// or incomplete. Every key is optional.
///
/// ```toml
/// [general]
/// tick_rate_ms = 16
/// level_file = "levels/1-1.toml"
///
/// [physics]
/// double_jump = true
///
/// [session]
/// time_limit = 300
/// player_health = 3
/// ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub tick_rate_ms: u64,
    /// Level description to play instead of the built-in course.
    pub level_file: Option<PathBuf>,
    pub tuning: Tuning,
    pub gamepad: GamepadConfig,
}

/// Everything the simulation reads. Grouped so the session can own a copy.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Tuning {
    #[serde(default)]
    pub viewport: ViewportConfig,
    #[serde(default)]
    pub physics: PhysicsConfig,
    #[serde(default)]
    pub enemy: EnemyConfig,
    #[serde(default)]
    pub block: BlockConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ViewportConfig {
    #[serde(default = "default_view_w")]
    pub width: f32,
    #[serde(default = "default_view_h")]
    pub height: f32,
}

/// Player movement constants, per tick.
#[derive(Clone, Debug, Deserialize)]
pub struct PhysicsConfig {
    #[serde(default = "default_accel")]
    pub accel: f32,
    #[serde(default = "default_max_speed")]
    pub max_speed: f32,
    /// Multiplier applied to vx on ticks with no horizontal input.
    #[serde(default = "default_friction")]
    pub friction: f32,
    /// |vx| below this snaps to zero while decaying.
    #[serde(default = "default_stop_epsilon")]
    pub stop_epsilon: f32,
    #[serde(default = "default_gravity")]
    pub gravity: f32,
    #[serde(default = "default_terminal_velocity")]
    pub terminal_velocity: f32,
    /// Negative = upward.
    #[serde(default = "default_jump_velocity")]
    pub jump_velocity: f32,
    #[serde(default = "default_stomp_bounce")]
    pub stomp_bounce: f32,
    #[serde(default)]
    pub double_jump: bool,
    #[serde(default = "default_double_jump_factor")]
    pub double_jump_factor: f32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EnemyConfig {
    /// Walk speed for bounce-mode enemies.
    #[serde(default = "default_enemy_speed")]
    pub speed: f32,
    /// Per-tick downward settle distance for bounce-mode enemies.
    #[serde(default = "default_fall_step")]
    pub fall_step: f32,
    #[serde(default = "default_squash_ticks")]
    pub squash_ticks: u32,
    #[serde(default = "default_patrol_speed")]
    pub patrol_speed: f32,
    #[serde(default = "default_patrol_tolerance")]
    pub patrol_tolerance: f32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BlockConfig {
    #[serde(default = "default_bump_ticks")]
    pub bump_ticks: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SessionConfig {
    /// Countdown start, in seconds.
    #[serde(default = "default_time_limit")]
    pub time_limit: u32,
    #[serde(default = "default_player_health")]
    pub player_health: u32,
    #[serde(default = "default_invulnerable_ticks")]
    pub invulnerable_ticks: u32,
    #[serde(default = "default_coin_score")]
    pub coin_score: u32,
    #[serde(default = "default_stomp_score")]
    pub stomp_score: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GamepadConfig {
    #[serde(default = "default_pad_jump")]
    pub jump: Vec<String>,
    #[serde(default = "default_pad_confirm")]
    pub confirm: Vec<String>,
    #[serde(default = "default_pad_back")]
    pub back: Vec<String>,
    #[serde(default = "default_pad_restart")]
    pub restart: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} parse error: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    general: TomlGeneral,
    #[serde(flatten)]
    tuning: Tuning,
    #[serde(default)]
    gamepad: GamepadConfig,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default)]
    level_file: Option<String>,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 16 }       // ~60 Hz
fn default_view_w() -> f32 { 800.0 }
fn default_view_h() -> f32 { 600.0 }
fn default_accel() -> f32 { 0.5 }
fn default_max_speed() -> f32 { 3.2 }
fn default_friction() -> f32 { 0.85 }
fn default_stop_epsilon() -> f32 { 0.05 }
fn default_gravity() -> f32 { 0.5 }
fn default_terminal_velocity() -> f32 { 8.0 }
fn default_jump_velocity() -> f32 { -9.5 }
fn default_stomp_bounce() -> f32 { -6.0 }
fn default_double_jump_factor() -> f32 { 0.8 }
fn default_enemy_speed() -> f32 { 1.0 }
fn default_fall_step() -> f32 { 4.0 }
fn default_squash_ticks() -> u32 { 30 }     // half a second at 60 Hz
fn default_patrol_speed() -> f32 { 1.0 }
fn default_patrol_tolerance() -> f32 { 1.0 }
fn default_bump_ticks() -> u32 { 6 }
fn default_time_limit() -> u32 { 400 }
fn default_player_health() -> u32 { 1 }
fn default_invulnerable_ticks() -> u32 { 120 } // 2 s
fn default_coin_score() -> u32 { 100 }
fn default_stomp_score() -> u32 { 200 }

fn default_pad_jump() -> Vec<String> { vec!["A".into(), "B".into()] }
fn default_pad_confirm() -> Vec<String> { vec!["Start".into()] }
fn default_pad_back() -> Vec<String> { vec!["Select".into()] }
fn default_pad_restart() -> Vec<String> { vec!["Y".into()] }

impl Default for ViewportConfig {
    fn default() -> Self {
        ViewportConfig { width: default_view_w(), height: default_view_h() }
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        PhysicsConfig {
            accel: default_accel(),
            max_speed: default_max_speed(),
            friction: default_friction(),
            stop_epsilon: default_stop_epsilon(),
            gravity: default_gravity(),
            terminal_velocity: default_terminal_velocity(),
            jump_velocity: default_jump_velocity(),
            stomp_bounce: default_stomp_bounce(),
            double_jump: false,
            double_jump_factor: default_double_jump_factor(),
        }
    }
}

impl Default for EnemyConfig {
    fn default() -> Self {
        EnemyConfig {
            speed: default_enemy_speed(),
            fall_step: default_fall_step(),
            squash_ticks: default_squash_ticks(),
            patrol_speed: default_patrol_speed(),
            patrol_tolerance: default_patrol_tolerance(),
        }
    }
}

impl Default for BlockConfig {
    fn default() -> Self {
        BlockConfig { bump_ticks: default_bump_ticks() }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            time_limit: default_time_limit(),
            player_health: default_player_health(),
            invulnerable_ticks: default_invulnerable_ticks(),
            coin_score: default_coin_score(),
            stomp_score: default_stomp_score(),
        }
    }
}

impl Default for GamepadConfig {
    fn default() -> Self {
        GamepadConfig {
            jump: default_pad_jump(),
            confirm: default_pad_confirm(),
            back: default_pad_back(),
            restart: default_pad_restart(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            tick_rate_ms: default_tick_rate(),
            level_file: None,
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
        let mut cfg = search_dirs
            .iter()
            .map(|d| d.join("config.toml"))
            .find(|p| p.exists())
            .and_then(|path| match read_config(&path) {
                Ok(cfg) => {
                    log::info!("loaded {}", path.display());
                    Some(cfg)
                }
                Err(e) => {
                    log::warn!("{e}; using default settings");
                    None
                }
            })
            .unwrap_or_else(|| GameConfig::from_toml(TomlConfig::default()));

        // Relative level paths resolve against the same search dirs.
        cfg.level_file = cfg.level_file.take().map(|p| {
            if p.is_absolute() {
                p
            } else {
                search_dirs.iter()
                    .map(|d| d.join(&p))
                    .find(|c| c.is_file())
                    .unwrap_or(p)
            }
        });
        cfg
    }

    /// Parse a config document. Missing sections and keys take defaults.
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        let cfg: TomlConfig = toml::from_str(text)?;
        Ok(GameConfig::from_toml(cfg))
    }

    fn from_toml(cfg: TomlConfig) -> Self {
        GameConfig {
            tick_rate_ms: cfg.general.tick_rate_ms.max(1),
            level_file: cfg.general.level_file.map(PathBuf::from),
            tuning: cfg.tuning,
            gamepad: cfg.gamepad,
        }
    }
}

fn read_config(path: &Path) -> Result<GameConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    GameConfig::parse(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
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
