/// Level descriptions and the builder that turns them into a `Level`.
///
/// ## Sources (priority order):
///   1. `general.level_file` from config (TOML, format below)
///   2. Built-in World 1-1
///
/// A file that cannot be read or parsed falls back to the built-in course
/// with a warning. Geometry itself is trusted: overlapping or degenerate
/// solids are built as written.
///
/// ## Level file format (`.toml`):
///   ```toml
///   name = "1-1"
///   width = 240            # tiles
///   tile = 16.0            # world units per tile
///   ground_top = 568.0     # world y of the ground surface
///   death_y = 600.0
///   spawn = [32.0, 552.0]  # world units
///
///   [[solids]]
///   kind = "ground"        # ground | pipe | stairs | brick | question
///   x = 0
///   len = 40
///
///   [[enemies]]
///   x = 35                 # tile column; y defaults to standing on the ground
///   waypoints = [[35.0, 30.0], [40.0, 30.0]]   # optional, tile units
///
///   [[coins]]
///   x = 12                 # tile column and row, one tile square
///   y = 32
///
///   [goal]
///   x = 3744.0
///   ```
///
/// Solids are built in file order, and that order is the collision
/// tie-break order. Stairs expand to one column solid per step.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::config::EnemyConfig;
use crate::domain::entity::Enemy;
use crate::domain::geom::{Rect, Vec2};
use crate::domain::tile::{BlockState, Solid, SolidKind};
use super::world::Level;

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct LevelDef {
    #[serde(default = "default_name")]
    pub name: String,
    /// Course width in tiles.
    pub width: u32,
    #[serde(default = "default_tile")]
    pub tile: f32,
    #[serde(default = "default_ground_top")]
    pub ground_top: f32,
    #[serde(default = "default_death_y")]
    pub death_y: f32,
    /// Player top-left, world units.
    pub spawn: [f32; 2],
    #[serde(default)]
    pub solids: Vec<SolidDef>,
    #[serde(default)]
    pub enemies: Vec<EnemyDef>,
    #[serde(default)]
    pub coins: Vec<CoinDef>,
    #[serde(default)]
    pub goal: Option<GoalDef>,
}

/// One entry of the solid list. Positions are in tiles.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SolidDef {
    /// Two tiles deep, top flush with `ground_top`.
    Ground { x: i32, len: u32 },
    /// Two tiles wide, standing on the ground.
    Pipe { x: i32, height: u32 },
    Stairs {
        x: i32,
        height: u32,
        #[serde(default)]
        descending: bool,
    },
    Brick { x: i32, y: i32 },
    Question { x: i32, y: i32 },
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct EnemyDef {
    /// Tile column.
    pub x: i32,
    /// Tile row of the top edge. Default: standing on the ground.
    #[serde(default)]
    pub y: Option<i32>,
    /// Patrol loop in tile units. Empty means a walker.
    #[serde(default)]
    pub waypoints: Vec<[f32; 2]>,
}

/// Tile column and row of a coin's top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct CoinDef {
    pub x: i32,
    pub y: i32,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct GoalDef {
    /// World x of the pole's left edge.
    pub x: f32,
    #[serde(default = "default_goal_w")]
    pub width: f32,
    #[serde(default = "default_goal_h")]
    pub height: f32,
}

fn default_name() -> String { "untitled".into() }
fn default_tile() -> f32 { 16.0 }
fn default_ground_top() -> f32 { 568.0 }
fn default_death_y() -> f32 { 600.0 }
fn default_goal_w() -> f32 { 3.0 }
fn default_goal_h() -> f32 { 160.0 }

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("could not read level {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("level {path} parse error: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("level {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Read and parse a level file.
pub fn load_level_file(path: &Path) -> Result<LevelDef, LevelError> {
    let text = std::fs::read_to_string(path).map_err(|source| LevelError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let def: LevelDef = toml::from_str(&text).map_err(|source| LevelError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    if def.tile <= 0.0 || def.width == 0 {
        return Err(LevelError::Invalid {
            path: path.to_path_buf(),
            reason: "tile size and width must be positive".into(),
        });
    }
    Ok(def)
}

/// The configured level file, or the built-in course if there is none
/// or it fails to load.
pub fn resolve_level(path: Option<&Path>) -> LevelDef {
    match path.map(load_level_file) {
        Some(Ok(def)) => def,
        Some(Err(e)) => {
            log::warn!("{e}; playing the built-in course");
            world_1_1()
        }
        None => world_1_1(),
    }
}

/// Build a fresh, playable `Level`. Called on every start and restart.
pub fn build(def: &LevelDef, cfg: &EnemyConfig) -> Level {
    let t = def.tile;
    let gt = def.ground_top;
    let mut solids = Vec::with_capacity(def.solids.len());

    for s in &def.solids {
        match *s {
            SolidDef::Ground { x, len } => solids.push(Solid::new(
                Rect::new(x as f32 * t, gt, len as f32 * t, t * 2.0),
                SolidKind::Ground,
            )),
            SolidDef::Pipe { x, height } => {
                let h = height as f32 * t;
                solids.push(Solid::new(Rect::new(x as f32 * t, gt - h, t * 2.0, h), SolidKind::Pipe));
            }
            SolidDef::Stairs { x, height, descending } => {
                for i in 0..height {
                    let col = if descending { x + (height - 1 - i) as i32 } else { x + i as i32 };
                    let h = (i + 1) as f32 * t;
                    solids.push(Solid::new(Rect::new(col as f32 * t, gt - h, t, h), SolidKind::Stair));
                }
            }
            SolidDef::Brick { x, y } => solids.push(Solid::new(
                Rect::new(x as f32 * t, y as f32 * t, t, t),
                SolidKind::Block(BlockState::brick()),
            )),
            SolidDef::Question { x, y } => solids.push(Solid::new(
                Rect::new(x as f32 * t, y as f32 * t, t, t),
                SolidKind::Block(BlockState::question()),
            )),
        }
    }

    let enemies: Vec<Enemy> = def.enemies.iter().map(|e| {
        let pos = Vec2::new(
            e.x as f32 * t,
            e.y.map_or(gt - Enemy::HEIGHT, |row| row as f32 * t),
        );
        if e.waypoints.is_empty() {
            Enemy::walker(pos, -cfg.speed)
        } else {
            let wps = e.waypoints.iter().map(|[wx, wy]| Vec2::new(wx * t, wy * t)).collect();
            Enemy::patroller(pos, wps)
        }
    }).collect();

    let coins: Vec<Rect> = def.coins.iter()
        .map(|c| Rect::new(c.x as f32 * t, c.y as f32 * t, t, t))
        .collect();

    let goal = def.goal.as_ref().map(|g| Rect::new(g.x, gt - g.height, g.width, g.height));

    log::info!(
        "built level {}: {} solids, {} enemies, {} coins",
        def.name, solids.len(), enemies.len(), coins.len()
    );

    Level {
        name: def.name.clone(),
        solids,
        enemies,
        coins,
        goal,
        length: def.width as f32 * t,
        death_y: def.death_y,
        spawn: Vec2::new(def.spawn[0], def.spawn[1]),
    }
}

// ══════════════════════════════════════════════════════════════
// Built-in course
// ══════════════════════════════════════════════════════════════

/// World 1-1: seven ground runs with pits, a block cluster near the
/// start, seven pipes, a brick row, two staircases, a few coins and the
/// flag.
pub fn world_1_1() -> LevelDef {
    const T: f32 = 16.0;
    const GROUND_TOP: f32 = 600.0 - T * 2.0;
    const WIDTH: u32 = 240;
    // Block row: five tiles above the ground surface.
    let row = (GROUND_TOP / T) as i32 - 5;

    let mut solids = vec![];
    for (x, len) in [(0, 40), (43, 30), (76, 30), (110, 20), (135, 20), (160, 30), (195, 45)] {
        solids.push(SolidDef::Ground { x, len });
    }
    solids.push(SolidDef::Brick { x: 22, y: row });
    solids.push(SolidDef::Question { x: 23, y: row });
    solids.push(SolidDef::Brick { x: 24, y: row });
    solids.push(SolidDef::Question { x: 23, y: row - 1 });
    for (x, height) in [(50, 2), (58, 3), (66, 4), (74, 4), (102, 2), (140, 3), (172, 2)] {
        solids.push(SolidDef::Pipe { x, height });
    }
    for x in 104..110 {
        solids.push(SolidDef::Brick { x, y: row });
    }
    solids.push(SolidDef::Question { x: 109, y: row - 1 });
    solids.push(SolidDef::Stairs { x: 180, height: 5, descending: false });
    solids.push(SolidDef::Stairs { x: 190, height: 5, descending: true });

    let enemies = [35, 60, 108, 170]
        .into_iter()
        .map(|x| EnemyDef { x, y: None, waypoints: vec![] })
        .collect();

    // A row near the start, an arc over the first pit, a row above the bricks.
    let mut coins: Vec<CoinDef> = (12..15).map(|x| CoinDef { x, y: row + 2 }).collect();
    coins.extend([(40, row + 2), (41, row + 1), (42, row + 2)].map(|(x, y)| CoinDef { x, y }));
    coins.extend((105..108).map(|x| CoinDef { x, y: row - 2 }));

    LevelDef {
        name: "1-1".into(),
        width: WIDTH,
        tile: T,
        ground_top: GROUND_TOP,
        death_y: 600.0,
        spawn: [32.0, GROUND_TOP - T],
        solids,
        enemies,
        coins,
        goal: Some(GoalDef {
            x: WIDTH as f32 * T - T * 6.0,
            width: default_goal_w(),
            height: default_goal_h(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Motion;
    use crate::domain::tile::BlockKind;

    fn built() -> Level {
        build(&world_1_1(), &EnemyConfig::default())
    }

    #[test]
    fn world_1_1_dimensions() {
        let lvl = built();
        assert_eq!(lvl.name, "1-1");
        assert_eq!(lvl.length, 3840.0);
        assert_eq!(lvl.death_y, 600.0);
        assert_eq!(lvl.spawn, Vec2::new(32.0, 552.0));
        assert_eq!(lvl.goal, Some(Rect::new(3744.0, 408.0, 3.0, 160.0)));
    }

    #[test]
    fn world_1_1_solid_counts() {
        let lvl = built();
        // 7 ground + 4 blocks + 7 pipes + 6 bricks + 1 question + 10 stair columns
        assert_eq!(lvl.solids.len(), 35);
        let blocks = lvl.solids.iter().filter(|s| s.block().is_some()).count();
        assert_eq!(blocks, 11);
        let questions = lvl.solids.iter()
            .filter(|s| matches!(s.block().map(|b| b.kind), Some(BlockKind::Question { used: false })))
            .count();
        assert_eq!(questions, 3);
    }

    #[test]
    fn ground_runs_leave_pits() {
        let lvl = built();
        let first = lvl.solids[0].rect;
        assert_eq!(first, Rect::new(0.0, 568.0, 640.0, 32.0));
        let second = lvl.solids[1].rect;
        assert_eq!(second.left(), 43.0 * 16.0);
        assert!(second.left() > first.right());
    }

    #[test]
    fn blocks_sit_five_tiles_up() {
        let lvl = built();
        let brick = lvl.solids[7];
        assert_eq!(brick.rect, Rect::new(22.0 * 16.0, 480.0, 16.0, 16.0));
        let upper_q = lvl.solids[10];
        assert_eq!(upper_q.rect.y, 464.0);
        assert_eq!(upper_q.block().and_then(|b| b.used()), Some(false));
    }

    #[test]
    fn pipes_stand_on_ground() {
        let lvl = built();
        let pipe = lvl.solids[11];
        assert_eq!(pipe.kind, SolidKind::Pipe);
        assert_eq!(pipe.rect, Rect::new(800.0, 536.0, 32.0, 32.0));
        assert_eq!(pipe.rect.bottom(), 568.0);
    }

    #[test]
    fn stairs_expand_per_column() {
        let def = LevelDef {
            solids: vec![SolidDef::Stairs { x: 10, height: 3, descending: true }],
            ..world_1_1()
        };
        let lvl = build(&def, &EnemyConfig::default());
        let cols: Vec<(f32, f32)> = lvl.solids.iter().map(|s| (s.rect.x, s.rect.h)).collect();
        // Tallest column is left-most for descending stairs.
        assert_eq!(cols, vec![(192.0, 16.0), (176.0, 32.0), (160.0, 48.0)]);
        assert!(lvl.solids.iter().all(|s| s.rect.bottom() == 568.0));
    }

    #[test]
    fn enemies_spawn_on_ground_walking_left() {
        let lvl = built();
        assert_eq!(lvl.enemies.len(), 4);
        let e = &lvl.enemies[0];
        assert_eq!(e.rect, Rect::new(560.0, 552.0, 16.0, 16.0));
        assert_eq!(e.vx, -1.0);
        assert_eq!(e.motion, Motion::Bounce);
        assert!(e.is_alive());
    }

    #[test]
    fn coins_are_tile_squares() {
        let lvl = built();
        assert_eq!(lvl.coins.len(), 9);
        assert_eq!(lvl.coins[0], Rect::new(192.0, 512.0, 16.0, 16.0));
        // Arc peak over the first pit.
        assert_eq!(lvl.coins[4], Rect::new(656.0, 496.0, 16.0, 16.0));
        // Clear of the player standing at spawn.
        let spawn = Rect::new(32.0, 552.0, 16.0, 16.0);
        assert!(lvl.coins.iter().all(|c| !c.overlaps(&spawn)));
    }

    #[test]
    fn waypoints_make_a_patroller() {
        let def = LevelDef {
            enemies: vec![EnemyDef { x: 2, y: Some(10), waypoints: vec![[2.0, 10.0], [6.0, 10.0]] }],
            ..world_1_1()
        };
        let lvl = build(&def, &EnemyConfig::default());
        let e = &lvl.enemies[0];
        assert_eq!(e.rect.position(), Vec2::new(32.0, 160.0));
        match &e.motion {
            Motion::Patrol { waypoints, index } => {
                assert_eq!(waypoints, &vec![Vec2::new(32.0, 160.0), Vec2::new(96.0, 160.0)]);
                assert_eq!(*index, 0);
            }
            other => panic!("expected patrol, got {other:?}"),
        }
    }

    #[test]
    fn shipped_level_file_matches_builtin() {
        let text = include_str!("../../levels/1-1.toml");
        let def: LevelDef = toml::from_str(text).unwrap();
        assert_eq!(def, world_1_1());
    }

    #[test]
    fn minimal_file_takes_defaults() {
        let def: LevelDef = toml::from_str("width = 10\nspawn = [0.0, 0.0]\n").unwrap();
        assert_eq!(def.tile, 16.0);
        assert_eq!(def.ground_top, 568.0);
        assert!(def.solids.is_empty());
        assert!(def.coins.is_empty());
        assert!(def.goal.is_none());
    }

    #[test]
    fn unknown_solid_kind_is_a_parse_error() {
        let text = "width = 10\nspawn = [0.0, 0.0]\n[[solids]]\nkind = \"lava\"\nx = 1\n";
        assert!(toml::from_str::<LevelDef>(text).is_err());
    }

    #[test]
    fn missing_file_falls_back_to_builtin() {
        let err = load_level_file(Path::new("/no/such/level.toml")).unwrap_err();
        assert!(matches!(err, LevelError::Read { .. }));
        assert_eq!(resolve_level(Some(Path::new("/no/such/level.toml"))), world_1_1());
        assert_eq!(resolve_level(None).name, "1-1");
    }
}
