/// Level: the mutable world a session plays in, plus the camera.
///
/// ## Layout
///
/// World units, y grows downward. The level spans x ∈ [0, length); there
/// is no right wall, only the camera bound. Anything whose top drops
/// below `death_y` has fallen out of the world.
///
/// ## Ownership
///
/// `Level` is rebuilt from its `LevelDef` on every (re)start, so nothing
/// here needs a reset path. Solid order is the collision tie-break order
/// and is kept exactly as built.
///
/// ## Camera
///
///   camera_x = clamp(player_center_x − viewport_width / 2,
///                    0, max(0, length − viewport_width))
///
/// Horizontal only. Levels shorter than the viewport pin the camera at 0.

use crate::domain::entity::Enemy;
use crate::domain::geom::{Rect, Vec2};
use crate::domain::tile::Solid;

#[derive(Clone, Debug)]
pub struct Level {
    pub name: String,
    /// Collision order = list order.
    pub solids: Vec<Solid>,
    pub enemies: Vec<Enemy>,
    /// Free-standing coins still in play. Picked up on overlap.
    pub coins: Vec<Rect>,
    /// Touching this completes the level.
    pub goal: Option<Rect>,
    /// Horizontal extent in world units.
    pub length: f32,
    pub death_y: f32,
    pub spawn: Vec2,
}

impl Level {
    /// Advance every block's bump timer by one tick.
    pub fn tick_blocks(&mut self) {
        for block in self.solids.iter_mut().filter_map(|s| s.block_mut()) {
            block.tick();
        }
    }

    /// Drop enemies whose squash window has ended or that fell out of the
    /// world. Returns how many went.
    pub fn remove_dead_enemies(&mut self) -> usize {
        let before = self.enemies.len();
        let death_y = self.death_y;
        self.enemies.retain(|e| !e.is_removed() && e.rect.top() <= death_y);
        before - self.enemies.len()
    }

    /// Take every coin overlapping `rect`. Returns how many were taken.
    pub fn collect_coins(&mut self, rect: &Rect) -> usize {
        let before = self.coins.len();
        self.coins.retain(|c| !rect.overlaps(c));
        before - self.coins.len()
    }

    pub fn goal_reached(&self, rect: &Rect) -> bool {
        self.goal.as_ref().is_some_and(|g| rect.overlaps(g))
    }

    /// Right-most camera offset for a viewport of the given width.
    pub fn max_scroll(&self, view_w: f32) -> f32 {
        (self.length - view_w).max(0.0)
    }
}

/// Horizontal viewport into the level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    /// World x of the left edge of the viewport.
    pub x: f32,
    pub view_w: f32,
    pub view_h: f32,
}

impl Camera {
    pub fn new(view_w: f32, view_h: f32) -> Self {
        Camera { x: 0.0, view_w, view_h }
    }

    /// Center on `target_x`, clamped to the level.
    pub fn follow(&mut self, target_x: f32, level: &Level) {
        // Upper bound first: a short level pins the camera at 0.
        self.x = (target_x - self.view_w / 2.0)
            .min(level.max_scroll(self.view_w))
            .max(0.0);
    }

    /// World x to viewport x.
    pub fn to_view(&self, wx: f32) -> f32 {
        wx - self.x
    }

    /// Does a world-space rect intersect the viewport horizontally?
    pub fn sees(&self, r: &Rect) -> bool {
        r.right() > self.x && r.left() < self.x + self.view_w
    }
}
