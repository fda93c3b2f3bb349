/// Entities: Player and Enemy, plus the per-tick input snapshot.
///
/// Every entity is a `Rect` plus explicit state. Variant behaviour is an
/// enum matched by the controllers (`Motion`, `Lifecycle`), never a
/// subtype.

use super::geom::{Rect, Vec2};

/// Input snapshot for one tick: held directions plus the jump edge.
/// Every other edge-triggered action arrives as a `Command`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameInput {
    pub left: bool,
    pub right: bool,
    /// Set by the session from a queued `Command::Jump`; consumed by one tick.
    pub jump: bool,
}

impl FrameInput {
    /// -1, 0 or +1. Both directions held cancel out.
    pub fn horizontal(&self) -> i32 {
        (self.right as i32) - (self.left as i32)
    }

    /// Any direction held, even if they cancel.
    pub fn steering(&self) -> bool {
        self.left || self.right
    }
}

/// Discrete commands delivered at most once per press.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Jump,
    Restart,
    Confirm,
    Back,
    Help,
    Quit,
}

// ── Player ──

#[derive(Clone, Debug)]
pub struct Player {
    pub rect: Rect,
    pub vx: f32,
    pub vy: f32,
    /// Recomputed every tick by vertical resolution.
    pub on_ground: bool,
    /// Extra mid-air jumps left in the current airborne phase.
    pub air_jumps: u8,
    pub health: u32,
    /// Ticks of contact immunity left after taking a hit.
    pub invulnerable: u32,
    spawn: Rect,
}

impl Player {
    pub const WIDTH: f32 = 16.0;
    pub const HEIGHT: f32 = 16.0;

    pub fn new(spawn: Vec2, health: u32) -> Self {
        let rect = Rect::new(spawn.x, spawn.y, Self::WIDTH, Self::HEIGHT);
        Player {
            rect,
            vx: 0.0,
            vy: 0.0,
            on_ground: false,
            air_jumps: 0,
            health,
            invulnerable: 0,
            spawn: rect,
        }
    }

    /// Back to the spawn box, at rest.
    pub fn reset(&mut self, health: u32) {
        self.rect = self.spawn;
        self.vx = 0.0;
        self.vy = 0.0;
        self.on_ground = false;
        self.air_jumps = 0;
        self.health = health;
        self.invulnerable = 0;
    }

    /// Blink phase while invulnerable: true on "hidden" frames.
    pub fn flicker(&self) -> bool {
        self.invulnerable > 0 && (self.invulnerable / 4) % 2 == 1
    }
}

// ── Enemy ──

/// Enemy lifecycle. One-way: Alive → Squashed → Removed.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Lifecycle {
    Alive,
    /// Stomped. Still drawn, but ignored by collision and contact checks.
    Squashed { ticks_remaining: u32 },
    /// Ready to be dropped from the level.
    Removed,
}

/// How an enemy moves. Chosen at level build.
#[derive(Clone, Debug, PartialEq)]
pub enum Motion {
    /// Walk at constant speed, settle onto the floor, turn around at walls.
    Bounce,
    /// Walk a closed loop of waypoints, ignoring solids.
    Patrol { waypoints: Vec<Vec2>, index: usize },
}

#[derive(Clone, Debug)]
pub struct Enemy {
    pub rect: Rect,
    /// Horizontal velocity. In bounce mode the sign flips on wall contact.
    pub vx: f32,
    pub lifecycle: Lifecycle,
    pub motion: Motion,
}

impl Enemy {
    pub const WIDTH: f32 = 16.0;
    pub const HEIGHT: f32 = 16.0;

    pub fn walker(pos: Vec2, vx: f32) -> Self {
        Enemy {
            rect: Rect::new(pos.x, pos.y, Self::WIDTH, Self::HEIGHT),
            vx,
            lifecycle: Lifecycle::Alive,
            motion: Motion::Bounce,
        }
    }

    pub fn patroller(pos: Vec2, waypoints: Vec<Vec2>) -> Self {
        Enemy {
            rect: Rect::new(pos.x, pos.y, Self::WIDTH, Self::HEIGHT),
            vx: 0.0,
            lifecycle: Lifecycle::Alive,
            motion: Motion::Patrol { waypoints, index: 0 },
        }
    }

    pub fn is_alive(&self) -> bool {
        self.lifecycle == Lifecycle::Alive
    }

    pub fn is_removed(&self) -> bool {
        self.lifecycle == Lifecycle::Removed
    }

    /// Alive → Squashed. No effect on an enemy that is already dead.
    pub fn stomp(&mut self, squash_ticks: u32) -> bool {
        if !self.is_alive() { return false; }
        self.lifecycle = if squash_ticks == 0 {
            Lifecycle::Removed
        } else {
            Lifecycle::Squashed { ticks_remaining: squash_ticks }
        };
        true
    }

    /// Advance the squash countdown. Returns true on the tick it expires.
    pub fn tick_squash(&mut self) -> bool {
        if let Lifecycle::Squashed { ticks_remaining } = &mut self.lifecycle {
            *ticks_remaining = ticks_remaining.saturating_sub(1);
            if *ticks_remaining == 0 {
                self.lifecycle = Lifecycle::Removed;
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn squash_lifecycle() {
        let mut e = Enemy::walker(Vec2::new(0.0, 0.0), -1.0);
        assert!(e.is_alive());

        assert!(e.stomp(3));
        assert_eq!(e.lifecycle, Lifecycle::Squashed { ticks_remaining: 3 });
        // Already dead: not re-killable.
        assert!(!e.stomp(3));

        assert!(!e.tick_squash()); // 3→2
        assert!(!e.tick_squash()); // 2→1
        assert!(e.tick_squash());  // 1→0, removed
        assert_eq!(e.lifecycle, Lifecycle::Removed);
        assert!(!e.tick_squash());
    }

    #[test]
    fn zero_squash_removes_immediately() {
        let mut e = Enemy::walker(Vec2::new(0.0, 0.0), -1.0);
        e.stomp(0);
        assert_eq!(e.lifecycle, Lifecycle::Removed);
    }

    #[test]
    fn player_reset_restores_spawn_box() {
        let mut p = Player::new(Vec2::new(32.0, 552.0), 3);
        p.rect.x = 900.0;
        p.vx = 3.2;
        p.vy = -6.0;
        p.health = 1;
        p.invulnerable = 40;
        p.reset(3);
        assert_eq!(p.rect, Rect::new(32.0, 552.0, 16.0, 16.0));
        assert_eq!((p.vx, p.vy), (0.0, 0.0));
        assert_eq!(p.health, 3);
        assert_eq!(p.invulnerable, 0);
    }

    #[test]
    fn flicker_only_while_invulnerable() {
        let mut p = Player::new(Vec2::new(0.0, 0.0), 1);
        assert!(!p.flicker());
        p.invulnerable = 4;
        assert!(p.flicker());
        p.invulnerable = 8;
        assert!(!p.flicker());
    }

    #[test]
    fn horizontal_input_axis() {
        let both = FrameInput { left: true, right: true, jump: false };
        assert_eq!(both.horizontal(), 0);
        assert!(both.steering());
        let left = FrameInput { left: true, ..Default::default() };
        assert_eq!(left.horizontal(), -1);
        assert!(!FrameInput::default().steering());
    }
}
