/// Enemy controller: per-enemy motion and the squash countdown.
///
/// Two motion modes, fixed per enemy at level build:
///   1. **Bounce**: settle onto the floor below, walk at constant speed,
///      reverse direction on wall contact.
///   2. **Patrol**: walk a closed loop of waypoints at constant speed,
///      passing through solids.
///
/// Squashed enemies do not move; they only count down until removal.
/// Removal itself (dropping the entry from the level) is the caller's job.

use super::entity::{Enemy, Lifecycle, Motion};
use super::geom::Vec2;
use super::physics::{self, Axis};
use super::tile::Solid;
use crate::config::EnemyConfig;

/// What happened to one enemy this tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EnemyTick {
    Moved,
    /// Bounce-mode wall contact; vx sign was inverted.
    Turned,
    /// Reached its waypoint and switched to the next one.
    Waypoint { next: usize },
    Squashed,
    /// Squash countdown finished on this tick.
    Expired,
    Idle,
}

/// Advance one enemy by one tick.
pub fn update_enemy(enemy: &mut Enemy, solids: &[Solid], cfg: &EnemyConfig) -> EnemyTick {
    match enemy.lifecycle {
        Lifecycle::Removed => EnemyTick::Idle,
        Lifecycle::Squashed { .. } => {
            if enemy.tick_squash() { EnemyTick::Expired } else { EnemyTick::Squashed }
        }
        Lifecycle::Alive => match enemy.motion {
            Motion::Bounce => bounce(enemy, solids, cfg),
            Motion::Patrol { .. } => patrol(enemy, cfg),
        },
    }
}

// ── Bounce mode ──

fn bounce(enemy: &mut Enemy, solids: &[Solid], cfg: &EnemyConfig) -> EnemyTick {
    // Settle: step downward, snap onto whatever is hit first.
    // No vertical velocity is carried between ticks.
    physics::resolve_axis(&mut enemy.rect, Axis::Y, cfg.fall_step, solids);

    match physics::resolve_axis(&mut enemy.rect, Axis::X, enemy.vx, solids) {
        Some(_) => {
            enemy.vx = -enemy.vx;
            EnemyTick::Turned
        }
        None => EnemyTick::Moved,
    }
}

// ── Patrol mode ──

fn patrol(enemy: &mut Enemy, cfg: &EnemyConfig) -> EnemyTick {
    let Motion::Patrol { waypoints, index } = &mut enemy.motion else {
        return EnemyTick::Idle;
    };
    // A single waypoint (or none) means "stand still".
    if waypoints.len() < 2 { return EnemyTick::Idle; }

    let target = waypoints[*index % waypoints.len()];
    let pos = enemy.rect.position();
    let to = Vec2::new(target.x - pos.x, target.y - pos.y);
    let dist = to.length();

    if dist > 0.0 {
        // Never overshoot the waypoint.
        let step = cfg.patrol_speed.min(dist);
        let dir = Vec2::new(to.x / dist, to.y / dist);
        enemy.rect.x += dir.x * step;
        enemy.rect.y += dir.y * step;
        enemy.vx = dir.x * cfg.patrol_speed;
    }

    if enemy.rect.position().distance(target) < cfg.patrol_tolerance {
        *index = (*index + 1) % waypoints.len();
        return EnemyTick::Waypoint { next: *index };
    }
    EnemyTick::Moved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geom::Rect;
    use crate::domain::tile::SolidKind;

    fn cfg() -> EnemyConfig {
        EnemyConfig::default()
    }

    fn ground(x: f32, y: f32, w: f32, h: f32) -> Solid {
        Solid::new(Rect::new(x, y, w, h), SolidKind::Ground)
    }

    // ── Bounce ──

    #[test]
    fn walks_along_floor() {
        let solids = [ground(0.0, 400.0, 800.0, 32.0)];
        let mut e = Enemy::walker(Vec2::new(200.0, 384.0), -1.0);
        assert_eq!(update_enemy(&mut e, &solids, &cfg()), EnemyTick::Moved);
        assert_eq!(e.rect.x, 199.0);
        assert_eq!(e.rect.bottom(), 400.0);
    }

    #[test]
    fn settles_onto_floor_from_above() {
        let solids = [ground(0.0, 400.0, 800.0, 32.0)];
        let mut e = Enemy::walker(Vec2::new(200.0, 370.0), -1.0);
        update_enemy(&mut e, &solids, &cfg()); // 370 → 374
        assert_eq!(e.rect.y, 374.0);
        for _ in 0..5 { update_enemy(&mut e, &solids, &cfg()); }
        assert_eq!(e.rect.bottom(), 400.0);
    }

    #[test]
    fn falls_into_pit() {
        let solids = [ground(0.0, 400.0, 100.0, 32.0)];
        let mut e = Enemy::walker(Vec2::new(300.0, 384.0), -1.0);
        update_enemy(&mut e, &solids, &cfg());
        assert_eq!(e.rect.y, 388.0);
    }

    #[test]
    fn reverses_on_wall_contact() {
        // Enemy at x=100 moving left into a wall spanning x∈[90,110].
        // The floor comes first in list order, so the settle step snaps
        // onto it and the wall only participates in the horizontal pass.
        let solids = [
            ground(0.0, 400.0, 800.0, 32.0),
            ground(90.0, 0.0, 20.0, 400.0),
        ];
        let mut e = Enemy::walker(Vec2::new(100.0, 384.0), -2.0);
        assert_eq!(update_enemy(&mut e, &solids, &cfg()), EnemyTick::Turned);
        assert_eq!(e.vx, 2.0);
        assert_eq!(e.rect.left(), 110.0);

        // Next tick it walks away to the right.
        assert_eq!(update_enemy(&mut e, &solids, &cfg()), EnemyTick::Moved);
        assert_eq!(e.rect.left(), 112.0);
    }

    #[test]
    fn reverses_against_pipe_on_the_right() {
        let solids = [
            ground(0.0, 400.0, 800.0, 32.0),
            ground(300.0, 368.0, 32.0, 32.0),
        ];
        let mut e = Enemy::walker(Vec2::new(283.0, 384.0), 2.0);
        assert_eq!(update_enemy(&mut e, &solids, &cfg()), EnemyTick::Turned);
        assert_eq!(e.rect.right(), 300.0);
        assert_eq!(e.vx, -2.0);
    }

    // ── Squash ──

    #[test]
    fn squashed_enemy_stays_put_then_expires() {
        let solids = [ground(0.0, 400.0, 800.0, 32.0)];
        let mut e = Enemy::walker(Vec2::new(200.0, 384.0), -1.0);
        e.stomp(2);
        let before = e.rect;
        assert_eq!(update_enemy(&mut e, &solids, &cfg()), EnemyTick::Squashed);
        assert_eq!(e.rect, before);
        assert_eq!(update_enemy(&mut e, &solids, &cfg()), EnemyTick::Expired);
        assert_eq!(e.lifecycle, Lifecycle::Removed);
        assert_eq!(update_enemy(&mut e, &solids, &cfg()), EnemyTick::Idle);
    }

    // ── Patrol ──

    #[test]
    fn patrol_cycles_waypoints() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(3.0, 0.0);
        let mut e = Enemy::patroller(a, vec![a, b]);
        let c = EnemyConfig { patrol_speed: 1.0, patrol_tolerance: 0.5, ..cfg() };

        // Starting on waypoint 0: advance immediately toward 1.
        assert_eq!(update_enemy(&mut e, &[], &c), EnemyTick::Waypoint { next: 1 });

        assert_eq!(update_enemy(&mut e, &[], &c), EnemyTick::Moved);      // x=1
        assert_eq!(update_enemy(&mut e, &[], &c), EnemyTick::Moved);      // x=2
        assert_eq!(update_enemy(&mut e, &[], &c), EnemyTick::Waypoint { next: 0 }); // x=3
        assert_eq!(e.rect.x, 3.0);
        assert!(e.vx > 0.0);

        update_enemy(&mut e, &[], &c);
        assert_eq!(e.rect.x, 2.0);
        assert!(e.vx < 0.0);
    }

    #[test]
    fn patrol_ignores_solids() {
        let solids = [ground(0.0, 0.0, 100.0, 100.0)];
        let a = Vec2::new(10.0, 10.0);
        let b = Vec2::new(50.0, 10.0);
        let mut e = Enemy::patroller(a, vec![b, a]);
        update_enemy(&mut e, &solids, &cfg());
        assert_eq!(e.rect.x, 11.0);
    }

    #[test]
    fn single_waypoint_stands_still() {
        let a = Vec2::new(10.0, 10.0);
        let mut e = Enemy::patroller(a, vec![a]);
        assert_eq!(update_enemy(&mut e, &[], &cfg()), EnemyTick::Idle);
        assert_eq!(e.rect.position(), a);
    }
}
