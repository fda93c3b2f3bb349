/// The step function: advances a Playing session by one tick.
///
/// Processing order:
///   1. Player controller (movement, collision, head-hits, enemy contact)
///   2. Coin pickup and scoring
///   3. Enemy controllers, then removal of expired or fallen enemies
///   4. Block bump timers
///   5. Left-edge clamp on the player
///   6. Camera follow
///   7. Countdown
///   8. Transitions: death > goal > time up
///
/// Only one transition can happen per tick. Outside Playing this is a no-op.

use crate::domain::ai::{self, EnemyTick};
use crate::domain::entity::FrameInput;
use crate::domain::rules::{self, JumpKind, PlayerOutcome, PlayerReport};
use crate::domain::tile::HeadHit;
use super::event::GameEvent;
use super::session::{Phase, Session};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

/// `held` carries the held directions; the jump edge comes from the
/// session's command queue. `dt` is the real time since the last tick,
/// in seconds, and only drives the countdown.
pub fn step(session: &mut Session, held: FrameInput, dt: f32) -> Vec<GameEvent> {
    if session.phase != Phase::Playing { return vec![]; }

    let mut events: Vec<GameEvent> = Vec::new();
    session.tick += 1;

    let input = FrameInput { jump: held.jump || session.take_jump(), ..held };
    let report = rules::update_player(
        &mut session.player,
        &input,
        &mut session.level.solids,
        &mut session.level.enemies,
        &session.tuning,
    );
    collect_player_events(session, &report, &mut events);
    collect_coins(session, &mut events);

    resolve_enemies(session, &mut events);
    session.level.tick_blocks();

    if session.player.rect.x < 0.0 {
        session.player.rect.x = 0.0;
    }
    session.camera.follow(session.player.rect.center_x(), &session.level);

    let time_up = session.countdown.advance(dt);
    resolve_transitions(session, report.outcome, time_up, &mut events);

    events
}

// ══════════════════════════════════════════════════════════════
// Phases of the tick
// ══════════════════════════════════════════════════════════════

fn collect_player_events(session: &mut Session, report: &PlayerReport, events: &mut Vec<GameEvent>) {
    match report.jump {
        Some(JumpKind::Ground) => events.push(GameEvent::Jumped),
        Some(JumpKind::Air) => events.push(GameEvent::DoubleJumped),
        None => {}
    }

    if report.landed {
        log::trace!("landed at x={:.1}", session.player.rect.x);
    }

    if let Some((solid, hit)) = report.head_hit {
        events.push(match hit {
            HeadHit::Opened => GameEvent::QuestionOpened { solid },
            HeadHit::Bumped => GameEvent::BlockBumped { solid },
        });
    }

    for &enemy in &report.stomped {
        session.score += session.tuning.session.stomp_score;
        events.push(GameEvent::EnemyStomped { enemy });
    }

    if report.hurt {
        events.push(GameEvent::PlayerHurt { health: session.player.health });
    }
}

fn collect_coins(session: &mut Session, events: &mut Vec<GameEvent>) {
    let taken = session.level.collect_coins(&session.player.rect);
    for _ in 0..taken {
        session.score += session.tuning.session.coin_score;
        events.push(GameEvent::CoinCollected { score: session.score });
    }
}

fn resolve_enemies(session: &mut Session, events: &mut Vec<GameEvent>) {
    let level = &mut session.level;
    for enemy in level.enemies.iter_mut() {
        if ai::update_enemy(enemy, &level.solids, &session.tuning.enemy) == EnemyTick::Expired {
            log::trace!("squash window over at tick {}", session.tick);
        }
    }
    let removed = level.remove_dead_enemies();
    if removed > 0 {
        log::debug!("removed {removed} enemies, {} left", level.enemies.len());
        events.extend(std::iter::repeat(GameEvent::EnemyRemoved).take(removed));
    }
}

fn resolve_transitions(
    session: &mut Session,
    outcome: PlayerOutcome,
    time_up: bool,
    events: &mut Vec<GameEvent>,
) {
    let fell = session.player.rect.top() > session.level.death_y;
    if outcome == PlayerOutcome::Dead || fell {
        events.push(GameEvent::PlayerKilled);
        session.set_phase(Phase::Dead);
    } else if session.level.goal_reached(&session.player.rect) {
        events.push(GameEvent::GoalReached);
        session.set_phase(Phase::LevelComplete);
    } else if time_up {
        events.push(GameEvent::TimeUp);
        session.set_phase(Phase::Dead);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Tuning;
    use crate::domain::entity::{Command, Lifecycle};
    use crate::sim::level::{world_1_1, CoinDef, EnemyDef, GoalDef, LevelDef, SolidDef};

    const DT: f32 = 1.0 / 60.0;

    /// Flat 50-tile floor, spawn at tile 2, no enemies, no goal.
    fn flat() -> LevelDef {
        LevelDef {
            name: "flat".into(),
            width: 50,
            tile: 16.0,
            ground_top: 568.0,
            death_y: 600.0,
            spawn: [32.0, 552.0],
            solids: vec![SolidDef::Ground { x: 0, len: 50 }],
            enemies: vec![],
            coins: vec![],
            goal: None,
        }
    }

    fn playing(def: LevelDef) -> Session {
        playing_with(def, Tuning::default())
    }

    fn playing_with(def: LevelDef, tuning: Tuning) -> Session {
        let mut s = Session::new(def, tuning);
        s.apply(Command::Confirm);
        s
    }

    fn idle() -> FrameInput {
        FrameInput::default()
    }

    #[test]
    fn no_step_outside_playing() {
        let mut s = Session::new(flat(), Tuning::default());
        assert!(step(&mut s, idle(), DT).is_empty());
        assert_eq!(s.tick, 0);
    }

    #[test]
    fn queued_jump_is_applied_once() {
        let mut s = playing(flat());
        step(&mut s, idle(), DT); // settle
        s.apply(Command::Jump);
        let events = step(&mut s, idle(), DT);
        assert_eq!(events, vec![GameEvent::Jumped]);
        assert!(s.player.vy < 0.0);
        assert!(step(&mut s, idle(), DT).is_empty());
    }

    #[test]
    fn countdown_expiry_kills() {
        let mut t = Tuning::default();
        t.session.time_limit = 2;
        let mut s = playing_with(flat(), t);
        assert!(step(&mut s, idle(), 1.0).is_empty());
        assert_eq!(s.countdown.remaining(), 1);
        let events = step(&mut s, idle(), 1.0);
        assert_eq!(events, vec![GameEvent::TimeUp]);
        assert_eq!(s.phase, Phase::Dead);
    }

    #[test]
    fn countdown_expiry_ignores_health() {
        let mut t = Tuning::default();
        t.session.time_limit = 1;
        t.session.player_health = 5;
        let mut s = playing_with(flat(), t);
        step(&mut s, idle(), 1.0);
        assert_eq!(s.phase, Phase::Dead);
    }

    #[test]
    fn reaching_goal_completes_level() {
        let mut def = flat();
        def.goal = Some(GoalDef { x: 60.0, width: 3.0, height: 160.0 });
        let mut s = playing(def);
        let right = FrameInput { right: true, ..Default::default() };
        let mut last = vec![];
        for _ in 0..20 {
            last = step(&mut s, right, DT);
            if s.phase != Phase::Playing { break; }
        }
        assert_eq!(s.phase, Phase::LevelComplete);
        assert_eq!(last, vec![GameEvent::GoalReached]);
    }

    #[test]
    fn death_beats_goal_in_the_same_tick() {
        let mut def = flat();
        def.goal = Some(GoalDef { x: 30.0, width: 3.0, height: 160.0 });
        def.enemies = vec![EnemyDef { x: 3, y: None, waypoints: vec![] }];
        let mut s = playing(def);
        // Player spans 32..48 and already touches the goal; the enemy walks in.
        s.level.enemies[0].rect.x = 40.0;
        let events = step(&mut s, idle(), DT);
        assert_eq!(s.phase, Phase::Dead);
        assert_eq!(events, vec![GameEvent::PlayerKilled]);
    }

    #[test]
    fn falling_into_pit_kills() {
        let mut def = flat();
        def.solids = vec![SolidDef::Ground { x: 10, len: 40 }];
        let mut s = playing(def);
        let mut ticks = 0;
        while s.phase == Phase::Playing && ticks < 200 {
            step(&mut s, idle(), DT);
            ticks += 1;
        }
        assert_eq!(s.phase, Phase::Dead);
        assert!(s.player.rect.top() > 600.0);
    }

    #[test]
    fn player_is_held_at_left_edge() {
        let mut def = flat();
        def.spawn = [1.0, 552.0];
        let mut s = playing(def);
        let left = FrameInput { left: true, ..Default::default() };
        for _ in 0..10 {
            step(&mut s, left, DT);
        }
        assert_eq!(s.player.rect.x, 0.0);
        assert_eq!(s.camera.x, 0.0);
    }

    #[test]
    fn stomped_enemy_is_removed_after_squash_window() {
        let mut t = Tuning::default();
        t.enemy.squash_ticks = 3;
        let mut def = flat();
        def.enemies = vec![EnemyDef { x: 10, y: None, waypoints: vec![] }];
        let mut s = playing_with(def, t);

        // Drop the player onto the enemy from just above.
        let top = s.level.enemies[0].rect.top();
        s.player.rect.x = s.level.enemies[0].rect.x;
        s.player.rect.y = top - 16.0 - 1.0;
        s.player.vy = 2.0;
        let events = step(&mut s, idle(), DT);
        assert!(events.contains(&GameEvent::EnemyStomped { enemy: 0 }));
        assert_eq!(s.score, 200);
        assert_eq!(s.level.enemies[0].lifecycle, Lifecycle::Squashed { ticks_remaining: 2 });
        assert_eq!(s.phase, Phase::Playing);

        step(&mut s, idle(), DT);
        let events = step(&mut s, idle(), DT);
        assert!(events.contains(&GameEvent::EnemyRemoved));
        assert!(s.level.enemies.is_empty());
    }

    #[test]
    fn question_block_opens_from_below() {
        let mut s = playing(world_1_1());
        // Stand under the lower question block at tile 23 and jump.
        s.player.rect.x = 23.0 * 16.0;
        step(&mut s, idle(), DT);
        s.apply(Command::Jump);
        let mut opened = false;
        for _ in 0..40 {
            let events = step(&mut s, idle(), DT);
            if events.contains(&GameEvent::QuestionOpened { solid: 8 }) {
                opened = true;
                break;
            }
        }
        assert!(opened);
        let q = s.level.solids[8].block().copied();
        assert_eq!(q.and_then(|b| b.used()), Some(true));
        // Bumped this tick, then ticked once by the block pass.
        assert_eq!(q.map(|b| b.bump_timer), Some(5));
    }

    #[test]
    fn camera_tracks_player_center() {
        let mut s = playing(world_1_1());
        s.player.rect.x = 1000.0 - 8.0;
        step(&mut s, idle(), DT);
        assert_eq!(s.camera.x, 600.0);
    }

    #[test]
    fn walker_falling_into_pit_is_removed() {
        let mut def = flat();
        def.solids = vec![SolidDef::Ground { x: 0, len: 10 }, SolidDef::Ground { x: 30, len: 20 }];
        def.enemies = vec![EnemyDef { x: 15, y: None, waypoints: vec![] }];
        let mut s = playing(def);
        let mut removed = 0;
        for _ in 0..400 {
            let events = step(&mut s, idle(), DT);
            removed += events.iter().filter(|e| **e == GameEvent::EnemyRemoved).count();
            if s.level.enemies.is_empty() { break; }
        }
        assert!(s.level.enemies.is_empty());
        assert_eq!(removed, 1);
        assert_eq!(s.phase, Phase::Playing);
    }

    #[test]
    fn touching_a_coin_scores_it_once() {
        let mut def = flat();
        // Two tiles right of spawn, resting on the floor.
        def.coins = vec![CoinDef { x: 4, y: 34 }, CoinDef { x: 40, y: 20 }];
        let mut s = playing(def);
        let right = FrameInput { right: true, ..Default::default() };
        let mut got = vec![];
        for _ in 0..30 {
            got.extend(
                step(&mut s, right, DT).into_iter()
                    .filter(|e| matches!(e, GameEvent::CoinCollected { .. })),
            );
        }
        assert_eq!(got, vec![GameEvent::CoinCollected { score: 100 }]);
        assert_eq!(s.score, 100);
        assert_eq!(s.level.coins.len(), 1);
    }
}
