/// Player controller: input-driven motion, collision and enemy contact.
///
/// ## Order inside one update
///
/// ```text
///   1. jump command      (edge; grounded, or one air jump if enabled)
///   2. horizontal accel / friction, clamp to ±max_speed
///   3. X resolution      (first overlapping solid wins)
///   4. gravity, clamp to terminal velocity
///   5. Y resolution      → on_ground / head-hit on a block
///   6. enemy contacts    → stomp or damage, in enemy list order
/// ```
///
/// ## Stomp vs damage
///
/// ┌─────────────────────────────────────────────┬──────────┐
/// │ Condition (enemy Alive and overlapping)      │ Result   │
/// ├─────────────────────────────────────────────┼──────────┤
/// │ moved down this tick AND previous bottom     │ STOMP    │
/// │ strictly above the enemy's top               │          │
/// │ invulnerable                                 │ ignored  │
/// │ otherwise                                    │ DAMAGE   │
/// └─────────────────────────────────────────────┴──────────┘
///
/// The previous-bottom test is a heuristic for "fell onto the top", not a
/// swept test. At high fall speeds it can misjudge a side contact.
/// Squashed enemies are never tested.

use super::entity::{Enemy, FrameInput, Player};
use super::physics::{self, Axis};
use super::tile::{HeadHit, Solid};
use crate::config::Tuning;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum PlayerOutcome {
    #[default]
    Alive,
    Dead,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum JumpKind {
    Ground,
    Air,
}

/// Everything the update did, for the event stream.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlayerReport {
    pub outcome: PlayerOutcome,
    pub jump: Option<JumpKind>,
    pub landed: bool,
    /// Solid index and what the hit did.
    pub head_hit: Option<(usize, HeadHit)>,
    /// Enemy indices stomped this tick.
    pub stomped: Vec<usize>,
    /// Took a non-lethal hit.
    pub hurt: bool,
}

/// Jump command. Returns the kind of jump performed, if any.
/// Repeating the command while airborne with no air jump left is a no-op.
pub fn try_jump(player: &mut Player, tuning: &Tuning) -> Option<JumpKind> {
    let phys = &tuning.physics;
    if player.on_ground {
        player.vy = phys.jump_velocity;
        player.on_ground = false;
        return Some(JumpKind::Ground);
    }
    if phys.double_jump && player.air_jumps > 0 {
        player.vy = phys.jump_velocity * phys.double_jump_factor;
        player.air_jumps -= 1;
        return Some(JumpKind::Air);
    }
    None
}

/// Apply horizontal input for one tick: accelerate, or decay toward zero.
/// Friction only acts with no direction held; left and right together
/// cancel their accelerations and leave vx as it was.
pub fn apply_horizontal(player: &mut Player, input: &FrameInput, tuning: &Tuning) {
    let phys = &tuning.physics;
    if input.steering() {
        player.vx += phys.accel * input.horizontal() as f32;
    } else {
        player.vx *= phys.friction;
        if player.vx.abs() < phys.stop_epsilon {
            player.vx = 0.0;
        }
    }
    player.vx = player.vx.clamp(-phys.max_speed, phys.max_speed);
}

/// Apply gravity for one tick. Only the fall speed is capped.
pub fn apply_gravity(player: &mut Player, tuning: &Tuning) {
    let phys = &tuning.physics;
    player.vy = (player.vy + phys.gravity).min(phys.terminal_velocity);
}

/// Advance the player by one tick.
pub fn update_player(
    player: &mut Player,
    input: &FrameInput,
    solids: &mut [Solid],
    enemies: &mut [Enemy],
    tuning: &Tuning,
) -> PlayerReport {
    let mut report = PlayerReport::default();
    let prev = player.rect;
    player.invulnerable = player.invulnerable.saturating_sub(1);

    if input.jump {
        report.jump = try_jump(player, tuning);
    }

    // ── Horizontal ──
    apply_horizontal(player, input, tuning);
    physics::move_axis(&mut player.rect, &mut player.vx, Axis::X, solids);

    // ── Vertical ──
    apply_gravity(player, tuning);
    let dy = player.vy;
    player.on_ground = false;
    if let Some(contact) = physics::move_axis(&mut player.rect, &mut player.vy, Axis::Y, solids) {
        if contact.is_landing() {
            player.on_ground = true;
            player.air_jumps = if tuning.physics.double_jump { 1 } else { 0 };
            report.landed = true;
        } else if contact.is_head_hit() {
            if let Some(block) = solids[contact.solid].block_mut() {
                let hit = block.on_head_hit(tuning.block.bump_ticks);
                report.head_hit = Some((contact.solid, hit));
            }
        }
    }

    // ── Enemy contact ──
    for (i, enemy) in enemies.iter_mut().enumerate() {
        if !enemy.is_alive() || !player.rect.overlaps(&enemy.rect) {
            continue;
        }
        if dy > 0.0 && prev.bottom() < enemy.rect.top() {
            enemy.stomp(tuning.enemy.squash_ticks);
            player.vy = tuning.physics.stomp_bounce;
            report.stomped.push(i);
            continue;
        }
        if player.invulnerable > 0 {
            continue;
        }
        player.health = player.health.saturating_sub(1);
        if player.health == 0 {
            report.outcome = PlayerOutcome::Dead;
            return report;
        }
        player.invulnerable = tuning.session.invulnerable_ticks;
        report.hurt = true;
    }

    report
}
