/// Session: the single owner of everything a run needs.
///
/// ## Phase transitions
///
/// ```text
///   Menu ──Confirm──▶ Playing ──dead / fell / time up──▶ Dead
///    │ ▲  ◀──Back───    │  ▲                              │
///   Help│Back|Confirm   │  └──Restart (rebuild)           │
///    ▼ │                └──goal──▶ LevelComplete          │
///   Howto                            │                    │
///                                    └──Restart|Confirm───┴──▶ Playing
/// ```
///
/// Back on the menu quits. Quit quits from anywhere.
///
/// Every entry into Playing from Menu, Dead or LevelComplete, and every
/// Restart, rebuilds the level from its `LevelDef`: blocks unused and
/// unbumped, enemies alive at spawn, coins back, player at spawn at rest,
/// countdown refilled, score and camera at 0. Returning to the menu keeps
/// the run as is; the next Confirm rebuilds it anyway.

use crate::config::Tuning;
use crate::domain::entity::{Command, Player};
use super::level::{self, LevelDef};
use super::world::{Camera, Level};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Menu,
    Howto,
    Playing,
    Dead,
    LevelComplete,
}

/// Whether the main loop keeps going after a command.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Flow {
    Continue,
    Quit,
}

/// Whole-second countdown driven by real elapsed time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Countdown {
    remaining: u32,
    acc: f32,
}

impl Countdown {
    pub fn new(seconds: u32) -> Self {
        Countdown { remaining: seconds, acc: 0.0 }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Accumulate `dt` seconds. Once a full second has built up the count
    /// drops by one and the accumulator restarts from zero; the overshoot
    /// is discarded. Returns true when that decrement reaches zero.
    pub fn advance(&mut self, dt: f32) -> bool {
        self.acc += dt;
        if self.acc < 1.0 {
            return false;
        }
        self.acc = 0.0;
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining == 0
    }
}

pub struct Session {
    pub phase: Phase,
    pub level: Level,
    pub player: Player,
    pub camera: Camera,
    pub countdown: Countdown,
    pub tuning: Tuning,
    pub tick: u64,
    /// Coins and stomps this run.
    pub score: u32,
    blueprint: LevelDef,
    jump_queued: bool,
}

impl Session {
    /// A session sitting on the menu with the level already built.
    pub fn new(blueprint: LevelDef, tuning: Tuning) -> Self {
        let level = level::build(&blueprint, &tuning.enemy);
        let player = Player::new(level.spawn, tuning.session.player_health);
        Session {
            phase: Phase::Menu,
            camera: Camera::new(tuning.viewport.width, tuning.viewport.height),
            countdown: Countdown::new(tuning.session.time_limit),
            level,
            player,
            tuning,
            tick: 0,
            score: 0,
            blueprint,
            jump_queued: false,
        }
    }

    /// Apply one edge-triggered command.
    pub fn apply(&mut self, cmd: Command) -> Flow {
        if cmd == Command::Quit {
            return Flow::Quit;
        }
        match (self.phase, cmd) {
            (Phase::Menu, Command::Confirm) => self.restart(),
            (Phase::Menu, Command::Help) => self.set_phase(Phase::Howto),
            (Phase::Menu, Command::Back) => return Flow::Quit,
            (Phase::Howto, Command::Back | Command::Confirm) => self.set_phase(Phase::Menu),
            (Phase::Playing, Command::Jump) => self.jump_queued = true,
            (Phase::Playing, Command::Restart) => self.restart(),
            (Phase::Playing, Command::Back) => self.set_phase(Phase::Menu),
            (Phase::Dead | Phase::LevelComplete, Command::Restart | Command::Confirm) => self.restart(),
            _ => {}
        }
        Flow::Continue
    }

    /// Full rebuild from the blueprint, straight into Playing.
    pub fn restart(&mut self) {
        self.level = level::build(&self.blueprint, &self.tuning.enemy);
        self.player.reset(self.tuning.session.player_health);
        self.countdown = Countdown::new(self.tuning.session.time_limit);
        self.camera.x = 0.0;
        self.tick = 0;
        self.score = 0;
        self.jump_queued = false;
        self.set_phase(Phase::Playing);
    }

    /// Consume the queued jump, if any.
    pub fn take_jump(&mut self) -> bool {
        std::mem::take(&mut self.jump_queued)
    }

    pub fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            log::info!("phase {:?} -> {:?} at tick {}", self.phase, phase, self.tick);
        }
        self.phase = phase;
    }
}
