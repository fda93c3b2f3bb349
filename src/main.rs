/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use config::GameConfig;
use domain::entity::FrameInput;
use sim::event::GameEvent;
use sim::level;
use sim::session::{Flow, Phase, Session};
use sim::step;
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    env_logger::init();
    let config = GameConfig::load();

    let blueprint = level::resolve_level(config.level_file.as_deref());
    let mut session = Session::new(blueprint, config.tuning.clone());

    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut session, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        log::error!("game loop failed: {e}");
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Ultra Bros!");
    if session.phase == Phase::LevelComplete {
        println!("Cleared {} with {} seconds to spare.", session.level.name, session.countdown.remaining());
    }
    println!("Score: {}", session.score);
}

fn game_loop(
    session: &mut Session,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    kb.honor_release = renderer.reports_key_release();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    if gp.connected {
        log::info!("gamepad detected");
    }

    let tick_rate = Duration::from_millis(config.tick_rate_ms);
    let mut last_tick = Instant::now();

    'frames: loop {
        kb.drain_events();
        gp.update();

        for cmd in kb.commands().into_iter().chain(gp.commands()) {
            if session.apply(cmd) == Flow::Quit {
                break 'frames;
            }
        }

        let elapsed = last_tick.elapsed();
        if elapsed >= tick_rate {
            last_tick = Instant::now();
            let held = kb.frame_input();
            let input = FrameInput {
                left: held.left || gp.left_held(),
                right: held.right || gp.right_held(),
                jump: false,
            };
            let events = step::step(session, input, elapsed.as_secs_f32());
            process_events(sound, &events);
        }

        renderer.render(session)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn process_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::BlockBumped { solid } => log::debug!("bumped solid {solid}"),
            GameEvent::QuestionOpened { solid } => log::debug!("opened question block {solid}"),
            GameEvent::EnemyStomped { enemy } => log::debug!("stomped enemy {enemy}"),
            GameEvent::CoinCollected { score } => log::debug!("coin, score {score}"),
            GameEvent::PlayerHurt { health } => log::debug!("hurt, {health} health left"),
            other => log::trace!("{other:?}"),
        }
    }

    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    for event in events {
        match event {
            GameEvent::Jumped | GameEvent::DoubleJumped => sfx.play_jump(),
            GameEvent::BlockBumped { .. } => sfx.play_bump(),
            GameEvent::QuestionOpened { .. } | GameEvent::CoinCollected { .. } => sfx.play_coin(),
            GameEvent::EnemyStomped { .. } => sfx.play_stomp(),
            GameEvent::PlayerHurt { .. } => sfx.play_hurt(),
            GameEvent::PlayerKilled | GameEvent::TimeUp => sfx.play_die(),
            GameEvent::GoalReached => sfx.play_clear(),
            GameEvent::EnemyRemoved => {}
        }
    }
}
