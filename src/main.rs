//! Gobbler headless runner
//!
//! Runs the simulation with the autopilot at a fixed 60 Hz for a number of
//! frames, logging what happens, then prints a summary.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use gobbler::consts::SIM_DT;
    use gobbler::{BestScores, Game, Settings, Sinks, Tuning};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = match Settings::from_args(std::env::args().skip(1)) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("gobbler: {}", e);
            eprintln!(
                "usage: gobbler [--mode story|arcade] [--seed N] [--frames N] [--width W] [--height H] \
                 [--tuning FILE] [--scores FILE] [--mute]"
            );
            std::process::exit(2);
        }
    };

    let tuning = match &settings.tuning_path {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(json) => Tuning::from_json(&json).unwrap_or_else(|e| {
                log::warn!("{}: {}; using default tuning", path.display(), e);
                Tuning::default().sanitized_logged()
            }),
            Err(e) => {
                log::warn!("{}: {}; using default tuning", path.display(), e);
                Tuning::default().sanitized_logged()
            }
        },
        None => Tuning::default().sanitized_logged(),
    };

    let best = match &settings.scores_path {
        Some(path) => BestScores::load_or_default(path),
        None => BestScores::new(),
    };

    log::info!(
        "Gobbler starting: {} mode, seed {}, {} frames",
        settings.mode.as_str(),
        settings.seed,
        settings.frames
    );

    let mut game = Game::new(&settings, tuning, Sinks::logging(), best);
    game.input.idle_mode = true;
    for _ in 0..settings.frames {
        game.update(SIM_DT);
    }

    let s = &game.state;
    println!(
        "{} mode after {:.1}s: phase {}, score {}, best {}, kills {}, misses {}, deaths {}, scrolled {:.0}px",
        settings.mode.as_str(),
        s.time_ticks as f32 * SIM_DT,
        s.phase.as_str(),
        s.scoring.score,
        game.best_score(),
        s.scoring.kills,
        s.scoring.misses,
        s.scoring.deaths,
        s.scroll_x
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The browser shell drives `gobbler::Game` directly
}
