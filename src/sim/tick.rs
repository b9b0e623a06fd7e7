//! Fixed timestep simulation tick
//!
//! Game flow on top of the entity machines. Order inside a playing tick:
//! outro sequencing, difficulty, scroll, spawning, player physics, entity
//! updates, boss, finish exit, being-eaten and aim.

use glam::Vec2;

use super::checkpoint::BossSnapshot;
use super::dialogue::{Dialogue, DialogueStep, Script, Speaker};
use super::difficulty::Difficulty;
use super::hazard::{BossHit, HazardState, drift_hazards, update_hazards};
use super::npc::{drift_npcs, update_npcs};
use super::outro::{Anchors, Outro, OutroCue};
use super::player::Release;
use super::powerup::{drift_powerups, update_powerups};
use super::state::{BossFight, FinishExit, Frame, GamePhase, GameState, Scoring};
use crate::audio::SoundEffect;
use crate::effects::Palette;
use crate::hud::Sinks;
use crate::math::{angle_to, rand_between};
use crate::tuning::Tuning;

/// Auto-run distance past the right edge before the cutscene starts
const FINISH_EXIT_PAD: f32 = 20.0;
/// Warp target, measured back from the level end
const WARP_BACK: f32 = 40.0;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Button went down
    pub press: bool,
    /// Button came up
    pub release: bool,
    /// Menus and dialogue (start, continue, next line)
    pub advance: bool,
    /// Pause toggle
    pub pause: bool,
    /// End the boss fight at once (debug)
    pub skip_boss: bool,
    /// Jump close to the finish (debug, story only)
    pub warp_to_finish: bool,
    /// Idle/demo mode - AI plays the game
    pub idle_mode: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32, tuning: &Tuning, sinks: &mut Sinks) {
    state.time_ticks += 1;

    let mut input = input.clone();
    if input.idle_mode {
        autopilot(state, tuning, &mut input);
    }

    if input.pause {
        toggle_pause(state);
    }
    if input.skip_boss {
        skip_boss(state, tuning, sinks);
    }
    if input.warp_to_finish {
        warp_near_finish(state, tuning);
    }

    match state.phase {
        GamePhase::Start => {
            if input.press || input.advance {
                begin_game(state, tuning, sinks);
            } else {
                drift_world(state, dt);
            }
        }
        GamePhase::StageClear => {
            if input.press || input.advance {
                log::info!("back to the title screen");
                state.phase = GamePhase::Start;
            } else {
                drift_world(state, dt);
            }
        }
        GamePhase::GameOver => {
            if input.press || input.advance {
                continue_from_game_over(state, tuning);
            }
            update_game_over(state, tuning, dt, sinks);
        }
        GamePhase::Dying => update_dying(state, tuning, dt, sinks),
        GamePhase::Paused => {}
        GamePhase::Playing | GamePhase::Cutscene => {
            handle_play_input(state, tuning, &input, sinks);
            run_world(state, tuning, dt, sinks);
        }
    }
}

fn toggle_pause(state: &mut GameState) {
    match state.phase {
        GamePhase::Playing | GamePhase::Cutscene => {
            state.paused_from = Some(state.phase);
            state.phase = GamePhase::Paused;
        }
        GamePhase::Paused => {
            state.phase = state.paused_from.take().unwrap_or(GamePhase::Playing);
        }
        _ => {}
    }
}

/// Outside of play everything just slides left at the current speed
fn drift_world(state: &mut GameState, dt: f32) {
    let scroll = state.difficulty.speed * dt;
    drift_npcs(&mut state.npcs, scroll);
    drift_hazards(&mut state.hazards, scroll);
    drift_powerups(&mut state.powerups, scroll);
}

/// The player may steer: playing, or fighting the boss, and not auto-running
fn can_control(state: &GameState) -> bool {
    let phase_ok = state.phase == GamePhase::Playing || (state.phase == GamePhase::Cutscene && state.fight.active);
    phase_ok && state.finish.is_none() && state.outro.is_none()
}

fn handle_play_input(state: &mut GameState, tuning: &Tuning, input: &TickInput, sinks: &mut Sinks) {
    if state.dialogue.is_some() {
        if input.press || input.advance {
            advance_dialogue(state, tuning, sinks);
        }
        return;
    }

    if !can_control(state) {
        if input.release {
            state.player.cancel_hold();
        }
        return;
    }

    if input.press && state.player.is_catchable() && state.player.press() {
        sinks.sfx(SoundEffect::Jump);
    }
    if input.release {
        match state.player.release(&tuning.phys, &tuning.squash) {
            Release::Flap => log::trace!("flap"),
            Release::Stand => log::trace!("stand, attack window open"),
            Release::Ignored => {}
        }
    }
}

fn advance_dialogue(state: &mut GameState, tuning: &Tuning, sinks: &mut Sinks) {
    let Some(dialogue) = state.dialogue.as_mut() else {
        return;
    };
    sinks.sfx(SoundEffect::TextTap);
    if dialogue.advance() != DialogueStep::Finished {
        return;
    }

    let script = dialogue.script;
    state.dialogue = None;
    match script {
        Script::Intro => start_boss_fight(state, tuning, sinks),
        Script::Outro => start_boss_finale(state, sinks),
    }
}

/// Fresh run from the title screen (or an arcade death)
pub fn begin_game(state: &mut GameState, tuning: &Tuning, sinks: &mut Sinks) {
    let deaths = if state.is_arcade() { state.scoring.deaths } else { 0 };
    let ground_y = state.ground_y(tuning);

    state.scroll_x = 0.0;
    state.clear_entities();
    state.spawner.reset();
    state.difficulty = Difficulty::new(tuning);
    state.scoring = Scoring {
        deaths,
        ..Default::default()
    };
    state.lives.half = tuning.lives.max_half;
    state.lives.death_delay = 0.0;
    state.lives.resume_t = None;
    state.player.reset(tuning.world.player_x, ground_y, tuning.grow.base_r);
    state.checkpoints.reset(0, state.player.base_r);
    state.fight = BossFight::new(tuning, state.player.base_r);
    state.outro = None;
    state.dialogue = None;
    state.finish = None;
    state.toast_t = 0.0;
    state.paused_from = None;
    state.phase = GamePhase::Playing;
    state.difficulty.update(0, tuning);

    sinks.sfx_gate_closed = false;
    sinks.hud.show_score(true);
    sinks.hud.score_changed(0);
    sinks.hud.health_bar(None);
    sinks.hud.lives(state.lives.half);
    sinks.effects.burst(state.player.pos, 0.45);
    sinks.sfx(SoundEffect::PlayerSpawns);
    log::info!("{} run started (seed {})", state.mode.as_str(), state.seed);
}

/// Count a death and start the respawn delay.
///
/// A second death in the same window is ignored, and so is any death once
/// the boss outro has begun.
pub fn register_death(state: &mut GameState, tuning: &Tuning, sinks: &mut Sinks) {
    if matches!(state.phase, GamePhase::Dying | GamePhase::GameOver) || state.outro.is_some() {
        return;
    }
    state.scoring.deaths += 1;
    state.lives.half = state.lives.half.saturating_sub(1);
    state.lives.death_delay = tuning.lives.respawn_delay;
    state.fight.died_in = state.fight.active && state.outro.is_none();
    state.player.alive = false;
    state.player.cancel_hold();
    state.phase = GamePhase::Dying;
    sinks.hud.lives(state.lives.half);
    log::info!(
        "player died (death {}, {:.1} hearts left)",
        state.scoring.deaths,
        state.lives.half as f32 / 2.0
    );
}

fn update_dying(state: &mut GameState, tuning: &Tuning, dt: f32, sinks: &mut Sinks) {
    state.lives.death_delay -= dt;
    if state.lives.death_delay > 0.0 {
        return;
    }
    if state.lives.half == 0 {
        begin_game_over(state, sinks);
    } else {
        respawn_at_checkpoint(state, tuning, sinks);
    }
}

fn begin_game_over(state: &mut GameState, sinks: &mut Sinks) {
    state.phase = GamePhase::GameOver;
    state.lives.resume_t = None;
    state.lives.insert_mode = state.lives.coins == 0;
    sinks.hud.show_score(false);
    sinks.hud.health_bar(None);
    log::info!("game over with score {}", state.scoring.score);
}

/// Spend a coin, or refill the coins when out of them
pub fn continue_from_game_over(state: &mut GameState, tuning: &Tuning) {
    let lives = &mut state.lives;
    if lives.resume_t.is_some() {
        return;
    }
    if lives.insert_mode {
        lives.coins = tuning.lives.continues;
        lives.insert_mode = false;
        log::info!("coins refilled");
        return;
    }
    lives.coins = lives.coins.saturating_sub(1);
    lives.resume_t = Some(tuning.lives.resume_delay);
    log::info!("continue spent, {} coins left", lives.coins);
}

fn update_game_over(state: &mut GameState, tuning: &Tuning, dt: f32, sinks: &mut Sinks) {
    let Some(t) = state.lives.resume_t.as_mut() else {
        return;
    };
    *t -= dt;
    if *t > 0.0 {
        return;
    }
    state.lives.resume_t = None;
    state.lives.half = tuning.lives.max_half;
    respawn_at_checkpoint(state, tuning, sinks);
}

/// Put the player back into the run after a death
pub fn respawn_at_checkpoint(state: &mut GameState, tuning: &Tuning, sinks: &mut Sinks) {
    if state.is_arcade() {
        begin_game(state, tuning, sinks);
        return;
    }

    let ground_y = state.ground_y(tuning);
    state.clear_entities();
    state.spawner.reset();
    state.calm_down(tuning);
    state.outro = None;
    state.dialogue = None;
    state.finish = None;
    state.fight.boss.reset_motion();
    sinks.sfx_gate_closed = false;

    if state.fight.died_in {
        state.fight.died_in = false;
        let snap = state.checkpoints.boss.unwrap_or(BossSnapshot {
            scroll_x: state.checkpoints.arena_x(state.viewport.width),
            score: state.scoring.score,
            r: state.player.base_r,
            hp: state.fight.boss.hp_max,
            timer: state.fight.timer,
        });
        state.scroll_x = snap.scroll_x;
        state.scoring.set(snap.score, sinks);
        state.scoring.locked = true;
        state.player.reset(tuning.world.player_x, ground_y, snap.r);
        state.fight.boss.hp = snap.hp;
        state.fight.active = true;
        state.fight.timer_running = true;
        state.fight.bonus_awarded = false;
        state.phase = GamePhase::Cutscene;
        sinks.hud.health_bar(Some((state.fight.boss.hp, state.fight.boss.hp_max)));
        log::info!("respawned in the boss fight ({} hp left)", snap.hp);
    } else {
        let snap = state.checkpoints.current(state.scoring.score, state.player.base_r);
        state.scroll_x = state.checkpoints.current_x();
        state.scoring.set(snap.score, sinks);
        state.scoring.locked = false;
        state.player.reset(tuning.world.player_x, ground_y, snap.r);
        state.fight.active = false;
        state.fight.timer_running = false;
        state.difficulty.boss_override = None;
        state.phase = GamePhase::Playing;
        sinks.hud.health_bar(None);
        log::info!("respawned at checkpoint {}", state.checkpoints.index);
    }

    state.difficulty.update(state.scoring.score, tuning);
    sinks.hud.show_score(true);
    sinks.hud.lives(state.lives.half);
    sinks.effects.burst(state.player.pos, 0.45);
    sinks.sfx(SoundEffect::PlayerSpawns);
}

fn skip_boss(state: &mut GameState, tuning: &Tuning, sinks: &mut Sinks) {
    if state.is_arcade() || state.outro.is_some() {
        return;
    }
    if !matches!(state.phase, GamePhase::Playing | GamePhase::Cutscene) {
        return;
    }
    log::info!("boss skipped");
    state.fight.boss.hp = 0;
    begin_boss_outro(state, tuning, sinks);
}

fn warp_near_finish(state: &mut GameState, tuning: &Tuning) {
    if state.is_arcade() || state.phase != GamePhase::Playing {
        return;
    }
    state.scroll_x = (tuning.level.length - state.viewport.width - WARP_BACK).max(0.0);
    state
        .checkpoints
        .sync_to_scroll(state.scroll_x, false, state.scoring.score, state.player.base_r);
    state.finish = None;
    log::info!("warped to x={:.0}", state.scroll_x);
}

fn update_checkpoint_progress(state: &mut GameState, tuning: &Tuning, sinks: &mut Sinks) {
    if state.is_arcade() || state.phase != GamePhase::Playing {
        return;
    }
    if let Some(index) = state
        .checkpoints
        .progress(state.scroll_x, state.scoring.score, state.player.base_r)
    {
        state.toast_t = tuning.lives.checkpoint_toast;
        sinks.hud.checkpoint_toast();
        log::info!("checkpoint {} reached with score {}", index, state.scoring.score);
    }
}

/// Story scroll hit the finish: shrink, stop spawning and auto-run right
fn maybe_begin_finish_exit(state: &mut GameState, tuning: &Tuning, sinks: &mut Sinks) {
    if state.is_arcade() || state.phase != GamePhase::Playing || state.finish.is_some() {
        return;
    }
    if state.scroll_x < state.checkpoints.finish_stop_x - 1.0 {
        return;
    }
    let ground_y = state.ground_y(tuning);
    state.finish = Some(FinishExit {
        fade_t: 0.0,
        cleared: false,
    });
    state.player.cancel_hold();
    state.player.shrink_to_base(ground_y);
    state.spawner.halt();
    sinks.effects.burst(state.player.pos, 0.45);
    sinks.sfx(SoundEffect::EnterAutoMode);
    log::info!("finish reached with score {}", state.scoring.score);
}

fn update_finish_exit(state: &mut GameState, tuning: &Tuning, dt: f32, sinks: &mut Sinks) {
    let Some(mut finish) = state.finish else {
        return;
    };
    if !finish.cleared {
        finish.fade_t += dt;
        if finish.fade_t >= tuning.level.finish_fade_secs {
            finish.cleared = true;
            state.npcs.clear();
            state.hazards.clear();
            state.powerups.clear();
            sinks.hud.show_score(false);
        }
    }
    state.finish = Some(finish);

    state.player.pos.x += state.difficulty.speed * dt;
    let off_screen = state.player.pos.x > state.viewport.width + state.player.r + FINISH_EXIT_PAD;
    if off_screen && state.phase == GamePhase::Playing {
        enter_intro_cutscene(state, tuning, sinks);
    }
}

fn enter_intro_cutscene(state: &mut GameState, tuning: &Tuning, sinks: &mut Sinks) {
    let arena_x = state.checkpoints.arena_x(state.viewport.width);
    state.finish = None;
    state.clear_entities();
    state.phase = GamePhase::Cutscene;
    state.dialogue = Some(Dialogue::new(Script::Intro));
    state.player.cancel_hold();
    state.player.pos.x = tuning.world.player_x;
    state.checkpoints.boss = Some(BossSnapshot {
        scroll_x: arena_x,
        score: state.scoring.score,
        r: state.player.base_r,
        hp: state.fight.boss.hp_max,
        timer: 0.0,
    });
    state.scroll_x = arena_x;
    sinks.sfx(SoundEffect::TextTap);
    log::info!("boss cutscene");
}

/// Intro dialogue done: the fight starts
fn start_boss_fight(state: &mut GameState, tuning: &Tuning, sinks: &mut Sinks) {
    let fight = &mut state.fight;
    fight.active = true;
    fight.timer = 0.0;
    fight.timer_running = true;
    fight.bonus_awarded = false;
    fight.boss.hp = fight.boss.hp_max;
    fight.boss.reset_motion();

    state.scoring.locked = true;
    state.difficulty.boss_override = Some(1.0);
    state.difficulty.update(state.scoring.score, tuning);
    state.spawner.prime(tuning);
    state.checkpoints.boss = Some(BossSnapshot {
        scroll_x: state.scroll_x,
        score: state.scoring.score,
        r: state.player.base_r,
        hp: state.fight.boss.hp_max,
        timer: 0.0,
    });

    sinks.hud.show_score(true);
    sinks.hud.health_bar(Some((state.fight.boss.hp, state.fight.boss.hp_max)));
    log::info!("boss fight started");
}

fn on_boss_hit(state: &mut GameState, tuning: &Tuning, hit: BossHit, sinks: &mut Sinks) {
    if state.fight.boss.hp == 0 {
        return;
    }
    let killed = state.fight.boss.take_hit();
    let (hp, hp_max) = (state.fight.boss.hp, state.fight.boss.hp_max);

    state.toast_t = tuning.lives.checkpoint_toast;
    state.checkpoints.boss = Some(BossSnapshot {
        scroll_x: state.scroll_x,
        score: state.scoring.score,
        r: state.player.base_r,
        hp,
        timer: state.fight.timer,
    });
    sinks.hud.checkpoint_toast();
    sinks.hud.health_bar(Some((hp, hp_max)));
    sinks.effects.line_burst(hit.pos, (hit.r / 18.0).max(0.7), 0.16);

    if killed {
        begin_boss_outro(state, tuning, sinks);
    } else {
        sinks.sfx(SoundEffect::EatBomb);
        log::info!("boss hit, {}/{} hp left", hp, hp_max);
    }
}

fn begin_boss_outro(state: &mut GameState, tuning: &Tuning, sinks: &mut Sinks) {
    if state.outro.is_some() {
        return;
    }
    state.scoring.locked = true;
    if state.difficulty.boss_override.is_none() {
        state.difficulty.boss_override = Some(1.0);
        state.difficulty.update(state.scoring.score, tuning);
    }
    state.phase = GamePhase::Cutscene;
    state.finish = None;
    state.dialogue = None;
    state.fight.active = true;
    state.fight.timer_running = false;
    state.outro = Some(Outro::new());
    sinks.cue(SoundEffect::BossPop);
    log::info!("boss defeated after {:.1}s", state.fight.timer);
}

/// Behind the white flash: fixed pose for the rest of the outro
fn lock_outro_scene(state: &mut GameState, tuning: &Tuning, sinks: &mut Sinks) {
    let ground_y = state.ground_y(tuning);
    let width = state.viewport.width;

    let player = &mut state.player;
    player.being_eaten = None;
    player.alive = true;
    player.hold = None;
    player.r = player.base_r;
    player.vy = 0.0;
    player.squash_y = 1.0;
    player.squash_target = 1.0;
    player.pos = Vec2::new(tuning.world.player_x, ground_y - player.r);

    let boss = &mut state.fight.boss;
    boss.r = player.base_r;
    boss.reset_motion();
    boss.pos = Vec2::new(boss.home_x(width), boss.floor(ground_y));
    player.mouth.dir = angle_to(player.pos, boss.pos);

    let anchors = Anchors {
        player: player.pos,
        boss: boss.pos,
        scroll_x: state.scroll_x,
    };
    if let Some(outro) = state.outro.as_mut() {
        outro.anchors = Some(anchors);
    }
    state.fight.active = false;
    sinks.hud.health_bar(None);
    sinks.hud.show_score(false);
}

/// Outro dialogue done: the boss bursts
fn start_boss_finale(state: &mut GameState, sinks: &mut Sinks) {
    let Some(outro) = state.outro.as_mut() else {
        return;
    };
    outro.start_finale();
    let boss = &state.fight.boss;
    sinks.effects.shatter(boss.pos, boss.r, Palette::Boss);
    sinks.effects.burst(boss.pos, 0.6);
    sinks.cue(SoundEffect::BossExplosion);
}

fn award_boss_bonus(state: &mut GameState, tuning: &Tuning, sinks: &mut Sinks) {
    if state.fight.bonus_awarded {
        return;
    }
    state.fight.bonus_awarded = true;
    let bonus = tuning.boss.bonus_for_time(state.fight.timer);
    if bonus > 0 {
        let p = &state.player;
        let at = Vec2::new(p.pos.x, p.pos.y - p.r * 1.6);
        state.scoring.set(state.scoring.score + bonus, sinks);
        sinks.hud.show_score(true);
        sinks.hud.pop_text(&format!("+{}", bonus), at);
    }
    sinks.cue(SoundEffect::BossBonus);
    log::info!("time bonus {} for {:.1}s", bonus, state.fight.timer);
}

fn begin_stage_clear(state: &mut GameState, sinks: &mut Sinks) {
    state.phase = GamePhase::StageClear;
    state.outro = None;
    state.fight.active = false;
    state.difficulty.boss_override = None;
    sinks.sfx_gate_closed = false;
    sinks.hud.show_score(false);
    sinks.hud.health_bar(None);
    sinks.cue(SoundEffect::StageCleared);
    log::info!("stage clear with score {}", state.scoring.score);
}

fn update_outro(state: &mut GameState, tuning: &Tuning, dt: f32, sinks: &mut Sinks) {
    let Some(outro) = state.outro.as_mut() else {
        return;
    };
    let step = outro.advance(dt, &tuning.boss, &mut state.rng);

    if step.puff {
        let boss = &state.fight.boss;
        let spread = boss.r * 1.2;
        let offset = Vec2::new(
            rand_between(&mut state.rng, -spread, spread),
            rand_between(&mut state.rng, -spread, spread * 0.5),
        );
        sinks.effects.burst(boss.pos + offset, 0.3);
    }
    if let Some(sfx) = step.sfx {
        sinks.cue(sfx);
    }

    match step.cue {
        Some(OutroCue::LockScene) => lock_outro_scene(state, tuning, sinks),
        Some(OutroCue::ClearWorld) => {
            state.clear_entities();
            state.spawner.halt();
        }
        Some(OutroCue::StartDialogue) => {
            state.dialogue = Some(Dialogue::new(Script::Outro));
            sinks.cue(SoundEffect::TextTap);
        }
        Some(OutroCue::AwardBonus) => award_boss_bonus(state, tuning, sinks),
        Some(OutroCue::Finished) => begin_stage_clear(state, sinks),
        None => {}
    }
}

/// One tick of the live world (playing or cutscene)
fn run_world(state: &mut GameState, tuning: &Tuning, dt: f32, sinks: &mut Sinks) {
    update_outro(state, tuning, dt, sinks);
    if state.phase == GamePhase::StageClear {
        return;
    }

    let outro_locked = state.outro.as_ref().is_some_and(|o| o.is_locked());
    let invulnerable = state.outro.as_ref().is_some_and(|o| o.is_invulnerable());
    let anchors = state.outro.as_ref().and_then(|o| o.anchors);
    let boss_phase = state.phase == GamePhase::Cutscene && state.fight.active && !outro_locked;
    let active = (state.phase == GamePhase::Playing || boss_phase || invulnerable) && !outro_locked;
    sinks.sfx_gate_closed = invulnerable;

    // Difficulty before anything reads spawn spacing or speed
    state.difficulty.advance(dt, tuning);
    state.difficulty.update(state.scoring.score, tuning);

    let max_scroll = if state.phase == GamePhase::Cutscene || state.is_arcade() {
        f32::INFINITY
    } else {
        state.checkpoints.finish_stop_x
    };
    let scroll = match anchors {
        Some(a) => {
            state.scroll_x = a.scroll_x;
            0.0
        }
        None => {
            let step = (state.difficulty.speed * dt).min(max_scroll - state.scroll_x).max(0.0);
            state.scroll_x += step;
            step
        }
    };

    state.player.update_hold(dt, &tuning.squash);
    state.player.attack_t = (state.player.attack_t - dt).max(0.0);
    state.toast_t = (state.toast_t - dt).max(0.0);

    let running = active && state.finish.is_none();
    if running {
        state.update_trail(dt, tuning);
    }
    update_checkpoint_progress(state, tuning, sinks);
    maybe_begin_finish_exit(state, tuning, sinks);
    state.update_spawn_timers(dt, running && state.finish.is_none(), tuning);

    let ground_y = state.ground_y(tuning);
    let width = state.viewport.width;

    // Player physics resolves before any capture check reads its position
    if let Some(a) = anchors {
        state.player.pos = a.player;
        state.player.vy = 0.0;
        state.player.squash_y = 1.0;
    } else if state.player.is_catchable() {
        let step = state.player.step(dt, ground_y, &tuning.phys);
        if active && step.landed {
            let p = &state.player;
            sinks
                .effects
                .dust_puff(Vec2::new(p.pos.x + p.r * 0.15, ground_y + 8.0), p.r * 1.8);
        }
        if step.off_top && !invulnerable {
            sinks.sfx(SoundEffect::PlayerOutside);
            sinks.effects.burst(Vec2::new(state.player.pos.x, 0.0), 0.45);
            register_death(state, tuning, sinks);
        }
    }

    let frame = Frame {
        tuning,
        dt,
        scroll,
        ground_y,
        width,
        invulnerable,
    };
    if running && state.finish.is_none() {
        update_npcs(
            &mut state.npcs,
            &mut state.player,
            &mut state.scoring,
            &mut state.difficulty,
            &frame,
            sinks,
        );
        let boss_body = boss_phase.then_some((state.fight.boss.pos, state.fight.boss.r));
        let report = update_hazards(
            &mut state.hazards,
            &mut state.npcs,
            &mut state.player,
            boss_body,
            &mut state.scoring.kills,
            &frame,
            sinks,
        );
        update_powerups(&mut state.powerups, &mut state.player, &frame, sinks);

        if boss_phase {
            for hit in report.boss_hits {
                on_boss_hit(state, tuning, hit, sinks);
            }
        }
        if report.player_killed {
            register_death(state, tuning, sinks);
        }
    } else {
        drift_npcs(&mut state.npcs, scroll);
        drift_hazards(&mut state.hazards, scroll);
        drift_powerups(&mut state.powerups, scroll);
    }

    state.player.mouth.update(dt, &tuning.mouth);
    match state.dialogue.as_mut() {
        Some(d) => {
            d.update(dt);
            state.player.mouth.open = state.player.mouth.open.max(d.mouth_open(Speaker::Player));
            state.fight.boss.mouth = d.mouth_open(Speaker::Boss);
        }
        None => state.fight.boss.mouth = 0.0,
    }

    let boss_gone = state.outro.as_ref().is_some_and(|o| o.boss_gone);
    if state.phase == GamePhase::Cutscene && !boss_gone {
        update_boss(state, tuning, dt, scroll, boss_phase, outro_locked, anchors);
    }
    if boss_phase && state.fight.timer_running {
        state.fight.timer += dt;
    }

    if state.finish.is_some() {
        update_finish_exit(state, tuning, dt, sinks);
    } else if anchors.is_none() && state.player.being_eaten.is_none() {
        state.player.pos.x = tuning.world.player_x;
    }

    if invulnerable {
        state.player.being_eaten = None;
    }
    if let Some(eater) = state.player.being_eaten.as_ref().map(|b| b.eater) {
        let mouth = state.npcs.iter().find(|n| n.id == eater).map(|n| n.mouth_point());
        if state.player.update_being_eaten(dt, mouth, tuning.eat.swallow_secs) {
            sinks.sfx(SoundEffect::NpcEatsPlayer);
            register_death(state, tuning, sinks);
        }
    }

    if anchors.is_none() && state.player.is_catchable() {
        let p = state.player.pos;
        let target = state
            .npcs
            .iter()
            .filter(|n| n.is_flying() && n.pos.x >= p.x - tuning.eat.behind_tolerance)
            .min_by(|a, b| a.pos.distance_squared(p).total_cmp(&b.pos.distance_squared(p)))
            .map(|n| n.pos);
        state.player.update_aim(dt, target);
    }
}

fn update_boss(
    state: &mut GameState,
    tuning: &Tuning,
    dt: f32,
    scroll: f32,
    boss_phase: bool,
    outro_locked: bool,
    anchors: Option<Anchors>,
) {
    let ground_y = state.ground_y(tuning);
    let width = state.viewport.width;
    let boss = &mut state.fight.boss;

    if state.player.being_eaten.is_none() {
        boss.r = state.player.r;
    }
    if let Some(a) = anchors {
        boss.pos = a.boss;
        boss.vy = 0.0;
        return;
    }

    boss.pos.x = boss.home_x(width);
    if boss_phase {
        let scroll_speed = if dt > 0.0 { scroll / dt } else { 0.0 };
        boss.fight(dt, ground_y, &state.hazards, scroll_speed, tuning, &mut state.rng);
    } else if !outro_locked {
        boss.idle(dt, ground_y);
    }
}

/// Demo player: flap toward prey, duck and bat incoming bombs, click
/// through menus and dialogue
fn autopilot(state: &GameState, tuning: &Tuning, input: &mut TickInput) {
    match state.phase {
        GamePhase::Start | GamePhase::GameOver | GamePhase::StageClear => {
            input.advance = state.time_ticks % 30 == 0;
            return;
        }
        GamePhase::Playing | GamePhase::Cutscene => {}
        _ => return,
    }
    if state.dialogue.is_some() {
        input.advance = state.time_ticks % 20 == 0;
        return;
    }

    let p = &state.player;
    let bomb_gap = state
        .hazards
        .iter()
        .filter(|h| matches!(h.state, HazardState::Fly))
        .filter(|h| h.pos.x > p.pos.x && (h.pos.y - p.pos.y).abs() < p.r + h.r + 20.0)
        .map(|h| h.pos.x - h.r - (p.pos.x + p.r))
        .fold(f32::INFINITY, f32::min);

    if let Some(hold) = p.hold {
        // Stand up right as the bomb arrives, or finish a tap
        let release = if hold.ducked {
            bomb_gap < 40.0 || bomb_gap > 240.0
        } else {
            bomb_gap > 160.0
        };
        input.release = release;
        return;
    }
    if bomb_gap < 160.0 {
        input.press = true;
        return;
    }

    let edible = |r: f32| r * (1.0 + tuning.eat.margin) <= p.r;
    let target_y = state
        .npcs
        .iter()
        .filter(|n| n.is_flying() && n.pos.x > p.pos.x && edible(n.r))
        .min_by(|a, b| a.pos.x.total_cmp(&b.pos.x))
        .map(|n| n.pos.y);
    let danger_low = state.npcs.iter().any(|n| {
        n.is_flying() && !edible(n.r) && n.pos.x > p.pos.x && n.pos.x - p.pos.x < 220.0 && n.pos.y > p.pos.y - p.r
    });

    let want_up = danger_low || target_y.is_some_and(|y| y < p.pos.y - 12.0);
    let headroom = p.pos.y > p.r * 3.0 + 40.0;
    input.press = want_up && headroom && p.vy > -120.0;
}
