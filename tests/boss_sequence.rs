//! Story finale: finish exit, intro dialogue, boss fight and outro

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use gobbler::audio::{AudioSink, SoundEffect};
use gobbler::effects::NullEffects;
use gobbler::hud::NullScore;
use gobbler::sim::tick::register_death;
use gobbler::sim::{GamePhase, Hazard, HazardState, OutroPhase};
use gobbler::{BestScores, Game, GameMode, Settings, Sinks, Tuning};

#[derive(Clone, Default)]
struct Recorder(Rc<RefCell<Vec<SoundEffect>>>);

impl AudioSink for Recorder {
    fn play(&mut self, sfx: SoundEffect) {
        self.0.borrow_mut().push(sfx);
    }
}

impl Recorder {
    fn count(&self, sfx: SoundEffect) -> usize {
        self.0.borrow().iter().filter(|s| **s == sfx).count()
    }
}

fn story_game(seed: u64) -> (Game, Recorder) {
    let rec = Recorder::default();
    let sinks = Sinks::new(Box::new(NullEffects), Box::new(rec.clone()), Box::new(NullScore));
    let settings = Settings {
        mode: GameMode::Story,
        seed,
        ..Default::default()
    };
    let mut game = Game::new(&settings, Tuning::default(), sinks, BestScores::new());
    game.press();
    game.step();
    assert_eq!(game.state.phase, GamePhase::Playing);
    (game, rec)
}

/// Warp to the finish, ride out the exit and click through the intro
fn reach_boss_fight(game: &mut Game) {
    game.input.warp_to_finish = true;
    game.step();

    for _ in 0..3000 {
        if game.state.dialogue.is_some() {
            break;
        }
        game.step();
    }
    assert_eq!(game.state.phase, GamePhase::Cutscene);
    assert!(game.state.dialogue.is_some());
    assert!(!game.state.fight.active);

    for _ in 0..60 {
        if game.state.fight.active {
            break;
        }
        game.advance();
        game.step();
    }
    assert!(game.state.fight.active);
    assert!(game.state.dialogue.is_none());

    // Quiet arena: only the bombs the test throws
    game.state.spawner.halt();
    game.state.clear_entities();
}

/// Drop a batted bomb right on the boss; it connects on the next tick
fn hit_boss(game: &mut Game) {
    let boss = game.state.fight.boss.pos;
    let id = game.state.next_entity_id();
    let mut bomb = Hazard::new(id, boss, 12.0);
    bomb.state = HazardState::Deflect {
        vel: Vec2::new(game.state.difficulty.speed, 0.0),
        bounces: 0,
    };
    game.state.hazards.push(bomb);
    game.step();
}

#[test]
fn test_finish_leads_into_boss_fight() {
    let (mut game, rec) = story_game(3);
    reach_boss_fight(&mut game);

    let t = &game.tuning;
    let s = &game.state;
    assert!(s.scoring.locked);
    assert_eq!(s.difficulty.level, 1.0);
    assert_eq!(s.fight.boss.hp, t.boss.hp_max);
    assert!(s.scroll_x >= s.checkpoints.arena_x(s.viewport.width));
    assert_eq!(rec.count(SoundEffect::EnterAutoMode), 1);
    assert!(rec.count(SoundEffect::TextTap) >= 1);
}

#[test]
fn test_boss_hits_count_down_and_start_outro_once() {
    let (mut game, rec) = story_game(5);
    reach_boss_fight(&mut game);
    let hp_max = game.tuning.boss.hp_max;

    for expected in (1..hp_max).rev() {
        hit_boss(&mut game);
        assert_eq!(game.state.fight.boss.hp, expected);
        assert!(game.state.outro.is_none());
        let snap = game.state.checkpoints.boss.unwrap();
        assert_eq!(snap.hp, expected);
    }
    assert_eq!(rec.count(SoundEffect::EatBomb), (hp_max - 1) as usize);

    hit_boss(&mut game);
    assert_eq!(game.state.fight.boss.hp, 0);
    let outro = game.state.outro.as_ref().unwrap();
    assert_eq!(outro.phase, OutroPhase::WhiteIn);
    assert_eq!(rec.count(SoundEffect::BossPop), 1);

    // Another bomb landing during the flash does not restart anything
    let t_before = game.state.outro.as_ref().unwrap().t;
    hit_boss(&mut game);
    let outro = game.state.outro.as_ref().unwrap();
    assert_eq!(outro.phase, OutroPhase::WhiteIn);
    assert!(outro.t > t_before);
    assert_eq!(rec.count(SoundEffect::BossPop), 1);
}

#[test]
fn test_outro_runs_every_phase_in_order() {
    let (mut game, rec) = story_game(9);
    reach_boss_fight(&mut game);
    let hp_max = game.tuning.boss.hp_max;
    for _ in 0..hp_max {
        hit_boss(&mut game);
    }
    let score_before = game.state.scoring.score;
    let bonus = game.tuning.boss.bonus_for_time(game.state.fight.timer);

    let mut phases = vec![game.state.outro.as_ref().unwrap().phase];
    for i in 0..6000 {
        if game.state.phase == GamePhase::StageClear {
            break;
        }
        if game.state.dialogue.is_some() && i % 5 == 0 {
            game.advance();
        }
        game.step();
        if let Some(outro) = game.state.outro.as_ref() {
            if phases.last() != Some(&outro.phase) {
                phases.push(outro.phase);
            }
        }
    }

    assert_eq!(
        phases,
        vec![
            OutroPhase::WhiteIn,
            OutroPhase::WhiteHold,
            OutroPhase::WhiteOut,
            OutroPhase::Boom,
            OutroPhase::Dialogue,
            OutroPhase::Explode,
            OutroPhase::BonusHold,
            OutroPhase::BonusPop,
            OutroPhase::FadeOut,
        ]
    );
    assert_eq!(game.state.phase, GamePhase::StageClear);
    assert!(game.state.outro.is_none());
    assert!(game.state.fight.bonus_awarded);
    assert_eq!(game.state.scoring.score, score_before + bonus);
    assert_eq!(rec.count(SoundEffect::BossBonus), 1);
    assert_eq!(rec.count(SoundEffect::StageCleared), 1);

    // Title screen on the next press
    game.press();
    game.step();
    assert_eq!(game.state.phase, GamePhase::Start);
}

#[test]
fn test_skip_boss_plays_the_full_outro() {
    let (mut game, _) = story_game(13);
    game.input.skip_boss = true;
    game.step();
    assert_eq!(game.state.phase, GamePhase::Cutscene);
    assert_eq!(game.state.fight.boss.hp, 0);

    for i in 0..6000 {
        if game.state.phase == GamePhase::StageClear {
            break;
        }
        if game.state.dialogue.is_some() && i % 5 == 0 {
            game.advance();
        }
        game.step();
    }
    assert_eq!(game.state.phase, GamePhase::StageClear);
}

#[test]
fn test_death_in_fight_restores_boss_snapshot() {
    let (mut game, _) = story_game(21);
    reach_boss_fight(&mut game);
    hit_boss(&mut game);
    hit_boss(&mut game);
    let snap = game.state.checkpoints.boss.unwrap();
    let hp_left = game.tuning.boss.hp_max - 2;
    assert_eq!(snap.hp, hp_left);

    register_death(&mut game.state, &game.tuning, &mut game.sinks);
    assert_eq!(game.state.phase, GamePhase::Dying);
    let timer = game.state.fight.timer;

    for _ in 0..600 {
        game.step();
        if game.state.phase != GamePhase::Dying {
            break;
        }
    }

    let s = &game.state;
    assert_eq!(s.phase, GamePhase::Cutscene);
    assert!(s.fight.active);
    assert!(s.scoring.locked);
    assert_eq!(s.fight.boss.hp, hp_left);
    assert_eq!(s.scoring.score, snap.score);
    assert_eq!(s.scroll_x, snap.scroll_x);
    assert_eq!(s.lives.half, game.tuning.lives.max_half - 1);
    // The fight clock keeps counting across deaths
    assert!(s.fight.timer >= timer);

    // One more hit still counts from the restored health
    game.state.spawner.halt();
    game.state.clear_entities();
    hit_boss(&mut game);
    assert_eq!(game.state.fight.boss.hp, hp_left - 1);
}
