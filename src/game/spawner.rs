//! Twin spawn loops feeding the arena: one for letter bubbles, one for
//! word bubbles. Both draw entry points from the wall opposite gravity.

use std::time::Duration;

use bevy::prelude::*;
use rand::Rng;

use super::bubble::{random_letter, spawn_letter_bubble};
use super::config::GameConfig;
use super::events::*;
use super::powerup::PowerUp;
use super::session::{Difficulty, GameSession, Gravity, SessionState};
use super::word::spawn_word_bubble;
use super::{ARENA_HALF_HEIGHT, ARENA_HALF_WIDTH};
use crate::screens::Screen;

/// How far outside the wall new bubbles appear.
const SPAWN_OFFSET: f32 = 40.0;
/// Keeps entry points away from the corners.
const SPAWN_INSET: f32 = 40.0;

pub(super) fn plugin(app: &mut App) {
    app.add_systems(OnEnter(SessionState::Playing), start_spawn_loops);
    app.add_systems(OnEnter(SessionState::GameOver), stop_spawn_loops);
    app.add_systems(OnExit(Screen::Gameplay), stop_spawn_loops);

    app.add_systems(
        Update,
        (
            cache_intervals,
            apply_spawn_freeze,
            retarget_spawn_points,
            release_budget,
            run_spawn_loops,
        )
            .chain()
            .in_set(super::GameSystems::Spawning)
            .run_if(in_state(SessionState::Playing).and(resource_exists::<SpawnLoops>)),
    );
}

/// Both spawn timers plus their current intervals. Present only while a
/// round is running; removing it is how the loops stop.
#[derive(Resource, Debug)]
pub(super) struct SpawnLoops {
    letters: Timer,
    words: Timer,
    letter_interval: f32,
    word_interval: f32,
    frozen: bool,
}

impl SpawnLoops {
    fn new(letter_interval: f32, word_interval: f32) -> Self {
        Self {
            letters: Timer::from_seconds(letter_interval.max(0.0), TimerMode::Repeating),
            words: Timer::from_seconds(word_interval.max(0.0), TimerMode::Repeating),
            letter_interval,
            word_interval,
            frozen: false,
        }
    }
}

/// Live counts of spawned bubbles, decremented as pop reports come in.
/// Animating corpses no longer count against the caps.
#[derive(Resource, Debug, Default)]
pub(super) struct SpawnBudget {
    letters: u32,
    words: u32,
}

impl SpawnBudget {
    fn release_letter(&mut self) {
        self.letters = self.letters.saturating_sub(1);
    }

    fn release_word(&mut self) {
        self.words = self.words.saturating_sub(1);
    }
}

/// Entry points lining the current spawn wall, drawn without replacement
/// so consecutive spawns spread out before any slot repeats.
#[derive(Resource, Debug)]
pub(super) struct SpawnPoints {
    wall: Gravity,
    per_wall: usize,
    pool: Vec<Vec2>,
    working: Vec<Vec2>,
}

impl SpawnPoints {
    fn facing(gravity: Gravity, per_wall: usize) -> Self {
        let wall = gravity.opposite();
        Self {
            wall,
            per_wall,
            pool: generate(wall, per_wall),
            working: Vec::new(),
        }
    }

    fn retarget(&mut self, gravity: Gravity) {
        self.wall = gravity.opposite();
        self.pool = generate(self.wall, self.per_wall);
        self.working.clear();
    }

    fn take_point(&mut self) -> Option<Vec2> {
        if self.pool.is_empty() {
            return None;
        }
        if self.working.is_empty() {
            self.working = self.pool.clone();
        }
        let index = rand::rng().random_range(0..self.working.len());
        Some(self.working.swap_remove(index))
    }
}

fn generate(wall: Gravity, count: usize) -> Vec<Vec2> {
    let mut points = Vec::with_capacity(count);
    for i in 0..count {
        let t = (i as f32 + 0.5) / count as f32;
        points.push(match wall {
            Gravity::Up => Vec2::new(span(t, ARENA_HALF_WIDTH), ARENA_HALF_HEIGHT + SPAWN_OFFSET),
            Gravity::Down => {
                Vec2::new(span(t, ARENA_HALF_WIDTH), -(ARENA_HALF_HEIGHT + SPAWN_OFFSET))
            }
            Gravity::Left => {
                Vec2::new(-(ARENA_HALF_WIDTH + SPAWN_OFFSET), span(t, ARENA_HALF_HEIGHT))
            }
            Gravity::Right => {
                Vec2::new(ARENA_HALF_WIDTH + SPAWN_OFFSET, span(t, ARENA_HALF_HEIGHT))
            }
        });
    }
    points
}

fn span(t: f32, half: f32) -> f32 {
    let limit = half - SPAWN_INSET;
    -limit + t * 2.0 * limit
}

fn start_spawn_loops(
    mut commands: Commands,
    config: Res<GameConfig>,
    session: Res<GameSession>,
    difficulty: Res<Difficulty>,
    existing: Option<Res<SpawnLoops>>,
) {
    // Re-entering play must not stack a second pair of loops.
    if existing.is_some() {
        return;
    }
    commands.insert_resource(SpawnLoops::new(
        difficulty.letter_interval,
        difficulty.word_interval,
    ));
    commands.insert_resource(SpawnBudget::default());
    commands.insert_resource(SpawnPoints::facing(
        session.gravity,
        config.spawn_points_per_wall,
    ));
}

fn stop_spawn_loops(mut commands: Commands) {
    commands.remove_resource::<SpawnLoops>();
    commands.remove_resource::<SpawnBudget>();
    commands.remove_resource::<SpawnPoints>();
}

/// Retuned intervals land on the next timer reset, not mid-cycle.
fn cache_intervals(
    mut loops: ResMut<SpawnLoops>,
    mut changes: MessageReader<DifficultyChanged>,
) {
    for change in changes.read() {
        loops.letter_interval = change.letter_interval;
        loops.word_interval = change.word_interval;
    }
}

fn apply_spawn_freeze(
    mut loops: ResMut<SpawnLoops>,
    mut changes: MessageReader<SpawnFreezeChanged>,
) {
    for change in changes.read() {
        // Last write wins; every bubble broadcasts its own lock and release.
        loops.frozen = change.frozen;
    }
}

fn retarget_spawn_points(
    mut points: ResMut<SpawnPoints>,
    mut changes: MessageReader<GravityChanged>,
) {
    for change in changes.read() {
        points.retarget(change.gravity);
    }
}

fn release_budget(
    mut budget: ResMut<SpawnBudget>,
    mut pops: MessageReader<BubblePopped>,
    mut destroyed: MessageReader<WordDestroyed>,
) {
    for _ in pops.read() {
        budget.release_letter();
    }
    for _ in destroyed.read() {
        budget.release_word();
    }
}

fn run_spawn_loops(
    mut commands: Commands,
    time: Res<Time>,
    config: Res<GameConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    mut loops: ResMut<SpawnLoops>,
    mut budget: ResMut<SpawnBudget>,
    mut points: ResMut<SpawnPoints>,
) {
    if loops.letters.tick(time.delta()).just_finished() {
        let interval = loops.letter_interval.max(0.0);
        loops.letters.set_duration(Duration::from_secs_f32(interval));
        // A frozen loop still consumes its tick.
        if !loops.frozen && budget.letters < config.max_letters {
            match points.take_point() {
                Some(point) => {
                    let letter = random_letter(&config);
                    spawn_letter_bubble(&mut commands, &mut meshes, &mut materials, point, letter);
                    budget.letters += 1;
                }
                None => warn!("No spawn points configured, skipping letter spawn"),
            }
        }
    }

    if loops.words.tick(time.delta()).just_finished() {
        let interval = loops.word_interval.max(0.0);
        loops.words.set_duration(Duration::from_secs_f32(interval));
        if !loops.frozen && budget.words < config.max_words {
            match points.take_point() {
                Some(point) => {
                    spawn_word_bubble(
                        &mut commands,
                        &mut meshes,
                        &mut materials,
                        point,
                        PowerUp::random(),
                    );
                    budget.words += 1;
                }
                None => warn!("No spawn points configured, skipping word spawn"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::bubble::LetterBubble;
    use crate::game::word::WordBubble;

    #[test]
    fn points_draw_without_replacement_until_refill() {
        let mut points = SpawnPoints::facing(Gravity::Down, 6);
        let mut seen = Vec::new();
        for _ in 0..6 {
            let point = points.take_point().unwrap();
            assert!(!seen.contains(&point));
            seen.push(point);
        }
        assert!(points.take_point().is_some());
    }

    #[test]
    fn empty_wall_yields_no_points() {
        let mut points = SpawnPoints::facing(Gravity::Down, 0);
        assert!(points.take_point().is_none());
    }

    #[test]
    fn points_line_the_wall_opposite_gravity() {
        let mut points = SpawnPoints::facing(Gravity::Down, 4);
        for _ in 0..4 {
            let point = points.take_point().unwrap();
            assert!(point.y > ARENA_HALF_HEIGHT);
            assert!(point.x.abs() < ARENA_HALF_WIDTH);
        }
        points.retarget(Gravity::Right);
        for _ in 0..4 {
            let point = points.take_point().unwrap();
            assert!(point.x < -ARENA_HALF_WIDTH);
        }
    }

    #[test]
    fn budget_release_saturates_at_zero() {
        let mut budget = SpawnBudget::default();
        budget.release_letter();
        assert_eq!(budget.letters, 0);
        budget.letters = 2;
        budget.release_letter();
        assert_eq!(budget.letters, 1);
    }

    #[test]
    fn loops_spawn_up_to_the_letter_cap() {
        let mut app = spawn_app();
        for _ in 0..5 {
            app.update();
        }
        assert_eq!(count::<LetterBubble>(&mut app), 3);
        assert_eq!(count::<WordBubble>(&mut app), 0);
    }

    #[test]
    fn frozen_loops_consume_ticks_without_spawning() {
        let mut app = spawn_app();
        app.world_mut().resource_mut::<SpawnLoops>().frozen = true;
        for _ in 0..4 {
            app.update();
        }
        assert_eq!(count::<LetterBubble>(&mut app), 0);

        app.world_mut().resource_mut::<SpawnLoops>().frozen = false;
        app.update();
        assert_eq!(count::<LetterBubble>(&mut app), 1);
    }

    fn spawn_app() -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, bevy::state::app::StatesPlugin));
        app.init_state::<crate::screens::Screen>();
        app.init_resource::<Assets<Mesh>>();
        app.init_resource::<Assets<ColorMaterial>>();
        let mut config = GameConfig::default();
        config.max_letters = 3;
        app.insert_resource(config);
        // Zero-length letter interval fires every update; words stay quiet.
        app.insert_resource(SpawnLoops::new(0.0, 1000.0));
        app.insert_resource(SpawnBudget::default());
        app.insert_resource(SpawnPoints::facing(Gravity::Down, 6));
        app.add_systems(Update, run_spawn_loops);
        app
    }

    fn count<C: Component>(app: &mut App) -> usize {
        let mut query = app.world_mut().query::<&C>();
        query.iter(app.world()).count()
    }
}
