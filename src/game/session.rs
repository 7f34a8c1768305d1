//! Session state: the phase machine, gravity, health and combo bookkeeping,
//! and the difficulty ramp. Everything here reacts to messages and publishes
//! the change messages the rest of the game listens for.

use bevy::prelude::*;
use rand::Rng;

use super::config::GameConfig;
use super::events::*;
use crate::{menus::Menu, screens::Screen};

pub(super) fn plugin(app: &mut App) {
    app.add_sub_state::<SessionState>();
    app.register_type::<GameSession>();
    app.register_type::<Difficulty>();

    app.add_systems(OnEnter(Screen::Gameplay), setup_session);
    app.add_systems(OnExit(Screen::Gameplay), teardown_session);
    app.add_systems(OnEnter(SessionState::Playing), start_ramp);
    app.add_systems(OnEnter(SessionState::GameOver), open_gameover_menu);

    app.add_systems(
        Update,
        (
            handle_start.run_if(in_state(SessionState::Waiting)),
            (apply_powerup_effects, apply_pops, apply_misses)
                .chain()
                .run_if(in_state(SessionState::Playing)),
            tick_ramp
                .run_if(in_state(SessionState::Playing))
                .run_if(resource_exists::<DifficultyRamp>),
        )
            .in_set(super::GameSystems::Session),
    );
}

/// Phases of one run. `Countdown` and `Paused` are reserved for outside
/// drivers; the session itself never enters them, and the pause overlay
/// halts the schedule instead.
#[derive(SubStates, Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
#[source(Screen = Screen::Gameplay)]
pub enum SessionState {
    #[default]
    Waiting,
    #[allow(dead_code)]
    Countdown,
    Playing,
    #[allow(dead_code)]
    Paused,
    GameOver,
}

/// The drift direction shared by every bubble in play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum Gravity {
    Up,
    Down,
    Left,
    Right,
}

impl Gravity {
    pub const ALL: [Gravity; 4] = [Gravity::Up, Gravity::Down, Gravity::Left, Gravity::Right];

    /// Unit vector entities drift along.
    pub fn unit(self) -> Vec2 {
        match self {
            Gravity::Up => Vec2::Y,
            Gravity::Down => Vec2::NEG_Y,
            Gravity::Left => Vec2::NEG_X,
            Gravity::Right => Vec2::X,
        }
    }

    /// The far wall, the side bubbles drift in from under this gravity.
    pub fn opposite(self) -> Gravity {
        match self {
            Gravity::Up => Gravity::Down,
            Gravity::Down => Gravity::Up,
            Gravity::Left => Gravity::Right,
            Gravity::Right => Gravity::Left,
        }
    }

    pub fn horizontal(self) -> bool {
        matches!(self, Gravity::Left | Gravity::Right)
    }

    /// Uniform draw over all four directions.
    pub fn random() -> Self {
        Self::ALL[rand::rng().random_range(0..Self::ALL.len())]
    }

    /// Uniform draw that never lands on `current`.
    pub fn random_other(current: Gravity) -> Self {
        loop {
            let next = Self::random();
            if next != current {
                return next;
            }
        }
    }
}

/// Health, combo and gravity for the current run. Only the systems in this
/// module write it; everyone else listens for the change messages.
#[derive(Resource, Debug, Reflect)]
#[reflect(Resource)]
pub struct GameSession {
    pub gravity: Gravity,
    pub health: f32,
    pub combo: u32,
    pub max_combo: u32,
}

impl GameSession {
    pub fn new(gravity: Gravity, health: f32) -> Self {
        Self {
            gravity,
            health,
            combo: 0,
            max_combo: 0,
        }
    }

    /// Combo bump for one pop. Returns the combo this pop counts as.
    pub fn record_pop(&mut self) -> u32 {
        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);
        self.combo
    }

    /// Damage from a missed bubble. Returns true when this miss ended the run.
    pub fn record_miss(&mut self, damage: f32) -> bool {
        self.health = (self.health - damage).max(0.0);
        self.combo = 0;
        self.health <= 0.0
    }
}

/// Interpolated difficulty values, re-read live by movement and the spawner.
#[derive(Resource, Debug, Clone, Copy, Reflect)]
#[reflect(Resource)]
pub struct Difficulty {
    pub letter_speed: f32,
    pub word_speed: f32,
    pub letter_interval: f32,
    pub word_interval: f32,
}

impl Difficulty {
    pub fn initial(config: &GameConfig) -> Self {
        Self {
            letter_speed: config.letter_speed,
            word_speed: config.word_speed,
            letter_interval: config.letter_interval,
            word_interval: config.word_interval,
        }
    }

    pub fn target(config: &GameConfig) -> Self {
        Self {
            letter_speed: config.max_letter_speed,
            word_speed: config.max_word_speed,
            letter_interval: config.min_letter_interval,
            word_interval: config.min_word_interval,
        }
    }

    fn as_change(&self) -> DifficultyChanged {
        DifficultyChanged {
            letter_speed: self.letter_speed,
            word_speed: self.word_speed,
            letter_interval: self.letter_interval,
            word_interval: self.word_interval,
        }
    }
}

/// The running interpolation from starting difficulty to the configured
/// extremes. Present only while ramping; re-inserting restarts it.
#[derive(Resource, Debug)]
pub struct DifficultyRamp {
    pub elapsed: f32,
    pub duration: f32,
    pub from: Difficulty,
    pub to: Difficulty,
}

impl DifficultyRamp {
    /// Interpolated sample at `elapsed`, pinned to the exact end values once
    /// the full duration has passed.
    pub fn sample(&self) -> Difficulty {
        if self.finished() {
            return self.to;
        }
        let t = (self.elapsed / self.duration).clamp(0.0, 1.0);
        Difficulty {
            letter_speed: lerp(self.from.letter_speed, self.to.letter_speed, t),
            word_speed: lerp(self.from.word_speed, self.to.word_speed, t),
            letter_interval: lerp(self.from.letter_interval, self.to.letter_interval, t),
            word_interval: lerp(self.from.word_interval, self.to.word_interval, t),
        }
    }

    pub fn finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

fn setup_session(
    mut commands: Commands,
    config: Res<GameConfig>,
    mut gravity_out: MessageWriter<GravityChanged>,
    mut health_out: MessageWriter<HealthChanged>,
    mut difficulty_out: MessageWriter<DifficultyChanged>,
) {
    let gravity = Gravity::random();
    commands.insert_resource(GameSession::new(gravity, config.full_health));
    let difficulty = Difficulty::initial(&config);
    commands.insert_resource(difficulty);

    gravity_out.write(GravityChanged { gravity });
    health_out.write(HealthChanged {
        health: config.full_health,
    });
    difficulty_out.write(difficulty.as_change());
    info!("Session ready, initial gravity {:?}", gravity);
}

fn teardown_session(mut commands: Commands) {
    commands.remove_resource::<GameSession>();
    commands.remove_resource::<Difficulty>();
    commands.remove_resource::<DifficultyRamp>();
}

fn handle_start(
    mut starts: MessageReader<StartRequested>,
    mut next_state: ResMut<NextState<SessionState>>,
    mut state_out: MessageWriter<SessionStateChanged>,
) {
    if starts.read().next().is_none() {
        return;
    }
    next_state.set(SessionState::Playing);
    state_out.write(SessionStateChanged {
        state: SessionState::Playing,
    });
    info!("Session started");
}

fn start_ramp(
    mut commands: Commands,
    config: Res<GameConfig>,
    difficulty: Res<Difficulty>,
    mut difficulty_out: MessageWriter<DifficultyChanged>,
) {
    let to = Difficulty::target(&config);
    if config.ramp_duration <= 0.0 {
        warn!(
            "Ramp duration {} is not positive, jumping straight to the end values",
            config.ramp_duration
        );
        commands.insert_resource(to);
        difficulty_out.write(to.as_change());
        return;
    }
    commands.insert_resource(DifficultyRamp {
        elapsed: 0.0,
        duration: config.ramp_duration,
        from: *difficulty,
        to,
    });
}

fn tick_ramp(
    mut commands: Commands,
    time: Res<Time>,
    mut ramp: ResMut<DifficultyRamp>,
    mut difficulty: ResMut<Difficulty>,
    mut difficulty_out: MessageWriter<DifficultyChanged>,
) {
    ramp.elapsed += time.delta_secs();
    *difficulty = ramp.sample();
    difficulty_out.write(difficulty.as_change());
    if ramp.finished() {
        commands.remove_resource::<DifficultyRamp>();
        info!("Difficulty ramp complete");
    }
}

fn apply_pops(
    mut session: ResMut<GameSession>,
    mut pops: MessageReader<BubblePopped>,
    mut combo_out: MessageWriter<ComboChanged>,
    mut scored_out: MessageWriter<BubbleScored>,
) {
    for pop in pops.read() {
        let combo = session.record_pop();
        combo_out.write(ComboChanged { combo });
        scored_out.write(BubbleScored {
            points: pop.points,
            combo,
            position: pop.position,
        });
    }
}

fn apply_misses(
    mut session: ResMut<GameSession>,
    mut misses: MessageReader<BubbleMissed>,
    mut next_state: ResMut<NextState<SessionState>>,
    mut health_out: MessageWriter<HealthChanged>,
    mut combo_out: MessageWriter<ComboChanged>,
    mut state_out: MessageWriter<SessionStateChanged>,
) {
    for miss in misses.read() {
        // Further misses on the death frame change nothing.
        if session.health <= 0.0 {
            continue;
        }
        let died = session.record_miss(miss.damage);
        health_out.write(HealthChanged {
            health: session.health,
        });
        combo_out.write(ComboChanged { combo: 0 });
        if died {
            next_state.set(SessionState::GameOver);
            state_out.write(SessionStateChanged {
                state: SessionState::GameOver,
            });
            info!("Session over, max combo {}", session.max_combo);
        }
    }
}

fn apply_powerup_effects(
    config: Res<GameConfig>,
    mut session: ResMut<GameSession>,
    mut heals: MessageReader<HealPlayer>,
    mut shifts: MessageReader<ShiftGravity>,
    mut restores: MessageReader<RestoreFullHealth>,
    mut health_out: MessageWriter<HealthChanged>,
    mut gravity_out: MessageWriter<GravityChanged>,
) {
    for _ in heals.read() {
        // At or above the ceiling the sip is wasted, silently.
        if session.health < config.heal_ceiling {
            session.health = (session.health + config.heal_amount).min(config.heal_ceiling);
            health_out.write(HealthChanged {
                health: session.health,
            });
        }
    }
    for _ in shifts.read() {
        let gravity = Gravity::random_other(session.gravity);
        session.gravity = gravity;
        gravity_out.write(GravityChanged { gravity });
        info!("Gravity shifted to {:?}", gravity);
    }
    for _ in restores.read() {
        session.health = config.full_health;
        health_out.write(HealthChanged {
            health: session.health,
        });
    }
}

fn open_gameover_menu(mut next_menu: ResMut<NextState<Menu>>) {
    next_menu.set(Menu::GameOver);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::state::app::StatesPlugin;

    fn playing_app() -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, StatesPlugin));
        app.init_state::<Screen>();
        app.add_sub_state::<SessionState>();
        app.add_message::<StartRequested>();
        app.add_message::<SessionStateChanged>();
        app.add_message::<GravityChanged>();
        app.add_message::<HealthChanged>();
        app.add_message::<ComboChanged>();
        app.add_message::<BubblePopped>();
        app.add_message::<BubbleMissed>();
        app.add_message::<BubbleScored>();
        app.add_message::<HealPlayer>();
        app.add_message::<ShiftGravity>();
        app.add_message::<RestoreFullHealth>();
        app.insert_resource(GameConfig::default());
        app.insert_resource(GameSession::new(Gravity::Down, 1.0));
        app.add_systems(
            Update,
            (
                handle_start.run_if(in_state(SessionState::Waiting)),
                (apply_powerup_effects, apply_pops, apply_misses)
                    .chain()
                    .run_if(in_state(SessionState::Playing)),
            ),
        );
        app.world_mut()
            .resource_mut::<NextState<Screen>>()
            .set(Screen::Gameplay);
        app.update();
        app
    }

    fn enter_playing(app: &mut App) {
        app.world_mut()
            .resource_mut::<NextState<SessionState>>()
            .set(SessionState::Playing);
        app.update();
    }

    fn write<M: Message>(app: &mut App, message: M) {
        app.world_mut().resource_mut::<Messages<M>>().write(message);
    }

    fn drain<M: Message>(app: &mut App) -> Vec<M> {
        app.world_mut()
            .resource_mut::<Messages<M>>()
            .drain()
            .collect()
    }

    fn state(app: &App) -> SessionState {
        *app.world().resource::<State<SessionState>>().get()
    }

    #[test]
    fn pop_bumps_combo_and_high_water_mark() {
        let mut session = GameSession::new(Gravity::Down, 1.0);
        assert_eq!(session.record_pop(), 1);
        assert_eq!(session.record_pop(), 2);
        assert_eq!(session.record_pop(), 3);
        assert_eq!(session.max_combo, 3);
        session.record_miss(0.1);
        assert_eq!(session.combo, 0);
        assert_eq!(session.max_combo, 3);
        assert_eq!(session.record_pop(), 1);
        assert_eq!(session.max_combo, 3);
    }

    #[test]
    fn miss_floors_health_at_zero_and_reports_death() {
        let mut session = GameSession::new(Gravity::Down, 1.0);
        assert!(!session.record_miss(0.95));
        assert!((session.health - 0.05).abs() < f32::EPSILON);
        assert!(session.record_miss(0.95));
        assert_eq!(session.health, 0.0);
    }

    #[test]
    fn gravity_reroll_never_repeats() {
        for current in Gravity::ALL {
            for _ in 0..200 {
                assert_ne!(Gravity::random_other(current), current);
            }
        }
    }

    #[test]
    fn ramp_interpolates_and_pins_exact_end_values() {
        let ramp = DifficultyRamp {
            elapsed: 60.0,
            duration: 120.0,
            from: Difficulty {
                letter_speed: 70.0,
                word_speed: 50.0,
                letter_interval: 2.0,
                word_interval: 9.0,
            },
            to: Difficulty {
                letter_speed: 160.0,
                word_speed: 110.0,
                letter_interval: 0.7,
                word_interval: 4.0,
            },
        };
        let halfway = ramp.sample();
        assert_eq!(halfway.letter_speed, 115.0);
        assert_eq!(halfway.word_interval, 6.5);

        let done = DifficultyRamp {
            elapsed: 120.0,
            ..ramp
        };
        assert!(done.finished());
        assert_eq!(done.sample().letter_speed, 160.0);
        assert_eq!(done.sample().letter_interval, 0.7);

        let overshot = DifficultyRamp {
            elapsed: 500.0,
            ..done
        };
        assert_eq!(overshot.sample().word_speed, 110.0);
    }

    #[test]
    fn zero_duration_ramp_is_already_finished() {
        let flat = Difficulty {
            letter_speed: 70.0,
            word_speed: 50.0,
            letter_interval: 2.0,
            word_interval: 9.0,
        };
        let ramp = DifficultyRamp {
            elapsed: 0.0,
            duration: 0.0,
            from: flat,
            to: flat,
        };
        assert!(ramp.finished());
    }

    #[test]
    fn start_only_works_while_waiting() {
        let mut app = playing_app();
        assert_eq!(state(&app), SessionState::Waiting);

        write(&mut app, StartRequested);
        app.update();
        app.update();
        assert_eq!(state(&app), SessionState::Playing);
        assert_eq!(drain::<SessionStateChanged>(&mut app).len(), 1);

        // A second request mid-run changes nothing.
        write(&mut app, StartRequested);
        app.update();
        assert!(drain::<SessionStateChanged>(&mut app).is_empty());
        assert_eq!(state(&app), SessionState::Playing);
    }

    #[test]
    fn pops_cascade_into_combo_and_scored_messages() {
        let mut app = playing_app();
        enter_playing(&mut app);
        drain::<ComboChanged>(&mut app);

        for _ in 0..3 {
            write(
                &mut app,
                BubblePopped {
                    points: 20,
                    position: Vec2::ZERO,
                },
            );
        }
        app.update();

        let combos: Vec<u32> = drain::<ComboChanged>(&mut app)
            .iter()
            .map(|m| m.combo)
            .collect();
        assert_eq!(combos, vec![1, 2, 3]);
        let scored = drain::<BubbleScored>(&mut app);
        assert_eq!(scored.len(), 3);
        assert_eq!(scored[2].combo, 3);
        assert_eq!(scored[2].points, 20);
        assert_eq!(app.world().resource::<GameSession>().max_combo, 3);
    }

    #[test]
    fn boundary_miss_still_bumps_max_combo_before_the_reset() {
        let mut app = playing_app();
        enter_playing(&mut app);
        drain::<ComboChanged>(&mut app);

        // A boundary escape publishes a zero-point pop first, then the miss.
        write(
            &mut app,
            BubblePopped {
                points: 0,
                position: Vec2::ZERO,
            },
        );
        write(&mut app, BubbleMissed { damage: 0.1 });
        app.update();

        let session = app.world().resource::<GameSession>();
        assert_eq!(session.combo, 0);
        assert_eq!(session.max_combo, 1);
        assert!((session.health - 0.9).abs() < 1e-6);
        let combos: Vec<u32> = drain::<ComboChanged>(&mut app)
            .iter()
            .map(|m| m.combo)
            .collect();
        assert_eq!(combos, vec![1, 0]);
    }

    #[test]
    fn lethal_misses_transition_exactly_once() {
        let mut app = playing_app();
        enter_playing(&mut app);
        drain::<SessionStateChanged>(&mut app);

        write(&mut app, BubbleMissed { damage: 0.6 });
        write(&mut app, BubbleMissed { damage: 0.6 });
        app.update();
        app.update();

        assert_eq!(state(&app), SessionState::GameOver);
        assert_eq!(app.world().resource::<GameSession>().health, 0.0);
        let changes = drain::<SessionStateChanged>(&mut app);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].state, SessionState::GameOver);
    }

    #[test]
    fn heal_respects_the_ceiling() {
        let mut app = playing_app();
        enter_playing(&mut app);
        drain::<HealthChanged>(&mut app);

        // At full health the sip is wasted without a message.
        write(&mut app, HealPlayer);
        app.update();
        assert!(drain::<HealthChanged>(&mut app).is_empty());

        app.world_mut().resource_mut::<GameSession>().health = 0.5;
        write(&mut app, HealPlayer);
        app.update();
        let session = app.world().resource::<GameSession>();
        assert!((session.health - 0.55).abs() < 1e-6);
        assert_eq!(drain::<HealthChanged>(&mut app).len(), 1);
    }

    #[test]
    fn full_restore_always_publishes() {
        let mut app = playing_app();
        enter_playing(&mut app);
        drain::<HealthChanged>(&mut app);

        app.world_mut().resource_mut::<GameSession>().health = 0.2;
        write(&mut app, RestoreFullHealth);
        app.update();
        assert_eq!(app.world().resource::<GameSession>().health, 1.0);
        assert_eq!(drain::<HealthChanged>(&mut app).len(), 1);
    }

    #[test]
    fn gravity_shift_publishes_a_new_direction() {
        let mut app = playing_app();
        enter_playing(&mut app);
        drain::<GravityChanged>(&mut app);

        write(&mut app, ShiftGravity);
        app.update();
        let changes = drain::<GravityChanged>(&mut app);
        assert_eq!(changes.len(), 1);
        assert_ne!(changes[0].gravity, Gravity::Down);
        assert_eq!(app.world().resource::<GameSession>().gravity, changes[0].gravity);
    }
}
