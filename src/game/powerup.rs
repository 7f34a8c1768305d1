//! The seven collectible power-ups and the dispatcher that turns a used
//! slot into its effect. All uses share one cooldown; a use that lands
//! during it fizzles, and the slot is still spent.

use bevy::prelude::*;

use super::bubble::random_letter;
use super::config::GameConfig;
use super::events::*;
use super::session::SessionState;
use crate::{AppSystems, PausableSystems, screens::Screen};

pub(super) fn plugin(app: &mut App) {
    app.register_type::<PowerUp>();

    app.add_systems(
        Update,
        (
            tick_cooldown
                .in_set(AppSystems::TickTimers)
                .in_set(PausableSystems),
            dispatch_uses.in_set(super::GameSystems::Effects),
        )
            .run_if(in_state(Screen::Gameplay)),
    );
    app.add_systems(OnExit(Screen::Gameplay), clear_cooldown);
}

/// All power-up types, named for a day in a developer's life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum PowerUp {
    Coffee,
    Debug,
    Refactor,
    Push,
    Pull,
    Commit,
    Hotfix,
}

impl PowerUp {
    pub const ALL: [PowerUp; 7] = [
        PowerUp::Coffee,
        PowerUp::Debug,
        PowerUp::Refactor,
        PowerUp::Push,
        PowerUp::Pull,
        PowerUp::Commit,
        PowerUp::Hotfix,
    ];

    /// The word shown on word bubbles carrying this power-up.
    pub fn word(&self) -> &'static str {
        match self {
            PowerUp::Coffee => "COFFEE",
            PowerUp::Debug => "DEBUG",
            PowerUp::Refactor => "REFACTOR",
            PowerUp::Push => "PUSH",
            PowerUp::Pull => "PULL",
            PowerUp::Commit => "COMMIT",
            PowerUp::Hotfix => "HOTFIX",
        }
    }

    /// Short effect description for the HUD.
    pub fn description(&self) -> &'static str {
        match self {
            PowerUp::Coffee => "Restores a sip of health",
            PowerUp::Debug => "Freezes every bubble in place",
            PowerUp::Refactor => "Scrambles every letter",
            PowerUp::Push => "Pops everything on screen",
            PowerUp::Pull => "Yanks gravity somewhere new",
            PowerUp::Commit => "Restores full health",
            PowerUp::Hotfix => "Rewrites every letter to one fix",
        }
    }

    /// Uniform draw over all seven.
    pub fn random() -> Self {
        use rand::Rng;
        Self::ALL[rand::rng().random_range(0..Self::ALL.len())]
    }
}

/// Shared cooldown across all slots. Present only while cooling.
#[derive(Resource, Debug)]
pub(super) struct UseCooldown(Timer);

fn tick_cooldown(
    time: Res<Time>,
    cooldown: Option<ResMut<UseCooldown>>,
    mut commands: Commands,
) {
    let Some(mut cooldown) = cooldown else { return };
    if cooldown.0.tick(time.delta()).finished() {
        commands.remove_resource::<UseCooldown>();
    }
}

fn clear_cooldown(mut commands: Commands) {
    commands.remove_resource::<UseCooldown>();
}

pub(super) fn dispatch_uses(
    mut commands: Commands,
    config: Res<GameConfig>,
    state: Res<State<SessionState>>,
    cooldown: Option<Res<UseCooldown>>,
    mut uses: MessageReader<PowerUpUsed>,
    mut heal_out: MessageWriter<HealPlayer>,
    mut freeze_out: MessageWriter<FreezeAllBubbles>,
    mut scramble_out: MessageWriter<ScrambleAllBubbles>,
    mut push_out: MessageWriter<PushAllBubbles>,
    mut shift_out: MessageWriter<ShiftGravity>,
    mut restore_out: MessageWriter<RestoreFullHealth>,
) {
    let mut cooling = cooldown.is_some();
    for used in uses.read() {
        if *state.get() != SessionState::Playing {
            continue;
        }
        // The slot is spent either way; cooldown only swallows the effect.
        if cooling {
            debug!("Power-up {:?} fizzled, cooldown active", used.power);
            continue;
        }
        match used.power {
            PowerUp::Coffee => {
                heal_out.write(HealPlayer);
            }
            PowerUp::Debug => {
                freeze_out.write(FreezeAllBubbles);
            }
            PowerUp::Refactor => {
                scramble_out.write(ScrambleAllBubbles { reveal: None });
            }
            PowerUp::Push => {
                push_out.write(PushAllBubbles);
            }
            PowerUp::Pull => {
                shift_out.write(ShiftGravity);
            }
            PowerUp::Commit => {
                restore_out.write(RestoreFullHealth);
            }
            PowerUp::Hotfix => {
                scramble_out.write(ScrambleAllBubbles {
                    reveal: Some(random_letter(&config)),
                });
            }
        }
        commands.insert_resource(UseCooldown(Timer::from_seconds(
            config.powerup_cooldown,
            TimerMode::Once,
        )));
        cooling = true;
        info!("Power-up {:?} used from slot {}", used.power, used.slot);
    }
}
