//! The main game module for the typing arcade.
//!
//! This module contains all the gameplay logic including:
//! - Letter and word bubbles drifting under shifting gravity
//! - Click-to-pop and drag-to-merge input
//! - Twin spawn loops and the difficulty ramp
//! - The power-up inventory and its seven effects
//! - Session health, combo and scoring

mod boundary;
mod bubble;
mod config;
mod events;
pub mod highscore;
mod hud;
mod input;
mod inventory;
mod polish;
mod powerup;
pub mod score;
pub mod session;
mod spawner;
mod word;

use bevy::prelude::*;

use crate::{AppSystems, PausableSystems, screens::Screen};

/// Half extents of the play area, in world units.
pub(crate) const ARENA_HALF_WIDTH: f32 = 430.0;
pub(crate) const ARENA_HALF_HEIGHT: f32 = 280.0;

const ARENA_BACKDROP: Color = Color::srgb(0.106, 0.094, 0.161);

pub(super) fn plugin(app: &mut App) {
    app.configure_sets(
        Update,
        (
            GameSystems::Effects,
            GameSystems::Entities,
            GameSystems::Collection,
            GameSystems::Spawning,
            GameSystems::Session,
            GameSystems::Scoring,
            GameSystems::Presentation,
        )
            .chain()
            .in_set(AppSystems::Update)
            .in_set(PausableSystems),
    );
    app.configure_sets(
        FixedUpdate,
        (FixedGameSystems::Drift, FixedGameSystems::Contacts)
            .chain()
            .in_set(PausableSystems),
    );

    app.add_plugins((
        config::plugin,
        events::plugin,
        session::plugin,
        input::plugin,
        bubble::plugin,
        word::plugin,
        boundary::plugin,
        spawner::plugin,
        powerup::plugin,
        inventory::plugin,
        score::plugin,
        highscore::plugin,
        hud::plugin,
        polish::plugin,
    ));
}

/// Frame-rate systems, ordered so every message lands the frame it was
/// written: slot uses fire first, entities react, collections bank, the
/// spawner retunes, then the session applies pops and misses before the
/// scoring and readouts repaint.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum GameSystems {
    Effects,
    Entities,
    Collection,
    Spawning,
    Session,
    Scoring,
    Presentation,
}

/// Fixed-step movement and the contact sweeps that depend on it.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum FixedGameSystems {
    Drift,
    Contacts,
}

/// System to spawn the arena backdrop when entering gameplay.
/// Called from `screens/gameplay.rs` on `OnEnter(Screen::Gameplay)`.
pub fn spawn_arena(mut commands: Commands) {
    commands.spawn((
        Name::new("Arena"),
        Transform::default(),
        Visibility::default(),
        DespawnOnExit(Screen::Gameplay),
    ));

    commands.spawn((
        Name::new("Arena Backdrop"),
        Sprite::from_color(
            ARENA_BACKDROP,
            Vec2::new(ARENA_HALF_WIDTH * 2.0, ARENA_HALF_HEIGHT * 2.0),
        ),
        Transform::from_xyz(0.0, 0.0, -1.0),
        DespawnOnExit(Screen::Gameplay),
    ));
}
