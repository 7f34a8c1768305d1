//! Game polish/juice effects - screen shake, pop animations, floating
//! score text, and the sound hookups.

use bevy::prelude::*;
use rand::Rng;

use super::events::*;
use super::score::points_scored;
use super::session::SessionState;
use crate::audio::sound_effect;
use crate::{PausableSystems, screens::Screen};

pub(super) fn plugin(app: &mut App) {
    // Screen shake
    app.init_resource::<ScreenShake>();
    app.add_systems(
        Update,
        (trigger_shake_on_misses, apply_screen_shake)
            .chain()
            .in_set(PausableSystems)
            .run_if(in_state(Screen::Gameplay)),
    );

    // Pop animation
    app.add_systems(
        Update,
        animate_pop
            .in_set(PausableSystems)
            .run_if(in_state(Screen::Gameplay)),
    );

    // Floating score text
    app.add_systems(
        Update,
        (spawn_floating_text, animate_floating_text)
            .in_set(PausableSystems)
            .run_if(in_state(Screen::Gameplay)),
    );

    // Sounds react to the same messages the scoring does. The use sound
    // keys off the slot being spent, not the effect landing, so a use
    // swallowed by the cooldown still clicks.
    app.add_systems(
        Update,
        (
            play_gameplay_sounds,
            play_use_sounds.run_if(in_state(SessionState::Playing)),
        )
            .in_set(PausableSystems)
            .run_if(in_state(Screen::Gameplay)),
    );
}

// =============================================================================
// SCREEN SHAKE
// =============================================================================

/// Resource tracking screen shake state.
#[derive(Resource, Default)]
pub struct ScreenShake {
    /// Current trauma level (0.0 to 1.0).
    pub trauma: f32,
    /// Base position to return to.
    pub base_position: Vec3,
}

/// Maximum shake offset in pixels.
const MAX_SHAKE_OFFSET: f32 = 10.0;
/// How fast trauma decays per second.
const TRAUMA_DECAY: f32 = 2.5;

/// Escaped bubbles rattle the camera in proportion to the health they cost.
fn trigger_shake_on_misses(
    mut shake: ResMut<ScreenShake>,
    mut misses: MessageReader<BubbleMissed>,
) {
    for miss in misses.read() {
        let intensity = (miss.damage * 4.0).clamp(0.3, 0.85);
        shake.trauma = (shake.trauma + intensity).min(1.0);
    }
}

/// Apply screen shake to camera.
fn apply_screen_shake(
    time: Res<Time>,
    mut shake: ResMut<ScreenShake>,
    mut camera_query: Query<&mut Transform, With<Camera2d>>,
) {
    let Ok(mut camera_transform) = camera_query.single_mut() else {
        return;
    };

    if shake.trauma > 0.0 {
        let mut rng = rand::rng();

        // Shake amount = trauma^2 (makes it feel more natural)
        let shake_amount = shake.trauma * shake.trauma;

        let offset_x = rng.random_range(-1.0..1.0) * MAX_SHAKE_OFFSET * shake_amount;
        let offset_y = rng.random_range(-1.0..1.0) * MAX_SHAKE_OFFSET * shake_amount;

        camera_transform.translation.x = shake.base_position.x + offset_x;
        camera_transform.translation.y = shake.base_position.y + offset_y;

        shake.trauma = (shake.trauma - TRAUMA_DECAY * time.delta_secs()).max(0.0);
    } else {
        camera_transform.translation.x = shake.base_position.x;
        camera_transform.translation.y = shake.base_position.y;
    }
}

// =============================================================================
// POP ANIMATION
// =============================================================================

/// Component for bubbles that are popping (scale up then despawn).
/// Inserting it is the hand-off: the owner stops simulating the entity and
/// this module removes it when the animation lands.
#[derive(Component)]
pub struct PopAnimation {
    /// Time elapsed in the animation.
    pub timer: f32,
    /// Total animation duration.
    pub duration: f32,
    /// Starting scale.
    pub start_scale: Vec3,
    /// Target scale at peak.
    pub peak_scale: Vec3,
}

impl Default for PopAnimation {
    fn default() -> Self {
        Self {
            timer: 0.0,
            duration: 0.15,
            start_scale: Vec3::ONE,
            peak_scale: Vec3::splat(1.4),
        }
    }
}

/// Animate popping bubbles and despawn when done.
fn animate_pop(
    mut commands: Commands,
    time: Res<Time>,
    mut query: Query<(Entity, &mut Transform, &mut PopAnimation)>,
) {
    for (entity, mut transform, mut pop) in &mut query {
        pop.timer += time.delta_secs();
        let progress = (pop.timer / pop.duration).min(1.0);

        // Scale up quickly, then shrink to nothing
        let scale = if progress < 0.5 {
            let t = progress * 2.0;
            pop.start_scale.lerp(pop.peak_scale, t)
        } else {
            let t = (progress - 0.5) * 2.0;
            pop.peak_scale.lerp(Vec3::ZERO, t)
        };

        transform.scale = scale;

        if progress >= 1.0 {
            commands.entity(entity).despawn();
        }
    }
}

// =============================================================================
// FLOATING SCORE TEXT
// =============================================================================

/// Component for floating score text.
#[derive(Component)]
pub struct FloatingText {
    /// Time elapsed.
    pub timer: f32,
    /// Total duration.
    pub duration: f32,
    /// Starting position.
    pub start_y: f32,
    /// Float distance.
    pub float_distance: f32,
}

/// Spawn floating text where a scoring pop landed.
fn spawn_floating_text(mut commands: Commands, mut hits: MessageReader<BubbleScored>) {
    for scored in hits.read() {
        // Worthless pops (kill wall losses) float nothing.
        if scored.points == 0 {
            continue;
        }

        let gained = points_scored(scored.points, scored.combo);
        let text = if scored.combo >= 8 {
            format!("MASSIVE! +{gained}!")
        } else if scored.combo >= 4 {
            format!("COMBO! +{gained}!")
        } else {
            format!("+{gained}")
        };

        commands.spawn((
            Name::new("Floating Text"),
            FloatingText {
                timer: 0.0,
                duration: 0.8,
                start_y: scored.position.y,
                float_distance: 50.0,
            },
            Text2d::new(text),
            TextFont {
                font_size: 32.0,
                ..default()
            },
            TextColor(Color::srgb(1.0, 1.0, 0.2)),
            Transform::from_translation(scored.position.extend(10.0)).with_scale(Vec3::splat(0.5)),
            DespawnOnExit(Screen::Gameplay),
        ));
    }
}

/// Animate floating text (float up and fade out).
fn animate_floating_text(
    mut commands: Commands,
    time: Res<Time>,
    mut query: Query<(Entity, &mut Transform, &mut FloatingText, &mut TextColor)>,
) {
    for (entity, mut transform, mut floating, mut color) in &mut query {
        floating.timer += time.delta_secs();
        let progress = (floating.timer / floating.duration).min(1.0);

        // Scale up at start, then hold
        let scale = if progress < 0.2 {
            let t = progress / 0.2;
            0.5 + t * 1.0 // 0.5 -> 1.5
        } else {
            1.5
        };
        transform.scale = Vec3::splat(scale);

        // Float upward
        transform.translation.y = floating.start_y + floating.float_distance * progress;

        // Fade out in last 30%
        let alpha = if progress > 0.7 {
            1.0 - (progress - 0.7) / 0.3
        } else {
            1.0
        };
        color.0 = Color::srgba(1.0, 1.0, 0.2, alpha);

        if progress >= 1.0 {
            commands.entity(entity).despawn();
        }
    }
}

// =============================================================================
// SOUNDS
// =============================================================================

/// One sound per message batch, not per message, so a push clearing the
/// field plays a single pop.
fn play_gameplay_sounds(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    mut pops: MessageReader<BubblePopped>,
    mut words: MessageReader<WordDestroyed>,
    mut collections: MessageReader<PowerUpCollected>,
) {
    if pops.read().count() > 0 {
        commands.spawn(sound_effect(
            asset_server.load("audio/sound_effects/pop.ogg"),
        ));
    }
    if words.read().count() > 0 {
        commands.spawn(sound_effect(
            asset_server.load("audio/sound_effects/word.ogg"),
        ));
    }
    if collections.read().count() > 0 {
        commands.spawn(sound_effect(
            asset_server.load("audio/sound_effects/collect.ogg"),
        ));
    }
}

fn play_use_sounds(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    mut uses: MessageReader<PowerUpUsed>,
) {
    if uses.read().count() > 0 {
        commands.spawn(sound_effect(
            asset_server.load("audio/sound_effects/use.ogg"),
        ));
    }
}
