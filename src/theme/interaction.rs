use bevy::prelude::*;

use crate::audio::sound_effect;

pub(super) fn plugin(app: &mut App) {
    app.register_type::<InteractionPalette>();
    app.add_systems(Update, (apply_interaction_palette, play_click_sound));
}

/// Palette for widget interactions. Add this to an entity that supports
/// [`Interaction`]s, such as a button, to change its [`BackgroundColor`]
/// based on the current interaction state.
#[derive(Component, Debug, Reflect)]
#[reflect(Component)]
pub struct InteractionPalette {
    pub none: Color,
    pub hovered: Color,
    pub pressed: Color,
}

fn apply_interaction_palette(
    mut palette_query: Query<
        (&Interaction, &InteractionPalette, &mut BackgroundColor),
        Changed<Interaction>,
    >,
) {
    for (interaction, palette, mut background) in &mut palette_query {
        *background = match interaction {
            Interaction::None => palette.none,
            Interaction::Hovered => palette.hovered,
            Interaction::Pressed => palette.pressed,
        }
        .into();
    }
}

fn play_click_sound(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    interactions: Query<&Interaction, (With<Button>, Changed<Interaction>)>,
) {
    for interaction in &interactions {
        if matches!(interaction, Interaction::Pressed) {
            commands.spawn(sound_effect(
                asset_server.load("audio/sound_effects/click.ogg"),
            ));
        }
    }
}
