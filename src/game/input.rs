//! Raw input turned into gameplay intents. Systems later in the frame only
//! ever see the polled resources and the intent messages written here.

use bevy::{prelude::*, window::PrimaryWindow};

use super::events::*;
use super::session::SessionState;
use crate::{AppSystems, PausableSystems, screens::Screen};

pub(super) fn plugin(app: &mut App) {
    app.register_type::<HeldLetter>();
    app.init_resource::<HeldLetter>();
    app.init_resource::<PointerWorld>();

    app.add_systems(
        Update,
        (
            (track_held_letter, track_pointer, emit_clicks, emit_slot_uses),
            emit_start.run_if(in_state(SessionState::Waiting)),
        )
            .run_if(in_state(Screen::Gameplay))
            .in_set(AppSystems::RecordInput)
            .in_set(PausableSystems),
    );
}

/// The letter key currently held, scanning A to Z and keeping the first hit.
#[derive(Resource, Debug, Default, Reflect)]
#[reflect(Resource)]
pub struct HeldLetter(pub Option<char>);

/// Cursor position projected into world space, refreshed every frame.
#[derive(Resource, Debug, Default)]
pub struct PointerWorld(pub Option<Vec2>);

const LETTER_KEYS: [(KeyCode, char); 26] = [
    (KeyCode::KeyA, 'A'),
    (KeyCode::KeyB, 'B'),
    (KeyCode::KeyC, 'C'),
    (KeyCode::KeyD, 'D'),
    (KeyCode::KeyE, 'E'),
    (KeyCode::KeyF, 'F'),
    (KeyCode::KeyG, 'G'),
    (KeyCode::KeyH, 'H'),
    (KeyCode::KeyI, 'I'),
    (KeyCode::KeyJ, 'J'),
    (KeyCode::KeyK, 'K'),
    (KeyCode::KeyL, 'L'),
    (KeyCode::KeyM, 'M'),
    (KeyCode::KeyN, 'N'),
    (KeyCode::KeyO, 'O'),
    (KeyCode::KeyP, 'P'),
    (KeyCode::KeyQ, 'Q'),
    (KeyCode::KeyR, 'R'),
    (KeyCode::KeyS, 'S'),
    (KeyCode::KeyT, 'T'),
    (KeyCode::KeyU, 'U'),
    (KeyCode::KeyV, 'V'),
    (KeyCode::KeyW, 'W'),
    (KeyCode::KeyX, 'X'),
    (KeyCode::KeyY, 'Y'),
    (KeyCode::KeyZ, 'Z'),
];

fn track_held_letter(keys: Res<ButtonInput<KeyCode>>, mut held: ResMut<HeldLetter>) {
    held.0 = LETTER_KEYS
        .iter()
        .find(|(code, _)| keys.pressed(*code))
        .map(|&(_, letter)| letter);
}

fn track_pointer(
    window_query: Query<&Window, With<PrimaryWindow>>,
    camera_query: Query<(&Camera, &GlobalTransform)>,
    mut pointer: ResMut<PointerWorld>,
) {
    let Ok(window) = window_query.single() else {
        pointer.0 = None;
        return;
    };
    let Ok((camera, camera_transform)) = camera_query.single() else {
        pointer.0 = None;
        return;
    };
    pointer.0 = window
        .cursor_position()
        .and_then(|cursor| camera.viewport_to_world_2d(camera_transform, cursor).ok());
}

fn emit_clicks(
    mouse: Res<ButtonInput<MouseButton>>,
    mut primary_out: MessageWriter<PrimaryPressed>,
    mut drag_down_out: MessageWriter<DragPressed>,
    mut drag_up_out: MessageWriter<DragReleased>,
) {
    if mouse.just_pressed(MouseButton::Left) {
        primary_out.write(PrimaryPressed);
    }
    if mouse.just_pressed(MouseButton::Right) {
        drag_down_out.write(DragPressed);
    }
    if mouse.just_released(MouseButton::Right) {
        drag_up_out.write(DragReleased);
    }
}

fn emit_start(keys: Res<ButtonInput<KeyCode>>, mut start_out: MessageWriter<StartRequested>) {
    if keys.just_pressed(KeyCode::Space) || keys.just_pressed(KeyCode::Enter) {
        start_out.write(StartRequested);
    }
}

fn emit_slot_uses(keys: Res<ButtonInput<KeyCode>>, mut slot_out: MessageWriter<SlotUsed>) {
    for (key, slot) in [
        (KeyCode::Digit1, 0),
        (KeyCode::Digit2, 1),
        (KeyCode::Digit3, 2),
    ] {
        if keys.just_pressed(key) {
            slot_out.write(SlotUsed { slot });
        }
    }
}
