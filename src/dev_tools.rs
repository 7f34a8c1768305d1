//! Development tools for the game. This plugin is only enabled in dev builds.

use bevy::{
    dev_tools::states::log_transitions, input::common_conditions::input_just_pressed, prelude::*,
    ui::UiDebugOptions,
};

use crate::{game::session::SessionState, menus::Menu, screens::Screen};

const TOGGLE_KEY: KeyCode = KeyCode::Backquote;

pub(super) fn plugin(app: &mut App) {
    // Log state transitions.
    app.add_systems(
        Update,
        (
            log_transitions::<Screen>,
            log_transitions::<Menu>,
            log_transitions::<SessionState>,
        ),
    );

    // Toggle the debug UI overlay.
    app.add_systems(
        Update,
        toggle_debug_ui.run_if(input_just_pressed(TOGGLE_KEY)),
    );
}

fn toggle_debug_ui(mut options: ResMut<UiDebugOptions>) {
    options.toggle();
}
