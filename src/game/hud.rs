//! In-game overlay: score, health bar, combo, gravity arrow, power-up
//! slots, and the Waiting prompt. Everything here repaints off the change
//! messages; nothing reads game state directly.

use bevy::prelude::*;

use super::events::*;
use super::powerup::PowerUp;
use super::session::{Gravity, SessionState};
use crate::screens::Screen;
use crate::theme::{palette, widget};

const BAR_BACKGROUND: Color = Color::srgba(0.0, 0.0, 0.0, 0.45);
/// #499b54
const HEALTH_FILL: Color = Color::srgb(0.286, 0.608, 0.329);
const HEALTH_TRACK: Color = Color::srgb(0.16, 0.13, 0.22);
const SLOT_EMPTY: &str = "---";

pub(super) fn plugin(app: &mut App) {
    app.add_systems(OnEnter(Screen::Gameplay), spawn_hud);
    app.add_systems(OnEnter(SessionState::Waiting), spawn_waiting_prompt);

    app.add_systems(
        Update,
        (
            update_score_readout,
            update_combo_readout,
            update_health_fill,
            update_gravity_readout,
            update_slot_readouts,
        )
            .in_set(super::GameSystems::Presentation)
            .run_if(in_state(Screen::Gameplay)),
    );
}

#[derive(Component)]
struct ScoreReadout;

#[derive(Component)]
struct ComboReadout;

#[derive(Component)]
struct HealthFill;

#[derive(Component)]
struct GravityReadout;

#[derive(Component)]
struct SlotReadout(usize);

fn spawn_hud(mut commands: Commands) {
    commands.spawn((
        Name::new("HUD"),
        Node {
            position_type: PositionType::Absolute,
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            flex_direction: FlexDirection::Column,
            justify_content: JustifyContent::SpaceBetween,
            ..default()
        },
        GlobalZIndex(1),
        Pickable::IGNORE,
        DespawnOnExit(Screen::Gameplay),
        children![top_bar(), slot_bar()],
    ));
}

fn top_bar() -> impl Bundle {
    (
        Name::new("Top Bar"),
        Node {
            width: Val::Percent(100.0),
            padding: UiRect::axes(Val::Px(18.0), Val::Px(10.0)),
            align_items: AlignItems::Center,
            justify_content: JustifyContent::SpaceBetween,
            column_gap: Val::Px(24.0),
            ..default()
        },
        BackgroundColor(BAR_BACKGROUND),
        Pickable::IGNORE,
        children![
            (readout("Score: 0"), ScoreReadout),
            health_bar(),
            (readout("Combo x0"), ComboReadout),
            (readout("v"), GravityReadout),
        ],
    )
}

fn health_bar() -> impl Bundle {
    (
        Name::new("Health Bar"),
        Node {
            width: Val::Px(260.0),
            height: Val::Px(18.0),
            padding: UiRect::all(Val::Px(2.0)),
            ..default()
        },
        BackgroundColor(HEALTH_TRACK),
        Pickable::IGNORE,
        children![(
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                ..default()
            },
            BackgroundColor(HEALTH_FILL),
            HealthFill,
        )],
    )
}

fn slot_bar() -> impl Bundle {
    (
        Name::new("Slot Bar"),
        Node {
            width: Val::Percent(100.0),
            padding: UiRect::axes(Val::Px(18.0), Val::Px(10.0)),
            justify_content: JustifyContent::Center,
            column_gap: Val::Px(16.0),
            ..default()
        },
        BackgroundColor(BAR_BACKGROUND),
        Pickable::IGNORE,
        children![slot(0), slot(1), slot(2)],
    )
}

fn slot(index: usize) -> impl Bundle {
    (
        Name::new("Power-Up Slot"),
        Node {
            width: Val::Px(170.0),
            height: Val::Px(40.0),
            align_items: AlignItems::Center,
            justify_content: JustifyContent::Center,
            ..default()
        },
        BackgroundColor(palette::BUTTON_BACKGROUND),
        Pickable::IGNORE,
        children![(
            Text(format!("{}: {SLOT_EMPTY}", index + 1)),
            TextFont::from_font_size(18.0),
            TextColor(palette::BUTTON_TEXT),
            SlotReadout(index),
        )],
    )
}

fn readout(text: &str) -> impl Bundle {
    (
        Text(text.to_string()),
        TextFont::from_font_size(24.0),
        TextColor(palette::LABEL_TEXT),
        Pickable::IGNORE,
    )
}

fn spawn_waiting_prompt(mut commands: Commands) {
    commands
        .spawn((
            widget::ui_root("Waiting Prompt"),
            DespawnOnExit(SessionState::Waiting),
            children![
                widget::header("Press Space to start"),
                widget::label("Hold a letter key and click its bubble to pop it"),
                widget::label("Hold the right button to drag a letter into a word"),
            ],
        ))
        .with_children(|legend| {
            for power in PowerUp::ALL {
                legend.spawn(widget::label(format!(
                    "{}  {}",
                    power.word(),
                    power.description()
                )));
            }
        });
}

fn update_score_readout(
    mut changes: MessageReader<ScoreChanged>,
    mut readouts: Query<&mut Text, With<ScoreReadout>>,
) {
    let Some(change) = changes.read().last() else {
        return;
    };
    for mut text in &mut readouts {
        text.0 = format!("Score: {}", change.score);
    }
}

fn update_combo_readout(
    mut changes: MessageReader<ComboChanged>,
    mut readouts: Query<&mut Text, With<ComboReadout>>,
) {
    let Some(change) = changes.read().last() else {
        return;
    };
    for mut text in &mut readouts {
        text.0 = format!("Combo x{}", change.combo);
    }
}

fn update_health_fill(
    mut changes: MessageReader<HealthChanged>,
    mut fills: Query<&mut Node, With<HealthFill>>,
) {
    let Some(change) = changes.read().last() else {
        return;
    };
    for mut node in &mut fills {
        node.width = Val::Percent((change.health * 100.0).clamp(0.0, 100.0));
    }
}

fn update_gravity_readout(
    mut changes: MessageReader<GravityChanged>,
    mut readouts: Query<&mut Text, With<GravityReadout>>,
) {
    let Some(change) = changes.read().last() else {
        return;
    };
    let arrow = match change.gravity {
        Gravity::Up => "^",
        Gravity::Down => "v",
        Gravity::Left => "<",
        Gravity::Right => ">",
    };
    for mut text in &mut readouts {
        text.0 = arrow.to_string();
    }
}

fn update_slot_readouts(
    mut stored: MessageReader<PowerUpStored>,
    mut used: MessageReader<PowerUpUsed>,
    mut readouts: Query<(&mut Text, &SlotReadout)>,
) {
    for message in stored.read() {
        for (mut text, readout) in &mut readouts {
            if readout.0 == message.slot {
                text.0 = format!("{}: {}", message.slot + 1, message.power.word());
            }
        }
    }
    for message in used.read() {
        for (mut text, readout) in &mut readouts {
            if readout.0 == message.slot {
                text.0 = format!("{}: {SLOT_EMPTY}", message.slot + 1);
            }
        }
    }
}
