//! The game over menu with the final tally and the local leaderboard.

use bevy::{ecs::spawn::SpawnWith, prelude::*};

use crate::{
    game::{highscore::HighScores, score::SessionScore, session::GameSession},
    menus::Menu,
    screens::Screen,
    theme::{palette::LABEL_TEXT, widget},
};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(OnEnter(Menu::GameOver), spawn_gameover_menu);
}

fn spawn_gameover_menu(
    mut commands: Commands,
    score: Res<SessionScore>,
    session: Res<GameSession>,
    high_scores: Res<HighScores>,
) {
    let headline = if score.best_run {
        "New High Score!"
    } else {
        "Game Over"
    };
    let tally = format!("Score {}   Best combo x{}", score.score, session.max_combo);
    let board: Vec<String> = high_scores
        .entries
        .iter()
        .take(5)
        .enumerate()
        .map(|(i, entry)| format!("{}. {}  (combo x{})", i + 1, entry.score, entry.max_combo))
        .collect();

    commands.spawn((
        widget::ui_root("Game Over Menu"),
        BackgroundColor(Color::srgba(0.03, 0.02, 0.07, 0.85)),
        GlobalZIndex(2),
        DespawnOnExit(Menu::GameOver),
        Children::spawn(SpawnWith(move |parent: &mut ChildSpawner| {
            parent.spawn(widget::header(headline));
            parent.spawn(widget::label(tally));
            for line in board {
                parent.spawn((
                    Name::new("Leaderboard Entry"),
                    Text(line),
                    TextFont::from_font_size(18.0),
                    TextColor(LABEL_TEXT),
                ));
            }
            parent.spawn(widget::button("Back to title", quit_to_title));
        })),
    ));
}

fn quit_to_title(_: On<Pointer<Click>>, mut next_screen: ResMut<NextState<Screen>>) {
    next_screen.set(Screen::Title);
}
