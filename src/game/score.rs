//! Session score: combo multipliers, the running total, and the handoff
//! to the leaderboard when a run ends.

use bevy::prelude::*;

use super::events::*;
use super::highscore::HighScores;
use super::session::{GameSession, SessionState};
use crate::screens::Screen;

pub(super) fn plugin(app: &mut App) {
    app.register_type::<SessionScore>();
    app.init_resource::<SessionScore>();

    app.add_systems(OnEnter(Screen::Gameplay), reset_score);
    app.add_systems(
        Update,
        (accumulate, finalize)
            .chain()
            .in_set(super::GameSystems::Scoring)
            .run_if(in_state(Screen::Gameplay)),
    );
}

/// The running total for the current run. `best_run` flips when the final
/// score takes the top leaderboard slot.
#[derive(Resource, Debug, Default, Reflect)]
#[reflect(Resource)]
pub struct SessionScore {
    pub score: u32,
    pub best_run: bool,
}

/// Combo payout scale: one step per combo past the first, capped at x5.
pub(super) fn multiplier(combo: u32) -> f32 {
    if combo == 0 {
        return 1.0;
    }
    (1.0 + (combo - 1) as f32 * 0.25).min(5.0)
}

/// Points actually awarded for a pop at the given combo.
pub(super) fn points_scored(points: u32, combo: u32) -> u32 {
    (points as f32 * multiplier(combo)).round() as u32
}

fn reset_score(mut scores: ResMut<SessionScore>) {
    *scores = SessionScore::default();
}

fn accumulate(
    mut scores: ResMut<SessionScore>,
    mut hits: MessageReader<BubbleScored>,
    mut change_out: MessageWriter<ScoreChanged>,
) {
    for scored in hits.read() {
        scores.score += points_scored(scored.points, scored.combo);
        change_out.write(ScoreChanged {
            score: scores.score,
        });
    }
}

fn finalize(
    mut scores: ResMut<SessionScore>,
    session: Res<GameSession>,
    mut highs: ResMut<HighScores>,
    mut changes: MessageReader<SessionStateChanged>,
) {
    for change in changes.read() {
        if change.state != SessionState::GameOver {
            continue;
        }
        scores.best_run = highs.add_score(scores.score, session.max_combo);
        highs.save();
    }
}
