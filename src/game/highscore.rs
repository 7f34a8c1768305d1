//! High score persistence with Top 10 leaderboard.
//!
//! Scores are saved to a local JSON file in the user's data directory.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<HighScores>();

    app.add_systems(Startup, load_high_scores);
}

/// Maximum number of high scores to keep.
const MAX_HIGH_SCORES: usize = 10;

/// A single high score entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub score: u32,
    pub max_combo: u32,
}

/// Resource holding the top 10 high scores.
#[derive(Resource, Debug, Default, Serialize, Deserialize)]
pub struct HighScores {
    pub entries: Vec<ScoreEntry>,
}

impl HighScores {
    /// Add a finished run to the leaderboard. Returns true when it takes
    /// the top slot, a new best.
    pub fn add_score(&mut self, score: u32, max_combo: u32) -> bool {
        if score == 0 {
            return false;
        }

        // Insert in sorted position (descending by score)
        let pos = self
            .entries
            .iter()
            .position(|e| score > e.score)
            .unwrap_or(self.entries.len());

        if pos >= MAX_HIGH_SCORES {
            return false;
        }

        self.entries.insert(pos, ScoreEntry { score, max_combo });
        self.entries.truncate(MAX_HIGH_SCORES);

        pos == 0
    }

    /// Get the file path for storing high scores.
    fn file_path() -> Option<PathBuf> {
        dirs::data_local_dir().map(|dir| dir.join("keypop").join("highscores.json"))
    }

    /// Load high scores from disk.
    pub fn load() -> Self {
        let Some(path) = Self::file_path() else {
            warn!("Could not determine data directory for high scores");
            return Self::default();
        };

        if !path.exists() {
            info!("No high scores file found at {:?}, starting fresh", path);
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(scores) => {
                    info!("Loaded high scores from {:?}", path);
                    scores
                }
                Err(e) => {
                    warn!("Failed to parse high scores: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read high scores file: {}", e);
                Self::default()
            }
        }
    }

    /// Save high scores to disk.
    pub fn save(&self) {
        let Some(path) = Self::file_path() else {
            warn!("Could not determine data directory for saving high scores");
            return;
        };

        // Create parent directory if needed
        if let Some(parent) = path.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warn!("Failed to create high scores directory: {}", e);
            return;
        }

        match serde_json::to_string_pretty(self) {
            Ok(json) => match fs::write(&path, json) {
                Ok(()) => info!("Saved high scores to {:?}", path),
                Err(e) => warn!("Failed to write high scores: {}", e),
            },
            Err(e) => warn!("Failed to serialize high scores: {}", e),
        }
    }
}

/// Load high scores on startup.
fn load_high_scores(mut high_scores: ResMut<HighScores>) {
    *high_scores = HighScores::load();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_sort_descending_and_stay_capped() {
        let mut highs = HighScores::default();
        for score in [300, 100, 200, 50, 400] {
            highs.add_score(score, 1);
        }
        let scores: Vec<u32> = highs.entries.iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![400, 300, 200, 100, 50]);

        for score in 1..=20 {
            highs.add_score(score * 1000, 1);
        }
        assert_eq!(highs.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(highs.entries[0].score, 20_000);
    }

    #[test]
    fn zero_scores_never_chart() {
        let mut highs = HighScores::default();
        assert!(!highs.add_score(0, 7));
        assert!(highs.entries.is_empty());
    }

    #[test]
    fn only_the_top_slot_counts_as_best() {
        let mut highs = HighScores::default();
        assert!(highs.add_score(100, 2));
        assert!(!highs.add_score(60, 1));
        assert!(highs.add_score(150, 3));
        assert_eq!(highs.entries[0].score, 150);
    }

    #[test]
    fn overflow_scores_fall_off_the_board() {
        let mut highs = HighScores::default();
        for score in 1..=MAX_HIGH_SCORES as u32 {
            highs.add_score(score * 10, 1);
        }
        assert!(!highs.add_score(5, 1));
        assert_eq!(highs.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(highs.entries.last().unwrap().score, 10);
    }
}
