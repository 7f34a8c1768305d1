//! Session tunables, loaded once at startup from `assets/settings.json`.
//! A missing or malformed file falls back to the built-in defaults, and a
//! partial file only overrides the fields it names.

use std::fs;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<GameConfig>();
    app.add_systems(Startup, load_config);
}

const SETTINGS_PATH: &str = "assets/settings.json";

#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Drift speed of letter bubbles at session start, in pixels per second.
    pub letter_speed: f32,
    /// Letter speed once the difficulty ramp has fully run.
    pub max_letter_speed: f32,
    pub word_speed: f32,
    pub max_word_speed: f32,
    /// Seconds between letter spawn attempts at session start.
    pub letter_interval: f32,
    /// Letter interval once the ramp has fully run.
    pub min_letter_interval: f32,
    pub word_interval: f32,
    pub min_word_interval: f32,
    /// Seconds the difficulty ramp takes to reach the end values.
    pub ramp_duration: f32,
    /// Most letter bubbles allowed in play at once.
    pub max_letters: u32,
    /// Most word bubbles allowed in play at once.
    pub max_words: u32,
    /// Spawn slots spaced along each arena wall.
    pub spawn_points_per_wall: usize,
    /// Health lost when a bubble escapes through the kill wall.
    pub boundary_damage: f32,
    /// Health restored by a coffee, capped at `heal_ceiling`.
    pub heal_amount: f32,
    /// Coffee does nothing at or above this health.
    pub heal_ceiling: f32,
    pub full_health: f32,
    /// Seconds the shared power-up cooldown runs after a successful use.
    pub powerup_cooldown: f32,
    pub freeze_duration: f32,
    pub scramble_duration: f32,
    pub reveal_duration: f32,
    /// Chance a spawned letter comes from the frequent pool.
    pub frequent_letter_chance: f64,
    /// Letters drawn most of the time.
    pub frequent_letters: String,
    /// Letters drawn when the rare pool wins the roll.
    pub rare_letters: String,
    /// Base points for popping one letter bubble.
    pub letter_points: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            letter_speed: 70.0,
            max_letter_speed: 160.0,
            word_speed: 50.0,
            max_word_speed: 110.0,
            letter_interval: 2.0,
            min_letter_interval: 0.7,
            word_interval: 9.0,
            min_word_interval: 4.0,
            ramp_duration: 150.0,
            max_letters: 20,
            max_words: 5,
            spawn_points_per_wall: 6,
            boundary_damage: 0.1,
            heal_amount: 0.05,
            heal_ceiling: 1.0,
            full_health: 1.0,
            powerup_cooldown: 1.0,
            freeze_duration: 4.0,
            scramble_duration: 2.0,
            reveal_duration: 2.0,
            frequent_letter_chance: 0.5,
            frequent_letters: "ABCDEFGHILMOPRSTU".to_string(),
            rare_letters: "JKNQVWXYZ".to_string(),
            letter_points: 20,
        }
    }
}

fn load_config(mut config: ResMut<GameConfig>) {
    let contents = match fs::read_to_string(SETTINGS_PATH) {
        Ok(contents) => contents,
        Err(e) => {
            warn!("Could not read {SETTINGS_PATH}, using defaults: {e}");
            return;
        }
    };

    match serde_json::from_str::<GameConfig>(&contents) {
        Ok(loaded) => {
            *config = loaded;
            info!("Loaded settings from {SETTINGS_PATH}");
        }
        Err(e) => {
            warn!("Failed to parse {SETTINGS_PATH}, using defaults: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_playable() {
        let config = GameConfig::default();
        assert!(config.letter_interval > 0.0);
        assert!(config.word_interval > 0.0);
        assert!(config.min_letter_interval <= config.letter_interval);
        assert!(config.min_word_interval <= config.word_interval);
        assert!(config.letter_speed <= config.max_letter_speed);
        assert!(config.word_speed <= config.max_word_speed);
        assert!(config.max_letters > 0);
        assert!(config.max_words > 0);
        assert!((0.0..=1.0).contains(&config.frequent_letter_chance));
        assert!(!config.frequent_letters.is_empty());
        assert!(!config.rare_letters.is_empty());
    }

    #[test]
    fn letter_pools_are_disjoint() {
        let config = GameConfig::default();
        for c in config.rare_letters.chars() {
            assert!(
                !config.frequent_letters.contains(c),
                "{c} appears in both pools"
            );
        }
    }

    #[test]
    fn partial_file_only_overrides_named_fields() {
        let parsed: GameConfig =
            serde_json::from_str(r#"{ "letter_points": 40, "max_letters": 7 }"#).unwrap();
        assert_eq!(parsed.letter_points, 40);
        assert_eq!(parsed.max_letters, 7);
        assert_eq!(parsed.boundary_damage, GameConfig::default().boundary_damage);
        assert_eq!(parsed.rare_letters, GameConfig::default().rare_letters);
    }
}
