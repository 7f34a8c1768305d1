//! Gameplay messages. Every cross-module happening in the arena travels
//! through one of these: a module writes the message it owns, and any
//! number of listeners read it on their own schedule. Registration is
//! centralized here so the full vocabulary is visible in one place.

use bevy::prelude::*;

use super::powerup::PowerUp;
use super::session::{Gravity, SessionState};

pub(super) fn plugin(app: &mut App) {
    // Input intents.
    app.add_message::<StartRequested>();
    app.add_message::<PrimaryPressed>();
    app.add_message::<DragPressed>();
    app.add_message::<DragReleased>();
    app.add_message::<SlotUsed>();

    // Session bookkeeping.
    app.add_message::<SessionStateChanged>();
    app.add_message::<GravityChanged>();
    app.add_message::<DifficultyChanged>();
    app.add_message::<HealthChanged>();
    app.add_message::<ComboChanged>();
    app.add_message::<ScoreChanged>();

    // Bubble lifecycle.
    app.add_message::<BubblePopped>();
    app.add_message::<BubbleMissed>();
    app.add_message::<BubbleScored>();
    app.add_message::<WordDestroyed>();
    app.add_message::<BubbleContact>();
    app.add_message::<DragBlocked>();

    // Power-up flow.
    app.add_message::<PowerUpCollected>();
    app.add_message::<PowerUpStored>();
    app.add_message::<PowerUpUsed>();
    app.add_message::<HealPlayer>();
    app.add_message::<ShiftGravity>();
    app.add_message::<RestoreFullHealth>();
    app.add_message::<FreezeAllBubbles>();
    app.add_message::<ScrambleAllBubbles>();
    app.add_message::<PushAllBubbles>();
    app.add_message::<SpawnFreezeChanged>();
}

// ===== INPUT INTENTS =====

/// The player asked to start the run (Space or Enter on the waiting screen).
#[derive(Message, Debug, Clone, Copy)]
pub struct StartRequested;

/// Left mouse button went down this frame.
#[derive(Message, Debug, Clone, Copy)]
pub struct PrimaryPressed;

/// Right mouse button went down this frame.
#[derive(Message, Debug, Clone, Copy)]
pub struct DragPressed;

/// Right mouse button came back up this frame.
#[derive(Message, Debug, Clone, Copy)]
pub struct DragReleased;

/// The player activated an inventory slot (keys 1 to 3).
#[derive(Message, Debug, Clone, Copy)]
pub struct SlotUsed {
    pub slot: usize,
}

// ===== SESSION BOOKKEEPING =====

/// The session moved to a new phase.
#[derive(Message, Debug, Clone, Copy)]
pub struct SessionStateChanged {
    pub state: SessionState,
}

/// Gravity now points somewhere else; every drifting thing follows it.
#[derive(Message, Debug, Clone, Copy)]
pub struct GravityChanged {
    pub gravity: Gravity,
}

/// Fresh interpolated difficulty values, republished every ramp tick.
#[derive(Message, Debug, Clone, Copy)]
pub struct DifficultyChanged {
    pub letter_speed: f32,
    pub word_speed: f32,
    pub letter_interval: f32,
    pub word_interval: f32,
}

/// Health after a miss, a heal, or a full restore.
#[derive(Message, Debug, Clone, Copy)]
pub struct HealthChanged {
    pub health: f32,
}

/// Combo after a pop (post-increment) or a miss (zero).
#[derive(Message, Debug, Clone, Copy)]
pub struct ComboChanged {
    pub combo: u32,
}

/// Total score after an increment was applied.
#[derive(Message, Debug, Clone, Copy)]
pub struct ScoreChanged {
    pub score: u32,
}

// ===== BUBBLE LIFECYCLE =====

/// A letter bubble left play. Boundary misses pop with zero points so the
/// combo still bumps before the miss tears it down.
#[derive(Message, Debug, Clone, Copy)]
pub struct BubblePopped {
    pub points: u32,
    pub position: Vec2,
}

/// A bubble escaped through the kill wall and the player pays for it.
#[derive(Message, Debug, Clone, Copy)]
pub struct BubbleMissed {
    pub damage: f32,
}

/// A pop together with the combo it counted as, ready for scoring.
#[derive(Message, Debug, Clone, Copy)]
pub struct BubbleScored {
    pub points: u32,
    pub combo: u32,
    pub position: Vec2,
}

/// A word bubble left play, popped or escaped.
#[derive(Message, Debug, Clone, Copy)]
pub struct WordDestroyed {
    pub position: Vec2,
}

/// A dragged letter bubble touched a word bubble this physics tick. The
/// handler re-checks both sides before anything merges.
#[derive(Message, Debug, Clone, Copy)]
pub struct BubbleContact {
    pub bubble: Entity,
    pub word: Entity,
}

/// A dragged bubble ran into a HUD barrier strip and must be dropped.
#[derive(Message, Debug, Clone, Copy)]
pub struct DragBlocked {
    pub bubble: Entity,
}

// ===== POWER-UP FLOW =====

/// A completed word was popped and its power-up is up for grabs.
#[derive(Message, Debug, Clone, Copy)]
pub struct PowerUpCollected {
    pub power: PowerUp,
}

/// The inventory put a collected power-up into a slot.
#[derive(Message, Debug, Clone, Copy)]
pub struct PowerUpStored {
    pub slot: usize,
    pub power: PowerUp,
}

/// A slot was emptied; whatever was inside is now in flight. The slot is
/// gone even if the effect later fizzles on cooldown.
#[derive(Message, Debug, Clone, Copy)]
pub struct PowerUpUsed {
    pub slot: usize,
    pub power: PowerUp,
}

/// Restore a sip of health, capped at the ceiling.
#[derive(Message, Debug, Clone, Copy)]
pub struct HealPlayer;

/// Re-roll gravity to any direction except the current one.
#[derive(Message, Debug, Clone, Copy)]
pub struct ShiftGravity;

/// Set health back to full.
#[derive(Message, Debug, Clone, Copy)]
pub struct RestoreFullHealth;

/// Freeze every bubble in place for a while.
#[derive(Message, Debug, Clone, Copy)]
pub struct FreezeAllBubbles;

/// Scramble every letter. With `reveal` set, all bubbles settle on that
/// letter; otherwise each re-rolls its own.
#[derive(Message, Debug, Clone, Copy)]
pub struct ScrambleAllBubbles {
    pub reveal: Option<char>,
}

/// Pop every letter bubble on screen for full points.
#[derive(Message, Debug, Clone, Copy)]
pub struct PushAllBubbles;

/// Letter bubbles broadcast their overlay state so the spawner can hold
/// fire while the field is locked up.
#[derive(Message, Debug, Clone, Copy)]
pub struct SpawnFreezeChanged {
    pub frozen: bool,
}
