//! Letter bubbles - the main game objects.
//!
//! Bubbles drift with gravity, pop when clicked while their letter key is
//! held, and can be dragged toward word bubbles with the right button.
//! Power-up overlays (freeze, scramble) live here as timed components.

use bevy::prelude::*;
use rand::Rng;

use super::config::GameConfig;
use super::events::*;
use super::input::{HeldLetter, PointerWorld};
use super::polish::PopAnimation;
use super::session::{Difficulty, GameSession, SessionState};
use crate::{AppSystems, PausableSystems, screens::Screen};

/// Collision and click radius of one letter bubble.
pub(super) const BUBBLE_RADIUS: f32 = 26.0;

/// #3e8ed9
const BUBBLE_FILL: Color = Color::srgb(0.243, 0.557, 0.851);
const GLYPH_COLOR: Color = Color::srgb(0.97, 0.97, 0.97);
/// Glyph tint while the held key matches this bubble.
const GLYPH_MATCH: Color = Color::srgb(0.949, 0.788, 0.298);
/// Glyph tint while frozen.
const GLYPH_FROZEN: Color = Color::srgb(0.62, 0.85, 0.95);

pub(super) fn plugin(app: &mut App) {
    app.register_type::<LetterBubble>();

    app.add_systems(
        FixedUpdate,
        (drift_bubbles, follow_pointer)
            .in_set(super::FixedGameSystems::Drift)
            .run_if(in_state(SessionState::Playing)),
    );

    app.add_systems(
        Update,
        (
            (tick_frozen, tick_scrambles)
                .in_set(AppSystems::TickTimers)
                .in_set(PausableSystems),
            (
                pop_clicked_bubbles.run_if(in_state(SessionState::Playing)),
                start_drags.run_if(in_state(SessionState::Playing)),
                validate_drags,
                apply_push,
                apply_freeze,
                apply_scramble,
            )
                .chain()
                .in_set(super::GameSystems::Entities),
            (sync_letter_display, highlight_matchable).in_set(super::GameSystems::Presentation),
        )
            .run_if(in_state(Screen::Gameplay)),
    );
}

/// A drifting letter bubble. The letter empties while a scramble overlay is
/// re-rolling the glyph; an empty letter matches nothing.
#[derive(Component, Debug, Reflect)]
#[reflect(Component)]
pub struct LetterBubble {
    pub letter: Option<char>,
    popped: bool,
}

impl LetterBubble {
    pub fn new(letter: char) -> Self {
        Self {
            letter: Some(letter),
            popped: false,
        }
    }

    pub fn popped(&self) -> bool {
        self.popped
    }

    /// Claim this bubble for exactly one pop path. Every despawn route goes
    /// through here so two systems can never pop the same bubble.
    pub fn try_pop(&mut self) -> bool {
        if self.popped {
            return false;
        }
        self.popped = true;
        true
    }
}

/// Marker for a bubble currently following the pointer.
#[derive(Component, Debug, Default)]
pub struct Dragging;

/// Timed freeze overlay. Re-inserting restarts the clock.
#[derive(Component, Debug)]
pub struct Frozen(pub Timer);

impl Frozen {
    pub fn for_seconds(seconds: f32) -> Self {
        Self(Timer::from_seconds(seconds, TimerMode::Once))
    }
}

/// Timed scramble overlay: the display glyph churns every frame and the
/// real letter settles only when the timer lands.
#[derive(Component, Debug)]
pub struct Scrambled {
    pub timer: Timer,
    pub outcome: ScrambleOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrambleOutcome {
    /// Each bubble re-rolls its own letter.
    Reroll,
    /// Every bubble settles on this one letter.
    Reveal(char),
}

impl ScrambleOutcome {
    pub fn settle(self, config: &GameConfig) -> char {
        match self {
            ScrambleOutcome::Reroll => random_letter(config),
            ScrambleOutcome::Reveal(letter) => letter,
        }
    }
}

/// The child entity rendering this bubble's glyph.
#[derive(Component, Debug)]
pub struct BubbleGlyph(pub Entity);

/// One biased draw: the frequent pool wins `frequent_letter_chance` of the
/// time, the rare pool the rest. An empty pool falls through to the other.
pub(super) fn random_letter(config: &GameConfig) -> char {
    let mut rng = rand::rng();
    let (first, second) = if rng.random_bool(config.frequent_letter_chance) {
        (&config.frequent_letters, &config.rare_letters)
    } else {
        (&config.rare_letters, &config.frequent_letters)
    };
    let pool = if first.is_empty() { second } else { first };
    let chars: Vec<char> = pool.chars().collect();
    if chars.is_empty() {
        warn!("Both letter pools are empty, falling back to 'A'");
        return 'A';
    }
    chars[rng.random_range(0..chars.len())]
}

/// Spawn one letter bubble with its glyph child at `position`.
pub(super) fn spawn_letter_bubble(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<ColorMaterial>,
    position: Vec2,
    letter: char,
) -> Entity {
    let glyph = commands
        .spawn((
            Name::new("Bubble Glyph"),
            Text2d::new(letter.to_string()),
            TextFont::from_font_size(28.0),
            TextColor(GLYPH_COLOR),
            Transform::from_xyz(0.0, 0.0, 0.1),
        ))
        .id();

    commands
        .spawn((
            Name::new(format!("Bubble {letter}")),
            LetterBubble::new(letter),
            BubbleGlyph(glyph),
            Transform::from_translation(position.extend(1.0)),
            Mesh2d(meshes.add(Circle::new(BUBBLE_RADIUS))),
            MeshMaterial2d(materials.add(ColorMaterial::from_color(BUBBLE_FILL))),
            DespawnOnExit(Screen::Gameplay),
        ))
        .add_child(glyph)
        .id()
}

/// True when a drag may keep going with this held key and bubble letter.
fn drag_still_valid(held: Option<char>, letter: Option<char>) -> bool {
    match (held, letter) {
        (Some(held), Some(letter)) => held == letter,
        _ => false,
    }
}

fn drift_bubbles(
    time: Res<Time>,
    session: Res<GameSession>,
    difficulty: Res<Difficulty>,
    mut bubbles: Query<
        (&LetterBubble, &mut Transform),
        (Without<Dragging>, Without<Frozen>, Without<Scrambled>),
    >,
) {
    // Velocity is re-derived from current gravity every tick, so a shift
    // mid-flight turns the whole field at once.
    let velocity = difficulty.letter_speed * session.gravity.unit();
    for (bubble, mut transform) in &mut bubbles {
        if bubble.popped {
            continue;
        }
        transform.translation += velocity.extend(0.0) * time.delta_secs();
    }
}

fn follow_pointer(
    pointer: Res<PointerWorld>,
    mut dragged: Query<&mut Transform, (With<Dragging>, With<LetterBubble>)>,
) {
    let Some(point) = pointer.0 else { return };
    for mut transform in &mut dragged {
        transform.translation.x = point.x;
        transform.translation.y = point.y;
    }
}

fn pop_clicked_bubbles(
    mut commands: Commands,
    config: Res<GameConfig>,
    pointer: Res<PointerWorld>,
    held: Res<HeldLetter>,
    mut clicks: MessageReader<PrimaryPressed>,
    mut bubbles: Query<(Entity, &mut LetterBubble, &Transform)>,
    mut pop_out: MessageWriter<BubblePopped>,
) {
    for _ in clicks.read() {
        let (Some(point), Some(held_letter)) = (pointer.0, held.0) else {
            continue;
        };
        for (entity, mut bubble, transform) in &mut bubbles {
            if bubble.letter != Some(held_letter) {
                continue;
            }
            let position = transform.translation.truncate();
            if point.distance(position) > BUBBLE_RADIUS {
                continue;
            }
            if !bubble.try_pop() {
                continue;
            }
            pop_out.write(BubblePopped {
                points: config.letter_points,
                position,
            });
            commands
                .entity(entity)
                .remove::<Dragging>()
                .insert(PopAnimation::default());
        }
    }
}

fn start_drags(
    mut commands: Commands,
    pointer: Res<PointerWorld>,
    held: Res<HeldLetter>,
    mut presses: MessageReader<DragPressed>,
    bubbles: Query<(Entity, &LetterBubble, &Transform)>,
) {
    for _ in presses.read() {
        let Some(point) = pointer.0 else { continue };
        for (entity, bubble, transform) in &bubbles {
            if bubble.popped || !drag_still_valid(held.0, bubble.letter) {
                continue;
            }
            if point.distance(transform.translation.truncate()) > BUBBLE_RADIUS {
                continue;
            }
            commands.entity(entity).insert(Dragging);
        }
    }
}

/// Drags end the moment the button lifts, the held key stops matching, or
/// the bubble hits a HUD barrier. Checked every frame, not just on events.
fn validate_drags(
    mut commands: Commands,
    held: Res<HeldLetter>,
    mut releases: MessageReader<DragReleased>,
    mut blocked: MessageReader<DragBlocked>,
    dragged: Query<(Entity, &LetterBubble), With<Dragging>>,
) {
    let release_all = releases.read().next().is_some();
    let blocked_entities: Vec<Entity> = blocked.read().map(|b| b.bubble).collect();
    for (entity, bubble) in &dragged {
        if release_all
            || !drag_still_valid(held.0, bubble.letter)
            || blocked_entities.contains(&entity)
        {
            commands.entity(entity).remove::<Dragging>();
        }
    }
}

fn apply_push(
    mut commands: Commands,
    config: Res<GameConfig>,
    mut pushes: MessageReader<PushAllBubbles>,
    mut bubbles: Query<(Entity, &mut LetterBubble, &Transform)>,
    mut pop_out: MessageWriter<BubblePopped>,
) {
    for _ in pushes.read() {
        for (entity, mut bubble, transform) in &mut bubbles {
            if !bubble.try_pop() {
                continue;
            }
            pop_out.write(BubblePopped {
                points: config.letter_points,
                position: transform.translation.truncate(),
            });
            commands
                .entity(entity)
                .remove::<Dragging>()
                .insert(PopAnimation::default());
        }
    }
}

fn apply_freeze(
    mut commands: Commands,
    config: Res<GameConfig>,
    mut freezes: MessageReader<FreezeAllBubbles>,
    mut bubbles: Query<(Entity, &mut LetterBubble, Has<Scrambled>)>,
    mut freeze_out: MessageWriter<SpawnFreezeChanged>,
) {
    for _ in freezes.read() {
        for (entity, mut bubble, scrambling) in &mut bubbles {
            if bubble.popped {
                continue;
            }
            if scrambling {
                // A newer overlay cancels the churn; the letter lands
                // wherever the reroll left it.
                bubble.letter = Some(random_letter(&config));
                commands.entity(entity).remove::<Scrambled>();
            }
            commands
                .entity(entity)
                .insert(Frozen::for_seconds(config.freeze_duration));
            // Each bubble announces its own lock; no bubbles, no freeze.
            freeze_out.write(SpawnFreezeChanged { frozen: true });
        }
    }
}

fn apply_scramble(
    mut commands: Commands,
    config: Res<GameConfig>,
    mut scrambles: MessageReader<ScrambleAllBubbles>,
    mut bubbles: Query<(Entity, &mut LetterBubble)>,
    mut freeze_out: MessageWriter<SpawnFreezeChanged>,
) {
    for scramble in scrambles.read() {
        let (duration, outcome) = match scramble.reveal {
            Some(letter) => (config.reveal_duration, ScrambleOutcome::Reveal(letter)),
            None => (config.scramble_duration, ScrambleOutcome::Reroll),
        };
        for (entity, mut bubble) in &mut bubbles {
            if bubble.popped {
                continue;
            }
            // Unmatchable until the overlay settles. Replacing an active
            // overlay restarts the clock with the newest outcome.
            bubble.letter = None;
            commands.entity(entity).remove::<Frozen>().insert(Scrambled {
                timer: Timer::from_seconds(duration, TimerMode::Once),
                outcome,
            });
            freeze_out.write(SpawnFreezeChanged { frozen: true });
        }
    }
}

fn tick_frozen(
    mut commands: Commands,
    time: Res<Time>,
    mut frozen: Query<(Entity, &mut Frozen, Has<LetterBubble>)>,
    mut freeze_out: MessageWriter<SpawnFreezeChanged>,
) {
    for (entity, mut overlay, is_letter) in &mut frozen {
        if overlay.0.tick(time.delta()).finished() {
            commands.entity(entity).remove::<Frozen>();
            if is_letter {
                freeze_out.write(SpawnFreezeChanged { frozen: false });
            }
        }
    }
}

fn tick_scrambles(
    mut commands: Commands,
    time: Res<Time>,
    config: Res<GameConfig>,
    mut scrambled: Query<(Entity, &mut LetterBubble, &mut Scrambled, &BubbleGlyph)>,
    mut glyphs: Query<&mut Text2d>,
    mut freeze_out: MessageWriter<SpawnFreezeChanged>,
) {
    for (entity, mut bubble, mut overlay, glyph) in &mut scrambled {
        if overlay.timer.tick(time.delta()).finished() {
            let letter = overlay.outcome.settle(&config);
            bubble.letter = Some(letter);
            commands.entity(entity).remove::<Scrambled>();
            freeze_out.write(SpawnFreezeChanged { frozen: false });
        } else if let Ok(mut text) = glyphs.get_mut(glyph.0) {
            // Visual churn only; the real letter stays empty until settled.
            text.0 = random_letter(&config).to_string();
        }
    }
}

fn sync_letter_display(
    bubbles: Query<(&LetterBubble, &BubbleGlyph), (Changed<LetterBubble>, Without<Scrambled>)>,
    mut glyphs: Query<&mut Text2d>,
) {
    for (bubble, glyph) in &bubbles {
        if let Ok(mut text) = glyphs.get_mut(glyph.0) {
            text.0 = bubble.letter.map(String::from).unwrap_or_default();
        }
    }
}

fn highlight_matchable(
    held: Res<HeldLetter>,
    bubbles: Query<(&LetterBubble, &BubbleGlyph, Has<Frozen>)>,
    mut glyphs: Query<&mut TextColor>,
) {
    for (bubble, glyph, frozen) in &bubbles {
        let Ok(mut color) = glyphs.get_mut(glyph.0) else {
            continue;
        };
        color.0 = if frozen {
            GLYPH_FROZEN
        } else if held.0.is_some() && bubble.letter == held.0 {
            GLYPH_MATCH
        } else {
            GLYPH_COLOR
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pop_claims_a_bubble_exactly_once() {
        let mut bubble = LetterBubble::new('A');
        assert!(bubble.try_pop());
        assert!(!bubble.try_pop());
        assert!(bubble.popped());
    }

    #[test]
    fn biased_draw_honors_the_pool_roll() {
        let mut config = GameConfig::default();
        config.frequent_letter_chance = 1.0;
        for _ in 0..100 {
            assert!(config.frequent_letters.contains(random_letter(&config)));
        }
        config.frequent_letter_chance = 0.0;
        for _ in 0..100 {
            assert!(config.rare_letters.contains(random_letter(&config)));
        }
    }

    #[test]
    fn empty_pool_falls_through_to_the_other() {
        let mut config = GameConfig::default();
        config.frequent_letter_chance = 1.0;
        config.frequent_letters.clear();
        for _ in 0..50 {
            assert!(config.rare_letters.contains(random_letter(&config)));
        }
    }

    #[test]
    fn drag_needs_a_held_key_matching_an_assigned_letter() {
        assert!(drag_still_valid(Some('A'), Some('A')));
        assert!(!drag_still_valid(Some('B'), Some('A')));
        assert!(!drag_still_valid(None, Some('A')));
        // Scrambling empties the letter, which drops any drag.
        assert!(!drag_still_valid(Some('A'), None));
    }

    #[test]
    fn scramble_settles_on_the_revealed_letter() {
        let config = GameConfig::default();
        assert_eq!(ScrambleOutcome::Reveal('Q').settle(&config), 'Q');
        let rolled = ScrambleOutcome::Reroll.settle(&config);
        assert!(
            config.frequent_letters.contains(rolled) || config.rare_letters.contains(rolled)
        );
    }

    #[test]
    fn a_fresh_overlay_cancels_the_previous_one() {
        let mut app = App::new();
        app.init_resource::<GameConfig>();
        app.add_message::<FreezeAllBubbles>();
        app.add_message::<ScrambleAllBubbles>();
        app.add_message::<SpawnFreezeChanged>();
        app.add_systems(Update, (apply_scramble, apply_freeze).chain());
        let bubble = app.world_mut().spawn(LetterBubble::new('A')).id();

        app.world_mut()
            .resource_mut::<Messages<ScrambleAllBubbles>>()
            .write(ScrambleAllBubbles { reveal: None });
        app.update();
        assert!(app.world().entity(bubble).contains::<Scrambled>());
        assert_eq!(app.world().get::<LetterBubble>(bubble).unwrap().letter, None);

        app.world_mut()
            .resource_mut::<Messages<FreezeAllBubbles>>()
            .write(FreezeAllBubbles);
        app.update();
        let entity = app.world().entity(bubble);
        assert!(!entity.contains::<Scrambled>());
        assert!(entity.contains::<Frozen>());
        assert!(entity.get::<LetterBubble>().unwrap().letter.is_some());
    }
}
