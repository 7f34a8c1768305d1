//! Word bubbles - drifting power-up words with one letter blanked out.
//!
//! Dragging a letter bubble onto the blank fills it; a filled word pops on
//! click and pays out its power-up.

use bevy::prelude::*;
use rand::Rng;

use super::bubble::{Dragging, Frozen, LetterBubble};
use super::config::GameConfig;
use super::events::*;
use super::input::PointerWorld;
use super::polish::PopAnimation;
use super::powerup::PowerUp;
use super::session::{Difficulty, GameSession, SessionState};
use crate::screens::Screen;

/// #b3582d
const WORD_FILL: Color = Color::srgb(0.702, 0.345, 0.176);
const WORD_GLYPH_COLOR: Color = Color::srgb(0.97, 0.97, 0.97);
/// Glyph tint once the blank is filled and the word is ready to pop.
const WORD_READY: Color = Color::srgb(0.949, 0.788, 0.298);

pub(super) fn plugin(app: &mut App) {
    app.register_type::<WordBubble>();

    app.add_systems(
        FixedUpdate,
        drift_words
            .in_set(super::FixedGameSystems::Drift)
            .run_if(in_state(SessionState::Playing)),
    );

    app.add_systems(
        Update,
        (
            (
                merge_contacts.run_if(in_state(SessionState::Playing)),
                pop_filled_words.run_if(in_state(SessionState::Playing)),
                freeze_words,
            )
                .chain()
                .in_set(super::GameSystems::Entities),
            sync_word_display.in_set(super::GameSystems::Presentation),
        )
            .run_if(in_state(Screen::Gameplay)),
    );
}

/// A drifting word bubble. One letter is blank until a matching letter
/// bubble is dragged into it.
#[derive(Component, Debug, Reflect)]
#[reflect(Component)]
pub struct WordBubble {
    pub power: PowerUp,
    missing_index: usize,
    filled: bool,
    popped: bool,
}

impl WordBubble {
    pub fn new(power: PowerUp, missing_index: usize) -> Self {
        Self {
            power,
            missing_index,
            filled: false,
            popped: false,
        }
    }

    pub fn word(&self) -> &'static str {
        self.power.word()
    }

    pub fn filled(&self) -> bool {
        self.filled
    }

    pub fn popped(&self) -> bool {
        self.popped
    }

    /// The letter still needed, or None once the blank is filled.
    pub fn missing_letter(&self) -> Option<char> {
        if self.filled {
            return None;
        }
        self.word().chars().nth(self.missing_index)
    }

    /// The word as shown on screen, with the blank as an underscore.
    pub fn display(&self) -> String {
        if self.filled {
            return self.word().to_string();
        }
        self.word()
            .chars()
            .enumerate()
            .map(|(i, c)| if i == self.missing_index { '_' } else { c })
            .collect()
    }

    /// Fill the blank if `letter` is the one it needs.
    pub fn try_merge(&mut self, letter: char) -> bool {
        if self.popped || self.missing_letter() != Some(letter) {
            return false;
        }
        self.filled = true;
        true
    }

    /// Claim this word for exactly one pop path, click or kill line.
    pub fn try_pop(&mut self) -> bool {
        if self.popped {
            return false;
        }
        self.popped = true;
        true
    }
}

/// The child entity rendering this word's text.
#[derive(Component, Debug)]
pub struct WordGlyph(pub Entity);

/// Half extents of a word's rectangle, scaled to its letter count.
pub(super) fn half_extents(word: &str) -> Vec2 {
    Vec2::new(word.len() as f32 * 8.0 + 18.0, 22.0)
}

pub(super) fn word_hit(center: Vec2, half: Vec2, point: Vec2) -> bool {
    (point.x - center.x).abs() <= half.x && (point.y - center.y).abs() <= half.y
}

/// Circle-rectangle overlap, used for drag contact sweeps.
pub(super) fn overlaps_circle(center: Vec2, half: Vec2, circle: Vec2, radius: f32) -> bool {
    let closest = circle.clamp(center - half, center + half);
    closest.distance(circle) <= radius
}

/// Spawn one word bubble at `position` with a random blank slot.
pub(super) fn spawn_word_bubble(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<ColorMaterial>,
    position: Vec2,
    power: PowerUp,
) -> Entity {
    let word = power.word();
    let missing_index = rand::rng().random_range(0..word.len());
    let bubble = WordBubble::new(power, missing_index);
    let half = half_extents(word);

    let glyph = commands
        .spawn((
            Name::new("Word Glyph"),
            Text2d::new(bubble.display()),
            TextFont::from_font_size(24.0),
            TextColor(WORD_GLYPH_COLOR),
            Transform::from_xyz(0.0, 0.0, 0.1),
        ))
        .id();

    commands
        .spawn((
            Name::new(format!("Word {word}")),
            bubble,
            WordGlyph(glyph),
            Transform::from_translation(position.extend(1.0)),
            Mesh2d(meshes.add(Rectangle::new(half.x * 2.0, half.y * 2.0))),
            MeshMaterial2d(materials.add(ColorMaterial::from_color(WORD_FILL))),
            DespawnOnExit(Screen::Gameplay),
        ))
        .add_child(glyph)
        .id()
}

fn drift_words(
    time: Res<Time>,
    session: Res<GameSession>,
    difficulty: Res<Difficulty>,
    mut words: Query<(&WordBubble, &mut Transform), Without<Frozen>>,
) {
    let velocity = difficulty.word_speed * session.gravity.unit();
    for (word, mut transform) in &mut words {
        if word.popped {
            continue;
        }
        transform.translation += velocity.extend(0.0) * time.delta_secs();
    }
}

/// Resolve contact reports against live state. The sweep ran earlier in the
/// frame, so the bubble may have popped or been released since.
fn merge_contacts(
    mut commands: Commands,
    config: Res<GameConfig>,
    mut contacts: MessageReader<BubbleContact>,
    mut words: Query<&mut WordBubble>,
    mut bubbles: Query<(&mut LetterBubble, &Transform, Has<Dragging>)>,
    mut pop_out: MessageWriter<BubblePopped>,
) {
    for contact in contacts.read() {
        let Ok(mut word) = words.get_mut(contact.word) else {
            continue;
        };
        let Ok((mut bubble, transform, dragging)) = bubbles.get_mut(contact.bubble) else {
            continue;
        };
        if !dragging || bubble.popped() {
            continue;
        }
        let Some(letter) = bubble.letter else { continue };
        if !word.try_merge(letter) {
            continue;
        }
        if bubble.try_pop() {
            pop_out.write(BubblePopped {
                points: config.letter_points,
                position: transform.translation.truncate(),
            });
            commands
                .entity(contact.bubble)
                .remove::<Dragging>()
                .insert(PopAnimation::default());
        }
    }
}

fn pop_filled_words(
    mut commands: Commands,
    pointer: Res<PointerWorld>,
    mut clicks: MessageReader<PrimaryPressed>,
    mut words: Query<(Entity, &mut WordBubble, &Transform)>,
    mut destroyed_out: MessageWriter<WordDestroyed>,
    mut collected_out: MessageWriter<PowerUpCollected>,
) {
    for _ in clicks.read() {
        let Some(point) = pointer.0 else { continue };
        for (entity, mut word, transform) in &mut words {
            if !word.filled {
                continue;
            }
            let position = transform.translation.truncate();
            if !word_hit(position, half_extents(word.word()), point) {
                continue;
            }
            if !word.try_pop() {
                continue;
            }
            destroyed_out.write(WordDestroyed { position });
            collected_out.write(PowerUpCollected { power: word.power });
            commands.entity(entity).insert(PopAnimation::default());
        }
    }
}

/// A field-wide freeze or scramble halts words too. Pushes leave them be.
fn freeze_words(
    mut commands: Commands,
    config: Res<GameConfig>,
    mut freezes: MessageReader<FreezeAllBubbles>,
    mut scrambles: MessageReader<ScrambleAllBubbles>,
    words: Query<(Entity, &WordBubble)>,
) {
    let mut duration: Option<f32> = None;
    for _ in freezes.read() {
        duration = Some(config.freeze_duration);
    }
    for scramble in scrambles.read() {
        let own = match scramble.reveal {
            Some(_) => config.reveal_duration,
            None => config.scramble_duration,
        };
        duration = Some(duration.map_or(own, |current| current.max(own)));
    }
    let Some(duration) = duration else { return };
    for (entity, word) in &words {
        if word.popped {
            continue;
        }
        commands.entity(entity).insert(Frozen::for_seconds(duration));
    }
}

fn sync_word_display(
    words: Query<(&WordBubble, &WordGlyph), Changed<WordBubble>>,
    mut glyphs: Query<(&mut Text2d, &mut TextColor)>,
) {
    for (word, glyph) in &words {
        if let Ok((mut text, mut color)) = glyphs.get_mut(glyph.0) {
            text.0 = word.display();
            color.0 = if word.filled {
                WORD_READY
            } else {
                WORD_GLYPH_COLOR
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_sits_at_the_missing_index() {
        let word = WordBubble::new(PowerUp::Coffee, 3);
        assert_eq!(word.display(), "COF_EE");
        assert_eq!(word.missing_letter(), Some('F'));
    }

    #[test]
    fn merge_only_accepts_the_missing_letter() {
        let mut word = WordBubble::new(PowerUp::Debug, 0);
        assert!(!word.try_merge('X'));
        assert!(word.try_merge('D'));
        assert!(word.filled());
        assert_eq!(word.display(), "DEBUG");
        assert_eq!(word.missing_letter(), None);
        assert!(!word.try_merge('D'));
    }

    #[test]
    fn filled_word_pops_exactly_once() {
        let mut word = WordBubble::new(PowerUp::Push, 2);
        assert!(word.try_pop());
        assert!(!word.try_pop());
    }

    #[test]
    fn hit_test_matches_the_rectangle() {
        let half = half_extents("COFFEE");
        let center = Vec2::new(100.0, 50.0);
        assert!(word_hit(center, half, center));
        assert!(word_hit(center, half, center + Vec2::new(half.x, half.y)));
        assert!(!word_hit(center, half, center + Vec2::new(half.x + 1.0, 0.0)));
        assert!(!word_hit(center, half, center + Vec2::new(0.0, half.y + 1.0)));
    }

    #[test]
    fn circle_overlap_touches_edges_and_corners() {
        let half = Vec2::new(50.0, 20.0);
        let center = Vec2::ZERO;
        assert!(overlaps_circle(center, half, Vec2::new(60.0, 0.0), 10.0));
        assert!(!overlaps_circle(center, half, Vec2::new(61.0, 0.0), 10.0));
        let corner = Vec2::new(50.0 + 6.0, 20.0 + 6.0);
        assert!(overlaps_circle(center, half, corner, 10.0));
        assert!(!overlaps_circle(center, half, corner + Vec2::splat(3.0), 10.0));
    }

    #[test]
    fn contact_merge_consumes_the_dragged_bubble() {
        let mut app = merge_app();
        let word = app
            .world_mut()
            .spawn((WordBubble::new(PowerUp::Coffee, 0), Transform::default()))
            .id();
        let bubble = app
            .world_mut()
            .spawn((
                LetterBubble::new('C'),
                Dragging,
                Transform::from_xyz(10.0, 0.0, 1.0),
            ))
            .id();

        write(&mut app, BubbleContact { bubble, word });
        app.update();

        assert!(app.world().get::<WordBubble>(word).unwrap().filled());
        assert!(app.world().get::<LetterBubble>(bubble).unwrap().popped());
        let pops = drain::<BubblePopped>(&mut app);
        assert_eq!(pops.len(), 1);
        assert_eq!(pops[0].points, GameConfig::default().letter_points);
    }

    #[test]
    fn released_bubbles_no_longer_merge() {
        let mut app = merge_app();
        let word = app
            .world_mut()
            .spawn((WordBubble::new(PowerUp::Coffee, 0), Transform::default()))
            .id();
        let bubble = app
            .world_mut()
            .spawn((LetterBubble::new('C'), Transform::default()))
            .id();

        write(&mut app, BubbleContact { bubble, word });
        app.update();

        assert!(!app.world().get::<WordBubble>(word).unwrap().filled());
        assert!(!app.world().get::<LetterBubble>(bubble).unwrap().popped());
        assert!(drain::<BubblePopped>(&mut app).is_empty());
    }

    fn merge_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_message::<BubbleContact>();
        app.add_message::<BubblePopped>();
        app.insert_resource(GameConfig::default());
        app.add_systems(Update, merge_contacts);
        app
    }

    fn write<M: Message>(app: &mut App, message: M) {
        app.world_mut().resource_mut::<Messages<M>>().write(message);
    }

    fn drain<M: Message + Clone>(app: &mut App) -> Vec<M> {
        app.world_mut()
            .resource_mut::<Messages<M>>()
            .drain()
            .collect()
    }
}
