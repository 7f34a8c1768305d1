//! Arena edges: the kill line bubbles drain into, drag contact sweeps,
//! and the HUD barrier strips that cut drags short.

use bevy::prelude::*;

use super::bubble::{BUBBLE_RADIUS, Dragging, LetterBubble};
use super::config::GameConfig;
use super::events::*;
use super::session::{GameSession, Gravity, SessionState};
use super::word::{WordBubble, half_extents, overlaps_circle};
use super::{ARENA_HALF_HEIGHT, ARENA_HALF_WIDTH};
use crate::screens::Screen;

/// How far past the wall a bubble drifts before it counts as lost.
const KILL_MARGIN: f32 = 48.0;
/// Depth of the HUD strips along the top and bottom edges.
const BARRIER_DEPTH: f32 = 64.0;

const BOUNDS_COLOR: Color = Color::srgba(0.55, 0.50, 0.72, 0.35);
const BARRIER_COLOR: Color = Color::srgba(0.85, 0.35, 0.35, 0.5);

pub(super) fn plugin(app: &mut App) {
    app.add_systems(
        FixedUpdate,
        (sweep_kill_line, sweep_word_contacts, enforce_hud_barriers)
            .in_set(super::FixedGameSystems::Contacts)
            .run_if(in_state(SessionState::Playing)),
    );

    app.add_systems(
        Update,
        draw_arena_bounds
            .in_set(super::GameSystems::Presentation)
            .run_if(in_state(Screen::Gameplay)),
    );
}

/// True once `position` has fully crossed the wall gravity points at.
fn past_kill_line(gravity: Gravity, position: Vec2) -> bool {
    match gravity {
        Gravity::Up => position.y > ARENA_HALF_HEIGHT + KILL_MARGIN,
        Gravity::Down => position.y < -(ARENA_HALF_HEIGHT + KILL_MARGIN),
        Gravity::Left => position.x < -(ARENA_HALF_WIDTH + KILL_MARGIN),
        Gravity::Right => position.x > ARENA_HALF_WIDTH + KILL_MARGIN,
    }
}

fn in_barrier_strip(position: Vec2) -> bool {
    position.y.abs() >= ARENA_HALF_HEIGHT - BARRIER_DEPTH
}

fn sweep_kill_line(
    mut commands: Commands,
    config: Res<GameConfig>,
    session: Res<GameSession>,
    mut letters: Query<(Entity, &mut LetterBubble, &Transform)>,
    mut words: Query<(Entity, &mut WordBubble, &Transform)>,
    mut pop_out: MessageWriter<BubblePopped>,
    mut miss_out: MessageWriter<BubbleMissed>,
    mut destroyed_out: MessageWriter<WordDestroyed>,
) {
    for (entity, mut bubble, transform) in &mut letters {
        let position = transform.translation.truncate();
        if !past_kill_line(session.gravity, position) || !bubble.try_pop() {
            continue;
        }
        // A lost bubble reports a zero-point pop first, then the damage.
        // The combo bump lands before the miss resets it.
        pop_out.write(BubblePopped { points: 0, position });
        miss_out.write(BubbleMissed {
            damage: config.boundary_damage,
        });
        commands.entity(entity).despawn();
    }

    for (entity, mut word, transform) in &mut words {
        let position = transform.translation.truncate();
        if !past_kill_line(session.gravity, position) || !word.try_pop() {
            continue;
        }
        destroyed_out.write(WordDestroyed { position });
        commands.entity(entity).despawn();
    }
}

/// Report every dragged bubble touching a word that still wants a letter.
/// The merge runs later in the frame and re-checks everything.
fn sweep_word_contacts(
    dragged: Query<(Entity, &LetterBubble, &Transform), With<Dragging>>,
    words: Query<(Entity, &WordBubble, &Transform)>,
    mut contact_out: MessageWriter<BubbleContact>,
) {
    for (bubble_id, bubble, bubble_transform) in &dragged {
        if bubble.popped() {
            continue;
        }
        let circle = bubble_transform.translation.truncate();
        for (word_id, word, word_transform) in &words {
            if word.popped() || word.filled() {
                continue;
            }
            let center = word_transform.translation.truncate();
            if overlaps_circle(center, half_extents(word.word()), circle, BUBBLE_RADIUS) {
                contact_out.write(BubbleContact {
                    bubble: bubble_id,
                    word: word_id,
                });
            }
        }
    }
}

/// The HUD strips only block drags while the kill walls are the sides.
fn enforce_hud_barriers(
    session: Res<GameSession>,
    dragged: Query<(Entity, &Transform), (With<Dragging>, With<LetterBubble>)>,
    mut blocked_out: MessageWriter<DragBlocked>,
) {
    if !session.gravity.horizontal() {
        return;
    }
    for (entity, transform) in &dragged {
        if in_barrier_strip(transform.translation.truncate()) {
            blocked_out.write(DragBlocked { bubble: entity });
        }
    }
}

fn draw_arena_bounds(mut gizmos: Gizmos, session: Res<GameSession>) {
    gizmos.rect_2d(
        Isometry2d::IDENTITY,
        Vec2::new(ARENA_HALF_WIDTH * 2.0, ARENA_HALF_HEIGHT * 2.0),
        BOUNDS_COLOR,
    );
    if session.gravity.horizontal() {
        let y = ARENA_HALF_HEIGHT - BARRIER_DEPTH;
        gizmos.line_2d(
            Vec2::new(-ARENA_HALF_WIDTH, y),
            Vec2::new(ARENA_HALF_WIDTH, y),
            BARRIER_COLOR,
        );
        gizmos.line_2d(
            Vec2::new(-ARENA_HALF_WIDTH, -y),
            Vec2::new(ARENA_HALF_WIDTH, -y),
            BARRIER_COLOR,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::powerup::PowerUp;

    #[test]
    fn kill_line_tracks_the_gravity_wall() {
        let inside = Vec2::ZERO;
        for gravity in Gravity::ALL {
            assert!(!past_kill_line(gravity, inside));
            let beyond = gravity.unit()
                * match gravity {
                    Gravity::Up | Gravity::Down => ARENA_HALF_HEIGHT + KILL_MARGIN + 1.0,
                    Gravity::Left | Gravity::Right => ARENA_HALF_WIDTH + KILL_MARGIN + 1.0,
                };
            assert!(past_kill_line(gravity, beyond));
            assert!(!past_kill_line(gravity.opposite(), beyond));
        }
    }

    #[test]
    fn crossing_costs_zero_points_and_some_health() {
        let mut app = sweep_app(Gravity::Down);
        let lost = app
            .world_mut()
            .spawn((
                LetterBubble::new('A'),
                Transform::from_xyz(0.0, -(ARENA_HALF_HEIGHT + KILL_MARGIN + 5.0), 1.0),
            ))
            .id();
        let safe = app
            .world_mut()
            .spawn((LetterBubble::new('B'), Transform::default()))
            .id();

        app.update();

        let pops = drain::<BubblePopped>(&mut app);
        assert_eq!(pops.len(), 1);
        assert_eq!(pops[0].points, 0);
        let misses = drain::<BubbleMissed>(&mut app);
        assert_eq!(misses.len(), 1);
        assert_eq!(misses[0].damage, GameConfig::default().boundary_damage);
        assert!(app.world().get_entity(lost).is_err());
        assert!(app.world().get_entity(safe).is_ok());
    }

    #[test]
    fn lost_words_report_without_damage() {
        let mut app = sweep_app(Gravity::Left);
        app.world_mut().spawn((
            WordBubble::new(PowerUp::Coffee, 0),
            Transform::from_xyz(-(ARENA_HALF_WIDTH + KILL_MARGIN + 5.0), 0.0, 1.0),
        ));

        app.update();

        assert_eq!(drain::<WordDestroyed>(&mut app).len(), 1);
        assert!(drain::<BubbleMissed>(&mut app).is_empty());
    }

    #[test]
    fn contact_sweep_only_reports_dragged_bubbles() {
        let mut app = sweep_app(Gravity::Down);
        let word = app
            .world_mut()
            .spawn((WordBubble::new(PowerUp::Coffee, 0), Transform::default()))
            .id();
        let dragged = app
            .world_mut()
            .spawn((
                LetterBubble::new('C'),
                Dragging,
                Transform::from_xyz(10.0, 0.0, 1.0),
            ))
            .id();
        app.world_mut()
            .spawn((LetterBubble::new('C'), Transform::from_xyz(-10.0, 0.0, 1.0)));

        app.update();

        let contacts = drain::<BubbleContact>(&mut app);
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].bubble, dragged);
        assert_eq!(contacts[0].word, word);
    }

    #[test]
    fn barriers_arm_only_under_horizontal_gravity() {
        let strip = Transform::from_xyz(0.0, ARENA_HALF_HEIGHT - 10.0, 1.0);

        let mut app = sweep_app(Gravity::Down);
        app.world_mut()
            .spawn((LetterBubble::new('A'), Dragging, strip));
        app.update();
        assert!(drain::<DragBlocked>(&mut app).is_empty());

        let mut app = sweep_app(Gravity::Right);
        let bubble = app
            .world_mut()
            .spawn((LetterBubble::new('A'), Dragging, strip))
            .id();
        app.update();
        let blocked = drain::<DragBlocked>(&mut app);
        assert_eq!(blocked.len(), 1);
        assert_eq!(blocked[0].bubble, bubble);
    }

    fn sweep_app(gravity: Gravity) -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_message::<BubblePopped>();
        app.add_message::<BubbleMissed>();
        app.add_message::<WordDestroyed>();
        app.add_message::<BubbleContact>();
        app.add_message::<DragBlocked>();
        app.insert_resource(GameConfig::default());
        app.insert_resource(GameSession::new(gravity, 1.0));
        app.add_systems(
            Update,
            (sweep_kill_line, sweep_word_contacts, enforce_hud_barriers),
        );
        app
    }

    fn drain<M: Message + Clone>(app: &mut App) -> Vec<M> {
        app.world_mut()
            .resource_mut::<Messages<M>>()
            .drain()
            .collect()
    }
}
