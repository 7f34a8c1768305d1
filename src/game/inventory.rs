//! Three power-up pockets, filled left to right. Activating a slot empties
//! it immediately and announces the use; whether the effect actually fires
//! is the dispatcher's problem.

use bevy::prelude::*;

use super::events::*;
use super::powerup::PowerUp;
use crate::screens::Screen;

pub(super) fn plugin(app: &mut App) {
    app.register_type::<Inventory>();
    app.init_resource::<Inventory>();

    app.add_systems(OnEnter(Screen::Gameplay), reset_inventory);
    app.add_systems(
        Update,
        (
            take_used_slots
                .in_set(super::GameSystems::Effects)
                .before(super::powerup::dispatch_uses),
            store_collected.in_set(super::GameSystems::Collection),
        )
            .run_if(in_state(Screen::Gameplay)),
    );
}

#[derive(Resource, Debug, Default, Reflect)]
#[reflect(Resource)]
pub struct Inventory {
    pub slots: [Option<PowerUp>; 3],
}

impl Inventory {
    /// First-empty-slot insertion. Returns the slot index, or None when full.
    pub fn store(&mut self, power: PowerUp) -> Option<usize> {
        let slot = self.slots.iter().position(|s| s.is_none())?;
        self.slots[slot] = Some(power);
        Some(slot)
    }

    /// Empty the slot and hand back whatever was in it.
    pub fn take(&mut self, slot: usize) -> Option<PowerUp> {
        self.slots.get_mut(slot)?.take()
    }
}

fn reset_inventory(mut inventory: ResMut<Inventory>) {
    inventory.slots = [None, None, None];
}

fn store_collected(
    mut inventory: ResMut<Inventory>,
    mut collected: MessageReader<PowerUpCollected>,
    mut stored_out: MessageWriter<PowerUpStored>,
) {
    for collect in collected.read() {
        match inventory.store(collect.power) {
            Some(slot) => {
                stored_out.write(PowerUpStored {
                    slot,
                    power: collect.power,
                });
                info!("Stored {:?} in slot {}", collect.power, slot);
            }
            None => {
                // Full pockets: the pickup evaporates.
                debug!("Inventory full, dropped {:?}", collect.power);
            }
        }
    }
}

pub(super) fn take_used_slots(
    mut inventory: ResMut<Inventory>,
    mut slot_uses: MessageReader<SlotUsed>,
    mut used_out: MessageWriter<PowerUpUsed>,
) {
    for use_request in slot_uses.read() {
        let Some(power) = inventory.take(use_request.slot) else {
            continue;
        };
        used_out.write(PowerUpUsed {
            slot: use_request.slot,
            power,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_fills_first_empty_slot() {
        let mut inventory = Inventory::default();
        assert_eq!(inventory.store(PowerUp::Coffee), Some(0));
        assert_eq!(inventory.store(PowerUp::Debug), Some(1));
        assert_eq!(inventory.store(PowerUp::Push), Some(2));
        assert_eq!(inventory.store(PowerUp::Pull), None);
        assert_eq!(
            inventory.slots,
            [
                Some(PowerUp::Coffee),
                Some(PowerUp::Debug),
                Some(PowerUp::Push)
            ]
        );
    }

    #[test]
    fn freed_slot_is_reused_first() {
        let mut inventory = Inventory::default();
        inventory.store(PowerUp::Coffee);
        inventory.store(PowerUp::Debug);
        assert_eq!(inventory.take(0), Some(PowerUp::Coffee));
        assert_eq!(inventory.store(PowerUp::Hotfix), Some(0));
    }

    #[test]
    fn take_empties_the_slot_once() {
        let mut inventory = Inventory::default();
        inventory.store(PowerUp::Commit);
        assert_eq!(inventory.take(0), Some(PowerUp::Commit));
        assert_eq!(inventory.take(0), None);
    }

    #[test]
    fn take_out_of_range_is_harmless() {
        let mut inventory = Inventory::default();
        inventory.store(PowerUp::Refactor);
        assert_eq!(inventory.take(7), None);
        assert_eq!(inventory.slots[0], Some(PowerUp::Refactor));
    }
}
