//! Target acquisition, weapon fire and damage.

use tracing::debug;

use crate::coord::Coord;
use crate::house::HouseId;
use crate::items::ItemId;
use crate::math::Fixed;
use crate::objects::{AttackMode, GameObject, ObjectId};
use crate::simulation::{DamageEvent, DestroyedEvent, TickEvents};
use crate::world::World;

/// Cycles a deviated unit fights for its new owner.
pub const DEVIATION_CYCLES: u32 = 1500;

/// Radius of a devastator self-destruct.
pub const DEVASTATE_RADIUS: i32 = 2;

/// Damage dealt by a devastator self-destruct.
pub const DEVASTATE_DAMAGE: i32 = 250;

/// Closest tile of `to`'s footprint as seen from `from`.
#[must_use]
pub fn nearest_point(from: Coord, to: &GameObject) -> Coord {
    Coord::new(
        from.x.clamp(to.location.x, to.location.x + to.width() - 1),
        from.y.clamp(to.location.y, to.location.y + to.height() - 1),
    )
}

/// Block distance between two footprints.
#[must_use]
pub fn distance_between(a: &GameObject, b: &GameObject) -> Fixed {
    let b_point = nearest_point(a.location, b);
    let a_point = nearest_point(b_point, a);
    a_point.block_distance(b_point)
}

/// Whether `attacker` can hit `target` at all.
#[must_use]
pub fn can_target(attacker: ItemId, target: ItemId) -> bool {
    if target.is_aircraft() {
        return matches!(
            attacker,
            ItemId::Launcher
                | ItemId::RocketTurret
                | ItemId::Trooper
                | ItemId::Troopers
                | ItemId::Ornithopter
        );
    }
    if attacker == ItemId::Deviator {
        return target.is_unit();
    }
    true
}

/// Range within which an object picks new targets, `None` for never.
#[must_use]
pub fn acquisition_range(object: &GameObject) -> Option<i32> {
    let weapon = object.item.data().weapon?;
    if object.is_structure() {
        return Some(weapon.range);
    }
    if object.forced {
        return None;
    }
    match object.attack_mode {
        AttackMode::Guard => Some(weapon.range + 1),
        AttackMode::AreaGuard => Some(object.item.guard_range()),
        AttackMode::Hunt => Some(i32::MAX),
        AttackMode::Retreat
        | AttackMode::Stop
        | AttackMode::Harvest
        | AttackMode::CarryallRequested => None,
    }
}

fn is_valid_target(world: &World, attacker: &GameObject, target: ObjectId) -> bool {
    world.object(target).is_some_and(|t| {
        world.is_enemy(attacker.owner, t.owner) && can_target(attacker.item, t.item)
    })
}

fn acquire(world: &World, attacker: &GameObject, range: i32) -> Option<ObjectId> {
    let limit = Fixed::saturating_from_num(range);
    let mut best: Option<(Fixed, ObjectId)> = None;
    for candidate in world.objects() {
        if !candidate.visible
            || !world.is_enemy(attacker.owner, candidate.owner)
            || !can_target(attacker.item, candidate.item)
        {
            continue;
        }
        let distance = distance_between(attacker, candidate);
        if distance > limit {
            continue;
        }
        if best.map_or(true, |(d, _)| distance < d) {
            best = Some((distance, candidate.id));
        }
    }
    best.map(|(_, id)| id)
}

/// Drop stale targets and pick new ones.
pub fn update_targets(world: &mut World) {
    for id in world.object_ids() {
        let Some(object) = world.object(id) else {
            continue;
        };
        let current = object.target.filter(|t| is_valid_target(world, object, *t));
        let target = match current {
            Some(t) => Some(t),
            None => acquisition_range(object).and_then(|range| acquire(world, object, range)),
        };
        if let Some(object) = world.object_mut(id) {
            object.target = target;
        }
    }
}

/// Apply damage and destroy the victim when it dies.
pub fn damage_object(
    world: &mut World,
    victim: ObjectId,
    attacker: Option<ObjectId>,
    amount: i32,
    events: &mut TickEvents,
) {
    let attacker_owner = attacker.and_then(|a| world.object(a)).map(|a| a.owner);
    let Some(object) = world.object_mut(victim) else {
        return;
    };
    let dealt = object.health.apply_damage(amount);
    if dealt == 0 {
        return;
    }
    let dead = object.health.is_dead();
    let owner = object.owner;
    events.damage.push(DamageEvent {
        victim,
        victim_owner: owner,
        attacker,
        amount: dealt,
    });
    if dead {
        destroy(world, victim, attacker_owner.filter(|k| *k != owner), events);
    }
}

/// Destroy an object and record the event.
pub fn destroy(world: &mut World, id: ObjectId, killer: Option<HouseId>, events: &mut TickEvents) {
    if let Some(object) = world.destroy_object(id, killer) {
        debug!(id = %id, item = %object.item, owner = %object.owner, "object destroyed");
        events.destroyed.push(DestroyedEvent {
            id,
            item: object.item,
            owner: object.owner,
            killer,
            location: object.location,
        });
    }
}

/// Damage every object with a footprint tile within `radius` of `center`.
pub fn damage_area(
    world: &mut World,
    center: Coord,
    radius: i32,
    amount: i32,
    attacker: Option<ObjectId>,
    events: &mut TickEvents,
) {
    let victims: Vec<ObjectId> = world
        .objects()
        .filter(|o| Some(o.id) != attacker && o.gap_to(center) <= radius)
        .map(|o| o.id)
        .collect();
    for victim in victims {
        damage_object(world, victim, attacker, amount, events);
    }
}

/// Self-destruct a devastator.
pub fn devastate(world: &mut World, id: ObjectId, events: &mut TickEvents) {
    let Some(object) = world.object(id) else {
        return;
    };
    let (center, owner) = (object.location, object.owner);
    damage_area(world, center, DEVASTATE_RADIUS, DEVASTATE_DAMAGE, Some(id), events);
    destroy(world, id, None, events);
    debug!(house = %owner, "devastator self-destructed");
}

fn reload_mut(object: &mut GameObject) -> &mut u32 {
    match &mut object.kind {
        crate::objects::ObjectKind::Unit(state) => &mut state.reload,
        crate::objects::ObjectKind::Structure(state) => &mut state.reload,
    }
}

fn deviate(world: &mut World, victim: ObjectId, new_owner: HouseId) {
    if world.change_owner(victim, new_owner) {
        if let Some(unit) = world.object_mut(victim).and_then(GameObject::unit_mut) {
            unit.deviation_timer = DEVIATION_CYCLES;
            unit.destination = Coord::INVALID;
        }
    }
}

/// Count down reloads, fire at targets in range, chase targets out of range.
pub fn fire_weapons(world: &mut World, events: &mut TickEvents) {
    for id in world.object_ids() {
        let Some(object) = world.object_mut(id) else {
            continue;
        };
        let Some(weapon) = object.item.data().weapon else {
            continue;
        };
        let reload = reload_mut(object);
        if *reload > 0 {
            *reload -= 1;
        }
        let ready = *reload == 0;

        let Some(object) = world.object(id) else {
            continue;
        };
        let Some(target) = object.target.and_then(|t| world.object(t)) else {
            continue;
        };
        let distance = distance_between(object, target);
        let target_id = target.id;
        let in_range = distance <= Fixed::from_num(weapon.range);

        if !in_range {
            let chases = object.is_unit()
                && (object.forced
                    || matches!(object.attack_mode, AttackMode::AreaGuard | AttackMode::Hunt));
            if chases {
                let goal = nearest_point(object.location, target);
                if let Some(unit) = world.object_mut(id).and_then(GameObject::unit_mut) {
                    unit.destination = goal;
                }
            }
            continue;
        }
        if !ready {
            continue;
        }

        let (attacker_item, attacker_owner) = (object.item, object.owner);
        if let Some(object) = world.object_mut(id) {
            *reload_mut(object) = weapon.reload;
            if let Some(unit) = object.unit_mut() {
                unit.destination = Coord::INVALID;
            }
        }
        if attacker_item == ItemId::Deviator {
            deviate(world, target_id, attacker_owner);
        } else {
            damage_object(world, target_id, Some(id), weapon.damage, events);
        }
        if attacker_item == ItemId::Saboteur {
            destroy(world, id, None, events);
        }
    }
}

/// Return deviated units to their original owners once the effect wears off.
pub fn expire_deviations(world: &mut World) {
    for id in world.object_ids() {
        let Some(unit) = world.object_mut(id).and_then(GameObject::unit_mut) else {
            continue;
        };
        if unit.deviation_timer == 0 {
            continue;
        }
        unit.deviation_timer -= 1;
        if unit.deviation_timer == 0 {
            let original = unit.original_owner;
            world.change_owner(id, original);
        }
    }
}
