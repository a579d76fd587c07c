/// The step function: advances a level by one tick.
///
/// Processing order:
///   1. Activation (first movement wakes the chaser)
///   2. Moving platforms
///   3. Player movement (steer → resolve → settle)
///   4. Chaser movement (pursue → resolve → unstick)
///   5. Hostile contact → full reset, nothing else this tick
///   6. Timed item countdown
///   7. Key pickup → gates open
///   8. Item pickup → objective check after each collection
///
/// A completed level is frozen: `step` returns no events until it is
/// torn down or restarted.

use crate::domain::ai;
use crate::domain::entity::{HeldKeys, ItemState};
use crate::domain::physics;
use crate::domain::rules;
use super::event::GameEvent;
use super::world::LevelWorld;

use rand::SeedableRng;
use rand_pcg::Pcg32;

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut LevelWorld, keys: HeldKeys) -> Vec<GameEvent> {
    if world.complete { return vec![]; }

    let mut events: Vec<GameEvent> = Vec::new();
    world.guide.tick();

    resolve_activation(world, keys, &mut events);
    resolve_platforms(world);
    resolve_player_movement(world, keys);
    resolve_chaser_movement(world);
    if resolve_hostile_contact(world, &mut events) { return events; }
    resolve_timed_items(world, &mut events);
    resolve_key_pickup(world, &mut events);
    resolve_item_pickup(world, &mut events);

    events
}

// ══════════════════════════════════════════════════════════════
// Activation
// ══════════════════════════════════════════════════════════════

fn resolve_activation(world: &mut LevelWorld, keys: HeldKeys, events: &mut Vec<GameEvent>) {
    if world.player_has_moved || !keys.any() { return; }
    world.player_has_moved = true;
    if let Some(chaser) = world.chaser.as_mut() {
        chaser.activate();
        events.push(GameEvent::ChaserWoke);
    }
}

// ══════════════════════════════════════════════════════════════
// Platforms: a platform that would overlap an entity holds still
// ══════════════════════════════════════════════════════════════

fn resolve_platforms(world: &mut LevelWorld) {
    let speed = world.tuning.pickups.platform_speed;
    let player_box = world.player.bounds();
    let chaser_box = world.chaser.as_ref().map(|c| c.bounds());

    for platform in &mut world.platforms {
        let (next, heading) = platform.proposed(speed);
        let blocked = next.overlaps(&player_box)
            || chaser_box.is_some_and(|c| next.overlaps(&c));
        if !blocked {
            platform.rect = next;
            platform.heading = heading;
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Movement
// ══════════════════════════════════════════════════════════════

fn resolve_player_movement(world: &mut LevelWorld, keys: HeldKeys) {
    world.player.steer(keys, &world.tuning.player);
    let solids = world.solids();
    let outcome = physics::resolve_move(
        world.player.pos, world.player.vel, world.player.half(),
        &solids, world.arena,
    );
    world.player.settle(outcome, world.tuning.player.bounce);
}

fn resolve_chaser_movement(world: &mut LevelWorld) {
    if world.chaser.is_none() { return; }
    let solids = world.solids();
    let target = world.player.pos;
    if let Some(chaser) = world.chaser.as_mut() {
        ai::advance(chaser, target, &solids, world.arena, &world.tuning.chaser, &mut world.rng);
    }
}

// ══════════════════════════════════════════════════════════════
// Contact
// ══════════════════════════════════════════════════════════════

/// Returns true if the level was reset.
fn resolve_hostile_contact(world: &mut LevelWorld, events: &mut Vec<GameEvent>) -> bool {
    let touched = world.chaser.as_ref()
        .is_some_and(|c| rules::touches_hostile(&world.player, c));
    if !touched { return false; }

    restart_level(world);
    events.push(GameEvent::HostileContact);
    log::debug!("level {:?}: hostile contact, reset #{}", world.name, world.resets);
    true
}

// ══════════════════════════════════════════════════════════════
// Items, keys, gates
// ══════════════════════════════════════════════════════════════

fn resolve_timed_items(world: &mut LevelWorld, events: &mut Vec<GameEvent>) {
    for (index, item) in world.items.iter_mut().enumerate() {
        if item.tick() {
            events.push(GameEvent::ItemDissolved { index });
        }
    }
}

fn resolve_key_pickup(world: &mut LevelWorld, events: &mut Vec<GameEvent>) {
    let reach = world.tuning.pickups.key_size;
    for key in &mut world.keys {
        if key.collected || !rules::within_reach(&world.player, key.pos, reach) { continue; }
        key.collected = true;
        events.push(GameEvent::KeyCollected { id: key.id });
        for gate in world.gates.iter_mut().filter(|g| g.key_id == key.id && !g.open) {
            gate.open = true;
            events.push(GameEvent::GateOpened { key_id: key.id });
        }
    }
}

fn resolve_item_pickup(world: &mut LevelWorld, events: &mut Vec<GameEvent>) {
    let size = world.tuning.pickups.collectible_size;
    let reached: Vec<usize> = world.items.iter().enumerate()
        .filter(|(_, item)| rules::can_collect(&world.player, item, size))
        .map(|(i, _)| i)
        .collect();
    for index in reached {
        collect(world, index, events);
    }
}

/// Mark one item collected and re-check the objective.
pub fn collect(world: &mut LevelWorld, index: usize, events: &mut Vec<GameEvent>) {
    let Some(item) = world.items.get_mut(index) else { return };
    if !item.is_available() { return; }
    item.state = ItemState::Collected;
    events.push(GameEvent::ItemCollected { index, role: item.role });
    check_objective(world, events);
}

/// Fires `LevelComplete` the first time the threshold is reached, never again.
pub fn check_objective(world: &mut LevelWorld, events: &mut Vec<GameEvent>) {
    if world.complete { return; }
    if rules::objective_met(&world.items, world.required) {
        world.complete = true;
        events.push(GameEvent::LevelComplete);
    }
}

// ══════════════════════════════════════════════════════════════
// Restart
// ══════════════════════════════════════════════════════════════

/// Put the level back to its initial configuration.
pub fn restart_level(world: &mut LevelWorld) {
    world.player.reset(world.start());
    for item in &mut world.items { item.reset(); }
    for key in &mut world.keys { key.collected = false; }
    for gate in &mut world.gates { gate.open = false; }
    for platform in &mut world.platforms { platform.reset(); }
    if let Some(chaser) = world.chaser.as_mut() { chaser.reset(); }
    world.player_has_moved = false;
    world.complete = false;
    world.rng = Pcg32::seed_from_u64(world.seed);
    world.resets += 1;
}
