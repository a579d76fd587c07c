/// Pickup, contact and objective rules: truth-table driven.
///
/// Pure functions: they decide "what happened", never mutate.
///
/// ### Pickup (items and keys)
/// ┌──────────────────────────────────────────┬─────────┐
/// │ Condition                                 │ Pickup? │
/// ├──────────────────────────────────────────┼─────────┤
/// │ item not Available                        │ NO      │
/// │ dist(centers) < item_size + player_size/2 │ YES     │
/// │ otherwise                                 │ NO      │
/// └──────────────────────────────────────────┴─────────┘
///
/// ### Hostile contact
/// ┌──────────────────────────────────────────┬──────────┐
/// │ Condition                                 │ Contact? │
/// ├──────────────────────────────────────────┼──────────┤
/// │ chaser inactive                           │ NO       │
/// │ player box overlaps chaser box (strict)   │ YES      │
/// │ otherwise                                 │ NO       │
/// └──────────────────────────────────────────┴──────────┘
///
/// ### Objective
/// ┌──────────────────────────────────────────┬───────────┐
/// │ Condition                                 │ Complete? │
/// ├──────────────────────────────────────────┼───────────┤
/// │ already complete                          │ no event  │
/// │ collected Required >= threshold           │ YES, once │
/// │ otherwise                                 │ NO        │
/// └──────────────────────────────────────────┴───────────┘
/// Bonus and Timed items never count toward the threshold.

use glam::Vec2;

use super::entity::{Chaser, Collectible, ItemRole, Player};

/// Is the player close enough to pick up something of `item_size` at `item_pos`?
#[inline]
pub fn within_reach(player: &Player, item_pos: Vec2, item_size: f32) -> bool {
    player.pos.distance(item_pos) < item_size + player.size / 2.0
}

pub fn can_collect(player: &Player, item: &Collectible, item_size: f32) -> bool {
    item.is_available() && within_reach(player, item.pos, item_size)
}

pub fn touches_hostile(player: &Player, chaser: &Chaser) -> bool {
    chaser.active && player.bounds().overlaps(&chaser.bounds())
}

/// Threshold for a level: the declared count, or every required item.
pub fn required_threshold(declared: Option<usize>, required_items: usize) -> usize {
    declared.unwrap_or(required_items).min(required_items)
}

pub fn collected_required(items: &[Collectible]) -> usize {
    items.iter()
        .filter(|c| c.role == ItemRole::Required && c.is_collected())
        .count()
}

pub fn objective_met(items: &[Collectible], threshold: usize) -> bool {
    collected_required(items) >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Tuning;
    use crate::domain::entity::ItemState;

    fn player_at(x: f32, y: f32) -> Player {
        Player::new(Vec2::new(x, y), 30.0)
    }

    fn items(required: usize, collected: usize, bonus_collected: usize) -> Vec<Collectible> {
        let mut v = Vec::new();
        for i in 0..required {
            let mut c = Collectible::new(Vec2::new(i as f32 * 50.0, 0.0), ItemRole::Required);
            if i < collected { c.state = ItemState::Collected; }
            v.push(c);
        }
        for _ in 0..bonus_collected {
            let mut c = Collectible::new(Vec2::ZERO, ItemRole::Bonus);
            c.state = ItemState::Collected;
            v.push(c);
        }
        v
    }

    // ── Pickup ──

    #[test]
    fn reach_is_item_size_plus_half_player() {
        let p = player_at(100.0, 100.0);
        assert!(within_reach(&p, Vec2::new(134.9, 100.0), 20.0));
        assert!(!within_reach(&p, Vec2::new(135.0, 100.0), 20.0));
    }

    #[test]
    fn collected_item_is_not_picked_again() {
        let p = player_at(0.0, 0.0);
        let mut c = Collectible::new(Vec2::ZERO, ItemRole::Required);
        assert!(can_collect(&p, &c, 20.0));
        c.state = ItemState::Collected;
        assert!(!can_collect(&p, &c, 20.0));
        c.state = ItemState::Dissolved;
        assert!(!can_collect(&p, &c, 20.0));
    }

    // ── Contact ──

    #[test]
    fn inactive_chaser_is_harmless() {
        let p = player_at(100.0, 100.0);
        let mut c = Chaser::new(Vec2::new(100.0, 100.0), 2.0, &Tuning::default().chaser);
        assert!(!touches_hostile(&p, &c));
        c.activate();
        assert!(touches_hostile(&p, &c));
    }

    #[test]
    fn contact_needs_box_overlap() {
        let p = player_at(100.0, 100.0);
        let mut c = Chaser::new(Vec2::new(129.0, 100.0), 2.0, &Tuning::default().chaser);
        c.activate();
        assert!(!touches_hostile(&p, &c)); // 15 + 14 = 29: edges touch
        c.pos.x = 128.0;
        assert!(touches_hostile(&p, &c));
    }

    // ── Objective ──

    #[test]
    fn threshold_defaults_to_all_required() {
        assert_eq!(required_threshold(None, 5), 5);
        assert_eq!(required_threshold(Some(3), 5), 3);
        assert_eq!(required_threshold(Some(9), 5), 5);
    }

    #[test]
    fn bonus_does_not_count() {
        let v = items(5, 4, 3);
        assert_eq!(collected_required(&v), 4);
        assert!(!objective_met(&v, 5));
        assert!(objective_met(&items(5, 5, 0), 5));
        assert!(objective_met(&items(5, 3, 0), 3));
    }
}
