/// Events emitted during a simulation step.
/// The level screen consumes these for flow decisions and logging.

use crate::domain::entity::ItemRole;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    ItemCollected { index: usize, role: ItemRole },
    ItemDissolved { index: usize },
    KeyCollected { id: u32 },
    GateOpened { key_id: u32 },
    ChaserWoke,
    /// Player touched the chaser; the level has already been reset.
    HostileContact,
    LevelComplete,
}
