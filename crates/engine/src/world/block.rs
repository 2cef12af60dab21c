use serde::{Deserialize, Serialize};

/// Opaque block-type identifier. The engine stores these without interpreting
/// them; game layers assign meaning to specific ids.
///
/// The only semantic the engine enforces is that `BlockId::AIR` (0) is the
/// empty block and the initial value of every cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub u32);

impl BlockId {
    /// The universal "empty" block.
    pub const AIR: BlockId = BlockId(0);
}
