use std::fmt;

use serde::{Deserialize, Serialize};

use super::block::BlockId;
use super::position::{ChunkPos, InvalidChunkId, LocalBlockPos};
use crate::clock;

/// Number of blocks along the x and z axes of a chunk.
pub const CHUNK_SIZE: usize = 16;
/// Number of blocks along the y axis of a chunk.
pub const CHUNK_HEIGHT: usize = 256;
/// Total block count in one chunk.
pub const CHUNK_VOLUME: usize = CHUNK_SIZE * CHUNK_SIZE * CHUNK_HEIGHT;

/// A `16 x 256 x 16` column of blocks.
///
/// Stored densely as a flat array in YZX order (`y * 256 + z * 16 + x`).
/// That order is observable: the run-length encoding in [`Chunk::runs`]
/// walks the array front to back.
#[derive(Clone)]
pub struct Chunk {
    pos: ChunkPos,
    blocks: Box<[BlockId]>,
    /// Wall-clock seconds of the last in-range write, 0 if never written.
    last_modified: i64,
}

impl Chunk {
    /// An all-air chunk that has never been modified.
    pub fn new(pos: ChunkPos) -> Self {
        Self {
            pos,
            blocks: vec![BlockId::AIR; CHUNK_VOLUME].into_boxed_slice(),
            last_modified: 0,
        }
    }

    pub fn pos(&self) -> ChunkPos {
        self.pos
    }

    /// The `"<x>:<z>"` chunk id.
    pub fn id(&self) -> String {
        self.pos.to_string()
    }

    pub fn last_modified(&self) -> i64 {
        self.last_modified
    }

    /// Read a block. Out-of-range coordinates read as air.
    #[inline]
    pub fn get_block(&self, pos: LocalBlockPos) -> BlockId {
        match pos.index() {
            Some(idx) => self.blocks[idx],
            None => BlockId::AIR,
        }
    }

    /// Write a block, stamping the chunk with the current wall-clock time.
    ///
    /// Out-of-range coordinates are silently ignored and leave
    /// `last_modified` untouched. Returns whether the write landed.
    pub fn set_block(&mut self, pos: LocalBlockPos, block: BlockId) -> bool {
        self.set_block_at(pos, block, clock::unix_now())
    }

    /// Like [`Chunk::set_block`] with an explicit timestamp. The stored
    /// timestamp never moves backwards, even if the clock does.
    pub fn set_block_at(&mut self, pos: LocalBlockPos, block: BlockId, now: i64) -> bool {
        let Some(idx) = pos.index() else {
            return false;
        };
        self.blocks[idx] = block;
        self.last_modified = self.last_modified.max(now);
        true
    }

    /// Raw block array in linearization order.
    pub fn blocks(&self) -> &[BlockId] {
        &self.blocks
    }

    /// Run-length encode the block array. Adjacent runs always differ in
    /// block type and the counts sum to [`CHUNK_VOLUME`].
    pub fn runs(&self) -> Vec<BlockRun> {
        let mut runs: Vec<BlockRun> = Vec::new();
        for &block in self.blocks.iter() {
            match runs.last_mut() {
                Some(run) if run.block == block => run.count += 1,
                _ => runs.push(BlockRun { block, count: 1 }),
            }
        }
        runs
    }

    pub fn to_blob(&self) -> ChunkBlob {
        ChunkBlob {
            chunk_id: self.id(),
            blocks: self.runs(),
            last_modified: self.last_modified,
        }
    }

    /// Compact JSON form:
    /// `{"chunkId":"x:z","blocks":[{"type":..,"count":..},..],"lastModified":..}`.
    pub fn serialize(&self) -> String {
        serde_json::to_string(&self.to_blob()).expect("chunk blob is always serializable")
    }

    /// Rebuild a chunk from its serialized form.
    pub fn from_blob(blob: &ChunkBlob) -> Result<Self, DecodeError> {
        let pos: ChunkPos = blob.chunk_id.parse().map_err(DecodeError::ChunkId)?;
        let blocks = decode_runs(&blob.blocks)?;
        Ok(Self {
            pos,
            blocks: blocks.into_boxed_slice(),
            last_modified: blob.last_modified,
        })
    }
}

impl fmt::Debug for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunk")
            .field("pos", &self.pos)
            .field("last_modified", &self.last_modified)
            .finish_non_exhaustive()
    }
}

/// One run of identical blocks in a serialized chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRun {
    #[serde(rename = "type")]
    pub block: BlockId,
    pub count: u32,
}

/// Serialized chunk, field order matching the wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkBlob {
    pub chunk_id: String,
    pub blocks: Vec<BlockRun>,
    pub last_modified: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    ChunkId(InvalidChunkId),
    /// The runs did not add up to exactly one chunk's worth of blocks.
    Length { expected: usize, actual: u64 },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::ChunkId(e) => e.fmt(f),
            DecodeError::Length { expected, actual } => {
                write!(f, "block runs cover {} cells, expected {}", actual, expected)
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// Expand run-length encoded blocks back into a flat array of
/// [`CHUNK_VOLUME`] cells.
pub fn decode_runs(runs: &[BlockRun]) -> Result<Vec<BlockId>, DecodeError> {
    let total: u64 = runs.iter().map(|r| r.count as u64).sum();
    if total != CHUNK_VOLUME as u64 {
        return Err(DecodeError::Length {
            expected: CHUNK_VOLUME,
            actual: total,
        });
    }
    let mut blocks = Vec::with_capacity(CHUNK_VOLUME);
    for run in runs {
        blocks.extend(std::iter::repeat_n(run.block, run.count as usize));
    }
    Ok(blocks)
}
