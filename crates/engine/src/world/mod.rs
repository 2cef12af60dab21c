pub mod block;
pub mod chunk;
pub mod position;

use block::BlockId;
use chunk::Chunk;
use dashmap::DashMap;
use dashmap::mapref::one::RefMut;
use position::{BlockPos, ChunkPos};

/// Conceptual horizontal extent of a world in blocks. The chunk map is
/// sparse, so nothing is allocated up front and the bound is not enforced.
pub const WORLD_SIZE: i64 = 1000;

/// Serialized form of a chunk that does not exist.
pub const EMPTY_CHUNK_BLOB: &str = "{}";

/// The block world of one session. Thread-safe, lock-sharded by chunk.
///
/// Chunks are materialized lazily: the first write into a chunk column (or
/// an explicit [`World::get_or_create_chunk`]) creates it all-air with
/// `last_modified = 0`. Every operation holds the owning shard's lock for
/// its full duration, so writes to the same chunk are serialized.
pub struct World {
    world_id: String,
    chunks: DashMap<ChunkPos, Chunk>,
}

impl World {
    pub fn new(world_id: impl Into<String>) -> Self {
        let world_id = world_id.into();
        tracing::info!("Creating world {}", world_id);
        Self {
            world_id,
            chunks: DashMap::new(),
        }
    }

    pub fn world_id(&self) -> &str {
        &self.world_id
    }

    /// Return the chunk at `pos`, creating an empty one if absent.
    ///
    /// The returned guard holds the chunk's shard lock; drop it before
    /// touching any other chunk from the same thread.
    pub fn get_or_create_chunk(&self, pos: ChunkPos) -> RefMut<'_, ChunkPos, Chunk> {
        self.chunks.entry(pos).or_insert_with(|| Chunk::new(pos))
    }

    /// Read a block at an absolute position. Unmaterialized chunks,
    /// out-of-range heights, and positions beyond the chunk grid read as air.
    pub fn get_block(&self, pos: BlockPos) -> BlockId {
        let Some(chunk_pos) = pos.chunk() else {
            return BlockId::AIR;
        };
        match self.chunks.get(&chunk_pos) {
            Some(chunk) => chunk.get_block(pos.local()),
            None => BlockId::AIR,
        }
    }

    /// Write a block at an absolute position, creating the chunk if needed.
    ///
    /// Takes `&self` (not `&mut self`) because `DashMap` provides interior
    /// mutability via per-shard locking. Out-of-range heights still
    /// materialize the chunk but change nothing in it. Positions beyond the
    /// chunk grid are ignored.
    pub fn set_block(&self, pos: BlockPos, block: BlockId) -> bool {
        let Some(chunk_pos) = pos.chunk() else {
            return false;
        };
        self.get_or_create_chunk(chunk_pos).set_block(pos.local(), block)
    }

    pub fn has_chunk(&self, pos: ChunkPos) -> bool {
        self.chunks.contains_key(&pos)
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Ids of every chunk whose `last_modified` is strictly after `since`.
    /// Order is unspecified.
    pub fn get_modified_chunks(&self, since: i64) -> Vec<String> {
        self.chunks
            .iter()
            .filter(|entry| entry.last_modified() > since)
            .map(|entry| entry.key().to_string())
            .collect()
    }

    /// Serialized blob of the chunk with the given `"<x>:<z>"` id, or
    /// [`EMPTY_CHUNK_BLOB`] if there is no such chunk. Only the canonical
    /// spelling matches: `"03:3"` or `"+3:3"` is not chunk `3:3`.
    pub fn serialize_chunk(&self, chunk_id: &str) -> String {
        let pos = match chunk_id.parse::<ChunkPos>() {
            Ok(pos) if pos.to_string() == chunk_id => pos,
            _ => return EMPTY_CHUNK_BLOB.to_owned(),
        };
        match self.chunks.get(&pos) {
            Some(chunk) => chunk.serialize(),
            None => EMPTY_CHUNK_BLOB.to_owned(),
        }
    }
}
