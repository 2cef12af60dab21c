//! Voxel world store: block ids, chunk/world coordinates, dense chunks with
//! run-length encoded serialization, and a lock-sharded sparse world map.

pub mod clock;
pub mod world;

pub use world::block::BlockId;
pub use world::chunk::{CHUNK_HEIGHT, CHUNK_SIZE, CHUNK_VOLUME, Chunk};
pub use world::position::{BlockPos, ChunkPos, LocalBlockPos};
pub use world::{WORLD_SIZE, World};
