use std::fmt;
use std::str::FromStr;

use super::chunk::{CHUNK_HEIGHT, CHUNK_SIZE};

/// Absolute block position in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockPos {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl BlockPos {
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// The chunk this block belongs to, or `None` when the chunk index
    /// does not fit a chunk coordinate.
    ///
    /// Floor division, so `x = -1` lands in chunk `-1` rather than `0` and
    /// chunks tile contiguously across the origin.
    pub fn chunk(&self) -> Option<ChunkPos> {
        let x = i32::try_from(self.x.div_euclid(CHUNK_SIZE as i64)).ok()?;
        let z = i32::try_from(self.z.div_euclid(CHUNK_SIZE as i64)).ok()?;
        Some(ChunkPos { x, z })
    }

    /// Position within the chunk: x and z in `0..CHUNK_SIZE`, y passed through.
    pub const fn local(&self) -> LocalBlockPos {
        LocalBlockPos {
            x: self.x.rem_euclid(CHUNK_SIZE as i64),
            y: self.y,
            z: self.z.rem_euclid(CHUNK_SIZE as i64),
        }
    }
}

/// Chunk column position (each chunk is `CHUNK_SIZE` blocks wide on x and z).
///
/// The string form `"<x>:<z>"` is the chunk id used on the wire and as the
/// key clients ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }
}

impl fmt::Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.x, self.z)
    }
}

/// Error returned when a chunk id string is not of the form `"<x>:<z>"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidChunkId(pub String);

impl fmt::Display for InvalidChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid chunk id {:?}", self.0)
    }
}

impl std::error::Error for InvalidChunkId {}

impl FromStr for ChunkPos {
    type Err = InvalidChunkId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidChunkId(s.to_owned());
        let (x, z) = s.split_once(':').ok_or_else(invalid)?;
        Ok(Self {
            x: x.parse().map_err(|_| invalid())?,
            z: z.parse().map_err(|_| invalid())?,
        })
    }
}

/// Block position relative to a chunk's origin.
///
/// Not necessarily in range: chunk accessors bounds-check and treat anything
/// outside `0..CHUNK_SIZE` (x, z) or `0..CHUNK_HEIGHT` (y) as a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalBlockPos {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl LocalBlockPos {
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// Flat index into the block array (`y * 16 * 16 + z * 16 + x`), or
    /// `None` when any axis is out of range.
    #[inline]
    pub const fn index(&self) -> Option<usize> {
        let size = CHUNK_SIZE as i64;
        if self.x < 0
            || self.x >= size
            || self.z < 0
            || self.z >= size
            || self.y < 0
            || self.y >= CHUNK_HEIGHT as i64
        {
            return None;
        }
        let (x, y, z) = (self.x as usize, self.y as usize, self.z as usize);
        Some(y * CHUNK_SIZE * CHUNK_SIZE + z * CHUNK_SIZE + x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_coordinates_floor_into_previous_chunk() {
        let pos = BlockPos::new(-1, 10, -17);
        assert_eq!(pos.chunk(), Some(ChunkPos::new(-1, -2)));
        assert_eq!(pos.local(), LocalBlockPos::new(15, 10, 15));

        let pos = BlockPos::new(-16, 0, 16);
        assert_eq!(pos.chunk(), Some(ChunkPos::new(-1, 1)));
        assert_eq!(pos.local(), LocalBlockPos::new(0, 0, 0));
    }

    #[test]
    fn chunk_index_beyond_i32_has_no_chunk() {
        assert_eq!(BlockPos::new(16 << 32, 0, 0).chunk(), None);
        assert_eq!(BlockPos::new(0, 0, i64::MIN).chunk(), None);
        let edge = BlockPos::new(i32::MAX as i64 * 16 + 15, 0, i32::MIN as i64 * 16);
        assert_eq!(edge.chunk(), Some(ChunkPos::new(i32::MAX, i32::MIN)));
    }

    #[test]
    fn chunk_id_string_form() {
        let pos = ChunkPos::new(-3, 12);
        assert_eq!(pos.to_string(), "-3:12");
        assert_eq!("-3:12".parse::<ChunkPos>(), Ok(pos));
        assert!("3-12".parse::<ChunkPos>().is_err());
        assert!("a:1".parse::<ChunkPos>().is_err());
        assert!("".parse::<ChunkPos>().is_err());
    }

    #[test]
    fn local_index_order_is_y_then_z_then_x() {
        assert_eq!(LocalBlockPos::new(0, 0, 0).index(), Some(0));
        assert_eq!(LocalBlockPos::new(1, 0, 0).index(), Some(1));
        assert_eq!(LocalBlockPos::new(0, 0, 1).index(), Some(16));
        assert_eq!(LocalBlockPos::new(0, 1, 0).index(), Some(256));
        assert_eq!(LocalBlockPos::new(15, 255, 15).index(), Some(65_535));
        assert_eq!(LocalBlockPos::new(16, 0, 0).index(), None);
        assert_eq!(LocalBlockPos::new(0, 256, 0).index(), None);
        assert_eq!(LocalBlockPos::new(0, -1, 0).index(), None);
        assert_eq!(LocalBlockPos::new(0, 0, -1).index(), None);
    }
}
