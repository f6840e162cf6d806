//! Update-request-scoped payload handling: the firmware artifact and the
//! fixed-page chunk set derived from it.

pub mod chunks;
pub mod firmware;

pub use chunks::{Chunk, ChunkArray, ChunkError};
pub use firmware::{FirmwareError, PdFirmware};
