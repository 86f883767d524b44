//! Block-sorting compression for OxiBSC.
//!
//! Each block goes through:
//! 1. Burrows-Wheeler Transform - rotation sort with a two-byte radix
//!    presort, smallest-bucket-first processing and stripe rank tags
//! 2. Move-to-Front - bytes become ranks in a self-organizing list
//! 3. Rank coding - bijective zero runs and magnitude classes
//! 4. Range coding - adaptive binary contexts from `oxibsc-core`
//!
//! ## Example
//!
//! ```rust
//! use oxibsc::{CodecConfig, compress, decompress};
//!
//! let data = b"banana bandana banana bandana".repeat(10);
//! let packed = compress(&data, &CodecConfig::default()).unwrap();
//! assert_eq!(decompress(&packed).unwrap(), data);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod block_sort;
pub mod bwt;
mod config;
mod decode;
mod encode;
pub mod frame;
pub mod mtf;
pub mod small_sort;
pub mod stripe;

pub use block_sort::BlockSorter;
pub use config::{CodecConfig, DEFAULT_BLOCK_SIZE, MAX_BLOCK_SIZE};
pub use decode::{BlockDecoder, DecodeStatus};
pub use encode::{BlockEncoder, END_OF_STREAM};
pub use frame::{FrameDecoder, FrameEncoder, FrameHeader, compress, decompress};
pub use mtf::{MtfList, MtfRecoder};
pub use stripe::Stripe;
