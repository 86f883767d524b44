//! # OxiBSC Core
//!
//! Core components for the OxiBSC block-sorting compressor.
//!
//! - [`error`]: Error types
//! - [`traits`]: The entropy coder seam used by the block codec
//! - [`range_coder`]: Adaptive binary range coder implementing that seam
//! - [`trace`]: Recording/replaying coder for deterministic tests
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L3: Frame + CLI                                         │
//! │     Container header, one-shot compress/decompress     │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Block codec                                         │
//! │     BWT block sorter, move-to-front rank recoder       │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: Entropy coding (this crate)                         │
//! │     Context models, range coder, byte I/O              │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use oxibsc_core::range_coder::{RangeDecoder, RangeEncoder};
//! use oxibsc_core::traits::{ContextSpec, EntropyDecoder, EntropyEncoder};
//! use std::io::Cursor;
//!
//! let spec = ContextSpec::new(16, 0, 32);
//!
//! let mut encoder = RangeEncoder::new(Vec::new());
//! let mut context = encoder.make_context(spec);
//! for symbol in [3, 3, 3, 15, 0] {
//!     encoder.encode(symbol, &mut context).unwrap();
//! }
//! encoder.finish().unwrap();
//! let bytes = encoder.into_inner();
//!
//! let mut decoder = RangeDecoder::new(Cursor::new(bytes)).unwrap();
//! let mut context = decoder.make_context(spec);
//! assert_eq!(decoder.decode(&mut context).unwrap(), 3);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod range_coder;
pub mod trace;
pub mod traits;

// Re-exports for convenience
pub use error::{BscError, Result};
pub use range_coder::{AdaptiveModel, RangeDecoder, RangeEncoder};
pub use trace::{SymbolRecorder, SymbolReplayer, TraceContext, TracedSymbol};
pub use traits::{ContextSpec, EntropyDecoder, EntropyEncoder};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{BscError, Result};
    pub use crate::range_coder::{RangeDecoder, RangeEncoder};
    pub use crate::traits::{ContextSpec, EntropyDecoder, EntropyEncoder};
}
