//! Decoded-content caching under a soft memory ceiling.
//!
//! Viewing a record means holding its decoded content (image pixels, player
//! buffers) in memory, which dwarfs the bookkeeping the rest of the system
//! does. This crate keeps a small "hot set" of decoded records, sized
//! dynamically against the machine's available memory rather than a fixed
//! entry count, and warms the records adjacent to the one just requested so
//! stepping through a directory feels instant.
//!
//! Memory introspection is platform-specific, so the budget lives behind the
//! [`MemoryBudget`] trait: [`SysinfoBudget`] asks the OS, [`FixedBudget`]
//! substitutes a configured byte ceiling. Decoding likewise sits behind
//! [`ContentDecoder`] so tests (and headless use) never touch real codecs.

pub mod error;

mod budget;
mod content;
mod decoder;

pub use self::budget::{FixedBudget, MemoryBudget, SysinfoBudget};
pub use self::content::ContentCache;
pub use self::decoder::{ContentDecoder, DecodedContent, DecoderHandle, ImageDecoder, StubDecoder};
