//! Creator reference material that can be injected into prompts.

pub mod index;

pub use index::ChunkIndex;
