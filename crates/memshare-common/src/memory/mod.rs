//! Memory management primitives.
//!
//! - [`Arena`] - Generational arena with stable keys, used as the backing
//!   store for interval metadata

mod arena;

pub use arena::{Arena, ArenaKey};
