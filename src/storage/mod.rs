//! Index storage system

pub mod artifacts;
pub mod index;
pub mod store;

pub use index::{FlatIndex, Hit};
pub use store::{load, persist, IndexStore};
