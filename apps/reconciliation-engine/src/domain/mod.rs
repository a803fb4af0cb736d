//! Domain layer - order lifecycle model and shared primitives.

pub mod order;
pub mod shared;
