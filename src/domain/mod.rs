//! Domain layer types and invariants.

pub mod ads;
pub mod badges;
pub mod entities;
pub mod error;
pub mod pricing;
pub mod promotion;
pub mod types;
