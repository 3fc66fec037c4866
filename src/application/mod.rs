//! Application services layer.

pub mod error;
pub mod listing;
pub mod publish;
pub mod repos;
pub mod sessions;
