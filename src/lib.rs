//! Vitrine: classifieds publishing service with token-priced ad promotion.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
