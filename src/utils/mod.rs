//! Utility helpers

pub mod jsonc;
