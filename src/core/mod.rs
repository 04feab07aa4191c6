//! Core processing modules
//!
//! Text normalization and the generative response path.

pub mod generative;
pub mod text_normalizer;
