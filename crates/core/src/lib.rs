//! Domain types for the tagwise correction learning engine.
//!
//! This crate has no database or runtime dependencies. Backends implement
//! [`CorrectionBackend`]; the orchestration lives in `tagwise-learn`.

pub mod backend;
pub mod correction;
pub mod error;
pub mod pattern;

pub use backend::CorrectionBackend;
pub use correction::{
    Correction, CorrectionFilter, CorrectionId, CorrectionPage, CorrectionPatch, MatchType,
    NewCorrection, PatternKey,
};
pub use error::ValidationError;
pub use pattern::normalize;
