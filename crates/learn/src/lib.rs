pub mod confidence;
pub mod error;
pub mod matching;
pub mod seed;
pub mod store;

pub use confidence::{clamp_confidence, Adjusted, ConfidencePolicy};
pub use error::LearnError;
pub use matching::{find_match, is_match, match_all};
pub use seed::parse_seed_toml;
pub use store::{Adjustment, CorrectionStore};
