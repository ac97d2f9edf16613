use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::pattern::normalize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrectionId(pub Uuid);

impl CorrectionId {
    pub fn new() -> Self {
        CorrectionId(Uuid::new_v4())
    }
}

impl Default for CorrectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CorrectionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(CorrectionId)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Exact,
    Contains,
}

impl MatchType {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchType::Exact => "exact",
            MatchType::Contains => "contains",
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MatchType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exact" => Ok(MatchType::Exact),
            "contains" => Ok(MatchType::Contains),
            other => Err(ValidationError::UnknownMatchType(other.to_string())),
        }
    }
}

/// Accepts the same spellings as [`FromStr`](std::str::FromStr).
impl<'de> Deserialize<'de> for MatchType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The dedup key of a correction: a normalized pattern paired with its
/// match type. Creation and lookup both go through this type, so the
/// pattern is always normalized the same way on both paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatternKey {
    pattern: String,
    match_type: MatchType,
}

impl PatternKey {
    /// Normalizes `raw` and rejects patterns that normalize to nothing.
    pub fn new(raw: &str, match_type: MatchType) -> Result<Self, ValidationError> {
        let pattern = normalize(raw);
        if pattern.is_empty() {
            return Err(ValidationError::EmptyPattern(raw.to_string()));
        }
        Ok(PatternKey { pattern, match_type })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn match_type(&self) -> MatchType {
        self.match_type
    }
}

impl fmt::Display for PatternKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.match_type, self.pattern)
    }
}

/// A learned rule mapping a description pattern to a list of tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub id: CorrectionId,
    pub pattern: String,
    pub match_type: MatchType,
    /// Caller-supplied order, stored verbatim.
    pub tags: Vec<String>,
    /// Always within `[0.0, 1.0]`.
    pub confidence: f64,
    pub times_applied: u32,
    pub entity_id: Option<String>,
    pub entity_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Bumped on every persisted mutation; backends compare it before writing.
    pub revision: u64,
}

impl Correction {
    /// Builds a fresh, unpersisted correction for `key`.
    pub fn new(
        key: PatternKey,
        tags: Vec<String>,
        confidence: f64,
        entity_id: Option<String>,
        entity_name: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Correction {
            id: CorrectionId::new(),
            pattern: key.pattern,
            match_type: key.match_type,
            tags,
            confidence,
            times_applied: 0,
            entity_id,
            entity_name,
            created_at: now,
            updated_at: now,
            revision: 0,
        }
    }

    pub fn key(&self) -> PatternKey {
        PatternKey {
            pattern: self.pattern.clone(),
            match_type: self.match_type,
        }
    }

    /// Marks the record as mutated at `now` and advances its revision.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
        self.revision += 1;
    }
}

/// Input to `create_or_update`. The pattern is raw; it is normalized on use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCorrection {
    pub pattern: String,
    pub match_type: MatchType,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub entity_name: Option<String>,
}

impl NewCorrection {
    pub fn new(pattern: impl Into<String>, match_type: MatchType, tags: Vec<String>) -> Self {
        NewCorrection {
            pattern: pattern.into(),
            match_type,
            tags,
            entity_id: None,
            entity_name: None,
        }
    }

    pub fn with_entity(mut self, entity_id: Option<String>, entity_name: Option<String>) -> Self {
        self.entity_id = entity_id;
        self.entity_name = entity_name;
        self
    }
}

/// Direct field edits. `None` leaves a field alone; for the association
/// fields `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrectionPatch {
    pub tags: Option<Vec<String>>,
    pub confidence: Option<f64>,
    pub entity_id: Option<Option<String>>,
    pub entity_name: Option<Option<String>>,
}

impl CorrectionPatch {
    pub fn is_empty(&self) -> bool {
        self.tags.is_none()
            && self.confidence.is_none()
            && self.entity_id.is_none()
            && self.entity_name.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CorrectionFilter {
    pub min_confidence: Option<f64>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl CorrectionFilter {
    pub fn min_confidence(&self) -> f64 {
        self.min_confidence.unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CorrectionPage {
    pub items: Vec<Correction>,
    /// Number of rules passing the confidence filter, before limit/offset.
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_type_parses_case_insensitively() {
        assert_eq!("Exact".parse::<MatchType>().unwrap(), MatchType::Exact);
        assert_eq!(" contains ".parse::<MatchType>().unwrap(), MatchType::Contains);
    }

    #[test]
    fn match_type_rejects_unknown() {
        assert_eq!(
            "regex".parse::<MatchType>(),
            Err(ValidationError::UnknownMatchType("regex".to_string()))
        );
    }

    #[test]
    fn match_type_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&MatchType::Contains).unwrap(), "\"contains\"");
        let parsed: MatchType = serde_json::from_str("\"exact\"").unwrap();
        assert_eq!(parsed, MatchType::Exact);
    }

    #[test]
    fn match_type_deserializes_like_from_str() {
        let parsed: MatchType = serde_json::from_str("\"Exact\"").unwrap();
        assert_eq!(parsed, MatchType::Exact);
        let parsed: MatchType = serde_json::from_str("\"CONTAINS\"").unwrap();
        assert_eq!(parsed, MatchType::Contains);
        assert!(serde_json::from_str::<MatchType>("\"regex\"").is_err());
    }

    #[test]
    fn pattern_key_normalizes() {
        let key = PatternKey::new("woolworths 1234", MatchType::Contains).unwrap();
        assert_eq!(key.pattern(), "WOOLWORTHS");
        assert_eq!(key.match_type(), MatchType::Contains);
        assert_eq!(key.to_string(), "contains:WOOLWORTHS");
    }

    #[test]
    fn pattern_key_rejects_empty_after_normalization() {
        assert!(matches!(
            PatternKey::new(" 0412 ", MatchType::Exact),
            Err(ValidationError::EmptyPattern(_))
        ));
    }

    #[test]
    fn new_correction_starts_unapplied() {
        let now = Utc::now();
        let key = PatternKey::new("netflix", MatchType::Exact).unwrap();
        let c = Correction::new(key.clone(), vec!["Subscriptions".into()], 0.5, None, None, now);
        assert_eq!(c.times_applied, 0);
        assert_eq!(c.revision, 0);
        assert_eq!(c.created_at, c.updated_at);
        assert_eq!(c.key(), key);
    }

    #[test]
    fn touch_advances_revision() {
        let now = Utc::now();
        let key = PatternKey::new("netflix", MatchType::Exact).unwrap();
        let mut c = Correction::new(key, vec![], 0.5, None, None, now);
        let later = now + chrono::Duration::seconds(5);
        c.touch(later);
        assert_eq!(c.revision, 1);
        assert_eq!(c.updated_at, later);
        assert_eq!(c.created_at, now);
    }

    #[test]
    fn correction_id_round_trips_through_display() {
        let id = CorrectionId::new();
        assert_eq!(id.to_string().parse::<CorrectionId>().unwrap(), id);
        assert!("not-a-uuid".parse::<CorrectionId>().is_err());
    }

    #[test]
    fn filter_defaults_to_unfiltered() {
        assert_eq!(CorrectionFilter::default().min_confidence(), 0.0);
    }
}
