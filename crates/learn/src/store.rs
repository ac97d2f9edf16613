//! [`CorrectionStore`], the caller-facing surface of the engine.
//!
//! The store owns no rule state of its own. Everything lives in the injected
//! [`CorrectionBackend`], so independent stores never share rules. Each
//! read-modify-write is a compare-and-swap on the rule's revision, retried
//! until it lands. A lost swap means another writer's swap succeeded, so a
//! finite set of writers always drains.

use chrono::Utc;
use serde::Serialize;
use tagwise_core::{
    Correction, CorrectionBackend, CorrectionFilter, CorrectionId, CorrectionPage,
    CorrectionPatch, NewCorrection, PatternKey, ValidationError,
};

use crate::confidence::{clamp_confidence, Adjusted, ConfidencePolicy};
use crate::error::LearnError;
use crate::matching;

/// What `adjust_confidence` did to the rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Adjustment {
    Updated(Correction),
    Pruned { id: CorrectionId },
}

#[derive(Clone)]
pub struct CorrectionStore<B> {
    backend: B,
    policy: ConfidencePolicy,
}

impl<B: CorrectionBackend> CorrectionStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            policy: ConfidencePolicy::default(),
        }
    }

    pub fn with_policy(backend: B, policy: ConfidencePolicy) -> Result<Self, ValidationError> {
        policy.validate()?;
        Ok(Self { backend, policy })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn policy(&self) -> &ConfidencePolicy {
        &self.policy
    }

    /// Teach the engine a pattern. A new `(pattern, match_type)` creates a
    /// rule at the initial confidence; a known one has its tags and
    /// associations replaced and is reinforced.
    pub async fn create_or_update(
        &self,
        input: NewCorrection,
    ) -> Result<Correction, LearnError<B::Error>> {
        let key = PatternKey::new(&input.pattern, input.match_type)?;

        let mut attempt: u64 = 0;
        loop {
            attempt += 1;
            let now = Utc::now();
            match self.backend.find(&key).await.map_err(LearnError::Backend)? {
                None => {
                    let created = Correction::new(
                        key.clone(),
                        input.tags.clone(),
                        self.policy.initial,
                        input.entity_id.clone(),
                        input.entity_name.clone(),
                        now,
                    );
                    if self.backend.insert(&created).await.map_err(LearnError::Backend)? {
                        tracing::info!("Learned correction {} for {}", created.id, key);
                        return Ok(created);
                    }
                }
                Some(existing) => {
                    let expected = existing.revision;
                    let mut next = self.policy.reinforce(Correction {
                        tags: input.tags.clone(),
                        entity_id: input.entity_id.clone(),
                        entity_name: input.entity_name.clone(),
                        ..existing
                    });
                    next.touch(now);
                    if self
                        .backend
                        .replace(&next, expected)
                        .await
                        .map_err(LearnError::Backend)?
                    {
                        tracing::info!(
                            "Reinforced correction {} for {}: confidence {}, applied {} times",
                            next.id,
                            key,
                            next.confidence,
                            next.times_applied
                        );
                        return Ok(next);
                    }
                }
            }
            tracing::debug!("Write conflict on {key} (attempt {attempt}), retrying");
        }
    }

    /// The rule that applies to `description`, or `None`. Never writes.
    pub async fn find_match(
        &self,
        description: &str,
        min_confidence: f64,
    ) -> Result<Option<Correction>, LearnError<B::Error>> {
        check_finite(min_confidence)?;
        let candidates = self
            .backend
            .scan(min_confidence)
            .await
            .map_err(LearnError::Backend)?;
        let hit = matching::find_match(&candidates, description, min_confidence).cloned();
        match &hit {
            Some(c) => tracing::debug!("{description:?} matched correction {}", c.id),
            None => tracing::debug!("{description:?} matched no correction"),
        }
        Ok(hit)
    }

    /// Batch form of [`find_match`](Self::find_match) over a single scan.
    /// Returns the index of each matched description with its rule.
    pub async fn match_batch<S: AsRef<str>>(
        &self,
        descriptions: &[S],
        min_confidence: f64,
    ) -> Result<Vec<(usize, Correction)>, LearnError<B::Error>> {
        check_finite(min_confidence)?;
        let candidates = self
            .backend
            .scan(min_confidence)
            .await
            .map_err(LearnError::Backend)?;
        Ok(matching::match_all(&candidates, descriptions, min_confidence)
            .into_iter()
            .map(|(idx, c)| (idx, c.clone()))
            .collect())
    }

    pub async fn get(&self, id: CorrectionId) -> Result<Correction, LearnError<B::Error>> {
        self.backend
            .get(id)
            .await
            .map_err(LearnError::Backend)?
            .ok_or(LearnError::NotFound(id))
    }

    pub async fn list(
        &self,
        filter: CorrectionFilter,
    ) -> Result<CorrectionPage, LearnError<B::Error>> {
        let min_confidence = filter.min_confidence();
        check_finite(min_confidence)?;
        let rows = self
            .backend
            .scan(min_confidence)
            .await
            .map_err(LearnError::Backend)?;
        let total = rows.len();
        let items = rows
            .into_iter()
            .skip(filter.offset.unwrap_or(0))
            .take(filter.limit.unwrap_or(usize::MAX))
            .collect();
        Ok(CorrectionPage { items, total })
    }

    /// Direct field edit. Confidence is clamped but never prunes, and
    /// `times_applied` is not touched.
    pub async fn update(
        &self,
        id: CorrectionId,
        patch: CorrectionPatch,
    ) -> Result<Correction, LearnError<B::Error>> {
        if let Some(confidence) = patch.confidence {
            if !confidence.is_finite() {
                return Err(ValidationError::NonFiniteConfidence(confidence).into());
            }
        }

        let mut attempt: u64 = 0;
        loop {
            attempt += 1;
            let existing = self.get(id).await?;
            if patch.is_empty() {
                return Ok(existing);
            }

            let expected = existing.revision;
            let mut next = existing;
            if let Some(tags) = &patch.tags {
                next.tags = tags.clone();
            }
            if let Some(confidence) = patch.confidence {
                next.confidence = clamp_confidence(confidence);
            }
            if let Some(entity_id) = &patch.entity_id {
                next.entity_id = entity_id.clone();
            }
            if let Some(entity_name) = &patch.entity_name {
                next.entity_name = entity_name.clone();
            }
            next.touch(Utc::now());

            if self
                .backend
                .replace(&next, expected)
                .await
                .map_err(LearnError::Backend)?
            {
                tracing::info!("Updated correction {id}");
                return Ok(next);
            }
            tracing::debug!("Write conflict on {id} (attempt {attempt}), retrying");
        }
    }

    /// Reinforcement feedback. Positive `delta` when a suggestion was
    /// accepted, negative when it was overridden. A rule left below the
    /// policy's threshold is deleted in the same step.
    pub async fn adjust_confidence(
        &self,
        id: CorrectionId,
        delta: f64,
    ) -> Result<Adjustment, LearnError<B::Error>> {
        if !delta.is_finite() {
            return Err(ValidationError::NonFiniteDelta(delta).into());
        }

        let mut attempt: u64 = 0;
        loop {
            attempt += 1;
            let existing = self.get(id).await?;
            let expected = existing.revision;

            match self.policy.adjust(existing, delta) {
                Adjusted::Kept(mut next) => {
                    next.touch(Utc::now());
                    if self
                        .backend
                        .replace(&next, expected)
                        .await
                        .map_err(LearnError::Backend)?
                    {
                        tracing::info!(
                            "Adjusted correction {id} by {delta}: confidence now {}",
                            next.confidence
                        );
                        return Ok(Adjustment::Updated(next));
                    }
                }
                Adjusted::Pruned => {
                    if self
                        .backend
                        .remove(id, Some(expected))
                        .await
                        .map_err(LearnError::Backend)?
                    {
                        tracing::info!(
                            "Pruned correction {id}: confidence fell below {}",
                            self.policy.prune_below
                        );
                        return Ok(Adjustment::Pruned { id });
                    }
                }
            }
            tracing::debug!("Write conflict on {id} (attempt {attempt}), retrying");
        }
    }

    /// Removes the rule. Deleting a missing rule is `NotFound`.
    pub async fn delete(&self, id: CorrectionId) -> Result<(), LearnError<B::Error>> {
        if self
            .backend
            .remove(id, None)
            .await
            .map_err(LearnError::Backend)?
        {
            tracing::info!("Deleted correction {id}");
            Ok(())
        } else {
            Err(LearnError::NotFound(id))
        }
    }

    /// Teach a batch of corrections in order. Every pattern is validated
    /// before the first write, so a bad entry leaves the store untouched.
    pub async fn seed(
        &self,
        seeds: Vec<NewCorrection>,
    ) -> Result<Vec<Correction>, LearnError<B::Error>> {
        for seed in &seeds {
            PatternKey::new(&seed.pattern, seed.match_type)?;
        }

        let mut learned = Vec::with_capacity(seeds.len());
        for seed in seeds {
            learned.push(self.create_or_update(seed).await?);
        }
        tracing::info!("Seeded {} corrections", learned.len());
        Ok(learned)
    }
}

fn check_finite(min_confidence: f64) -> Result<(), ValidationError> {
    if min_confidence.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NonFiniteConfidence(min_confidence))
    }
}
