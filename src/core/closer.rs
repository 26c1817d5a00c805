//! The batch close: validate, allocate, submit, reset.
//!
//! ```text
//! Idle/Closed/Failed ──close()──> Validating ──> Allocating ──> Submitting ──> Closed
//!                                     │              │              │
//!                                     └──────────────┴──────────────┴──> Failed { stage }
//! ```
//!
//! Validation finishes before the first remote call. The accumulator is only
//! reset once the registrar has accepted every label of the batch; any earlier
//! failure, or a reply that drops labels, leaves it untouched so the caller can
//! fix the input and retry.

use crate::core::accumulator::BatchAccumulator;
use crate::core::allocator::TrackingCodeAllocator;
use crate::core::labels;
use crate::domain::model::{PartyAddress, PostingCard, TrackingCode};
use crate::domain::ports::{BatchIdGenerator, Registrar};
use crate::domain::posting_list::{Closed, PostingList};
use crate::utils::error::{RemoteFailure, Result, SigepError};
use std::collections::HashSet;
use std::ops::RangeInclusive;

pub const DEFAULT_BATCH_ID_RANGE: RangeInclusive<u32> = 1000..=9_999_999;

const MAX_ID_DRAWS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseStage {
    Validating,
    Allocating,
    Submitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloserState {
    Idle,
    Validating,
    Allocating,
    Submitting,
    Closed,
    Failed { stage: CloseStage },
}

/// Draws ids uniformly from a range.
#[derive(Debug, Clone)]
pub struct RandomBatchId {
    range: RangeInclusive<u32>,
}

impl RandomBatchId {
    pub fn new(range: RangeInclusive<u32>) -> Self {
        Self { range }
    }
}

impl Default for RandomBatchId {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_ID_RANGE)
    }
}

impl BatchIdGenerator for RandomBatchId {
    fn next_id(&self) -> u32 {
        rand::random_range(self.range.clone())
    }
}

pub struct PostingListCloser {
    id_generator: Box<dyn BatchIdGenerator>,
    state: CloserState,
    /// Never pruned; it holds one id per successful close for the closer's lifetime.
    closed_ids: HashSet<u32>,
}

impl Default for PostingListCloser {
    fn default() -> Self {
        Self::new()
    }
}

impl PostingListCloser {
    pub fn new() -> Self {
        Self::with_id_generator(RandomBatchId::default())
    }

    pub fn with_id_generator(generator: impl BatchIdGenerator + 'static) -> Self {
        Self {
            id_generator: Box::new(generator),
            state: CloserState::Idle,
            closed_ids: HashSet::new(),
        }
    }

    pub fn state(&self) -> CloserState {
        self.state
    }

    /// Ids of every posting list this closer has closed. Grows by one per
    /// successful close and is never pruned.
    pub fn closed_ids(&self) -> &HashSet<u32> {
        &self.closed_ids
    }

    #[tracing::instrument(skip_all, fields(batch_id = tracing::field::Empty))]
    pub async fn close<R: Registrar + ?Sized>(
        &mut self,
        accumulator: &mut BatchAccumulator,
        registrar: &R,
        posting_card: &PostingCard,
        custom_id: Option<u32>,
    ) -> Result<PostingList<Closed>> {
        self.state = CloserState::Validating;
        let (sender, receiver) = match Self::check_preconditions(accumulator) {
            Ok(parties) => parties,
            Err(e) => return Err(self.fail(CloseStage::Validating, e)),
        };

        let batch_id = match custom_id {
            Some(id) => id,
            None => match self.synthesize_id() {
                Ok(id) => id,
                Err(e) => return Err(self.fail(CloseStage::Validating, e)),
            },
        };
        tracing::Span::current().record("batch_id", batch_id);

        self.state = CloserState::Allocating;
        let allocator = TrackingCodeAllocator::new(registrar, posting_card.user());
        let assembled = labels::assemble(
            posting_card,
            sender,
            receiver,
            accumulator.packages(),
            &allocator,
        )
        .await;
        let labels = match assembled {
            Ok(labels) => labels,
            Err(e) => return Err(self.fail(CloseStage::Allocating, e.for_batch(batch_id))),
        };

        let mut open = PostingList::new(batch_id);
        for label in labels {
            if let Err(e) = open.add_shipping_label(label) {
                let reused = SigepError::remote(
                    "request_tracking_codes",
                    Some(batch_id),
                    RemoteFailure::Decode(e.to_string()),
                );
                return Err(self.fail(CloseStage::Allocating, reused));
            }
        }
        let submitted: Vec<TrackingCode> = open.tracking_codes().cloned().collect();

        self.state = CloserState::Submitting;
        tracing::info!(labels = submitted.len(), "Submitting posting list to registrar");
        let closed = match registrar.close_posting_list(open, posting_card).await {
            Ok(closed) => closed,
            Err(e) => return Err(self.fail(CloseStage::Submitting, e.for_batch(batch_id))),
        };
        if let Err(e) = Self::check_accepted(&submitted, &closed) {
            return Err(self.fail(CloseStage::Submitting, e.for_batch(batch_id)));
        }

        self.closed_ids.insert(closed.custom_id());
        accumulator.reset();
        self.state = CloserState::Closed;
        tracing::info!(
            number = closed.number(),
            labels = closed.len(),
            "Posting list closed"
        );
        Ok(closed)
    }

    fn check_preconditions(
        accumulator: &BatchAccumulator,
    ) -> Result<(&PartyAddress, &PartyAddress)> {
        if accumulator.packages().is_empty() {
            return Err(SigepError::precondition(
                "packages",
                "No packages to send, register at least one package",
            ));
        }
        let sender = accumulator
            .sender()
            .ok_or_else(|| SigepError::precondition("sender", "No sender address registered"))?;
        let receiver = accumulator
            .receiver()
            .ok_or_else(|| SigepError::precondition("receiver", "No receiver address registered"))?;
        Ok((sender, receiver))
    }

    /// Every submitted label must come back, and nothing else.
    fn check_accepted(submitted: &[TrackingCode], closed: &PostingList<Closed>) -> Result<()> {
        let refused: Vec<String> = submitted
            .iter()
            .filter(|code| closed.label(code).is_none())
            .map(|code| code.to_string())
            .collect();
        if !refused.is_empty() {
            return Err(SigepError::remote(
                "close_posting_list",
                None,
                RemoteFailure::Refused { codes: refused },
            ));
        }
        if closed.len() != submitted.len() {
            return Err(SigepError::remote(
                "close_posting_list",
                None,
                RemoteFailure::Decode(format!(
                    "{} labels returned for {} submitted",
                    closed.len(),
                    submitted.len()
                )),
            ));
        }
        Ok(())
    }

    /// Synthesized ids never repeat one this closer already closed.
    fn synthesize_id(&self) -> Result<u32> {
        for _ in 0..MAX_ID_DRAWS {
            let id = self.id_generator.next_id();
            if !self.closed_ids.contains(&id) {
                return Ok(id);
            }
            tracing::debug!(batch_id = id, "Drawn batch id was already used, drawing again");
        }
        Err(SigepError::precondition(
            "batch_id",
            format!("Could not draw an unused batch id in {} attempts", MAX_ID_DRAWS),
        ))
    }

    fn fail(&mut self, stage: CloseStage, error: SigepError) -> SigepError {
        self.state = CloserState::Failed { stage };
        tracing::warn!(stage = ?stage, error = %error, "Posting list close failed");
        error
    }
}
