//! Posting list lifecycle, encoded as a typestate.
//!
//! ```text
//! PostingList<Open> ──add_shipping_label()──> PostingList<Open>
//!        │
//!        └──close(number)──> PostingList<Closed>   (read-only from here on)
//! ```
//!
//! A `PostingList<Closed>` only comes out of [`PostingList::close`], which the
//! registrar calls once it has accepted the batch. There is no way back to `Open`.

use crate::domain::model::{ShippingLabel, TrackingCode};
use crate::utils::error::{Result, SigepError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// Being built locally, not yet submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Open;

/// Accepted by the registrar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Closed {
    /// Posting-list number assigned by the carrier.
    pub number: u64,
    pub closed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostingList<S> {
    custom_id: u32,
    labels: Vec<ShippingLabel>,
    #[serde(skip)]
    index: HashMap<TrackingCode, usize>,
    #[serde(skip)]
    state: S,
}

impl<S> PostingList<S> {
    pub fn custom_id(&self) -> u32 {
        self.custom_id
    }

    /// Labels in insertion order.
    pub fn shipping_labels(&self) -> &[ShippingLabel] {
        &self.labels
    }

    pub fn label(&self, code: &TrackingCode) -> Option<&ShippingLabel> {
        self.index.get(code).map(|&i| &self.labels[i])
    }

    pub fn tracking_codes(&self) -> impl Iterator<Item = &TrackingCode> {
        self.labels.iter().map(|label| &label.tracking_code)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl PostingList<Open> {
    pub fn new(custom_id: u32) -> Self {
        PostingList {
            custom_id,
            labels: Vec::new(),
            index: HashMap::new(),
            state: Open,
        }
    }

    pub fn add_shipping_label(&mut self, label: ShippingLabel) -> Result<()> {
        if self.index.contains_key(&label.tracking_code) {
            return Err(SigepError::validation(
                "tracking_code",
                format!(
                    "Tracking code {} is already on posting list {}",
                    label.tracking_code, self.custom_id
                ),
            ));
        }
        self.index
            .insert(label.tracking_code.clone(), self.labels.len());
        self.labels.push(label);
        Ok(())
    }

    pub fn close(self, number: u64) -> PostingList<Closed> {
        PostingList {
            custom_id: self.custom_id,
            labels: self.labels,
            index: self.index,
            state: Closed {
                number,
                closed_at: Utc::now(),
            },
        }
    }
}

impl PostingList<Closed> {
    pub fn number(&self) -> u64 {
        self.state.number
    }

    pub fn closed_at(&self) -> DateTime<Utc> {
        self.state.closed_at
    }
}
