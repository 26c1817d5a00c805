//! Per-label queries replayed against the registrar for a closed posting list.
//!
//! Every query is exposed as a [`LabelSequence`]: a finite cursor over the
//! closed list's labels that performs one remote call per step. Nothing is
//! cached; traversing again (after [`LabelSequence::rewind`] or from a fresh
//! sequence) issues the calls again and may observe different answers.

use crate::domain::data::Service;
use crate::domain::model::{FreightResponse, PostingCard, ShippingLabel, ZipCode};
use crate::domain::ports::{FreightQuery, Registrar};
use crate::domain::posting_list::{Closed, PostingList};
use crate::utils::error::{RemoteFailure, Result, SigepError};
use async_trait::async_trait;

/// One remote question asked about one label.
#[async_trait]
pub trait LabelQuery: Send + Sync {
    type Output: Send;

    async fn query(&self, label: &ShippingLabel) -> Result<Self::Output>;
}

/// Lazy, finite, restartable sequence of per-label answers, in label order.
pub struct LabelSequence<'a, Q> {
    labels: &'a [ShippingLabel],
    position: usize,
    query: Q,
}

impl<'a, Q: LabelQuery> LabelSequence<'a, Q> {
    fn new(labels: &'a [ShippingLabel], query: Q) -> Self {
        Self {
            labels,
            position: 0,
            query,
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.labels.len() - self.position
    }

    /// Queries the next label. `None` once every label has been visited.
    pub async fn try_next(&mut self) -> Option<Result<Q::Output>> {
        let label = self.labels.get(self.position)?;
        self.position += 1;
        Some(self.query.query(label).await)
    }

    /// Starts over from the first label. Answers are fetched again.
    pub fn rewind(&mut self) {
        self.position = 0;
    }

    /// Drains the remaining labels, stopping at the first failure.
    pub async fn collect(&mut self) -> Result<Vec<Q::Output>> {
        let mut out = Vec::with_capacity(self.remaining());
        while let Some(item) = self.try_next().await {
            out.push(item?);
        }
        Ok(out)
    }
}

pub struct DeliveryTimeLookup<'a, R: ?Sized> {
    registrar: &'a R,
}

#[async_trait]
impl<'a, R: Registrar + ?Sized> LabelQuery for DeliveryTimeLookup<'a, R> {
    type Output = u32;

    async fn query(&self, label: &ShippingLabel) -> Result<u32> {
        self.registrar
            .calculate_delivery_time(
                label.service,
                label.sender.zip_code(),
                label.receiver.zip_code(),
            )
            .await
    }
}

pub struct FreightLookup<'a, R: ?Sized> {
    registrar: &'a R,
}

#[async_trait]
impl<'a, R: Registrar + ?Sized> LabelQuery for FreightLookup<'a, R> {
    type Output = FreightResponse;

    async fn query(&self, label: &ShippingLabel) -> Result<FreightResponse> {
        let services = [label.service];
        let freights = self
            .registrar
            .calculate_freights(FreightQuery {
                posting_card: &label.posting_card,
                services: &services,
                from: label.sender.zip_code(),
                to: label.receiver.zip_code(),
                package: &label.package,
                declared_value: label.declared_value(),
                extra_services: label.extra_services(),
            })
            .await?;

        freights.into_iter().next().ok_or_else(|| {
            SigepError::remote(
                "calculate_freights",
                None,
                RemoteFailure::Decode(format!(
                    "no freight returned for tracking code {}",
                    label.tracking_code
                )),
            )
        })
    }
}

pub struct AvailabilityLookup<'a, R: ?Sized> {
    registrar: &'a R,
}

#[async_trait]
impl<'a, R: Registrar + ?Sized> LabelQuery for AvailabilityLookup<'a, R> {
    type Output = bool;

    async fn query(&self, label: &ShippingLabel) -> Result<bool> {
        self.registrar
            .verify_service_availability(
                &label.posting_card,
                label.service,
                label.sender.zip_code(),
                label.receiver.zip_code(),
            )
            .await
    }
}

/// Read-only metrics over the session's closed posting list.
pub struct MetricsGateway<'a, R: ?Sized> {
    registrar: &'a R,
    posting_list: Option<&'a PostingList<Closed>>,
}

impl<'a, R: Registrar + ?Sized> MetricsGateway<'a, R> {
    pub fn new(registrar: &'a R, posting_list: Option<&'a PostingList<Closed>>) -> Self {
        Self {
            registrar,
            posting_list,
        }
    }

    fn labels(&self) -> Result<&'a [ShippingLabel]> {
        self.posting_list
            .map(|list| list.shipping_labels())
            .ok_or(SigepError::NotClosed)
    }

    /// Estimated delivery days, one per label.
    pub fn delivery_times(&self) -> Result<LabelSequence<'a, DeliveryTimeLookup<'a, R>>> {
        Ok(LabelSequence::new(
            self.labels()?,
            DeliveryTimeLookup {
                registrar: self.registrar,
            },
        ))
    }

    /// First freight quote for each label.
    pub fn freights(&self) -> Result<LabelSequence<'a, FreightLookup<'a, R>>> {
        Ok(LabelSequence::new(
            self.labels()?,
            FreightLookup {
                registrar: self.registrar,
            },
        ))
    }

    /// Availability of each label's service on its route.
    pub fn service_availability(&self) -> Result<LabelSequence<'a, AvailabilityLookup<'a, R>>> {
        Ok(LabelSequence::new(
            self.labels()?,
            AvailabilityLookup {
                registrar: self.registrar,
            },
        ))
    }

    /// Single explicit availability query; does not need a closed list.
    pub async fn check_service_availability(
        &self,
        posting_card: &PostingCard,
        service: Service,
        from: &ZipCode,
        to: &ZipCode,
    ) -> Result<bool> {
        self.registrar
            .verify_service_availability(posting_card, service, from, to)
            .await
    }
}
