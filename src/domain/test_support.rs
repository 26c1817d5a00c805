//! Fixtures and a scripted registrar shared by unit tests.

use crate::domain::data::{RegionalDirection, Service};
use crate::domain::model::{
    AddressFields, Contract, FreightResponse, Package, PackageFields, PartyAddress, PostingCard,
    ShippingLabel, TrackingCode, User, ZipCode,
};
use crate::domain::ports::{FreightQuery, Registrar};
use crate::domain::posting_list::{Closed, Open, PostingList};
use crate::utils::error::{RemoteFailure, Result, SigepError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn posting_card() -> PostingCard {
    let user = User::new("ACME Comércio", "34028316000103").unwrap();
    PostingCard {
        contract: Contract {
            user,
            number: "9912208555".into(),
            regional_direction: RegionalDirection::by_code("BSB").unwrap(),
        },
        number: "0057018901".into(),
        administrative_code: "08082650".into(),
    }
}

pub fn sender_fields() -> AddressFields {
    AddressFields {
        name: "ACME Comércio".into(),
        street: "SCS Quadra 2".into(),
        number: "10".into(),
        city: "Brasília".into(),
        state: "DF".into(),
        zip_code: "70302-000".into(),
        ..Default::default()
    }
}

pub fn receiver_fields() -> AddressFields {
    AddressFields {
        name: "João Pereira".into(),
        street: "Avenida Paulista".into(),
        number: "1578".into(),
        city: "São Paulo".into(),
        state: "SP".into(),
        zip_code: "01310-200".into(),
        email: "joao@example.com".into(),
        ..Default::default()
    }
}

pub fn package_fields(service: Service) -> PackageFields {
    PackageFields {
        service: Some(service.into()),
        width: 11.0,
        height: 2.0,
        length: 16.0,
        weight: 250,
        ..Default::default()
    }
}

pub fn label(card: &PostingCard, code: &str, service: Service) -> ShippingLabel {
    ShippingLabel {
        posting_card: card.clone(),
        sender: PartyAddress::new(sender_fields()).unwrap(),
        receiver: PartyAddress::new(receiver_fields()).unwrap(),
        service,
        tracking_code: TrackingCode::new(code).unwrap(),
        package: Package::new(package_fields(service)).unwrap(),
    }
}

/// In-memory registrar that mints sequential codes and counts every call.
#[derive(Default)]
pub struct ScriptedRegistrar {
    next_code: AtomicU32,
    next_number: AtomicU32,
    pub tracking_calls: AtomicUsize,
    pub close_calls: AtomicUsize,
    pub delivery_calls: AtomicUsize,
    pub freight_calls: AtomicUsize,
    pub availability_calls: AtomicUsize,
    pub fail_close: AtomicBool,
    /// Tracking requests succeed this many times, then fail.
    pub tracking_budget: Mutex<Option<usize>>,
    pub availability_answers: Mutex<VecDeque<bool>>,
    /// Codes the registrar leaves out of the list it returns.
    pub refused_codes: Mutex<Vec<String>>,
}

impl ScriptedRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_close() -> Self {
        let registrar = Self::default();
        registrar.fail_close.store(true, Ordering::SeqCst);
        registrar
    }

    pub fn tracking_calls(&self) -> usize {
        self.tracking_calls.load(Ordering::SeqCst)
    }

    pub fn delivery_days(service: Service) -> u32 {
        match service {
            Service::Sedex10 | Service::Sedex12 => 1,
            Service::Sedex | Service::ESedex | Service::SedexIndustrial => 2,
            Service::Pac | Service::PacIndustrial => 6,
        }
    }
}

#[async_trait]
impl Registrar for ScriptedRegistrar {
    async fn request_tracking_codes(
        &self,
        _user: &User,
        _service: Service,
        quantity: u32,
    ) -> Result<Vec<TrackingCode>> {
        self.tracking_calls.fetch_add(1, Ordering::SeqCst);
        {
            let mut budget = self.tracking_budget.lock().unwrap();
            if let Some(remaining) = budget.as_mut() {
                if *remaining == 0 {
                    return Err(SigepError::remote(
                        "request_tracking_codes",
                        None,
                        RemoteFailure::Rejected {
                            status: 503,
                            message: "code pool exhausted".into(),
                        },
                    ));
                }
                *remaining -= 1;
            }
        }
        (0..quantity)
            .map(|_| {
                let n = self.next_code.fetch_add(1, Ordering::SeqCst) + 1;
                TrackingCode::new(&format!("PO{:09}BR", n))
            })
            .collect()
    }

    async fn close_posting_list(
        &self,
        posting_list: PostingList<Open>,
        _posting_card: &PostingCard,
    ) -> Result<PostingList<Closed>> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_close.load(Ordering::SeqCst) {
            return Err(SigepError::remote(
                "close_posting_list",
                Some(posting_list.custom_id()),
                RemoteFailure::Rejected {
                    status: 500,
                    message: "registrar unavailable".into(),
                },
            ));
        }
        let number = self.next_number.fetch_add(1, Ordering::SeqCst) as u64 + 500_000;
        let refused = self.refused_codes.lock().unwrap().clone();
        if refused.is_empty() {
            return Ok(posting_list.close(number));
        }
        let mut kept = PostingList::new(posting_list.custom_id());
        for label in posting_list.shipping_labels() {
            if !refused.iter().any(|code| code == label.tracking_code.as_str()) {
                kept.add_shipping_label(label.clone())?;
            }
        }
        Ok(kept.close(number))
    }

    async fn calculate_delivery_time(
        &self,
        service: Service,
        _from: &ZipCode,
        _to: &ZipCode,
    ) -> Result<u32> {
        self.delivery_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::delivery_days(service))
    }

    async fn calculate_freights(&self, query: FreightQuery<'_>) -> Result<Vec<FreightResponse>> {
        self.freight_calls.fetch_add(1, Ordering::SeqCst);
        Ok(query
            .services
            .iter()
            .map(|&service| FreightResponse {
                service,
                delivery_time: chrono::Duration::days(Self::delivery_days(service) as i64),
                total: 10.0 + query.package.weight() as f64 / 100.0,
                declared_value_surcharge: query.declared_value * 0.01,
                home_delivery: true,
                saturday_delivery: false,
                error_code: None,
                error_message: None,
            })
            .collect())
    }

    async fn verify_service_availability(
        &self,
        _posting_card: &PostingCard,
        _service: Service,
        _from: &ZipCode,
        _to: &ZipCode,
    ) -> Result<bool> {
        self.availability_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .availability_answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(true))
    }

    async fn get_posting_card_status(&self, _posting_card: &PostingCard) -> Result<bool> {
        Ok(true)
    }
}
