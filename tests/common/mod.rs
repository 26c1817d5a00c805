#![allow(dead_code)]

use async_trait::async_trait;
use sigep_batch::{
    AddressFields, Contract, FreightQuery, FreightResponse, PackageFields, PostingCard,
    PostingList, RegionalDirection, Registrar, RemoteFailure, Result, Service, SigepError,
    TrackingCode, User, ZipCode,
};
use sigep_batch::{Closed, Open};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn posting_card() -> PostingCard {
    PostingCard {
        contract: Contract {
            user: User::new("ACME Comércio", "34.028.316/0001-03").unwrap(),
            number: "9992157880".into(),
            regional_direction: RegionalDirection::by_code("SPM").unwrap(),
        },
        number: "0067599079".into(),
        administrative_code: "17000190".into(),
    }
}

pub fn sender() -> AddressFields {
    AddressFields {
        name: "ACME Comércio".into(),
        street: "Rua Vergueiro".into(),
        number: "1000".into(),
        city: "São Paulo".into(),
        state: "SP".into(),
        zip_code: "01504-000".into(),
        ..Default::default()
    }
}

pub fn receiver() -> AddressFields {
    AddressFields {
        name: "Ana Costa".into(),
        street: "Rua da Bahia".into(),
        number: "45".into(),
        complement: "apto 302".into(),
        city: "Belo Horizonte".into(),
        state: "MG".into(),
        zip_code: "30160-011".into(),
        cellphone: "31 98888-7777".into(),
        ..Default::default()
    }
}

pub fn package(service: Service) -> PackageFields {
    PackageFields {
        service: Some(service.into()),
        width: 11.0,
        height: 4.0,
        length: 16.0,
        weight: 800,
        ..Default::default()
    }
}

/// Registrar double: sequential codes, call counters, scripted availability.
#[derive(Default)]
pub struct FakeRegistrar {
    codes_issued: AtomicUsize,
    pub tracking_calls: AtomicUsize,
    pub close_calls: AtomicUsize,
    pub delivery_calls: AtomicUsize,
    pub availability_calls: AtomicUsize,
    pub reject_close: AtomicBool,
    pub availability: Mutex<VecDeque<bool>>,
    /// Codes left out of the returned posting list.
    pub refused: Mutex<Vec<String>>,
}

impl FakeRegistrar {
    pub fn tracking_calls(&self) -> usize {
        self.tracking_calls.load(Ordering::SeqCst)
    }

    pub fn availability_calls(&self) -> usize {
        self.availability_calls.load(Ordering::SeqCst)
    }

    pub fn days(service: Service) -> u32 {
        if service == Service::STANDARD {
            7
        } else {
            3
        }
    }
}

#[async_trait]
impl Registrar for FakeRegistrar {
    async fn request_tracking_codes(
        &self,
        _user: &User,
        _service: Service,
        quantity: u32,
    ) -> Result<Vec<TrackingCode>> {
        self.tracking_calls.fetch_add(1, Ordering::SeqCst);
        (0..quantity)
            .map(|_| {
                let n = self.codes_issued.fetch_add(1, Ordering::SeqCst) + 1;
                TrackingCode::new(&format!("SX{:09}BR", n))
            })
            .collect()
    }

    async fn close_posting_list(
        &self,
        posting_list: PostingList<Open>,
        _posting_card: &PostingCard,
    ) -> Result<PostingList<Closed>> {
        let n = self.close_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_close.load(Ordering::SeqCst) {
            return Err(SigepError::remote(
                "close_posting_list",
                None,
                RemoteFailure::Rejected {
                    status: 422,
                    message: "posting card suspended".into(),
                },
            ));
        }
        let refused = self.refused.lock().unwrap().clone();
        let mut kept = PostingList::new(posting_list.custom_id());
        for label in posting_list.shipping_labels() {
            if !refused.contains(&label.tracking_code.to_string()) {
                kept.add_shipping_label(label.clone())?;
            }
        }
        Ok(kept.close(8_000 + n as u64))
    }

    async fn calculate_delivery_time(&self, service: Service, _from: &ZipCode, _to: &ZipCode) -> Result<u32> {
        self.delivery_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::days(service))
    }

    async fn calculate_freights(&self, query: FreightQuery<'_>) -> Result<Vec<FreightResponse>> {
        Ok(query
            .services
            .iter()
            .map(|&service| FreightResponse {
                service,
                delivery_time: chrono::Duration::days(Self::days(service) as i64),
                total: 25.9,
                declared_value_surcharge: 0.0,
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
        Ok(self.availability.lock().unwrap().pop_front().unwrap_or(true))
    }

    async fn get_posting_card_status(&self, posting_card: &PostingCard) -> Result<bool> {
        Ok(posting_card.number == "0067599079")
    }
}
