use crate::config::toml_config::SessionConfig;
use crate::domain::data::Service;
use crate::domain::model::{
    FreightResponse, Package, PartyAddress, PostingCard, TrackingCode, User, ZipCode,
};
use crate::domain::ports::{FreightQuery, Registrar};
use crate::domain::posting_list::{Closed, Open, PostingList};
use crate::utils::error::{RemoteFailure, Result, SigepError};
use crate::utils::validation::validate_url;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// JSON-over-HTTP client for the carrier's registrar gateway.
///
/// Every call is one request with basic auth. Nothing is retried; a non-2xx
/// reply is surfaced as [`RemoteFailure::Rejected`] with the reply body.
#[derive(Debug, Clone)]
pub struct HttpRegistrar {
    client: Client,
    base_url: String,
    username: String,
    password: String,
}

#[derive(Serialize)]
struct TrackingCodesRequest<'a> {
    cnpj: &'a str,
    service: u32,
    quantity: u32,
}

#[derive(Deserialize)]
struct TrackingCodesReply {
    codes: Vec<String>,
}

#[derive(Serialize)]
struct PostingListRequest<'a> {
    custom_id: u32,
    posting_card: &'a str,
    contract: &'a str,
    administrative_code: &'a str,
    regional_direction: u32,
    cnpj: &'a str,
    sender: Option<&'a PartyAddress>,
    objects: Vec<PostedObject<'a>>,
}

#[derive(Serialize)]
struct PostedObject<'a> {
    tracking_code: &'a str,
    service: u32,
    receiver: &'a PartyAddress,
    package: &'a Package,
}

#[derive(Deserialize)]
struct PostingListReply {
    number: u64,
    /// Codes the registrar kept. Absent means every submitted label.
    #[serde(default)]
    accepted: Option<Vec<String>>,
}

#[derive(Serialize)]
struct RouteRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    posting_card: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    administrative_code: Option<&'a str>,
    service: u32,
    from: &'a str,
    to: &'a str,
}

#[derive(Deserialize)]
struct DeliveryTimeReply {
    days: u32,
}

#[derive(Serialize)]
struct FreightRequest<'a> {
    posting_card: &'a str,
    administrative_code: &'a str,
    services: Vec<u32>,
    from: &'a str,
    to: &'a str,
    package: &'a Package,
    declared_value: f64,
    extra_services: Vec<u32>,
}

#[derive(Deserialize)]
struct AvailabilityReply {
    available: bool,
}

#[derive(Deserialize)]
struct CardStatusReply {
    active: bool,
}

fn decode(operation: &'static str, batch_id: Option<u32>, message: impl Into<String>) -> SigepError {
    SigepError::remote(operation, batch_id, RemoteFailure::Decode(message.into()))
}

/// Body of a non-2xx reply, or why it could not be read.
fn rejection_message<E: std::fmt::Display>(body: std::result::Result<String, E>) -> String {
    match body {
        Ok(text) => text,
        Err(e) => format!("reply body unreadable: {}", e),
    }
}

impl HttpRegistrar {
    pub fn new(
        endpoint: &str,
        username: impl Into<String>,
        password: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        validate_url("registrar.endpoint", endpoint)?;
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            SigepError::configuration("registrar", format!("Cannot build HTTP client: {}", e))
        })?;
        Ok(Self {
            client,
            base_url: endpoint.trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
        })
    }

    pub fn from_config(config: &SessionConfig) -> Result<Self> {
        Self::new(
            &config.registrar.endpoint,
            config.credentials.username.clone(),
            config.credentials.password.clone(),
            config.timeout(),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn post<B, T>(&self, operation: &'static str, batch_id: Option<u32>, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.client.post(self.url(path)).json(body);
        self.send(operation, batch_id, request).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        batch_id: Option<u32>,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = request
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(|e| SigepError::remote(operation, batch_id, e))?;

        let status = response.status();
        tracing::debug!(operation, status = status.as_u16(), "Registrar replied");

        if !status.is_success() {
            let message = rejection_message(response.text().await);
            return Err(SigepError::remote(
                operation,
                batch_id,
                RemoteFailure::Rejected {
                    status: status.as_u16(),
                    message,
                },
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| SigepError::remote(operation, batch_id, e))?;
        serde_json::from_slice(&body).map_err(|e| decode(operation, batch_id, e.to_string()))
    }
}

#[async_trait]
impl Registrar for HttpRegistrar {
    async fn request_tracking_codes(
        &self,
        user: &User,
        service: Service,
        quantity: u32,
    ) -> Result<Vec<TrackingCode>> {
        const OP: &str = "request_tracking_codes";
        tracing::debug!(service = service.mnemonic(), quantity, "Requesting tracking codes");

        let reply: TrackingCodesReply = self
            .post(
                OP,
                None,
                "tracking-codes",
                &TrackingCodesRequest {
                    cnpj: &user.federal_tax_number,
                    service: service.code(),
                    quantity,
                },
            )
            .await?;

        reply
            .codes
            .iter()
            .map(|raw| TrackingCode::new(raw).map_err(|e| decode(OP, None, e.to_string())))
            .collect()
    }

    async fn close_posting_list(
        &self,
        posting_list: PostingList<Open>,
        posting_card: &PostingCard,
    ) -> Result<PostingList<Closed>> {
        const OP: &str = "close_posting_list";
        let batch_id = Some(posting_list.custom_id());

        let labels = posting_list.shipping_labels();
        let request = PostingListRequest {
            custom_id: posting_list.custom_id(),
            posting_card: &posting_card.number,
            contract: &posting_card.contract.number,
            administrative_code: &posting_card.administrative_code,
            regional_direction: posting_card.contract.regional_direction.number,
            cnpj: &posting_card.user().federal_tax_number,
            sender: labels.first().map(|label| &label.sender),
            objects: labels
                .iter()
                .map(|label| PostedObject {
                    tracking_code: label.tracking_code.as_str(),
                    service: label.service.code(),
                    receiver: &label.receiver,
                    package: &label.package,
                })
                .collect(),
        };

        let reply: PostingListReply = self.post(OP, batch_id, "posting-lists", &request).await?;
        tracing::info!(number = reply.number, "Registrar accepted posting list");

        let Some(accepted) = reply.accepted else {
            return Ok(posting_list.close(reply.number));
        };

        let accepted = accepted
            .iter()
            .map(|raw| TrackingCode::new(raw).map_err(|e| decode(OP, batch_id, e.to_string())))
            .collect::<Result<HashSet<_>>>()?;
        if let Some(unknown) = accepted.iter().find(|code| posting_list.label(code).is_none()) {
            return Err(decode(
                OP,
                batch_id,
                format!("registrar accepted unknown tracking code {}", unknown),
            ));
        }

        let mut kept = PostingList::new(posting_list.custom_id());
        for label in posting_list
            .shipping_labels()
            .iter()
            .filter(|label| accepted.contains(&label.tracking_code))
        {
            kept.add_shipping_label(label.clone())?;
        }
        Ok(kept.close(reply.number))
    }

    async fn calculate_delivery_time(&self, service: Service, from: &ZipCode, to: &ZipCode) -> Result<u32> {
        let reply: DeliveryTimeReply = self
            .post(
                "calculate_delivery_time",
                None,
                "delivery-time",
                &RouteRequest {
                    posting_card: None,
                    administrative_code: None,
                    service: service.code(),
                    from: from.digits(),
                    to: to.digits(),
                },
            )
            .await?;
        Ok(reply.days)
    }

    async fn calculate_freights(&self, query: FreightQuery<'_>) -> Result<Vec<FreightResponse>> {
        let request = FreightRequest {
            posting_card: &query.posting_card.number,
            administrative_code: &query.posting_card.administrative_code,
            services: query.services.iter().map(|s| s.code()).collect(),
            from: query.from.digits(),
            to: query.to.digits(),
            package: query.package,
            declared_value: query.declared_value,
            extra_services: query.extra_services.iter().map(|s| s.code()).collect(),
        };
        self.post("calculate_freights", None, "freights", &request).await
    }

    async fn verify_service_availability(
        &self,
        posting_card: &PostingCard,
        service: Service,
        from: &ZipCode,
        to: &ZipCode,
    ) -> Result<bool> {
        let reply: AvailabilityReply = self
            .post(
                "verify_service_availability",
                None,
                "service-availability",
                &RouteRequest {
                    posting_card: Some(&posting_card.number),
                    administrative_code: Some(&posting_card.administrative_code),
                    service: service.code(),
                    from: from.digits(),
                    to: to.digits(),
                },
            )
            .await?;
        Ok(reply.available)
    }

    async fn get_posting_card_status(&self, posting_card: &PostingCard) -> Result<bool> {
        let path = format!("posting-cards/{}/status", posting_card.number);
        let request = self.client.get(self.url(&path));
        let reply: CardStatusReply = self.send("get_posting_card_status", None, request).await?;
        Ok(reply.active)
    }
}
