use crate::domain::data::{Service, ServiceSelector};
use crate::domain::model::{TrackingCode, User};
use crate::domain::ports::Registrar;
use crate::utils::error::{RemoteFailure, Result, SigepError};

/// Thin façade over the registrar's code-issuance call.
///
/// Codes are a billable remote resource; callers request them only while
/// closing a batch that already passed validation.
pub struct TrackingCodeAllocator<'a, R: Registrar + ?Sized> {
    registrar: &'a R,
    user: &'a User,
}

impl<'a, R: Registrar + ?Sized> TrackingCodeAllocator<'a, R> {
    pub fn new(registrar: &'a R, user: &'a User) -> Self {
        Self { registrar, user }
    }

    pub async fn allocate(
        &self,
        service: impl Into<ServiceSelector>,
        quantity: u32,
    ) -> Result<Vec<TrackingCode>> {
        let service: Service = service.into().resolve()?;
        if quantity == 0 {
            return Err(SigepError::validation("quantity", "At least one tracking code must be requested"));
        }

        tracing::debug!(service = %service, quantity, "Requesting tracking codes");
        let codes = self
            .registrar
            .request_tracking_codes(self.user, service, quantity)
            .await?;

        if codes.len() != quantity as usize {
            return Err(SigepError::remote(
                "request_tracking_codes",
                None,
                RemoteFailure::Decode(format!(
                    "asked for {} tracking codes, registrar returned {}",
                    quantity,
                    codes.len()
                )),
            ));
        }
        Ok(codes)
    }

    /// One code for one package.
    pub async fn allocate_one(&self, service: Service) -> Result<TrackingCode> {
        let mut codes = self.allocate(service, 1).await?;
        codes.pop().ok_or_else(|| {
            SigepError::remote(
                "request_tracking_codes",
                None,
                RemoteFailure::Decode("empty tracking code list".into()),
            )
        })
    }
}
