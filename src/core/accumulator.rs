use crate::domain::model::{AddressFields, Package, PackageFields, PartyAddress};
use crate::utils::error::Result;

/// The in-progress batch: packages in insertion order plus one sender and one receiver.
#[derive(Debug, Default, Clone)]
pub struct BatchAccumulator {
    packages: Vec<Package>,
    sender: Option<PartyAddress>,
    receiver: Option<PartyAddress>,
}

impl BatchAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the package first, so a rejected package never touches the batch.
    pub fn add_package(&mut self, fields: PackageFields) -> Result<&Package> {
        let package = Package::new(fields)?;
        tracing::debug!(
            service = %package.service(),
            position = self.packages.len(),
            "Package added to batch"
        );
        self.packages.push(package);
        Ok(&self.packages[self.packages.len() - 1])
    }

    pub fn set_sender(&mut self, fields: AddressFields) -> Result<&PartyAddress> {
        let sender = PartyAddress::new(fields)?;
        Ok(self.sender.insert(sender))
    }

    pub fn set_receiver(&mut self, fields: AddressFields) -> Result<&PartyAddress> {
        let receiver = PartyAddress::new(fields)?;
        Ok(self.receiver.insert(receiver))
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn sender(&self) -> Option<&PartyAddress> {
        self.sender.as_ref()
    }

    pub fn receiver(&self) -> Option<&PartyAddress> {
        self.receiver.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty() && self.sender.is_none() && self.receiver.is_none()
    }

    pub(crate) fn reset(&mut self) {
        self.packages.clear();
        self.sender = None;
        self.receiver = None;
    }
}
