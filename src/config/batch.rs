use crate::core::session::PostingSession;
use crate::domain::model::{AddressFields, PackageFields};
use crate::domain::ports::{DocumentRenderer, Registrar};
use crate::utils::error::{Result, SigepError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Batch input file: one sender, one receiver, packages in posting order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchFile {
    pub sender: AddressFields,
    pub receiver: AddressFields,
    #[serde(default, rename = "package")]
    pub packages: Vec<PackageFields>,
}

impl BatchFile {
    /// `.json` files are read as JSON, anything else as TOML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(serde_json::from_str(&content)?),
            _ => Self::from_toml_str(&content),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            SigepError::validation("batch_file", format!("TOML parsing error: {}", e))
        })
    }

    /// Feeds the batch into the session. Stops at the first rejected entry;
    /// entries accepted before it stay in the session.
    pub fn apply<R: Registrar, D: DocumentRenderer>(self, session: &mut PostingSession<R, D>) -> Result<()> {
        session.set_sender(self.sender)?;
        session.set_receiver(self.receiver)?;
        for (index, fields) in self.packages.into_iter().enumerate() {
            session.add_package(fields).map_err(|e| match e {
                SigepError::Validation { field, reason } => SigepError::Validation {
                    field: format!("package[{}].{}", index, field),
                    reason,
                },
                other => other,
            })?;
        }
        Ok(())
    }
}
