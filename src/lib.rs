pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{ArchiveRenderer, HttpRegistrar};
pub use config::{BatchFile, SessionConfig};
pub use core::closer::{CloseStage, CloserState, RandomBatchId};
pub use core::metrics::LabelSequence;
pub use core::session::PostingSession;
pub use domain::data::{RegionalDirection, Service, ServiceSelector};
pub use domain::model::{
    AddressFields, Contract, ExtraService, FreightResponse, Package, PackageFields, PackageType,
    PartyAddress, PostingCard, ShippingLabel, TrackingCode, User, ZipCode,
};
pub use domain::ports::{
    BatchIdGenerator, Document, DocumentRenderer, FreightQuery, LayoutOptions, PageSize, Registrar,
};
pub use domain::posting_list::{Closed, Open, PostingList};
pub use utils::error::{ErrorCategory, RemoteFailure, Result, SigepError};
