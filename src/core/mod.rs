pub mod accumulator;
pub mod allocator;
pub mod closer;
pub mod documents;
pub mod labels;
pub mod metrics;
pub mod session;

pub use crate::domain::model::{PostingCard, ShippingLabel};
pub use crate::domain::ports::{BatchIdGenerator, DocumentRenderer, Registrar};
pub use crate::utils::error::Result;
