// Adapters layer: concrete registrar and document renderer implementations.

pub mod http;
pub mod render;

pub use http::HttpRegistrar;
pub use render::ArchiveRenderer;
