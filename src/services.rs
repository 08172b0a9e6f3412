pub mod normalizer;
pub mod invoice_service;
pub use invoice_service::InvoiceService;
pub mod archive;
pub use archive::DocumentArchive;
pub mod import_service;
pub use import_service::{InvoiceSink, ReplayImporter};
pub mod user_service;
pub use user_service::UserService;
