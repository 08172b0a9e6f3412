pub mod document;
pub mod invoice;
pub mod user;
pub mod import;
