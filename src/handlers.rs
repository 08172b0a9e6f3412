pub mod users;
pub mod invoices;
pub mod imports;
