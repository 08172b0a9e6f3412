// src/docs.rs

use utoipa::OpenApi;
use crate::common;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Users ---
        handlers::users::register_user,

        // --- Invoices ---
        handlers::invoices::submit_invoice,
        handlers::invoices::get_invoice,

        // --- Imports ---
        handlers::imports::run_import,
    ),
    components(
        schemas(
            // --- Users ---
            models::user::ChatUser,
            models::user::NewChatUser,

            // --- Invoices ---
            models::invoice::Company,
            models::invoice::Product,
            models::invoice::Invoice,
            models::invoice::InvoiceItem,
            models::invoice::InvoiceLine,
            models::invoice::InvoiceDetail,
            models::invoice::InvoiceSummary,

            // --- Imports ---
            models::import::ImportReport,
            models::import::ImportFailure,
            common::error::ErrorKind,

            // --- Payloads ---
            handlers::invoices::SubmitInvoicePayload,
            handlers::imports::ImportPayload,
        )
    ),
    tags(
        (name = "Users", description = "Registro de usuários do chat"),
        (name = "Invoices", description = "Gravação e consulta de NFCe"),
        (name = "Imports", description = "Reprocessamento de documentos arquivados")
    )
)]
pub struct ApiDoc;
