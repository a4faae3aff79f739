//! `SQLite` storage for the `CertiPortal` server.
//!
//! Provides persistence for users, tokens, profiles, roles, certificate
//! requests, documents, and notifications.

mod db;
mod models;
mod queries;
mod queries_certs;
mod queries_documents;
mod queries_notifications;


pub use db::PortalDatabase;
pub use models::*;
pub use queries::ProfilePatch;
pub use queries_certs::CertificatePatch;
pub use queries_documents::DocumentPatch;
