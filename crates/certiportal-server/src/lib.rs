//! `CertiPortal` Server Library
//!
//! Core functionality for the `CertiPortal` backend:
//! - `SQLite` storage for users, profiles, certificate requests, documents,
//!   and notifications
//! - JWT authentication and password hashing
//! - Role-based authorization gate
//! - Certificate request lifecycle with notification side effects
//! - Filesystem blob store for uploaded files
//! - REST surface (axum)

pub mod auth;
pub mod authz;
pub mod blob;
pub mod http;
pub mod lifecycle;
pub mod notify;
pub mod storage;
