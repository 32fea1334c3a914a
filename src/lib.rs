//! Student registration backend.
//!
//! Accepts a registration form (name, roll number, study year, profile
//! photo), persists a record, stores the photo, and renders a personalized
//! ticket PNG (template + photo + QR code + text) returned as a download.

pub mod asset;
pub mod config;
pub mod error;
pub mod openapi;
pub mod record;
pub mod register;
pub mod routes;
pub mod state;
pub mod student_id;
pub mod ticket;
