#![warn(clippy::all, missing_docs)]

//! Core domain logic for the krishi cooperative agriculture portal.
//!
//! This crate hosts the data models, account directory and login flow,
//! crop and subsidy catalogs with their consistency rules, the
//! pipe-delimited record store, and configuration handling used by the
//! terminal UI and any future frontends.

pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod portal;
pub mod seed;
pub mod session;
pub mod store;

pub use catalog::{CropCatalog, SubsidyCatalog};
pub use config::AppConfig;
pub use error::{Error, Result};
pub use models::{ApplicationStatus, Crop, Subsidy, User};
pub use portal::{ApplicantRow, ApplicationEntry, Portal};
pub use session::{Principal, UserDirectory};
pub use store::UserStore;
