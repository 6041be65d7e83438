//! Shared domain models.

use std::fmt;

use serde::Deserialize;

/// Observable states of a subsidy application.
///
/// An application is created pending, approval moves it forward, and a
/// rejection puts an approved application back to pending. There is no
/// terminal rejected state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationStatus {
    /// Applied for, awaiting an administrator's decision.
    Pending,
    /// Granted by an administrator.
    Approved,
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplicationStatus::Pending => write!(f, "Pending"),
            ApplicationStatus::Approved => write!(f, "Approved"),
        }
    }
}

/// A registered account with its land profile and subsidy paperwork.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// Login name, unique across the portal and immutable after creation.
    pub username: String,
    /// Stored as plain text; the record format predates any hashing scheme.
    pub password: String,
    /// Display name shown in rosters and reports.
    pub full_name: String,
    /// Administrators manage catalogs and applications, farmers own profiles.
    pub is_admin: bool,
    /// Land size in acres. Zero means the profile has not been filled in yet.
    pub land_size: f64,
    /// Free-text village or district.
    pub location: String,
    /// Free-text soil classification.
    pub soil_type: String,
    /// 1-based subsidy positions this user applied for, in application order.
    pub subsidy_applications: Vec<u32>,
    /// Subset of `subsidy_applications` granted so far, in approval order.
    pub approved_subsidies: Vec<u32>,
}

impl User {
    /// Create a fresh account with an empty land profile.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        full_name: impl Into<String>,
        is_admin: bool,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            full_name: full_name.into(),
            is_admin,
            land_size: 0.0,
            location: String::new(),
            soil_type: String::new(),
            subsidy_applications: Vec::new(),
            approved_subsidies: Vec::new(),
        }
    }

    /// Check a login attempt against the stored password.
    pub fn authenticate(&self, password: &str) -> bool {
        self.password == password
    }

    /// Replace the whole land profile in one step.
    pub fn set_land_details(&mut self, land_size: f64, location: String, soil_type: String) {
        self.land_size = land_size;
        self.location = location;
        self.soil_type = soil_type;
    }

    /// Whether the land profile has been filled in at least once.
    pub fn has_land_details(&self) -> bool {
        self.land_size > 0.0
    }

    /// Whether this user holds an application for subsidy `id`.
    pub fn has_applied(&self, id: u32) -> bool {
        self.subsidy_applications.contains(&id)
    }

    /// Whether the application for subsidy `id` has been approved.
    pub fn is_approved(&self, id: u32) -> bool {
        self.approved_subsidies.contains(&id)
    }

    /// Status of the application for subsidy `id`, if one exists.
    pub fn application_status(&self, id: u32) -> Option<ApplicationStatus> {
        if !self.has_applied(id) {
            None
        } else if self.is_approved(id) {
            Some(ApplicationStatus::Approved)
        } else {
            Some(ApplicationStatus::Pending)
        }
    }
}

/// One crop price entry. Identified by its current 1-based catalog position.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Crop {
    /// Crop name shown in price tables.
    pub name: String,
    /// Reference market price per quintal, non-negative.
    pub price: f64,
}

/// One government subsidy scheme. The catalog position doubles as the id
/// users record in their application lists.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Subsidy {
    /// One-line summary shown in listings.
    pub description: String,
    /// Longer text with eligibility and contact details.
    pub details: String,
}
