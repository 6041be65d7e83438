//! The portal aggregate: the account directory plus both catalogs, with
//! every authorization gate enforced at this seam.
//!
//! Menus are expected to hide options a role cannot use, but each operation
//! re-checks the acting principal here so the contract also holds when the
//! crate is driven directly.

use std::collections::BTreeMap;

use anyhow::Context;
use tracing::{info, warn};

use crate::catalog::{CropCatalog, SubsidyCatalog};
use crate::error::{Error, Result};
use crate::models::{ApplicationStatus, Crop, Subsidy, User};
use crate::seed;
use crate::session::{self, Principal, UserDirectory};

/// One entry of a farmer's application list with its status resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationEntry {
    /// Current 1-based position of the subsidy.
    pub subsidy_id: u32,
    /// Description of the scheme at that position.
    pub description: String,
    /// Where the application stands.
    pub status: ApplicationStatus,
}

/// Application report row for one farmer.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicantRow {
    /// Account the applications belong to.
    pub username: String,
    /// Display name for the report.
    pub full_name: String,
    /// Acres from the land profile, zero when not filled in.
    pub land_size: f64,
    /// Location from the land profile.
    pub location: String,
    /// All of the farmer's applications.
    pub entries: Vec<ApplicationEntry>,
}

/// Root of the domain: owns the directory and the catalogs and keeps the
/// cross-references between them consistent.
#[derive(Debug)]
pub struct Portal {
    directory: UserDirectory,
    crops: CropCatalog,
    subsidies: SubsidyCatalog,
}

impl Portal {
    /// Assemble a portal from an explicit directory and catalogs.
    pub fn new(directory: UserDirectory, crops: CropCatalog, subsidies: SubsidyCatalog) -> Self {
        Self {
            directory,
            crops,
            subsidies,
        }
    }

    /// Standard startup: seed the built-in catalogs, make sure the default
    /// administrator exists, then drop any stored subsidy references the
    /// current catalog cannot resolve.
    pub fn bootstrap(directory: UserDirectory) -> anyhow::Result<Self> {
        let (crops, subsidies) =
            seed::default_catalogs().context("failed to build startup catalogs")?;
        let mut portal = Self::new(directory, crops, subsidies);
        portal.directory.ensure_default_admin();
        portal.prune_dangling_references();
        Ok(portal)
    }

    /// Records loaded from disk may reference subsidies a previous run's
    /// catalog had but this one does not. Those references are meaningless
    /// against the current catalog, so they are dropped up front instead of
    /// surfacing as phantom applications later.
    fn prune_dangling_references(&mut self) {
        let len = self.subsidies.len();
        for user in self.directory.iter_mut() {
            let before = user.subsidy_applications.len() + user.approved_subsidies.len();
            user.subsidy_applications
                .retain(|id| *id >= 1 && (*id as usize) <= len);
            let applications = &user.subsidy_applications;
            user.approved_subsidies
                .retain(|id| applications.contains(id));
            let after = user.subsidy_applications.len() + user.approved_subsidies.len();
            if after != before {
                warn!(
                    username = %user.username,
                    dropped = before - after,
                    "dropped subsidy references outside the current catalog"
                );
            }
        }
    }

    /// Accounts in username order, e.g. for persisting.
    pub fn users(&self) -> &BTreeMap<String, User> {
        self.directory.users()
    }

    /// The crop catalog, read-only.
    pub fn crops(&self) -> &CropCatalog {
        &self.crops
    }

    /// The subsidy catalog, read-only.
    pub fn subsidies(&self) -> &SubsidyCatalog {
        &self.subsidies
    }

    /// Create a farmer account.
    pub fn register(&mut self, username: &str, password: &str, full_name: &str) -> Result<()> {
        self.directory.register(username, password, full_name)?;
        Ok(())
    }

    /// Authenticate into a principal for the gated operations below.
    pub fn login(&self, username: &str, password: &str) -> Result<Principal> {
        self.directory.login(username, password)
    }

    /// The acting farmer's own account.
    pub fn profile(&self, principal: &Principal) -> Result<&User> {
        session::require_farmer(principal)?;
        self.directory
            .get(principal.username())
            .ok_or(Error::AuthorizationDenied)
    }

    /// Replace the acting farmer's land profile. Location and soil type are
    /// optional; an empty value clears the field.
    pub fn update_land_details(
        &mut self,
        principal: &Principal,
        land_size: f64,
        location: String,
        soil_type: String,
    ) -> Result<()> {
        session::require_farmer(principal)?;
        if !land_size.is_finite() || land_size < 0.0 {
            return Err(Error::InvalidField {
                field: "land size",
                reason: "must be a non-negative number".to_string(),
            });
        }
        session::validate_optional_field("location", &location)?;
        session::validate_optional_field("soil type", &soil_type)?;
        let user = self.resolve_owner_mut(principal)?;
        user.set_land_details(land_size, location, soil_type);
        info!(username = %principal.username(), "land details updated");
        Ok(())
    }

    /// File an application for subsidy `id` on behalf of the acting farmer.
    pub fn apply(&mut self, principal: &Principal, id: u32) -> Result<()> {
        session::require_farmer(principal)?;
        self.subsidies.get(id)?;
        let user = self.resolve_owner_mut(principal)?;
        if user.has_applied(id) {
            return Err(Error::AlreadyApplied(id));
        }
        user.subsidy_applications.push(id);
        info!(username = %principal.username(), subsidy = id, "subsidy application filed");
        Ok(())
    }

    /// The acting farmer's applications with their statuses resolved.
    pub fn my_applications(&self, principal: &Principal) -> Result<Vec<ApplicationEntry>> {
        session::require_farmer(principal)?;
        let user = self
            .directory
            .get(principal.username())
            .ok_or(Error::AuthorizationDenied)?;
        Ok(self.application_entries(user))
    }

    /// Add a crop to the catalog. Returns the new 1-based position.
    pub fn add_crop(&mut self, principal: &Principal, name: &str, price: f64) -> Result<u32> {
        session::require_admin(principal)?;
        let id = self.crops.add(name, price)?;
        info!(admin = %principal.username(), crop = name, id, "crop added");
        Ok(id)
    }

    /// Change the price of the crop at position `id`.
    pub fn update_crop_price(&mut self, principal: &Principal, id: u32, price: f64) -> Result<()> {
        session::require_admin(principal)?;
        self.crops.update_price(id, price)?;
        info!(admin = %principal.username(), crop = id, price, "crop price updated");
        Ok(())
    }

    /// Remove the crop at position `id`. Crops are not referenced by user
    /// records, so no renumbering is needed.
    pub fn remove_crop(&mut self, principal: &Principal, id: u32) -> Result<Crop> {
        session::require_admin(principal)?;
        let removed = self.crops.remove(id)?;
        info!(admin = %principal.username(), crop = %removed.name, "crop removed");
        Ok(removed)
    }

    /// Add a subsidy scheme. Returns the new 1-based position.
    pub fn add_subsidy(
        &mut self,
        principal: &Principal,
        description: &str,
        details: &str,
    ) -> Result<u32> {
        session::require_admin(principal)?;
        let id = self.subsidies.add(description, details)?;
        info!(admin = %principal.username(), id, "subsidy added");
        Ok(id)
    }

    /// Replace the subsidy at position `id`.
    pub fn update_subsidy(
        &mut self,
        principal: &Principal,
        id: u32,
        description: &str,
        details: &str,
    ) -> Result<()> {
        session::require_admin(principal)?;
        self.subsidies.update(id, description, details)?;
        info!(admin = %principal.username(), subsidy = id, "subsidy updated");
        Ok(())
    }

    /// Remove the subsidy at position `id` and renumber every user's
    /// reference lists to match the shifted catalog.
    pub fn remove_subsidy(&mut self, principal: &Principal, id: u32) -> Result<Subsidy> {
        session::require_admin(principal)?;
        let removed = self.subsidies.remove(id, self.directory.iter_mut())?;
        info!(
            admin = %principal.username(),
            subsidy = id,
            description = %removed.description,
            "subsidy removed, user references renumbered"
        );
        Ok(removed)
    }

    /// Approve a farmer's pending application for subsidy `id`.
    pub fn approve(&mut self, principal: &Principal, username: &str, id: u32) -> Result<()> {
        session::require_admin(principal)?;
        self.subsidies.get(id)?;
        let user = self.resolve_farmer_mut(username)?;
        if !user.has_applied(id) {
            return Err(Error::ApplicationNotFound(id));
        }
        if user.is_approved(id) {
            return Err(Error::AlreadyApproved(id));
        }
        user.approved_subsidies.push(id);
        info!(admin = %principal.username(), username, subsidy = id, "application approved");
        Ok(())
    }

    /// Take back an approval. The application itself stays on file, back in
    /// the pending state.
    pub fn reject(&mut self, principal: &Principal, username: &str, id: u32) -> Result<()> {
        session::require_admin(principal)?;
        self.subsidies.get(id)?;
        let user = self.resolve_farmer_mut(username)?;
        if !user.has_applied(id) {
            return Err(Error::ApplicationNotFound(id));
        }
        if !user.is_approved(id) {
            return Err(Error::AlreadyPending(id));
        }
        user.approved_subsidies.retain(|value| *value != id);
        info!(admin = %principal.username(), username, subsidy = id, "approval withdrawn");
        Ok(())
    }

    /// All farmer accounts in username order.
    pub fn farmer_roster(&self, principal: &Principal) -> Result<Vec<&User>> {
        session::require_admin(principal)?;
        Ok(self.directory.iter().filter(|user| !user.is_admin).collect())
    }

    /// One row per farmer that has at least one application on file.
    pub fn application_report(&self, principal: &Principal) -> Result<Vec<ApplicantRow>> {
        session::require_admin(principal)?;
        Ok(self
            .directory
            .iter()
            .filter(|user| !user.is_admin && !user.subsidy_applications.is_empty())
            .map(|user| ApplicantRow {
                username: user.username.clone(),
                full_name: user.full_name.clone(),
                land_size: user.land_size,
                location: user.location.clone(),
                entries: self.application_entries(user),
            })
            .collect())
    }

    fn application_entries(&self, user: &User) -> Vec<ApplicationEntry> {
        user.subsidy_applications
            .iter()
            .map(|&id| ApplicationEntry {
                subsidy_id: id,
                description: match self.subsidies.get(id) {
                    Ok(subsidy) => subsidy.description.clone(),
                    Err(_) => format!("Subsidy {id} (no longer listed)"),
                },
                status: if user.is_approved(id) {
                    ApplicationStatus::Approved
                } else {
                    ApplicationStatus::Pending
                },
            })
            .collect()
    }

    fn resolve_owner_mut(&mut self, principal: &Principal) -> Result<&mut User> {
        self.directory
            .get_mut(principal.username())
            .ok_or(Error::AuthorizationDenied)
    }

    fn resolve_farmer_mut(&mut self, username: &str) -> Result<&mut User> {
        match self.directory.get_mut(username) {
            Some(user) if !user.is_admin => Ok(user),
            _ => Err(Error::UserNotFound(username.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn fixture() -> (Portal, Principal, Principal) {
        let mut directory = UserDirectory::new();
        directory.ensure_default_admin();
        directory.register("ravi", "secret", "Ravi Kumar").unwrap();
        let mut crops = CropCatalog::new();
        crops.add("Wheat", 2000.0).unwrap();
        crops.add("Corn", 1800.0).unwrap();
        let mut subsidies = SubsidyCatalog::new();
        subsidies.add("Fertilizer discount", "50% off fertilizers").unwrap();
        subsidies.add("Seed grant", "Free certified seeds").unwrap();
        subsidies.add("Drip irrigation", "Subsidized kits").unwrap();
        let portal = Portal::new(directory, crops, subsidies);
        let admin = portal.login("admin", "admin123").unwrap();
        let farmer = portal.login("ravi", "secret").unwrap();
        (portal, admin, farmer)
    }

    fn subsidy_snapshot(portal: &Portal) -> Vec<(u32, Subsidy)> {
        portal
            .subsidies()
            .iter()
            .map(|(id, subsidy)| (id, subsidy.clone()))
            .collect()
    }

    #[test]
    fn apply_files_a_pending_application() {
        let (mut portal, _, farmer) = fixture();
        portal.apply(&farmer, 2).unwrap();
        let entries = portal.my_applications(&farmer).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].subsidy_id, 2);
        assert_eq!(entries[0].description, "Seed grant");
        assert_eq!(entries[0].status, ApplicationStatus::Pending);
    }

    #[test]
    fn duplicate_applications_are_rejected() {
        let (mut portal, _, farmer) = fixture();
        portal.apply(&farmer, 2).unwrap();
        assert!(matches!(
            portal.apply(&farmer, 2),
            Err(Error::AlreadyApplied(2))
        ));
        assert_eq!(portal.my_applications(&farmer).unwrap().len(), 1);
    }

    #[test]
    fn apply_rejects_out_of_range_ids() {
        let (mut portal, _, farmer) = fixture();
        assert!(matches!(
            portal.apply(&farmer, 0),
            Err(Error::IdOutOfRange { id: 0, .. })
        ));
        assert!(matches!(
            portal.apply(&farmer, 4),
            Err(Error::IdOutOfRange { id: 4, len: 3, .. })
        ));
        assert!(portal.my_applications(&farmer).unwrap().is_empty());
    }

    #[test]
    fn administrators_cannot_apply() {
        let (mut portal, admin, _) = fixture();
        assert!(matches!(
            portal.apply(&admin, 1),
            Err(Error::AuthorizationDenied)
        ));
    }

    #[test]
    fn approval_moves_an_application_forward_once() {
        let (mut portal, admin, farmer) = fixture();
        portal.apply(&farmer, 1).unwrap();
        portal.approve(&admin, "ravi", 1).unwrap();
        let entries = portal.my_applications(&farmer).unwrap();
        assert_eq!(entries[0].status, ApplicationStatus::Approved);
        assert!(matches!(
            portal.approve(&admin, "ravi", 1),
            Err(Error::AlreadyApproved(1))
        ));
        assert_eq!(portal.users()["ravi"].approved_subsidies, vec![1]);
    }

    #[test]
    fn approval_requires_an_application_on_file() {
        let (mut portal, admin, _) = fixture();
        assert!(matches!(
            portal.approve(&admin, "ravi", 2),
            Err(Error::ApplicationNotFound(2))
        ));
    }

    #[test]
    fn approval_targets_must_be_known_farmers() {
        let (mut portal, admin, _) = fixture();
        assert!(matches!(
            portal.approve(&admin, "ghost", 1),
            Err(Error::UserNotFound(_))
        ));
        assert!(matches!(
            portal.approve(&admin, "admin", 1),
            Err(Error::UserNotFound(_))
        ));
    }

    #[test]
    fn farmers_cannot_run_the_approval_workflow() {
        let (mut portal, _, farmer) = fixture();
        portal.apply(&farmer, 1).unwrap();
        assert!(matches!(
            portal.approve(&farmer, "ravi", 1),
            Err(Error::AuthorizationDenied)
        ));
        assert!(portal.users()["ravi"].approved_subsidies.is_empty());
    }

    #[test]
    fn rejection_returns_an_approved_application_to_pending() {
        let (mut portal, admin, farmer) = fixture();
        portal.apply(&farmer, 1).unwrap();
        portal.approve(&admin, "ravi", 1).unwrap();
        portal.reject(&admin, "ravi", 1).unwrap();
        let entries = portal.my_applications(&farmer).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, ApplicationStatus::Pending);
        assert!(matches!(
            portal.reject(&admin, "ravi", 1),
            Err(Error::AlreadyPending(1))
        ));
    }

    #[test]
    fn catalog_mutations_are_admin_only() {
        let (mut portal, _, farmer) = fixture();
        let crops_before: Vec<(u32, Crop)> = portal
            .crops()
            .iter()
            .map(|(id, crop)| (id, crop.clone()))
            .collect();
        let subsidies_before = subsidy_snapshot(&portal);

        assert!(matches!(
            portal.add_crop(&farmer, "Rye", 1500.0),
            Err(Error::AuthorizationDenied)
        ));
        assert!(matches!(
            portal.update_crop_price(&farmer, 1, 9.0),
            Err(Error::AuthorizationDenied)
        ));
        assert!(matches!(
            portal.remove_subsidy(&farmer, 1),
            Err(Error::AuthorizationDenied)
        ));

        let crops_after: Vec<(u32, Crop)> = portal
            .crops()
            .iter()
            .map(|(id, crop)| (id, crop.clone()))
            .collect();
        assert_eq!(crops_before, crops_after);
        assert_eq!(subsidies_before, subsidy_snapshot(&portal));
    }

    #[test]
    fn removing_a_subsidy_renumbers_user_references() {
        let (mut portal, admin, farmer) = fixture();
        portal.apply(&farmer, 2).unwrap();
        portal.apply(&farmer, 3).unwrap();
        portal.approve(&admin, "ravi", 3).unwrap();

        let removed = portal.remove_subsidy(&admin, 2).unwrap();

        assert_eq!(removed.description, "Seed grant");
        assert_eq!(portal.subsidies().len(), 2);
        assert_eq!(
            portal.subsidies().get(2).unwrap().description,
            "Drip irrigation"
        );
        let ravi = &portal.users()["ravi"];
        assert_eq!(ravi.subsidy_applications, vec![2]);
        assert_eq!(ravi.approved_subsidies, vec![2]);
        let entries = portal.my_applications(&farmer).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].subsidy_id, 2);
        assert_eq!(entries[0].description, "Drip irrigation");
        assert_eq!(entries[0].status, ApplicationStatus::Approved);
    }

    #[test]
    fn removing_a_crop_leaves_user_records_alone() {
        let (mut portal, admin, farmer) = fixture();
        portal.apply(&farmer, 1).unwrap();
        portal.remove_crop(&admin, 1).unwrap();
        assert_eq!(portal.crops().len(), 1);
        assert_eq!(portal.users()["ravi"].subsidy_applications, vec![1]);
    }

    #[test]
    fn land_details_belong_to_the_acting_farmer() {
        let (mut portal, admin, farmer) = fixture();
        portal
            .update_land_details(&farmer, 12.5, "Nashik".to_string(), "Black".to_string())
            .unwrap();
        let profile = portal.profile(&farmer).unwrap();
        assert_eq!(profile.land_size, 12.5);
        assert_eq!(profile.location, "Nashik");
        assert!(profile.has_land_details());
        assert!(matches!(
            portal.update_land_details(&admin, 1.0, "X".to_string(), "Y".to_string()),
            Err(Error::AuthorizationDenied)
        ));
    }

    #[test]
    fn land_details_are_validated_before_anything_changes() {
        let (mut portal, _, farmer) = fixture();
        assert!(portal
            .update_land_details(&farmer, -2.0, "Nashik".to_string(), "Black".to_string())
            .is_err());
        assert!(portal
            .update_land_details(&farmer, f64::NAN, "Nashik".to_string(), "Black".to_string())
            .is_err());
        assert!(portal
            .update_land_details(&farmer, 2.0, "Na|shik".to_string(), "Black".to_string())
            .is_err());
        assert!(portal
            .update_land_details(&farmer, 2.0, "Nashik ".to_string(), "Black".to_string())
            .is_err());
        assert!(!portal.profile(&farmer).unwrap().has_land_details());
    }

    #[test]
    fn land_details_allow_clearing_the_optional_fields() {
        let (mut portal, _, farmer) = fixture();
        portal
            .update_land_details(&farmer, 12.5, "Nashik".to_string(), "Black".to_string())
            .unwrap();
        portal
            .update_land_details(&farmer, 12.5, String::new(), String::new())
            .unwrap();
        let profile = portal.profile(&farmer).unwrap();
        assert!(profile.location.is_empty());
        assert!(profile.soil_type.is_empty());
        assert!(profile.has_land_details());
    }

    #[test]
    fn subsidy_catalog_can_be_extended_and_edited() {
        let (mut portal, admin, farmer) = fixture();
        let id = portal.add_subsidy(&admin, "Solar pumps", "70% subsidy").unwrap();
        assert_eq!(id, 4);
        portal.update_subsidy(&admin, 4, "Solar pumps", "80% subsidy").unwrap();
        assert_eq!(portal.subsidies().get(4).unwrap().details, "80% subsidy");
        portal.apply(&farmer, 4).unwrap();
        assert_eq!(portal.users()["ravi"].subsidy_applications, vec![4]);
    }

    #[test]
    fn bootstrap_seeds_the_admin_and_prunes_dangling_references() {
        let mut ravi = User::new("ravi", "secret", "Ravi Kumar", false);
        ravi.subsidy_applications = vec![1, 7, 0];
        ravi.approved_subsidies = vec![7, 2];
        let mut users = BTreeMap::new();
        users.insert(ravi.username.clone(), ravi);
        let portal = Portal::bootstrap(UserDirectory::from_users(users)).unwrap();

        assert!(portal.users()["admin"].is_admin);
        assert_eq!(portal.crops().len(), 5);
        assert_eq!(portal.subsidies().len(), 3);
        let ravi = &portal.users()["ravi"];
        assert_eq!(ravi.subsidy_applications, vec![1]);
        assert!(ravi.approved_subsidies.is_empty());
    }

    #[test]
    fn registration_through_the_portal_creates_farmers() {
        let (mut portal, _, _) = fixture();
        portal.register("meera", "pw1234", "Meera Patel").unwrap();
        let principal = portal.login("meera", "pw1234").unwrap();
        assert!(!principal.is_admin());
    }

    #[test]
    fn reports_are_admin_only() {
        let (portal, _, farmer) = fixture();
        assert!(matches!(
            portal.farmer_roster(&farmer),
            Err(Error::AuthorizationDenied)
        ));
        assert!(matches!(
            portal.application_report(&farmer),
            Err(Error::AuthorizationDenied)
        ));
    }

    #[test]
    fn the_application_report_covers_only_applicants() {
        let (mut portal, admin, farmer) = fixture();
        portal.register("meera", "pw1234", "Meera Patel").unwrap();
        portal.apply(&farmer, 1).unwrap();
        portal.apply(&farmer, 3).unwrap();
        portal.approve(&admin, "ravi", 3).unwrap();

        let report = portal.application_report(&admin).unwrap();
        assert_eq!(report.len(), 1);
        let row = &report[0];
        assert_eq!(row.username, "ravi");
        assert_eq!(row.entries.len(), 2);
        assert_eq!(row.entries[0].status, ApplicationStatus::Pending);
        assert_eq!(row.entries[1].status, ApplicationStatus::Approved);
    }

    #[test]
    fn the_farmer_roster_excludes_administrators() {
        let (portal, admin, _) = fixture();
        let roster = portal.farmer_roster(&admin).unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].username, "ravi");
    }
}
