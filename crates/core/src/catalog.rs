//! Catalog registries for crops and subsidies.
//!
//! Entries are identified by their current 1-based position in the list.
//! There is no stable surrogate id: removing an entry shifts every later
//! entry down one place, so removing a subsidy must also rewrite the
//! reference lists stored on every user or those references silently start
//! pointing at the wrong scheme.

use crate::error::{Error, Result};
use crate::models::{Crop, Subsidy, User};

/// Ordered crop price list plus the position-joined growing-steps texts.
#[derive(Debug, Clone, Default)]
pub struct CropCatalog {
    crops: Vec<Crop>,
    // invariant: steps.len() == crops.len(), joined by position
    steps: Vec<String>,
}

impl CropCatalog {
    /// Empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.crops.len()
    }

    /// Whether the catalog holds no entries.
    pub fn is_empty(&self) -> bool {
        self.crops.is_empty()
    }

    /// Look up the crop at 1-based position `id`.
    pub fn get(&self, id: u32) -> Result<&Crop> {
        let index = position("crop", self.crops.len(), id)?;
        Ok(&self.crops[index])
    }

    /// Growing-steps text for the crop at 1-based position `id`.
    pub fn steps(&self, id: u32) -> Result<&str> {
        let index = position("crop", self.crops.len(), id)?;
        Ok(&self.steps[index])
    }

    /// Iterate entries with their current 1-based positions.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Crop)> {
        self.crops
            .iter()
            .enumerate()
            .map(|(index, crop)| (index as u32 + 1, crop))
    }

    /// Append an entry together with its steps text. Used when seeding.
    pub(crate) fn push(&mut self, crop: Crop, steps: String) {
        self.crops.push(crop);
        self.steps.push(steps);
    }

    /// Append a new crop, assigning it the next position and a placeholder
    /// steps text. Returns the new entry's id.
    pub fn add(&mut self, name: impl Into<String>, price: f64) -> Result<u32> {
        let name = name.into();
        validate_name("crop name", &name)?;
        validate_price(price)?;
        self.steps.push(default_steps(&name));
        self.crops.push(Crop { name, price });
        Ok(self.crops.len() as u32)
    }

    /// Update the price of the crop at position `id` in place.
    pub fn update_price(&mut self, id: u32, price: f64) -> Result<()> {
        validate_price(price)?;
        let index = position("crop", self.crops.len(), id)?;
        self.crops[index].price = price;
        Ok(())
    }

    /// Remove the crop at position `id`; later entries shift down one place
    /// and the steps list shifts in lockstep.
    pub fn remove(&mut self, id: u32) -> Result<Crop> {
        let index = position("crop", self.crops.len(), id)?;
        self.steps.remove(index);
        Ok(self.crops.remove(index))
    }
}

/// Ordered subsidy list. Removal cascades into user reference lists via
/// [`SubsidyCatalog::remove`].
#[derive(Debug, Clone, Default)]
pub struct SubsidyCatalog {
    entries: Vec<Subsidy>,
}

impl SubsidyCatalog {
    /// Empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up the subsidy at 1-based position `id`.
    pub fn get(&self, id: u32) -> Result<&Subsidy> {
        let index = position("subsidy", self.entries.len(), id)?;
        Ok(&self.entries[index])
    }

    /// Iterate entries with their current 1-based positions.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Subsidy)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, subsidy)| (index as u32 + 1, subsidy))
    }

    /// Append an entry. Used when seeding.
    pub(crate) fn push(&mut self, subsidy: Subsidy) {
        self.entries.push(subsidy);
    }

    /// Append a new scheme, assigning it the next position. Returns the new
    /// entry's id.
    pub fn add(
        &mut self,
        description: impl Into<String>,
        details: impl Into<String>,
    ) -> Result<u32> {
        let description = description.into();
        validate_name("subsidy description", &description)?;
        self.entries.push(Subsidy {
            description,
            details: details.into(),
        });
        Ok(self.entries.len() as u32)
    }

    /// Replace description and details of the subsidy at position `id`.
    pub fn update(
        &mut self,
        id: u32,
        description: impl Into<String>,
        details: impl Into<String>,
    ) -> Result<()> {
        let description = description.into();
        validate_name("subsidy description", &description)?;
        let index = position("subsidy", self.entries.len(), id)?;
        self.entries[index] = Subsidy {
            description,
            details: details.into(),
        };
        Ok(())
    }

    /// Remove the subsidy at position `id` and renumber the reference lists
    /// of every user in `users` to match the shifted catalog.
    ///
    /// On an out-of-range id nothing is touched, neither catalog nor users.
    pub fn remove<'a>(
        &mut self,
        id: u32,
        users: impl IntoIterator<Item = &'a mut User>,
    ) -> Result<Subsidy> {
        let index = position("subsidy", self.entries.len(), id)?;
        let removed = self.entries.remove(index);
        for user in users {
            renumber_after_removal(&mut user.subsidy_applications, id);
            renumber_after_removal(&mut user.approved_subsidies, id);
        }
        Ok(removed)
    }
}

/// Rewrite one reference list after the subsidy at position `removed` left
/// the catalog: references to it disappear, references past it slide down
/// one place, references before it stay as they are. Relative order of the
/// survivors is preserved. Single pass.
fn renumber_after_removal(refs: &mut Vec<u32>, removed: u32) {
    refs.retain_mut(|value| {
        if *value == removed {
            false
        } else {
            if *value > removed {
                *value -= 1;
            }
            true
        }
    });
}

/// Map a 1-based position to a vector index, rejecting 0 and ids past the
/// end before anything is mutated.
fn position(kind: &'static str, len: usize, id: u32) -> Result<usize> {
    if id >= 1 && (id as usize) <= len {
        Ok(id as usize - 1)
    } else {
        Err(Error::IdOutOfRange { kind, id, len })
    }
}

fn validate_price(price: f64) -> Result<()> {
    if price.is_finite() && price >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidField {
            field: "price",
            reason: "must be a non-negative number".to_string(),
        })
    }
}

fn validate_name(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidField {
            field,
            reason: "must not be empty".to_string(),
        });
    }
    Ok(())
}

fn default_steps(name: &str) -> String {
    format!("{name} Steps: 1. Default step 1. 2. Default step 2. 3. Default step 3.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;

    fn crop_catalog() -> CropCatalog {
        let mut catalog = CropCatalog::new();
        catalog.add("Wheat", 2000.0).unwrap();
        catalog.add("Corn", 1800.0).unwrap();
        catalog.add("Bajra", 2200.0).unwrap();
        catalog
    }

    fn subsidy_catalog() -> SubsidyCatalog {
        let mut catalog = SubsidyCatalog::new();
        catalog.add("Fertilizer discount", "50% off fertilizers").unwrap();
        catalog.add("Interest-free loans", "For small farmers").unwrap();
        catalog.add("Free organic seeds", "Apply online").unwrap();
        catalog
    }

    #[test]
    fn positions_are_one_based() {
        let catalog = crop_catalog();
        assert_eq!(catalog.get(1).unwrap().name, "Wheat");
        assert_eq!(catalog.get(3).unwrap().name, "Bajra");
        assert!(matches!(
            catalog.get(0),
            Err(Error::IdOutOfRange { id: 0, len: 3, .. })
        ));
        assert!(matches!(
            catalog.get(4),
            Err(Error::IdOutOfRange { id: 4, len: 3, .. })
        ));
    }

    #[test]
    fn add_assigns_next_position_and_placeholder_steps() {
        let mut catalog = crop_catalog();
        let id = catalog.add("Jute", 2500.0).unwrap();
        assert_eq!(id, 4);
        assert_eq!(catalog.len(), 4);
        assert_eq!(
            catalog.steps(4).unwrap(),
            "Jute Steps: 1. Default step 1. 2. Default step 2. 3. Default step 3."
        );
    }

    #[test]
    fn update_price_leaves_other_entries_alone() {
        let mut catalog = crop_catalog();
        catalog.update_price(2, 1950.0).unwrap();
        assert_eq!(catalog.get(1).unwrap().price, 2000.0);
        assert_eq!(catalog.get(2).unwrap().price, 1950.0);
        assert_eq!(catalog.get(3).unwrap().price, 2200.0);
    }

    #[test]
    fn remove_shifts_later_crops_and_steps_in_lockstep() {
        let mut catalog = crop_catalog();
        let removed = catalog.remove(2).unwrap();
        assert_eq!(removed.name, "Corn");
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(2).unwrap().name, "Bajra");
        assert!(catalog.steps(2).unwrap().starts_with("Bajra Steps:"));
    }

    #[test]
    fn remove_last_crop_leaves_empty_catalog() {
        let mut catalog = CropCatalog::new();
        catalog.add("Wheat", 2000.0).unwrap();
        catalog.remove(1).unwrap();
        assert!(catalog.is_empty());
        assert!(catalog.get(1).is_err());
    }

    #[test]
    fn negative_or_non_finite_prices_are_rejected() {
        let mut catalog = crop_catalog();
        assert!(matches!(
            catalog.add("Rye", -1.0),
            Err(Error::InvalidField { field: "price", .. })
        ));
        assert!(catalog.add("Rye", f64::NAN).is_err());
        assert!(catalog.update_price(1, -5.0).is_err());
        assert_eq!(catalog.get(1).unwrap().price, 2000.0);
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn subsidy_update_replaces_entry_in_place() {
        let mut catalog = subsidy_catalog();
        catalog.update(2, "Low-interest loans", "Revised terms").unwrap();
        assert_eq!(catalog.get(2).unwrap().description, "Low-interest loans");
        assert_eq!(catalog.get(2).unwrap().details, "Revised terms");
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn removing_a_subsidy_renumbers_every_user() {
        let mut catalog = subsidy_catalog();
        let mut alice = User::new("alice", "pw", "Alice", false);
        alice.subsidy_applications = vec![2, 3];
        alice.approved_subsidies = vec![3];
        let mut bob = User::new("bob", "pw", "Bob", false);
        bob.subsidy_applications = vec![1, 2];

        let removed = catalog.remove(2, [&mut alice, &mut bob]).unwrap();

        assert_eq!(removed.description, "Interest-free loans");
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(2).unwrap().description, "Free organic seeds");
        // the reference to 2 is gone, the reference past it slid down
        assert_eq!(alice.subsidy_applications, vec![2]);
        assert_eq!(alice.approved_subsidies, vec![2]);
        // references below the removed position stay untouched
        assert_eq!(bob.subsidy_applications, vec![1]);
        assert!(bob.approved_subsidies.is_empty());
    }

    #[test]
    fn out_of_range_removal_touches_nothing() {
        let mut catalog = subsidy_catalog();
        let mut user = User::new("alice", "pw", "Alice", false);
        user.subsidy_applications = vec![1, 3];
        user.approved_subsidies = vec![3];

        let result = catalog.remove(4, std::iter::once(&mut user));

        assert!(matches!(
            result,
            Err(Error::IdOutOfRange { id: 4, len: 3, .. })
        ));
        assert_eq!(catalog.len(), 3);
        assert_eq!(user.subsidy_applications, vec![1, 3]);
        assert_eq!(user.approved_subsidies, vec![3]);
    }

    #[test]
    fn renumbering_preserves_survivor_order() {
        let mut refs = vec![5, 1, 3, 2, 4];
        renumber_after_removal(&mut refs, 3);
        assert_eq!(refs, vec![4, 1, 2, 3]);
    }

    #[test]
    fn renumbering_drops_every_occurrence_of_the_removed_id() {
        // duplicate references cannot be created through the portal, but a
        // hand-edited data file can contain them
        let mut refs = vec![2, 2, 3];
        renumber_after_removal(&mut refs, 2);
        assert_eq!(refs, vec![2]);
    }
}
