//! Built-in reference data the portal starts with.
//!
//! Catalogs are process-lifetime state: administrators reshape them while
//! the program runs, but only account records persist across runs. Every
//! start therefore begins from this document.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::catalog::{CropCatalog, SubsidyCatalog};
use crate::models::{Crop, Subsidy};

const SEED_DOCUMENT: &str = r#"
{
  "crops": [
    {
      "name": "Wheat",
      "price": 2000.0,
      "steps": "Wheat Steps: 1. Prepare well-drained soil. 2. Sow seeds in November. 3. Irrigate regularly. 4. Harvest in March-April."
    },
    {
      "name": "Corn",
      "price": 1800.0,
      "steps": "Corn Steps: 1. Choose fertile soil. 2. Sow seeds in May-June. 3. Provide adequate water. 4. Harvest after 90-120 days."
    },
    {
      "name": "Bajra",
      "price": 2200.0,
      "steps": "Bajra Steps: 1. Use sandy loam soil. 2. Sow seeds in July. 3. Ensure proper drainage. 4. Harvest after 60-90 days."
    },
    {
      "name": "Jute",
      "price": 2500.0,
      "steps": "Jute Steps: 1. Use alluvial soil. 2. Sow seeds in March-April. 3. Keep soil moist. 4. Harvest after 120-150 days."
    },
    {
      "name": "Cotton",
      "price": 3000.0,
      "steps": "Cotton Steps: 1. Use black soil. 2. Sow seeds in May-June. 3. Provide regular irrigation. 4. Harvest after 150-180 days."
    }
  ],
  "subsidies": [
    {
      "description": "Subsidy 1: 50% subsidy on fertilizers.",
      "details": "Details for Subsidy 1: This subsidy provides a 50% discount on fertilizers for all registered farmers. Valid until December 2023."
    },
    {
      "description": "Subsidy 2: Interest-free loans for small farmers.",
      "details": "Details for Subsidy 2: Small farmers can avail interest-free loans up to ₹1,00,000. Contact your nearest agriculture office for more details."
    },
    {
      "description": "Subsidy 3: Free seeds for organic farming.",
      "details": "Details for Subsidy 3: Free seeds for organic farming are available for farmers practicing sustainable agriculture. Apply online at www.agri-subsidy.gov.in."
    }
  ]
}
"#;

#[derive(Debug, Deserialize)]
struct SeedDocument {
    crops: Vec<SeedCrop>,
    subsidies: Vec<Subsidy>,
}

#[derive(Debug, Deserialize)]
struct SeedCrop {
    name: String,
    price: f64,
    steps: String,
}

/// Parse the embedded seed document into startup catalogs.
pub fn default_catalogs() -> Result<(CropCatalog, SubsidyCatalog)> {
    let doc: SeedDocument =
        serde_json::from_str(SEED_DOCUMENT).context("failed to parse built-in seed document")?;
    let mut crops = CropCatalog::new();
    for entry in doc.crops {
        crops.push(
            Crop {
                name: entry.name,
                price: entry.price,
            },
            entry.steps,
        );
    }
    let mut subsidies = SubsidyCatalog::new();
    for entry in doc.subsidies {
        subsidies.push(entry);
    }
    Ok((crops, subsidies))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_document_parses() {
        let (crops, subsidies) = default_catalogs().unwrap();
        assert_eq!(crops.len(), 5);
        assert_eq!(subsidies.len(), 3);
    }

    #[test]
    fn crops_and_steps_stay_joined_by_position() {
        let (crops, _) = default_catalogs().unwrap();
        for (id, crop) in crops.iter() {
            assert!(
                crops.steps(id).unwrap().starts_with(&crop.name),
                "steps for {} start with the crop name",
                crop.name
            );
        }
        assert_eq!(crops.get(1).unwrap().name, "Wheat");
        assert_eq!(crops.get(1).unwrap().price, 2000.0);
    }

    #[test]
    fn subsidies_carry_details() {
        let (_, subsidies) = default_catalogs().unwrap();
        assert!(subsidies.get(1).unwrap().description.contains("fertilizers"));
        assert!(subsidies.get(3).unwrap().details.contains("organic"));
    }
}
