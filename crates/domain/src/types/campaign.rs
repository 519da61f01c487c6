//! Campaign payloads and targeting collections.

use serde::{Deserialize, Serialize};

use crate::errors::{AdflowError, Result};
use crate::impl_domain_enum_conversions;

/// Body shared by the bulk play and stop endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignBulkAction {
    pub campaign_ids: Vec<u64>,
}

impl CampaignBulkAction {
    /// # Errors
    /// Returns `AdflowError::InvalidInput` for an empty id list.
    pub fn new(campaign_ids: Vec<u64>) -> Result<Self> {
        if campaign_ids.is_empty() {
            return Err(AdflowError::InvalidInput(
                "bulk campaign action needs at least one campaign id".into(),
            ));
        }
        Ok(Self { campaign_ids })
    }
}

/// A per-country bid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignRate {
    pub countries: Vec<String>,
    pub amount: f64,
}

impl CampaignRate {
    /// Country codes are upper-cased; at least one country and a positive
    /// amount are required.
    ///
    /// # Errors
    /// Returns `AdflowError::InvalidInput` when either rule is broken.
    pub fn new(countries: Vec<String>, amount: f64) -> Result<Self> {
        if countries.is_empty() {
            return Err(AdflowError::InvalidInput("rate needs at least one country".into()));
        }
        if amount.is_nan() || amount <= 0.0 {
            return Err(AdflowError::InvalidInput(format!("rate amount must be positive: {amount}")));
        }
        let countries = countries.into_iter().map(|c| c.to_uppercase()).collect();
        Ok(Self { countries, amount })
    }
}

/// Targeting reference collections under `/collections/targeting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Countries,
    OperatingSystems,
    Browsers,
    TrafficCategories,
    Languages,
    ConnectionTypes,
}

impl_domain_enum_conversions!(Collection {
    Countries => "countries",
    OperatingSystems => "operating_systems",
    Browsers => "browsers",
    TrafficCategories => "traffic_categories",
    Languages => "languages",
    ConnectionTypes => "connection_types",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bulk_action_serializes_campaign_ids() {
        let action = CampaignBulkAction::new(vec![7, 8]).unwrap();
        assert_eq!(serde_json::to_string(&action).unwrap(), r#"{"campaign_ids":[7,8]}"#);
    }

    #[test]
    fn bulk_action_rejects_empty_ids() {
        assert!(matches!(CampaignBulkAction::new(vec![]), Err(AdflowError::InvalidInput(_))));
    }

    #[test]
    fn rate_uppercases_countries() {
        let rate = CampaignRate::new(vec!["us".into(), "Gb".into()], 0.5).unwrap();
        assert_eq!(rate.countries, vec!["US", "GB"]);
        assert!(CampaignRate::new(vec![], 0.5).is_err());
        assert!(CampaignRate::new(vec!["us".into()], 0.0).is_err());
        assert!(CampaignRate::new(vec!["us".into()], f64::NAN).is_err());
    }

    #[test]
    fn collection_path_segments() {
        assert_eq!(Collection::OperatingSystems.to_string(), "operating_systems");
        assert_eq!("traffic_categories".parse::<Collection>().unwrap(), Collection::TrafficCategories);
    }
}
