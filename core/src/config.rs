use serde::{Deserialize, Serialize};

/// Rig settings. Every field has a default, so a config file only needs
/// to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    /// Trials table, relative to the data directory.
    pub trials_csv_name: String,
    /// Product/price table, relative to the data directory.
    pub products_csv_name: String,
    /// Prefix for the shelf tools' remembered-directory preference.
    pub prefs_namespace: String,
    /// Directory the asset picker falls back to.
    pub asset_root: String,
    /// Tag carried by shelf slots the stocker fills.
    pub slot_tag: String,
    /// Tag carried by warehouse shelves the container tool fills.
    pub warehouse_tag: String,
    /// Label text for a shelf whose product is not in the scene.
    pub missing_label: String,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            trials_csv_name:   "Trials.csv".into(),
            products_csv_name: "Products.csv".into(),
            prefs_namespace:   "VRClass".into(),
            asset_root:        "Assets".into(),
            slot_tag:          "ProductBundle".into(),
            warehouse_tag:     "WarehouseShelf".into(),
            missing_label:     "---".into(),
        }
    }
}

impl RigConfig {
    /// Load from a JSON file.
    /// In tests, use RigConfig::default().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: RigConfig = serde_json::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: RigConfig =
            serde_json::from_str(r#"{ "trials_csv_name": "Pilot.csv" }"#).unwrap();
        assert_eq!(config.trials_csv_name, "Pilot.csv");
        assert_eq!(config.products_csv_name, "Products.csv");
        assert_eq!(config.missing_label, "---");
    }

    #[test]
    fn load_reports_missing_file() {
        let err = RigConfig::load("/nonexistent/rig.json").unwrap_err();
        assert!(err.to_string().contains("Cannot read"));
    }
}
