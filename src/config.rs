use std::env;
use std::error::Error;

use crate::db::survey_archive::SurveyArchive;

pub const KOBO_BASE_URL: &str = "https://kf.kobotoolbox.org/api/v2";
pub const ASSET_ID: &str = "a3vWYSWmr528zJvPrAbL85";
pub const EXPORT_SETTINGS_ID: &str = "esZA8QhsLYoBQtehuYkHn3v";
pub const SCHEMA_NAME: &str = "quicksupply";
pub const TABLE_NAME: &str = "weekly_inventory";

/// Everything the job needs, read once at startup.  Credentials and the
/// database location come from the environment; the asset and target
/// table are fixed per deployment.
#[derive(Clone)]
pub struct Settings {
    pub kobo_username: String,
    pub kobo_password: String,
    pub asset_id: String,
    pub export_settings_id: String,
    pub duckdb_path: String,
    pub schema: String,
    pub table: String,
}

impl Settings {
    pub fn from_env() -> Result<Settings, Box<dyn Error>> {
        Ok(Settings {
            kobo_username: var("KOBO_USERNAME")?,
            kobo_password: var("KOBO_PASSWORD")?,
            asset_id: ASSET_ID.to_string(),
            export_settings_id: EXPORT_SETTINGS_ID.to_string(),
            duckdb_path: var("DUCKDB_PATH")?,
            schema: SCHEMA_NAME.to_string(),
            table: TABLE_NAME.to_string(),
        })
    }

    pub fn asset_url(&self) -> String {
        format!("{}/assets/{}/", KOBO_BASE_URL, self.asset_id)
    }

    /// The CSV export prepared by the export-settings on the server.
    pub fn data_url(&self) -> String {
        format!(
            "{}/assets/{}/export-settings/{}/data.csv",
            KOBO_BASE_URL, self.asset_id, self.export_settings_id
        )
    }

    pub fn survey_archive(&self) -> SurveyArchive {
        SurveyArchive {
            duckdb_path: self.duckdb_path.clone(),
            schema: self.schema.clone(),
            table: self.table.clone(),
        }
    }
}

fn var(name: &str) -> Result<String, Box<dyn Error>> {
    env::var(name).map_err(|_| format!("missing environment variable {}", name).into())
}
