use std::collections::BTreeMap;
use std::error::Error;

use serde::Deserialize;

use crate::config::Settings;

/// The slice of the Kobo asset document this job cares about: the survey
/// rows under `content`.  Everything else in the document is ignored.
#[derive(Debug, Deserialize)]
pub struct Asset {
    pub content: Option<Content>,
}

#[derive(Debug, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub survey: Vec<SurveyQuestion>,
}

/// One row of the form definition.  Group markers and notes have no
/// `$autoname` and contribute nothing to the column mappings.
#[derive(Debug, Deserialize)]
pub struct SurveyQuestion {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "$autoname", default)]
    pub autoname: Option<String>,
    #[serde(default)]
    pub label: Option<Label>,
}

/// Labels come back as a bare string, a list of per-translation strings
/// (entries may be null for untranslated languages), or a language → text
/// map, depending on how the form was authored.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Text(String),
    Translations(Vec<Option<String>>),
    PerLanguage(BTreeMap<String, Option<String>>),
}

pub fn download(settings: &Settings) -> Result<Asset, Box<dyn Error>> {
    let body = super::get_text(
        &settings.asset_url(),
        &settings.kobo_username,
        &settings.kobo_password,
    )?;
    let asset: Asset = serde_json::from_str(&body)?;
    Ok(asset)
}

impl Asset {
    pub fn survey(&self) -> &[SurveyQuestion] {
        match &self.content {
            Some(content) => &content.survey,
            None => &[],
        }
    }
}
