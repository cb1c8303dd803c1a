use std::error::Error;
use std::path::Path;

use clap::Parser;
use log::info;

use kobosync::columns::{self, FieldMappings};
use kobosync::config::Settings;
use kobosync::kobo;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Environment name, e.g., test, prod
    #[arg(short, long, default_value = "prod")]
    env: String,
}

/// Keep log lines readable; some question labels are whole sentences.
fn preview(name: &str) -> String {
    if name.chars().count() > 60 {
        let head: String = name.chars().take(60).collect();
        format!("{}...", head)
    } else {
        name.to_string()
    }
}

/// One-shot job: pull the weekly inventory submissions from Kobo and
/// replace the warehouse table with them.  Run from cron.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .init();

    dotenvy::from_path(Path::new(format!(".env/{}.env", args.env).as_str()))?;
    let settings = Settings::from_env()?;

    info!("fetching form structure from Kobo ...");
    let asset = kobo::asset::download(&settings)?;
    let mappings = FieldMappings::from_asset(&asset);
    info!(
        "found {} reference name mappings and {} label mappings",
        mappings.reference_to_id.len(),
        mappings.label_to_id.len()
    );

    info!("fetching survey data ...");
    let mut data = kobo::export::download(&settings)?;
    info!(
        "fetched {} rows and {} columns",
        data.n_rows(),
        data.n_columns()
    );

    info!("renaming columns ...");
    let renamed = columns::canonical_columns(&data.columns, &mappings);
    for (raw, new) in data.columns.iter().zip(&renamed) {
        match columns::lookup_identifier(raw, &mappings) {
            Some(_) => info!("  '{}' -> '{}'", preview(raw), new),
            None => info!("  '{}' (kept as is)", preview(raw)),
        }
    }
    data.columns = renamed;

    let archive = settings.survey_archive();
    info!("loading data into {} ...", archive.qualified_table());
    let n_rows = archive.replace(&data)?;
    info!(
        "loaded {} rows and {} columns into {}",
        n_rows,
        data.n_columns(),
        archive.qualified_table()
    );

    Ok(())
}
