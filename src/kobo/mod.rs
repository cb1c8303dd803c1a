use std::error::Error;

use reqwest::blocking::Client;

pub mod asset;
pub mod export;

/// One authenticated GET, body returned as text.  Any non-success status
/// aborts the run; there is no retry.
pub fn get_text(url: &str, username: &str, password: &str) -> Result<String, Box<dyn Error>> {
    let client = Client::new();
    let response = client
        .get(url)
        .basic_auth(username, Some(password))
        .send()?;
    if !response.status().is_success() {
        return Err(Box::from(format!(
            "GET {} failed with status {}",
            url,
            response.status()
        )));
    }
    Ok(response.text()?)
}
