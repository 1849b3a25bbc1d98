pub mod client;

pub use client::*;

use crate::error::{Result, TrackerError};
use crate::store::TabularStore;
use log::debug;

pub const DEFAULT_WORKSHEET: &str = "Sheet1";

/// A Google Sheets worksheet used as the session store.
#[derive(Clone)]
pub struct SheetsStore {
    client: SheetsClient,
    spreadsheet_id: String,
    worksheet: String,
}

impl SheetsStore {
    pub fn new(client: SheetsClient, spreadsheet_id: String, worksheet: String) -> Self {
        Self {
            client,
            spreadsheet_id,
            worksheet,
        }
    }

    /// Builds a store from a spreadsheet URL (or bare id) and an access token.
    pub fn from_url(url: &str, worksheet: &str, access_token: String) -> Result<Self> {
        let spreadsheet_id = parse_spreadsheet_id(url).ok_or_else(|| {
            TrackerError::InvalidConfig(format!("Not a spreadsheet URL or id: {}", url))
        })?;
        Ok(Self::new(
            SheetsClient::new(access_token),
            spreadsheet_id,
            worksheet.to_string(),
        ))
    }
}

impl TabularStore for SheetsStore {
    fn locator(&self) -> String {
        format!("sheets:{}/{}", self.spreadsheet_id, self.worksheet)
    }

    fn read_all(&self) -> Result<Vec<Vec<String>>> {
        let rows = self.client.get_values(&self.spreadsheet_id, &self.worksheet)?;
        debug!("Read {} rows from {}", rows.len(), self.locator());
        Ok(rows)
    }

    fn append_row(&mut self, row: &[String]) -> Result<()> {
        self.client
            .append_values(&self.spreadsheet_id, &self.worksheet, &[row.to_vec()])
    }

    fn overwrite_all(&mut self, rows: &[Vec<String>]) -> Result<()> {
        self.client
            .clear_values(&self.spreadsheet_id, &self.worksheet)?;
        self.client
            .update_values(&self.spreadsheet_id, &self.worksheet, rows)
    }
}

/// Pulls the spreadsheet id out of `https://docs.google.com/spreadsheets/d/{id}/edit...`;
/// a bare id is accepted as is.
pub fn parse_spreadsheet_id(locator: &str) -> Option<String> {
    let locator = locator.trim();
    let candidate = match locator.split_once("/d/") {
        Some((_, rest)) => rest.split(['/', '?', '#']).next().unwrap_or(""),
        None if locator.contains('/') => return None,
        None => locator,
    };

    let valid = !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    valid.then(|| candidate.to_string())
}
