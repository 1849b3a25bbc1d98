use crate::error::{Result, TrackerError};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;

const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4";

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Minimal client for the Google Sheets `values` endpoints.
///
/// Authentication is a bearer token minted by the deployment (service account or OAuth);
/// this client never refreshes it.
#[derive(Clone)]
pub struct SheetsClient {
    client: Client,
    access_token: String,
    base_url: String,
}

impl SheetsClient {
    pub fn new(access_token: String) -> Self {
        Self {
            client: Client::new(),
            access_token,
            base_url: SHEETS_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Every row of `range`, cells rendered as text.
    pub fn get_values(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<Vec<String>>> {
        let url = self.values_url(spreadsheet_id, range, None)?;
        let response = self
            .authorized(self.client.get(url).query(&[("majorDimension", "ROWS")]))
            .send()
            .map_err(|e| TrackerError::StoreUnavailable(format!("Sheets read failed: {}", e)))?;

        let response = check_status(response, TrackerError::StoreUnavailable)?;
        let body: ValueRange = response
            .json()
            .map_err(|e| TrackerError::StoreUnavailable(format!("Sheets response: {}", e)))?;

        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    /// Cells are written `RAW`: the sheet stores the text as sent and never parses it.
    pub fn append_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        rows: &[Vec<String>],
    ) -> Result<()> {
        let url = self.values_url(spreadsheet_id, range, Some("append"))?;
        let request = self
            .client
            .post(url)
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&json!({ "majorDimension": "ROWS", "values": rows }));
        self.send_write(request)
    }

    pub fn clear_values(&self, spreadsheet_id: &str, range: &str) -> Result<()> {
        let url = self.values_url(spreadsheet_id, range, Some("clear"))?;
        self.send_write(self.client.post(url).json(&json!({})))
    }

    pub fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        rows: &[Vec<String>],
    ) -> Result<()> {
        let url = self.values_url(spreadsheet_id, range, None)?;
        let request = self
            .client
            .put(url)
            .query(&[("valueInputOption", "RAW")])
            .json(&json!({ "range": range, "majorDimension": "ROWS", "values": rows }));
        self.send_write(request)
    }

    fn send_write(&self, request: RequestBuilder) -> Result<()> {
        let response = self
            .authorized(request)
            .send()
            .map_err(|e| TrackerError::StoreWrite(format!("Sheets write failed: {}", e)))?;
        check_status(response, TrackerError::StoreWrite)?;
        Ok(())
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.access_token)
    }

    fn values_url(&self, spreadsheet_id: &str, range: &str, action: Option<&str>) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| TrackerError::InvalidConfig(format!("Sheets base URL: {}", e)))?;

        let last = match action {
            Some(action) => format!("{}:{}", range, action),
            None => range.to_string(),
        };
        url.path_segments_mut()
            .map_err(|_| TrackerError::InvalidConfig("Sheets base URL cannot be a base".to_string()))?
            .extend(["spreadsheets", spreadsheet_id, "values", last.as_str()]);
        Ok(url)
    }
}

fn check_status(response: Response, error: fn(String) -> TrackerError) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(error(format!("Sheets API returned {}: {}", status, body)))
}

fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_url_encodes_range() {
        let client = SheetsClient::new("token".to_string());
        let url = client
            .values_url("abc123", "Training Log", Some("append"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc123/values/Training%20Log:append"
        );
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(json!("18.2")), "18.2");
        assert_eq!(cell_text(json!(18.2)), "18.2");
        assert_eq!(cell_text(serde_json::Value::Null), "");
    }
}
