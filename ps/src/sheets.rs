//! Google Sheets v4 backend
//!
//! Implements RowStore on top of a single worksheet of a spreadsheet. The
//! first row of the worksheet is the header; every other row is a plan entry.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::auth::{ServiceAccountKey, TokenProvider};
use crate::{COLUMNS, PlanEntry, Record, RowStore, StoreError};

/// Default Sheets API base URL
pub const DEFAULT_API_URL: &str = "https://sheets.googleapis.com";

/// Default worksheet name
pub const DEFAULT_WORKSHEET: &str = "Plans";

/// Size of a newly created worksheet
const NEW_SHEET_ROWS: u32 = 1000;
const NEW_SHEET_COLS: u32 = 10;

/// Connection settings for the Sheets backend
#[derive(Debug, Clone)]
pub struct SheetsOptions {
    /// Spreadsheet (document) identifier
    pub sheet_id: String,
    /// Worksheet (tab) holding the rows
    pub worksheet: String,
    /// API base URL
    pub api_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl SheetsOptions {
    pub fn new(sheet_id: impl Into<String>) -> Self {
        Self {
            sheet_id: sheet_id.into(),
            worksheet: DEFAULT_WORKSHEET.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SpreadsheetResponse {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRangeResponse {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Sheets API client bound to one worksheet
pub struct SheetsClient {
    options: SheetsOptions,
    base: Url,
    http: Client,
    tokens: TokenProvider,
}

impl SheetsClient {
    /// Create a client from options and service-account credentials
    pub fn new(options: SheetsOptions, key: ServiceAccountKey) -> Result<Self, StoreError> {
        debug!(sheet_id = %options.sheet_id, worksheet = %options.worksheet, "SheetsClient::new: called");
        let base = Url::parse(&options.api_url)
            .map_err(|e| StoreError::InvalidResponse(format!("Invalid API URL '{}': {}", options.api_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(StoreError::InvalidResponse(format!(
                "Invalid API URL '{}': not a base URL",
                options.api_url
            )));
        }

        let http = Client::builder().timeout(options.timeout).build()?;
        let tokens = TokenProvider::new(key, http.clone());

        Ok(Self {
            options,
            base,
            http,
            tokens,
        })
    }

    /// Service account the spreadsheet has to be shared with
    pub fn client_email(&self) -> &str {
        self.tokens.client_email()
    }

    fn endpoint(&self, tail: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidResponse(format!("Invalid API URL '{}'", self.options.api_url)))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets"])
            .extend(tail);
        Ok(url)
    }

    /// A1 range covering the whole worksheet
    fn sheet_range(&self) -> String {
        format!("'{}'", self.options.worksheet.replace('\'', "''"))
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, StoreError> {
        let token = self.tokens.access_token().await?;
        let response = request.bearer_auth(token).send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), "execute: API error");
            return Err(StoreError::ApiError {
                status: status.as_u16(),
                message: text,
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| StoreError::InvalidResponse(format!("HTTP {}: {}", status.as_u16(), e)))
    }

    async fn worksheet_titles(&self) -> Result<Vec<String>, StoreError> {
        let url = self.endpoint(&[self.options.sheet_id.as_str()])?;
        let request = self.http.get(url).query(&[("fields", "sheets.properties.title")]);
        let spreadsheet: SpreadsheetResponse = self.execute(request).await?;
        Ok(spreadsheet.sheets.into_iter().map(|s| s.properties.title).collect())
    }

    async fn add_worksheet(&self) -> Result<(), StoreError> {
        let target = format!("{}:batchUpdate", self.options.sheet_id);
        let url = self.endpoint(&[target.as_str()])?;
        let body = json!({
            "requests": [{
                "addSheet": {
                    "properties": {
                        "title": self.options.worksheet,
                        "gridProperties": {
                            "rowCount": NEW_SHEET_ROWS,
                            "columnCount": NEW_SHEET_COLS,
                        }
                    }
                }
            }]
        });
        let _: Value = self.execute(self.http.post(url).json(&body)).await?;
        Ok(())
    }

    async fn read_values(&self, range: &str) -> Result<Vec<Vec<Value>>, StoreError> {
        let url = self.endpoint(&[self.options.sheet_id.as_str(), "values", range])?;
        let response: ValueRangeResponse = self.execute(self.http.get(url)).await?;
        Ok(response.values)
    }

    /// Whether the first row of the worksheet has any non-empty cell
    async fn has_header(&self) -> Result<bool, StoreError> {
        let range = format!("{}!1:1", self.sheet_range());
        let values = self.read_values(&range).await?;
        Ok(values
            .first()
            .is_some_and(|row| row.iter().any(|cell| !cell_text(cell).trim().is_empty())))
    }

    async fn append_row(&self, row: Vec<String>) -> Result<(), StoreError> {
        let range = format!("{}!A1:append", self.sheet_range());
        let url = self.endpoint(&[self.options.sheet_id.as_str(), "values", range.as_str()])?;
        let request = self
            .http
            .post(url)
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .json(&json!({ "values": [row] }));
        let _: Value = self.execute(request).await?;
        Ok(())
    }
}

/// Render a cell the way it reads in the sheet
fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Turn raw worksheet values into header-keyed records
///
/// The first row is the header. Rows with no non-empty cell are skipped.
pub fn rows_to_records(values: &[Vec<Value>]) -> Vec<Record> {
    let Some((header, rows)) = values.split_first() else {
        return Vec::new();
    };
    let header: Vec<String> = header.iter().map(cell_text).collect();

    rows.iter()
        .map(|row| row.iter().map(cell_text).collect::<Vec<_>>())
        .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
        .map(|row| Record::from_row(&header, &row))
        .collect()
}

#[async_trait]
impl RowStore for SheetsClient {
    async fn ensure_table(&self) -> Result<(), StoreError> {
        debug!(worksheet = %self.options.worksheet, "ensure_table: called");
        let titles = self.worksheet_titles().await?;
        if titles.iter().any(|t| t == &self.options.worksheet) {
            if self.has_header().await? {
                debug!("ensure_table: worksheet and header exist");
                return Ok(());
            }
            info!(worksheet = %self.options.worksheet, "Worksheet has no header row, writing it");
        } else {
            info!(worksheet = %self.options.worksheet, "Worksheet not found, creating it");
            self.add_worksheet().await?;
        }

        self.append_row(COLUMNS.iter().map(|c| c.to_string()).collect()).await?;
        Ok(())
    }

    async fn append(&self, entry: &PlanEntry) -> Result<(), StoreError> {
        debug!(date = %entry.date(), class = %entry.class(), "append: called");
        self.append_row(entry.to_row()).await
    }

    async fn fetch_all(&self) -> Result<Vec<Record>, StoreError> {
        debug!("fetch_all: called");
        let values = self.read_values(&self.sheet_range()).await?;
        let records = rows_to_records(&values);
        debug!(count = records.len(), "fetch_all: fetched records");
        Ok(records)
    }
}
