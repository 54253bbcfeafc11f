use super::rate_limit::{RateLimitPolicy, send_with_rate_limit};
use super::{
    Dimension, DriveFile, DriveFilePage, FileQuery, SheetProperties, SpreadsheetBackend,
    SpreadsheetMeta,
};
use crate::error::{ConnectorError, ConnectorResult};
use crate::grid::{ValueGrid, grid_from_json};
use crate::metrics::METRICS;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::{Duration, Instant};

pub const DEFAULT_SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4/";
pub const DEFAULT_DRIVE_BASE_URL: &str = "https://www.googleapis.com/drive/v3/";

const DRIVE_FILE_FIELDS: &str = "id,name,mimeType,parents,webViewLink,trashed,shortcutDetails";
const SPREADSHEET_FIELDS: &str = "spreadsheetId,spreadsheetUrl,properties.title,sheets.properties";
const LIST_PAGE_SIZE: &str = "1000";

/// Connection settings for [`GoogleApiClient`].
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub access_token: String,
    pub sheets_base_url: String,
    pub drive_base_url: String,
    pub timeout: Duration,
    pub rate_limit: RateLimitPolicy,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            sheets_base_url: DEFAULT_SHEETS_BASE_URL.to_string(),
            drive_base_url: DEFAULT_DRIVE_BASE_URL.to_string(),
            timeout: Duration::from_secs(300),
            rate_limit: RateLimitPolicy::default(),
        }
    }
}

/// Sheets v4 and Drive v3 over HTTPS with a bearer token.
#[derive(Debug, Clone)]
pub struct GoogleApiClient {
    client: Client,
    access_token: String,
    sheets_base: Url,
    drive_base: Url,
    rate_limit: RateLimitPolicy,
}

impl GoogleApiClient {
    pub fn new(settings: ClientSettings) -> ConnectorResult<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| ConnectorError::application(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            access_token: settings.access_token,
            sheets_base: parse_base_url(&settings.sheets_base_url)?,
            drive_base: parse_base_url(&settings.drive_base_url)?,
            rate_limit: settings.rate_limit,
        })
    }

    fn sheets_url(&self, segments: &[&str]) -> ConnectorResult<Url> {
        endpoint(&self.sheets_base, segments)
    }

    fn drive_url(&self, segments: &[&str]) -> ConnectorResult<Url> {
        endpoint(&self.drive_base, segments)
    }

    async fn send<F>(&self, operation: &'static str, build: F) -> ConnectorResult<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let started = Instant::now();
        let response = send_with_rate_limit(&self.rate_limit, operation, || {
            build().bearer_auth(&self.access_token).send()
        })
        .await
        .map_err(|e| {
            METRICS.record_remote_call(operation, 0, started.elapsed());
            ConnectorError::Transport(format!("{operation} request failed: {e}"))
        })?;

        let status = response.status();
        METRICS.record_remote_call(operation, status.as_u16(), started.elapsed());
        tracing::debug!(
            operation,
            url = %response.url(),
            status = status.as_u16(),
            "remote call completed"
        );
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(remote_error(status.as_u16(), &body))
    }

    async fn send_json<T, F>(&self, operation: &'static str, build: F) -> ConnectorResult<T>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let response = self.send(operation, build).await?;
        response.json::<T>().await.map_err(|e| {
            ConnectorError::application(format!("failed to decode {operation} response: {e}"))
        })
    }

    async fn send_bytes<F>(&self, operation: &'static str, build: F) -> ConnectorResult<Vec<u8>>
    where
        F: Fn() -> RequestBuilder,
    {
        let response = self.send(operation, build).await?;
        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| ConnectorError::Transport(format!("{operation} body read failed: {e}")))
    }

    async fn batch_update(&self, spreadsheet_id: &str, requests: Value) -> ConnectorResult<BatchUpdateResponse> {
        let url = self.sheets_url(&["spreadsheets", &format!("{spreadsheet_id}:batchUpdate")])?;
        let body = json!({ "requests": requests });
        self.send_json("batch_update", || self.client.post(url.clone()).json(&body))
            .await
    }
}

#[async_trait]
impl SpreadsheetBackend for GoogleApiClient {
    async fn get_values(&self, spreadsheet_id: &str, range: &str) -> ConnectorResult<ValueGrid> {
        let url = self.sheets_url(&["spreadsheets", spreadsheet_id, "values", range])?;
        let body: ValueRange = self
            .send_json("get_values", || {
                self.client
                    .get(url.clone())
                    .query(&[("valueRenderOption", "FORMATTED_VALUE")])
            })
            .await?;
        Ok(grid_from_json(&body.values))
    }

    async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: ValueGrid,
        dimension: Dimension,
    ) -> ConnectorResult<ValueGrid> {
        let url = self.sheets_url(&["spreadsheets", spreadsheet_id, "values", range])?;
        let body = json!({
            "range": range,
            "majorDimension": dimension.as_str(),
            "values": values,
        });
        let response: UpdateValuesResponse = self
            .send_json("update_values", || {
                self.client
                    .put(url.clone())
                    .query(&[
                        ("valueInputOption", "USER_ENTERED"),
                        ("includeValuesInResponse", "true"),
                        ("responseValueRenderOption", "FORMATTED_VALUE"),
                    ])
                    .json(&body)
            })
            .await?;
        Ok(response
            .updated_data
            .map(|data| grid_from_json(&data.values))
            .unwrap_or_default())
    }

    async fn clear_values(&self, spreadsheet_id: &str, range: &str) -> ConnectorResult<()> {
        let url = self.sheets_url(&["spreadsheets", spreadsheet_id, "values", &format!("{range}:clear")])?;
        self.send("clear_values", || self.client.post(url.clone()).json(&json!({})))
            .await?;
        Ok(())
    }

    async fn get_spreadsheet(&self, spreadsheet_id: &str) -> ConnectorResult<SpreadsheetMeta> {
        let url = self.sheets_url(&["spreadsheets", spreadsheet_id])?;
        let body: SpreadsheetResource = self
            .send_json("get_spreadsheet", || {
                self.client.get(url.clone()).query(&[("fields", SPREADSHEET_FIELDS)])
            })
            .await?;
        Ok(body.into())
    }

    async fn add_sheet(&self, spreadsheet_id: &str, title: &str) -> ConnectorResult<SheetProperties> {
        let response = self
            .batch_update(
                spreadsheet_id,
                json!([{ "addSheet": { "properties": { "title": title } } }]),
            )
            .await?;
        response
            .replies
            .into_iter()
            .find_map(|reply| reply.add_sheet)
            .map(|added| added.properties.into())
            .ok_or_else(|| ConnectorError::application("add sheet response did not include the new sheet"))
    }

    async fn delete_sheet(&self, spreadsheet_id: &str, sheet_id: i64) -> ConnectorResult<()> {
        self.batch_update(spreadsheet_id, json!([{ "deleteSheet": { "sheetId": sheet_id } }]))
            .await?;
        Ok(())
    }

    async fn append_rows(&self, spreadsheet_id: &str, sheet_id: i64, count: u32) -> ConnectorResult<()> {
        self.batch_update(
            spreadsheet_id,
            json!([{
                "appendDimension": {
                    "sheetId": sheet_id,
                    "dimension": "ROWS",
                    "length": count,
                }
            }]),
        )
        .await?;
        Ok(())
    }

    async fn create_spreadsheet(
        &self,
        title: &str,
        initial_sheet: Option<&str>,
    ) -> ConnectorResult<SpreadsheetMeta> {
        let url = self.sheets_url(&["spreadsheets"])?;
        let mut body = json!({ "properties": { "title": title } });
        if let Some(sheet) = initial_sheet {
            body["sheets"] = json!([{ "properties": { "title": sheet } }]);
        }
        let created: SpreadsheetResource = self
            .send_json("create_spreadsheet", || self.client.post(url.clone()).json(&body))
            .await?;
        Ok(created.into())
    }

    async fn get_file(&self, file_id: &str) -> ConnectorResult<DriveFile> {
        let url = self.drive_url(&["files", file_id])?;
        self.send_json("get_file", || {
            self.client.get(url.clone()).query(&[
                ("fields", DRIVE_FILE_FIELDS),
                ("supportsAllDrives", "true"),
            ])
        })
        .await
    }

    async fn move_file(&self, file_id: &str, new_parent: &str) -> ConnectorResult<DriveFile> {
        let current = self.get_file(file_id).await?;
        let remove = current.parents.join(",");
        let url = self.drive_url(&["files", file_id])?;
        self.send_json("move_file", || {
            self.client
                .patch(url.clone())
                .query(&[
                    ("addParents", new_parent),
                    ("removeParents", remove.as_str()),
                    ("fields", DRIVE_FILE_FIELDS),
                    ("supportsAllDrives", "true"),
                ])
                .json(&json!({}))
        })
        .await
    }

    async fn list_files(
        &self,
        query: &FileQuery,
        page_token: Option<&str>,
    ) -> ConnectorResult<DriveFilePage> {
        let url = self.drive_url(&["files"])?;
        let q = query.to_drive_query();
        let fields = format!("nextPageToken,files({DRIVE_FILE_FIELDS})");
        let mut params = vec![
            ("q", q.as_str()),
            ("fields", fields.as_str()),
            ("pageSize", LIST_PAGE_SIZE),
            ("supportsAllDrives", "true"),
            ("includeItemsFromAllDrives", "true"),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }
        let page: FileList = self
            .send_json("list_files", || self.client.get(url.clone()).query(&params))
            .await?;
        Ok(DriveFilePage {
            files: page.files,
            next_page_token: page.next_page_token.filter(|t| !t.is_empty()),
        })
    }

    async fn export_file(&self, file_id: &str, mime_type: &str) -> ConnectorResult<Vec<u8>> {
        let url = self.drive_url(&["files", file_id, "export"])?;
        self.send_bytes("export_file", || {
            self.client.get(url.clone()).query(&[("mimeType", mime_type)])
        })
        .await
    }

    async fn download_file(&self, file_id: &str) -> ConnectorResult<Vec<u8>> {
        let url = self.drive_url(&["files", file_id])?;
        self.send_bytes("download_file", || {
            self.client
                .get(url.clone())
                .query(&[("alt", "media"), ("supportsAllDrives", "true")])
        })
        .await
    }
}

fn parse_base_url(raw: &str) -> ConnectorResult<Url> {
    let url = Url::parse(raw)
        .map_err(|e| ConnectorError::misconfiguration(format!("invalid API base URL '{raw}': {e}")))?;
    if url.cannot_be_a_base() {
        return Err(ConnectorError::misconfiguration(format!(
            "API base URL '{raw}' cannot carry a path"
        )));
    }
    Ok(url)
}

/// Append percent-encoded path segments to a base URL.
pub fn endpoint(base: &Url, segments: &[&str]) -> ConnectorResult<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ConnectorError::misconfiguration(format!("API base URL '{base}' cannot carry a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Turn an error response into [`ConnectorError::Remote`], preferring the
/// message from a Google JSON error body.
pub fn remote_error(status: u16, body: &str) -> ConnectorError {
    let message = serde_json::from_str::<GoogleErrorBody>(body)
        .ok()
        .map(|parsed| parsed.error.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "no details returned".to_string()
            } else {
                trimmed.to_string()
            }
        });
    ConnectorError::Remote { status, message }
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: GoogleErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorDetail {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Default, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateValuesResponse {
    #[serde(default)]
    updated_data: Option<ValueRange>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GridProperties {
    #[serde(default)]
    row_count: u32,
    #[serde(default)]
    column_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetPropertiesResource {
    #[serde(default)]
    sheet_id: i64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    index: u32,
    #[serde(default)]
    sheet_type: Option<String>,
    #[serde(default)]
    grid_properties: GridProperties,
}

impl From<SheetPropertiesResource> for SheetProperties {
    fn from(value: SheetPropertiesResource) -> Self {
        Self {
            sheet_id: value.sheet_id,
            title: value.title,
            index: value.index,
            sheet_type: value.sheet_type.unwrap_or_else(|| "GRID".to_string()),
            row_count: value.grid_properties.row_count,
            column_count: value.grid_properties.column_count,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SheetResource {
    properties: SheetPropertiesResource,
}

#[derive(Debug, Default, Deserialize)]
struct SpreadsheetProperties {
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpreadsheetResource {
    spreadsheet_id: String,
    #[serde(default)]
    spreadsheet_url: Option<String>,
    #[serde(default)]
    properties: SpreadsheetProperties,
    #[serde(default)]
    sheets: Vec<SheetResource>,
}

impl From<SpreadsheetResource> for SpreadsheetMeta {
    fn from(value: SpreadsheetResource) -> Self {
        Self {
            id: value.spreadsheet_id,
            title: value.properties.title,
            url: value.spreadsheet_url,
            sheets: value.sheets.into_iter().map(|s| s.properties.into()).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchUpdateResponse {
    #[serde(default)]
    replies: Vec<BatchReply>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchReply {
    #[serde(default)]
    add_sheet: Option<SheetResource>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_encoded_endpoints() {
        let base = Url::parse(DEFAULT_SHEETS_BASE_URL).unwrap();
        let url = endpoint(&base, &["spreadsheets", "abc", "values", "My Sheet!A1:B2"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc/values/My%20Sheet!A1:B2"
        );

        let base = Url::parse("http://127.0.0.1:9000/drive").unwrap();
        let url = endpoint(&base, &["files", "x/y"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/drive/files/x%2Fy");
    }

    #[test]
    fn rejects_unusable_base_urls() {
        assert!(parse_base_url("not a url").is_err());
        assert!(parse_base_url("mailto:someone@example.com").is_err());
        assert!(parse_base_url(DEFAULT_DRIVE_BASE_URL).is_ok());
    }

    #[test]
    fn extracts_google_error_message() {
        let body = r#"{"error":{"code":400,"message":"Unable to parse range: Nope!A1","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(
            remote_error(400, body),
            ConnectorError::Remote {
                status: 400,
                message: "Unable to parse range: Nope!A1".into()
            }
        );
        assert_eq!(
            remote_error(502, "  bad gateway "),
            ConnectorError::Remote {
                status: 502,
                message: "bad gateway".into()
            }
        );
    }

    #[test]
    fn decodes_spreadsheet_resource() {
        let body = json!({
            "spreadsheetId": "s1",
            "spreadsheetUrl": "https://docs.google.com/spreadsheets/d/s1/edit",
            "properties": { "title": "Budget" },
            "sheets": [{
                "properties": {
                    "sheetId": 7,
                    "title": "Data",
                    "index": 0,
                    "sheetType": "GRID",
                    "gridProperties": { "rowCount": 1000, "columnCount": 26 }
                }
            }]
        });
        let resource: SpreadsheetResource = serde_json::from_value(body).unwrap();
        let meta = SpreadsheetMeta::from(resource);
        assert_eq!(meta.title, "Budget");
        let sheet = meta.sheet("Data").unwrap();
        assert_eq!(sheet.sheet_id, 7);
        assert_eq!(sheet.row_count, 1000);
    }

    #[test]
    fn decodes_sparse_value_range() {
        let body = json!({ "range": "Data!A1:C3", "values": [["a", null, 1], [], ["b"]] });
        let range: ValueRange = serde_json::from_value(body).unwrap();
        let grid = grid_from_json(&range.values);
        assert_eq!(grid[0], vec!["a", "", "1"]);
        assert!(grid[1].is_empty());
    }
}
