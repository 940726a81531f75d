use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::{Path, PathBuf};

use reqwest::blocking::{Client, Response};
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::auth::ServiceAccountKey;
use super::model::{CellValue, Record, Table};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why the current table could not be fetched.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("data source not configured: {0}")]
    Config(String),
    #[error("reading snapshot: {0}")]
    Io(#[from] std::io::Error),
    #[error("parsing CSV snapshot: {0}")]
    Csv(#[from] csv::Error),
}

// ---------------------------------------------------------------------------
// The fetcher seam
// ---------------------------------------------------------------------------

/// Something that can produce the current raw (un-normalized) table.
pub trait TableFetcher {
    /// Short human-readable description of the source, for logs and the UI.
    fn describe(&self) -> String;

    fn fetch(&self) -> Result<Table, FetchError>;
}

impl<T: TableFetcher + ?Sized> TableFetcher for Box<T> {
    fn describe(&self) -> String {
        (**self).describe()
    }

    fn fetch(&self) -> Result<Table, FetchError> {
        (**self).fetch()
    }
}

// ---------------------------------------------------------------------------
// Remote spreadsheet
// ---------------------------------------------------------------------------

/// URL of the spreadsheet plus the worksheet holding the records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetLocator {
    pub url: String,
    pub worksheet: String,
}

impl SheetLocator {
    /// The spreadsheet id: the path segment after `/d/` in a sheet URL, or
    /// the locator itself when it is already a bare id.
    pub fn spreadsheet_id(&self) -> Result<String, FetchError> {
        let url = self.url.trim();
        let Ok(parsed) = Url::parse(url) else {
            if !url.is_empty() && url.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
                return Ok(url.to_string());
            }
            return Err(FetchError::Config(format!("invalid spreadsheet URL '{url}'")));
        };

        let mut segments = parsed.path_segments().into_iter().flatten();
        while let Some(seg) = segments.next() {
            if seg == "d" {
                if let Some(id) = segments.next().filter(|s| !s.is_empty()) {
                    return Ok(id.to_string());
                }
            }
        }
        Err(FetchError::Config(format!(
            "no spreadsheet id in URL '{url}' (expected .../d/<id>/...)"
        )))
    }
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<JsonValue>>,
}

/// Reads one worksheet through the spreadsheet values API.
pub struct SheetsFetcher {
    client: Client,
    key: ServiceAccountKey,
    locator: SheetLocator,
    api_base: String,
}

impl SheetsFetcher {
    pub fn new(
        key: ServiceAccountKey,
        locator: SheetLocator,
        api_base: impl Into<String>,
    ) -> Result<Self, FetchError> {
        let client = Client::builder().build()?;
        Ok(SheetsFetcher {
            client,
            key,
            locator,
            api_base: api_base.into(),
        })
    }

    fn values_url(&self) -> Result<Url, FetchError> {
        let id = self.locator.spreadsheet_id()?;
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| FetchError::Config(format!("invalid API base '{}': {e}", self.api_base)))?;
        url.path_segments_mut()
            .map_err(|_| FetchError::Config(format!("API base '{}' cannot take a path", self.api_base)))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", id.as_str(), "values", self.locator.worksheet.as_str()]);
        Ok(url)
    }
}

impl TableFetcher for SheetsFetcher {
    fn describe(&self) -> String {
        format!("{} [{}]", self.locator.url, self.locator.worksheet)
    }

    fn fetch(&self) -> Result<Table, FetchError> {
        let url = self.values_url()?;
        let token = self.key.access_token(&self.client)?;

        log::info!("Fetching worksheet '{}'", self.locator.worksheet);
        let resp = self.client.get(url).bearer_auth(token).send()?;
        let resp = check_status(resp, &self.describe())?;

        let range: ValueRange = resp
            .json()
            .map_err(|e| FetchError::Malformed(format!("values response: {e}")))?;
        Ok(table_from_values(range.values))
    }
}

fn check_status(resp: Response, what: &str) -> Result<Response, FetchError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    Err(match status.as_u16() {
        401 | 403 => FetchError::Auth(format!("{what}: {status} {body}")),
        404 => FetchError::NotFound(what.to_string()),
        code => FetchError::Status { status: code, body },
    })
}

/// Shape a values-API payload (header row first) into a table.
pub fn table_from_values(values: Vec<Vec<JsonValue>>) -> Table {
    let mut rows = values.into_iter();
    let Some(header) = rows.next() else {
        return Table::empty();
    };
    let header = header
        .into_iter()
        .map(|v| match v {
            JsonValue::String(s) => s,
            JsonValue::Null => String::new(),
            other => other.to_string(),
        })
        .collect();
    shape(header, rows.map(|row| row.into_iter().map(json_to_cell).collect()))
}

fn json_to_cell(val: JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::text(s),
        JsonValue::Number(n) => n
            .as_f64()
            .map(CellValue::Number)
            .unwrap_or_else(|| CellValue::Text(n.to_string())),
        JsonValue::Bool(b) => CellValue::Bool(b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV snapshot
// ---------------------------------------------------------------------------

/// Reads a CSV export of the worksheet from disk.
#[derive(Debug, Clone)]
pub struct CsvFileFetcher {
    path: PathBuf,
}

impl CsvFileFetcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CsvFileFetcher { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TableFetcher for CsvFileFetcher {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<Table, FetchError> {
        log::info!("Reading snapshot {}", self.path.display());
        let file = std::fs::File::open(&self.path)?;
        table_from_csv(file)
    }
}

/// Parse CSV text (header row = column names) into a table. Every cell is
/// kept as text; numeric coercion is the normalizer's job.
pub fn table_from_csv<R: Read>(reader: R) -> Result<Table, FetchError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let header: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(CellValue::text).collect::<Vec<_>>());
    }
    Ok(shape(header, rows.into_iter()))
}

// ---------------------------------------------------------------------------
// Unconfigured source
// ---------------------------------------------------------------------------

/// Stands in when no usable source is configured; every fetch fails.
#[derive(Debug, Clone)]
pub struct Unavailable {
    pub reason: String,
}

impl TableFetcher for Unavailable {
    fn describe(&self) -> String {
        "no data source".to_string()
    }

    fn fetch(&self) -> Result<Table, FetchError> {
        Err(FetchError::Config(self.reason.clone()))
    }
}

// ---------------------------------------------------------------------------
// Shared row shaping
// ---------------------------------------------------------------------------

/// Turn a header row plus positional rows into keyed records.
///
/// Blank headers become `Unnamed: <index>`, repeated headers get the first
/// free `.N` suffix, and short rows are padded with `Null`. A row wider than
/// the header (the values API trims trailing blank header cells) adds
/// `Unnamed: <index>` columns so no cell is lost.
fn shape(mut header: Vec<String>, rows: impl Iterator<Item = Vec<CellValue>>) -> Table {
    let rows: Vec<Vec<CellValue>> = rows.collect();
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    if width > header.len() {
        log::debug!(
            "Rows are wider than the header; adding {} unnamed columns",
            width - header.len()
        );
        header.resize(width, String::new());
    }
    let columns = column_names(header);

    let records = rows
        .into_iter()
        .map(|cells| {
            let mut cells = cells.into_iter();
            let fields: BTreeMap<String, CellValue> = columns
                .iter()
                .map(|c| (c.clone(), cells.next().unwrap_or(CellValue::Null)))
                .collect();
            Record::new(fields)
        })
        .collect();

    Table::new(columns, records)
}

fn column_names(header: Vec<String>) -> Vec<String> {
    let mut used: BTreeSet<String> = BTreeSet::new();
    header
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let name = name.trim().to_string();
            let base = if name.is_empty() {
                format!("Unnamed: {i}")
            } else {
                name
            };
            let mut candidate = base.clone();
            let mut n = 0usize;
            while used.contains(&candidate) {
                n += 1;
                candidate = format!("{base}.{n}");
            }
            used.insert(candidate.clone());
            candidate
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn locator(url: &str) -> SheetLocator {
        SheetLocator {
            url: url.to_string(),
            worksheet: "Sheet1".to_string(),
        }
    }

    #[test]
    fn spreadsheet_id_from_edit_url() {
        let loc = locator("https://docs.google.com/spreadsheets/d/1AbC-xyz_9/edit#gid=0");
        assert_eq!(loc.spreadsheet_id().unwrap(), "1AbC-xyz_9");
    }

    #[test]
    fn bare_id_is_accepted() {
        assert_eq!(locator("1AbC-xyz_9").spreadsheet_id().unwrap(), "1AbC-xyz_9");
    }

    #[test]
    fn url_without_id_is_a_config_error() {
        let err = locator("https://docs.google.com/spreadsheets/").spreadsheet_id().unwrap_err();
        assert!(matches!(err, FetchError::Config(_)));
        let err = locator("not a url/at all").spreadsheet_id().unwrap_err();
        assert!(matches!(err, FetchError::Config(_)));
    }

    #[test]
    fn values_url_encodes_worksheet_name() {
        let fetcher = SheetsFetcher::new(
            ServiceAccountKey {
                client_email: "reader@example.com".into(),
                private_key: String::new(),
                private_key_id: None,
                token_uri: "https://oauth2.example.com/token".into(),
            },
            SheetLocator {
                url: "https://docs.google.com/spreadsheets/d/abc/edit".into(),
                worksheet: "論文 清單".into(),
            },
            "https://sheets.example.com/",
        )
        .unwrap();
        let url = fetcher.values_url().unwrap();
        assert!(url
            .as_str()
            .starts_with("https://sheets.example.com/v4/spreadsheets/abc/values/"));
        assert!(!url.as_str().contains(' '));
    }

    #[test]
    fn values_payload_becomes_table() {
        let table = table_from_values(vec![
            vec![json!("論文名稱"), json!("研究生"), json!("論文出版年")],
            vec![json!("Ship Routing"), json!("Chen"), json!(2019)],
            vec![json!("Port Logistics")],
            vec![json!(""), json!("Wu"), json!("2021"), json!("extra")],
        ]);
        assert_eq!(
            table.columns,
            vec!["論文名稱", "研究生", "論文出版年", "Unnamed: 3"]
        );
        assert_eq!(table.len(), 3);
        assert_eq!(table.records[0].get("論文出版年"), &CellValue::Number(2019.0));
        assert_eq!(table.records[1].get("研究生"), &CellValue::Null);
        assert_eq!(table.records[2].get("論文名稱"), &CellValue::Null);
        assert_eq!(table.records[2].get("論文出版年"), &CellValue::text("2021"));
        assert_eq!(table.records[2].get("Unnamed: 3"), &CellValue::text("extra"));
        assert_eq!(table.records[0].get("Unnamed: 3"), &CellValue::Null);
    }

    #[test]
    fn cells_past_a_trimmed_header_get_unnamed_columns() {
        let table = table_from_values(vec![
            vec![json!("論文名稱"), json!("研究生")],
            vec![json!("Ship Routing"), json!("Chen"), json!("note under blank header")],
        ]);
        assert_eq!(table.columns, vec!["論文名稱", "研究生", "Unnamed: 2"]);
        assert_eq!(
            table.records[0].get("Unnamed: 2"),
            &CellValue::text("note under blank header")
        );
        assert!(table.records.iter().all(|r| r.fields.len() == table.columns.len()));
    }

    #[test]
    fn wide_csv_rows_keep_every_cell() {
        let data = "論文名稱,研究生\nShip Routing,Chen,108\n";
        let table = table_from_csv(data.as_bytes()).unwrap();
        assert_eq!(table.columns, vec!["論文名稱", "研究生", "Unnamed: 2"]);
        assert_eq!(table.records[0].get("Unnamed: 2"), &CellValue::text("108"));
    }

    #[test]
    fn empty_payload_is_empty_table() {
        assert_eq!(table_from_values(Vec::new()), Table::empty());
    }

    #[test]
    fn blank_and_repeated_headers_get_names() {
        let names = column_names(vec!["備註".into(), "".into(), "備註".into()]);
        assert_eq!(names, vec!["備註", "Unnamed: 1", "備註.1"]);
    }

    #[test]
    fn dedup_suffix_skips_names_already_in_the_header() {
        let names = column_names(vec!["備註".into(), "備註".into(), "備註.1".into()]);
        assert_eq!(names, vec!["備註", "備註.1", "備註.1.1"]);

        let table = table_from_values(vec![
            vec![json!("備註"), json!("備註"), json!("備註.1")],
            vec![json!("x"), json!("y"), json!("z")],
        ]);
        let unique: BTreeSet<&String> = table.columns.iter().collect();
        assert_eq!(unique.len(), 3);
        assert_eq!(table.records[0].fields.len(), 3);
        assert_eq!(table.records[0].get("備註.1"), &CellValue::text("y"));
        assert_eq!(table.records[0].get("備註.1.1"), &CellValue::text("z"));
    }

    #[test]
    fn csv_snapshot_parses_header_and_rows() {
        let data = "論文名稱,研究生,畢業年度\nShip Routing,Chen,108\nPort Logistics,Wu\n";
        let table = table_from_csv(data.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records[0].get("畢業年度"), &CellValue::text("108"));
        assert_eq!(table.records[1].get("畢業年度"), &CellValue::Null);
    }

    #[test]
    fn csv_file_fetcher_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "論文名稱,研究生").unwrap();
        writeln!(file, "Ship Routing,Chen").unwrap();
        let fetcher = CsvFileFetcher::new(file.path());
        let table = fetcher.fetch().unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn missing_csv_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CsvFileFetcher::new(dir.path().join("missing.csv"))
            .fetch()
            .unwrap_err();
        assert!(matches!(err, FetchError::Io(_)));
    }

    #[test]
    fn unavailable_source_always_fails() {
        let f = Unavailable {
            reason: "no config".into(),
        };
        assert!(matches!(f.fetch(), Err(FetchError::Config(_))));
    }
}
