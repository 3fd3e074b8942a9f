//! Fixed-width request log files
//!
//! Each `FileLog` appends one row per matching call:
//!
//! ```text
//! DATETIME                METHOD    URL                                             DATA ...
//! 2019-06-01 08:00:00     GET       https://api.vec2.design/profile/bob             [] ...
//! ```
//!
//! Columns are `DATETIME` (24), `METHOD` (10), `URL` (48) and 96 for each
//! subscribed field, each including 4 trailing spaces. Longer values wrap
//! onto new lines. The header row is written when the file is missing or
//! empty.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use vec2_transport::Method;

const PAD: usize = 4;
const DATETIME_WIDTH: usize = 24;
const METHOD_WIDTH: usize = 10;
const URL_WIDTH: usize = 48;
const FIELD_WIDTH: usize = 96;

/// Optional content recorded after the fixed columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogField {
    /// Request data: form fields and attachments, `[]` when data went to the query string.
    Data,
    /// Response headers.
    Headers,
    /// Response body.
    Response,
}

impl LogField {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogField::Data => "data",
            LogField::Headers => "headers",
            LogField::Response => "response",
        }
    }
}

impl FromStr for LogField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "data" => Ok(LogField::Data),
            "headers" => Ok(LogField::Headers),
            "response" => Ok(LogField::Response),
            other => Err(format!("unknown log field: {other}")),
        }
    }
}

/// Decides whether a call is logged: `(method, url, request data, auth endpoint)`.
pub type LogPredicate = Arc<dyn Fn(&Method, &str, &Value, bool) -> bool + Send + Sync>;

/// Everything a call can contribute to a log row.
#[derive(Debug, Clone, Default)]
pub struct LogParams {
    pub data: Value,
    pub headers: Value,
    pub response: String,
}

impl LogParams {
    fn render(&self, field: LogField) -> String {
        match field {
            LogField::Data => self.data.to_string(),
            LogField::Headers => self.headers.to_string(),
            LogField::Response => self.response.clone(),
        }
    }
}

#[derive(Clone)]
pub struct FileLog {
    path: PathBuf,
    fields: Vec<LogField>,
    predicate: Option<LogPredicate>,
}

impl fmt::Debug for FileLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileLog")
            .field("path", &self.path)
            .field("fields", &self.fields)
            .field("predicate", &self.predicate.is_some())
            .finish()
    }
}

impl FileLog {
    /// Log every call to `path`, recording `fields` in sorted order.
    pub fn new(path: impl Into<PathBuf>, fields: impl IntoIterator<Item = LogField>) -> Self {
        let mut fields: Vec<LogField> = fields.into_iter().collect();
        fields.sort();
        fields.dedup();
        Self {
            path: path.into(),
            fields,
            predicate: None,
        }
    }

    /// Only log calls for which `predicate` returns true.
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Method, &str, &Value, bool) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn fields(&self) -> &[LogField] {
        &self.fields
    }

    /// True when no predicate is set or the predicate accepts the call.
    pub fn matches(&self, method: &Method, url: &str, data: &Value, auth_endpoint: bool) -> bool {
        self.predicate
            .as_ref()
            .is_none_or(|p| p(method, url, data, auth_endpoint))
    }

    /// Append one row, preceded by the header row if the file is new.
    pub async fn log(&self, method: &Method, url: &str, params: &LogParams) -> std::io::Result<()> {
        let mut row = column(&Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(), DATETIME_WIDTH);
        row.push_str(&column(method.as_str(), METHOD_WIDTH));
        row.push_str(&column(url, URL_WIDTH));
        for field in &self.fields {
            row.push_str(&column(&params.render(*field), FIELD_WIDTH));
        }

        let mut content = String::new();
        if self.needs_header().await {
            content.push_str(self.header().trim());
            content.push('\n');
        }
        content.push_str(row.trim());
        content.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await
    }

    fn header(&self) -> String {
        let mut header = column("DATETIME", DATETIME_WIDTH);
        header.push_str(&column("METHOD", METHOD_WIDTH));
        header.push_str(&column("URL", URL_WIDTH));
        for field in &self.fields {
            header.push_str(&column(&field.as_str().to_uppercase(), FIELD_WIDTH));
        }
        header
    }

    async fn needs_header(&self) -> bool {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        }
    }
}

/// Pad `value` to `width - PAD` characters plus `PAD` spaces. Longer
/// values are cut into lines of `width - PAD` characters, existing line
/// breaks kept.
fn column(value: &str, width: usize) -> String {
    let inner = width - PAD;
    let mut out = if value.chars().count() <= inner {
        format!("{value:<inner$}")
    } else {
        let mut wrapped = String::new();
        for (i, line) in value.split('\n').enumerate() {
            if i > 0 {
                wrapped.push('\n');
            }
            let chars: Vec<char> = line.chars().collect();
            for chunk in chars.chunks(inner) {
                wrapped.extend(chunk);
                wrapped.push('\n');
            }
        }
        wrapped
    };
    out.push_str(&" ".repeat(PAD));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params() -> LogParams {
        LogParams {
            data: json!({"tag": "retro"}),
            headers: json!({"content-type": "application/json"}),
            response: r#"{"status":true}"#.into(),
        }
    }

    #[test]
    fn short_values_are_padded() {
        assert_eq!(column("GET", METHOD_WIDTH), "GET       ");
        assert_eq!(column("GET", METHOD_WIDTH).len(), METHOD_WIDTH);
    }

    #[test]
    fn long_values_wrap() {
        let value = "a".repeat(10);
        assert_eq!(column(&value, 8), "aaaa\naaaa\naa\n    ");
    }

    #[test]
    fn field_names_parse() {
        assert_eq!("Response".parse::<LogField>(), Ok(LogField::Response));
        assert_eq!(" data ".parse::<LogField>(), Ok(LogField::Data));
        assert!("body".parse::<LogField>().is_err());
    }

    #[test]
    fn fields_are_sorted_and_deduplicated() {
        let log = FileLog::new(
            "unused.log",
            [LogField::Response, LogField::Data, LogField::Response],
        );
        assert_eq!(log.fields(), &[LogField::Data, LogField::Response]);
    }

    #[tokio::test]
    async fn header_written_once_then_rows_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calls.log");
        let log = FileLog::new(&path, [LogField::Response, LogField::Data]);

        log.log(&Method::GET, "https://api.test/profile/bob", &params())
            .await
            .unwrap();
        log.log(&Method::POST, "https://api.test/user/tag", &params())
            .await
            .unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);

        let header = lines[0];
        assert!(header.starts_with("DATETIME"));
        assert_eq!(header.find("METHOD"), Some(24));
        assert_eq!(header.find("URL"), Some(34));
        assert_eq!(header.find("DATA"), Some(82));
        assert_eq!(header.find("RESPONSE"), Some(178));
        assert!(!header.ends_with(' '));

        assert_eq!(lines[1].find("GET"), Some(24));
        assert_eq!(lines[1].find("https://api.test/profile/bob"), Some(34));
        assert_eq!(lines[1].find(r#"{"tag":"retro"}"#), Some(82));
        assert!(lines[1].ends_with(r#"{"status":true}"#));
        assert_eq!(lines[2].find("POST"), Some(24));
    }

    #[tokio::test]
    async fn header_written_for_existing_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calls.log");
        tokio::fs::write(&path, "").await.unwrap();

        let log = FileLog::new(&path, []);
        log.log(&Method::GET, "https://api.test/", &LogParams::default())
            .await
            .unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(contents.starts_with("DATETIME"));
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn predicate_gates_matching() {
        let log = FileLog::new("unused.log", []).when(|method, _, _, auth| {
            *method == Method::POST && auth
        });
        assert!(log.matches(&Method::POST, "u", &Value::Null, true));
        assert!(!log.matches(&Method::POST, "u", &Value::Null, false));
        assert!(!log.matches(&Method::GET, "u", &Value::Null, true));
        assert!(FileLog::new("unused.log", []).matches(&Method::GET, "u", &Value::Null, false));
    }
}
