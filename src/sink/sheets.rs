//! 电子表格 values REST 报表端
//!
//! 只负责 HTTP 调用; 令牌由外部获取后通过配置或环境变量传入.

use super::a1::RangeRef;
use super::{write_snapshot, CellValue, ReportSink, SNAPSHOT_RANGE};
use crate::error::SinkError;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// 读取令牌的环境变量
pub const TOKEN_ENV: &str = "SMARTVIEW_SHEETS_TOKEN";

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateResponse {
    #[serde(default)]
    updated_cells: u64,
}

/// 电子表格 REST 报表端
pub struct SheetsSink {
    agent: ureq::Agent,
    base_url: String,
    spreadsheet_id: String,
    token: String,
    export_dir: PathBuf,
}

impl SheetsSink {
    pub fn new(
        base_url: impl Into<String>,
        spreadsheet_id: impl Into<String>,
        token: impl Into<String>,
        export_dir: impl Into<PathBuf>,
    ) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(30))
            .build();
        Self {
            agent,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            spreadsheet_id: spreadsheet_id.into(),
            token: token.into(),
            export_dir: export_dir.into(),
        }
    }

    fn values_url(&self, range: &str, suffix: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}{}",
            self.base_url,
            self.spreadsheet_id,
            encode_range(range),
            suffix
        )
    }

    fn auth(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl ReportSink for SheetsSink {
    fn write_cell(&mut self, range: &str, value: CellValue) -> Result<(), SinkError> {
        RangeRef::parse(range)?;
        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": [[value]],
        });
        let response: UpdateResponse = self
            .agent
            .put(&self.values_url(range, ""))
            .set("Authorization", &self.auth())
            .query("valueInputOption", "RAW")
            .send_json(body)
            .map_err(http_error)?
            .into_json()
            .map_err(|e| SinkError::Response(e.to_string()))?;
        debug!("{} cells updated at {}", response.updated_cells, range);
        Ok(())
    }

    fn read_range(&mut self, range: &str) -> Result<Vec<Vec<CellValue>>, SinkError> {
        RangeRef::parse(range)?;
        let response: ValueRange = self
            .agent
            .get(&self.values_url(range, ""))
            .set("Authorization", &self.auth())
            .call()
            .map_err(http_error)?
            .into_json()
            .map_err(|e| SinkError::Response(e.to_string()))?;

        Ok(response
            .values
            .into_iter()
            .map(|row| row.into_iter().map(json_to_cell).collect())
            .collect())
    }

    fn clear_range(&mut self, range: &str) -> Result<(), SinkError> {
        RangeRef::parse(range)?;
        self.agent
            .post(&self.values_url(range, ":clear"))
            .set("Authorization", &self.auth())
            .send_json(json!({}))
            .map_err(http_error)?;
        Ok(())
    }

    fn export_snapshot(&mut self, date: NaiveDate) -> Result<PathBuf, SinkError> {
        let rows = self.read_range(SNAPSHOT_RANGE)?;
        write_snapshot(&self.export_dir, date, &rows)
    }
}

fn http_error(e: ureq::Error) -> SinkError {
    match e {
        ureq::Error::Status(code, response) => {
            let body = response.into_string().unwrap_or_default();
            SinkError::Http(format!("status {}: {}", code, body.trim()))
        }
        other => SinkError::Http(other.to_string()),
    }
}

fn json_to_cell(value: serde_json::Value) -> CellValue {
    match value {
        serde_json::Value::Number(n) => n.as_f64().map_or_else(CellValue::blank, CellValue::Number),
        serde_json::Value::String(s) => CellValue::Text(s),
        serde_json::Value::Null => CellValue::blank(),
        other => CellValue::Text(other.to_string()),
    }
}

/// 区域引用作为单个路径段转义
fn encode_range(range: &str) -> String {
    urlencoding::encode(range).into_owned()
}
