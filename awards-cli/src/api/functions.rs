//! Typed wrappers for the document script functions

use std::time::{Duration, Instant};

use serde_json::Value as Json;

use super::client::ScriptService;
use super::error::RemoteError;
use crate::table::{AwardKey, KeyPart, StatusRow, Value};

/// Cell marker the document script treats as empty
pub const EMPTY_CELL: &str = "";

/// First cell a tab with no data reports
const NO_DATA_SENTINEL: &str = "NULL";

/// A completed remote call and how long it took
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCall {
    pub function: &'static str,
    pub elapsed: Duration,
}

/// Row values as sent to the document; nulls become [`EMPTY_CELL`]
pub fn rows_json(rows: &[Vec<Value>]) -> Json {
    Json::Array(
        rows.iter()
            .map(|row| {
                Json::Array(
                    row.iter()
                        .map(|v| match v.to_json() {
                            Json::Null => Json::String(EMPTY_CELL.to_string()),
                            other => other,
                        })
                        .collect(),
                )
            })
            .collect(),
    )
}

fn header_json(header: &[String]) -> Json {
    Json::Array(header.iter().cloned().map(Json::String).collect())
}

/// Create a new document in `folder`, returning its key
pub async fn create_document(
    service: &dyn ScriptService,
    title: &str,
    folder: &str,
) -> Result<String, RemoteError> {
    let function = "createDocument";
    let start = Instant::now();
    let result = service
        .call(function, vec![Json::from(title), Json::from(folder)])
        .await?;

    match result {
        Some(Json::String(key)) if !key.is_empty() => {
            log::info!("Created '{}' in {:.2}s", title, start.elapsed().as_secs_f64());
            Ok(key)
        }
        other => Err(RemoteError::Decode {
            function: function.to_string(),
            message: format!("expected a document key, got {:?}", other),
        }),
    }
}

/// One live document, addressed by its key
pub struct DocumentHandle<'a> {
    service: &'a dyn ScriptService,
    key: String,
}

impl<'a> DocumentHandle<'a> {
    pub fn new(service: &'a dyn ScriptService, key: impl Into<String>) -> Self {
        Self {
            service,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    async fn run(&self, function: &'static str, mut parameters: Vec<Json>) -> Result<(Option<Json>, RemoteCall), RemoteError> {
        parameters.insert(0, Json::String(self.key.clone()));
        let start = Instant::now();
        let result = self.service.call(function, parameters).await?;
        let call = RemoteCall {
            function,
            elapsed: start.elapsed(),
        };
        log::info!("{} finished in {:.2}s", function, call.elapsed.as_secs_f64());
        Ok((result, call))
    }

    async fn write(&self, function: &'static str, parameters: Vec<Json>) -> Result<RemoteCall, RemoteError> {
        self.run(function, parameters).await.map(|(_, call)| call)
    }

    /// Every row of a tab, header rows included. `None` when the tab has no data.
    pub async fn read_tab(&self, tab: &str) -> Result<Option<Vec<Vec<Value>>>, RemoteError> {
        let function = "readDataTable";
        let (result, _) = self.run(function, vec![Json::from(tab)]).await?;

        let Some(result) = result else {
            return Ok(None);
        };
        let Json::Array(rows) = result else {
            return Err(RemoteError::Decode {
                function: function.to_string(),
                message: format!("expected a list of rows for tab '{}'", tab),
            });
        };

        let mut grid = Vec::with_capacity(rows.len());
        for row in &rows {
            let Json::Array(cells) = row else {
                return Err(RemoteError::Decode {
                    function: function.to_string(),
                    message: format!("tab '{}' contains a row that is not a list", tab),
                });
            };
            grid.push(cells.iter().map(Value::from_json).collect::<Vec<_>>());
        }

        let no_data = grid
            .first()
            .and_then(|row| row.first())
            .is_none_or(|cell| cell.is_text(NO_DATA_SENTINEL));
        if no_data {
            return Ok(None);
        }
        Ok(Some(grid))
    }

    /// Create (or replace) a tab with the given rows; the first row is the header
    pub async fn write_tab(&self, title: &str, grid: &[Vec<Value>]) -> Result<RemoteCall, RemoteError> {
        self.write("writeDataTable", vec![Json::from(title), rows_json(grid)])
            .await
    }

    pub async fn format_summary_tab(&self, title: &str) -> Result<RemoteCall, RemoteError> {
        self.write("doEFCFormats", vec![Json::from(title)]).await
    }

    pub async fn format_award_tab(&self, title: &str) -> Result<RemoteCall, RemoteError> {
        self.write("doAwardsFormats", vec![Json::from(title)]).await
    }

    /// Append student rows; the document places them by `name_column`
    pub async fn insert_summary_rows(
        &self,
        tab: &str,
        name_column: &str,
        header: &[String],
        rows: &[Vec<Value>],
        header_row: usize,
    ) -> Result<RemoteCall, RemoteError> {
        self.write(
            "insertEFCStudentRows",
            vec![
                Json::from(tab),
                Json::from(name_column),
                header_json(header),
                rows_json(rows),
                Json::from(header_row),
            ],
        )
        .await
    }

    /// Remove every student row whose `id_column` is in `ids`
    pub async fn delete_summary_rows(&self, tab: &str, id_column: &str, ids: &[KeyPart]) -> Result<RemoteCall, RemoteError> {
        self.write(
            "deleteEFCStudentRows",
            vec![
                Json::from(tab),
                Json::from(id_column),
                Json::Array(ids.iter().map(KeyPart::to_json).collect()),
            ],
        )
        .await
    }

    pub async fn insert_award_rows(
        &self,
        tab: &str,
        header: &[String],
        rows: &[Vec<Value>],
        header_row: usize,
    ) -> Result<RemoteCall, RemoteError> {
        self.write(
            "insertAwardStudentRows",
            vec![
                Json::from(tab),
                header_json(header),
                rows_json(rows),
                Json::from(header_row),
            ],
        )
        .await
    }

    /// Overwrite the status cell of existing award rows
    pub async fn update_award_statuses(
        &self,
        tab: &str,
        changes: &[StatusRow],
        header_row: usize,
    ) -> Result<RemoteCall, RemoteError> {
        self.write(
            "updateAwardStatuses",
            vec![
                Json::from(tab),
                Json::Array(changes.iter().map(StatusRow::to_json).collect()),
                Json::from(header_row),
            ],
        )
        .await
    }

    pub async fn delete_award_rows(&self, tab: &str, header_row: usize, keys: &[AwardKey]) -> Result<RemoteCall, RemoteError> {
        self.write(
            "deleteAwardStudentRows",
            vec![
                Json::from(tab),
                Json::from(header_row),
                Json::Array(keys.iter().map(AwardKey::to_json).collect()),
            ],
        )
        .await
    }

    pub async fn refresh_decision_options(&self, tab: &str, grid: &[Vec<Value>]) -> Result<RemoteCall, RemoteError> {
        self.write("refreshDecisionOptions", vec![Json::from(tab), rows_json(grid)])
            .await
    }

    pub async fn refresh_decisions(
        &self,
        tab: &str,
        options_tab: &str,
        grid: &[Vec<Value>],
    ) -> Result<RemoteCall, RemoteError> {
        self.write(
            "refreshDecisions",
            vec![Json::from(tab), Json::from(options_tab), rows_json(grid)],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::memory::MemoryDocument;
    use serde_json::json;

    #[test]
    fn test_nulls_become_empty_cells() {
        let rows = vec![vec![Value::Int(1001), Value::Null, Value::Float(0.5)]];
        assert_eq!(rows_json(&rows), json!([[1001, "", 0.5]]));
    }

    #[tokio::test]
    async fn test_read_missing_tab_is_none() {
        let doc = MemoryDocument::new();
        let handle = DocumentHandle::new(&doc, "doc-1");
        assert!(handle.read_tab("EFC").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let doc = MemoryDocument::new();
        let handle = DocumentHandle::new(&doc, "doc-1");
        let grid = vec![
            vec![Value::from("StudentID"), Value::from("LastFirst")],
            vec![Value::Int(1001), Value::Null],
        ];

        let call = handle.write_tab("EFC", &grid).await.unwrap();
        assert_eq!(call.function, "writeDataTable");

        let read = handle.read_tab("EFC").await.unwrap().unwrap();
        assert_eq!(read[1], vec![Value::Int(1001), Value::from("")]);
        assert_eq!(doc.calls()[0].1[0], json!("doc-1"));
    }

    #[tokio::test]
    async fn test_create_document_returns_key() {
        let doc = MemoryDocument::new();
        let key = create_document(&doc, "North Award Letter Tracker", "folder-1")
            .await
            .unwrap();
        assert!(!key.is_empty());
        assert_eq!(doc.calls_to("createDocument"), 1);
    }
}
