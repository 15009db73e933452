//! In-memory document used by tests in place of the remote service

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value as Json;

use super::client::ScriptService;
use super::error::RemoteError;
use crate::build::doc_cols;
use crate::table::{KeyPart, Table, Value};

struct MemoryTab {
    header_row: usize,
    grid: Vec<Vec<Json>>,
}

impl MemoryTab {
    fn header(&self) -> Vec<String> {
        self.grid
            .get(self.header_row - 1)
            .map(|row| row.iter().map(|c| Value::from_json(c).to_string()).collect())
            .unwrap_or_default()
    }

    fn position(&self, column: &str) -> Option<usize> {
        self.header().iter().position(|c| c == column)
    }

    /// Append rows reordered to this tab's header
    fn append(&mut self, header: &[String], rows: &[Vec<Json>]) {
        let tab_header = self.header();
        for row in rows {
            let aligned = tab_header
                .iter()
                .map(|col| {
                    header
                        .iter()
                        .position(|h| h == col)
                        .and_then(|i| row.get(i).cloned())
                        .unwrap_or_else(|| Json::String(String::new()))
                })
                .collect();
            self.grid.push(aligned);
        }
    }

    fn retain_data<F: FnMut(&[Json]) -> bool>(&mut self, mut keep: F) {
        let data = self.grid.split_off(self.header_row.min(self.grid.len()));
        self.grid.extend(data.into_iter().filter(|row| keep(row)));
    }
}

#[derive(Default)]
struct State {
    tabs: HashMap<String, MemoryTab>,
    calls: Vec<(String, Vec<Json>)>,
    failures: Vec<(String, usize)>,
    created: usize,
}

/// A single document whose tabs live in memory. Implements the script
/// functions the sync and decision steps use.
#[derive(Default)]
pub struct MemoryDocument {
    state: Mutex<State>,
}

fn key_of(cell: Option<&Json>) -> Option<KeyPart> {
    cell.and_then(|c| KeyPart::from_value(&Value::from_json(c)))
}

fn text(params: &[Json], i: usize) -> String {
    params.get(i).and_then(Json::as_str).unwrap_or_default().to_string()
}

fn number(params: &[Json], i: usize) -> usize {
    params.get(i).and_then(Json::as_u64).unwrap_or(1) as usize
}

fn rows(params: &[Json], i: usize) -> Vec<Vec<Json>> {
    params
        .get(i)
        .and_then(Json::as_array)
        .map(|rows| {
            rows.iter()
                .map(|r| r.as_array().cloned().unwrap_or_default())
                .collect()
        })
        .unwrap_or_default()
}

fn strings(params: &[Json], i: usize) -> Vec<String> {
    rows_flat(params, i)
        .iter()
        .map(|c| Value::from_json(c).to_string())
        .collect()
}

fn rows_flat(params: &[Json], i: usize) -> Vec<Json> {
    params.get(i).and_then(Json::as_array).cloned().unwrap_or_default()
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a tab; `grid` includes the header (and anything above it)
    pub fn with_tab(self, name: &str, header_row: usize, grid: Vec<Vec<Value>>) -> Self {
        let grid = grid
            .iter()
            .map(|row| row.iter().map(Value::to_json).collect())
            .collect();
        self.state
            .lock()
            .unwrap()
            .tabs
            .insert(name.to_string(), MemoryTab { header_row, grid });
        self
    }

    /// Make the `nth` (1-based) call to `function` fail without applying it
    pub fn fail_on(&self, function: &str, nth: usize) {
        self.state.lock().unwrap().failures.push((function.to_string(), nth));
    }

    pub fn calls(&self) -> Vec<(String, Vec<Json>)> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn calls_to(&self, function: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|(f, _)| f == function)
            .count()
    }

    /// Current contents of a tab below its header
    pub fn table(&self, tab: &str) -> Option<Table> {
        let state = self.state.lock().unwrap();
        let tab = state.tabs.get(tab)?;
        let grid: Vec<Vec<Value>> = tab
            .grid
            .iter()
            .map(|row| row.iter().map(Value::from_json).collect())
            .collect();
        Table::from_grid(&grid, tab.header_row).ok()
    }

    fn apply(state: &mut State, function: &str, params: &[Json]) -> Result<Option<Json>, RemoteError> {
        match function {
            "createDocument" => {
                state.created += 1;
                Ok(Some(Json::String(format!("doc-{}", state.created))))
            }
            "readDataTable" => {
                let grid = match state.tabs.get(&text(params, 1)) {
                    Some(tab) => tab.grid.iter().cloned().map(Json::Array).collect(),
                    None => vec![Json::Array(vec![Json::from("NULL")])],
                };
                Ok(Some(Json::Array(grid)))
            }
            "writeDataTable" | "refreshDecisionOptions" => {
                let grid = rows(params, 2);
                state.tabs.insert(text(params, 1), MemoryTab { header_row: 1, grid });
                Ok(None)
            }
            "refreshDecisions" => {
                let grid = rows(params, 3);
                state.tabs.insert(text(params, 1), MemoryTab { header_row: 1, grid });
                Ok(None)
            }
            "doEFCFormats" | "doAwardsFormats" => Ok(None),
            "insertEFCStudentRows" => {
                let header = strings(params, 3);
                let new_rows = rows(params, 4);
                let tab = Self::tab_or_create(state, &text(params, 1), &header, number(params, 5));
                tab.append(&header, &new_rows);
                Ok(None)
            }
            "insertAwardStudentRows" => {
                let header = strings(params, 2);
                let new_rows = rows(params, 3);
                let tab = Self::tab_or_create(state, &text(params, 1), &header, number(params, 4));
                tab.append(&header, &new_rows);
                Ok(None)
            }
            "deleteEFCStudentRows" => {
                let tab = Self::existing_tab(state, function, &text(params, 1))?;
                let id_col = text(params, 2);
                let ids: Vec<KeyPart> = rows_flat(params, 3)
                    .iter()
                    .filter_map(|c| key_of(Some(c)))
                    .collect();
                let pos = tab.position(&id_col).ok_or_else(|| missing_column(function, &id_col))?;
                tab.retain_data(|row| key_of(row.get(pos)).is_none_or(|id| !ids.contains(&id)));
                Ok(None)
            }
            "updateAwardStatuses" => {
                let tab = Self::existing_tab(state, function, &text(params, 1))?;
                let positions = Self::award_positions(tab, function)?;
                for change in rows(params, 2) {
                    let wanted: Vec<Option<KeyPart>> = change.iter().take(3).map(|c| key_of(Some(c))).collect();
                    let status = change.get(3).cloned().unwrap_or(Json::Null);
                    let header_row = tab.header_row;
                    for row in tab.grid.iter_mut().skip(header_row) {
                        let have: Vec<Option<KeyPart>> = positions[..3].iter().map(|&p| key_of(row.get(p))).collect();
                        if have == wanted {
                            if let Some(cell) = row.get_mut(positions[3]) {
                                *cell = status.clone();
                            }
                        }
                    }
                }
                Ok(None)
            }
            "deleteAwardStudentRows" => {
                let tab = Self::existing_tab(state, function, &text(params, 1))?;
                let positions = Self::award_positions(tab, function)?;
                let keys: Vec<Vec<Option<KeyPart>>> = rows(params, 3)
                    .iter()
                    .map(|k| k.iter().map(|c| key_of(Some(c))).collect())
                    .collect();
                tab.retain_data(|row| {
                    let have: Vec<Option<KeyPart>> = positions[..3].iter().map(|&p| key_of(row.get(p))).collect();
                    !keys.contains(&have)
                });
                Ok(None)
            }
            other => Err(RemoteError::Script {
                function: other.to_string(),
                message: format!("Script function not found: {}", other),
                error_type: None,
                stack: Vec::new(),
            }),
        }
    }

    fn tab_or_create<'s>(state: &'s mut State, name: &str, header: &[String], header_row: usize) -> &'s mut MemoryTab {
        state.tabs.entry(name.to_string()).or_insert_with(|| {
            let mut grid: Vec<Vec<Json>> = (1..header_row).map(|_| vec![Json::from("")]).collect();
            grid.push(header.iter().cloned().map(Json::String).collect());
            MemoryTab { header_row, grid }
        })
    }

    fn existing_tab<'s>(state: &'s mut State, function: &str, name: &str) -> Result<&'s mut MemoryTab, RemoteError> {
        state.tabs.get_mut(name).ok_or_else(|| RemoteError::Script {
            function: function.to_string(),
            message: format!("No tab named {}", name),
            error_type: None,
            stack: Vec::new(),
        })
    }

    fn award_positions(tab: &MemoryTab, function: &str) -> Result<[usize; 4], RemoteError> {
        let mut positions = [0; 4];
        for (slot, column) in positions.iter_mut().zip(doc_cols::STATUS_KEY) {
            *slot = tab.position(column).ok_or_else(|| missing_column(function, column))?;
        }
        Ok(positions)
    }
}

fn missing_column(function: &str, column: &str) -> RemoteError {
    RemoteError::Script {
        function: function.to_string(),
        message: format!("Column {} not found", column),
        error_type: None,
        stack: Vec::new(),
    }
}

#[async_trait]
impl ScriptService for MemoryDocument {
    async fn call(&self, function: &str, parameters: Vec<Json>) -> Result<Option<Json>, RemoteError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push((function.to_string(), parameters.clone()));

        let count = state.calls.iter().filter(|(f, _)| f == function).count();
        if state.failures.iter().any(|(f, n)| f == function && *n == count) {
            return Err(RemoteError::Script {
                function: function.to_string(),
                message: "Service invoked too many times".to_string(),
                error_type: Some("ScriptError".to_string()),
                stack: Vec::new(),
            });
        }

        Self::apply(&mut state, function, &parameters)
    }
}
