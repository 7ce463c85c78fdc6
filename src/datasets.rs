use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Read-only store of named JSON datasets loaded from a directory.
///
/// Every access re-reads the backing file, so dataset edits on disk show up
/// without a restart. Missing or corrupt files degrade to an empty dataset.
#[derive(Debug, Clone)]
pub struct DatasetStore {
    base_path: PathBuf,
}

pub const SALES_DATA: &str = "sales_data";
pub const SALES_TARGETS: &str = "sales_targets";
pub const TEAMS: &str = "teams";
pub const EMPLOYEES: &str = "employees";
pub const CUSTOMERS: &str = "customers";

impl DatasetStore {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// Load a named dataset as a JSON array. Missing or unparseable files
    /// return an empty array.
    pub fn dataset(&self, name: &str) -> Vec<Value> {
        let path = self.base_path.join(format!("{}.json", name));

        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(dataset = name, path = %path.display(), "dataset file unreadable: {}", e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Array(records)) => records,
            Ok(_) => {
                warn!(dataset = name, "dataset is not a JSON array");
                Vec::new()
            }
            Err(e) => {
                warn!(dataset = name, "dataset failed to parse: {}", e);
                Vec::new()
            }
        }
    }

    /// Sales records matching an exact (quarter, year) pair, e.g. ("Q1", 2024).
    pub fn sales_for_quarter(&self, quarter: &str, year: i64) -> Vec<Value> {
        self.dataset(SALES_DATA)
            .into_iter()
            .filter(|record| {
                record.get("year").and_then(Value::as_i64) == Some(year)
                    && record
                        .get("quarter")
                        .and_then(Value::as_str)
                        .is_some_and(|q| q.eq_ignore_ascii_case(quarter))
            })
            .collect()
    }

    /// Case-insensitive employee lookup by full name.
    pub fn employee_by_name(&self, name: &str) -> Option<Value> {
        Self::find_by_name(self.dataset(EMPLOYEES), name)
    }

    /// Case-insensitive customer lookup by company name.
    pub fn customer_by_name(&self, name: &str) -> Option<Value> {
        Self::find_by_name(self.dataset(CUSTOMERS), name)
    }

    fn find_by_name(records: Vec<Value>, name: &str) -> Option<Value> {
        let needle = name.trim();
        records.into_iter().find(|record| {
            record
                .get("name")
                .and_then(Value::as_str)
                .is_some_and(|n| n.trim().eq_ignore_ascii_case(needle))
        })
    }
}
