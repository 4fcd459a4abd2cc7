use std::time::Duration;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

/// Outcome of populating one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TableStatus {
    Completed,
    Failed { reason: String },
    Cancelled,
}

impl TableStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TableStatus::Completed => "completed",
            TableStatus::Failed { .. } => "failed",
            TableStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TableReport {
    pub rows_requested: usize,
    pub rows_inserted: u64,
    #[serde(rename = "elapsed_secs", serialize_with = "as_secs")]
    pub elapsed: Duration,
    pub status: TableStatus,
}

/// Per-table results of a run, in the order tables were processed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub tables: IndexMap<String, TableReport>,
    #[serde(rename = "elapsed_secs", serialize_with = "as_secs")]
    pub elapsed: Duration,
    pub cancelled: bool,
    /// Configuration entries that did not match the schema.
    pub warnings: Vec<String>,
}

impl RunReport {
    pub fn record(&mut self, table: &str, report: TableReport) {
        self.tables.insert(table.to_string(), report);
    }

    pub fn total_rows_inserted(&self) -> u64 {
        self.tables.values().map(|t| t.rows_inserted).sum()
    }

    pub fn failed_tables(&self) -> Vec<&str> {
        self.tables
            .iter()
            .filter(|(_, t)| matches!(t.status, TableStatus::Failed { .. }))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn is_success(&self) -> bool {
        !self.cancelled && self.failed_tables().is_empty()
    }

    /// Human-readable summary for terminal output.
    pub fn summary(&self) -> String {
        let mut lines = vec![format!(
            "{} rows inserted into {} tables in {:.2}s",
            self.total_rows_inserted(),
            self.tables.len(),
            self.elapsed.as_secs_f64()
        )];
        for (name, table) in &self.tables {
            if let TableStatus::Failed { reason } = &table.status {
                lines.push(format!("  ✗ {}: {}", name, reason));
            }
        }
        if self.cancelled {
            lines.push("  Run cancelled before all tables were processed".to_string());
        }
        lines.join("\n")
    }
}

fn as_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(inserted: u64, status: TableStatus) -> TableReport {
        TableReport {
            rows_requested: 10,
            rows_inserted: inserted,
            elapsed: Duration::from_millis(1500),
            status,
        }
    }

    #[test]
    fn test_totals_and_failures() {
        let mut report = RunReport::default();
        report.record("customers", table(10, TableStatus::Completed));
        report.record(
            "orders",
            table(
                3,
                TableStatus::Failed {
                    reason: "boom".to_string(),
                },
            ),
        );

        assert_eq!(report.total_rows_inserted(), 13);
        assert_eq!(report.failed_tables(), vec!["orders"]);
        assert!(!report.is_success());
        assert!(report.summary().contains("orders: boom"));
    }

    #[test]
    fn test_serializes_status_and_seconds() {
        let mut report = RunReport::default();
        report.record("customers", table(10, TableStatus::Completed));
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["tables"]["customers"]["status"]["state"], "completed");
        assert_eq!(json["tables"]["customers"]["elapsed_secs"], 1.5);
        assert_eq!(json["cancelled"], false);
    }
}
