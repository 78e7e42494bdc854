//! Rendering of statements and execution outcomes

use anyhow::Result;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use serde::{Deserialize, Serialize};
use sqlfile::StatementBatch;
use sqlfile_core::ExecutionOutcome;

const STATEMENT_WIDTH: usize = 80;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Serialize)]
struct OutcomeRecord<'a> {
    index: usize,
    statement: &'a str,
    affected_rows: u64,
    last_insert_id: Option<i64>,
}

pub fn render_statements(batch: &StatementBatch, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(batch.statements())?),
        OutputFormat::Table => {
            let mut table = new_table(vec!["#", "Statement"]);
            for (index, statement) in batch.iter().enumerate() {
                table.add_row(vec![index.to_string(), truncate(statement)]);
            }
            Ok(table.to_string())
        }
    }
}

pub fn render_outcomes(
    batch: &StatementBatch,
    outcomes: &[ExecutionOutcome],
    format: OutputFormat,
) -> Result<String> {
    let records: Vec<OutcomeRecord<'_>> = batch
        .iter()
        .zip(outcomes)
        .enumerate()
        .map(|(index, (statement, outcome))| OutcomeRecord {
            index,
            statement,
            affected_rows: outcome.affected_rows,
            last_insert_id: outcome.last_insert_id,
        })
        .collect();

    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&records)?),
        OutputFormat::Table => {
            let mut table = new_table(vec!["#", "Statement", "Affected rows", "Last insert id"]);
            for record in &records {
                table.add_row(vec![
                    record.index.to_string(),
                    truncate(record.statement),
                    record.affected_rows.to_string(),
                    record
                        .last_insert_id
                        .map(|id| id.to_string())
                        .unwrap_or_default(),
                ]);
            }
            Ok(table.to_string())
        }
    }
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn truncate(statement: &str) -> String {
    if statement.chars().count() <= STATEMENT_WIDTH {
        statement.to_string()
    } else {
        let head: String = statement.chars().take(STATEMENT_WIDTH - 1).collect();
        format!("{head}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_statements_json() {
        let batch = StatementBatch::parse("SELECT 1; SELECT 'a;b';");
        let json = render_statements(&batch, OutputFormat::Json).unwrap();

        let parsed: Vec<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, vec!["SELECT 1", "SELECT 'a;b'"]);
    }

    #[test]
    fn test_render_outcomes_json() {
        let batch = StatementBatch::parse("CREATE TABLE t (id INTEGER); INSERT INTO t VALUES (7);");
        let outcomes = vec![
            ExecutionOutcome::new(0),
            ExecutionOutcome::new(1).with_last_insert_id(7),
        ];

        let json = render_outcomes(&batch, &outcomes, OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed[0]["statement"], "CREATE TABLE t (id INTEGER)");
        assert_eq!(parsed[0]["last_insert_id"], serde_json::Value::Null);
        assert_eq!(parsed[1]["index"], 1);
        assert_eq!(parsed[1]["affected_rows"], 1);
        assert_eq!(parsed[1]["last_insert_id"], 7);
    }

    #[test]
    fn test_render_table_contains_statements() {
        let batch = StatementBatch::parse("SELECT 1;");
        let table = render_statements(&batch, OutputFormat::Table).unwrap();

        assert!(table.contains("Statement"));
        assert!(table.contains("SELECT 1"));
    }

    #[test]
    fn test_truncate_long_statement() {
        let long = "x".repeat(STATEMENT_WIDTH + 10);
        let truncated = truncate(&long);

        assert_eq!(truncated.chars().count(), STATEMENT_WIDTH);
        assert!(truncated.ends_with('…'));
        assert_eq!(truncate("short"), "short");
    }
}
