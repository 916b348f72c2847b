//! JSON and YAML keyed by record index.

use anyhow::anyhow;
use serde_json::{Map, Value};
use transctl_core::{Column, Record};

use super::group_by_index;
use crate::client::{CliError, CliResult};

fn object<R: Record>(record: &R, columns: &[Column<R>]) -> Value {
    let fields: Map<String, Value> = columns
        .iter()
        .map(|column| (column.name, column.value(record)))
        .filter(|(_, cell)| !cell.is_empty())
        .map(|(name, cell)| (name.to_string(), cell.to_json()))
        .collect();
    Value::Object(fields)
}

/// One entry per index key: the record itself, or the list of its sub-entity records.
fn entries<R: Record>(records: &[&R], columns: &[Column<R>]) -> Vec<(String, Value)> {
    group_by_index(records)
        .into_iter()
        .map(|(key, members)| {
            let per_sub_entity = members.iter().any(|record| record.sub_index().is_some());
            let value = if per_sub_entity {
                Value::Array(members.iter().map(|record| object(*record, columns)).collect())
            } else {
                members
                    .last()
                    .map_or(Value::Null, |record| object(*record, columns))
            };
            (key, value)
        })
        .collect()
}

pub(super) fn json<R: Record>(records: &[&R], columns: &[Column<R>]) -> CliResult<String> {
    let map: Map<String, Value> = entries(records, columns).into_iter().collect();
    let mut text = serde_json::to_string_pretty(&Value::Object(map))
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    text.push('\n');
    Ok(text)
}

pub(super) fn yaml<R: Record>(records: &[&R], columns: &[Column<R>]) -> CliResult<String> {
    let mut output = String::new();
    for (key, value) in entries(records, columns) {
        let body = match value {
            Value::Array(_) => {
                let mut grouped = Map::new();
                grouped.insert(R::GROUP.to_string(), value);
                Value::Object(grouped)
            }
            other => other,
        };
        let mut document = Map::new();
        document.insert(key, body);
        let text = serde_yaml::to_string(&Value::Object(document))
            .map_err(|err| CliError::failure(anyhow!("failed to format YAML: {err}")))?;
        output.push_str("---\n");
        output.push_str(&text);
    }
    Ok(output)
}
