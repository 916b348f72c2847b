//! `key=value` lines under `[kind "index"]` sections.

use serde_json::Value;
use transctl_core::{Column, Record};

use super::group_by_index;

fn scalar(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

pub(super) fn render<R: Record>(records: &[&R], columns: &[Column<R>]) -> String {
    let mut output = String::new();
    for (key, members) in group_by_index(records) {
        if !output.is_empty() {
            output.push('\n');
        }
        output.push_str(&format!("[{} {key:?}]\n", R::KIND));
        for record in members {
            let prefix = record
                .sub_index()
                .map(|sub| format!("{sub}."))
                .unwrap_or_default();
            for column in columns {
                let cell = column.value(record);
                if cell.is_empty() {
                    continue;
                }
                output.push_str(&format!("{prefix}{}={}\n", column.name, scalar(&cell.to_json())));
            }
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use transctl_core::TorrentFile;

    use crate::client::CliResult;
    use crate::output::{FILE_COLUMNS, RenderOptions, render};

    #[test]
    fn sub_entities_are_prefixed_by_index() -> CliResult<()> {
        let file = TorrentFile {
            hash_string: "abc".into(),
            index: 3,
            name: "a.txt".into(),
            ..TorrentFile::default()
        };
        let options = RenderOptions {
            format: "flat".parse()?,
            ..RenderOptions::default()
        };
        let text = render(&[file], FILE_COLUMNS, &options)?;
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("[file \"abc\"]"));
        assert!(text.contains("\n3.name=a.txt\n"));
        assert!(text.contains("\n3.length=0\n"));
        assert!(text.contains("\n3.wanted=false\n"));
        Ok(())
    }
}
