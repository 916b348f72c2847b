//! Record rendering: column resolution, sorting, and the output formats.
//!
//! Layout:
//! - `table.rs`: aligned columns with headers and byte totals
//! - `structured.rs`: JSON and YAML keyed by each record's index
//! - `flat.rs`: `[kind "index"]` sections of `key=value` lines

mod flat;
mod structured;
mod table;

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use transctl_core::{ByteFormat, Column, Record};

use crate::client::{CliError, CliResult};

/// Which columns a table shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Columns {
    Default,
    Wide,
    All,
    Explicit(Vec<String>),
}

/// Output format selected with `--output`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Format {
    Table(Columns),
    Json,
    Yaml,
    Flat,
}

impl Default for Format {
    fn default() -> Self {
        Self::Table(Columns::Default)
    }
}

impl FromStr for Format {
    type Err = CliError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let format = match value.trim() {
            "table" => Self::Table(Columns::Default),
            "wide" => Self::Table(Columns::Wide),
            "all" => Self::Table(Columns::All),
            "json" => Self::Json,
            "yaml" => Self::Yaml,
            "flat" => Self::Flat,
            other => {
                let Some(list) = other.strip_prefix("table=") else {
                    return Err(CliError::validation(format!(
                        "unknown output format '{other}' (expected table, wide, all, table=COLUMNS, json, yaml or flat)"
                    )));
                };
                let names: Vec<String> = list
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect();
                if names.is_empty() {
                    return Err(CliError::validation("table= needs at least one column"));
                }
                Self::Table(Columns::Explicit(names))
            }
        };
        Ok(format)
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SortOrder {
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = CliError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(CliError::validation(format!(
                "unknown sort order '{other}' (expected asc or desc)"
            ))),
        }
    }
}

/// Default and wide column sets of one verb.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ColumnSet {
    pub(crate) defaults: &'static [&'static str],
    pub(crate) wide: &'static [&'static str],
}

pub(crate) const TORRENT_COLUMNS: ColumnSet = ColumnSet {
    defaults: &[
        "shortHash",
        "name",
        "status",
        "eta",
        "rateDownload",
        "rateUpload",
        "haveValid",
        "percentDone",
    ],
    wide: &[
        "id",
        "downloadDir",
        "addedDate",
        "uploadRatio",
        "peersConnected",
        "labels",
    ],
};

pub(crate) const FILE_COLUMNS: ColumnSet = ColumnSet {
    defaults: &[
        "shortHash",
        "index",
        "name",
        "length",
        "bytesCompleted",
        "percentDone",
        "wanted",
        "priority",
    ],
    wide: &[],
};

pub(crate) const PEER_COLUMNS: ColumnSet = ColumnSet {
    defaults: &[
        "shortHash",
        "address",
        "port",
        "clientName",
        "progress",
        "rateToClient",
        "rateToPeer",
        "flagStr",
    ],
    wide: &["isEncrypted", "isUTP", "isIncoming"],
};

pub(crate) const TRACKER_COLUMNS: ColumnSet = ColumnSet {
    defaults: &[
        "shortHash",
        "id",
        "tier",
        "host",
        "announceState",
        "lastAnnounceResult",
        "seederCount",
        "leecherCount",
    ],
    wide: &["announce", "scrape", "scrapeState", "downloadCount"],
};

pub(crate) const STATS_COLUMNS: ColumnSet = ColumnSet {
    defaults: &[
        "activeTorrentCount",
        "pausedTorrentCount",
        "torrentCount",
        "downloadSpeed",
        "uploadSpeed",
        "downloadedBytes",
        "uploadedBytes",
    ],
    wide: &[],
};

pub(crate) const FREE_SPACE_COLUMNS: ColumnSet = ColumnSet {
    defaults: &["path", "sizeBytes", "totalSize"],
    wide: &[],
};

/// Display names `get` uses unless overridden by `--column-name`.
pub(crate) const TORRENT_RENAMES: &[(&str, &str)] = &[
    ("shortHash", "hash"),
    ("haveValid", "have"),
    ("percentDone", "done"),
    ("rateDownload", "down"),
    ("rateUpload", "up"),
];

/// Everything the renderer needs besides the records.
#[derive(Debug, Clone)]
pub(crate) struct RenderOptions {
    pub(crate) format: Format,
    pub(crate) sort_by: Option<String>,
    pub(crate) sort_order: Option<SortOrder>,
    /// `wire -> display`.
    pub(crate) renames: BTreeMap<String, String>,
    pub(crate) bytes: ByteFormat,
    pub(crate) headers: bool,
    pub(crate) totals: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            format: Format::default(),
            sort_by: None,
            sort_order: None,
            renames: BTreeMap::new(),
            bytes: ByteFormat::HUMAN,
            headers: true,
            totals: true,
        }
    }
}

impl RenderOptions {
    pub(crate) fn display_name<'a>(&'a self, wire: &'a str) -> &'a str {
        self.renames.get(wire).map_or(wire, String::as_str)
    }

    fn wire_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.renames
            .iter()
            .find(|(_, display)| display.as_str() == name)
            .map_or(name, |(wire, _)| wire.as_str())
    }

    /// Columns the selected format shows, in display order.
    pub(crate) fn columns<R: Record>(&self, set: ColumnSet) -> CliResult<Vec<Column<R>>> {
        let names: Vec<&str> = match &self.format {
            Format::Table(Columns::Default) => set.defaults.to_vec(),
            Format::Table(Columns::Wide) => set.defaults.iter().chain(set.wide).copied().collect(),
            Format::Table(Columns::All) | Format::Json | Format::Yaml | Format::Flat => {
                return Ok(R::columns());
            }
            Format::Table(Columns::Explicit(names)) => {
                names.iter().map(|name| self.wire_name(name)).collect()
            }
        };
        names
            .into_iter()
            .map(|name| {
                R::column(name).ok_or_else(|| {
                    CliError::validation(format!("unknown {} column '{name}'", R::KIND))
                })
            })
            .collect()
    }

    /// Wire fields the shown columns need, always including `hashString`.
    pub(crate) fn wire_fields<R: Record>(&self, set: ColumnSet) -> CliResult<Vec<&'static str>> {
        let mut fields = BTreeSet::from(["hashString"]);
        for column in self.columns::<R>(set)? {
            fields.extend(column.fields.iter().copied());
        }
        Ok(fields.into_iter().collect())
    }
}

/// Render `records` in the selected format.
pub(crate) fn render<R: Record>(
    records: &[R],
    set: ColumnSet,
    options: &RenderOptions,
) -> CliResult<String> {
    let columns = options.columns::<R>(set)?;
    let mut ordered: Vec<&R> = records.iter().collect();
    sort(&mut ordered, &columns, options)?;
    match options.format {
        Format::Table(_) => Ok(table::render(&ordered, &columns, options)),
        Format::Json => structured::json(&ordered, &columns),
        Format::Yaml => structured::yaml(&ordered, &columns),
        Format::Flat => Ok(flat::render(&ordered, &columns)),
    }
}

fn sort<R: Record>(
    records: &mut [&R],
    columns: &[Column<R>],
    options: &RenderOptions,
) -> CliResult<()> {
    let column = match options.sort_by.as_deref() {
        Some(name) => {
            let wire = options.wire_name(name);
            columns
                .iter()
                .find(|column| column.name == wire)
                .ok_or_else(|| {
                    CliError::validation(format!("sort key {name} is not an output column"))
                })?
        }
        None => match columns.first() {
            Some(column) => column,
            None => return Ok(()),
        },
    };
    let order = options.sort_order.unwrap_or_else(|| {
        let descending = records
            .iter()
            .map(|record| column.value(record))
            .find(|cell| !cell.is_empty())
            .is_some_and(|cell| cell.prefers_descending());
        if descending {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    });
    records.sort_by(|left, right| {
        let ordering = column.value(left).compare(&column.value(right));
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
    Ok(())
}

/// `rateDownload` -> `RATE_DOWNLOAD`, `peer-limit` -> `PEER_LIMIT`.
pub(crate) fn header(name: &str) -> String {
    let mut header = String::with_capacity(name.len() + 4);
    let mut previous_lower = false;
    for ch in name.chars() {
        if ch == '-' || ch == ' ' {
            header.push('_');
            previous_lower = false;
        } else if ch.is_uppercase() {
            if previous_lower {
                header.push('_');
            }
            header.push(ch);
            previous_lower = false;
        } else {
            header.extend(ch.to_uppercase());
            previous_lower = ch.is_lowercase() || ch.is_ascii_digit();
        }
    }
    header
}

fn group_by_index<'a, R: Record>(records: &[&'a R]) -> Vec<(String, Vec<&'a R>)> {
    let mut groups: Vec<(String, Vec<&'a R>)> = Vec::new();
    for &record in records {
        let key = record.index_key();
        match groups.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, members)) => members.push(record),
            None => groups.push((key, vec![record])),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use transctl_core::Torrent;

    fn torrent(hash: &str, have: i64, percent: f64) -> Torrent {
        serde_json::from_value(serde_json::json!({
            "hashString": hash,
            "name": hash,
            "haveValid": have,
            "percentDone": percent,
        }))
        .expect("valid torrent")
    }

    #[test]
    fn formats_parse() -> CliResult<()> {
        assert_eq!("wide".parse::<Format>()?, Format::Table(Columns::Wide));
        assert_eq!(
            "table=name, haveValid".parse::<Format>()?,
            Format::Table(Columns::Explicit(vec!["name".into(), "haveValid".into()]))
        );
        assert_eq!("yaml".parse::<Format>()?, Format::Yaml);
        assert!(matches!("csv".parse::<Format>(), Err(CliError::Validation(_))));
        assert!(matches!("table=".parse::<Format>(), Err(CliError::Validation(_))));
        Ok(())
    }

    #[test]
    fn headers_are_upper_snake_case() {
        assert_eq!(header("rateDownload"), "RATE_DOWNLOAD");
        assert_eq!(header("shortHash"), "SHORT_HASH");
        assert_eq!(header("peer-limit"), "PEER_LIMIT");
        assert_eq!(header("isUTP"), "IS_UTP");
        assert_eq!(header("down"), "DOWN");
    }

    #[test]
    fn unknown_sort_key_is_rejected() {
        let options = RenderOptions {
            sort_by: Some("totalSize".into()),
            ..RenderOptions::default()
        };
        let err = render(&[torrent("a", 1, 0.5)], TORRENT_COLUMNS, &options)
            .expect_err("totalSize is not shown");
        assert_eq!(err.display_message(), "sort key totalSize is not an output column");
    }

    #[test]
    fn byte_columns_sort_descending_by_default() -> CliResult<()> {
        let records = [torrent("small", 1, 0.1), torrent("large", 4096, 0.2)];
        let mut ordered: Vec<&Torrent> = records.iter().collect();
        let options = RenderOptions {
            format: "table=haveValid,name".parse()?,
            ..RenderOptions::default()
        };
        let columns = options.columns::<Torrent>(TORRENT_COLUMNS)?;
        sort(&mut ordered, &columns, &options)?;
        assert_eq!(ordered[0].hash(), "large");

        let options = RenderOptions {
            format: "table=name,haveValid".parse()?,
            ..RenderOptions::default()
        };
        let columns = options.columns::<Torrent>(TORRENT_COLUMNS)?;
        sort(&mut ordered, &columns, &options)?;
        assert_eq!(ordered[0].hash(), "large");
        assert_eq!(ordered[1].hash(), "small");
        Ok(())
    }

    #[test]
    fn ties_on_the_default_key_keep_input_order() -> CliResult<()> {
        let records: Vec<Torrent> = ["z1", "a2", "m3"]
            .into_iter()
            .map(|hash| {
                serde_json::from_value(serde_json::json!({"hashString": hash, "name": "same"}))
                    .expect("valid torrent")
            })
            .collect();
        let options = RenderOptions {
            format: "table=name,hashString".parse()?,
            totals: false,
            ..RenderOptions::default()
        };
        let text = render(&records, TORRENT_COLUMNS, &options)?;
        let hashes: Vec<&str> = text
            .lines()
            .skip(1)
            .filter_map(|line| line.split_whitespace().last())
            .collect();
        assert_eq!(hashes, ["z1", "a2", "m3"]);
        Ok(())
    }

    #[test]
    fn renamed_columns_resolve_in_explicit_lists() -> CliResult<()> {
        let options = RenderOptions {
            format: "table=have,name".parse()?,
            renames: BTreeMap::from([("haveValid".to_string(), "have".to_string())]),
            ..RenderOptions::default()
        };
        let fields = options.wire_fields::<Torrent>(TORRENT_COLUMNS)?;
        assert_eq!(fields, vec!["hashString", "haveValid", "name"]);
        Ok(())
    }
}
