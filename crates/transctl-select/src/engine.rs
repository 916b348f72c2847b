//! Turns `--list`/`--recent`/`--filter`/identifiers into a torrent set.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use tracing::debug;
use transctl_core::{Provider, Record, Torrent, TorrentIds};

use crate::ast::{Expr, IDENTIFIER};
use crate::error::SelectError;
use crate::eval::{Value, matches};
use crate::parser::parse;

/// Match expression applied to positional identifiers when no `--filter` is given.
pub const DEFAULT_MATCH: &str = "id == identifier || name %% identifier || (strlen(identifier) >= 5 && hashString %^ identifier)";

/// Wire field every selection fetches.
const HASH_FIELD: &str = "hashString";

/// Selection request assembled from per-verb flags.
#[derive(Debug, Clone, Default)]
pub struct Selector {
    list: bool,
    recent: bool,
    filter: Option<String>,
    identifiers: Vec<String>,
    default_match: Option<String>,
    renames: BTreeMap<String, String>,
}

/// How the daemon is asked and which predicate runs locally.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Daemon-side selection.
    pub ids: TorrentIds,
    /// Wire fields to request.
    pub fields: Vec<&'static str>,
    /// Local predicate; `None` keeps every fetched torrent.
    pub filter: Option<Expr>,
}

impl Selector {
    /// An empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `--list`: every torrent.
    #[must_use]
    pub const fn with_list(mut self, list: bool) -> Self {
        self.list = list;
        self
    }

    /// `--recent`: recently active torrents.
    #[must_use]
    pub const fn with_recent(mut self, recent: bool) -> Self {
        self.recent = recent;
        self
    }

    /// `--filter EXPR`.
    #[must_use]
    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter;
        self
    }

    /// Positional identifiers.
    #[must_use]
    pub fn with_identifiers(mut self, identifiers: Vec<String>) -> Self {
        self.identifiers = identifiers;
        self
    }

    /// Replace [`DEFAULT_MATCH`] (the context `match` key).
    #[must_use]
    pub fn with_default_match(mut self, expression: Option<String>) -> Self {
        self.default_match = expression;
        self
    }

    /// Column renames as `wire -> display`; filters may use either name.
    #[must_use]
    pub fn with_renames(mut self, renames: &BTreeMap<String, String>) -> Self {
        self.renames = renames
            .iter()
            .map(|(wire, display)| (display.clone(), wire.clone()))
            .collect();
        self
    }

    /// Check the flag combination.
    ///
    /// # Errors
    ///
    /// Returns [`SelectError::SelectionRequired`] when nothing selects a
    /// torrent, or when `--list`/`--recent` are combined with each other, a
    /// filter, or identifiers.
    pub fn validate(&self) -> Result<(), SelectError> {
        let targeted = self.filter.is_some() || !self.identifiers.is_empty();
        let valid = match (self.list, self.recent) {
            (true, true) => false,
            (true, false) | (false, true) => !targeted,
            (false, false) => targeted,
        };
        if valid {
            Ok(())
        } else {
            Err(SelectError::SelectionRequired)
        }
    }

    /// Resolve the daemon request and local predicate.
    ///
    /// # Errors
    ///
    /// Fails on invalid flag combinations, unparsable filters, and filters
    /// naming fields no torrent column provides.
    pub fn plan(&self) -> Result<Plan, SelectError> {
        self.validate()?;
        if self.list || self.recent {
            let ids = if self.list {
                TorrentIds::All
            } else {
                TorrentIds::RecentlyActive
            };
            return Ok(Plan {
                ids,
                fields: vec![HASH_FIELD],
                filter: None,
            });
        }

        let source = self
            .filter
            .as_deref()
            .or(self.default_match.as_deref())
            .unwrap_or(DEFAULT_MATCH);
        let mut expr = parse(source).map_err(|source_err| SelectError::Filter {
            expression: source.to_string(),
            source: source_err,
        })?;
        expr.rename_fields(&|name| self.renames.get(name).cloned());

        let mut fields = BTreeSet::from([HASH_FIELD]);
        for name in expr.fields() {
            let column = Torrent::column(&name).ok_or(SelectError::UnknownField { name })?;
            fields.extend(column.fields.iter().copied());
        }
        Ok(Plan {
            ids: TorrentIds::All,
            fields: fields.into_iter().collect(),
            filter: Some(expr),
        })
    }

    /// Fetch and filter torrents.
    ///
    /// Each identifier is evaluated in its own pass; a torrent matched by
    /// several identifiers is returned once, in daemon order.
    ///
    /// # Errors
    ///
    /// As [`Selector::plan`], plus provider failures and filters that do
    /// not evaluate to a boolean.
    pub async fn select(&self, provider: &dyn Provider) -> Result<Vec<Torrent>, SelectError> {
        let plan = self.plan()?;
        debug!(ids = ?plan.ids, fields = ?plan.fields, "selecting torrents");
        let torrents = provider.get(&plan.ids, &plan.fields).await?;
        let Some(filter) = plan.filter else {
            return Ok(torrents);
        };

        let names = filter.fields();
        let identifiers: Vec<Value> = if self.identifiers.is_empty() {
            vec![Value::Null]
        } else {
            self.identifiers
                .iter()
                .map(|identifier| Value::Text(identifier.clone()))
                .collect()
        };

        let mut seen = HashSet::new();
        let mut selected = Vec::new();
        for torrent in torrents {
            let mut env: HashMap<String, Value> = names
                .iter()
                .map(|name| (name.clone(), Value::from(&torrent.value_of(name))))
                .collect();
            for identifier in &identifiers {
                env.insert(IDENTIFIER.to_string(), identifier.clone());
                let hit = matches(&filter, &env).map_err(|source| SelectError::Filter {
                    expression: self.expression().to_string(),
                    source,
                })?;
                if hit {
                    if seen.insert(torrent.hash().to_string()) {
                        selected.push(torrent);
                    }
                    break;
                }
            }
        }
        debug!(count = selected.len(), "selection complete");
        Ok(selected)
    }

    fn expression(&self) -> &str {
        self.filter
            .as_deref()
            .or(self.default_match.as_deref())
            .unwrap_or(DEFAULT_MATCH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_rejects_missing_and_conflicting_flags() {
        let message = "must specify --list, --recent, --filter or at least one torrent";
        for selector in [
            Selector::new(),
            Selector::new().with_list(true).with_recent(true),
            Selector::new()
                .with_list(true)
                .with_identifiers(vec!["foo".into()]),
            Selector::new()
                .with_recent(true)
                .with_filter(Some("true".into())),
        ] {
            let err = selector.validate().expect_err("invalid combination");
            assert_eq!(err.to_string(), message);
        }
        assert!(Selector::new().with_list(true).validate().is_ok());
        assert!(
            Selector::new()
                .with_filter(Some("true".into()))
                .with_identifiers(vec!["a".into()])
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn default_match_requests_referenced_fields_only() -> Result<(), SelectError> {
        let plan = Selector::new()
            .with_identifiers(vec!["abc".into()])
            .plan()?;
        assert_eq!(plan.fields, vec!["hashString", "id", "name"]);
        assert_eq!(plan.ids, TorrentIds::All);
        Ok(())
    }

    #[test]
    fn renamed_columns_map_back_to_wire_fields() -> Result<(), SelectError> {
        let renames = BTreeMap::from([("totalSize".to_string(), "SIZE".to_string())]);
        let plan = Selector::new()
            .with_filter(Some("SIZE > 1GB".into()))
            .with_renames(&renames)
            .plan()?;
        assert_eq!(plan.fields, vec!["hashString", "totalSize"]);
        Ok(())
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = Selector::new()
            .with_filter(Some("bogus == 1".into()))
            .plan()
            .expect_err("unknown field");
        assert!(matches!(err, SelectError::UnknownField { name } if name == "bogus"));
    }

    #[test]
    fn list_and_recent_skip_filtering() -> Result<(), SelectError> {
        let plan = Selector::new().with_recent(true).plan()?;
        assert_eq!(plan.ids, TorrentIds::RecentlyActive);
        assert!(plan.filter.is_none());
        Ok(())
    }
}
