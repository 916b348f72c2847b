//! Git-style INI documents.
//!
//! Sections are `[name]` or `[name "subsection"]` and entries are
//! `key = value`. Section and key names compare case-insensitively;
//! subsection names are exact. Serialisation keeps section order and
//! writes entries with a tab indent.

use std::fmt;

use crate::error::{ConfigError, ConfigResult};

/// A dotted key split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    /// Lower-cased section name.
    pub section: String,
    /// Optional subsection, case preserved.
    pub subsection: Option<String>,
    /// Lower-cased entry name.
    pub name: String,
}

impl Key {
    /// Build a key from its parts.
    #[must_use]
    pub fn new(section: &str, subsection: Option<&str>, name: &str) -> Self {
        Self {
            section: section.to_ascii_lowercase(),
            subsection: subsection.map(str::to_string),
            name: name.to_ascii_lowercase(),
        }
    }

    /// Split `section.name` or `section.subsection.name`; the subsection
    /// may itself contain dots.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidKey`] when a part is missing or holds
    /// characters outside `[A-Za-z0-9_-]`.
    pub fn parse(key: &str) -> ConfigResult<Self> {
        let invalid = || ConfigError::InvalidKey {
            key: key.to_string(),
        };
        let (section, rest) = key.split_once('.').ok_or_else(invalid)?;
        let (subsection, name) = match rest.rsplit_once('.') {
            Some((subsection, name)) => (Some(subsection), name),
            None => (None, rest),
        };
        if !is_name(section) || !is_name(name) || subsection.is_some_and(str::is_empty) {
            return Err(invalid());
        }
        Ok(Self::new(section, subsection, name))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subsection {
            Some(subsection) => write!(formatter, "{}.{subsection}.{}", self.section, self.name),
            None => write!(formatter, "{}.{}", self.section, self.name),
        }
    }
}

fn is_name(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Section {
    name: String,
    subsection: Option<String>,
    entries: Vec<(String, String)>,
}

impl Section {
    fn is(&self, name: &str, subsection: Option<&str>) -> bool {
        self.name == name && self.subsection.as_deref() == subsection
    }

    fn matches(&self, key: &Key) -> bool {
        self.is(&key.section, key.subsection.as_deref())
    }
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    sections: Vec<Section>,
}

impl Document {
    /// Parse INI text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Syntax`] with the offending line number.
    pub fn parse(text: &str) -> ConfigResult<Self> {
        let mut sections: Vec<Section> = Vec::new();
        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let syntax = |message: String| ConfigError::Syntax { line, message };
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }
            if let Some(header) = trimmed.strip_prefix('[') {
                sections.push(parse_header(header).map_err(syntax)?);
                continue;
            }
            let Some(section) = sections.last_mut() else {
                return Err(syntax("entry outside of any section".to_string()));
            };
            section.entries.push(parse_entry(trimmed).map_err(syntax)?);
        }
        Ok(Self { sections })
    }

    /// Value of a key; the last occurrence wins.
    #[must_use]
    pub fn get(&self, key: &Key) -> Option<&str> {
        self.sections
            .iter()
            .filter(|section| section.matches(key))
            .flat_map(|section| section.entries.iter())
            .rfind(|(name, _)| *name == key.name)
            .map(|(_, value)| value.as_str())
    }

    /// Replace the last occurrence of a key, or append it to its section.
    pub fn set(&mut self, key: &Key, value: &str) {
        let existing = self
            .sections
            .iter_mut()
            .filter(|section| section.matches(key))
            .flat_map(|section| section.entries.iter_mut())
            .rfind(|(name, _)| *name == key.name);
        if let Some((_, slot)) = existing {
            *slot = value.to_string();
            return;
        }

        let index = if let Some(index) = self.sections.iter().rposition(|section| section.matches(key)) {
            index
        } else {
            self.sections.push(Section {
                name: key.section.clone(),
                subsection: key.subsection.clone(),
                entries: Vec::new(),
            });
            self.sections.len() - 1
        };
        self.sections[index]
            .entries
            .push((key.name.clone(), value.to_string()));
    }

    /// Remove every occurrence of a key; sections left empty are dropped.
    /// Returns whether anything was removed.
    pub fn unset(&mut self, key: &Key) -> bool {
        let mut removed = false;
        for section in self.sections.iter_mut().filter(|section| section.matches(key)) {
            let before = section.entries.len();
            section.entries.retain(|(name, _)| *name != key.name);
            removed |= section.entries.len() != before;
        }
        self.sections
            .retain(|section| !(section.matches(key) && section.entries.is_empty()));
        removed
    }

    /// Every entry as `(dotted key, value)`, in file order.
    #[must_use]
    pub fn entries(&self) -> Vec<(String, String)> {
        self.sections
            .iter()
            .flat_map(|section| {
                section.entries.iter().map(|(name, value)| {
                    let key = Key::new(&section.name, section.subsection.as_deref(), name);
                    (key.to_string(), value.clone())
                })
            })
            .collect()
    }

    /// Whether `[name "subsection"]` (or `[name]`) exists.
    #[must_use]
    pub fn has_section(&self, name: &str, subsection: Option<&str>) -> bool {
        self.sections
            .iter()
            .any(|section| section.is(&name.to_ascii_lowercase(), subsection))
    }
}

impl fmt::Display for Document {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        for section in &self.sections {
            match &section.subsection {
                Some(subsection) => writeln!(
                    formatter,
                    "[{} \"{}\"]",
                    section.name,
                    subsection.replace('\\', "\\\\").replace('"', "\\\"")
                )?,
                None => writeln!(formatter, "[{}]", section.name)?,
            }
            for (name, value) in &section.entries {
                writeln!(formatter, "\t{name} = {}", quote_value(value))?;
            }
        }
        Ok(())
    }
}

fn parse_header(header: &str) -> Result<Section, String> {
    let close = header.rfind(']').ok_or("unterminated section header")?;
    let trailing = header[close + 1..].trim();
    if !(trailing.is_empty() || trailing.starts_with('#') || trailing.starts_with(';')) {
        return Err(format!("unexpected text after section header: {trailing}"));
    }
    let inner = header[..close].trim();
    let (name, subsection) = match inner.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, Some(parse_subsection(rest.trim())?)),
        None => (inner, None),
    };
    if !is_name(name) {
        return Err(format!("invalid section name {name:?}"));
    }
    Ok(Section {
        name: name.to_ascii_lowercase(),
        subsection,
        entries: Vec::new(),
    })
}

fn parse_subsection(text: &str) -> Result<String, String> {
    let quoted = text
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .ok_or_else(|| format!("subsection must be quoted: {text}"))?;
    let mut subsection = String::with_capacity(quoted.len());
    let mut chars = quoted.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => subsection.push(chars.next().ok_or("dangling escape in subsection")?),
            '"' => return Err("unescaped quote in subsection".to_string()),
            other => subsection.push(other),
        }
    }
    Ok(subsection)
}

fn parse_entry(line: &str) -> Result<(String, String), String> {
    let (name, value) = match line.split_once('=') {
        Some((name, raw)) => (name.trim(), parse_value(raw)?),
        // A bare key is boolean true, as in git.
        None => (
            line.split(['#', ';']).next().unwrap_or_default().trim(),
            "true".to_string(),
        ),
    };
    if !is_name(name) {
        return Err(format!("invalid key name {name:?}"));
    }
    Ok((name.to_ascii_lowercase(), value))
}

fn parse_value(raw: &str) -> Result<String, String> {
    let mut value = String::new();
    let mut pending_space = String::new();
    let mut quoted = false;
    let mut chars = raw.trim_start().chars();
    while let Some(ch) = chars.next() {
        let literal = match ch {
            '"' => {
                quoted = !quoted;
                value.push_str(&pending_space);
                pending_space.clear();
                continue;
            }
            '\\' => match chars.next() {
                Some('n') => '\n',
                Some('t') => '\t',
                Some(escaped @ ('"' | '\\')) => escaped,
                Some(other) => return Err(format!("unknown escape \\{other}")),
                None => return Err("dangling escape".to_string()),
            },
            '#' | ';' if !quoted => break,
            space if space.is_whitespace() && !quoted => {
                pending_space.push(space);
                continue;
            }
            other => other,
        };
        value.push_str(&pending_space);
        pending_space.clear();
        value.push(literal);
    }
    if quoted {
        return Err("unterminated quote".to_string());
    }
    Ok(value)
}

fn quote_value(value: &str) -> String {
    let needs_quotes = value.starts_with(char::is_whitespace)
        || value.ends_with(char::is_whitespace)
        || value.contains(['#', ';']);
    let mut escaped = String::with_capacity(value.len() + 2);
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            other => escaped.push(other),
        }
    }
    if needs_quotes {
        format!("\"{escaped}\"")
    } else {
        escaped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
# transctl settings
[default]
	output = table
	context = home ; trailing comment

[Context "home"]
	url = http://nas:9091/transmission/rpc/
	Match = "name %% identifier # literal"
	user = "  padded  "

[context "work.box"]
	url = http://10.0.0.2:8080/api/v2/
	verbose
"#;

    fn key(raw: &str) -> Key {
        Key::parse(raw).expect("valid key")
    }

    #[test]
    fn keys_split_on_first_and_last_dot() -> ConfigResult<()> {
        assert_eq!(Key::parse("Default.Output")?, Key::new("default", None, "output"));
        let nested = Key::parse("context.work.box.url")?;
        assert_eq!(nested.subsection.as_deref(), Some("work.box"));
        assert_eq!(nested.to_string(), "context.work.box.url");
        for invalid in ["output", "default.", ".output", "context..url", "a b.c"] {
            assert!(matches!(Key::parse(invalid), Err(ConfigError::InvalidKey { .. })), "{invalid}");
        }
        Ok(())
    }

    #[test]
    fn parses_sections_comments_and_quotes() -> ConfigResult<()> {
        let document = Document::parse(SAMPLE)?;
        assert_eq!(document.get(&key("default.context")), Some("home"));
        assert_eq!(document.get(&key("context.home.match")), Some("name %% identifier # literal"));
        assert_eq!(document.get(&key("context.home.user")), Some("  padded  "));
        assert_eq!(document.get(&key("context.work.box.verbose")), Some("true"));
        assert_eq!(document.get(&key("context.Home.url")), None);
        assert!(document.has_section("CONTEXT", Some("work.box")));
        Ok(())
    }

    #[test]
    fn serialisation_round_trips() -> ConfigResult<()> {
        let document = Document::parse(SAMPLE)?;
        let rendered = document.to_string();
        assert!(rendered.starts_with("[default]\n\toutput = table\n"));
        assert!(rendered.contains("\tuser = \"  padded  \"\n"));
        assert_eq!(Document::parse(&rendered)?, document);
        Ok(())
    }

    #[test]
    fn set_replaces_or_appends() -> ConfigResult<()> {
        let mut document = Document::parse("[default]\n\toutput = table\n")?;
        document.set(&key("default.output"), "json");
        document.set(&key("context.nas.url"), "http://nas/");
        document.set(&key("default.timeout"), "30s");
        assert_eq!(
            document.to_string(),
            "[default]\n\toutput = json\n\ttimeout = 30s\n[context \"nas\"]\n\turl = http://nas/\n"
        );
        Ok(())
    }

    #[test]
    fn unset_drops_emptied_sections() -> ConfigResult<()> {
        let mut document = Document::parse("[default]\n\toutput = table\n[context \"a\"]\n\turl = x\n")?;
        assert!(document.unset(&key("context.a.url")));
        assert!(!document.unset(&key("context.a.url")));
        assert!(!document.has_section("context", Some("a")));
        assert_eq!(document.entries(), vec![("default.output".to_string(), "table".to_string())]);
        Ok(())
    }

    #[test]
    fn syntax_errors_report_lines() {
        for (text, line) in [
            ("output = table", 1),
            ("[default]\n\n[broken", 3),
            ("[default]\nx = \"open", 2),
            ("[context home]", 1),
        ] {
            match Document::parse(text) {
                Err(ConfigError::Syntax { line: found, .. }) => assert_eq!(found, line, "{text}"),
                other => panic!("expected syntax error for {text:?}, got {other:?}"),
            }
        }
    }
}
