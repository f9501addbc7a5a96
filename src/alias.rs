//! Alias definitions
//!
//! Parses and stores `alias NAME=VALUE` definitions the way a shell does:
//! full `alias`/`unalias` command lines in, definition updates or printable
//! output back. Definitions can be loaded from and persisted to an alias
//! file, and completion candidates are produced for partially typed
//! `alias`/`unalias` command lines.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use regex::Regex;

const ALIAS: &str = "alias";
const ALIAS_SPACE: &str = "alias ";
const UNALIAS: &str = "unalias";
const UNALIAS_SPACE: &str = "unalias ";
const HELP: &str = "--help";

/// One alias definition, ordered by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    name: String,
    value: String,
}

impl Alias {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Completion candidates for a partially typed alias command line.
///
/// `offset` is the buffer position the candidates replace from; `None`
/// leaves the caller's default (start of buffer) in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasCompletion {
    pub candidates: Vec<String>,
    pub offset: Option<usize>,
}

/// Stores alias definitions and interprets `alias`/`unalias` command lines.
pub struct AliasManager {
    aliases: Vec<Alias>,
    alias_file: Option<PathBuf>,
    persist_enabled: bool,
    shell_name: String,
    define_pattern: Regex,
    list_pattern: Regex,
    alias_help_pattern: Regex,
    unalias_help_pattern: Regex,
}

impl AliasManager {
    /// Manager seeded from `alias_file` if it exists. With `persist` set,
    /// every definition change is written back to the file.
    pub fn new(alias_file: Option<PathBuf>, persist: bool, shell_name: &str) -> Result<Self> {
        let mut manager = Self {
            aliases: Vec::new(),
            alias_file,
            persist_enabled: persist,
            shell_name: shell_name.to_string(),
            define_pattern: Regex::new(r"^(alias)\s+(\w+)\s*=\s*(.*)$").expect("define pattern"),
            list_pattern: Regex::new(r"^(alias)((\s+\w+)+)$").expect("list pattern"),
            alias_help_pattern: Regex::new(r"^(alias)\s+--help$").expect("alias help pattern"),
            unalias_help_pattern: Regex::new(r"^(unalias)\s+--help$").expect("unalias help pattern"),
        };
        manager.read_aliases_from_file()?;
        Ok(manager)
    }

    fn read_aliases_from_file(&mut self) -> Result<()> {
        let Some(path) = &self.alias_file else {
            return Ok(());
        };
        if !path.is_file() {
            return Ok(());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read alias file {}", path.display()))?;
        for line in contents.lines() {
            if line.starts_with(ALIAS) {
                // Unparseable lines are skipped, same as a shell sourcing
                // a dotfile.
                let _ = self.parse_alias(line);
            }
        }
        Ok(())
    }

    /// Write the current definitions to the alias file, sorted, one
    /// `alias NAME='VALUE'` per line
    pub fn persist(&self) -> Result<()> {
        let Some(path) = &self.alias_file else {
            return Ok(());
        };
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create alias directory {}", dir.display()))?;
        }
        // Atomic write: write to temp file then rename
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, self.print_all_aliases())
            .with_context(|| format!("Failed to write aliases to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path)
            .with_context(|| format!("Failed to rename alias file to {}", path.display()))?;
        Ok(())
    }

    fn persist_if_enabled(&self) {
        if self.persist_enabled {
            if let Err(err) = self.persist() {
                log::warn!("failed to persist aliases: {err:#}");
            }
        }
    }

    /// Define or redefine an alias
    pub fn add_alias(&mut self, name: &str, value: &str) {
        self.aliases.retain(|a| a.name != name);
        self.aliases.push(Alias::new(name, value));
        self.persist_if_enabled();
    }

    /// Look up one alias by name
    pub fn get_alias(&self, name: &str) -> Option<&Alias> {
        self.aliases.iter().find(|a| a.name == name)
    }

    /// Names starting with `prefix`
    pub fn find_all_matching_names(&self, prefix: &str) -> Vec<String> {
        self.aliases
            .iter()
            .filter(|a| a.name.starts_with(prefix))
            .map(|a| a.name.clone())
            .collect()
    }

    /// All defined names
    pub fn get_all_names(&self) -> Vec<String> {
        self.aliases.iter().map(|a| a.name.clone()).collect()
    }

    /// Every definition as `alias NAME='VALUE'` lines, sorted by name
    pub fn print_all_aliases(&self) -> String {
        let mut sorted: Vec<&Alias> = self.aliases.iter().collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));
        let mut out = String::new();
        for alias in sorted {
            out.push_str(&format!("{ALIAS_SPACE}{}='{}'\n", alias.name, alias.value));
        }
        out
    }

    /// Interpret a full `alias ...` command line.
    ///
    /// Returns printable output (definition listings or usage text), or
    /// `None` when the line defined an alias or was not an alias command at
    /// all.
    pub fn parse_alias(&mut self, buffer: &str) -> Option<String> {
        if buffer.trim() == ALIAS {
            return Some(self.print_all_aliases());
        }
        if self.alias_help_pattern.is_match(buffer) {
            return Some(alias_usage());
        }

        if let Some(caps) = self.define_pattern.captures(buffer) {
            let name = caps.get(2).expect("name group").as_str();
            let mut value = caps.get(3).expect("value group").as_str();
            if let Some(stripped) = value.strip_prefix('\'') {
                match stripped.strip_suffix('\'') {
                    Some(inner) => value = inner,
                    None => return Some(alias_usage()),
                }
            } else if let Some(stripped) = value.strip_prefix('"') {
                match stripped.strip_suffix('"') {
                    Some(inner) => value = inner,
                    None => return Some(alias_usage()),
                }
            }
            let (name, value) = (name.to_string(), value.to_string());
            self.add_alias(&name, &value);
            return None;
        }

        if let Some(caps) = self.list_pattern.captures(buffer) {
            let mut out = String::new();
            for name in caps
                .get(2)
                .expect("names group")
                .as_str()
                .trim()
                .split(' ')
                .filter(|s| !s.is_empty())
            {
                match self.get_alias(name.trim()) {
                    Some(alias) => {
                        out.push_str(&format!("{ALIAS_SPACE}{}='{}'\n", alias.name, alias.value));
                    }
                    None => {
                        out.push_str(&format!("{}: alias: {} : not found\n", self.shell_name, name));
                    }
                }
            }
            return Some(out);
        }

        None
    }

    /// Interpret a full `unalias ...` command line. Returns usage or
    /// not-found text, `None` when every named alias was removed.
    pub fn remove_alias(&mut self, buffer: &str) -> Option<String> {
        if buffer.trim() == UNALIAS {
            return Some(unalias_usage());
        }
        if self.unalias_help_pattern.is_match(buffer) {
            return Some(unalias_usage());
        }

        let names = buffer.strip_prefix(UNALIAS).unwrap_or(buffer).trim().to_string();
        for name in names.split(' ').filter(|s| !s.is_empty()) {
            let name = name.trim();
            if self.get_alias(name).is_some() {
                self.aliases.retain(|a| a.name != name);
                self.persist_if_enabled();
            } else {
                return Some(format!("{}: unalias: {}: not found\n", self.shell_name, name));
            }
        }
        None
    }

    /// Completion candidates for a partially typed alias command line,
    /// mirroring shell behavior: alias names matching the buffer, the
    /// `alias`/`unalias` words themselves, all names right after the
    /// command word, and `--help`.
    pub fn completion_candidates(&self, buffer: &str, cursor: usize) -> AliasCompletion {
        let mut completion = AliasCompletion {
            candidates: self.find_all_matching_names(buffer.trim()),
            offset: None,
        };

        if ALIAS.starts_with(buffer) {
            completion.candidates.push(ALIAS.to_string());
        } else if UNALIAS.starts_with(buffer) {
            completion.candidates.push(UNALIAS.to_string());
        } else if buffer == ALIAS_SPACE || buffer == UNALIAS_SPACE {
            completion.candidates.extend(self.get_all_names());
            completion.candidates.push(HELP.to_string());
            completion.offset = Some(cursor);
        } else if buffer.starts_with(ALIAS_SPACE) || buffer.starts_with(UNALIAS_SPACE) {
            let word = word_closest_to_cursor(buffer, cursor);
            completion
                .candidates
                .extend(self.find_all_matching_names(&word));
            if HELP.starts_with(&word) {
                completion.candidates.push(HELP.to_string());
            }
            completion.offset = Some(cursor.saturating_sub(word.len()));
        }

        completion
    }
}

fn alias_usage() -> String {
    "alias: usage: alias [name[=value] ... ]\n".to_string()
}

fn unalias_usage() -> String {
    "unalias: usage: unalias name [name ...]\n".to_string()
}

/// The whitespace-delimited word immediately before the cursor
fn word_closest_to_cursor(buffer: &str, cursor: usize) -> String {
    let upto = &buffer[..cursor.min(buffer.len())];
    upto.rsplit(char::is_whitespace)
        .next()
        .unwrap_or("")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager() -> AliasManager {
        AliasManager::new(None, false, "crab").unwrap()
    }

    #[test]
    fn test_parse_alias_definitions_and_listing() {
        let mut manager = manager();

        assert_eq!(manager.parse_alias("alias foo2='bar -s -h'"), None);
        assert_eq!(manager.parse_alias("alias foo=bar"), None);
        assert_eq!(manager.parse_alias("alias foo3=bar --help"), None);

        assert_eq!(manager.parse_alias("alias foo"), Some("alias foo='bar'\n".to_string()));
        assert_eq!(
            manager.parse_alias("alias foo2"),
            Some("alias foo2='bar -s -h'\n".to_string())
        );
        assert_eq!(
            manager.parse_alias("alias foo3"),
            Some("alias foo3='bar --help'\n".to_string())
        );

        let all = manager.parse_alias("alias").unwrap();
        assert_eq!(
            all,
            "alias foo='bar'\nalias foo2='bar -s -h'\nalias foo3='bar --help'\n"
        );
    }

    #[test]
    fn test_parse_alias_usage_cases() {
        let mut manager = manager();
        assert_eq!(manager.parse_alias("alias --help"), Some(alias_usage()));
        // Unterminated quote
        assert_eq!(manager.parse_alias("alias foo='bar"), Some(alias_usage()));
        assert_eq!(manager.parse_alias("alias foo=\"bar"), Some(alias_usage()));
        // Not an alias command at all
        assert_eq!(manager.parse_alias("ls -la"), None);
    }

    #[test]
    fn test_redefinition_replaces() {
        let mut manager = manager();
        manager.parse_alias("alias foo=bar");
        manager.parse_alias("alias foo=baz");
        assert_eq!(manager.get_alias("foo").unwrap().value(), "baz");
        assert_eq!(manager.get_all_names().len(), 1);
    }

    #[test]
    fn test_unalias() {
        let mut manager = manager();
        manager.parse_alias("alias foo2='bar -s -h'");
        manager.parse_alias("alias foo=bar");
        manager.parse_alias("alias foo3=bar --help");

        assert_eq!(manager.remove_alias("unalias foo3"), None);
        assert_eq!(
            manager.remove_alias("unalias foo3"),
            Some("crab: unalias: foo3: not found\n".to_string())
        );
        assert_eq!(manager.remove_alias("unalias"), Some(unalias_usage()));
        assert_eq!(manager.remove_alias("unalias --help"), Some(unalias_usage()));
    }

    #[test]
    fn test_list_unknown_alias() {
        let mut manager = manager();
        manager.parse_alias("alias foo=bar");
        assert_eq!(
            manager.parse_alias("alias foo nope"),
            Some("alias foo='bar'\ncrab: alias: nope : not found\n".to_string())
        );
    }

    #[test]
    fn test_print_all_aliases_sorted() {
        let mut manager = manager();
        manager.parse_alias("alias zz=last");
        manager.parse_alias("alias aa=first");
        assert_eq!(manager.print_all_aliases(), "alias aa='first'\nalias zz='last'\n");
    }

    #[test]
    fn test_matching_names() {
        let mut manager = manager();
        manager.parse_alias("alias gco='git checkout'");
        manager.parse_alias("alias gst='git status'");
        manager.parse_alias("alias ll='ls -l'");
        let mut names = manager.find_all_matching_names("g");
        names.sort();
        assert_eq!(names, vec!["gco".to_string(), "gst".to_string()]);
    }

    #[test]
    fn test_load_and_persist_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("aliasrc");
        std::fs::write(&path, "alias foo='bar'\nnot an alias line\nalias broken\n").unwrap();

        let mut manager = AliasManager::new(Some(path.clone()), true, "crab").unwrap();
        assert_eq!(manager.get_alias("foo").unwrap().value(), "bar");

        manager.parse_alias("alias baz=qux");
        drop(manager);

        let reloaded = AliasManager::new(Some(path), false, "crab").unwrap();
        assert_eq!(reloaded.get_alias("baz").unwrap().value(), "qux");
        assert_eq!(reloaded.get_all_names().len(), 2);
    }

    #[test]
    fn test_completion_for_command_word() {
        let manager = manager();
        let completion = manager.completion_candidates("al", 2);
        assert!(completion.candidates.contains(&"alias".to_string()));
        let completion = manager.completion_candidates("una", 3);
        assert!(completion.candidates.contains(&"unalias".to_string()));
    }

    #[test]
    fn test_completion_after_command_word() {
        let mut manager = manager();
        manager.parse_alias("alias foo=bar");
        manager.parse_alias("alias fib=seq");

        let completion = manager.completion_candidates("alias ", 6);
        assert!(completion.candidates.contains(&"foo".to_string()));
        assert!(completion.candidates.contains(&"fib".to_string()));
        assert!(completion.candidates.contains(&"--help".to_string()));
        assert_eq!(completion.offset, Some(6));
    }

    #[test]
    fn test_completion_of_partial_name() {
        let mut manager = manager();
        manager.parse_alias("alias foo=bar");
        manager.parse_alias("alias fib=seq");

        let completion = manager.completion_candidates("unalias f", 9);
        assert!(completion.candidates.contains(&"foo".to_string()));
        assert!(completion.candidates.contains(&"fib".to_string()));
        assert_eq!(completion.offset, Some(8));
    }
}
