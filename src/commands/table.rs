//! Persisted command table
//!
//! The table maps a command-type name to its pattern specification. Iteration
//! order is part of the matching contract — command types are tried in table
//! order and the first matching pattern wins — so entries live in an
//! [`IndexMap`] and the JSON document preserves insertion order.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::commands::executor::HandlerKind;
use crate::{Error, Result};

/// Pattern specification for one command type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Regex sources, tried in order; first match wins
    pub patterns: Vec<String>,

    /// Name of the handler to invoke (resolved against [`HandlerKind`])
    pub function: String,

    /// App-name aliases for "open" commands (alias → target identifier/URL)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apps: Option<IndexMap<String, String>>,

    /// Recognized item-type names for "create" commands
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<String>>,
}

/// Extra per-type data merged in by [`CommandTable::merge`]
#[derive(Debug, Clone, Default)]
pub struct SpecExtras {
    /// App aliases, merged key-by-key into an existing alias map
    pub apps: Option<IndexMap<String, String>>,

    /// Item-type names, replacing an existing list wholesale
    pub types: Option<Vec<String>>,
}

/// The command table, tied to the path it persists at
#[derive(Debug, Clone)]
pub struct CommandTable {
    path: PathBuf,
    specs: IndexMap<String, CommandSpec>,
}

impl CommandTable {
    /// Load the table from `path`, or write the default table there on first
    /// run
    ///
    /// Entries naming a handler [`HandlerKind`] does not recognize are kept
    /// (they degrade to a "not implemented" result at dispatch) but warned
    /// about here.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, parsed, or created
    pub fn load_or_create(path: &Path) -> Result<Self> {
        let specs = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content)
                .map_err(|e| Error::CommandTable(format!("invalid table file: {e}")))?
        } else {
            default_specs()
        };

        let table = Self {
            path: path.to_path_buf(),
            specs,
        };

        for (name, spec) in &table.specs {
            if HandlerKind::from_name(&spec.function).is_none() {
                tracing::warn!(
                    command = %name,
                    function = %spec.function,
                    "command names an unimplemented handler"
                );
            }
        }

        if !path.exists() {
            table.save()?;
            tracing::info!(path = %path.display(), "wrote default command table");
        } else {
            tracing::debug!(
                path = %path.display(),
                commands = table.specs.len(),
                "loaded command table"
            );
        }

        Ok(table)
    }

    /// Persist the whole table to its configured path
    ///
    /// The document is written to a temporary file in the same directory and
    /// atomically renamed over the target, so a crash mid-write never leaves
    /// a truncated table.
    ///
    /// # Errors
    ///
    /// Returns error if the write fails
    pub fn save(&self) -> Result<()> {
        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)?;

        let content = serde_json::to_string_pretty(&self.specs)?;
        let tmp = tempfile::NamedTempFile::new_in(parent)?;
        std::fs::write(tmp.path(), content)?;
        tmp.persist(&self.path)
            .map_err(|e| Error::CommandTable(format!("failed to persist table: {e}")))?;

        tracing::debug!(path = %self.path.display(), "saved command table");
        Ok(())
    }

    /// Merge a command definition into the table
    ///
    /// A new type gets a fresh spec. An existing type has the new patterns
    /// appended (duplicates are not removed), its `function` overwritten, app
    /// aliases merged key-by-key, and the item-type list replaced. The caller
    /// is responsible for re-persisting and re-compiling.
    pub fn merge(&mut self, cmd_type: &str, patterns: Vec<String>, function: &str, extras: SpecExtras) {
        if let Some(spec) = self.specs.get_mut(cmd_type) {
            spec.patterns.extend(patterns);
            spec.function = function.to_string();
            if let Some(apps) = extras.apps {
                spec.apps.get_or_insert_with(IndexMap::new).extend(apps);
            }
            if let Some(types) = extras.types {
                spec.types = Some(types);
            }
        } else {
            self.specs.insert(
                cmd_type.to_string(),
                CommandSpec {
                    patterns,
                    function: function.to_string(),
                    apps: extras.apps,
                    types: extras.types,
                },
            );
        }
    }

    /// Look up a command type
    #[must_use]
    pub fn get(&self, cmd_type: &str) -> Option<&CommandSpec> {
        self.specs.get(cmd_type)
    }

    /// All specs in table order
    #[must_use]
    pub const fn specs(&self) -> &IndexMap<String, CommandSpec> {
        &self.specs
    }

    /// The path this table loads from and saves to
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// The built-in command set, written to disk on first run
fn default_specs() -> IndexMap<String, CommandSpec> {
    let mut specs = IndexMap::new();

    specs.insert(
        "open".to_string(),
        CommandSpec {
            patterns: vec![
                r"open\s+(\w+(?:\s+\w+)*)".to_string(),
                r"launch\s+(\w+(?:\s+\w+)*)".to_string(),
                r"start\s+(\w+(?:\s+\w+)*)".to_string(),
            ],
            function: "open_application".to_string(),
            apps: Some(IndexMap::from([
                ("github".to_string(), "github.com".to_string()),
                ("browser".to_string(), "web_browser".to_string()),
                ("terminal".to_string(), "terminal".to_string()),
                ("vs code".to_string(), "vscode".to_string()),
                ("cursor".to_string(), "cursor_editor".to_string()),
                ("word".to_string(), "ms_word".to_string()),
                ("instagram".to_string(), "instagram.com".to_string()),
            ])),
            types: None,
        },
    );

    specs.insert(
        "find_file".to_string(),
        CommandSpec {
            patterns: vec![
                r#"find\s+(?:the\s+)?(?:file|files)?\s+(?:named|called)?\s+["']?([^"']+)["']?(?:\s+in\s+(.+))?"#.to_string(),
                r#"locate\s+(?:the\s+)?(?:file|files)?\s+(?:named|called)?\s+["']?([^"']+)["']?(?:\s+in\s+(.+))?"#.to_string(),
                r#"find\s+["']?([^"']+)["']?(?:\s+in\s+(.+))?"#.to_string(),
                r#"where\s+(?:is|are)\s+(?:the\s+)?(?:file|files)?\s+["']?([^"']+)["']?(?:\s+in\s+(.+))?"#.to_string(),
            ],
            function: "find_files".to_string(),
            apps: None,
            types: None,
        },
    );

    specs.insert(
        "web_search".to_string(),
        CommandSpec {
            patterns: vec![
                r"search\s+(?:the\s+)?(?:web|internet|online)\s+for\s+(.+)".to_string(),
                r"look\s+up\s+online\s+(.+)".to_string(),
                r"google\s+(.+)".to_string(),
            ],
            function: "web_search".to_string(),
            apps: None,
            types: None,
        },
    );

    specs.insert(
        "system".to_string(),
        CommandSpec {
            patterns: vec![
                r"shut\s*down(?:\s+(?:the\s+)?system)?".to_string(),
                r"reboot(?:\s+(?:the\s+)?system)?".to_string(),
                r"restart(?:\s+(?:the\s+)?system)?".to_string(),
            ],
            function: "system_control".to_string(),
            apps: None,
            types: None,
        },
    );

    specs.insert(
        "create".to_string(),
        CommandSpec {
            patterns: vec![
                r#"create\s+(?:a\s+)?(?:new\s+)?(\w+(?:\s+\w+)*)\s+(?:named|called)?\s+["']?([^"']+)["']?(?:\s+in\s+(.+))?"#.to_string(),
                r#"make\s+(?:a\s+)?(?:new\s+)?(\w+(?:\s+\w+)*)\s+(?:named|called)?\s+["']?([^"']+)["']?(?:\s+in\s+(.+))?"#.to_string(),
                r#"new\s+(\w+(?:\s+\w+)*)\s+(?:named|called)?\s+["']?([^"']+)["']?(?:\s+in\s+(.+))?"#.to_string(),
            ],
            function: "create_item".to_string(),
            apps: None,
            types: Some(
                [
                    "project", "file", "folder", "directory", "document", "spreadsheet",
                    "presentation", "text file", "python file", "javascript file", "html file",
                    "css file", "markdown file", "json file", "yaml file", "xml file",
                    "database", "script", "note", "todo list", "reminder",
                ]
                .iter()
                .map(ToString::to_string)
                .collect(),
            ),
        },
    );

    specs.insert(
        "wifi".to_string(),
        CommandSpec {
            patterns: vec![
                r"(connect|disconnect)(?:\s+(?:from|to))?\s+(?:the\s+)?wi-?fi".to_string(),
                r"turn\s+(on|off)\s+(?:the\s+)?wi-?fi".to_string(),
            ],
            function: "control_wifi".to_string(),
            apps: None,
            types: None,
        },
    );

    specs.insert(
        "timer".to_string(),
        CommandSpec {
            patterns: vec![
                r"set\s+(?:a\s+)?timer\s+for\s+(\d+)\s+(second|minute|hour)s?".to_string(),
                r"remind\s+me\s+in\s+(\d+)\s+(second|minute|hour)s?".to_string(),
            ],
            function: "set_timer".to_string(),
            apps: None,
            types: None,
        },
    );

    specs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_order() {
        let specs = default_specs();
        let order: Vec<&str> = specs.keys().map(String::as_str).collect();
        assert_eq!(
            order,
            ["open", "find_file", "web_search", "system", "create", "wifi", "timer"]
        );
    }

    #[test]
    fn test_first_run_writes_default_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commands.json");

        let table = CommandTable::load_or_create(&path).unwrap();
        assert!(path.exists());
        assert_eq!(table.specs().len(), 7);
    }

    #[test]
    fn test_persisted_table_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commands.json");

        let first = CommandTable::load_or_create(&path).unwrap();
        let second = CommandTable::load_or_create(&path).unwrap();

        assert_eq!(first.specs(), second.specs());
        let order: Vec<&String> = second.specs().keys().collect();
        assert_eq!(order[0], "open");
        assert_eq!(order[6], "timer");
    }

    #[test]
    fn test_merge_new_type() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = CommandTable::load_or_create(&dir.path().join("c.json")).unwrap();

        table.merge(
            "music",
            vec![r"play\s+(.+)".to_string()],
            "play_music",
            SpecExtras::default(),
        );

        let spec = table.get("music").unwrap();
        assert_eq!(spec.patterns, vec![r"play\s+(.+)"]);
        assert_eq!(spec.function, "play_music");
        // New types land at the end of the match order
        assert_eq!(table.specs().keys().last().unwrap(), "music");
    }

    #[test]
    fn test_merge_existing_type_appends_patterns() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = CommandTable::load_or_create(&dir.path().join("c.json")).unwrap();

        let before = table.get("timer").unwrap().patterns.len();
        table.merge(
            "timer",
            vec![r"countdown\s+(\d+)\s+(second|minute|hour)s?".to_string()],
            "set_timer",
            SpecExtras::default(),
        );

        let spec = table.get("timer").unwrap();
        assert_eq!(spec.patterns.len(), before + 1);
        assert_eq!(spec.function, "set_timer");
    }

    #[test]
    fn test_merge_apps_key_by_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = CommandTable::load_or_create(&dir.path().join("c.json")).unwrap();

        table.merge(
            "open",
            Vec::new(),
            "open_application",
            SpecExtras {
                apps: Some(IndexMap::from([
                    ("github".to_string(), "github.com/d33p0st".to_string()),
                    ("slack".to_string(), "slack_app".to_string()),
                ])),
                types: None,
            },
        );

        let apps = table.get("open").unwrap().apps.as_ref().unwrap();
        // Existing key overwritten, new key added, others untouched
        assert_eq!(apps.get("github").unwrap(), "github.com/d33p0st");
        assert_eq!(apps.get("slack").unwrap(), "slack_app");
        assert_eq!(apps.get("terminal").unwrap(), "terminal");
    }

    #[test]
    fn test_corrupt_table_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commands.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(CommandTable::load_or_create(&path).is_err());
    }
}
