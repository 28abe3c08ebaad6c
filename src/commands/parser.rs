//! Transcription parsing
//!
//! Turns a raw transcription string into a structured [`ParsedCommand`] by
//! matching it against the command table's regex patterns, with a
//! keyword-scoring inference fallback when nothing matches. Parsing is total:
//! every input yields a record, worst case the "unknown" sentinel.

use std::path::Path;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::commands::table::{CommandTable, SpecExtras};
use crate::{Error, Result};

/// Sentinel command-type name for unrecognized input
pub const UNKNOWN_COMMAND: &str = "unknown";

/// Similarity cutoff for approximate app-name lookup
const APP_MATCH_CUTOFF: f64 = 0.7;

/// Keyword phrases per command type, used by the inference fallback
///
/// Tried in listed order; on tied scores the first maximal entry wins.
const INTENT_KEYWORDS: &[(&str, &[&str])] = &[
    ("open", &["open", "launch", "start", "run"]),
    ("find_file", &["find", "locate", "where is", "search for file"]),
    ("web_search", &["search web", "look up online", "google", "browser search"]),
    ("system", &["shutdown", "restart", "reboot", "turn off"]),
    ("create", &["create", "make", "new", "generate"]),
    ("wifi", &["wifi", "internet", "connect", "disconnect"]),
    ("timer", &["timer", "remind", "alarm"]),
];

/// Structured result of parsing one transcription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedCommand {
    /// Matched command-type name, or [`UNKNOWN_COMMAND`]
    pub command: String,

    /// Handler name to dispatch to; absent for the unknown sentinel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,

    /// Captured regex groups in match order; optional groups that did not
    /// participate are `None`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Option<String>>,

    /// Normalized (lowercased, trimmed) input text
    pub raw_text: String,

    /// The original transcription, verbatim
    pub transcription: String,

    /// Resolved open target (app identifier or URL)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Alias key that matched approximately, when fuzzy lookup was used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_name: Option<String>,

    /// Item type for "create" commands
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,

    /// Item name for "create" commands
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,

    /// Location for "create" / "find_file" commands
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// File pattern for "find_file" commands
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_pattern: Option<String>,

    /// True when this record came from keyword inference, not a pattern
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub inferred: bool,

    /// Inference confidence in [0, 1]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl ParsedCommand {
    /// The unknown sentinel, carrying only the verbatim transcription
    #[must_use]
    pub fn unknown(transcription: &str) -> Self {
        Self {
            command: UNKNOWN_COMMAND.to_string(),
            function: None,
            params: Vec::new(),
            raw_text: transcription.to_lowercase().trim().to_string(),
            transcription: transcription.to_string(),
            target: None,
            matched_name: None,
            item_type: None,
            item_name: None,
            location: None,
            file_pattern: None,
            inferred: false,
            confidence: None,
        }
    }

    fn matched(command: &str, function: &str, text: &str, transcription: &str) -> Self {
        Self {
            command: command.to_string(),
            function: Some(function.to_string()),
            params: Vec::new(),
            raw_text: text.to_string(),
            transcription: transcription.to_string(),
            target: None,
            matched_name: None,
            item_type: None,
            item_name: None,
            location: None,
            file_pattern: None,
            inferred: false,
            confidence: None,
        }
    }

    /// Whether this is the unknown sentinel
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.command == UNKNOWN_COMMAND
    }

    /// Captured group by index, when it participated in the match
    #[must_use]
    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).and_then(Option::as_deref)
    }
}

/// One audit-trail entry, recorded per successful match
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    /// When the command was parsed
    pub at: DateTime<Utc>,

    /// The transcription as received
    pub transcription: String,

    /// The parse result
    pub command: ParsedCommand,
}

/// Parses transcriptions against the command table
pub struct CommandParser {
    table: CommandTable,
    compiled: IndexMap<String, Vec<Regex>>,
    history: Vec<HistoryEntry>,
}

impl CommandParser {
    /// Create a parser over a loaded command table
    ///
    /// All patterns are compiled up front; a table carrying an invalid regex
    /// cannot be parsed against and is a setup error.
    ///
    /// # Errors
    ///
    /// Returns error if any pattern fails to compile
    pub fn new(table: CommandTable) -> Result<Self> {
        let compiled = compile_table(&table)?;
        Ok(Self {
            table,
            compiled,
            history: Vec::new(),
        })
    }

    /// Load the table at `path` (writing the default table on first run) and
    /// build a parser over it
    ///
    /// # Errors
    ///
    /// Returns error if the table cannot be loaded or a pattern is invalid
    pub fn from_path(path: &Path) -> Result<Self> {
        Self::new(CommandTable::load_or_create(path)?)
    }

    /// Parse a transcription into a command record
    ///
    /// Never fails: input that matches no pattern and scores zero on every
    /// keyword list yields the unknown sentinel.
    pub fn parse(&mut self, transcription: &str) -> ParsedCommand {
        let text = transcription.to_lowercase().trim().to_string();

        let result = self
            .match_patterns(&text, transcription)
            .or_else(|| self.infer_intent(&text, transcription));

        match result {
            Some(parsed) => {
                tracing::debug!(
                    command = %parsed.command,
                    inferred = parsed.inferred,
                    "parsed command"
                );
                self.history.push(HistoryEntry {
                    at: Utc::now(),
                    transcription: transcription.to_string(),
                    command: parsed.clone(),
                });
                parsed
            }
            None => {
                tracing::debug!(text = %text, "no command recognized");
                ParsedCommand::unknown(transcription)
            }
        }
    }

    /// Try every pattern in table order; first match anywhere in the text wins
    fn match_patterns(&self, text: &str, transcription: &str) -> Option<ParsedCommand> {
        for (cmd_type, regexes) in &self.compiled {
            for regex in regexes {
                let Some(caps) = regex.captures(text) else {
                    continue;
                };

                let spec = self.table.get(cmd_type)?;
                let mut parsed = ParsedCommand::matched(cmd_type, &spec.function, text, transcription);
                parsed.params = caps
                    .iter()
                    .skip(1)
                    .map(|group| group.map(|m| m.as_str().to_string()))
                    .collect();

                self.enrich(&mut parsed);
                return Some(parsed);
            }
        }
        None
    }

    /// Fill in command-type-specific fields on a fresh pattern match
    fn enrich(&self, parsed: &mut ParsedCommand) {
        match parsed.command.as_str() {
            "open" => {
                if let Some(app_name) = parsed.param(0).map(str::to_lowercase) {
                    self.resolve_open_target(parsed, &app_name);
                }
            }
            "create" => {
                if let Some(item_type) = parsed.param(0) {
                    parsed.item_type = Some(item_type.to_lowercase());
                    parsed.item_name = parsed.param(1).map(ToString::to_string);
                    parsed.location = Some(
                        parsed
                            .param(2)
                            .unwrap_or("current directory")
                            .to_string(),
                    );
                }
            }
            "find_file" => {
                if let Some(file_pattern) = parsed.param(0) {
                    parsed.file_pattern = Some(file_pattern.to_string());
                    parsed.location = Some(parsed.param(1).unwrap_or(".").to_string());
                }
            }
            _ => {}
        }
    }

    /// Resolve an "open" target through the app-alias map
    ///
    /// Exact (case-insensitive) alias match wins and leaves `matched_name`
    /// unset; otherwise the closest alias at or above the similarity cutoff
    /// is used and recorded; otherwise the raw app name becomes the target.
    fn resolve_open_target(&self, parsed: &mut ParsedCommand, app_name: &str) {
        let apps = self.table.get("open").and_then(|spec| spec.apps.as_ref());
        let Some(apps) = apps else {
            parsed.target = Some(app_name.to_string());
            return;
        };

        if let Some((_, target)) = apps
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(app_name))
        {
            parsed.target = Some(target.clone());
            return;
        }

        let mut best: Option<(&String, &String, f64)> = None;
        for (alias, target) in apps {
            let score = strsim::jaro_winkler(app_name, &alias.to_lowercase());
            if score >= APP_MATCH_CUTOFF && best.is_none_or(|(_, _, b)| score > b) {
                best = Some((alias, target, score));
            }
        }

        if let Some((alias, target, score)) = best {
            tracing::debug!(app = %app_name, alias = %alias, score, "fuzzy app match");
            parsed.target = Some(target.clone());
            parsed.matched_name = Some(alias.clone());
        } else {
            parsed.target = Some(app_name.to_string());
        }
    }

    /// Keyword-containment fallback when no pattern matched
    ///
    /// Each command type is scored by how many of its keyword phrases appear
    /// as substrings of the text; the strictly highest nonzero score wins.
    fn infer_intent(&self, text: &str, transcription: &str) -> Option<ParsedCommand> {
        let mut best: Option<(&str, usize, usize)> = None;
        for &(cmd_type, phrases) in INTENT_KEYWORDS {
            let score = phrases.iter().filter(|phrase| text.contains(*phrase)).count();
            if score > 0 && best.is_none_or(|(_, b, _)| score > b) {
                best = Some((cmd_type, score, phrases.len()));
            }
        }

        let (cmd_type, score, phrase_count) = best?;
        tracing::debug!(command = %cmd_type, score, "inferred intent from keywords");

        #[allow(clippy::cast_precision_loss)]
        let confidence = score as f64 / phrase_count as f64;

        Some(ParsedCommand {
            command: cmd_type.to_string(),
            function: self.table.get(cmd_type).map(|spec| spec.function.clone()),
            params: Vec::new(),
            raw_text: text.to_string(),
            transcription: transcription.to_string(),
            target: None,
            matched_name: None,
            item_type: None,
            item_name: None,
            location: None,
            file_pattern: None,
            inferred: true,
            confidence: Some(confidence),
        })
    }

    /// Add or extend a command type, then persist the table
    ///
    /// New patterns are compiled before the table is touched, so an invalid
    /// regex leaves both the table and its file unchanged.
    ///
    /// # Errors
    ///
    /// Returns error on an invalid pattern or a persistence failure
    pub fn add_command(
        &mut self,
        cmd_type: &str,
        patterns: Vec<String>,
        function: &str,
        extras: SpecExtras,
    ) -> Result<()> {
        for pattern in &patterns {
            compile_pattern(pattern)?;
        }
        if crate::commands::HandlerKind::from_name(function).is_none() {
            tracing::warn!(function, "adding command with unimplemented handler");
        }

        self.table.merge(cmd_type, patterns, function, extras);
        self.table.save()?;

        let spec = self
            .table
            .get(cmd_type)
            .ok_or_else(|| Error::CommandTable(format!("missing spec for {cmd_type}")))?;
        let regexes = spec
            .patterns
            .iter()
            .map(|p| compile_pattern(p))
            .collect::<Result<Vec<_>>>()?;
        self.compiled.insert(cmd_type.to_string(), regexes);

        tracing::info!(command = %cmd_type, "command table updated");
        Ok(())
    }

    /// Suggestions for a partial command
    ///
    /// Reserved: always empty.
    /// TODO: prefix-match `partial` against command-type names and pattern
    /// literals once the suggestion UX is settled.
    #[must_use]
    pub fn get_suggestions(&self, _partial: &str) -> Vec<String> {
        Vec::new()
    }

    /// The in-memory audit trail, oldest first
    #[must_use]
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// The underlying command table
    #[must_use]
    pub const fn table(&self) -> &CommandTable {
        &self.table
    }
}

/// Compile every pattern in the table, keyed by command type in table order
fn compile_table(table: &CommandTable) -> Result<IndexMap<String, Vec<Regex>>> {
    let mut compiled = IndexMap::new();
    for (cmd_type, spec) in table.specs() {
        let regexes = spec
            .patterns
            .iter()
            .map(|p| compile_pattern(p))
            .collect::<Result<Vec<_>>>()?;
        compiled.insert(cmd_type.clone(), regexes);
    }
    Ok(compiled)
}

/// Compile one pattern with the matching semantics the table promises:
/// case-insensitive, unanchored search
fn compile_pattern(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| Error::CommandTable(format!("invalid pattern {pattern:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_parser() -> (tempfile::TempDir, CommandParser) {
        let dir = tempfile::tempdir().unwrap();
        let parser = CommandParser::from_path(&dir.path().join("commands.json")).unwrap();
        (dir, parser)
    }

    #[test]
    fn test_open_exact_alias() {
        let (_dir, mut parser) = test_parser();
        let parsed = parser.parse("open github");

        assert_eq!(parsed.command, "open");
        assert_eq!(parsed.function.as_deref(), Some("open_application"));
        assert_eq!(parsed.target.as_deref(), Some("github.com"));
        assert!(parsed.matched_name.is_none());
        assert_eq!(parsed.params, vec![Some("github".to_string())]);
    }

    #[test]
    fn test_open_fuzzy_alias() {
        let (_dir, mut parser) = test_parser();
        let parsed = parser.parse("open githb");

        assert_eq!(parsed.command, "open");
        assert_eq!(parsed.target.as_deref(), Some("github.com"));
        assert_eq!(parsed.matched_name.as_deref(), Some("github"));
    }

    #[test]
    fn test_open_unlisted_app_uses_raw_name() {
        let (_dir, mut parser) = test_parser();
        let parsed = parser.parse("open xylophone");

        assert_eq!(parsed.command, "open");
        assert_eq!(parsed.target.as_deref(), Some("xylophone"));
        assert!(parsed.matched_name.is_none());
    }

    #[test]
    fn test_normalization() {
        let (_dir, mut parser) = test_parser();
        let parsed = parser.parse("  OPEN GitHub  ");

        assert_eq!(parsed.raw_text, "open github");
        assert_eq!(parsed.transcription, "  OPEN GitHub  ");
        assert_eq!(parsed.target.as_deref(), Some("github.com"));
    }

    #[test]
    fn test_timer_params() {
        let (_dir, mut parser) = test_parser();
        let parsed = parser.parse("set a timer for 30 minutes");

        assert_eq!(parsed.command, "timer");
        assert_eq!(
            parsed.params,
            vec![Some("30".to_string()), Some("minute".to_string())]
        );
    }

    #[test]
    fn test_create_defaults_location() {
        let (_dir, mut parser) = test_parser();
        let parsed = parser.parse("create a python file called scraper");

        assert_eq!(parsed.command, "create");
        assert_eq!(parsed.item_type.as_deref(), Some("python file"));
        assert_eq!(parsed.item_name.as_deref(), Some("scraper"));
        assert_eq!(parsed.location.as_deref(), Some("current directory"));
    }

    #[test]
    fn test_find_file_before_web_search() {
        // "find ..." must hit find_file, which precedes web_search in table order
        let (_dir, mut parser) = test_parser();
        let parsed = parser.parse("find the file called notes.txt");

        assert_eq!(parsed.command, "find_file");
        assert_eq!(parsed.file_pattern.as_deref(), Some("notes.txt"));
        assert_eq!(parsed.location.as_deref(), Some("."));
    }

    #[test]
    fn test_unknown_preserves_transcription() {
        let (_dir, mut parser) = test_parser();
        let input = "What's The Weather Like Today";
        let parsed = parser.parse(input);

        assert!(parsed.is_unknown());
        assert_eq!(parsed.transcription, input);
        assert!(parsed.function.is_none());
        assert!(parsed.params.is_empty());
    }

    #[test]
    fn test_inference_scores_keywords() {
        let (_dir, mut parser) = test_parser();
        // No wifi pattern matches, but two wifi keywords are present
        let parsed = parser.parse("connect me to the internet please");

        assert_eq!(parsed.command, "wifi");
        assert!(parsed.inferred);
        assert_eq!(parsed.confidence, Some(0.5));
        assert_eq!(parsed.function.as_deref(), Some("control_wifi"));
    }

    #[test]
    fn test_parse_idempotent() {
        let (_dir, mut parser) = test_parser();
        let first = parser.parse("open github");
        let second = parser.parse("open github");

        assert_eq!(first, second);
        assert_eq!(parser.history().len(), 2);
    }

    #[test]
    fn test_history_skips_unknown() {
        let (_dir, mut parser) = test_parser();
        parser.parse("open github");
        parser.parse("complete gibberish xyzzy");

        assert_eq!(parser.history().len(), 1);
        assert_eq!(parser.history()[0].command.command, "open");
    }

    #[test]
    fn test_add_command_matches_afterwards() {
        let (_dir, mut parser) = test_parser();
        parser
            .add_command(
                "music",
                vec![r"play\s+(.+)".to_string()],
                "play_music",
                SpecExtras::default(),
            )
            .unwrap();

        let parsed = parser.parse("play some jazz");
        assert_eq!(parsed.command, "music");
        assert_eq!(parsed.function.as_deref(), Some("play_music"));
        assert_eq!(parsed.params, vec![Some("some jazz".to_string())]);
    }

    #[test]
    fn test_add_command_rejects_bad_regex() {
        let (_dir, mut parser) = test_parser();
        let err = parser.add_command(
            "broken",
            vec!["(unclosed".to_string()],
            "web_search",
            SpecExtras::default(),
        );

        assert!(err.is_err());
        // The table must be untouched
        assert!(parser.table().get("broken").is_none());
    }

    #[test]
    fn test_get_suggestions_reserved() {
        let (_dir, parser) = test_parser();
        assert!(parser.get_suggestions("ope").is_empty());
    }
}
