//! Shared test utilities

use std::path::PathBuf;

use aria_assistant::commands::{CommandExecutor, CommandParser};

/// Set up a parser over a fresh default table in a temp directory
#[must_use]
pub fn setup_parser() -> (tempfile::TempDir, CommandParser) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let parser = CommandParser::from_path(&dir.path().join("commands.json"))
        .expect("failed to build parser");
    (dir, parser)
}

/// Set up an executor over a fresh default table in a temp directory
#[must_use]
pub fn setup_executor() -> (tempfile::TempDir, CommandExecutor) {
    let (dir, parser) = setup_parser();
    (dir, CommandExecutor::new(parser))
}

/// Command table path inside a test temp directory
#[must_use]
pub fn table_path(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("commands.json")
}
