/*!
 * Common test utilities for the rentrans test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A small script exercising every protection category
pub const SAMPLE_SCRIPT: &str = r#"label start:
    # The first scene
    $ points = 0
    e "Hello there."
    e "Welcome to {b}the city{/b}, [player]!"
    "Nice to meet you."
    "" "The streets were **empty** that night."
    m "Hmm~~~ maybe ~later~." (multiple=2)
    e ""
    e "Hello there."
"#;

/// Route library logs to the test harness; safe to call from every test
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates the sample script in the specified directory
pub fn create_test_script(dir: &Path, filename: &str) -> Result<PathBuf> {
    create_test_file(dir, filename, SAMPLE_SCRIPT)
}

/// Lines of a text with their terminators
pub fn lines_of(text: &str) -> Vec<String> {
    text.split_inclusive('\n').map(str::to_string).collect()
}

/// Stand-in translator: applies plain text replacements to a unit file
pub fn translate_units(content: &str, replacements: &[(&str, &str)]) -> String {
    replacements
        .iter()
        .fold(content.to_string(), |text, (from, to)| text.replace(from, to))
}
