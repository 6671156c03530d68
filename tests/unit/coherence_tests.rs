/*!
 * Tests for the coherence rule chain and translation-file analysis
 */

use anyhow::Result;

use rentrans::app_config::{CoherenceConfig, Config};
use rentrans::app_controller::Controller;
use rentrans::validation::{CoherenceChecker, IssueType, LinePair, Severity};
use crate::common;

const TRANSLATION_FILE: &str = r#"# game/script.rpy:12
translate french start_a1:

    # e "Hello [name] {b}ok{/b}"
    e "Bonjour {b}ok{/b}"

# game/script.rpy:14
translate french start_a2:

    # e "Good morning."
    e "Good morning."

# game/script.rpy:16
translate french start_a3:

    # e "Let's go!"
    e "Allons-y !"

translate french strings:

    # game/screens.rpy:5
    old "Start"
    new "RENPY_CODE_001 Commencer"
"#;

fn checker() -> CoherenceChecker {
    CoherenceChecker::new(&CoherenceConfig::default())
}

/// Test that only the first qualifying rule is reported for a line
#[test]
fn test_checkLine_missingVariableWithTags_shouldReportVariableMismatchOnly() {
    let issue = checker().check_line(0, "Hello [name] {b}ok{/b}", "Bonjour {b}ok{/b}");

    let issue = issue.expect("a missing variable must be reported");
    assert_eq!(issue.issue_type, IssueType::VariableMismatch);
    assert_eq!(issue.severity(), Severity::Error);
}

/// Test that a leftover placeholder is reported even when OLD has the same text
#[test]
fn test_checkLine_placeholderPresentInOld_shouldStillBeReported() {
    let issue = checker().check_line(3, "Press RENPY_CODE_001", "Appuyez RENPY_CODE_001");
    assert_eq!(issue.map(|i| i.issue_type), Some(IssueType::PlaceholderNotRestored));
}

#[test]
fn test_checkLine_structuralPlaceholder_shouldBeReported() {
    let issue = checker().check_line(0, "\"Hello\"", "RENPY_NARRATOR\"Bonjour\"");
    assert_eq!(issue.map(|i| i.issue_type), Some(IssueType::PlaceholderNotRestored));
}

/// Test that the length-ratio rule only warns
#[test]
fn test_analyze_longTranslation_shouldWarnButPass() {
    let pairs = vec![LinePair::new(
        0,
        "\"Yes, I think so.\"",
        "\"Oui, je pense que c'est bien cela, absolument, sans aucun doute possible.\"",
    )];

    let report = checker().analyze(&pairs);

    assert_eq!(report.warning_count(), 1);
    assert_eq!(report.error_count(), 0);
    assert!(report.passed());
    assert_eq!(report.issues[0].issue_type, IssueType::LengthRatio);
}

#[test]
fn test_analyze_withRatioCheckDisabled_shouldBeClean() {
    let config = CoherenceConfig {
        check_length_ratio: false,
        ..CoherenceConfig::default()
    };
    let pairs = vec![LinePair::new(
        0,
        "\"Yes, I think so.\"",
        "\"Oui, je pense que c'est bien cela, absolument, sans aucun doute possible.\"",
    )];

    assert!(CoherenceChecker::new(&config).analyze(&pairs).issues.is_empty());
}

/// Test the whole check of a Ren'Py translation file through the controller
#[test]
fn test_checkTranslationFile_shouldReportOneIssuePerBadLine() -> Result<()> {
    common::init_logger();
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "tl/french/script.rpy", TRANSLATION_FILE)?;
    let controller = Controller::new_for_test()?;

    let report = controller.check_translation_file(&path)?;

    assert_eq!(report.lines_checked, 4);
    let found: Vec<(usize, IssueType)> = report.issues.iter().map(|i| (i.line, i.issue_type)).collect();
    assert_eq!(
        found,
        vec![
            (4, IssueType::VariableMismatch),
            (10, IssueType::Untranslated),
            (22, IssueType::PlaceholderNotRestored),
        ]
    );
    assert!(!report.passed());
    Ok(())
}

/// Test that placeholders of a configured custom pattern are caught too
#[test]
fn test_checkAlignedFiles_customPattern_shouldCatchLeftover() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let old = common::create_test_file(temp_dir.path(), "script.rpy", "label start:\n    e \"Press start.\"\n")?;
    let new = common::create_test_file(
        temp_dir.path(),
        "script.translated.rpy",
        "label start:\n    e \"Appuyez (B2) sur start.\"\n",
    )?;

    let mut config = Config::default();
    config.patterns.code = "(B1)".to_string();
    let report = Controller::with_config(config)?.check_aligned_files(&old, &new)?;
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].issue_type, IssueType::PlaceholderNotRestored);
    assert_eq!(report.issues[0].line, 1);

    // the generic shape alone does not know this pattern
    let default_report = Controller::new_for_test()?.check_aligned_files(&old, &new)?;
    assert_eq!(default_report.issues[0].issue_type, IssueType::ParenthesisMismatch);
    Ok(())
}
