/*!
 * Integration tests for controller workflows over work directories
 */

use anyhow::Result;
use std::fs;

use rentrans::app_config::Config;
use rentrans::app_controller::Controller;
use rentrans::errors::DiagnosticKind;
use rentrans::file_utils::{ArtifactPaths, FileManager, UnitFileKind};
use rentrans::validation::IssueType;
use crate::common;

const FRENCH: [(&str, &str); 10] = [
    ("Hello there.", "Bonjour."),
    ("Welcome to", "Bienvenue à"),
    ("the city", "la ville"),
    ("Nice to meet you.", "Enchanté."),
    ("The streets were", "Les rues étaient"),
    ("that night.", "cette nuit-là."),
    ("empty", "vides"),
    ("Hmm", "Hum"),
    ("maybe", "peut-être"),
    ("later", "plus tard"),
];

const EXPECTED_FRENCH: &str = r#"label start:
    # The first scene
    $ points = 0
    e "Bonjour."
    e "Bienvenue à {b}la ville{/b}, [player]!"
    "Enchanté."
    "" "Les rues étaient **vides** cette nuit-là."
    m "Hum~~~ peut-être ~plus tard~." (multiple=2)
    e ""
    e "Bonjour."
"#;

/// Apply `replacements` to every unit file of `paths`, as a translator would
fn translate_in_place(paths: &ArtifactPaths, replacements: &[(&str, &str)]) -> Result<()> {
    for entry in fs::read_dir(paths.dir())? {
        let path = entry?.path();
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        if name.starts_with(&format!("{}_units", paths.base())) || name.starts_with(&format!("{}_duplicates", paths.base())) {
            let content = fs::read_to_string(&path)?;
            fs::write(&path, common::translate_units(&content, replacements))?;
        }
    }
    Ok(())
}

/// Test the controller initialization with default config
#[test]
fn test_controller_initialization_withDefaultConfig_shouldSucceed() -> Result<()> {
    let controller = Controller::new_for_test()?;
    assert_eq!(controller.config(), &Config::default());
    Ok(())
}

/// Test that an invalid configuration is refused
#[test]
fn test_controller_withInvalidConfig_shouldFail() {
    let mut config = Config::default();
    config.reconstruction.max_restore_iterations = 0;
    assert!(Controller::with_config(config).is_err());
}

/// Test the full extract, translate, reconstruct cycle
#[test]
fn test_workflow_extractTranslateReconstruct_shouldProduceTranslatedScript() -> Result<()> {
    common::init_logger();
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_script(temp_dir.path(), "game/script.rpy")?;
    let work_dir = temp_dir.path().join("work");
    let controller = Controller::new_for_test()?;

    let extraction = controller.extract_file(&source, &work_dir)?;

    let paths = ArtifactPaths::new(&work_dir, "script");
    assert_eq!(
        extraction.artifacts,
        vec![
            paths.positions(),
            paths.mapping(),
            paths.unit_file(UnitFileKind::Units, 1),
            paths.unit_file(UnitFileKind::Duplicates, 1),
            paths.summary(),
        ]
    );
    assert!(extraction.artifacts.iter().all(|p| p.exists()));
    assert_eq!(extraction.summary.total_units, 8);
    assert_eq!(extraction.summary.unique_units, 6);
    assert_eq!(extraction.summary.duplicate_units, 1);
    assert_eq!(extraction.summary.counts.code, 3);
    assert_eq!(extraction.summary.counts.emphasis, 1);
    assert_eq!(extraction.summary.counts.whisper, 2);
    assert_eq!(extraction.summary.counts.empty, 2);
    assert_eq!(
        FileManager::read_unit_files(&paths, UnitFileKind::Duplicates)?,
        vec!["Hello there."]
    );

    translate_in_place(&paths, &FRENCH)?;
    let report = controller.reconstruct_file(&source, &work_dir, None)?;

    assert_eq!(report.output_path, temp_dir.path().join("game/script.translated.rpy"));
    assert_eq!(fs::read_to_string(&report.output_path)?, EXPECTED_FRENCH);
    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
    assert!(report.coherence.passed(), "{:?}", report.coherence.issues);
    Ok(())
}

/// Test that split unit files are stitched back together in order
#[test]
fn test_workflow_splitUnitFiles_shouldRebuildIdentically() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_script(temp_dir.path(), "script.rpy")?;
    let work_dir = temp_dir.path().join("work");
    let mut config = Config::default();
    config.extraction.max_lines_per_file = 2;
    let controller = Controller::with_config(config)?;

    controller.extract_file(&source, &work_dir)?;

    let paths = ArtifactPaths::new(&work_dir, "script");
    assert!(paths.unit_file(UnitFileKind::Units, 3).exists());
    assert!(!paths.unit_file(UnitFileKind::Units, 4).exists());

    let output = temp_dir.path().join("out/rebuilt.rpy");
    let report = controller.reconstruct_file(&source, &work_dir, Some(&output))?;
    assert_eq!(report.output_path, output);
    assert_eq!(fs::read_to_string(&output)?, common::SAMPLE_SCRIPT);
    Ok(())
}

/// Test that a translator's mistake surfaces in the coherence report
#[test]
fn test_workflow_badTranslation_shouldBeReportedByCoherence() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_script(temp_dir.path(), "script.rpy")?;
    let work_dir = temp_dir.path().join("work");
    let controller = Controller::new_for_test()?;

    controller.extract_file(&source, &work_dir)?;
    let mut replacements = FRENCH.to_vec();
    replacements[3] = ("Nice to meet you.", "Enchanté [...]");
    translate_in_place(&ArtifactPaths::new(&work_dir, "script"), &replacements)?;
    let report = controller.reconstruct_file(&source, &work_dir, None)?;

    let found: Vec<(usize, IssueType)> = report
        .coherence
        .issues
        .iter()
        .map(|i| (i.line, i.issue_type))
        .collect();
    assert_eq!(found, vec![(5, IssueType::BracketedEllipsis)]);
    assert!(!report.coherence.passed());
    Ok(())
}

/// Test that a truncated unit file is backfilled instead of failing
#[test]
fn test_workflow_truncatedUnits_shouldBackfillAndReport() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_script(temp_dir.path(), "script.rpy")?;
    let work_dir = temp_dir.path().join("work");
    let controller = Controller::new_for_test()?;

    controller.extract_file(&source, &work_dir)?;
    let units_path = ArtifactPaths::new(&work_dir, "script").unit_file(UnitFileKind::Units, 1);
    let units = FileManager::parse_unit_lines(&fs::read_to_string(&units_path)?);
    fs::write(&units_path, format!("{}\n", units[..units.len() - 1].join("\n")))?;

    let report = controller.reconstruct_file(&source, &work_dir, None)?;

    assert!(report
        .diagnostics
        .iter()
        .any(|d| matches!(d.kind, DiagnosticKind::MissingTranslation { .. })));
    assert_eq!(fs::read_to_string(&report.output_path)?, common::SAMPLE_SCRIPT);
    Ok(())
}

/// Test that reconstruction without an extraction run fails cleanly
#[test]
fn test_workflow_reconstructWithoutArtifacts_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_script(temp_dir.path(), "script.rpy")?;
    let controller = Controller::new_for_test()?;

    let result = controller.reconstruct_file(&source, &temp_dir.path().join("work"), None);

    let message = format!("{:#}", result.err().expect("reconstruction must fail"));
    assert!(message.contains("Missing artifact"), "{}", message);
    Ok(())
}

/// Test that extracting twice into the same work directory writes the same bytes
#[test]
fn test_workflow_reextraction_shouldRewriteIdenticalArtifacts() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_script(temp_dir.path(), "script.rpy")?;
    let work_dir = temp_dir.path().join("work");
    let controller = Controller::new_for_test()?;
    let paths = ArtifactPaths::new(&work_dir, "script");

    controller.extract_file(&source, &work_dir)?;
    let positions = fs::read(paths.positions())?;
    let mapping = fs::read(paths.mapping())?;
    controller.extract_file(&source, &work_dir)?;

    assert_eq!(fs::read(paths.positions())?, positions);
    assert_eq!(fs::read(paths.mapping())?, mapping);
    Ok(())
}

/// Test that folder mode mirrors sub-directories and survives a bad file
#[test]
fn test_workflow_extractFolder_shouldSkipFailuresAndMirrorLayout() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let game_dir = temp_dir.path().join("game");
    common::create_test_script(&game_dir, "script.rpy")?;
    common::create_test_file(&game_dir, "chapter2/day1.rpy", "label day1:\n    e \"Morning.\"\n")?;
    common::create_test_file(&game_dir, "empty.rpy", "")?;
    common::create_test_file(&game_dir, "readme.txt", "not a script")?;
    let work_dir = temp_dir.path().join("work");
    let controller = Controller::new_for_test()?;

    let report = controller.extract_folder(&game_dir, &work_dir)?;

    assert_eq!(report.extracted.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].0.ends_with("empty.rpy"));
    assert!(ArtifactPaths::new(work_dir.join("chapter2"), "day1").positions().exists());
    assert!(ArtifactPaths::new(&work_dir, "script").positions().exists());
    Ok(())
}

/// Test that folder mode refuses a directory without scripts
#[test]
fn test_workflow_extractFolder_withoutScripts_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "readme.txt", "not a script")?;
    let controller = Controller::new_for_test()?;

    assert!(controller.extract_folder(temp_dir.path(), &temp_dir.path().join("work")).is_err());
    Ok(())
}
