use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};

use crate::app_config::{Config, PatternConfig};
use crate::errors::Diagnostic;
use crate::extraction::extractor::{ExtractionSummary, Extractor, base_name};
use crate::extraction::mapping_file;
use crate::extraction::pools::TranslatedUnits;
use crate::extraction::position_map::PositionMap;
use crate::file_utils::{ArtifactPaths, FileManager, UnitFileKind};
use crate::protection::placeholder::PlaceholderGenerator;
use crate::reconstruction::Reconstructor;
use crate::validation::coherence::{CoherenceChecker, CoherenceReport};
use crate::validation::pairing::{pairs_from_aligned, pairs_from_translation_file};

// @module: Application controller for script extraction and reconstruction

/// Outcome of extracting one script
#[derive(Debug, Clone)]
pub struct ExtractionReport {
    pub source: PathBuf,
    pub summary: ExtractionSummary,
    /// Every file written, position map first
    pub artifacts: Vec<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Outcome of rebuilding one script
#[derive(Debug, Clone)]
pub struct ReconstructionReport {
    pub output_path: PathBuf,
    pub diagnostics: Vec<Diagnostic>,
    /// Source lines checked against the rebuilt lines
    pub coherence: CoherenceReport,
}

/// Outcome of a folder run
#[derive(Debug, Clone, Default)]
pub struct FolderReport {
    pub extracted: Vec<ExtractionReport>,
    pub failed: Vec<(PathBuf, String)>,
}

/// Main application controller for script processing
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    /// Create a new controller for test purposes with default configuration
    pub fn new_for_test() -> Result<Self> {
        Self::with_config(Config::default())
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Extract one script into `work_dir`
    pub fn extract_file(&self, input_file: &Path, work_dir: &Path) -> Result<ExtractionReport> {
        let start_time = std::time::Instant::now();
        let lines = FileManager::read_source_lines(input_file, &self.config.extraction)
            .with_context(|| format!("Cannot extract {:?}", input_file))?;

        let result = Extractor::new(&self.config).extract(&lines, input_file)?;
        let paths = ArtifactPaths::new(work_dir, &result.summary.base_name);
        FileManager::ensure_dir(work_dir)?;

        let mut artifacts = Vec::new();
        result
            .position_map
            .save(paths.positions())
            .with_context(|| format!("Failed to write position map: {:?}", paths.positions()))?;
        artifacts.push(paths.positions());

        FileManager::write_to_file(paths.mapping(), &result.mapping_file())?;
        artifacts.push(paths.mapping());

        let max_lines = self.config.extraction.max_lines_per_file;
        artifacts.extend(FileManager::write_unit_files(&paths, UnitFileKind::Units, &result.pools.standard, max_lines)?);
        if !result.pools.duplicates.is_empty() {
            artifacts.extend(FileManager::write_unit_files(
                &paths,
                UnitFileKind::Duplicates,
                &result.pools.duplicates,
                max_lines,
            )?);
        }

        let summary_json = serde_json::to_string_pretty(&result.summary).context("Failed to serialize summary")?;
        FileManager::write_to_file(paths.summary(), &summary_json)?;
        artifacts.push(paths.summary());

        for diagnostic in &result.diagnostics {
            warn!("{}: {}", result.summary.base_name, diagnostic);
        }
        info!(
            "Extracted {:?} in {}: {} units written to {:?}",
            input_file,
            Self::format_duration(start_time.elapsed()),
            result.summary.total_units,
            work_dir
        );

        Ok(ExtractionReport {
            source: input_file.to_path_buf(),
            summary: result.summary,
            artifacts,
            diagnostics: result.diagnostics,
        })
    }

    /// Extract every script under `input_dir`, mirroring its layout in `work_dir`.
    /// A file that fails is logged and skipped.
    pub fn extract_folder(&self, input_dir: &Path, work_dir: &Path) -> Result<FolderReport> {
        let start_time = std::time::Instant::now();

        if !FileManager::dir_exists(input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let files = FileManager::find_files(input_dir, &self.config.extraction.allowed_extensions)?;
        if files.is_empty() {
            return Err(anyhow!("No script files found in directory: {:?}", input_dir));
        }

        let folder_pb = ProgressBar::new(files.len() as u64);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        folder_pb.set_style(template_result.progress_chars("█▓▒░"));

        let mut report = FolderReport::default();
        for file in &files {
            let file_name = file
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            folder_pb.set_message(format!("Processing: {}", file_name));

            let relative_dir = file
                .parent()
                .and_then(|parent| parent.strip_prefix(input_dir).ok())
                .unwrap_or_else(|| Path::new(""));
            match self.extract_file(file, &work_dir.join(relative_dir)) {
                Ok(extraction) => report.extracted.push(extraction),
                Err(e) => {
                    error!("Error processing file {}: {:#}", file_name, e);
                    report.failed.push((file.clone(), format!("{:#}", e)));
                }
            }
            folder_pb.inc(1);
        }
        folder_pb.finish_with_message("Folder processing complete");

        info!(
            "Folder processing completed in {}: {} extracted, {} errors",
            Self::format_duration(start_time.elapsed()),
            report.extracted.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Rebuild `source_file` from the artifacts in `work_dir` and check the result
    pub fn reconstruct_file(&self, source_file: &Path, work_dir: &Path, output: Option<&Path>) -> Result<ReconstructionReport> {
        let source_lines = FileManager::read_source_lines(source_file, &self.config.extraction)
            .with_context(|| format!("Cannot read source {:?}", source_file))?;
        let paths = ArtifactPaths::new(work_dir, &base_name(source_file));

        let map = PositionMap::load(paths.positions())?;
        if !FileManager::file_exists(paths.mapping()) {
            return Err(anyhow!("Missing mapping file: {:?}", paths.mapping()));
        }
        let mappings = mapping_file::parse(&FileManager::read_to_string(paths.mapping())?)?;
        let translations = TranslatedUnits::new(
            FileManager::read_unit_files(&paths, UnitFileKind::Units)?,
            FileManager::read_unit_files(&paths, UnitFileKind::Duplicates)?,
        );
        debug!(
            "Loaded {} standard and {} duplicate translations for {}",
            translations.standard.len(),
            translations.duplicates.len(),
            paths.base()
        );

        let result = Reconstructor::new(&self.config).reconstruct(&source_lines, &map, &mappings, &translations)?;

        let output_path = match output {
            Some(path) => path.to_path_buf(),
            None => FileManager::generate_output_path(source_file, source_file.parent().unwrap_or_else(|| Path::new("."))),
        };
        FileManager::write_lines(&output_path, &result.lines)?;

        let coherence = self
            .checker()
            .analyze(&pairs_from_aligned(&source_lines, &result.lines));
        for issue in &coherence.issues {
            warn!("{}", issue);
        }
        info!("Success: {}", output_path.display());

        Ok(ReconstructionReport {
            output_path,
            diagnostics: result.diagnostics,
            coherence,
        })
    }

    /// Check a Ren'Py translation file
    pub fn check_translation_file(&self, path: &Path) -> Result<CoherenceReport> {
        let lines = FileManager::split_lines(&FileManager::read_to_string(path)?);
        Ok(self.checker().analyze(&pairs_from_translation_file(&lines)))
    }

    /// Check two aligned scripts line by line
    pub fn check_aligned_files(&self, old_path: &Path, new_path: &Path) -> Result<CoherenceReport> {
        let old_lines = FileManager::split_lines(&FileManager::read_to_string(old_path)?);
        let new_lines = FileManager::split_lines(&FileManager::read_to_string(new_path)?);
        if old_lines.len() != new_lines.len() {
            warn!(
                "{:?} has {} lines but {:?} has {}; only the common prefix is checked",
                old_path,
                old_lines.len(),
                new_path,
                new_lines.len()
            );
        }
        Ok(self.checker().analyze(&pairs_from_aligned(&old_lines, &new_lines)))
    }

    /// Coherence checker that also knows the configured placeholder shapes
    fn checker(&self) -> CoherenceChecker {
        CoherenceChecker::new(&self.config.coherence).with_detection_regexes(&detection_regexes(&self.config.patterns))
    }

    // Format duration in a human-readable format
    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let minutes = total_seconds / 60;
        let seconds = total_seconds % 60;

        if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}

fn detection_regexes(patterns: &PatternConfig) -> Vec<String> {
    [
        (&patterns.code, PatternConfig::DEFAULT_CODE),
        (&patterns.emphasis, PatternConfig::DEFAULT_EMPHASIS),
        (&patterns.whisper, PatternConfig::DEFAULT_WHISPER),
    ]
    .into_iter()
    .map(|(pattern, default)| PlaceholderGenerator::with_fallback(pattern, default).0.detection_regex())
    .collect()
}
