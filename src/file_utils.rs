use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::app_config::ExtractionConfig;
use crate::errors::PipelineError;

// @module: File and directory utilities

/// `<base>_<kind>.txt` or `<base>_<kind>_<n>.txt`
static UNIT_PART_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+)_(units|duplicates)(?:_(\d+))?\.txt$").expect("Invalid unit file regex"));

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    /// Check a source file before anything is read from it
    pub fn validate_source<P: AsRef<Path>>(path: P, config: &ExtractionConfig) -> Result<(), PipelineError> {
        let path = path.as_ref();
        if !Self::file_exists(path) {
            return Err(PipelineError::SourceNotFound(path.to_path_buf()));
        }

        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if !config
            .allowed_extensions
            .iter()
            .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(&extension))
        {
            return Err(PipelineError::UnsupportedExtension {
                path: path.to_path_buf(),
                extension,
            });
        }

        let size = fs::metadata(path)?.len();
        if size == 0 {
            return Err(PipelineError::EmptySource(path.to_path_buf()));
        }
        if size > config.max_source_bytes {
            return Err(PipelineError::SourceTooLarge {
                path: path.to_path_buf(),
                size,
                limit: config.max_source_bytes,
            });
        }

        Ok(())
    }

    /// Validate and read a source script, keeping every line terminator
    pub fn read_source_lines<P: AsRef<Path>>(path: P, config: &ExtractionConfig) -> Result<Vec<String>, PipelineError> {
        let path = path.as_ref();
        Self::validate_source(path, config)?;

        let bytes = fs::read(path)?;
        let text = String::from_utf8(bytes).map_err(|_| PipelineError::InvalidEncoding(path.to_path_buf()))?;
        Ok(Self::split_lines(&text))
    }

    /// Split text into lines, terminators included
    pub fn split_lines(text: &str) -> Vec<String> {
        text.split_inclusive('\n').map(str::to_string).collect()
    }

    /// Write lines exactly as given
    pub fn write_lines<P: AsRef<Path>>(path: P, lines: &[String]) -> Result<()> {
        Self::write_to_file(path, &lines.concat())
    }

    /// Write units one per line, splitting into `_2`, `_3`, ... files past
    /// `max_lines_per_file` (0 disables splitting). The first file is always written.
    pub fn write_unit_files(paths: &ArtifactPaths, kind: UnitFileKind, units: &[String], max_lines_per_file: usize) -> Result<Vec<PathBuf>> {
        let chunk_size = if max_lines_per_file == 0 {
            units.len().max(1)
        } else {
            max_lines_per_file
        };

        let mut written = Vec::new();
        let mut chunks: Vec<&[String]> = units.chunks(chunk_size).collect();
        if chunks.is_empty() {
            chunks.push(&[]);
        }
        for (i, chunk) in chunks.into_iter().enumerate() {
            let path = paths.unit_file(kind, i + 1);
            let mut content = String::new();
            for unit in chunk {
                content.push_str(unit);
                content.push('\n');
            }
            Self::write_to_file(&path, &content)?;
            written.push(path);
        }

        Ok(written)
    }

    /// Read every part of a unit file back, in ascending numeric order.
    ///
    /// A missing duplicate file means no duplicates; a missing first unit
    /// file is an error.
    pub fn read_unit_files(paths: &ArtifactPaths, kind: UnitFileKind) -> Result<Vec<String>, PipelineError> {
        let first = paths.unit_file(kind, 1);
        if !Self::file_exists(&first) {
            return match kind {
                UnitFileKind::Duplicates => Ok(Vec::new()),
                UnitFileKind::Units => Err(PipelineError::MissingArtifact(first)),
            };
        }

        let mut parts: Vec<(usize, PathBuf)> = Vec::new();
        for entry in fs::read_dir(paths.dir())? {
            let path = entry?.path();
            let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };
            let Some(caps) = UNIT_PART_REGEX.captures(&name) else {
                continue;
            };
            if &caps[1] != paths.base() || &caps[2] != kind.stem() {
                continue;
            }
            let part = caps.get(3).and_then(|n| n.as_str().parse().ok()).unwrap_or(1);
            parts.push((part, path));
        }
        parts.sort_by_key(|(part, _)| *part);

        let mut units = Vec::new();
        for (_, path) in parts {
            units.extend(Self::parse_unit_lines(&fs::read_to_string(&path)?));
        }
        Ok(units)
    }

    /// One unit per line; a CR left by a CRLF editor is dropped
    pub fn parse_unit_lines(content: &str) -> Vec<String> {
        if content.is_empty() {
            return Vec::new();
        }
        let content = content.strip_suffix('\n').unwrap_or(content);
        content
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
            .collect()
    }

    // @generates: Output path for a rebuilt script
    // @params: input_file, output_dir
    pub fn generate_output_path<P1: AsRef<Path>, P2: AsRef<Path>>(input_file: P1, output_dir: P2) -> PathBuf {
        let input_file = input_file.as_ref();
        let stem = input_file.file_stem().unwrap_or_default().to_string_lossy();
        let mut output_filename = format!("{}.translated", stem);
        if let Some(ext) = input_file.extension() {
            output_filename.push('.');
            output_filename.push_str(&ext.to_string_lossy());
        }
        output_dir.as_ref().join(output_filename)
    }

    /// Find files with any of the given extensions in a directory, sorted by path
    pub fn find_files<P: AsRef<Path>>(dir: P, extensions: &[String]) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() {
                if let Some(ext) = path.extension() {
                    let ext = ext.to_string_lossy();
                    if extensions
                        .iter()
                        .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(&ext))
                    {
                        result.push(path.to_path_buf());
                    }
                }
            }
        }

        result.sort();
        Ok(result)
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path).with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content).with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;
        Ok(())
    }
}

/// Which pool a unit file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitFileKind {
    Units,
    Duplicates,
}

impl UnitFileKind {
    pub fn stem(&self) -> &'static str {
        match self {
            UnitFileKind::Units => "units",
            UnitFileKind::Duplicates => "duplicates",
        }
    }
}

/// Names of the artifacts of one script inside a work directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    dir: PathBuf,
    base: String,
}

impl ArtifactPaths {
    pub fn new<P: AsRef<Path>>(dir: P, base: &str) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            base: base.to_string(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn positions(&self) -> PathBuf {
        self.dir.join(format!("{}_positions.json", self.base))
    }

    pub fn mapping(&self) -> PathBuf {
        self.dir.join(format!("{}_mapping.txt", self.base))
    }

    pub fn summary(&self) -> PathBuf {
        self.dir.join(format!("{}_summary.json", self.base))
    }

    /// Part `part` (1-based) of a unit file
    pub fn unit_file(&self, kind: UnitFileKind, part: usize) -> PathBuf {
        if part <= 1 {
            self.dir.join(format!("{}_{}.txt", self.base, kind.stem()))
        } else {
            self.dir.join(format!("{}_{}_{}.txt", self.base, kind.stem(), part))
        }
    }
}
