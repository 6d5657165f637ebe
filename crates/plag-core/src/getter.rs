//! Batch extraction with cache-first dispatch.

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, error, info, warn};

use crate::cache::FeaturesCache;
use crate::config::PlagConfig;
use crate::model::features::{ASTFeatures, SourceId};
use crate::model::work::WorkInfo;
use crate::parser::extractor::FeatureExtractor;
use crate::parser::languages::Language;
use crate::parser::loader::SourceLoader;
use crate::Result;

const SKIPPED_DIRS: &[&str] = &["__pycache__", "venv", "node_modules", "target"];

/// Drives loading, extraction and caching over batches of sources.
///
/// Each source is looked up in the cache first; on a miss it is parsed,
/// extracted and written through. Sources that fail to load or parse are
/// logged and left out of the output. Only cache errors are returned.
pub struct FeaturesGetter<'a> {
    loader: SourceLoader,
    extractor: FeatureExtractor,
    exclude: Option<Regex>,
    features_cache: Option<Box<dyn FeaturesCache + 'a>>,
}

impl<'a> FeaturesGetter<'a> {
    pub fn new(language: Language) -> Self {
        Self {
            loader: SourceLoader::new(language),
            extractor: FeatureExtractor::default(),
            exclude: None,
            features_cache: None,
        }
    }

    pub fn from_config(config: &PlagConfig) -> Result<Self> {
        let getter = Self::new(config.language);
        match &config.exclude {
            Some(pattern) => getter.with_exclude(pattern),
            None => Ok(getter),
        }
    }

    pub fn with_exclude(mut self, pattern: &str) -> Result<Self> {
        self.exclude = Some(Regex::new(pattern)?);
        Ok(self)
    }

    pub fn with_cache(mut self, cache: impl FeaturesCache + 'a) -> Self {
        self.features_cache = Some(Box::new(cache));
        self
    }

    /// Features of a remote snapshot, dated with its commit.
    pub fn get_from_content(&mut self, work: &WorkInfo) -> Result<Option<ASTFeatures>> {
        if let Some(cache) = &self.features_cache {
            if let Some(features) = cache.get_features_from_work_info(work)? {
                debug!(link = %work.link, "features taken from cache");
                return Ok(Some(features));
            }
        }

        let Some(parsed) = self.loader.parse_content(&work.code, &work.link) else {
            error!(link = %work.link, "Unsuccessful attempt to get AST from the file");
            return Ok(None);
        };
        let features = self.extractor.extract_at(&parsed, work.id(), work.commit.date);
        self.write_through(&features)?;
        Ok(Some(features))
    }

    pub fn get_from_file(&mut self, path: &Path) -> Result<Option<ASTFeatures>> {
        if let Some(cache) = &self.features_cache {
            if let Some(features) = cache.get_features_from_filepath(path)? {
                debug!(path = %path.display(), "features taken from cache");
                return Ok(Some(features));
            }
        }

        let Some(parsed) = self.loader.parse_file(path) else {
            return Ok(None);
        };
        let features = self.extractor.extract(&parsed, SourceId::from_path(path));
        self.write_through(&features)?;
        Ok(Some(features))
    }

    /// Features of every file that could be processed, in input order.
    pub fn get_from_files(&mut self, files: &[PathBuf]) -> Result<Vec<ASTFeatures>> {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        debug!(count = files.len(), "Getting works features from files");
        let mut works = Vec::with_capacity(files.len());
        for path in files {
            if let Some(features) = self.get_from_file(path)? {
                works.push(features);
            }
        }
        info!(
            requested = files.len(),
            extracted = works.len(),
            "Works features collected"
        );
        Ok(works)
    }

    pub fn get_works_from_dir(&mut self, directory: &Path) -> Result<Vec<ASTFeatures>> {
        let files = files_from_directory(
            directory,
            self.loader.language().extensions(),
            self.exclude.as_ref(),
        );
        self.get_from_files(&files)
    }

    fn write_through(&mut self, features: &ASTFeatures) -> Result<()> {
        if let Some(cache) = self.features_cache.as_mut() {
            cache.save_features(features)?;
        }
        Ok(())
    }
}

/// Sorted list of files under `directory` with one of `extensions`,
/// skipping hidden entries, tool directories and paths matching `exclude`.
pub fn files_from_directory(
    directory: &Path,
    extensions: &[&str],
    exclude: Option<&Regex>,
) -> Vec<PathBuf> {
    let mut files = Vec::new();
    walk_dir(directory, extensions, exclude, &mut files);
    files.sort();
    files
}

fn walk_dir(dir: &Path, extensions: &[&str], exclude: Option<&Regex>, files: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(err) => {
            warn!(dir = %dir.display(), error = %err, "Can't read directory");
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();

        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.starts_with('.') || SKIPPED_DIRS.contains(&name) {
                continue;
            }
        }

        if path.is_dir() {
            walk_dir(&path, extensions, exclude, files);
            continue;
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()));
        if !ext.is_some_and(|e| extensions.contains(&e.as_str())) {
            continue;
        }
        if exclude.is_some_and(|re| re.is_match(&path.to_string_lossy())) {
            continue;
        }
        files.push(path);
    }
}
