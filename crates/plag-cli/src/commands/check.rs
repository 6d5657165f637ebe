use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use plag_core::config::{BackendConfig, PlagConfig};
use plag_core::db::{DocumentConnection, DocumentFeaturesCache};
use plag_core::getter::FeaturesGetter;
use plag_core::model::ASTFeatures;
use plag_core::parser::Language;
use tracing::{debug, info};

use crate::formatters::{json::format_json, terminal::format_terminal};

pub struct CheckOptions {
    pub files: Vec<PathBuf>,
    pub dir: Option<PathBuf>,
    pub language: Option<Language>,
    pub exclude: Option<String>,
    pub config: Option<PathBuf>,
    pub db_root: Option<PathBuf>,
    pub db_name: Option<String>,
    pub no_cache: bool,
    pub format: OutputFormat,
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Terminal,
    Json,
}

pub fn check_command(opts: CheckOptions) -> Result<()> {
    if opts.files.is_empty() && opts.dir.is_none() {
        bail!("nothing to check: pass files or --dir");
    }

    let config = resolve_config(&opts)?;
    debug!(
        language = %config.language,
        exclude = ?config.exclude,
        backend = config.backend.is_some(),
        "Resolved configuration"
    );

    let mut connection = match &config.backend {
        Some(backend) => Some(
            DocumentConnection::connect(&backend.settings())
                .context("document store is not available")?,
        ),
        None => None,
    };

    let works = collect(&config, connection.as_ref(), &opts.files, opts.dir.as_deref());

    // Released before reporting, whether or not collection failed
    if let Some(conn) = connection.as_mut() {
        conn.disconnect()?;
    }
    let works = works?;
    info!(works = works.len(), "Check finished");

    match opts.format {
        OutputFormat::Json => println!("{}", format_json(&works)),
        OutputFormat::Terminal => println!("{}", format_terminal(&works)),
    }
    Ok(())
}

fn resolve_config(opts: &CheckOptions) -> Result<PlagConfig> {
    let mut config = match &opts.config {
        Some(path) => PlagConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PlagConfig::default(),
    };

    if let Some(language) = opts.language {
        config.language = language;
    }
    if let Some(exclude) = &opts.exclude {
        config.exclude = Some(exclude.clone());
    }
    if opts.db_root.is_some() || opts.db_name.is_some() {
        let backend = config.backend.get_or_insert_with(BackendConfig::default);
        if let Some(root) = &opts.db_root {
            backend.root = Some(root.clone());
        }
        if let Some(db_name) = &opts.db_name {
            backend.db_name = db_name.clone();
        }
    }
    if opts.no_cache {
        config.backend = None;
    }
    Ok(config)
}

fn collect(
    config: &PlagConfig,
    connection: Option<&DocumentConnection>,
    files: &[PathBuf],
    dir: Option<&Path>,
) -> Result<Vec<ASTFeatures>> {
    let mut getter = FeaturesGetter::from_config(config)?;
    if let Some(conn) = connection {
        getter = getter.with_cache(DocumentFeaturesCache::new(conn)?);
    }

    let mut works = getter.get_from_files(files)?;
    if let Some(dir) = dir {
        works.extend(getter.get_works_from_dir(dir)?);
    }
    Ok(works)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> CheckOptions {
        CheckOptions {
            files: vec![PathBuf::from("a.py")],
            dir: None,
            language: None,
            exclude: None,
            config: None,
            db_root: None,
            db_name: None,
            no_cache: false,
            format: OutputFormat::Json,
        }
    }

    #[test]
    fn test_db_flags_enable_backend() {
        let opts = CheckOptions {
            db_root: Some(PathBuf::from("/tmp/plag")),
            ..options()
        };
        let config = resolve_config(&opts).unwrap();
        let backend = config.backend.unwrap();
        assert_eq!(backend.root, Some(PathBuf::from("/tmp/plag")));
    }

    #[test]
    fn test_no_cache_wins() {
        let opts = CheckOptions {
            db_name: Some("works".to_string()),
            no_cache: true,
            ..options()
        };
        assert!(resolve_config(&opts).unwrap().backend.is_none());
    }

    #[test]
    fn test_requires_input() {
        let opts = CheckOptions {
            files: Vec::new(),
            ..options()
        };
        assert!(check_command(opts).is_err());
    }
}
