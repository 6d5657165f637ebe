use std::cell::RefCell;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, error};
use tree_sitter::{Node, Point, Tree};

use super::languages::Language;
use super::layout::{check_layout, Layout};

// One Parser per language per thread, reused across files.
thread_local! {
    static PARSER_CACHE: RefCell<HashMap<&'static str, tree_sitter::Parser>> = RefCell::new(HashMap::new());
}

const RULE: &str = "----------------------------------------";

/// Why a source could not be turned into a syntax tree.
///
/// Lines are 1-based, columns are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFailure {
    #[error("TabError: {message}")]
    Tab { message: String, line: usize },
    #[error("IndentationError: {message}")]
    Indentation { message: String, line: usize },
    #[error("SyntaxError: invalid syntax")]
    Syntax { line: usize, column: usize },
    #[error("ParseError: {0}")]
    Unclassified(String),
}

impl ParseFailure {
    pub fn class(&self) -> &'static str {
        match self {
            ParseFailure::Tab { .. } => "TabError",
            ParseFailure::Indentation { .. } => "IndentationError",
            ParseFailure::Syntax { .. } => "SyntaxError",
            ParseFailure::Unclassified(_) => "ParseError",
        }
    }

    pub fn line(&self) -> Option<usize> {
        match self {
            ParseFailure::Tab { line, .. }
            | ParseFailure::Indentation { line, .. }
            | ParseFailure::Syntax { line, .. } => Some(*line),
            ParseFailure::Unclassified(_) => None,
        }
    }

    /// Syntax error at a 0-based tree-sitter position.
    pub fn syntax_at(position: Point) -> Self {
        ParseFailure::Syntax {
            line: position.row + 1,
            column: position.column + 1,
        }
    }

    pub fn column(&self) -> Option<usize> {
        match self {
            ParseFailure::Syntax { column, .. } => Some(*column),
            _ => None,
        }
    }

    /// Multi-line report naming the unit, the error class and the location.
    pub fn diagnostic(&self, identity: &str) -> String {
        let mut lines = vec![
            RULE.to_string(),
            format!("'{identity}' not parsed."),
            self.to_string(),
        ];
        if let Some(line) = self.line() {
            lines.push(format!("In line {line}"));
        }
        if let Some(column) = self.column() {
            lines.push(format!("In column {column}"));
        }
        lines.push(RULE.to_string());
        lines.join("\n")
    }
}

/// Reasons a file is rejected before parsing.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("'{0}' is not a file or doesn't exist.")]
    NotAFile(PathBuf),
    #[error("The file '{0}' is empty; there is nothing to get.")]
    Empty(PathBuf),
    #[error("Can't decode file '{0}'.")]
    Encoding(PathBuf),
    #[error("Can't access to the file '{0}'.")]
    PermissionDenied(PathBuf),
    #[error("Can't read file '{path}': {source}")]
    Io { path: PathBuf, source: io::Error },
}

impl LoadError {
    /// Empty files are routine and only worth a debug line.
    pub fn is_expected(&self) -> bool {
        matches!(self, LoadError::Empty(_))
    }
}

pub struct LoadedFile {
    pub code: String,
    pub modified: DateTime<Utc>,
}

pub struct ParsedSource {
    pub tree: Tree,
    pub source: String,
    pub language: Language,
    /// Filesystem timestamp, when the source came from a file.
    pub modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SourceLoader {
    language: Language,
}

impl SourceLoader {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Parses `code`, reporting why when the source is not well formed.
    ///
    /// Indentation-sensitive sources have their block layout checked first;
    /// tree-sitter recovers from bad indentation without error nodes.
    pub fn try_parse(&self, code: &str) -> Result<Tree, ParseFailure> {
        let config = self.language.config();
        let layout = if config.indentation_sensitive {
            check_layout(code)?
        } else {
            Layout::default()
        };

        let tree = PARSER_CACHE.with(|cache| -> Result<Tree, ParseFailure> {
            let mut cache = cache.borrow_mut();
            let parser = match cache.entry(config.id) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    let mut parser = tree_sitter::Parser::new();
                    parser
                        .set_language(&(config.get_grammar)())
                        .map_err(|err| ParseFailure::Unclassified(err.to_string()))?;
                    entry.insert(parser)
                }
            };
            parser
                .parse(code.as_bytes(), None)
                .ok_or_else(|| ParseFailure::Unclassified("parser produced no tree".to_string()))
        })?;

        let root = tree.root_node();
        if root.has_error() {
            let position = layout
                .unclosed_bracket
                .or_else(|| innermost_error(root).map(|n| n.start_position()))
                .unwrap_or_else(|| root.start_position());
            return Err(ParseFailure::syntax_at(position));
        }
        if let Some(node) = find_kind(root, config.rejected_node_types) {
            return Err(ParseFailure::syntax_at(node.start_position()));
        }
        Ok(tree)
    }

    /// Parses in-memory content. Failures are logged and yield `None`.
    pub fn parse_content(&self, code: &str, identity: &str) -> Option<ParsedSource> {
        self.parse_owned(code.to_string(), identity)
    }

    /// Loads and parses a file. Failures are logged and yield `None`.
    pub fn parse_file(&self, path: &Path) -> Option<ParsedSource> {
        match load_file(path) {
            Ok(loaded) => {
                let mut parsed = self.parse_owned(loaded.code, &path.to_string_lossy())?;
                parsed.modified = Some(loaded.modified);
                Some(parsed)
            }
            Err(err) if err.is_expected() => {
                debug!(path = %path.display(), "{err}");
                None
            }
            Err(err) => {
                error!(path = %path.display(), "{err}");
                None
            }
        }
    }

    fn parse_owned(&self, code: String, identity: &str) -> Option<ParsedSource> {
        match self.try_parse(&code) {
            Ok(tree) => Some(ParsedSource {
                tree,
                source: code,
                language: self.language,
                modified: None,
            }),
            Err(failure) => {
                error!(
                    identity,
                    class = failure.class(),
                    line = ?failure.line(),
                    column = ?failure.column(),
                    "\n{}",
                    failure.diagnostic(identity)
                );
                None
            }
        }
    }
}

/// Reads a source file after checking it is a non-empty, readable UTF-8 file.
pub fn load_file(path: &Path) -> Result<LoadedFile, LoadError> {
    let metadata = match fs::metadata(path) {
        Ok(m) if m.is_file() => m,
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            return Err(LoadError::PermissionDenied(path.to_path_buf()))
        }
        _ => return Err(LoadError::NotAFile(path.to_path_buf())),
    };
    if metadata.len() == 0 {
        return Err(LoadError::Empty(path.to_path_buf()));
    }

    let bytes = fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::PermissionDenied => LoadError::PermissionDenied(path.to_path_buf()),
        _ => LoadError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;
    let code = String::from_utf8(bytes).map_err(|_| LoadError::Encoding(path.to_path_buf()))?;
    let modified = metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now());

    Ok(LoadedFile { code, modified })
}

/// Deepest error in the tree: a MISSING node, or an ERROR node with no error inside.
fn innermost_error(node: Node) -> Option<Node> {
    if node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .find_map(innermost_error)
        .or_else(|| node.is_error().then_some(node))
}

fn find_kind<'t>(node: Node<'t>, kinds: &[&str]) -> Option<Node<'t>> {
    if kinds.is_empty() {
        return None;
    }
    if kinds.contains(&node.kind()) {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'t>> = node.named_children(&mut cursor).collect();
    children.into_iter().find_map(|child| find_kind(child, kinds))
}
