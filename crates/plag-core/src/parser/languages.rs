use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub struct LanguageConfig {
    pub id: &'static str,
    pub extensions: &'static [&'static str],
    /// Node kinds whose names are recorded as head nodes.
    pub definition_node_types: &'static [&'static str],
    pub literal_node_types: &'static [&'static str],
    /// Python blocks are delimited by indentation, so parse failures can be
    /// tab or indentation errors.
    pub indentation_sensitive: bool,
    /// Node kinds the grammar still accepts but the language rejects.
    pub rejected_node_types: &'static [&'static str],
    pub get_grammar: fn() -> tree_sitter::Language,
}

fn get_python() -> tree_sitter::Language {
    tree_sitter_python::LANGUAGE.into()
}

fn get_cpp() -> tree_sitter::Language {
    tree_sitter_cpp::LANGUAGE.into()
}

static PYTHON_CONFIG: LanguageConfig = LanguageConfig {
    id: "py",
    extensions: &[".py"],
    definition_node_types: &[
        "function_definition",
        "class_definition",
        "decorated_definition",
    ],
    literal_node_types: &[
        "string",
        "concatenated_string",
        "integer",
        "float",
        "true",
        "false",
        "none",
    ],
    indentation_sensitive: true,
    rejected_node_types: &["print_statement", "exec_statement"],
    get_grammar: get_python,
};

static CPP_CONFIG: LanguageConfig = LanguageConfig {
    id: "cpp",
    extensions: &[".cpp", ".c", ".h"],
    definition_node_types: &[
        "function_definition",
        "class_specifier",
        "struct_specifier",
        "enum_specifier",
        "union_specifier",
        "namespace_definition",
    ],
    literal_node_types: &[
        "number_literal",
        "string_literal",
        "raw_string_literal",
        "char_literal",
        "true",
        "false",
        "null",
        "nullptr",
    ],
    indentation_sensitive: false,
    rejected_node_types: &[],
    get_grammar: get_cpp,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Py,
    Cpp,
}

impl Language {
    pub fn config(self) -> &'static LanguageConfig {
        match self {
            Language::Py => &PYTHON_CONFIG,
            Language::Cpp => &CPP_CONFIG,
        }
    }

    pub fn extensions(self) -> &'static [&'static str] {
        self.config().extensions
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config().id)
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "py" | "python" => Ok(Language::Py),
            "cpp" | "c++" | "c" => Ok(Language::Cpp),
            other => Err(format!("unsupported language '{other}', expected 'py' or 'cpp'")),
        }
    }
}
