use tree_sitter::{Node, Tree};

use super::languages::{Language, LanguageConfig};
use crate::model::features::{NodeStructure, StructuralFeatures};

/// Fills the structural payload of a record from a parsed tree.
pub trait TreeWalker {
    fn walk(&self, tree: &Tree, source: &[u8], language: Language, features: &mut StructuralFeatures);
}

/// Default walker: a pre-order pass over every node of the tree.
///
/// Named nodes become tokens and structure entries, anonymous nodes are
/// counted as keywords or operators, literal kinds are counted separately.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeWalker;

impl TreeWalker for NodeWalker {
    fn walk(&self, tree: &Tree, source: &[u8], language: Language, features: &mut StructuralFeatures) {
        visit_node(
            tree.root_node(),
            0,
            false,
            language.config(),
            source,
            features,
        );
    }
}

fn visit_node(
    node: Node,
    depth: usize,
    in_definition: bool,
    config: &LanguageConfig,
    source: &[u8],
    features: &mut StructuralFeatures,
) {
    let kind = node.kind();
    features.count_of_nodes += 1;

    let mut is_definition = false;
    if node.is_named() {
        let pos = node.start_position();
        features.tokens.push(kind.to_string());
        features.tokens_pos.push((pos.row + 1, pos.column));
        features.structure.push(NodeStructure {
            depth,
            kind: kind.to_string(),
        });

        if config.literal_node_types.contains(&kind) {
            *features.literals.entry(kind.to_string()).or_default() += 1;
        }

        if config.definition_node_types.contains(&kind) {
            is_definition = true;
            if !in_definition {
                if let Some(name) = extract_name(node, source) {
                    features.head_nodes.push(name);
                }
            }
        }
    } else if is_keyword(kind) {
        *features.keywords.entry(kind.to_string()).or_default() += 1;
    } else if is_operator(kind) {
        *features.operators.entry(kind.to_string()).or_default() += 1;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        visit_node(
            child,
            depth + 1,
            in_definition || is_definition,
            config,
            source,
            features,
        );
    }
}

fn is_keyword(kind: &str) -> bool {
    kind.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && kind.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_operator(kind: &str) -> bool {
    const DELIMITERS: &[&str] = &["(", ")", "[", "]", "{", "}", ",", ":", ";", ".", "\"", "'", "#"];
    !kind.is_empty()
        && !DELIMITERS.contains(&kind)
        && kind.chars().all(|c| c.is_ascii_punctuation())
}

fn extract_name(node: Node, source: &[u8]) -> Option<String> {
    if let Some(name_node) = node.child_by_field_name("name") {
        return Some(node_text(name_node, source));
    }

    // Python decorators wrap the real definition
    if node.kind() == "decorated_definition" {
        if let Some(inner) = node.child_by_field_name("definition") {
            return extract_name(inner, source);
        }
    }

    // C/C++ functions keep their name inside the declarator chain
    if let Some(declarator) = node.child_by_field_name("declarator") {
        return extract_declarator_name(declarator, source);
    }

    let mut cursor = node.walk();
    let result = node
        .named_children(&mut cursor)
        .find(|c| is_identifier(c.kind()))
        .map(|c| node_text(c, source));
    result
}

fn extract_declarator_name(node: Node, source: &[u8]) -> Option<String> {
    if is_identifier(node.kind()) {
        return Some(node_text(node, source));
    }
    if let Some(inner) = node.child_by_field_name("declarator") {
        return extract_declarator_name(inner, source);
    }
    let mut cursor = node.walk();
    let result = node
        .named_children(&mut cursor)
        .find(|c| is_identifier(c.kind()))
        .map(|c| node_text(c, source));
    result
}

fn is_identifier(kind: &str) -> bool {
    matches!(
        kind,
        "identifier" | "type_identifier" | "field_identifier" | "qualified_identifier" | "namespace_identifier"
    )
}

fn node_text(node: Node, source: &[u8]) -> String {
    node.utf8_text(source).unwrap_or("").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::loader::SourceLoader;

    fn walk(language: Language, code: &str) -> StructuralFeatures {
        let tree = SourceLoader::new(language).try_parse(code).unwrap();
        let mut features = StructuralFeatures::default();
        NodeWalker.walk(&tree, code.as_bytes(), language, &mut features);
        features
    }

    #[test]
    fn test_python_head_nodes() {
        let code = r#"
import os

def add(a, b):
    def inner():
        return 1
    return a + b

@cached
def lookup(key):
    return key

class Greeter:
    def greet(self, name):
        return "Hello, " + name
"#;
        let features = walk(Language::Py, code);
        assert_eq!(features.head_nodes, vec!["add", "lookup", "Greeter"]);
    }

    #[test]
    fn test_python_counters() {
        let features = walk(Language::Py, "x = 1\ny = 'a'\nif x > 0:\n    y = x + 2\n");

        assert_eq!(features.literals.get("integer"), Some(&3));
        assert_eq!(features.literals.get("string"), Some(&1));
        assert_eq!(features.keywords.get("if"), Some(&1));
        assert_eq!(features.operators.get("+"), Some(&1));
        assert_eq!(features.operators.get(">"), Some(&1));
        assert!(!features.operators.contains_key(":"));
    }

    #[test]
    fn test_tokens_follow_pre_order() {
        let features = walk(Language::Py, "pass\n");

        assert_eq!(features.tokens.first().map(String::as_str), Some("module"));
        assert_eq!(features.tokens.len(), features.tokens_pos.len());
        assert_eq!(features.tokens.len(), features.structure.len());
        assert_eq!(features.structure[0].depth, 0);
        assert_eq!(features.structure[1].depth, 1);
        assert!(features.count_of_nodes >= features.tokens.len());
    }

    #[test]
    fn test_cpp_head_nodes() {
        let code = "int add(int a, int b) {\n    return a + b;\n}\n\nclass Point {\n    int x;\n};\n";
        let features = walk(Language::Cpp, code);

        assert!(features.head_nodes.contains(&"add".to_string()), "got: {:?}", features.head_nodes);
        assert!(features.head_nodes.contains(&"Point".to_string()), "got: {:?}", features.head_nodes);
        assert_eq!(features.keywords.get("return"), Some(&1));
    }

    #[test]
    fn test_keyword_and_operator_classification() {
        assert!(is_keyword("def"));
        assert!(is_keyword("elif"));
        assert!(!is_keyword("+="));
        assert!(is_operator("+="));
        assert!(is_operator("**"));
        assert!(!is_operator(","));
        assert!(!is_operator("def"));
    }
}
