//! Line layout checks for indentation-sensitive sources.
//!
//! tree-sitter's Python scanner recovers from bad indentation silently, so
//! blocks are validated here before the grammar sees the source. The rules
//! follow the Python tokenizer: an indent stack measured twice (tabs to the
//! next multiple of eight, and tabs as one column) whose orderings must agree.

use std::iter::Peekable;
use std::str::CharIndices;

use tree_sitter::Point;

use super::loader::ParseFailure;

const EXPECTED_BLOCK: &str = "expected an indented block";
const UNEXPECTED_INDENT: &str = "unexpected indent";
const UNMATCHED_DEDENT: &str = "unindent does not match any outer indentation level";
const INCONSISTENT_TABS: &str = "inconsistent use of tabs and spaces in indentation";

/// What the scan learned about a source that passed the indentation checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Layout {
    /// Innermost bracket still open at end of input.
    pub unclosed_bracket: Option<Point>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Level {
    width: usize,
    columns: usize,
}

#[derive(Debug, Clone, Copy)]
struct OpenString {
    quote: char,
    triple: bool,
}

/// Checks block structure line by line.
///
/// Blank lines, comment-only lines, lines inside brackets or multi-line
/// strings and backslash continuations carry no indentation.
pub fn check_layout(source: &str) -> Result<Layout, ParseFailure> {
    let mut levels = vec![Level {
        width: 0,
        columns: 0,
    }];
    let mut brackets: Vec<Point> = Vec::new();
    let mut string: Option<OpenString> = None;
    let mut continued = false;
    let mut expect_block = false;
    let mut last_token: Option<char> = None;
    let mut line_count = 0;

    for (row, line) in source.lines().enumerate() {
        line_count = row + 1;
        let mut start = 0;
        if brackets.is_empty() && string.is_none() && !continued {
            let indent = leading_whitespace(line);
            let body = &line[indent.len()..];
            if body.is_empty() || body.starts_with('#') {
                continue;
            }
            check_indent(&mut levels, indent, expect_block, row + 1)?;
            expect_block = false;
            last_token = None;
            start = indent.len();
        }

        continued = false;
        let mut chars = line[start..].char_indices().peekable();
        while let Some((offset, c)) = chars.next() {
            if let Some(open) = string {
                if scan_string_char(c, open, &mut chars, &mut continued) {
                    string = None;
                }
                continue;
            }
            match c {
                '#' => break,
                '\'' | '"' => {
                    let mut lookahead = chars.clone();
                    let triple = matches!(lookahead.next(), Some((_, q)) if q == c)
                        && matches!(lookahead.next(), Some((_, q)) if q == c);
                    if triple {
                        chars.next();
                        chars.next();
                    }
                    string = Some(OpenString { quote: c, triple });
                }
                '(' | '[' | '{' => brackets.push(Point {
                    row,
                    column: start + offset,
                }),
                ')' | ']' | '}' => {
                    brackets.pop();
                }
                '\\' if chars.peek().is_none() => continued = true,
                _ => {}
            }
            if !c.is_whitespace() {
                last_token = Some(c);
            }
        }

        // A one-line string cannot span lines without a trailing backslash
        if string.is_some_and(|open| !open.triple) && !continued {
            string = None;
        }
        if brackets.is_empty() && string.is_none() && !continued {
            expect_block = last_token == Some(':');
        }
    }

    if expect_block {
        return Err(indentation(EXPECTED_BLOCK, line_count + 1));
    }
    Ok(Layout {
        unclosed_bracket: brackets.last().copied(),
    })
}

/// Consumes one character inside a string literal; returns true when it closes.
fn scan_string_char(
    c: char,
    open: OpenString,
    chars: &mut Peekable<CharIndices<'_>>,
    continued: &mut bool,
) -> bool {
    if c == '\\' {
        if chars.next().is_none() {
            *continued = true;
        }
        return false;
    }
    if c != open.quote {
        return false;
    }
    if !open.triple {
        return true;
    }
    if chars.peek().is_some_and(|&(_, q)| q == open.quote) {
        chars.next();
        if chars.peek().is_some_and(|&(_, q)| q == open.quote) {
            chars.next();
            return true;
        }
    }
    false
}

fn check_indent(
    levels: &mut Vec<Level>,
    indent: &str,
    expect_block: bool,
    line: usize,
) -> Result<(), ParseFailure> {
    let current = Level {
        width: indent_width(indent),
        columns: indent.chars().count(),
    };
    let top = levels.last().copied().unwrap_or(Level {
        width: 0,
        columns: 0,
    });

    if current.width > top.width {
        if current.columns <= top.columns {
            return Err(tab_error(line));
        }
        if !expect_block {
            return Err(indentation(UNEXPECTED_INDENT, line));
        }
        levels.push(current);
        return Ok(());
    }

    while levels.len() > 1 && levels.last().is_some_and(|l| current.width < l.width) {
        levels.pop();
    }
    match levels.last() {
        Some(level) if level.width != current.width => {
            return Err(indentation(UNMATCHED_DEDENT, line));
        }
        Some(level) if level.columns != current.columns => return Err(tab_error(line)),
        _ => {}
    }
    if expect_block {
        return Err(indentation(EXPECTED_BLOCK, line));
    }
    Ok(())
}

fn tab_error(line: usize) -> ParseFailure {
    ParseFailure::Tab {
        message: INCONSISTENT_TABS.to_string(),
        line,
    }
}

fn indentation(message: &str, line: usize) -> ParseFailure {
    ParseFailure::Indentation {
        message: message.to_string(),
        line,
    }
}

fn leading_whitespace(line: &str) -> &str {
    let end = line
        .find(|c: char| c != ' ' && c != '\t')
        .unwrap_or(line.len());
    &line[..end]
}

// Tabs advance to the next multiple of eight, as in the Python tokenizer.
fn indent_width(indent: &str) -> usize {
    indent.chars().fold(0, |width, c| match c {
        '\t' => (width / 8 + 1) * 8,
        _ => width + 1,
    })
}
