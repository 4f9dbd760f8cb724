//! Comment-preserving configuration document
//!
//! The text is parsed by [`yaml_edit`] into a lossless syntax tree: comments,
//! blank lines, key order, indentation and the source spelling of every
//! scalar live in the tree, so parts a run does not edit are written back
//! byte for byte. [`Mapping`] and [`Sequence`] handles edit the tree in place
//! through shared references.

mod accessor;
mod items;

use std::fmt;
use std::str::FromStr;

use rowan::ast::AstNode;
pub use yaml_edit::{Mapping, MappingBuilder, Sequence, YamlNode};
use yaml_edit::{SyntaxKind, YamlFile};

pub use accessor::{get_child, scalar_value, set_child, set_scalar, NodeKind};
pub use items::{append_mapping, ensure_block, remove_item, reorder};

use crate::error::DocumentError;

/// Line break style of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    /// Style of the first line break in `text`
    pub fn detect(text: &str) -> Self {
        match text.find('\n') {
            Some(i) if text[..i].ends_with('\r') => LineEnding::CrLf,
            _ => LineEnding::Lf,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// A parsed configuration document whose top level is a mapping
pub struct Document {
    file: YamlFile,
    root: Mapping,
    line_ending: LineEnding,
}

impl Document {
    /// Parse a single YAML document with a mapping at the top level
    pub fn parse(text: &str) -> Result<Self, DocumentError> {
        let file = YamlFile::from_str(text)?;
        let mut documents = file.documents();
        let first = documents.next().ok_or(DocumentError::Empty)?;
        if let Some(second) = documents.next() {
            let offset = usize::from(second.syntax().text_range().start());
            return Err(DocumentError::Unsupported {
                line: line_of(text, offset),
                construct: "more than one document".to_string(),
            });
        }

        check_block_entries(&first, text)?;

        let root = match first.as_mapping() {
            Some(root) => root,
            None if first.as_sequence().is_none()
                && first.as_scalar().map_or(true, |scalar| scalar.is_null()) =>
            {
                return Err(DocumentError::Empty);
            }
            None => {
                return Err(DocumentError::UnexpectedShape {
                    path: String::new(),
                    expected: "a mapping at the top level".to_string(),
                });
            }
        };

        Ok(Self {
            file,
            root,
            line_ending: LineEnding::detect(text),
        })
    }

    /// Render the document in its own line break style; the result ends
    /// with exactly one line break
    pub fn render(&self) -> String {
        let text = self.file.to_string();
        let body = text.trim_end_matches(['\r', '\n']);
        let mut out = match self.line_ending {
            LineEnding::Lf => body.to_string(),
            LineEnding::CrLf => to_crlf(body),
        };
        out.push_str(self.line_ending.as_str());
        out
    }

    /// The top-level mapping
    pub fn root(&self) -> &Mapping {
        &self.root
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("line_ending", &self.line_ending)
            .finish_non_exhaustive()
    }
}

impl FromStr for Document {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// 1-based line of a byte offset
fn line_of(text: &str, offset: usize) -> usize {
    text.get(..offset)
        .map_or(0, |head| head.matches('\n').count())
        + 1
}

/// Block sequence entries must open their own line; `key: - a` is not YAML
fn check_block_entries(document: &yaml_edit::Document, text: &str) -> Result<(), DocumentError> {
    let dashes = document
        .syntax()
        .descendants_with_tokens()
        .filter(|element| element.kind() == SyntaxKind::DASH)
        .filter(|dash| dash.parent().is_some_and(|entry| entry.kind() == SyntaxKind::SEQUENCE_ENTRY));
    for dash in dashes {
        let offset = usize::from(dash.text_range().start());
        let head = text.get(..offset).unwrap_or_default();
        let line = &head[head.rfind('\n').map_or(0, |newline| newline + 1)..];
        if line.chars().any(|c| !matches!(c, ' ' | '-' | '\u{feff}')) {
            return Err(DocumentError::Syntax {
                line: line_of(text, offset),
                message: "block sequence entry on the same line as its key".to_string(),
            });
        }
    }
    Ok(())
}

/// Turn every lone `\n` into `\r\n`; edits insert `\n` breaks
fn to_crlf(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 16);
    let mut previous = None;
    for c in text.chars() {
        if c == '\n' && previous != Some('\r') {
            out.push('\r');
        }
        out.push(c);
        previous = Some(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untouched_text_round_trips() {
        for src in [
            "# c\n---\nname: x\n",
            "list:\n- a\n-   b\n",
            "a: [1, 2,\n  3]\n",
            "a: 1\n...\n",
            "a:    \n  b: 1\n",
            "key: 'single'   # spaced comment\n\n\nother: \"x\\ty\"\n",
            "text: |\n  kept\n    as is\n",
        ] {
            let document = Document::parse(src).unwrap();
            assert_eq!(document.render(), src);
            assert_eq!(document.to_string(), src);
        }
    }

    #[test]
    fn test_crlf_is_preserved() {
        let document = Document::parse("a: 1\r\nb: 2\r\n").unwrap();
        assert_eq!(document.line_ending, LineEnding::CrLf);
        assert_eq!(document.render(), "a: 1\r\nb: 2\r\n");

        set_child(document.root(), "c", "3");
        let rendered = document.render();
        assert!(rendered.starts_with("a: 1\r\nb: 2\r\n"));
        assert!(rendered.contains("c: '3'") || rendered.contains("c: \"3\""));
        assert!(rendered.ends_with("\r\n"));
        assert_eq!(rendered.matches('\n').count(), rendered.matches("\r\n").count());
    }

    #[test]
    fn test_line_ending_detection() {
        assert_eq!(LineEnding::detect("a: 1\n"), LineEnding::Lf);
        assert_eq!(LineEnding::detect("a: 1\r\nb: 2\n"), LineEnding::CrLf);
        assert_eq!(LineEnding::detect("a: 1"), LineEnding::Lf);
        assert_eq!(to_crlf("a\nb\r\nc"), "a\r\nb\r\nc");
    }

    #[test]
    fn test_output_ends_with_one_line_break() {
        assert_eq!(Document::parse("a: 1").unwrap().render(), "a: 1\n");
        assert_eq!(Document::parse("a: 1\n\n\n").unwrap().render(), "a: 1\n");
    }

    #[test]
    fn test_rejected_documents() {
        assert_eq!(Document::parse("").unwrap_err(), DocumentError::Empty);
        assert!(matches!(
            Document::parse("- a\n- b\n"),
            Err(DocumentError::UnexpectedShape { .. })
        ));
        assert!(matches!(
            Document::parse("a: 1\n---\nb: 2\n"),
            Err(DocumentError::Unsupported { .. })
        ));
        assert!(matches!(
            Document::parse("a: [1, 2\n"),
            Err(DocumentError::Syntax { .. })
        ));
        assert_eq!(
            Document::parse("a: 1\nb: - c\n").unwrap_err(),
            DocumentError::Syntax {
                line: 2,
                message: "block sequence entry on the same line as its key".to_string(),
            }
        );
        assert!(Document::parse("a:\n- - b\n  - c\n").is_ok());
    }

    #[test]
    fn test_values_agree_with_serde_yaml() {
        let src = "model: ollama:llama3\nclients:\n- type: openai-compatible\n  name: ollama\n  api_key: 'secret #1'\n  models:\n    - name: llama3\n      max_input_tokens: 8192\n      note: \"tab\\tseparated\"\n";
        let document = Document::parse(src).unwrap();
        let expected: serde_yaml::Value = serde_yaml::from_str(src).unwrap();

        let clients = get_child(document.root(), "clients", NodeKind::Sequence).unwrap();
        let client = clients.get_item(0).unwrap();
        let client = client.as_mapping().unwrap();
        assert_eq!(
            scalar_value(client, "api_key").as_deref(),
            expected["clients"][0]["api_key"].as_str()
        );
        let models = get_child(client, "models", NodeKind::Sequence).unwrap();
        let first = models.get_item(0).unwrap();
        assert_eq!(
            scalar_value(first.as_mapping().unwrap(), "note").as_deref(),
            expected["clients"][0]["models"][0]["note"].as_str()
        );
        assert_eq!(
            scalar_value(document.root(), "model").as_deref(),
            expected["model"].as_str()
        );
        assert_eq!(document.render(), src);
    }
}
