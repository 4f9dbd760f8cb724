//! Keyed access to mapping values, with kind checks
//!
//! Lookups never fail loudly: a missing key, a value of another kind or a
//! malformed entry is simply not-found. Handles share the document tree, so
//! a returned node can be edited in place.

use yaml_edit::{AsYaml, Mapping, Scalar, ScalarValue, YamlNode};

/// Kind of a node, as far as lookups care
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Scalar,
    Mapping,
    Sequence,
}

/// Kind of `node`; aliases and tagged nodes have none
pub fn kind_of(node: &YamlNode) -> Option<NodeKind> {
    match node {
        YamlNode::Scalar(_) => Some(NodeKind::Scalar),
        YamlNode::Mapping(_) => Some(NodeKind::Mapping),
        YamlNode::Sequence(_) => Some(NodeKind::Sequence),
        YamlNode::Alias(_) | YamlNode::TaggedNode(_) => None,
    }
}

/// Value paired with `key`, only if it is of the expected kind
pub fn get_child(mapping: &Mapping, key: &str, kind: NodeKind) -> Option<YamlNode> {
    mapping
        .get(key)
        .filter(|value| kind_of(value) == Some(kind))
}

/// Text of a scalar value; `None` when absent, null or not a scalar
pub fn scalar_value(mapping: &Mapping, key: &str) -> Option<String> {
    get_child(mapping, key, NodeKind::Scalar)?
        .as_scalar()
        .filter(|scalar| !scalar.is_null())
        .map(decode)
}

fn decode(scalar: &Scalar) -> String {
    let raw = scalar.value();
    match raw.strip_prefix('"').and_then(|quoted| quoted.strip_suffix('"')) {
        Some(body) if body.contains('\n') => ScalarValue::parse_escape_sequences(&fold_double_quoted(body)),
        _ => scalar.as_string(),
    }
}

/// Fold the lines of a double-quoted body into one, leaving escapes for
/// the unescaper
///
/// A line break becomes a space, each blank line a `\n`, and an escaped
/// break joins the lines with nothing. Indentation of continuation lines is
/// dropped.
fn fold_double_quoted(body: &str) -> String {
    let lines: Vec<&str> = body.split('\n').map(|line| line.trim_end_matches('\r')).collect();
    let last = lines.len() - 1;
    let mut out = String::with_capacity(body.len());
    let mut breaks = 0;
    let mut joined = false;
    for (i, &line) in lines.iter().enumerate() {
        let mut text = if i == 0 { line } else { line.trim_start_matches([' ', '\t']) };
        if i < last {
            if odd_backslashes(text) {
                push_separator(&mut out, i, joined, breaks);
                out.push_str(&text[..text.len() - 1]);
                joined = true;
                breaks = 0;
                continue;
            }
            let trimmed = text.trim_end_matches([' ', '\t']);
            // an escaped space or tab before the break survives
            text = if odd_backslashes(trimmed) && trimmed.len() < text.len() {
                &text[..trimmed.len() + 1]
            } else {
                trimmed
            };
            if i > 0 && text.is_empty() {
                breaks += 1;
                continue;
            }
        }
        push_separator(&mut out, i, joined, breaks);
        out.push_str(text);
        joined = false;
        breaks = 0;
    }
    out
}

fn push_separator(out: &mut String, line: usize, joined: bool, breaks: usize) {
    if line == 0 || joined {
        return;
    }
    match breaks {
        0 => out.push(' '),
        n => out.push_str(&"\\n".repeat(n)),
    }
}

fn odd_backslashes(text: &str) -> bool {
    text.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

/// Set the value paired with `key`
///
/// An existing value is replaced at its position; a new key is appended at
/// the end of the mapping.
pub fn set_child(mapping: &Mapping, key: &str, value: impl AsYaml) {
    mapping.set(key, value);
}

/// Set a string value, rewriting an existing scalar's text in place so
/// its key, spacing and trailing comment stay put
pub fn set_scalar(mapping: &Mapping, key: &str, value: &str) {
    let existing = get_child(mapping, key, NodeKind::Scalar)
        .and_then(|node| node.as_scalar().cloned())
        .filter(|scalar| !scalar.is_null());
    match existing {
        Some(scalar) => scalar.set_value(&yaml_edit::ScalarValue::string(value).to_yaml_string()),
        None => set_child(mapping, key, value),
    }
}
