//! Entry-level edits of a sequence
//!
//! In a block sequence the comment lines above an entry travel with it: they
//! go when the entry is removed and move when entries are reordered. The
//! first entry's indentation is written on the line that owns the list, so
//! it is supplied again whenever another entry takes the first place.

use std::str::FromStr;

use rowan::ast::AstNode;
use rowan::{GreenNodeBuilder, NodeOrToken};
use yaml_edit::{Lang, Mapping, MappingBuilder, MappingEntry, Sequence, SyntaxKind, YamlFile, YamlNode};

use crate::error::DocumentError;

type SyntaxNode = rowan::SyntaxNode<Lang>;
type SyntaxElement = rowan::SyntaxElement<Lang>;

/// Stand-in pushed into an empty list, replaced right after
const STAND_IN: &str = "pending";

/// Remove the entry at `index`, with the comment lines directly above it
///
/// Comments above the first entry belong to the list and stay. A block list
/// left empty is written `[]` by a new node, which `seq` is pointed at.
pub fn remove_item(seq: &mut Sequence, index: usize) -> bool {
    if seq.is_flow_style() {
        return seq.remove(index).is_some();
    }

    let node = seq.syntax().clone();
    let host = node.parent();
    let children: Vec<SyntaxElement> = node.children_with_tokens().collect();
    let entries = entry_positions(&children);
    let Some(&at) = entries.get(index) else {
        return false;
    };

    delete_children(&node, at + 1..at + 1 + tail_len(&children, at));
    let previous = index.checked_sub(1).map(|i| entries[i]);
    if let Some(previous) = previous {
        let gap_start = previous + 1 + tail_len(&children, previous);
        let keep = usize::from(at > gap_start && children[at - 1].kind() == SyntaxKind::INDENT);
        delete_children(&node, gap_start..at - keep);
    }
    let previous_terminated = previous.is_some_and(|i| is_terminated(&children[i]));

    if seq.remove(index).is_none() {
        return false;
    }
    if node.parent().is_none() {
        if let Some(replaced) = host.and_then(|host| host.children().find_map(Sequence::cast)) {
            *seq = replaced;
        }
        return true;
    }

    // The entry now ending the list keeps its line break
    if previous_terminated {
        let last = node
            .children()
            .filter(|child| child.kind() == SyntaxKind::SEQUENCE_ENTRY)
            .last();
        if let Some(last) = last.filter(|last| !node_terminated(last)) {
            let end = last.children_with_tokens().count();
            last.splice_children(end..end, fresh_token(SyntaxKind::NEWLINE, "\n"));
        }
    }
    true
}

/// Append a new mapping entry, laid out at the column of the list's dashes
///
/// An empty list from [`ensure_block`] or `Sequence::new` turns block; an
/// empty `[]` written in the file stays flow.
pub fn append_mapping(seq: &Sequence, entry: MappingBuilder) -> Result<(), DocumentError> {
    let entry = entry.build_document();
    let Some(fields) = entry.as_mapping() else {
        return Ok(());
    };

    let stand_in = seq.is_empty();
    if stand_in {
        seq.push(STAND_IN);
    }
    if seq.is_flow_style() {
        if stand_in {
            seq.remove(seq.len().saturating_sub(1));
        }
        return append_flow(seq, &fields);
    }

    let node = seq.syntax();
    let children: Vec<SyntaxElement> = node.children_with_tokens().collect();
    let Some(&last) = entry_positions(&children).last() else {
        return Ok(());
    };
    let column = dash_column(&children[last]);
    let new_entry = block_entry(&entry.to_string(), column)?;

    if stand_in {
        node.splice_children(last..last + 1, [NodeOrToken::Node(new_entry)]);
        return Ok(());
    }

    let end = last + 1 + tail_len(&children, last);
    let mut inserts: Vec<SyntaxElement> = Vec::new();
    if !group_terminated(&children, last, end) {
        inserts.extend(fresh_token(SyntaxKind::NEWLINE, "\n"));
    }
    if column > 0 {
        inserts.extend(fresh_token(SyntaxKind::INDENT, &" ".repeat(column)));
    }
    inserts.push(NodeOrToken::Node(new_entry));
    node.splice_children(end..end, inserts);
    Ok(())
}

/// Swap an empty flow list for one that turns block on its first entry
///
/// Only a list that is the value of a mapping key is swapped; anything else
/// comes back as it was.
pub fn ensure_block(seq: Sequence) -> Sequence {
    if !seq.is_flow_style() || !seq.is_empty() {
        return seq;
    }
    let owner = seq
        .syntax()
        .parent()
        .filter(|value| value.kind() == SyntaxKind::VALUE)
        .and_then(|value| value.parent())
        .and_then(MappingEntry::cast)
        .and_then(|entry| {
            let key = entry.key_node()?.as_scalar()?.as_string();
            let mapping = entry.syntax().parent().and_then(Mapping::cast)?;
            Some((mapping, key))
        });
    let Some((mapping, key)) = owner else {
        return seq;
    };

    mapping.set(key.as_str(), Sequence::new());
    mapping.get_sequence(key.as_str()).unwrap_or(seq)
}

/// Put the entries in `order`, a permutation of their positions
///
/// Returns whether anything moved.
pub fn reorder(seq: &Sequence, order: &[usize]) -> bool {
    if order.iter().enumerate().all(|(position, &index)| position == index) {
        return false;
    }
    if seq.is_flow_style() {
        let items: Vec<YamlNode> = order.iter().filter_map(|&index| seq.get(index)).collect();
        if items.len() != seq.len() {
            return false;
        }
        for (position, item) in items.iter().enumerate() {
            seq.set(position, item);
        }
        return true;
    }

    let node = seq.syntax();
    let children: Vec<SyntaxElement> = node.children_with_tokens().collect();
    let entries = entry_positions(&children);
    if entries.len() != order.len() || order.iter().any(|&index| index >= entries.len()) {
        return false;
    }

    // (comment lines above, entry, end) per entry
    let mut groups = Vec::with_capacity(entries.len());
    let mut start = entries[0];
    for &at in &entries {
        let end = at + 1 + tail_len(&children, at);
        groups.push((start, at, end));
        start = end;
    }
    let (first, rest_end) = (entries[0], start);
    let indent = " ".repeat(dash_column(&children[first]));

    let mut arranged: Vec<SyntaxElement> = Vec::new();
    for (position, &index) in order.iter().enumerate() {
        let (start, at, end) = groups[index];
        let mut above = &children[start..at];
        if position == 0 {
            let blank = above
                .iter()
                .take_while(|element| element.kind() == SyntaxKind::NEWLINE)
                .count();
            above = &above[blank..];
            if above.first().is_some_and(|element| element.kind() == SyntaxKind::INDENT) {
                above = &above[1..];
            }
        }
        arranged.extend(above.iter().filter_map(detached_copy));
        let indented = above.last().is_some_and(|element| element.kind() == SyntaxKind::INDENT);
        if position > 0 && !indented && !indent.is_empty() {
            arranged.extend(fresh_token(SyntaxKind::INDENT, &indent));
        }
        arranged.extend(children[at..end].iter().filter_map(detached_copy));
        if position + 1 < order.len() && !group_terminated(&children, at, end) {
            arranged.extend(fresh_token(SyntaxKind::NEWLINE, "\n"));
        }
    }

    delete_children(node, first..rest_end);
    node.splice_children(first..first, arranged);
    true
}

fn append_flow(seq: &Sequence, fields: &Mapping) -> Result<(), DocumentError> {
    let pairs: Vec<String> = fields
        .iter()
        .map(|(key, value)| format!("{}: {}", key, value))
        .collect();
    let text = format!("entries: [{{{}}}]\n", pairs.join(", "));
    let file = YamlFile::from_str(&text)?;
    let mapping = file
        .documents()
        .next()
        .and_then(|document| document.as_mapping())
        .and_then(|mapping| mapping.get_sequence("entries"))
        .and_then(|entries| entries.get(0))
        .and_then(|entry| entry.as_mapping().cloned())
        .ok_or_else(|| unexpected_entry(&text))?;
    seq.push(&mapping);
    Ok(())
}

/// A block sequence entry holding the mapping `body`, dash at `column`
fn block_entry(body: &str, column: usize) -> Result<SyntaxNode, DocumentError> {
    let pad = " ".repeat(column);
    let mut text = String::from("entries:\n");
    for (i, line) in body.lines().enumerate() {
        text.push_str(&pad);
        text.push_str(if i == 0 { "- " } else { "  " });
        text.push_str(line.trim_end());
        text.push('\n');
    }

    let file = YamlFile::from_str(&text)?;
    let entry = file
        .syntax()
        .descendants()
        .find(|node| node.kind() == SyntaxKind::SEQUENCE_ENTRY)
        .ok_or_else(|| unexpected_entry(&text))?
        .clone_subtree()
        .clone_for_update();
    if !node_terminated(&entry) {
        let end = entry.children_with_tokens().count();
        entry.splice_children(end..end, fresh_token(SyntaxKind::NEWLINE, "\n"));
    }
    Ok(entry)
}

fn unexpected_entry(text: &str) -> DocumentError {
    DocumentError::UnexpectedShape {
        path: text.lines().next().unwrap_or_default().to_string(),
        expected: "a sequence entry".to_string(),
    }
}

fn entry_positions(children: &[SyntaxElement]) -> Vec<usize> {
    children
        .iter()
        .enumerate()
        .filter(|(_, child)| child.kind() == SyntaxKind::SEQUENCE_ENTRY)
        .map(|(i, _)| i)
        .collect()
}

/// Tokens after the entry at `at` that finish its line, when the entry does
/// not carry its own line break
fn tail_len(children: &[SyntaxElement], at: usize) -> usize {
    if is_terminated(&children[at]) {
        return 0;
    }
    let mut len = 0;
    for child in &children[at + 1..] {
        match child.kind() {
            SyntaxKind::WHITESPACE | SyntaxKind::COMMENT => len += 1,
            SyntaxKind::NEWLINE => return len + 1,
            _ => break,
        }
    }
    len
}

fn group_terminated(children: &[SyntaxElement], at: usize, end: usize) -> bool {
    is_terminated(&children[at])
        || children[at + 1..end]
            .iter()
            .any(|child| child.kind() == SyntaxKind::NEWLINE)
}

fn is_terminated(element: &SyntaxElement) -> bool {
    match element {
        NodeOrToken::Node(node) => node_terminated(node),
        NodeOrToken::Token(token) => token.kind() == SyntaxKind::NEWLINE,
    }
}

fn node_terminated(node: &SyntaxNode) -> bool {
    node.last_token()
        .is_some_and(|token| token.kind() == SyntaxKind::NEWLINE)
}

/// Column of an entry's dash within its line
fn dash_column(entry: &SyntaxElement) -> usize {
    let dash = match entry {
        NodeOrToken::Node(node) => node
            .children_with_tokens()
            .find(|child| child.kind() == SyntaxKind::DASH)
            .unwrap_or_else(|| entry.clone()),
        NodeOrToken::Token(_) => entry.clone(),
    };
    let offset = usize::from(dash.text_range().start());
    let Some(root) = dash.parent().and_then(|parent| parent.ancestors().last()) else {
        return 0;
    };
    let text = root.to_string();
    let head = text.get(..offset).unwrap_or_default();
    match head.rfind('\n') {
        Some(newline) => offset - newline - 1,
        None => offset,
    }
}

/// Delete children one at a time, last first
fn delete_children(node: &SyntaxNode, range: std::ops::Range<usize>) {
    for i in range.rev() {
        node.splice_children(i..i + 1, std::iter::empty());
    }
}

fn detached_copy(element: &SyntaxElement) -> Option<SyntaxElement> {
    match element {
        NodeOrToken::Node(node) => Some(NodeOrToken::Node(node.clone_subtree().clone_for_update())),
        NodeOrToken::Token(token) => fresh_token(token.kind(), token.text()),
    }
}

fn fresh_token(kind: SyntaxKind, text: &str) -> Option<SyntaxElement> {
    let mut builder = GreenNodeBuilder::new();
    builder.start_node(SyntaxKind::ROOT.into());
    builder.token(kind.into(), text);
    builder.finish_node();
    SyntaxNode::new_root_mut(builder.finish())
        .first_token()
        .map(NodeOrToken::Token)
}
