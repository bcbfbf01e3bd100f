//! Turning ERROR and MISSING nodes into diagnostics

use text_size::{TextRange, TextSize};

use super::{ErrorCode, RelatedInfo, SyntaxError};
use crate::tree::{Node, Tree};

/// Collect one diagnostic per ERROR or MISSING node, in document order.
/// ERROR nodes are reported as a whole; nothing inside them is reported.
pub(crate) fn collect(tree: &Tree) -> Vec<SyntaxError> {
    let mut errors = Vec::new();
    let root = tree.root_node();
    if !root.has_error() {
        return errors;
    }
    if root.is_error() {
        errors.push(
            SyntaxError::new(ErrorCode::E0901, root.range())
                .with_message(format!("could not parse input as {}", start_kind(tree))),
        );
        return errors;
    }

    let mut stack = vec![(root, None::<Node<'_>>)];
    while let Some((node, parent)) = stack.pop() {
        if node.is_missing() {
            errors.push(missing(&node, parent));
        } else if node.is_error() {
            errors.push(unexpected(tree, &node, parent));
        } else {
            let children: Vec<_> = node.children().filter(Node::has_error).collect();
            stack.extend(children.into_iter().rev().map(|child| (child, Some(node))));
        }
    }
    errors
}

fn start_kind(tree: &Tree) -> &str {
    let language = tree.language();
    language.symbol_name(language.start_symbol())
}

fn missing(node: &Node<'_>, parent: Option<Node<'_>>) -> SyntaxError {
    let offset = TextSize::try_from(node.start_byte()).unwrap_or(TextSize::new(u32::MAX));
    let error = if node.is_named() {
        SyntaxError::missing(ErrorCode::E0202, offset).with_message(format!("missing {}", node.kind()))
    } else {
        SyntaxError::missing(ErrorCode::E0201, offset)
            .with_message(format!("missing `{}`", node.kind()))
            .with_hint(format!("insert `{}`", node.kind()))
    };
    with_context(error, parent)
}

fn unexpected(tree: &Tree, node: &Node<'_>, parent: Option<Node<'_>>) -> SyntaxError {
    let text = node.text();
    let error = if node.subtree.leaf || only_error_leaves(node) {
        let code = if std::str::from_utf8(text).is_ok() {
            ErrorCode::E0101
        } else {
            ErrorCode::E0102
        };
        SyntaxError::new(code, node.range())
            .with_message(format!("{} `{}`", code.default_message(), preview(text)))
    } else if let [single] = node.subtree.children.as_slice()
        && single.leaf
    {
        SyntaxError::new(ErrorCode::E0301, node.range())
            .with_message(format!("unexpected `{}`", preview(text)))
            .with_hint("remove it")
    } else if reaches_end(tree, node) {
        // point at where more input was expected, not at the whole fragment
        SyntaxError::new(ErrorCode::E0303, TextRange::empty(node.range().end()))
            .with_message(format!("unexpected end of input after `{}`", preview(text)))
            .with_related(RelatedInfo::new("incomplete input starts here", node.range()))
    } else {
        let first = node
            .named_children()
            .next()
            .map(|child| child.kind())
            .unwrap_or("input");
        SyntaxError::new(ErrorCode::E0302, node.range()).with_message(format!("unexpected {first}"))
    };
    with_context(error, parent)
}

fn with_context(error: SyntaxError, parent: Option<Node<'_>>) -> SyntaxError {
    match parent {
        Some(parent) if parent != parent.tree.root_node() => {
            error.with_related(RelatedInfo::new(
                format!("in this {}", parent.kind()),
                parent.range(),
            ))
        }
        _ => error,
    }
}

/// Only trailing whitespace follows the node.
fn reaches_end(tree: &Tree, node: &Node<'_>) -> bool {
    tree.source()[node.end_byte()..]
        .iter()
        .all(u8::is_ascii_whitespace)
}

fn only_error_leaves(node: &Node<'_>) -> bool {
    let mut stack = vec![node.subtree];
    let mut any = false;
    while let Some(subtree) = stack.pop() {
        if subtree.leaf {
            if subtree.is_error() {
                any = true;
            } else if subtree.size > 0 && !node.tree.language().is_extra(subtree.symbol) {
                return false;
            }
        } else {
            stack.extend(subtree.children.iter());
        }
    }
    any
}

fn preview(text: &[u8]) -> String {
    const LIMIT: usize = 24;
    let text = String::from_utf8_lossy(text);
    let text = text.trim();
    match text.char_indices().nth(LIMIT) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
