//! Depth-first traversal helpers.

use crate::node::{Node, NodeKind};

/// Call `visit` on `tree` and every node below it, depth first, in document order.
pub fn for_each_node<'doc, F>(tree: Node<'doc>, mut visit: F)
where
    F: FnMut(Node<'doc>),
{
    for node in tree.descendants() {
        visit(node);
    }
}

/// Call `visit` with the content of every text node below `tree`, in document order.
pub fn for_each_text<'doc, F>(tree: Node<'doc>, mut visit: F)
where
    F: FnMut(&'doc str),
{
    for_each_node(tree, |node| {
        if let NodeKind::Text { text } = node.kind() {
            visit(text);
        }
    });
}

/// Concatenation of all text below `tree`.
pub fn collect_text(tree: Node<'_>) -> String {
    let mut out = String::new();
    for_each_text(tree, |text| out.push_str(text));
    out
}
