//! PDML document tree.
//!
//! A [`Document`] owns every node of a parsed tree. Children are stored as
//! indices into the document and every non-root node keeps the index of its
//! parent, so walking up the tree never involves ownership. Nodes are read
//! through the borrowed [`Node`] handle.

use std::fmt;

/// Separator between names in [`Node::path`].
pub const PATH_SEPARATOR: char = '/';

/// Index of a node within its [`Document`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// The root node is always the first node of a document.
    pub const ROOT: NodeId = NodeId(0);

    /// Position of the node in document (pre-)order.
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum NodeData {
    Root {
        name: String,
        children: Vec<NodeId>,
    },
    Branch {
        name: String,
        children: Vec<NodeId>,
        parent: NodeId,
    },
    Text {
        text: String,
        parent: NodeId,
    },
}

/// A parsed PDML document.
///
/// Two documents are equal when their trees have the same shape, names and text.
#[derive(Clone, PartialEq, Eq)]
pub struct Document {
    nodes: Vec<NodeData>,
}

impl Document {
    /// Start a document; the builder must call [`Document::push_root`] first.
    pub(crate) fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub(crate) fn push_root(&mut self, name: String) -> NodeId {
        debug_assert!(self.nodes.is_empty(), "a document has exactly one root");
        self.nodes.push(NodeData::Root {
            name,
            children: Vec::new(),
        });
        NodeId::ROOT
    }

    /// Append a branch node at the end of `parent`'s children.
    pub(crate) fn append_branch(&mut self, parent: NodeId, name: String) -> NodeId {
        self.append_child(
            parent,
            NodeData::Branch {
                name,
                children: Vec::new(),
                parent,
            },
        )
    }

    /// Append a text node at the end of `parent`'s children.
    pub(crate) fn append_text(&mut self, parent: NodeId, text: String) -> NodeId {
        debug_assert!(!text.is_empty(), "empty text runs are never stored");
        self.append_child(parent, NodeData::Text { text, parent })
    }

    fn append_child(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(data);
        match &mut self.nodes[parent.0] {
            NodeData::Root { children, .. } | NodeData::Branch { children, .. } => {
                children.push(id)
            }
            NodeData::Text { .. } => unreachable!("text nodes have no children"),
        }
        id
    }

    /// The root node.
    pub fn root(&self) -> Node<'_> {
        self.node(NodeId::ROOT)
    }

    /// The node with the given id.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this document.
    pub fn node(&self, id: NodeId) -> Node<'_> {
        assert!(id.0 < self.nodes.len(), "node {:?} is not in this document", id);
        Node { doc: self, id }
    }

    /// Total number of nodes, text nodes included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A parsed document always has a root, so this is only `true` while building.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nodes.is_empty() {
            return write!(f, "Document(<empty>)");
        }
        write!(f, "Document({:?})", self.root())
    }
}

/// What a node is, with its name or text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind<'doc> {
    Root { name: &'doc str },
    Branch { name: &'doc str },
    Text { text: &'doc str },
}

/// A borrowed handle to one node of a [`Document`].
#[derive(Clone, Copy)]
pub struct Node<'doc> {
    doc: &'doc Document,
    id: NodeId,
}

impl<'doc> Node<'doc> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn document(&self) -> &'doc Document {
        self.doc
    }

    fn data(&self) -> &'doc NodeData {
        &self.doc.nodes[self.id.0]
    }

    pub fn kind(&self) -> NodeKind<'doc> {
        match self.data() {
            NodeData::Root { name, .. } => NodeKind::Root { name },
            NodeData::Branch { name, .. } => NodeKind::Branch { name },
            NodeData::Text { text, .. } => NodeKind::Text { text },
        }
    }

    /// Name of a root or branch node.
    pub fn name(&self) -> Option<&'doc str> {
        match self.data() {
            NodeData::Root { name, .. } | NodeData::Branch { name, .. } => Some(name),
            NodeData::Text { .. } => None,
        }
    }

    /// Decoded content of a text node.
    pub fn text(&self) -> Option<&'doc str> {
        match self.data() {
            NodeData::Text { text, .. } => Some(text),
            NodeData::Root { .. } | NodeData::Branch { .. } => None,
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self.data(), NodeData::Root { .. })
    }

    pub fn is_branch(&self) -> bool {
        matches!(self.data(), NodeData::Branch { .. })
    }

    pub fn is_text(&self) -> bool {
        matches!(self.data(), NodeData::Text { .. })
    }

    /// `true` if the node has no children. Text nodes never have children.
    pub fn is_empty(&self) -> bool {
        self.child_ids().is_empty()
    }

    fn child_ids(&self) -> &'doc [NodeId] {
        match self.data() {
            NodeData::Root { children, .. } | NodeData::Branch { children, .. } => children,
            NodeData::Text { .. } => &[],
        }
    }

    /// Children in document order.
    pub fn children(&self) -> impl ExactSizeIterator<Item = Node<'doc>> + 'doc {
        let doc = self.doc;
        self.child_ids().iter().map(move |&id| Node { doc, id })
    }

    pub fn child_count(&self) -> usize {
        self.child_ids().len()
    }

    /// The enclosing root or branch node. The root has no parent.
    pub fn parent(&self) -> Option<Node<'doc>> {
        let parent = match self.data() {
            NodeData::Root { .. } => return None,
            NodeData::Branch { parent, .. } | NodeData::Text { parent, .. } => *parent,
        };
        Some(Node {
            doc: self.doc,
            id: parent,
        })
    }

    /// The root node of the document this node belongs to.
    pub fn root(&self) -> Node<'doc> {
        self.doc.root()
    }

    /// Ancestors from the parent up to the root.
    pub fn ancestors(&self) -> impl Iterator<Item = Node<'doc>> + 'doc {
        std::iter::successors(self.parent(), Node::parent)
    }

    /// Names from the root down to this node.
    ///
    /// A text node contributes no name of its own.
    pub fn path_names(&self) -> Vec<&'doc str> {
        let mut names: Vec<&'doc str> = self.name().into_iter().collect();
        names.extend(self.ancestors().filter_map(|n| n.name()));
        names.reverse();
        names
    }

    /// Names from the root down to this node, joined by [`PATH_SEPARATOR`].
    pub fn path(&self) -> String {
        let mut separator = [0u8; 4];
        self.path_names()
            .join(&*PATH_SEPARATOR.encode_utf8(&mut separator))
    }

    /// This node followed by all its descendants, depth first, in document order.
    pub fn descendants(&self) -> Descendants<'doc> {
        Descendants {
            doc: self.doc,
            stack: vec![self.id],
        }
    }
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            NodeKind::Text { text } => write!(f, "{:?}", text),
            NodeKind::Root { name } | NodeKind::Branch { name } => {
                write!(f, "[{}", name)?;
                for child in self.children() {
                    write!(f, " {:?}", child)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.id == other.id
    }
}

impl Eq for Node<'_> {}

/// Pre-order iterator returned by [`Node::descendants`].
pub struct Descendants<'doc> {
    doc: &'doc Document,
    stack: Vec<NodeId>,
}

impl<'doc> Iterator for Descendants<'doc> {
    type Item = Node<'doc>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = Node { doc: self.doc, id };
        self.stack.extend(node.child_ids().iter().rev());
        Some(node)
    }
}
