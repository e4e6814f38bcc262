/*!
# Document tree

This module defines the in-memory representation of a parsed document.

A tree consists of [`Node`]s which are always handled through the shared
pointer type [`NodeRef`]. Every node except the root carries a non-owning
back-reference to its parent. That back-reference is set exactly once, at the
moment the parent node is created from its (already complete) children. Nodes
are therefore built bottom-up:

```
use rxtree::{Node, QName};
let text = Node::new_text("Hello!");
assert!(text.parent().is_none());
let greeting = Node::new_element(
	QName::unqualified("greeting"),
	Vec::new(),
	Vec::new(),
	vec![text.clone()],
).unwrap();
assert!(text.parent().unwrap().as_element().is_some());
```

Once a node is attached to its parent, its shape is frozen. Attempting to
attach it a second time, or attaching a root node anywhere, is a
[`StructureError`].
*/
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

#[cfg(not(feature = "mt"))]
use std::cell::OnceCell;
#[cfg(not(feature = "mt"))]
use std::rc::{Rc, Weak};
#[cfg(feature = "mt")]
use std::sync::{Arc, OnceLock, Weak};

use smartstring::alias::String as SmartString;

use crate::error::StructureError;

/// Wrapper pointer around nodes and namespace URIs
///
/// In builds with the `mt` feature, this is a [`std::sync::Arc`]. In non-`mt`
/// builds, this is a [`std::rc::Rc`].
#[cfg(feature = "mt")]
pub type RcPtr<T> = Arc<T>;
/// Wrapper pointer around nodes and namespace URIs
///
/// In builds with the `mt` feature, this is a [`std::sync::Arc`]. In non-`mt`
/// builds, this is a [`std::rc::Rc`].
#[cfg(not(feature = "mt"))]
pub type RcPtr<T> = Rc<T>;

/// Non-owning counterpart of [`RcPtr`].
pub type WeakPtr<T> = Weak<T>;

#[cfg(feature = "mt")]
type ParentSlot = OnceLock<WeakPtr<Node>>;
#[cfg(not(feature = "mt"))]
type ParentSlot = OnceCell<WeakPtr<Node>>;

/// Shared namespace URI
pub type NamespaceName = RcPtr<str>;

/// Short string used for prefixes and local names.
pub type NCName = SmartString;

/// Shared pointer to a node.
pub type NodeRef = RcPtr<Node>;

/// XML core namespace URI (for the `xml:` prefix)
pub const XMLNS_XML: &'static str = "http://www.w3.org/XML/1998/namespace";
/// XML namespace URI (for the `xmlns:` prefix)
pub const XMLNS_XMLNS: &'static str = "http://www.w3.org/2000/xmlns/";

/**
# Qualified name

A name consisting of an optional prefix, the namespace URI the prefix
resolved to (if any) and the local name.

The identity of a qualified name is the `(namespace, local_name)` pair; the
prefix is only kept so that the name can be written back the way it was
read. Equality and hashing ignore the prefix.
*/
#[derive(Clone, Debug)]
pub struct QName {
	pub prefix: Option<NCName>,
	pub namespace: Option<NamespaceName>,
	pub local_name: NCName,
}

impl QName {
	pub fn new<L: Into<NCName>>(
		prefix: Option<NCName>,
		namespace: Option<NamespaceName>,
		local_name: L,
	) -> Self {
		Self {
			prefix,
			namespace,
			local_name: local_name.into(),
		}
	}

	/// Create a name without prefix and without namespace.
	pub fn unqualified<L: Into<NCName>>(local_name: L) -> Self {
		Self::new(None, None, local_name)
	}

	/// Create a name in the given namespace, without prefix.
	///
	/// Serializing an element with such a name relies on a default namespace
	/// declaration being in effect.
	pub fn namespaced<L: Into<NCName>>(namespace: &str, local_name: L) -> Self {
		Self::new(None, Some(namespace.into()), local_name)
	}

	/// Return the namespace URI as string slice.
	pub fn namespace_str(&self) -> Option<&str> {
		self.namespace.as_deref()
	}

	/// Test whether this name has the given namespace and local name.
	pub fn matches(&self, namespace: Option<&str>, local_name: &str) -> bool {
		self.namespace_str() == namespace && self.local_name.as_str() == local_name
	}
}

impl PartialEq for QName {
	fn eq(&self, other: &QName) -> bool {
		self.namespace_str() == other.namespace_str() && self.local_name == other.local_name
	}
}

impl Eq for QName {}

impl Hash for QName {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.namespace_str().hash(state);
		self.local_name.hash(state);
	}
}

impl fmt::Display for QName {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self.prefix.as_ref() {
			Some(prefix) => write!(f, "{}:{}", prefix, self.local_name),
			None => f.write_str(&self.local_name),
		}
	}
}

/// Top-level container of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct Root {
	children: Vec<NodeRef>,
}

impl Root {
	/// Top-level nodes in document order.
	pub fn children(&self) -> &[NodeRef] {
		&self.children
	}

	/// The document element.
	pub fn root_element(&self) -> Option<&NodeRef> {
		self.children.iter().find(|n| n.as_element().is_some())
	}
}

/// An element with its namespace declarations, attributes and content.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
	name: QName,
	namespaces: Vec<NodeRef>,
	attributes: Vec<NodeRef>,
	children: Vec<NodeRef>,
}

impl Element {
	pub fn name(&self) -> &QName {
		&self.name
	}

	/// Namespace declaration nodes, in source order.
	pub fn namespace_nodes(&self) -> &[NodeRef] {
		&self.namespaces
	}

	/// Attribute nodes, in source order.
	pub fn attribute_nodes(&self) -> &[NodeRef] {
		&self.attributes
	}

	/// Content nodes, in document order.
	pub fn children(&self) -> &[NodeRef] {
		&self.children
	}

	pub fn namespaces(&self) -> impl Iterator<Item = &NamespaceDecl> {
		self.namespaces.iter().filter_map(|n| n.as_namespace_decl())
	}

	pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
		self.attributes.iter().filter_map(|n| n.as_attribute())
	}

	/// Look up the value of an attribute by namespace and local name.
	pub fn attribute(&self, namespace: Option<&str>, local_name: &str) -> Option<&str> {
		self.attributes()
			.find(|a| a.name.matches(namespace, local_name))
			.map(|a| a.value.as_str())
	}

	/// Iterate the child elements, skipping text, comments and processing
	/// instructions.
	pub fn child_elements(&self) -> impl Iterator<Item = &NodeRef> {
		self.children.iter().filter(|n| n.as_element().is_some())
	}

	/// Find the first child element with the given name.
	pub fn find_child(&self, namespace: Option<&str>, local_name: &str) -> Option<&NodeRef> {
		self.child_elements().find(|n| match n.as_element() {
			Some(el) => el.name.matches(namespace, local_name),
			None => false,
		})
	}

	/// Concatenation of all direct text children.
	pub fn text(&self) -> String {
		let mut result = String::new();
		for child in self.children.iter() {
			if let Some(text) = child.as_text() {
				result.push_str(text);
			}
		}
		result
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
	pub name: QName,
	pub value: String,
}

/// Namespace declaration as found on an element.
///
/// A `None` prefix denotes the default namespace. A `None` URI denotes an
/// undeclaration (`xmlns=''`).
#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceDecl {
	pub prefix: Option<NCName>,
	pub uri: Option<NamespaceName>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingInstruction {
	pub target: NCName,
	pub data: String,
}

/// The payload of a [`Node`].
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
	Root(Root),
	Element(Element),
	Attribute(Attribute),
	NamespaceDecl(NamespaceDecl),
	Text(String),
	Comment(String),
	ProcessingInstruction(ProcessingInstruction),
}

impl NodeKind {
	/// Return a static string describing the node kind.
	pub fn name(&self) -> &'static str {
		match self {
			Self::Root(..) => "root",
			Self::Element(..) => "element",
			Self::Attribute(..) => "attribute",
			Self::NamespaceDecl(..) => "namespace declaration",
			Self::Text(..) => "text",
			Self::Comment(..) => "comment",
			Self::ProcessingInstruction(..) => "processing instruction",
		}
	}

	fn owned_sequences(&self) -> [&[NodeRef]; 3] {
		match self {
			Self::Root(r) => [&r.children[..], &[], &[]],
			Self::Element(e) => [&e.namespaces[..], &e.attributes[..], &e.children[..]],
			_ => [&[], &[], &[]],
		}
	}
}

/**
# Tree node

A node couples a [`NodeKind`] with the back-reference to its parent.

Equality compares the payload recursively and ignores the parent.
*/
pub struct Node {
	parent: ParentSlot,
	kind: NodeKind,
}

enum Slot {
	Namespace,
	Attribute,
	Child,
}

fn check_adoptable(nodes: &[NodeRef], slot: Slot) -> Result<(), StructureError> {
	for node in nodes.iter() {
		let fits = match (&slot, &node.kind) {
			(_, NodeKind::Root(..)) => return Err(StructureError::RootAsChild),
			(Slot::Namespace, NodeKind::NamespaceDecl(..)) => true,
			(Slot::Attribute, NodeKind::Attribute(..)) => true,
			(Slot::Child, NodeKind::Element(..))
			| (Slot::Child, NodeKind::Text(..))
			| (Slot::Child, NodeKind::Comment(..))
			| (Slot::Child, NodeKind::ProcessingInstruction(..)) => true,
			_ => false,
		};
		if !fits {
			return Err(StructureError::MisplacedNode(node.kind.name()));
		}
		if node.parent.get().is_some() {
			return Err(StructureError::AlreadyOwned);
		}
	}
	Ok(())
}

impl Node {
	fn leaf(kind: NodeKind) -> NodeRef {
		RcPtr::new(Node {
			parent: ParentSlot::new(),
			kind,
		})
	}

	/// Freeze a node whose owned sequences are complete, binding the
	/// back-reference of every owned node to it.
	///
	/// Nothing is bound unless the whole set can be adopted.
	fn adopt(kind: NodeKind) -> Result<NodeRef, StructureError> {
		let mut seen = HashSet::new();
		for child in kind.owned_sequences().iter().flat_map(|seq| seq.iter()) {
			if !seen.insert(RcPtr::as_ptr(child)) {
				return Err(StructureError::AlreadyOwned);
			}
		}
		Ok(RcPtr::new_cyclic(|this: &WeakPtr<Node>| {
			for seq in kind.owned_sequences().iter() {
				for child in seq.iter() {
					// unowned and distinct, see check_adoptable and above
					let _ = child.parent.set(this.clone());
				}
			}
			Node {
				parent: ParentSlot::new(),
				kind,
			}
		}))
	}

	/// Create a root node owning the given top-level nodes.
	pub fn new_root(children: Vec<NodeRef>) -> Result<NodeRef, StructureError> {
		check_adoptable(&children, Slot::Child)?;
		Self::adopt(NodeKind::Root(Root { children }))
	}

	/// Create an element from its complete set of namespace declarations,
	/// attributes and children.
	pub fn new_element(
		name: QName,
		namespaces: Vec<NodeRef>,
		attributes: Vec<NodeRef>,
		children: Vec<NodeRef>,
	) -> Result<NodeRef, StructureError> {
		check_adoptable(&namespaces, Slot::Namespace)?;
		check_adoptable(&attributes, Slot::Attribute)?;
		check_adoptable(&children, Slot::Child)?;
		Self::adopt(NodeKind::Element(Element {
			name,
			namespaces,
			attributes,
			children,
		}))
	}

	pub fn new_attribute<V: Into<String>>(name: QName, value: V) -> NodeRef {
		Self::leaf(NodeKind::Attribute(Attribute {
			name,
			value: value.into(),
		}))
	}

	pub fn new_namespace_decl(prefix: Option<NCName>, uri: Option<NamespaceName>) -> NodeRef {
		Self::leaf(NodeKind::NamespaceDecl(NamespaceDecl { prefix, uri }))
	}

	pub fn new_text<T: Into<String>>(text: T) -> NodeRef {
		Self::leaf(NodeKind::Text(text.into()))
	}

	pub fn new_comment<T: Into<String>>(text: T) -> NodeRef {
		Self::leaf(NodeKind::Comment(text.into()))
	}

	pub fn new_processing_instruction<T: Into<NCName>, D: Into<String>>(
		target: T,
		data: D,
	) -> NodeRef {
		Self::leaf(NodeKind::ProcessingInstruction(ProcessingInstruction {
			target: target.into(),
			data: data.into(),
		}))
	}

	/// Return the owner of this node.
	///
	/// Returns `None` for root nodes, for nodes which have not been attached
	/// yet and for nodes whose owner has been dropped.
	pub fn parent(&self) -> Option<NodeRef> {
		self.parent.get().and_then(|p| p.upgrade())
	}

	/// Return true if the node has been attached to an owner.
	pub fn is_attached(&self) -> bool {
		self.parent.get().is_some()
	}

	pub fn kind(&self) -> &NodeKind {
		&self.kind
	}

	pub fn as_root(&self) -> Option<&Root> {
		match &self.kind {
			NodeKind::Root(v) => Some(v),
			_ => None,
		}
	}

	pub fn as_element(&self) -> Option<&Element> {
		match &self.kind {
			NodeKind::Element(v) => Some(v),
			_ => None,
		}
	}

	pub fn as_attribute(&self) -> Option<&Attribute> {
		match &self.kind {
			NodeKind::Attribute(v) => Some(v),
			_ => None,
		}
	}

	pub fn as_namespace_decl(&self) -> Option<&NamespaceDecl> {
		match &self.kind {
			NodeKind::NamespaceDecl(v) => Some(v),
			_ => None,
		}
	}

	pub fn as_text(&self) -> Option<&str> {
		match &self.kind {
			NodeKind::Text(v) => Some(v),
			_ => None,
		}
	}

	pub fn as_comment(&self) -> Option<&str> {
		match &self.kind {
			NodeKind::Comment(v) => Some(v),
			_ => None,
		}
	}

	pub fn as_processing_instruction(&self) -> Option<&ProcessingInstruction> {
		match &self.kind {
			NodeKind::ProcessingInstruction(v) => Some(v),
			_ => None,
		}
	}
}

impl PartialEq for Node {
	fn eq(&self, other: &Node) -> bool {
		self.kind == other.kind
	}
}

impl fmt::Debug for Node {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		fmt::Debug::fmt(&self.kind, f)
	}
}

/// Pointer-identity helpers for [`NodeRef`].
pub trait RcPtrExt {
	/// Test whether `parent` is the node this node is attached to.
	fn ptr_eq_parent(&self, parent: &NodeRef) -> bool;
}

impl RcPtrExt for NodeRef {
	fn ptr_eq_parent(&self, parent: &NodeRef) -> bool {
		match self.parent() {
			Some(p) => RcPtr::ptr_eq(&p, parent),
			None => false,
		}
	}
}
