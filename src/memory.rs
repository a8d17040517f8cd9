//! A small reference-counted in-process DOM.
//!
//! This backs headless hosts and the native test suite. It only models what change detection observes:
//! node kind, ***id*** and child lists. Parents are held weakly, so dropping the last handle to a detached subtree frees it.

use crate::dom::DomNode;
use core::{cell::RefCell, fmt};
use hashbrown::HashMap;
use std::rc::{Rc, Weak};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
	Element { tag: String },
	Text(String),
	Comment(String),
}

struct NodeData {
	kind: NodeKind,
	id: RefCell<Option<String>>,
	parent: RefCell<Weak<NodeData>>,
	children: RefCell<Vec<MemoryNode>>,
}

/// A shared handle to a node. Equality is reference identity.
#[derive(Clone)]
pub struct MemoryNode(Rc<NodeData>);

impl MemoryNode {
	fn new(kind: NodeKind) -> Self {
		Self(Rc::new(NodeData {
			kind,
			id: RefCell::new(None),
			parent: RefCell::new(Weak::new()),
			children: RefCell::new(Vec::new()),
		}))
	}

	#[must_use]
	pub fn element(tag: &str) -> Self {
		Self::new(NodeKind::Element { tag: tag.to_ascii_uppercase() })
	}

	#[must_use]
	pub fn text(data: &str) -> Self {
		Self::new(NodeKind::Text(data.to_owned()))
	}

	#[must_use]
	pub fn comment(data: &str) -> Self {
		Self::new(NodeKind::Comment(data.to_owned()))
	}

	/// Sets the ***id*** and returns `self`, for building trees inline.
	#[must_use]
	pub fn with_id(self, id: &str) -> Self {
		self.set_id(Some(id));
		self
	}

	/// Appends `children` in order and returns `self`.
	///
	/// # Panics
	///
	/// Like [`append_child`](`MemoryNode::append_child`).
	#[must_use]
	pub fn with_children(self, children: impl IntoIterator<Item = MemoryNode>) -> Self {
		for child in children {
			self.append_child(&child);
		}
		self
	}

	pub fn set_id(&self, id: Option<&str>) {
		*self.0.id.borrow_mut() = id.map(ToOwned::to_owned);
	}

	#[must_use]
	pub fn kind(&self) -> &NodeKind {
		&self.0.kind
	}

	#[must_use]
	pub fn parent(&self) -> Option<MemoryNode> {
		self.0.parent.borrow().upgrade().map(Self)
	}

	#[must_use]
	pub fn children(&self) -> Vec<MemoryNode> {
		self.0.children.borrow().clone()
	}

	/// Moves `child` to the end of this element's children.
	///
	/// # Panics
	///
	/// Iff `self` isn't an element or `child` is `self` or one of its ancestors.
	pub fn append_child(&self, child: &MemoryNode) {
		self.insert_before(child, None);
	}

	/// Moves `child` in front of `reference`, or to the end if `reference` is [`None`].
	///
	/// As in the DOM, `child` is first removed from its current parent, if any.
	///
	/// # Panics
	///
	/// Iff `self` isn't an element, `child` is `self` or one of its ancestors, or `reference` isn't a child of `self`.
	pub fn insert_before(&self, child: &MemoryNode, reference: Option<&MemoryNode>) {
		assert!(self.is_element(), "Only elements can have children.");
		assert!(!child.is_inclusive_ancestor_of(self), "Can't insert a node into its own subtree.");

		let reference = match reference {
			Some(reference) if reference == child => reference.next_sibling(),
			reference => reference.cloned(),
		};

		child.detach();
		let mut children = self.0.children.borrow_mut();
		let index = match reference {
			None => children.len(),
			Some(reference) => children
				.iter()
				.position(|c| *c == reference)
				.unwrap_or_else(|| panic!("{:?} is not a child of {:?}.", reference, self)),
		};
		children.insert(index, child.clone());
		*child.0.parent.borrow_mut() = Rc::downgrade(&self.0);
	}

	/// Returns whether `child` was a child of `self` (and was removed).
	pub fn remove_child(&self, child: &MemoryNode) -> bool {
		if child.parent().as_ref() != Some(self) {
			return false;
		}
		child.detach();
		true
	}

	/// Detaches this node from its parent, if any.
	pub fn remove(&self) {
		self.detach();
	}

	/// # Panics
	///
	/// Like [`append_child`](`MemoryNode::append_child`).
	pub fn replace_children(&self, children: impl IntoIterator<Item = MemoryNode>) {
		for old in self.children() {
			old.detach();
		}
		for child in children {
			self.append_child(&child);
		}
	}

	#[must_use]
	pub fn next_sibling(&self) -> Option<MemoryNode> {
		let parent = self.parent()?;
		let children = parent.0.children.borrow();
		let index = children.iter().position(|c| c == self)?;
		children.get(index + 1).cloned()
	}

	fn is_inclusive_ancestor_of(&self, other: &MemoryNode) -> bool {
		let mut current = Some(other.clone());
		while let Some(node) = current {
			if node == *self {
				return true;
			}
			current = node.parent();
		}
		false
	}

	fn detach(&self) {
		let parent = self.0.parent.replace(Weak::new());
		if let Some(parent) = parent.upgrade() {
			parent.children.borrow_mut().retain(|c| !Rc::ptr_eq(&c.0, &self.0));
		}
	}
}

impl PartialEq for MemoryNode {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}
impl Eq for MemoryNode {}

impl fmt::Debug for MemoryNode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.0.kind {
			NodeKind::Element { tag } => match &*self.0.id.borrow() {
				Some(id) => write!(f, "<{} id={:?}>", tag, id),
				None => write!(f, "<{}>", tag),
			},
			NodeKind::Text(text) => write!(f, "#text {:?}", text),
			NodeKind::Comment(comment) => write!(f, "<!--{}-->", comment),
		}
	}
}

impl DomNode for MemoryNode {
	fn is_element(&self) -> bool {
		matches!(self.0.kind, NodeKind::Element { .. })
	}

	fn child_nodes(&self) -> Vec<Self> {
		self.children()
	}

	fn has_child_nodes(&self) -> bool {
		!self.0.children.borrow().is_empty()
	}

	fn same_node(&self, other: &Self) -> bool {
		self == other
	}

	fn natural_id(&self) -> Option<String> {
		self.0.id.borrow().clone().filter(|id| !id.is_empty())
	}

	fn tag_name(&self) -> Option<String> {
		match &self.0.kind {
			NodeKind::Element { tag } => Some(tag.clone()),
			NodeKind::Text(_) | NodeKind::Comment(_) => None,
		}
	}

	fn synthetic_identity(&self, mint: impl FnOnce() -> String) -> String {
		SYNTHETIC_IDENTITIES.with(|table| table.borrow_mut().get_or_insert_with(&self.0, mint))
	}
}

thread_local! {
	static SYNTHETIC_IDENTITIES: RefCell<SideTable> = RefCell::new(SideTable::default());
}

/// Keyed by allocation address.
/// The stored [`Weak`] keeps that address from being reused while the entry exists, so a hit whose node is still alive is always the same node.
#[derive(Default)]
struct SideTable {
	entries: HashMap<usize, (Weak<NodeData>, String)>,
	prune_at: usize,
}
impl SideTable {
	const MIN_PRUNE_AT: usize = 64;

	fn get_or_insert_with(&mut self, node: &Rc<NodeData>, mint: impl FnOnce() -> String) -> String {
		let key = Rc::as_ptr(node) as usize;
		if let Some((weak, id)) = self.entries.get(&key) {
			if weak.strong_count() > 0 {
				return id.clone();
			}
		}

		if self.entries.len() >= self.prune_at {
			self.entries.retain(|_, (weak, _)| weak.strong_count() > 0);
			self.prune_at = (self.entries.len() * 2).max(Self::MIN_PRUNE_AT);
		}

		let id = mint();
		self.entries.insert(key, (Rc::downgrade(node), id.clone()));
		id
	}

	fn live_count(&self) -> usize {
		self.entries.values().filter(|(weak, _)| weak.strong_count() > 0).count()
	}
}

/// The number of synthetic identities on this thread whose nodes are still alive.
#[must_use]
pub fn live_synthetic_identities() -> usize {
	SYNTHETIC_IDENTITIES.with(|table| table.borrow().live_count())
}
