use crate::dom::DomNode;

/// An immutable structural copy of a subtree: node handles only, no content.
///
/// `children` is [`None`] for non-element nodes and keeps the child order as it was when the snapshot was taken.
#[derive(Debug, Clone)]
pub struct ElementStructure<N> {
	node: N,
	children: Option<Vec<ElementStructure<N>>>,
}

impl<N> ElementStructure<N> {
	#[must_use]
	pub fn node(&self) -> &N {
		&self.node
	}

	#[must_use]
	pub fn children(&self) -> &[ElementStructure<N>] {
		self.children.as_deref().unwrap_or_default()
	}

	#[must_use]
	pub fn is_leaf(&self) -> bool {
		self.children.is_none()
	}

	/// Whether this structure has any children recorded.
	#[must_use]
	pub fn has_children(&self) -> bool {
		!self.children().is_empty()
	}

	/// Node count, including `self`.
	#[must_use]
	pub fn node_count(&self) -> usize {
		1 + self.children().iter().map(ElementStructure::node_count).sum::<usize>()
	}
}

/// Captures `root` and its descendants depth-first. Only elements are descended into.
#[must_use]
pub fn snapshot<N: DomNode>(root: &N) -> ElementStructure<N> {
	ElementStructure {
		node: root.clone(),
		children: if root.is_element() { Some(root.child_nodes().iter().map(snapshot).collect()) } else { None },
	}
}
