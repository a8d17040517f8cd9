use core::fmt::Debug;

/// A handle to one node in a live document tree.
///
/// Handles are cheap to clone and compare by reference identity through [`DomNode::same_node`],
/// never by content.
pub trait DomNode: Clone + Debug + 'static {
	/// Whether this node is an element. Only elements are descended into when snapshotting.
	fn is_element(&self) -> bool;

	/// The node's current children, in document order.
	fn child_nodes(&self) -> Vec<Self>;

	fn has_child_nodes(&self) -> bool {
		!self.child_nodes().is_empty()
	}

	/// Reference identity.
	fn same_node(&self, other: &Self) -> bool;

	/// The node's own identity attribute (***id***), if it has a non-empty one.
	fn natural_id(&self) -> Option<String>;

	/// The tag name, for elements only.
	fn tag_name(&self) -> Option<String>;

	/// Looks up this node's synthetic identity in the backend's weak side-table, calling `mint` and storing its result if there is none yet.
	///
	/// The side-table must not keep the node alive.
	fn synthetic_identity(&self, mint: impl FnOnce() -> String) -> String;
}

/// `node` itself with the `dangerous-logging` feature, otherwise a placeholder.
pub(crate) fn loggable<N: Debug>(node: &N) -> &dyn Debug {
	if cfg!(feature = "dangerous-logging") {
		node
	} else {
		&"<redacted>"
	}
}
