//! Reconciles a live subtree against an [`ElementStructure`] snapshot of it.
//!
//! This is a single greedy pass per child list, not an optimal edit script:
//! Nodes are paired by reference identity with two cursors (live and snapshot) that advance together while they agree.
//! On disagreement, each side searches the remainder of the other for its node.
//! A hit is a move and is recorded as a conflict whose descent is deferred, a miss is an addition or removal.
//!
//! A node paired as a move is claimed for the rest of its child list, so it is neither searched for nor reported again.
//! Only moves claim nodes: a removed node and its replacement are always reported separately, even if they share an ***id***.
//!
//! Under competing reorders (rotations, for example) an earlier claim can make the search miss and report a moved node
//! as removed and added instead. Consumers only rely on net additions and removals, which stay correct.

use crate::{
	dom::{loggable, DomNode},
	identity::identity_of,
	snapshot::ElementStructure,
};
use hashbrown::HashSet;
use tracing::{instrument, trace, trace_span};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
	Added,
	Removed,
}

/// A node that was added to or removed from a watched subtree.
///
/// Only the topmost node of an added or removed subtree is reported; its descendants are implied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord<N> {
	pub node: N,
	pub kind: ChangeKind,
}

impl<N> ChangeRecord<N> {
	#[must_use]
	pub fn added(node: N) -> Self {
		Self { node, kind: ChangeKind::Added }
	}

	#[must_use]
	pub fn removed(node: N) -> Self {
		Self { node, kind: ChangeKind::Removed }
	}
}

/// A node found at different positions in the live and snapshot child lists.
#[derive(Debug, Clone, Copy)]
struct Conflict {
	live_index: usize,
	snapshot_index: usize,
}

/// Appends the differences between `live_root`'s current subtree and `snapshot_root` to `records`.
///
/// Returns whether the subtree diverged from the snapshot at all.
/// This can be `true` with no records appended, if nodes were only reordered.
#[instrument(skip_all)]
pub fn diff<N: DomNode>(records: &mut Vec<ChangeRecord<N>>, live_root: &N, snapshot_root: &ElementStructure<N>) -> bool {
	let mut dirty = false;
	diff_child_lists(records, live_root, snapshot_root, &mut dirty);
	dirty
}

fn diff_child_lists<N: DomNode>(records: &mut Vec<ChangeRecord<N>>, live: &N, snapshot: &ElementStructure<N>, dirty: &mut bool) {
	let live_children = live.child_nodes();
	let snapshot_children = snapshot.children();

	let span = trace_span!("Diffing child list", node = ?loggable(live), live = live_children.len(), snapshot = snapshot_children.len());
	let _enter = span.enter();

	let mut seen = HashSet::<String>::new();
	let mut conflicts = Vec::new();
	let (mut i, mut j) = (0, 0);
	while i < live_children.len() || j < snapshot_children.len() {
		let current = live_children.get(i);
		let previous = snapshot_children.get(j);

		if let (Some(current), Some(previous)) = (current, previous) {
			if current.same_node(previous.node()) {
				resolve_conflicts(records, &mut conflicts, &live_children, snapshot_children, dirty);
				descend(records, current, previous, dirty);
				i += 1;
				j += 1;
				continue;
			}
		}

		*dirty = true;

		if let Some(current) = current {
			let identity = identity_of(current);
			if !seen.contains(&identity) {
				match snapshot_children[j..].iter().position(|s| s.node().same_node(current)) {
					Some(offset) => {
						trace!(node = ?loggable(current), from = j + offset, to = i, "Moved.");
						seen.insert(identity);
						conflicts.push(Conflict { live_index: i, snapshot_index: j + offset });
					}
					None => {
						trace!(node = ?loggable(current), at = i, "Added.");
						records.push(ChangeRecord::added(current.clone()));
					}
				}
			}
			i += 1;
		}

		if let Some(previous) = previous {
			let previous = previous.node();
			if !live_children.get(i).map_or(false, |c| c.same_node(previous)) {
				let identity = identity_of(previous);
				if !seen.contains(&identity) {
					match live_children[i..].iter().position(|c| c.same_node(previous)) {
						Some(offset) => {
							trace!(node = ?loggable(previous), from = j, to = i + offset, "Moved.");
							seen.insert(identity);
							conflicts.push(Conflict { live_index: i + offset, snapshot_index: j });
						}
						None => {
							trace!(node = ?loggable(previous), at = j, "Removed.");
							records.push(ChangeRecord::removed(previous.clone()));
						}
					}
				}
				j += 1;
			}
		}

		resolve_conflicts(records, &mut conflicts, &live_children, snapshot_children, dirty);
	}
}

/// Performs the deferred descent into moved nodes, in the order they were found.
fn resolve_conflicts<N: DomNode>(records: &mut Vec<ChangeRecord<N>>, conflicts: &mut Vec<Conflict>, live_children: &[N], snapshot_children: &[ElementStructure<N>], dirty: &mut bool) {
	for Conflict { live_index, snapshot_index } in conflicts.drain(..) {
		descend(records, &live_children[live_index], &snapshot_children[snapshot_index], dirty);
	}
}

fn descend<N: DomNode>(records: &mut Vec<ChangeRecord<N>>, live: &N, snapshot: &ElementStructure<N>, dirty: &mut bool) {
	if live.has_child_nodes() || snapshot.has_children() {
		diff_child_lists(records, live, snapshot, dirty);
	}
}
