//! Instantiates objects for elements ("parsing" a subtree) and keeps them in sync with a watched subtree.

use crate::{
	diff::{ChangeKind, ChangeRecord},
	dom::{loggable, DomNode},
	event_loop::EventLoop,
	identity::identity_of,
	scheduler::{Scheduler, Watch},
};
use hashbrown::HashMap;
use std::{cell::RefCell, rc::Rc};
use tracing::{debug, instrument, trace};

/// Decides which elements get an object and creates it.
pub trait Registry<N: DomNode> {
	type Object;

	/// Returns [`None`] for elements that aren't matched.
	fn instantiate(&self, element: &N) -> Option<Self::Object>;

	/// Called once an object's element left the tree.
	fn dispose(&self, element: &N, object: Self::Object) {
		let _ = (element, object);
	}
}

/// The live objects created through a [`Registry`], at most one per element.
pub struct Instances<N: DomNode, R: Registry<N>> {
	registry: R,
	// Natural identities aren't guaranteed to be unique, so each bucket is disambiguated by reference.
	objects: HashMap<String, Vec<(N, R::Object)>>,
	len: usize,
}

impl<N: DomNode, R: Registry<N>> Instances<N, R> {
	#[must_use]
	pub fn new(registry: R) -> Self {
		Self {
			registry,
			objects: HashMap::new(),
			len: 0,
		}
	}

	pub fn registry(&self) -> &R {
		&self.registry
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.len
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	/// The number of distinct identities with at least one live object.
	#[must_use]
	pub fn identity_count(&self) -> usize {
		self.objects.len()
	}

	#[must_use]
	pub fn get(&self, element: &N) -> Option<&R::Object> {
		self.objects.get(&identity_of(element))?.iter().find(|(n, _)| n.same_node(element)).map(|(_, object)| object)
	}

	/// Instantiates objects for `root` and each element below it that doesn't have one yet.
	///
	/// Returns the number of objects created.
	#[instrument(skip_all, fields(root = ?loggable(root)))]
	pub fn parse(&mut self, root: &N) -> usize {
		let mut created = 0;
		for_each_element(root, &mut |element| {
			let identity = identity_of(element);
			if self.objects.get(&identity).map_or(false, |bucket| bucket.iter().any(|(n, _)| n.same_node(element))) {
				return;
			}
			if let Some(object) = self.registry.instantiate(element) {
				trace!(element = ?loggable(element), "Instantiated.");
				self.objects.entry(identity).or_default().push((element.clone(), object));
				created += 1;
			}
		});
		self.len += created;
		debug!(created, "Parsed.");
		created
	}

	/// Disposes the objects of `root` and each element below it.
	///
	/// Returns the number of objects disposed.
	#[instrument(skip_all, fields(root = ?loggable(root)))]
	pub fn release(&mut self, root: &N) -> usize {
		let mut released = Vec::new();
		for_each_element(root, &mut |element| {
			let identity = identity_of(element);
			if let Some(bucket) = self.objects.get_mut(&identity) {
				if let Some(index) = bucket.iter().position(|(n, _)| n.same_node(element)) {
					released.push(bucket.swap_remove(index));
					if bucket.is_empty() {
						self.objects.remove(&identity);
					}
				}
			}
		});

		let count = released.len();
		self.len -= count;
		for (element, object) in released {
			trace!(element = ?loggable(&element), "Disposing.");
			self.registry.dispose(&element, object);
		}
		debug!(released = count, "Released.");
		count
	}

	/// Applies a batch from [`Scheduler::watch`].
	///
	/// Removals are handled first, so an element that moved between parents ends up with a fresh object instead of none.
	pub fn apply(&mut self, records: &[ChangeRecord<N>]) {
		for record in records.iter().filter(|r| r.kind == ChangeKind::Removed) {
			self.release(&record.node);
		}
		for record in records.iter().filter(|r| r.kind == ChangeKind::Added) {
			self.parse(&record.node);
		}
	}
}

fn for_each_element<N: DomNode>(node: &N, f: &mut impl FnMut(&N)) {
	if node.is_element() {
		f(node);
		for child in node.child_nodes() {
			for_each_element(&child, f);
		}
	}
}

/// Parses `root` now, then keeps `instances` in sync with it until the returned [`Watch`] is disposed.
pub fn parse_and_watch<N, R, L>(scheduler: &Scheduler<N, L>, root: N, instances: &Rc<RefCell<Instances<N, R>>>) -> Watch<N, L>
where
	N: DomNode,
	R: 'static + Registry<N>,
	R::Object: 'static,
	L: EventLoop,
{
	instances.borrow_mut().parse(&root);
	let instances = Rc::clone(instances);
	scheduler.watch(root, move |records| instances.borrow_mut().apply(&records))
}
