//! One shared polling timer for any number of watched subtrees.
//!
//! The timer only runs while at least one [`Watch`] is active.
//! On each tick every watched target is diffed against its last snapshot, and non-empty change batches are handed to the
//! watch's callback through a microtask, one per watch. Callbacks therefore never run inside the tick itself and may freely
//! register or dispose watches.

use crate::{
	diff::{diff, ChangeRecord},
	dom::{loggable, DomNode},
	event_loop::EventLoop,
	snapshot::{snapshot, ElementStructure},
};
use core::{fmt, time::Duration};
use std::{
	cell::RefCell,
	rc::{Rc, Weak},
};
use tracing::{debug, debug_span, info, instrument, trace};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(30);

type Callback<N> = Rc<dyn Fn(Vec<ChangeRecord<N>>)>;

struct WatchEntry<N> {
	key: u64,
	target: N,
	snapshot: ElementStructure<N>,
	callback: Callback<N>,
}

struct State<N, L: EventLoop> {
	event_loop: L,
	interval: Duration,
	entries: Vec<WatchEntry<N>>,
	timer: Option<L::Timeout>,
	next_key: u64,
	this: Weak<RefCell<State<N, L>>>,
}

/// A shared handle to a poll scheduler. Clones refer to the same scheduler.
///
/// Dropping the last handle stops polling. Outstanding [`Watch`]es then become inert.
pub struct Scheduler<N, L: EventLoop>(Rc<RefCell<State<N, L>>>);

impl<N, L: EventLoop> Clone for Scheduler<N, L> {
	fn clone(&self) -> Self {
		Self(Rc::clone(&self.0))
	}
}

impl<N, L: EventLoop> fmt::Debug for Scheduler<N, L> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = self.0.borrow();
		f.debug_struct("Scheduler")
			.field("interval", &state.interval)
			.field("watches", &state.entries.len())
			.field("polling", &state.timer.is_some())
			.finish()
	}
}

impl<N: DomNode, L: EventLoop> Scheduler<N, L> {
	#[must_use]
	pub fn new(event_loop: L) -> Self {
		Self::with_poll_interval(event_loop, DEFAULT_POLL_INTERVAL)
	}

	#[must_use]
	pub fn with_poll_interval(event_loop: L, interval: Duration) -> Self {
		Self(Rc::new_cyclic(|this| {
			RefCell::new(State {
				event_loop,
				interval,
				entries: Vec::new(),
				timer: None,
				next_key: 0,
				this: this.clone(),
			})
		}))
	}

	/// Starts watching `target`'s subtree as it is right now.
	///
	/// `callback` receives each tick's non-empty batch of changes, asynchronously.
	#[instrument(skip_all, fields(target = ?loggable(&target)))]
	pub fn watch(&self, target: N, callback: impl 'static + Fn(Vec<ChangeRecord<N>>)) -> Watch<N, L> {
		let mut state = self.0.borrow_mut();
		let key = state.next_key;
		state.next_key += 1;

		let snapshot = snapshot(&target);
		trace!(key, nodes = snapshot.node_count(), "Registered watch.");
		state.entries.push(WatchEntry {
			key,
			target,
			snapshot,
			callback: Rc::new(callback),
		});

		if state.timer.is_none() {
			info!("Starting to poll.");
			state.start_timer();
		}

		Watch { state: Rc::downgrade(&self.0), key }
	}

	/// Takes effect from the next scheduled tick on.
	pub fn set_poll_interval(&self, interval: Duration) {
		self.0.borrow_mut().interval = interval;
	}

	#[must_use]
	pub fn poll_interval(&self) -> Duration {
		self.0.borrow().interval
	}

	#[must_use]
	pub fn watch_count(&self) -> usize {
		self.0.borrow().entries.len()
	}

	/// Whether a tick is currently scheduled.
	#[must_use]
	pub fn is_polling(&self) -> bool {
		self.0.borrow().timer.is_some()
	}
}

impl<N: DomNode, L: EventLoop> State<N, L> {
	fn start_timer(&mut self) {
		let this = self.this.clone();
		let timer = self.event_loop.set_timeout(
			self.interval,
			Box::new(move || {
				if let Some(state) = this.upgrade() {
					Self::tick(&state);
				}
			}),
		);
		self.timer = Some(timer);
	}

	fn tick(state: &Rc<RefCell<Self>>) {
		let mut state = state.borrow_mut();
		let state = &mut *state;
		state.timer = None;

		let span = debug_span!("Polling", watches = state.entries.len());
		let _enter = span.enter();

		let mut dirty_count = 0_usize;
		let mut record_count = 0_usize;
		for entry in &mut state.entries {
			let mut records = Vec::new();
			let dirty = diff(&mut records, &entry.target, &entry.snapshot);

			if !records.is_empty() {
				record_count += records.len();
				let callback = Rc::clone(&entry.callback);
				state.event_loop.queue_microtask(Box::new(move || callback(records)));
			}

			// Reorders alone leave `records` empty but still invalidate the snapshot.
			if dirty {
				dirty_count += 1;
				entry.snapshot = snapshot(&entry.target);
			}
		}
		debug!(dirty = dirty_count, records = record_count, "Tick complete.");

		if !state.entries.is_empty() {
			state.start_timer();
		}
	}
}

impl<N, L: EventLoop> State<N, L> {
	fn remove(&mut self, key: u64) -> bool {
		let index = match self.entries.iter().position(|entry| entry.key == key) {
			Some(index) => index,
			None => return false,
		};
		self.entries.remove(index);
		trace!(key, "Disposed watch.");

		if self.entries.is_empty() {
			if let Some(timer) = self.timer.take() {
				info!("Last watch disposed. Stopping to poll.");
				self.event_loop.clear_timeout(timer);
			}
		}
		true
	}
}

impl<N, L: EventLoop> Drop for State<N, L> {
	fn drop(&mut self) {
		if let Some(timer) = self.timer.take() {
			self.event_loop.clear_timeout(timer);
		}
	}
}

/// Registration handle returned by [`Scheduler::watch`].
///
/// Dropping it does *not* end the watch. Call [`dispose`](`Watch::dispose`) for that.
#[must_use = "A `Watch` can only be ended through its handle."]
pub struct Watch<N, L: EventLoop> {
	state: Weak<RefCell<State<N, L>>>,
	key: u64,
}

impl<N, L: EventLoop> fmt::Debug for Watch<N, L> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Watch").field("key", &self.key).field("active", &self.is_active()).finish()
	}
}

impl<N, L: EventLoop> Watch<N, L> {
	/// Ends the watch. No later tick will check it or call its callback.
	///
	/// Batches that were already queued are still delivered.
	/// Repeated calls, and calls after the scheduler is gone, do nothing.
	pub fn dispose(&self) {
		if let Some(state) = self.state.upgrade() {
			state.borrow_mut().remove(self.key);
		}
	}

	#[must_use]
	pub fn is_active(&self) -> bool {
		self.state.upgrade().map_or(false, |state| state.borrow().entries.iter().any(|entry| entry.key == self.key))
	}
}
