//! The two scheduling primitives the poll scheduler needs: a cancellable timer and a microtask queue.
//!
//! Microtasks run after the current task (for example a timer callback) completes, before any later timer fires.

use core::{convert::TryFrom, time::Duration};
use std::{cell::RefCell, collections::VecDeque, rc::Rc};
use tracing::trace;
use wasm_bindgen::{closure::Closure, JsCast, UnwrapThrowExt};

pub type Task = Box<dyn FnOnce()>;

pub trait EventLoop: 'static {
	type Timeout: 'static;

	/// Schedules `task` to run once, `delay` from now.
	fn set_timeout(&self, delay: Duration, task: Task) -> Self::Timeout;

	/// Cancels a timer. Must be a no-op if the timer already fired.
	fn clear_timeout(&self, timeout: Self::Timeout);

	fn queue_microtask(&self, task: Task);
}

/// A deterministic event loop on a virtual clock. Nothing runs until it is driven through [`advance`](`ManualLoop::advance`) or [`run_microtasks`](`ManualLoop::run_microtasks`).
///
/// Clones share their state.
#[derive(Clone, Default)]
pub struct ManualLoop(Rc<RefCell<ManualLoopState>>);

#[derive(Default)]
struct ManualLoopState {
	now: Duration,
	next_timeout: u64,
	timers: Vec<(Duration, ManualTimeout, Task)>,
	microtasks: VecDeque<Task>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ManualTimeout(u64);

impl ManualLoop {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Virtual time elapsed since creation.
	#[must_use]
	pub fn now(&self) -> Duration {
		self.0.borrow().now
	}

	#[must_use]
	pub fn pending_timers(&self) -> usize {
		self.0.borrow().timers.len()
	}

	#[must_use]
	pub fn pending_microtasks(&self) -> usize {
		self.0.borrow().microtasks.len()
	}

	/// Runs queued microtasks, including ones queued while doing so, until the queue is empty.
	pub fn run_microtasks(&self) {
		loop {
			let task = self.0.borrow_mut().microtasks.pop_front();
			match task {
				Some(task) => task(),
				None => break,
			}
		}
	}

	/// Moves the clock forward by `by`, firing each timer that falls due in deadline order (ties in scheduling order).
	///
	/// Microtasks are drained before the first and after each timer.
	pub fn advance(&self, by: Duration) {
		let until = self.now() + by;
		self.run_microtasks();
		while let Some(task) = self.pop_due(until) {
			task();
			self.run_microtasks();
		}
		self.0.borrow_mut().now = until;
	}

	fn pop_due(&self, until: Duration) -> Option<Task> {
		let mut state = self.0.borrow_mut();
		let index = state
			.timers
			.iter()
			.enumerate()
			.filter(|(_, (deadline, _, _))| *deadline <= until)
			.min_by_key(|(_, (deadline, ManualTimeout(sequence), _))| (*deadline, *sequence))
			.map(|(index, _)| index)?;
		let (deadline, timeout, task) = state.timers.remove(index);
		state.now = deadline;
		trace!(?timeout, ?deadline, "Firing timer.");
		Some(task)
	}
}

impl EventLoop for ManualLoop {
	type Timeout = ManualTimeout;

	fn set_timeout(&self, delay: Duration, task: Task) -> ManualTimeout {
		let mut state = self.0.borrow_mut();
		let timeout = ManualTimeout(state.next_timeout);
		state.next_timeout += 1;
		let deadline = state.now + delay;
		state.timers.push((deadline, timeout, task));
		timeout
	}

	fn clear_timeout(&self, timeout: ManualTimeout) {
		self.0.borrow_mut().timers.retain(|(_, t, _)| *t != timeout);
	}

	fn queue_microtask(&self, task: Task) {
		self.0.borrow_mut().microtasks.push_back(task);
	}
}

/// The browser's own event loop, through `window`.
///
/// Host failures are thrown into JavaScript.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserLoop;

impl BrowserLoop {
	fn window() -> web_sys::Window {
		web_sys::window().expect_throw("dom-watch: No `window` found.")
	}
}

impl EventLoop for BrowserLoop {
	type Timeout = i32;

	fn set_timeout(&self, delay: Duration, task: Task) -> i32 {
		let callback = Closure::once_into_js(move || task());
		let delay = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
		Self::window()
			.set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), delay)
			.expect_throw("dom-watch: `setTimeout` failed.")
	}

	fn clear_timeout(&self, timeout: i32) {
		Self::window().clear_timeout_with_handle(timeout);
	}

	fn queue_microtask(&self, task: Task) {
		let callback = Closure::once_into_js(move || task());
		Self::window().queue_microtask(callback.unchecked_ref());
	}
}
