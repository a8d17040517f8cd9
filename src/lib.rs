#![doc(html_root_url = "https://docs.rs/dom-watch/0.0.1")]
#![warn(clippy::pedantic)]

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod diff;
pub mod dom;
pub mod event_loop;
pub mod identity;
pub mod memory;
pub mod parse;
pub mod scheduler;
pub mod snapshot;
mod web;

pub use diff::{ChangeKind, ChangeRecord};
pub use dom::DomNode;
pub use scheduler::{Scheduler, Watch, DEFAULT_POLL_INTERVAL};
