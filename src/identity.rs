//! Stable string identities for DOM nodes.
//!
//! Nodes with an ***id*** attribute are identified by it.
//! All other nodes receive a synthetic identity on first lookup, which is kept in a weak side-table owned by the [`DomNode`] backend
//! and so lives exactly as long as the node itself.

use crate::dom::DomNode;
use core::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// Prefix of minted identities.
pub const SYNTHETIC_PREFIX: &str = "__node_id";

static NEXT_SYNTHETIC: AtomicU64 = AtomicU64::new(0);

/// Returns `node`'s natural identity if it has one, otherwise its synthetic identity (minting it if necessary).
///
/// Synthetic identities are unique within the process.
/// Note that natural identities are read fresh on each call, so changing a node's ***id*** changes its identity.
#[must_use]
pub fn identity_of<N: DomNode>(node: &N) -> String {
	node.natural_id().unwrap_or_else(|| node.synthetic_identity(mint))
}

fn mint() -> String {
	let id = format!("{}{}", SYNTHETIC_PREFIX, NEXT_SYNTHETIC.fetch_add(1, Ordering::Relaxed));
	trace!(id = id.as_str(), "Minted synthetic node identity.");
	id
}
