//! [`DomNode`] for the browser DOM.

use crate::dom::DomNode;
use js_sys::{Object, WeakMap};
use wasm_bindgen::{JsCast, JsValue};

thread_local! {
	static SYNTHETIC_IDENTITIES: WeakMap = WeakMap::new();
}

impl DomNode for web_sys::Node {
	fn is_element(&self) -> bool {
		self.node_type() == web_sys::Node::ELEMENT_NODE
	}

	fn child_nodes(&self) -> Vec<Self> {
		let child_nodes = web_sys::Node::child_nodes(self);
		(0..child_nodes.length()).filter_map(|i| child_nodes.item(i)).collect()
	}

	fn has_child_nodes(&self) -> bool {
		web_sys::Node::has_child_nodes(self)
	}

	fn same_node(&self, other: &Self) -> bool {
		self == other
	}

	fn natural_id(&self) -> Option<String> {
		self.dyn_ref::<web_sys::Element>().map(web_sys::Element::id).filter(|id| !id.is_empty())
	}

	fn tag_name(&self) -> Option<String> {
		self.dyn_ref::<web_sys::Element>().map(web_sys::Element::tag_name)
	}

	fn synthetic_identity(&self, mint: impl FnOnce() -> String) -> String {
		let key: &Object = self.unchecked_ref();
		SYNTHETIC_IDENTITIES.with(|table| {
			if let Some(id) = table.get(key).as_string() {
				return id;
			}
			let id = mint();
			table.set(key, &JsValue::from_str(&id));
			id
		})
	}
}
