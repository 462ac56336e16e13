//! [`ElementHandle`] for [`web_sys::Element`].
//!
//! Identities are kept in a [`js_sys::WeakMap`] keyed by the element object,
//! so elements aren't tagged with extra properties and the map doesn't keep them alive on its own.

use crate::handle::{ElementHandle, ElementId, IdentityMap};
use core::fmt;
use js_sys::{Object, WeakMap};
use tracing::error;
use wasm_bindgen::JsValue;

impl ElementHandle for web_sys::Element {
	type Identities = WeakMapIdentities;

	fn class_name(&self) -> String {
		web_sys::Element::class_name(self)
	}

	fn set_class_name(&self, class_name: &str) {
		web_sys::Element::set_class_name(self, class_name);
	}

	/// Sets [***innerHTML***](https://developer.mozilla.org/en-US/docs/Web/API/Element/innerHTML).
	fn set_content(&self, content: &str) {
		self.set_inner_html(content);
	}
}

pub struct WeakMapIdentities(WeakMap);
impl Default for WeakMapIdentities {
	fn default() -> Self {
		Self(WeakMap::new())
	}
}
impl fmt::Debug for WeakMapIdentities {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("WeakMapIdentities").finish()
	}
}
impl IdentityMap<web_sys::Element> for WeakMapIdentities {
	fn get(&self, handle: &web_sys::Element) -> Option<ElementId> {
		decode(&self.0.get(key(handle)))
	}

	fn insert(&mut self, handle: &web_sys::Element, id: ElementId) {
		self.0.set(key(handle), &JsValue::from(id.get()));
	}

	fn remove(&mut self, handle: &web_sys::Element) -> Option<ElementId> {
		let id = self.get(handle)?;
		self.0.delete(key(handle));
		Some(id)
	}
}

fn key(handle: &web_sys::Element) -> &Object {
	handle.as_ref()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::float_cmp)]
fn decode(value: &JsValue) -> Option<ElementId> {
	if value.is_undefined() {
		return None;
	}
	match value.as_f64() {
		Some(raw) if (1.0..=f64::from(u32::MAX)).contains(&raw) && raw.fract() == 0.0 => ElementId::from_raw(raw as u32),
		_ => {
			error!("dom-batch bug: Unexpected value {:?} in identity map. Treating the element as unregistered.", value);
			None
		}
	}
}
