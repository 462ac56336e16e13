//! Environment and geometry queries that don't go through a [`MutationBuffer`](`crate::MutationBuffer`).
//!
//! Geometry reads force layout in most browsers, so prefer calling these before queuing changes for the current update cycle.

use crate::{Error, Result};
use tracing::{instrument, trace};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement, Window};

pub const VIEWPORT_CONTENT: &str = "width=device-width, initial-scale=1, maximum-scale=1";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
	pub x: i32,
	pub y: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
	pub x: i32,
	pub y: i32,
	pub width: i32,
	pub height: i32,
}

/// Content box size in CSS pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Dimensions {
	pub width: f64,
	pub height: f64,
}

/// Appends a viewport `<meta>` tag to `<head>` that disables zooming.
///
/// Only use this where the tag can't easily be placed in the HTML file itself.
///
/// # Errors
///
/// If the document has no `<head>` or the DOM calls throw.
#[instrument(skip(document))]
pub fn fixed_viewport(document: &Document) -> Result<()> {
	let head = document.head().ok_or(Error::NoHead)?;
	let meta = document.create_element("meta")?;
	meta.set_attribute("name", "viewport")?;
	meta.set_attribute("content", VIEWPORT_CONTENT)?;
	head.append_child(&meta)?;
	Ok(())
}

#[must_use]
pub fn supports_touch(window: &Window) -> bool {
	js_sys::Reflect::has(window, &JsValue::from_str("ontouchstart")).unwrap_or(false)
}

fn offset_parent(element: &HtmlElement) -> Option<HtmlElement> {
	element.offset_parent()?.dyn_into::<HtmlElement>().ok()
}

/// Sums up offsets along the whole ***offsetParent*** chain.
#[must_use]
pub fn position(element: &HtmlElement) -> Position {
	let mut position = Position::default();
	let mut current = Some(element.clone());
	while let Some(element) = current {
		position.x += element.offset_left();
		position.y += element.offset_top();
		current = offset_parent(&element);
	}
	position
}

/// [`position`] plus the element's offset size.
#[must_use]
pub fn rect(element: &HtmlElement) -> Rect {
	let Position { x, y } = position(element);
	Rect {
		x,
		y,
		width: element.offset_width(),
		height: element.offset_height(),
	}
}

/// Sums up offsets along the ***offsetParent*** chain, stopping at the first element with an inline `position: absolute`.
///
/// That element's own offset isn't included.
#[must_use]
pub fn absolute_position(element: &HtmlElement) -> Position {
	let mut position = Position::default();
	let mut current = Some(element.clone());
	while let Some(element) = current {
		if element.style().get_property_value("position").map_or(false, |p| p == "absolute") {
			trace!("Stopped at absolutely positioned ancestor.");
			break;
		}
		position.x += element.offset_left();
		position.y += element.offset_top();
		current = offset_parent(&element);
	}
	position
}

/// Reads the computed `width` and `height`, which excludes padding, border and margin under `box-sizing: content-box`.
///
/// Values that aren't in pixels (like `auto` on some elements) come out as [`f64::NAN`].
///
/// # Errors
///
/// If ***getComputedStyle*** throws or returns `null`.
pub fn dimensions(window: &Window, element: &Element) -> Result<Dimensions> {
	let style = window.get_computed_style(element)?.ok_or_else(|| Error::Js("getComputedStyle returned null".to_owned()))?;
	Ok(Dimensions {
		width: parse_px(&style.get_property_value("width")?),
		height: parse_px(&style.get_property_value("height")?),
	})
}

fn parse_px(value: &str) -> f64 {
	value.trim().trim_end_matches("px").trim_end().parse().unwrap_or(f64::NAN)
}

/// The UI theme to use: a `theme=` query parameter if present, otherwise one derived from the user agent.
#[must_use]
pub fn theme(window: &Window) -> Option<String> {
	let search = window.location().search().unwrap_or_default();
	let user_agent = window.navigator().user_agent().unwrap_or_default();
	detect_theme(&search, &user_agent)
}

/// See [`theme`].
///
/// The query parameter value is the word (ASCII alphanumerics and `_`) directly after the first `theme=` that has one.
/// The user agent is checked for `iPad` and `iPhone` (`"ios"`) and then `Android` (`"android"`), ignoring case.
#[must_use]
pub fn detect_theme(search: &str, user_agent: &str) -> Option<String> {
	for (start, marker) in search.match_indices("theme=") {
		let value = &search[start + marker.len()..];
		let word_len = value.find(|c: char| !(c.is_ascii_alphanumeric() || c == '_')).unwrap_or_else(|| value.len());
		if word_len > 0 {
			return Some(value[..word_len].to_owned());
		}
	}

	let user_agent = user_agent.to_ascii_lowercase();
	if user_agent.contains("ipad") || user_agent.contains("iphone") {
		Some("ios".to_owned())
	} else if user_agent.contains("android") {
		Some("android".to_owned())
	} else {
		None
	}
}
