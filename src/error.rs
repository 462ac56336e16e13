use thiserror::Error;
use wasm_bindgen::JsValue;

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
	/// A class name passed to [`add_class`](`crate::MutationBuffer::add_class`) or [`remove_class`](`crate::MutationBuffer::remove_class`)
	/// is empty or contains whitespace, so it can't match a single token.
	#[error("Invalid class name {name:?}: expected a single non-empty token")]
	InvalidClassName { name: String },

	#[error("No global `window` available")]
	NoWindow,

	#[error("The document has no `<head>` element")]
	NoHead,

	/// A browser API threw.
	#[error("JavaScript error: {0}")]
	Js(String),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl From<JsValue> for Error {
	fn from(value: JsValue) -> Self {
		Self::Js(format!("{:?}", value))
	}
}
