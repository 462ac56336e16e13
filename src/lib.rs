#![doc(html_root_url = "https://docs.rs/dom-batch/0.0.1")]
#![warn(clippy::pedantic)]

//! Batched [***className***](https://developer.mozilla.org/en-US/docs/Web/API/Element/className)
//! and [***innerHTML***](https://developer.mozilla.org/en-US/docs/Web/API/Element/innerHTML) mutations,
//! see [`MutationBuffer`].
//!
//! The remaining modules are small browser helpers that tend to be needed alongside it.

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod ajax;
pub mod array;
pub mod buffer;
pub mod dom;
mod error;
pub mod function;
pub mod handle;
mod tokens;
pub mod web_element;

pub use buffer::{EmptyValues, FlushReport, MutationBuffer};
pub use error::{Error, Result};
pub use handle::{ElementHandle, ElementId, HashIdentities, IdentityMap};
