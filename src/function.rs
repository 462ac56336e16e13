//! Deferring and rate-limiting calls.

use crate::{Error, Result};
use core::fmt;
use tracing::trace;
use wasm_bindgen::{closure::Closure, JsCast};

/// How long [`postpone`] waits, in milliseconds.
pub const POSTPONE_DELAY_MS: i32 = 10;

/// Runs `f` once the current call chain has finished, after [`POSTPONE_DELAY_MS`].
///
/// Returns the timeout handle, which can be passed to ***clearTimeout***.
///
/// # Errors
///
/// If there's no `window` or scheduling the timeout throws.
pub fn postpone(f: impl FnOnce() + 'static) -> Result<i32> {
	let window = web_sys::window().ok_or(Error::NoWindow)?;
	let callback = Closure::once_into_js(f);
	let handle = window.set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), POSTPONE_DELAY_MS)?;
	trace!(handle, "Postponed callback.");
	Ok(handle)
}

/// Wraps a function so that it runs at most once per interval.
///
/// Calls within `interval_ms` milliseconds of the last call that went through are dropped.
/// Dropped calls don't extend the interval.
pub struct Throttled<F> {
	f: F,
	interval_ms: f64,
	last_call: Option<f64>,
	clock: fn() -> f64,
}
impl<F> fmt::Debug for Throttled<F> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Throttled")
			.field("interval_ms", &self.interval_ms)
			.field("last_call", &self.last_call)
			.finish()
	}
}
impl<F> Throttled<F> {
	/// Uses [`js_sys::Date::now`] as clock.
	#[must_use]
	pub fn new(f: F, interval_ms: f64) -> Self {
		Self::with_clock(f, interval_ms, js_sys::Date::now)
	}

	/// `clock` must return milliseconds.
	#[must_use]
	pub fn with_clock(f: F, interval_ms: f64, clock: fn() -> f64) -> Self {
		Self {
			f,
			interval_ms,
			last_call: None,
			clock,
		}
	}

	/// Calls the wrapped function unless it ran too recently.
	///
	/// Returns [`None`] iff the call was dropped.
	pub fn call<A, R>(&mut self, args: A) -> Option<R>
	where
		F: FnMut(A) -> R,
	{
		let now = (self.clock)();
		match self.last_call {
			Some(last_call) if now - last_call <= self.interval_ms => {
				trace!(since_last_call = now - last_call, "Throttled call.");
				None
			}
			_ => {
				let result = (self.f)(args);
				self.last_call = Some(now);
				Some(result)
			}
		}
	}

	/// Lets the next call through regardless of timing.
	pub fn reset(&mut self) {
		self.last_call = None;
	}

	pub fn into_inner(self) -> F {
		self.f
	}
}
