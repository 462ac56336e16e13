use crate::{
	handle::{ElementHandle, ElementId, IdentityMap},
	tokens, Error, Result,
};
use core::fmt;
use hashbrown::{hash_map::Entry, HashMap};
use tracing::{error, info, instrument, level_filters::STATIC_MAX_LEVEL, trace, warn, Level};
use wasm_bindgen::UnwrapThrowExt;

/// Whether empty pending values are written by [`MutationBuffer::flush`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyValues {
	/// Empty pending class names and contents are dropped without touching the element.
	///
	/// This means [`MutationBuffer::set_class`] and [`MutationBuffer::set_content`] can't clear an element.
	Skip,
	/// Empty pending values are written like any other.
	Commit,
}
impl Default for EmptyValues {
	fn default() -> Self {
		Self::Skip
	}
}

/// What a [`MutationBuffer::flush`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
	pub classes_committed: usize,
	pub contents_committed: usize,
	/// Pending values not written due to [`EmptyValues::Skip`].
	pub empty_skipped: usize,
}

/// Coalesces class name and content changes to elements until [`flush`](`MutationBuffer::flush`)ed.
///
/// Each handle is assigned an [`ElementId`] on first use. Later requests against the same handle overwrite its pending value,
/// so that each element is written at most once per flush, regardless of how many changes were requested.
///
/// Reads through [`current_class`](`MutationBuffer::current_class`) observe pending changes.
/// Reading the class name directly from the element instead will see stale values until the next flush.
///
/// # Correct Use
///
/// The buffer never flushes by itself. Call [`flush`](`MutationBuffer::flush`) once per update cycle,
/// for example from a `requestAnimationFrame` callback.
///
/// Registered handles are retained until [`release`](`MutationBuffer::release`)d or until the buffer is dropped.
pub struct MutationBuffer<H: ElementHandle> {
	identities: H::Identities,
	registry: HashMap<ElementId, H>,
	next_id: Option<ElementId>,
	pending_classes: HashMap<ElementId, String>,
	pending_contents: HashMap<ElementId, String>,
	empty_values: EmptyValues,
}
impl<H: ElementHandle> Default for MutationBuffer<H> {
	fn default() -> Self {
		Self::new()
	}
}
impl<H: ElementHandle> fmt::Debug for MutationBuffer<H> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MutationBuffer")
			.field("registered", &self.registry.len())
			.field("next_id", &self.next_id)
			.field("pending_classes", &self.pending_classes.len())
			.field("pending_contents", &self.pending_contents.len())
			.field("empty_values", &self.empty_values)
			.finish()
	}
}
impl<H: ElementHandle> MutationBuffer<H> {
	#[must_use]
	pub fn new() -> Self {
		Self {
			identities: H::Identities::default(),
			registry: HashMap::new(),
			next_id: Some(ElementId::first()),
			pending_classes: HashMap::new(),
			pending_contents: HashMap::new(),
			empty_values: EmptyValues::default(),
		}
	}

	#[must_use]
	pub fn with_empty_values(mut self, empty_values: EmptyValues) -> Self {
		self.empty_values = empty_values;
		self
	}

	#[must_use]
	pub fn empty_values(&self) -> EmptyValues {
		self.empty_values
	}

	fn register(&mut self, handle: &H) -> ElementId {
		if let Some(id) = self.identities.get(handle) {
			return id;
		}

		let id = self.next_id.expect_throw("dom-batch: `ElementId`s exhausted. Too many elements were registered with one `MutationBuffer`.");
		self.next_id = id.checked_next();
		self.identities.insert(handle, id);
		self.registry.insert(id, handle.clone());
		trace!(%id, "Registered element.");
		id
	}

	fn current_class_mut(&mut self, handle: &H) -> (ElementId, &mut String) {
		let id = self.register(handle);
		// Under `EmptyValues::Skip`, an empty pending class name won't be written, so the element's own stays current.
		let reseed_empty = self.empty_values == EmptyValues::Skip;
		let current = match self.pending_classes.entry(id) {
			Entry::Occupied(occupied) if !(reseed_empty && occupied.get().is_empty()) => occupied.into_mut(),
			Entry::Occupied(occupied) => {
				trace!(%id, "Re-seeding empty pending class name from the element.");
				let current = occupied.into_mut();
				*current = handle.class_name();
				current
			}
			Entry::Vacant(vacant) => {
				trace!(%id, "Seeding pending class name from the element.");
				vacant.insert(handle.class_name())
			}
		};
		(id, current)
	}

	/// The id assigned to `handle`, without registering it.
	#[must_use]
	pub fn id_of(&self, handle: &H) -> Option<ElementId> {
		self.identities.get(handle)
	}

	/// Retrieves `handle`'s class name as it will be after the next flush.
	///
	/// Unless a change is already pending, this reads the element's committed class name and remembers it as pending value.
	/// With [`EmptyValues::Skip`], an empty pending class name counts as no change, since [`flush`](`MutationBuffer::flush`) won't write it.
	pub fn current_class(&mut self, handle: &H) -> &str {
		self.current_class_mut(handle).1
	}

	/// Appends `name` to the current class name, removing any previous occurrences of that token first.
	///
	/// # Errors
	///
	/// Iff `name` is empty or contains whitespace, in which case nothing changes.
	pub fn add_class(&mut self, handle: &H, name: &str) -> Result<()> {
		check_class_name(name)?;
		let (id, current) = self.current_class_mut(handle);
		*current = tokens::append_token(current.as_str(), name);
		if cfg!(feature = "dangerous-logging") {
			trace!(%id, name, current = current.as_str(), "Queued class addition.");
		} else {
			trace!(%id, "Queued class addition.");
		}
		Ok(())
	}

	/// Removes each occurrence of the token `name` from the current class name.
	///
	/// Whitespace around removed tokens is kept as-is.
	///
	/// # Errors
	///
	/// Iff `name` is empty or contains whitespace, in which case nothing changes.
	pub fn remove_class(&mut self, handle: &H, name: &str) -> Result<()> {
		check_class_name(name)?;
		let (id, current) = self.current_class_mut(handle);
		*current = tokens::remove_token(current.as_str(), name);
		if cfg!(feature = "dangerous-logging") {
			trace!(%id, name, current = current.as_str(), "Queued class removal.");
		} else {
			trace!(%id, "Queued class removal.");
		}
		Ok(())
	}

	/// Replaces the pending class name outright.
	pub fn set_class(&mut self, handle: &H, class_name: impl Into<String>) {
		let id = self.register(handle);
		let class_name = class_name.into();
		if cfg!(feature = "dangerous-logging") {
			trace!(%id, class_name = class_name.as_str(), "Queued class name.");
		} else {
			trace!(%id, "Queued class name.");
		}
		self.pending_classes.insert(id, class_name);
	}

	/// Replaces the pending content. For [`web_sys::Element`]s, this is ***innerHTML***.
	pub fn set_content(&mut self, handle: &H, content: impl Into<String>) {
		let id = self.register(handle);
		let content = content.into();
		if cfg!(feature = "dangerous-logging") {
			trace!(%id, content = content.as_str(), "Queued content.");
		} else {
			trace!(%id, len = content.len(), "Queued content.");
		}
		self.pending_contents.insert(id, content);
	}

	#[must_use]
	pub fn pending_class(&self, handle: &H) -> Option<&str> {
		let id = self.id_of(handle)?;
		self.pending_classes.get(&id).map(String::as_str)
	}

	#[must_use]
	pub fn pending_content(&self, handle: &H) -> Option<&str> {
		let id = self.id_of(handle)?;
		self.pending_contents.get(&id).map(String::as_str)
	}

	/// The number of pending values, class names and contents counted separately.
	#[must_use]
	pub fn pending_len(&self) -> usize {
		self.pending_classes.len() + self.pending_contents.len()
	}

	#[must_use]
	pub fn is_clean(&self) -> bool {
		self.pending_classes.is_empty() && self.pending_contents.is_empty()
	}

	#[must_use]
	pub fn registered_len(&self) -> usize {
		self.registry.len()
	}

	/// Forgets `handle` along with its pending changes.
	///
	/// Returns whether it was registered. If it's used again later, it's assigned a new [`ElementId`].
	#[instrument(skip(self, handle))]
	pub fn release(&mut self, handle: &H) -> bool {
		let id = match self.identities.remove(handle) {
			Some(id) => id,
			None => return false,
		};
		self.registry.remove(&id);
		let dropped = usize::from(self.pending_classes.remove(&id).is_some()) + usize::from(self.pending_contents.remove(&id).is_some());
		trace!(%id, dropped, "Released element.");
		true
	}

	/// Writes all pending class names, then all pending contents, to their elements, and clears them from the buffer.
	///
	/// Empty values are handled according to [`EmptyValues`].
	#[instrument(skip(self))]
	pub fn flush(&mut self) -> FlushReport {
		let mut report = FlushReport::default();
		let skip_empty = self.empty_values == EmptyValues::Skip;

		for (id, class_name) in self.pending_classes.drain() {
			match self.registry.get(&id) {
				None => error!(%id, "dom-batch bug: Pending class name for unregistered element. Discarding it."),
				Some(_) if skip_empty && class_name.is_empty() => {
					trace!(%id, "Skipping empty class name.");
					report.empty_skipped += 1;
				}
				Some(handle) => {
					handle.set_class_name(&class_name);
					report.classes_committed += 1;
				}
			}
		}

		for (id, content) in self.pending_contents.drain() {
			match self.registry.get(&id) {
				None => error!(%id, "dom-batch bug: Pending content for unregistered element. Discarding it."),
				Some(_) if skip_empty && content.is_empty() => {
					trace!(%id, "Skipping empty content.");
					report.empty_skipped += 1;
				}
				Some(handle) => {
					handle.set_content(&content);
					report.contents_committed += 1;
				}
			}
		}

		info!(
			classes = report.classes_committed,
			contents = report.contents_committed,
			skipped = report.empty_skipped,
			"Flushed pending changes."
		);
		info!("Registered element count/cached capacity: {}/{}", self.registry.len(), self.registry.capacity());
		if STATIC_MAX_LEVEL >= Level::WARN && self.registry.len() >= 10_000 {
			warn!(
				"Many elements are registered ({}).\n\
				Handles are retained until released, so this may point to detached elements that were never `release`d.",
				self.registry.len()
			);
		}
		report
	}
}

fn check_class_name(name: &str) -> Result<()> {
	if tokens::is_single_token(name) {
		Ok(())
	} else {
		Err(Error::InvalidClassName { name: name.to_owned() })
	}
}

#[cfg(test)]
mod tests {
	use super::{EmptyValues, FlushReport, MutationBuffer};
	use crate::{handle::fake::FakeHandle, Error};

	fn token_count(class_name: &str, token: &str) -> usize {
		class_name.split_ascii_whitespace().filter(|&t| t == token).count()
	}

	#[test]
	fn add_remove_flush_scenario() {
		let mut buffer = MutationBuffer::new();
		let h = FakeHandle::with_class("foo bar");

		buffer.add_class(&h, "baz").unwrap();
		assert_eq!(buffer.current_class(&h), "foo bar baz");

		buffer.remove_class(&h, "bar").unwrap();
		assert_eq!(buffer.current_class(&h), "foo  baz");
		assert_eq!(h.committed_class(), "foo bar");

		let report = buffer.flush();
		assert_eq!(h.committed_class(), "foo  baz");
		assert_eq!(
			report,
			FlushReport {
				classes_committed: 1,
				contents_committed: 0,
				empty_skipped: 0,
			}
		);
	}

	#[test]
	fn re_adding_does_not_duplicate() {
		let mut buffer = MutationBuffer::new();
		let h = FakeHandle::with_class("a c");
		for _ in 0..3 {
			buffer.add_class(&h, "c").unwrap();
		}
		assert_eq!(token_count(buffer.current_class(&h), "c"), 1);
	}

	#[test]
	fn add_then_remove_leaves_no_token() {
		for committed in ["", "x", "x y", "y x x", "xx x-x"].iter() {
			let mut buffer = MutationBuffer::new();
			let h = FakeHandle::with_class(committed);
			buffer.add_class(&h, "x").unwrap();
			buffer.remove_class(&h, "x").unwrap();
			assert_eq!(token_count(buffer.current_class(&h), "x"), 0, "committed: {:?}", committed);
		}
	}

	#[test]
	fn reads_reflect_pending_changes() {
		let mut buffer = MutationBuffer::new();
		let h = FakeHandle::with_class("old");
		buffer.set_class(&h, "new");
		assert_eq!(buffer.current_class(&h), "new");
		buffer.add_class(&h, "more").unwrap();
		assert_eq!(buffer.current_class(&h), "new more");
		assert_eq!(h.committed_class(), "old");
	}

	#[test]
	fn empty_values_are_skipped_by_default() {
		let mut buffer = MutationBuffer::new();
		let h = FakeHandle::with_class("keep");
		h.0.borrow_mut().content = "<b>kept</b>".to_owned();

		buffer.set_class(&h, "");
		buffer.set_content(&h, "");
		let report = buffer.flush();

		assert_eq!(h.committed_class(), "keep");
		assert_eq!(h.committed_content(), "<b>kept</b>");
		assert_eq!(report.empty_skipped, 2);
		assert_eq!(h.0.borrow().class_writes, 0);
		assert_eq!(h.0.borrow().content_writes, 0);
	}

	#[test]
	fn empty_values_can_be_committed() {
		let mut buffer = MutationBuffer::new().with_empty_values(EmptyValues::Commit);
		let h = FakeHandle::with_class("gone");
		h.0.borrow_mut().content = "gone".to_owned();

		buffer.set_class(&h, "");
		buffer.set_content(&h, String::new());
		let report = buffer.flush();

		assert_eq!(h.committed_class(), "");
		assert_eq!(h.committed_content(), "");
		assert_eq!(report.empty_skipped, 0);
		assert_eq!(report.classes_committed, 1);
		assert_eq!(report.contents_committed, 1);
	}

	#[test]
	fn skipped_empty_class_reads_as_committed() {
		let mut buffer = MutationBuffer::new();
		let h = FakeHandle::with_class("keep");
		buffer.set_class(&h, "");
		assert_eq!(buffer.current_class(&h), "keep");
		buffer.flush();
		assert_eq!(h.committed_class(), "keep");

		let h2 = FakeHandle::with_class("keep");
		buffer.set_class(&h2, "");
		buffer.add_class(&h2, "x").unwrap();
		buffer.flush();
		assert_eq!(h2.committed_class(), "keep x");
	}

	#[test]
	fn removing_the_last_token_reads_as_committed_when_skipping() {
		let mut buffer = MutationBuffer::new();
		let h = FakeHandle::with_class("only");
		buffer.remove_class(&h, "only").unwrap();
		assert_eq!(buffer.pending_class(&h), Some(""));
		assert_eq!(buffer.current_class(&h), "only");
		buffer.flush();
		assert_eq!(h.committed_class(), "only");
	}

	#[test]
	fn committed_empty_class_reads_as_empty() {
		let mut buffer = MutationBuffer::new().with_empty_values(EmptyValues::Commit);
		let h = FakeHandle::with_class("gone");
		buffer.set_class(&h, "");
		assert_eq!(buffer.current_class(&h), "");

		let h2 = FakeHandle::with_class("gone");
		buffer.set_class(&h2, "");
		buffer.add_class(&h2, "x").unwrap();
		buffer.flush();
		assert_eq!(h.committed_class(), "");
		assert_eq!(h2.committed_class(), " x");
	}

	#[test]
	fn last_write_wins() {
		let mut buffer = MutationBuffer::new();
		let h = FakeHandle::with_class("");
		buffer.set_class(&h, "a");
		buffer.set_class(&h, "b");
		buffer.set_content(&h, "1");
		buffer.set_content(&h, "2");
		buffer.flush();

		assert_eq!(h.committed_class(), "b");
		assert_eq!(h.committed_content(), "2");
		assert_eq!(h.0.borrow().class_writes, 1);
		assert_eq!(h.0.borrow().content_writes, 1);
	}

	#[test]
	fn class_and_content_are_independent() {
		let mut buffer = MutationBuffer::new();
		let h = FakeHandle::with_class("c");
		buffer.set_content(&h, "text");
		assert_eq!(buffer.pending_class(&h), None);
		assert_eq!(buffer.pending_content(&h), Some("text"));

		buffer.flush();
		assert_eq!(h.committed_class(), "c");
		assert_eq!(h.0.borrow().class_writes, 0);
		assert_eq!(h.committed_content(), "text");
	}

	#[test]
	fn flush_clears_pending_state() {
		let mut buffer = MutationBuffer::new();
		let h = FakeHandle::with_class("a");
		buffer.add_class(&h, "b").unwrap();
		buffer.set_content(&h, "x");
		assert_eq!(buffer.pending_len(), 2);
		buffer.flush();

		assert!(buffer.is_clean());
		assert_eq!(buffer.registered_len(), 1);

		// Changed behind the buffer's back, so a stale pending value would show.
		h.0.borrow_mut().class_name = "external".to_owned();
		assert_eq!(buffer.current_class(&h), "external");
	}

	#[test]
	fn ids_are_assigned_once_and_in_order() {
		let mut buffer = MutationBuffer::new();
		let a = FakeHandle::with_class("");
		let b = FakeHandle::with_class("");
		assert_eq!(buffer.id_of(&a), None);

		buffer.set_class(&a, "1");
		buffer.set_content(&b, "2");
		buffer.add_class(&a.clone(), "3").unwrap();
		buffer.flush();
		buffer.current_class(&b);

		let id_a = buffer.id_of(&a).unwrap();
		let id_b = buffer.id_of(&b).unwrap();
		assert_eq!(id_a.get(), 1);
		assert_eq!(id_b.get(), 2);
		assert_eq!(buffer.registered_len(), 2);
	}

	#[test]
	fn rejected_names_change_nothing() {
		let mut buffer = MutationBuffer::new();
		let h = FakeHandle::with_class("a");

		match buffer.add_class(&h, "b c") {
			Err(Error::InvalidClassName { name }) => assert_eq!(name, "b c"),
			other => panic!("Unexpected result: {:?}", other),
		}
		assert!(buffer.remove_class(&h, "").is_err());
		assert!(buffer.is_clean());
		assert_eq!(buffer.id_of(&h), None);
	}

	#[test]
	fn release_forgets_everything() {
		let mut buffer = MutationBuffer::new();
		let h = FakeHandle::with_class("a");
		buffer.add_class(&h, "b").unwrap();
		buffer.set_content(&h, "c");
		let first_id = buffer.id_of(&h).unwrap();

		assert!(buffer.release(&h));
		assert!(!buffer.release(&h));
		assert!(buffer.is_clean());
		assert_eq!(buffer.registered_len(), 0);

		buffer.flush();
		assert_eq!(h.committed_class(), "a");
		assert_eq!(h.committed_content(), "");

		buffer.set_class(&h, "d");
		assert!(buffer.id_of(&h).unwrap() > first_id);
	}

	#[test]
	fn buffers_are_independent() {
		let mut one = MutationBuffer::new();
		let mut two = MutationBuffer::new();
		let h = FakeHandle::with_class("base");

		one.add_class(&h, "one").unwrap();
		two.add_class(&h, "two").unwrap();
		assert_eq!(one.current_class(&h), "base one");
		assert_eq!(two.current_class(&h), "base two");
		assert_eq!(one.id_of(&h), two.id_of(&h));

		two.flush();
		assert_eq!(h.committed_class(), "base two");
		assert_eq!(one.current_class(&h), "base one");
	}
}
