//! The capability a UI node needs to take part in a [`MutationBuffer`](`crate::MutationBuffer`).

use core::{fmt, hash::Hash, num::NonZeroU32};
use hashbrown::HashMap;

/// Identifies a handle within one [`MutationBuffer`](`crate::MutationBuffer`).
///
/// Ids are assigned in increasing order starting at `1` and are never reused by the same buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(NonZeroU32);
impl ElementId {
	#[must_use]
	pub const fn first() -> Self {
		Self(unsafe {
			//SAFETY: Not zero.
			NonZeroU32::new_unchecked(1)
		})
	}

	/// The id after this one, or [`None`] on exhaustion.
	#[must_use]
	pub fn checked_next(self) -> Option<Self> {
		self.0.get().checked_add(1).and_then(NonZeroU32::new).map(Self)
	}

	#[must_use]
	pub fn from_raw(raw: u32) -> Option<Self> {
		NonZeroU32::new(raw).map(Self)
	}

	#[must_use]
	pub fn get(self) -> u32 {
		self.0.get()
	}
}
impl fmt::Display for ElementId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// A caller-owned, cheaply clonable reference to a UI node.
///
/// Writes go through `&self`: handles are shared references to nodes that are mutated in place,
/// like [`web_sys::Element`].
pub trait ElementHandle: Clone {
	/// The identity map a buffer uses to recognise this handle type without tagging the node.
	type Identities: IdentityMap<Self>;

	/// The committed class name.
	fn class_name(&self) -> String;
	fn set_class_name(&self, class_name: &str);
	fn set_content(&self, content: &str);
}

/// Remembers which [`ElementId`] was assigned to which handle.
pub trait IdentityMap<H: ?Sized>: Default {
	fn get(&self, handle: &H) -> Option<ElementId>;
	fn insert(&mut self, handle: &H, id: ElementId);
	fn remove(&mut self, handle: &H) -> Option<ElementId>;
}

/// An [`IdentityMap`] for handles whose [`Hash`] and [`Eq`] implementations follow node identity.
pub struct HashIdentities<H>(HashMap<H, ElementId>);
impl<H> Default for HashIdentities<H> {
	fn default() -> Self {
		Self(HashMap::new())
	}
}
impl<H> fmt::Debug for HashIdentities<H> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("HashIdentities").field("len", &self.0.len()).finish()
	}
}
impl<H: Hash + Eq + Clone> IdentityMap<H> for HashIdentities<H> {
	fn get(&self, handle: &H) -> Option<ElementId> {
		self.0.get(handle).copied()
	}

	fn insert(&mut self, handle: &H, id: ElementId) {
		self.0.insert(handle.clone(), id);
	}

	fn remove(&mut self, handle: &H) -> Option<ElementId> {
		self.0.remove(handle)
	}
}


#[cfg(test)]
mod tests {
	use super::{fake::FakeHandle, ElementId, HashIdentities, IdentityMap};

	#[test]
	fn ids_count_up_from_one() {
		let first = ElementId::first();
		assert_eq!(first.get(), 1);
		assert_eq!(first.checked_next().map(ElementId::get), Some(2));
		assert_eq!(ElementId::from_raw(u32::MAX).and_then(ElementId::checked_next), None);
		assert_eq!(ElementId::from_raw(0), None);
	}

	#[test]
	fn hash_identities_follow_node_identity() {
		let a = FakeHandle::with_class("same");
		let b = FakeHandle::with_class("same");
		let mut identities = HashIdentities::default();
		identities.insert(&a, ElementId::first());

		assert_eq!(identities.get(&a.clone()), Some(ElementId::first()));
		assert_eq!(identities.get(&b), None);
		assert_eq!(identities.remove(&a), Some(ElementId::first()));
		assert_eq!(identities.get(&a), None);
	}
}
