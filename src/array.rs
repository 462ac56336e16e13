//! Small in-place operations on slices and [`Vec`]s.

/// Finds the first element whose `key` equals `value`.
pub fn index_of_by<T, K, Q>(items: &[T], key: impl Fn(&T) -> &K, value: &Q) -> Option<usize>
where
	K: PartialEq<Q> + ?Sized,
	Q: ?Sized,
{
	items.iter().position(|item| key(item) == value)
}

/// Removes the first element equal to `item`.
///
/// Returns whether one was found.
pub fn remove<T: PartialEq>(items: &mut Vec<T>, item: &T) -> bool {
	match items.iter().position(|candidate| candidate == item) {
		Some(index) => {
			items.remove(index);
			true
		}
		None => false,
	}
}

/// Moves the element at `from` to `to`, shifting the ones in between by one place.
///
/// Returns `false` without changes if the positions are equal or either is out of bounds.
pub fn move_element<T>(items: &mut [T], from: usize, to: usize) -> bool {
	if from == to || from >= items.len() || to >= items.len() {
		return false;
	}

	if from < to {
		items[from..=to].rotate_left(1);
	} else {
		items[to..=from].rotate_right(1);
	}
	true
}
