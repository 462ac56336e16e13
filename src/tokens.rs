//! Whole-token edits on class name strings.
//!
//! A token is a maximal run of non-whitespace characters, with whitespace as defined for HTML attribute values.
//! Token names are matched literally.

/// Whether `name` can stand as a single class token.
pub fn is_single_token(name: &str) -> bool {
	!name.is_empty() && !name.chars().any(|c| c.is_ascii_whitespace())
}

/// Replaces every whole-token occurrence of `name` with nothing, leaving adjacent whitespace in place.
pub fn remove_token(class_name: &str, name: &str) -> String {
	debug_assert!(is_single_token(name));

	let mut result = String::with_capacity(class_name.len());
	let mut copied_until = 0;
	for (start, matched) in class_name.match_indices(name) {
		let end = start + matched.len();
		let bounded_before = class_name[..start].chars().next_back().map_or(true, |c| c.is_ascii_whitespace());
		let bounded_after = class_name[end..].chars().next().map_or(true, |c| c.is_ascii_whitespace());
		if bounded_before && bounded_after {
			result.push_str(&class_name[copied_until..start]);
			copied_until = end;
		}
	}
	result.push_str(&class_name[copied_until..]);
	result
}

/// Removes `name` as in [`remove_token`], then appends it after a single space.
pub fn append_token(class_name: &str, name: &str) -> String {
	let mut result = remove_token(class_name, name);
	result.reserve(1 + name.len());
	result.push(' ');
	result.push_str(name);
	result
}
