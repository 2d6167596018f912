//! String formatting utilities.
//!
//! Currency amounts arrive as integer minor units (paise) and are rendered
//! with Indian digit grouping: the last three integer digits form one group
//! and every two digits before that form another.

/// Truncates a long identifier for log output.
///
/// Shows only the first 8 characters followed by ".." for longer strings.
pub fn truncate_id(id: &str) -> String {
	if id.chars().count() <= 8 {
		id.to_string()
	} else {
		let head: String = id.chars().take(8).collect();
		format!("{}..", head)
	}
}

/// Formats a minor-unit amount as rupees, e.g. `44322` -> `₹443.22`.
pub fn format_currency(amount_minor: u64) -> String {
	let major = amount_minor / 100;
	let minor = amount_minor % 100;
	format!("₹{}.{:02}", group_indian(major), minor)
}

/// Formats a percentage with no decimals, e.g. `33.3` -> `33%`.
pub fn format_percent(value: f64) -> String {
	format!("{:.0}%", value.clamp(0.0, 100.0).floor())
}

fn group_indian(value: u64) -> String {
	let digits = value.to_string();
	if digits.len() <= 3 {
		return digits;
	}

	let (head, tail) = digits.split_at(digits.len() - 3);
	let mut groups = Vec::new();
	let mut rest = head;
	while rest.len() > 2 {
		let (left, right) = rest.split_at(rest.len() - 2);
		groups.push(right);
		rest = left;
	}
	groups.push(rest);
	groups.reverse();

	format!("{},{}", groups.join(","), tail)
}
