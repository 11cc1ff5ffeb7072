// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::HashSet;

use rand::seq::SliceRandom;

/// Source of human-friendly pseudonyms for new users.
pub trait NameSource: Send + Sync {
	fn pseudonym(&self) -> String;
}

const ADJECTIVES: &[&str] = &[
	"Amber", "Brave", "Calm", "Clever", "Daring", "Eager", "Gentle", "Honest", "Jolly", "Keen",
	"Lively", "Lucky", "Mellow", "Nimble", "Patient", "Quiet", "Rapid", "Steady", "Swift", "Witty",
];

const NOUNS: &[&str] = &[
	"Badger", "Falcon", "Heron", "Lynx", "Marten", "Otter", "Owl", "Panda", "Raven", "Robin",
	"Salmon", "Sparrow", "Stork", "Swan", "Tiger", "Walrus", "Whale", "Wolf", "Wren", "Yak",
];

/// Adjective plus animal, drawn from small fixed word lists.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleNames;

impl NameSource for SimpleNames {
	fn pseudonym(&self) -> String {
		let mut rng = rand::thread_rng();
		let adjective = ADJECTIVES.choose(&mut rng).copied().unwrap_or("Quiet");
		let noun = NOUNS.choose(&mut rng).copied().unwrap_or("Owl");
		format!("{adjective} {noun}")
	}
}

/// Prefix a pseudonym with the blurred address tag.
pub fn tagged_name(tag: u32, pseudonym: &str) -> String {
	format!("{tag:03} {pseudonym}")
}

/// Pick a pseudonym not already used in the brigade. Falls back to the last
/// draw when the source keeps repeating itself; the tag still tells users
/// apart.
pub fn unique_pseudonym(source: &dyn NameSource, taken: &HashSet<String>) -> String {
	let mut name = source.pseudonym();
	for _ in 0..16 {
		if !taken.contains(&name) {
			break;
		}
		name = source.pseudonym();
	}
	name
}

#[cfg(test)]
mod tests {
	use super::*;

	struct Fixed(&'static str);

	impl NameSource for Fixed {
		fn pseudonym(&self) -> String {
			self.0.to_string()
		}
	}

	#[test]
	fn simple_names_have_two_words() {
		let name = SimpleNames.pseudonym();
		assert_eq!(name.split(' ').count(), 2);
	}

	#[test]
	fn tag_is_zero_padded() {
		assert_eq!(tagged_name(7, "Calm Owl"), "007 Calm Owl");
		assert_eq!(tagged_name(1234, "Calm Owl"), "1234 Calm Owl");
	}

	#[test]
	fn repeating_source_terminates() {
		let taken: HashSet<String> = ["Calm Owl".to_string()].into();
		assert_eq!(unique_pseudonym(&Fixed("Calm Owl"), &taken), "Calm Owl");
	}
}
