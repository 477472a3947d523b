use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::WordPredError;

/// End-of-sequence sentinel. Never suggested.
pub const EOS: &str = "<eos>";

/// Matches an end-of-sequence marker, tolerating case and inner spacing (`< EOS >`).
static EOS_MARKER: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)<\s*eos\s*>").expect("end-of-sequence pattern is valid"));

/// Supported corpus languages.
///
/// Each language owns a character filter:
/// - `English`: lowercase, keep `[a-z0-9]` and whitespace
/// - `Hebrew`: drop niqqud and cantillation marks, keep the letter block,
///   ASCII digits and whitespace
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Language {
	#[serde(rename = "en")]
	English,
	#[serde(rename = "he")]
	Hebrew,
}

impl Language {
	/// Short tag used in artifact names and requests.
	pub fn tag(self) -> &'static str {
		match self {
			Language::English => "en",
			Language::Hebrew => "he",
		}
	}

	/// Applies the language's character filter to already cleaned text.
	///
	/// Whitespace is kept as-is; callers collapse it afterwards.
	fn filter(self, text: &str) -> String {
		match self {
			Language::English => text
				.to_lowercase()
				.chars()
				.filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
				.collect(),
			Language::Hebrew => text
				.chars()
				.filter(|c| !('\u{0591}'..='\u{05C7}').contains(c))
				.filter(|c| ('\u{05D0}'..='\u{05EA}').contains(c) || c.is_ascii_digit() || c.is_whitespace())
				.collect(),
		}
	}
}

impl FromStr for Language {
	type Err = WordPredError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"en" => Ok(Language::English),
			"he" => Ok(Language::Hebrew),
			other => Err(WordPredError::UnknownLanguage(other.to_owned())),
		}
	}
}

impl fmt::Display for Language {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.tag())
	}
}

/// Collapses every whitespace run into a single space and trims the ends.
fn collapse_whitespace(text: &str) -> String {
	text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cleans one raw corpus line (or a typed prefix).
///
/// - Trims and collapses whitespace
/// - Removes every end-of-sequence marker, remembering whether one was present
/// - Applies the language filter, then collapses whitespace again
/// - Re-appends `<eos>` if a marker was present
///
/// The result may be empty; callers drop empty lines.
pub fn clean_sentence(line: &str, lang: Language) -> String {
	let collapsed = collapse_whitespace(line);
	let has_eos = EOS_MARKER.is_match(&collapsed);
	let stripped = EOS_MARKER.replace_all(&collapsed, " ");

	let cleaned = collapse_whitespace(&lang.filter(&stripped));
	if has_eos {
		format!("{cleaned} {EOS}").trim().to_owned()
	} else {
		cleaned
	}
}

/// Normalizes a single candidate word.
///
/// Angle brackets are stripped first, so a raw `<eos>` comes out as `eos`.
/// No end marker is ever re-appended.
pub fn normalize_word(word: &str, lang: Language) -> String {
	let unbracketed: String = word.chars().filter(|c| *c != '<' && *c != '>').collect();
	lang.filter(unbracketed.trim()).trim().to_owned()
}

/// Splits a cleaned line on whitespace runs.
pub fn tokenize(line: &str) -> Vec<String> {
	line.split_whitespace().map(str::to_owned).collect()
}

/// Tokenizes a line and truncates it at the first `<eos>`.
pub fn to_sequence(line: &str) -> Vec<String> {
	let mut tokens = tokenize(line);
	if let Some(eos) = tokens.iter().position(|t| t == EOS) {
		tokens.truncate(eos);
	}
	tokens
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn english_lowercases_and_strips_punctuation() {
		assert_eq!(clean_sentence("  I  want, TO go!  ", Language::English), "i want to go");
	}

	#[test]
	fn eos_marker_is_moved_to_the_end() {
		assert_eq!(clean_sentence("I need < EOS > water", Language::English), "i need water <eos>");
		assert_eq!(clean_sentence("help me <eos>", Language::English), "help me <eos>");
		assert_eq!(clean_sentence("<Eos>", Language::English), "<eos>");
	}

	#[test]
	fn nothing_left_gives_empty() {
		assert_eq!(clean_sentence("?!...", Language::English), "");
		assert_eq!(clean_sentence("", Language::Hebrew), "");
		assert_eq!(clean_sentence("hello", Language::Hebrew), "");
	}

	#[test]
	fn hebrew_drops_niqqud_and_latin() {
		// "shalom" with niqqud, followed by latin text and a digit
		let line = "\u{05E9}\u{05C1}\u{05B8}\u{05DC}\u{05D5}\u{05B9}\u{05DD} abc 7";
		assert_eq!(clean_sentence(line, Language::Hebrew), "\u{05E9}\u{05DC}\u{05D5}\u{05DD} 7");
	}

	#[test]
	fn normalize_word_strips_brackets() {
		assert_eq!(normalize_word("<eos>", Language::English), "eos");
		assert_eq!(normalize_word(" Water. ", Language::English), "water");
		assert_eq!(normalize_word("!!", Language::English), "");
	}

	#[test]
	fn tokenize_drops_empty_tokens() {
		assert_eq!(tokenize(" a  b\tc "), vec!["a", "b", "c"]);
		assert!(tokenize("   ").is_empty());
	}

	#[test]
	fn sequence_stops_at_eos() {
		assert_eq!(to_sequence("i am tired <eos>"), vec!["i", "am", "tired"]);
		assert_eq!(to_sequence("a <eos> b"), vec!["a"]);
		assert_eq!(to_sequence("no marker"), vec!["no", "marker"]);
	}

	#[test]
	fn language_tags_round_trip() {
		assert_eq!("EN".parse::<Language>().unwrap(), Language::English);
		assert_eq!("he".parse::<Language>().unwrap(), Language::Hebrew);
		assert!("fr".parse::<Language>().is_err());
		assert_eq!(Language::Hebrew.to_string(), "he");
	}
}
