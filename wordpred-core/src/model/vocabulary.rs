use crate::text::Language;
use crate::text::normalizer::normalize_word;

/// Category labels known to the vocabularies, in classifier output order.
pub const CATEGORIES: [&str; 6] = ["Needs", "Feelings", "Actions", "People", "Objects", "Places"];

type Vocabulary = [(&'static str, &'static [&'static str])];

const CATEGORY_WORDS_EN: &Vocabulary = &[
	("Needs", &["help", "please", "need"]),
	("Feelings", &["happy", "sad", "tired", "hungry", "thirsty", "calm", "stressed", "scared"]),
	("Actions", &["go", "eat", "drink", "call", "open", "close", "read", "draw", "play", "rest", "wait", "talk"]),
	("People", &["mom", "dad", "doctor", "nurse", "teacher", "friend"]),
	(
		"Objects",
		&["water", "food", "juice", "tea", "coffee", "bread", "soup", "rice", "phone", "music", "medicine", "blanket", "pillow"],
	),
	("Places", &["home", "school", "hospital", "room", "kitchen", "bathroom", "outside", "garden", "class"]),
];

const CATEGORY_WORDS_HE: &Vocabulary = &[
	("Needs", &["עזרה", "בבקשה", "צריך", "רוצה"]),
	("Feelings", &["שמח", "עצוב", "עייף", "רעב", "צמא", "רגוע", "לחוץ", "מפחד"]),
	("Actions", &["ללכת", "לאכול", "לשתות", "להתקשר", "לפתוח", "לסגור", "לקרוא", "לצייר", "לשחק", "לנוח", "לחכות", "לדבר"]),
	("People", &["אמא", "אבא", "רופא", "אחות", "מורה", "חבר"]),
	("Objects", &["מים", "אוכל", "מיץ", "תה", "קפה", "לחם", "מרק", "אורז", "טלפון", "מוזיקה", "תרופה", "שמיכה", "כרית"]),
	("Places", &["בית", "ספר", "חולים", "חדר", "מטבח", "שירותים", "בחוץ", "גינה", "כיתה"]),
];

const CATEGORY_FALLBACK_EN: &Vocabulary = &[
	("Needs", &["help", "please", "need"]),
	("Feelings", &["tired", "sad", "happy"]),
	("Actions", &["go", "eat", "drink"]),
	("People", &["mom", "doctor", "dad"]),
	("Objects", &["water", "food", "phone"]),
	("Places", &["home", "bathroom", "hospital"]),
];

const CATEGORY_FALLBACK_HE: &Vocabulary = &[
	("Needs", &["עזרה", "בבקשה", "צריך"]),
	("Feelings", &["עייף", "עצוב", "שמח"]),
	("Actions", &["ללכת", "לאכול", "לשתות"]),
	("People", &["אמא", "רופא", "אבא"]),
	("Objects", &["מים", "אוכל", "טלפון"]),
	("Places", &["בית", "שירותים", "חולים"]),
];

fn category_words(lang: Language) -> &'static Vocabulary {
	match lang {
		Language::English => CATEGORY_WORDS_EN,
		Language::Hebrew => CATEGORY_WORDS_HE,
	}
}

/// Words suggested for `category` when the ranked list lacks them.
///
/// Unknown categories have no fallback words.
pub fn fallback_words(lang: Language, category: &str) -> &'static [&'static str] {
	let fallback = match lang {
		Language::English => CATEGORY_FALLBACK_EN,
		Language::Hebrew => CATEGORY_FALLBACK_HE,
	};
	fallback.iter().find(|(name, _)| *name == category).map(|(_, words)| *words).unwrap_or(&[])
}

/// Category of `word`, looked up after normalization.
///
/// Words outside the vocabulary have no category.
pub fn word_category(word: &str, lang: Language) -> Option<&'static str> {
	let token = normalize_word(word, lang);
	if token.is_empty() {
		return None;
	}
	category_words(lang)
		.iter()
		.find(|(_, words)| words.contains(&token.as_str()))
		.map(|(category, _)| *category)
}
