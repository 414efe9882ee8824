// 🔤 Label Normalizer - Comparable keys from free-text sync pair labels
//
// Two strictness levels:
//   normalize        → "Red & Pikachu!"        → "red and pikachu"
//   normalize_loose  → "Lear Other Form & ..." → stop words removed
//
// Both are pure, total and idempotent.

// ============================================================================
// STOP WORDS (loose normalization only)
// ============================================================================

/// Cosmetic qualifiers that transcribers add or omit freely
/// (alternate form, dynamax/tera states, uniforms)
pub const LOOSE_STOP_WORDS: &[&str] = &[
    "other",
    "form",
    "dynamax",
    "gigantamax",
    "terastallization",
    "tera",
    "uniform",
];

// ============================================================================
// NORMALIZERS
// ============================================================================

/// Exact key: lowercase, `&` → "and", non `[a-z0-9 ]` → space, collapsed
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());

    for c in text.to_lowercase().chars() {
        match c {
            '&' => out.push_str(" and "),
            'a'..='z' | '0'..='9' => out.push(c),
            _ => out.push(' '),
        }
    }

    collapse_whitespace(&out)
}

/// Loose key: exact key minus cosmetic stop words
pub fn normalize_loose(text: &str) -> String {
    normalize(text)
        .split(' ')
        .filter(|word| !word.is_empty() && !LOOSE_STOP_WORDS.contains(word))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Remove digit runs ("Sygna Suit 2" → "Sygna Suit"), collapse whitespace
pub fn strip_digits(text: &str) -> String {
    let without: String = text.chars().filter(|c| !c.is_ascii_digit()).collect();
    collapse_whitespace(&without)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_basic() {
        assert_eq!(normalize("Red & Pikachu"), "red and pikachu");
        assert_eq!(normalize("  Lear (Sygna Suit)  &  Hoopa "), "lear sygna suit and hoopa");
        assert_eq!(normalize("Palentine's Cynthia"), "palentine s cynthia");
        assert_eq!(normalize("N&Zekrom"), "n and zekrom");
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize("!!!"), "");
        assert_eq!(normalize_loose(""), "");
    }

    #[test]
    fn test_normalize_keeps_digits() {
        assert_eq!(normalize("Rosa (Sygna Suit 2)"), "rosa sygna suit 2");
    }

    #[test]
    fn test_normalize_loose_removes_stop_words() {
        assert_eq!(normalize_loose("Lillie Other Form & Clefairy"), "lillie and clefairy");
        assert_eq!(normalize_loose("Leon Dynamax & Charizard"), "leon and charizard");
        assert_eq!(normalize_loose("Nemona (Tera) & Pawmot"), "nemona and pawmot");
        assert_eq!(normalize_loose("Hilbert Dojo Uniform"), "hilbert dojo");
    }

    #[test]
    fn test_normalize_loose_whole_words_only() {
        // "formal" and "terapagos" are not stop words
        assert_eq!(normalize_loose("Formal Terapagos"), "formal terapagos");
    }

    #[test]
    fn test_strip_digits() {
        assert_eq!(strip_digits("Sygna Suit 2"), "Sygna Suit");
        assert_eq!(strip_digits("Red 2 & Pikachu"), "Red & Pikachu");
        assert_eq!(strip_digits("123"), "");
    }

    proptest! {
        #[test]
        fn test_normalize_idempotent(s in ".{0,40}") {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn test_normalize_loose_idempotent(s in ".{0,40}") {
            let once = normalize_loose(&s);
            prop_assert_eq!(normalize_loose(&once), once);
        }
    }
}
