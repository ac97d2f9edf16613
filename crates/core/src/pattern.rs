/// Canonicalises a raw merchant/description string into a pattern key.
///
/// ASCII digits are stripped before trimming so that a trailing store
/// number (`"woolworths 1234"`) does not leave trailing whitespace behind.
/// Remaining whitespace runs collapse to a single space.
pub fn normalize(raw: &str) -> String {
    let stripped: String = raw.chars().filter(|c| !c.is_ascii_digit()).collect();
    stripped
        .to_uppercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_store_number() {
        assert_eq!(normalize("woolworths 1234"), "WOOLWORTHS");
    }

    #[test]
    fn collapses_internal_whitespace() {
        assert_eq!(normalize("  uber   eats\t sydney "), "UBER EATS SYDNEY");
    }

    #[test]
    fn digits_inside_words_are_removed() {
        assert_eq!(normalize("7eleven 042"), "ELEVEN");
        assert_eq!(normalize("ABC123"), normalize("abc"));
    }

    #[test]
    fn removing_digits_can_merge_whitespace_runs() {
        assert_eq!(normalize("COLES 0123 METRO"), "COLES METRO");
    }

    #[test]
    fn empty_and_digit_only_inputs_normalize_to_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize("12 34 56"), "");
    }

    #[test]
    fn idempotent() {
        for raw in [
            "woolworths 1234",
            "  Netflix.com  ",
            "PAYPAL *STEAM 4029357733",
            "café 9 crème",
            "",
        ] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "input {raw:?}");
        }
    }

    #[test]
    fn keeps_punctuation_and_non_ascii() {
        assert_eq!(normalize("amzn mktp*2k4"), "AMZN MKTP*K");
        assert_eq!(normalize("café"), "CAFÉ");
    }
}
