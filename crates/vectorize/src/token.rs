use std::borrow::Cow;

use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

/// Split `text` into UAX #29 words. Punctuation and whitespace never form a
/// token. With `normalize_unicode` the words come from the NFKC form.
pub fn tokenize(text: &str, lowercase: bool, normalize_unicode: bool) -> Vec<String> {
    let normalized: Cow<str> = if normalize_unicode {
        Cow::Owned(text.nfkc().collect::<String>())
    } else {
        Cow::Borrowed(text)
    };

    normalized
        .unicode_words()
        .map(|word| {
            if lowercase {
                word.to_lowercase()
            } else {
                word.to_string()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_words_and_drops_punctuation() {
        let tokens = tokenize("Gene expression, in vivo.", true, false);
        assert_eq!(tokens, vec!["gene", "expression", "in", "vivo"]);
    }

    #[test]
    fn lowercasing_is_optional() {
        let tokens = tokenize("CRISPR Cas9", false, false);
        assert_eq!(tokens[0], "CRISPR");
        assert_eq!(tokens[1], "Cas9");
    }

    #[test]
    fn nfkc_folds_compatibility_forms() {
        let tokens = tokenize("ﬁsh", true, true);
        assert_eq!(tokens[0], "fish");
    }

    #[test]
    fn empty_and_whitespace_yield_nothing() {
        assert!(tokenize("", true, false).is_empty());
        assert!(tokenize("  \n\t ", true, false).is_empty());
    }
}
