//! Script detection for the orchestrator's translation pre-step
//! (spec.md §4.1): "contains non-ASCII characters above U+00FF or matches a
//! non-Latin script".

/// True when `text` has at least one character outside Basic Latin-1
/// (U+0000-U+00FF) that isn't punctuation/whitespace — i.e. the query is
/// plausibly not plain English/Western-European text and should be routed
/// through the translation pre-step before Understanding.
pub fn needs_translation(text: &str) -> bool {
    text.chars()
        .any(|c| (c as u32) > 0x00FF && !c.is_whitespace() && !c.is_ascii_punctuation())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_query_does_not_need_translation() {
        assert!(!needs_translation("What is the interest rate?"));
    }

    #[test]
    fn latin1_accented_text_does_not_need_translation() {
        assert!(!needs_translation("Qu'est-ce que le crédit?"));
    }

    #[test]
    fn devanagari_query_needs_translation() {
        assert!(needs_translation("सोने का कर्ज़ क्या है?"));
    }

    #[test]
    fn cjk_query_needs_translation() {
        assert!(needs_translation("这是什么?"));
    }
}
