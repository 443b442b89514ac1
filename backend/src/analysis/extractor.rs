use shared::Confidence;

/// Phrases that mean the model saw two different people. Any one of them
/// decides the verdict outright.
const DIFFERENT_PEOPLE_PHRASES: [&str; 5] = [
    "different people",
    "not the same person",
    "completely different",
    "two different individuals",
    "different individuals",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extraction {
    pub is_deepfake: bool,
    pub confidence: Confidence,
}

/// Reads a yes/no determination and a confidence band out of the model's
/// free-text answer with ordered substring rules; the first rule that matches
/// wins. Matching is plain `contains` on the lower-cased text, so phrases
/// echoed from the prompt count the same as the model's own conclusion.
pub fn extract(response_text: &str) -> Extraction {
    let text = response_text.to_lowercase();

    if DIFFERENT_PEOPLE_PHRASES
        .iter()
        .any(|phrase| text.contains(phrase))
    {
        return Extraction {
            is_deepfake: true,
            confidence: Confidence::High,
        };
    }

    if text.contains("same person") && text.contains("not a deepfake") {
        let confidence = if text.contains("high confidence") {
            Confidence::High
        } else {
            Confidence::Medium
        };
        return Extraction {
            is_deepfake: false,
            confidence,
        };
    }

    // Anything else, including the "no" + "not a deepfake" case, stays false.
    let is_deepfake =
        text.contains("yes") && (text.contains("deepfake") || text.contains("manipulated"));

    Extraction {
        is_deepfake,
        confidence: scan_confidence(&text),
    }
}

fn scan_confidence(text: &str) -> Confidence {
    if text.contains("high confidence") {
        Confidence::High
    } else if text.contains("medium confidence") {
        Confidence::Medium
    } else if text.contains("low confidence") {
        Confidence::Low
    } else {
        Confidence::Medium
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(is_deepfake: bool, confidence: Confidence) -> Extraction {
        Extraction {
            is_deepfake,
            confidence,
        }
    }

    #[test]
    fn different_people_phrases_dominate_everything() {
        for phrase in DIFFERENT_PEOPLE_PHRASES {
            let text = format!(
                "Both photos could be the same person. Not a deepfake, low confidence. \
                 On closer look these are {}.",
                phrase.to_uppercase()
            );
            assert_eq!(extract(&text), verdict(true, Confidence::High), "{}", phrase);
        }
    }

    #[test]
    fn same_person_not_deepfake_with_high_confidence() {
        let text = "These images show the same person. This is not a deepfake. High confidence.";
        assert_eq!(extract(text), verdict(false, Confidence::High));
    }

    #[test]
    fn same_person_not_deepfake_defaults_to_medium() {
        let text = "Same person in both. Not a deepfake. Low confidence.";
        assert_eq!(extract(text), verdict(false, Confidence::Medium));
    }

    #[test]
    fn yes_with_manipulated_is_positive() {
        let text = "Determination: Yes, the second image appears manipulated around the jaw.";
        assert_eq!(extract(text), verdict(true, Confidence::Medium));
    }

    #[test]
    fn yes_with_deepfake_picks_up_low_confidence() {
        let text = "1. Deepfake: yes\n2. Confidence: low confidence";
        assert_eq!(extract(text), verdict(true, Confidence::Low));
    }

    #[test]
    fn no_with_not_a_deepfake_is_negative() {
        let text = "Answer: no. The image is not a deepfake (medium confidence).";
        assert_eq!(extract(text), verdict(false, Confidence::Medium));
    }

    #[test]
    fn high_confidence_beats_lower_labels_in_fallback() {
        let text = "Yes, manipulated. Initially low confidence, final answer with high confidence.";
        assert_eq!(extract(text), verdict(true, Confidence::High));
    }

    #[test]
    fn unmatched_text_falls_back_to_negative_medium() {
        assert_eq!(extract("I cannot tell."), verdict(false, Confidence::Medium));
        assert_eq!(extract(""), verdict(false, Confidence::Medium));
    }

    #[test]
    fn substring_matching_is_not_word_aware() {
        // "eyes" contains "yes": the rules do not look at word boundaries.
        let text = "The eyes look manipulated.";
        assert_eq!(extract(text), verdict(true, Confidence::Medium));
    }
}
