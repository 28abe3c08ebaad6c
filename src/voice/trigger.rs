//! Trigger-phrase detection
//!
//! Detects assistant trigger phrases ("hey aria") in transcribed text and
//! strips them off, leaving the command portion. This is an explicit
//! preprocessing step applied by the driver before parsing — the parser
//! itself never looks for triggers.

/// Detects and strips trigger phrases in transcriptions
pub struct TriggerDetector {
    phrases: Vec<String>,
}

impl TriggerDetector {
    /// Create a detector over a list of trigger phrases
    ///
    /// Phrases are normalized to lowercase and trimmed.
    #[must_use]
    pub fn new(phrases: Vec<String>) -> Self {
        let normalized: Vec<String> = phrases
            .into_iter()
            .map(|p| p.to_lowercase().trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();

        tracing::debug!(phrases = ?normalized, "trigger detector initialized");

        Self { phrases: normalized }
    }

    /// Check whether the text contains any trigger phrase
    #[must_use]
    pub fn detect(&self, text: &str) -> bool {
        let normalized = text.to_lowercase();
        self.phrases.iter().any(|p| normalized.contains(p))
    }

    /// Strip the first trigger phrase, returning the command portion
    ///
    /// A leading phrase is removed from the front; a phrase in the middle
    /// removes everything up to and including the phrase. Returns `None` when
    /// no phrase is present.
    #[must_use]
    pub fn strip(&self, text: &str) -> Option<String> {
        let normalized = text.to_lowercase().trim().to_string();

        for phrase in &self.phrases {
            if let Some(rest) = normalized.strip_prefix(phrase.as_str()) {
                tracing::debug!(phrase = %phrase, "trigger phrase stripped");
                return Some(rest.trim_start_matches([' ', ',']).to_string());
            }
        }

        let (pos, phrase) = self
            .phrases
            .iter()
            .filter_map(|p| normalized.find(p.as_str()).map(|pos| (pos, p)))
            .min_by_key(|(pos, _)| *pos)?;

        tracing::debug!(phrase = %phrase, "trigger phrase stripped");
        Some(
            normalized[pos + phrase.len()..]
                .trim_start_matches([' ', ','])
                .to_string(),
        )
    }

    /// The configured trigger phrases
    #[must_use]
    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> TriggerDetector {
        TriggerDetector::new(vec!["hey aria".to_string(), "aria".to_string()])
    }

    #[test]
    fn test_normalization() {
        let d = TriggerDetector::new(vec!["  Hey ARIA  ".to_string(), String::new()]);
        assert_eq!(d.phrases(), &["hey aria"]);
    }

    #[test]
    fn test_detect_case_insensitive() {
        let d = detector();
        assert!(d.detect("Hey Aria, open github"));
        assert!(d.detect("HEY ARIA"));
        assert!(!d.detect("hello world"));
    }

    #[test]
    fn test_strip_leading_phrase() {
        let d = detector();
        assert_eq!(d.strip("hey aria open github").as_deref(), Some("open github"));
        assert_eq!(d.strip("Hey Aria, open github").as_deref(), Some("open github"));
    }

    #[test]
    fn test_strip_mid_text_phrase() {
        let d = detector();
        assert_eq!(
            d.strip("ok so hey aria set a timer for 5 minutes").as_deref(),
            Some("set a timer for 5 minutes")
        );
    }

    #[test]
    fn test_strip_longer_phrase_first() {
        // "hey aria" precedes "aria" in the list, so the full phrase wins
        let d = detector();
        assert_eq!(d.strip("hey aria open github").as_deref(), Some("open github"));
    }

    #[test]
    fn test_strip_without_phrase() {
        let d = detector();
        assert_eq!(d.strip("open github"), None);
    }
}
