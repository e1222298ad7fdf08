// Watermark signature - normalized forms of the forbidden marking

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NON_ALNUM_RE: Regex = Regex::new(r"[^a-z0-9]").unwrap();
}

/// Lowercase and strip everything except ASCII letters and digits
pub fn normalize_text(text: &str) -> String {
    NON_ALNUM_RE
        .replace_all(&text.to_lowercase(), "")
        .into_owned()
}

/// A known promotional marking, e.g. a mirror's domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatermarkSignature {
    pub raw: String,
    /// `ssstik.io` -> `ssstikio`
    pub normalized: String,
    /// `ssstik.io` -> `ssstik`; absent when it adds nothing over `normalized`
    pub core: Option<String>,
}

impl WatermarkSignature {
    /// Returns `None` when the marking has no letters or digits
    pub fn new(raw: &str) -> Option<Self> {
        let normalized = normalize_text(raw);
        if normalized.is_empty() {
            return None;
        }

        let compact: String = raw
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let leading = compact.split('.').next().unwrap_or_default();
        let core = normalize_text(leading);
        let core = (!core.is_empty() && core != normalized).then_some(core);

        Some(Self {
            raw: raw.to_string(),
            normalized,
            core,
        })
    }

    /// Test already-normalized text for either token
    pub fn matches_normalized(&self, cleaned: &str) -> bool {
        if cleaned.contains(&self.normalized) {
            return true;
        }
        match &self.core {
            Some(core) => cleaned.contains(core.as_str()),
            None => false,
        }
    }

    /// Normalize recognized text, then test it
    pub fn matches(&self, text: &str) -> bool {
        self.matches_normalized(&normalize_text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_tokens() {
        let sig = WatermarkSignature::new("ssstik.io").unwrap();
        assert_eq!(sig.normalized, "ssstikio");
        assert_eq!(sig.core.as_deref(), Some("ssstik"));
    }

    #[test]
    fn test_spaced_out_recognition_matches_core() {
        let sig = WatermarkSignature::new("ssstik.io").unwrap();
        let text = "s s s t i k . i o watermark";

        assert_eq!(normalize_text(text), "ssstikiowatermark");
        assert!(sig.matches(text));
    }

    #[test]
    fn test_core_tolerates_noisy_suffix() {
        let sig = WatermarkSignature::new("ssstik.io").unwrap();
        assert!(sig.matches("Downloaded via SSSTIK.1O"));
        assert!(!sig.matches("a cat video\n@someone"));
    }

    #[test]
    fn test_signature_without_separator() {
        let sig = WatermarkSignature::new("SnapTik").unwrap();
        assert_eq!(sig.normalized, "snaptik");
        assert_eq!(sig.core, None);
        assert!(sig.matches("snap tik"));
    }

    #[test]
    fn test_empty_signature_rejected() {
        assert!(WatermarkSignature::new("  ...  ").is_none());
    }
}
