use crate::catalog::{catalog, PatternRule};

/// Every rule that matched a filename, in catalog order.
#[derive(Debug, Clone)]
pub struct Classification<'a> {
    matches: Vec<&'a PatternRule>,
}

impl<'a> Classification<'a> {
    /// Tag of the first matching rule.
    pub fn tag(&self) -> Option<&'static str> {
        self.matches.first().map(|r| r.tag())
    }

    pub fn winner(&self) -> Option<&'a PatternRule> {
        self.matches.first().copied()
    }

    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    pub fn is_ambiguous(&self) -> bool {
        self.matches.len() > 1
    }

    /// Matches that lost to the winner. Only useful for diagnostics.
    pub fn extra_matches(&self) -> &[&'a PatternRule] {
        self.matches.get(1..).unwrap_or(&[])
    }
}

/// Classify a bare filename against the built-in catalog.
pub fn classify(filename: &str) -> Classification<'static> {
    classify_with(catalog(), filename)
}

/// Classify against an arbitrary rule list. The whole list is always scanned
/// so that overlapping rules show up in the result.
pub fn classify_with<'a>(rules: &'a [PatternRule], filename: &str) -> Classification<'a> {
    let matches = rules.iter().filter(|r| r.is_match(filename)).collect();
    Classification { matches }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> Vec<PatternRule> {
        vec![
            PatternRule::new(r"FB_IMG_[0-9]{13}\.jpg", "Facebook").unwrap(),
            PatternRule::new(r".*[0-9]{13}\.jpg", "Timestamp").unwrap(),
            PatternRule::new(r"IMG_.*", "Camera").unwrap(),
        ]
    }

    #[test]
    fn test_first_match_wins() {
        let rules = rules();
        let c = classify_with(&rules, "FB_IMG_1497608469236.jpg");
        assert_eq!(c.tag(), Some("Facebook"));
        assert_eq!(c.match_count(), 2);
        assert!(c.is_ambiguous());
        assert_eq!(c.extra_matches().len(), 1);
        assert_eq!(c.extra_matches()[0].tag(), "Timestamp");
    }

    #[test]
    fn test_order_decides_not_specificity() {
        let mut rules = rules();
        rules.swap(0, 1);
        let c = classify_with(&rules, "FB_IMG_1497608469236.jpg");
        assert_eq!(c.tag(), Some("Timestamp"));
        assert_eq!(c.extra_matches()[0].tag(), "Facebook");
    }

    #[test]
    fn test_single_and_no_match() {
        let rules = rules();
        let c = classify_with(&rules, "IMG_0001.png");
        assert_eq!(c.tag(), Some("Camera"));
        assert!(!c.is_ambiguous());
        assert!(c.extra_matches().is_empty());

        let c = classify_with(&rules, "holiday.png");
        assert_eq!(c.tag(), None);
        assert_eq!(c.match_count(), 0);
        assert!(c.winner().is_none());
    }

    #[test]
    fn test_builtin_overlap() {
        // Messenger's "received_" rule and the generic Snapchat
        // "<name>_<13 digits>" rule both accept this name.
        let c = classify("received_1497370194791.jpg");
        assert_eq!(c.tag(), Some("Messenger"));
        assert_eq!(c.match_count(), 2);
        assert_eq!(c.extra_matches()[0].tag(), "Snapchat");
    }

    #[test]
    fn test_end_to_end_names() {
        assert_eq!(classify("IMG_20170630_140333_01.jpg").tag(), Some("Camera"));
        assert_eq!(classify("FB_IMG_1497608469236.jpg").tag(), Some("Facebook"));
        assert_eq!(classify("random_export.bin").tag(), None);
    }
}
