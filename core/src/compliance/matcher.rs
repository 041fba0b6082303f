use crate::config::ProtocolSet;
use crate::types::Protocol;
use log::debug;

/// A stored protocol resolved from a device-reported label
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchedProtocol<'a> {
    /// Configured protocol name
    pub name: &'a str,
    pub protocol: &'a Protocol,
}

/// Resolves raw device protocol labels to configured protocols
///
/// Protocols are tried in stored order; the first one with any match
/// pattern contained (case-insensitively) in the label wins. Overlapping
/// patterns are left to whoever authors the configuration.
#[derive(Debug, Clone, Copy)]
pub struct ProtocolMatcher<'a> {
    protocols: &'a ProtocolSet,
}

impl<'a> ProtocolMatcher<'a> {
    pub fn new(protocols: &'a ProtocolSet) -> Self {
        Self { protocols }
    }

    /// Finds the first protocol recognising `raw_label`
    ///
    /// Returns `None` when nothing matches; that is not an error.
    pub fn find(&self, raw_label: &str) -> Option<MatchedProtocol<'a>> {
        let label = raw_label.to_lowercase();

        for (name, protocol) in self.protocols.iter() {
            let hit = protocol
                .match_patterns()
                .iter()
                .map(|p| p.trim())
                .filter(|p| !p.is_empty())
                .any(|p| label.contains(&p.to_lowercase()));

            if hit {
                debug!("Label '{}' matched protocol '{}'", raw_label, name);
                return Some(MatchedProtocol { name, protocol });
            }
        }

        debug!("No protocol matches label '{}'", raw_label);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CtProtocol, CtReference, OrderedMap};

    fn ct(patterns: &[&str]) -> Protocol {
        Protocol::Ct(CtProtocol {
            match_patterns: patterns.iter().map(|p| p.to_string()).collect(),
            adult: CtReference {
                dlp: 500.0,
                ctdi_vol: 12.0,
            },
            child: OrderedMap::new(),
        })
    }

    #[test]
    fn test_earlier_protocol_wins_on_overlap() {
        let mut protocols = ProtocolSet::new();
        protocols.insert("A", ct(&["chest", "thorax"]));
        protocols.insert("B", ct(&["chest ct"]));

        let matched = ProtocolMatcher::new(&protocols)
            .find("CHEST CT ROUTINE")
            .unwrap();
        assert_eq!(matched.name, "A");
    }

    #[test]
    fn test_match_is_case_insensitive_substring() {
        let mut protocols = ProtocolSet::new();
        protocols.insert("Head", ct(&["Brain"]));

        let matcher = ProtocolMatcher::new(&protocols);
        assert_eq!(matcher.find("1.2 routine BRAIN w/o").unwrap().name, "Head");
        assert!(matcher.find("Abdomen").is_none());
    }

    #[test]
    fn test_any_pattern_of_a_protocol_matches() {
        let mut protocols = ProtocolSet::new();
        protocols.insert("Head", ct(&["head"]));
        protocols.insert("Thorax", ct(&["chest", "thorax", "lung"]));

        let matched = ProtocolMatcher::new(&protocols).find("LUNG LOW DOSE").unwrap();
        assert_eq!(matched.name, "Thorax");
    }

    #[test]
    fn test_blank_patterns_never_match() {
        let mut protocols = ProtocolSet::new();
        protocols.insert("Empty", ct(&["", "  "]));

        assert!(ProtocolMatcher::new(&protocols).find("anything").is_none());
    }

    #[test]
    fn test_empty_configuration() {
        let protocols = ProtocolSet::new();
        assert!(ProtocolMatcher::new(&protocols).find("HEAD").is_none());
    }
}
