//! Deterministic rule-based parser
//!
//! Keyword routing plus regex address extraction. The address patterns are
//! tried in order: civic street address, Canadian postal code, known city
//! name, street intersection.

use crate::{ParsedQuery, QueryParser};
use async_trait::async_trait;
use lotwise_core::{CoreError, QueryKind, Result};
use regex::Regex;

/// Cities recognized as bare address text.
const KNOWN_CITIES: [&str; 9] = [
    "Vancouver",
    "West Vancouver",
    "North Vancouver",
    "Burnaby",
    "Richmond",
    "Surrey",
    "Coquitlam",
    "Delta",
    "Langley",
];

/// Keyword groups per query kind, checked in a fixed order so overlapping
/// phrasings resolve the same way every time.
const KEYWORD_ROUTES: [(QueryKind, &[&str]); 10] = [
    (QueryKind::SchoolCatchment, &["catchment"]),
    (QueryKind::NearbySchools, &["school"]),
    (
        QueryKind::TransitRoutesDowntown,
        &["downtown", "route to", "routes to"],
    ),
    (
        QueryKind::NearestTransit,
        &["transit", "bus", "skytrain", "train station"],
    ),
    (
        QueryKind::NearbyAmenities,
        &["park", "community centre", "community center", "amenit", "recreation"],
    ),
    (
        QueryKind::NeighbourhoodAssessment,
        &["average assess", "neighbourhood assess", "neighborhood assess"],
    ),
    (
        QueryKind::Assessment,
        &["assess", "property value", "worth"],
    ),
    (QueryKind::Zoning, &["zoning", "zone"]),
    (
        QueryKind::Demographics,
        &["demographic", "population", "median income", "median age"],
    ),
    (
        QueryKind::LotInfo,
        &["lot size", "year built", "how old", "square feet", "sqft"],
    ),
];

pub struct RuleParser {
    street: Regex,
    postal: Regex,
    intersection: Regex,
}

impl Default for RuleParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleParser {
    pub fn new() -> Self {
        // Civic number + street words, with an optional suffix like St/Ave.
        let street = Regex::new(
            r"(?i)\b\d{1,5}\s+[A-Za-z0-9]+(?:\s[A-Za-z0-9]+){0,4}\b(?:\s(?:St|Street|Avenue|Ave|Rd|Road|Blvd|Boulevard|Lane|Ln|Drive|Dr|Court|Ct|Way))?",
        )
        .expect("street pattern is valid");

        let postal = Regex::new(
            r"(?i)\b[ABCEGHJKLMNPRSTVXY]\d[ABCEGHJKLMNPRSTVWXYZ][ -]?\d[ABCEGHJKLMNPRSTVWXYZ]\d\b",
        )
        .expect("postal pattern is valid");

        let intersection =
            Regex::new(r"\b([A-Za-z0-9]+)\s*&\s*([A-Za-z0-9]+)\b").expect("pattern is valid");

        Self {
            street,
            postal,
            intersection,
        }
    }

    /// Extract address text from a question, or empty when nothing matches.
    pub fn extract_address(&self, text: &str) -> String {
        if let Some(m) = self.street.find(text) {
            return m.as_str().to_string();
        }

        if let Some(m) = self.postal.find(text) {
            return m.as_str().to_string();
        }

        let lower = text.to_lowercase();
        for city in KNOWN_CITIES {
            if lower.contains(&city.to_lowercase()) {
                return city.to_string();
            }
        }

        if let Some(m) = self.intersection.find(text) {
            return m.as_str().to_string();
        }

        String::new()
    }

    /// Route a question to a query kind by keyword, or `None` when the
    /// question is outside the supported set.
    pub fn route(&self, text: &str) -> Option<QueryKind> {
        let lower = text.to_lowercase();
        KEYWORD_ROUTES
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
            .map(|(kind, _)| *kind)
    }
}

#[async_trait]
impl QueryParser for RuleParser {
    async fn parse(&self, text: &str) -> Result<ParsedQuery> {
        let kind = self.route(text).ok_or_else(|| {
            CoreError::ValidationError(
                "Unsupported question. Try asking about schools, transit, parks, zoning, \
                 demographics, or assessment value."
                    .to_string(),
            )
        })?;

        let address = self.extract_address(text);
        if address.is_empty() {
            return Err(CoreError::ValidationError(
                "No address found in question".to_string(),
            ));
        }

        Ok(ParsedQuery { kind, address })
    }
}
