//! Strategy selection for intercepted requests.
//!
//! The table is an ordered list of `(pattern, strategy)` pairs. Groups are
//! laid out cache-first, network-first, network-only, cache-only,
//! stale-while-revalidate; the first matching pattern wins and anything
//! unmatched is network-first.

use axioma_core::{Error, StrategyPatterns};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// How a request is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    CacheFirst,
    NetworkFirst,
    NetworkOnly,
    CacheOnly,
    StaleWhileRevalidate,
}

impl Strategy {
    /// Evaluation order of pattern groups.
    pub const PRECEDENCE: [Strategy; 5] = [
        Strategy::CacheFirst,
        Strategy::NetworkFirst,
        Strategy::NetworkOnly,
        Strategy::CacheOnly,
        Strategy::StaleWhileRevalidate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::CacheFirst => "cache-first",
            Strategy::NetworkFirst => "network-first",
            Strategy::NetworkOnly => "network-only",
            Strategy::CacheOnly => "cache-only",
            Strategy::StaleWhileRevalidate => "stale-while-revalidate",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered pattern → strategy table.
#[derive(Debug, Clone)]
pub struct StrategyTable {
    rules: Vec<(Regex, Strategy)>,
}

impl Default for StrategyTable {
    fn default() -> Self {
        // The built-in patterns are known to compile.
        Self::from_patterns(&StrategyPatterns::default()).unwrap_or(Self { rules: Vec::new() })
    }
}

impl StrategyTable {
    /// Compile the configured pattern groups in precedence order.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming the first pattern that fails to compile.
    pub fn from_patterns(patterns: &StrategyPatterns) -> Result<Self, Error> {
        let mut rules = Vec::new();
        for strategy in Strategy::PRECEDENCE {
            let group = match strategy {
                Strategy::CacheFirst => &patterns.cache_first,
                Strategy::NetworkFirst => &patterns.network_first,
                Strategy::NetworkOnly => &patterns.network_only,
                Strategy::CacheOnly => &patterns.cache_only,
                Strategy::StaleWhileRevalidate => &patterns.stale_while_revalidate,
            };
            for pattern in group {
                let regex = Regex::new(pattern)
                    .map_err(|e| Error::Config(format!("invalid {strategy} pattern '{pattern}': {e}")))?;
                rules.push((regex, strategy));
            }
        }
        Ok(Self { rules })
    }

    /// Pick the strategy for a full request URL.
    pub fn classify(&self, url: &str) -> Strategy {
        self.rules
            .iter()
            .find(|(regex, _)| regex.is_match(url))
            .map_or(Strategy::NetworkFirst, |(_, strategy)| *strategy)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(path: &str) -> Strategy {
        StrategyTable::default().classify(&format!("https://axioma.example{path}"))
    }

    #[test]
    fn test_default_table_compiles() {
        let table = StrategyTable::default();
        assert_eq!(table.len(), 17);
    }

    #[test]
    fn test_static_assets_are_cache_first() {
        assert_eq!(classify("/css/main.css"), Strategy::CacheFirst);
        assert_eq!(classify("/js/modules/FormManager.js"), Strategy::CacheFirst);
        assert_eq!(classify("/fonts/inter.woff2"), Strategy::CacheFirst);
        assert_eq!(classify("/fonts/inter.woff"), Strategy::CacheFirst);
        assert_eq!(classify("/fonts/inter.ttf"), Strategy::CacheFirst);
    }

    #[test]
    fn test_api_and_json_are_network_first() {
        assert_eq!(classify("/api/contact"), Strategy::NetworkFirst);
        assert_eq!(classify("/data/rates.json"), Strategy::NetworkFirst);
    }

    #[test]
    fn test_auth_and_payment_are_network_only() {
        assert_eq!(classify("/auth/login"), Strategy::NetworkOnly);
        assert_eq!(classify("/payment/checkout"), Strategy::NetworkOnly);
    }

    #[test]
    fn test_offline_page_is_cache_only() {
        assert_eq!(classify("/offline.html"), Strategy::CacheOnly);
    }

    #[test]
    fn test_images_are_stale_while_revalidate() {
        for path in ["/a.jpg", "/a.jpeg", "/a.png", "/a.gif", "/a.svg", "/a.webp"] {
            assert_eq!(classify(path), Strategy::StaleWhileRevalidate, "{path}");
        }
    }

    #[test]
    fn test_unmatched_defaults_to_network_first() {
        assert_eq!(classify("/"), Strategy::NetworkFirst);
        assert_eq!(classify("/about"), Strategy::NetworkFirst);
    }

    #[test]
    fn test_earlier_group_wins() {
        // matches both `/api/` (network-first) and `\.js$` (cache-first)
        assert_eq!(classify("/api/widget.js"), Strategy::CacheFirst);
        // matches both `\.json$` (network-first) and `/auth/` (network-only)
        assert_eq!(classify("/auth/session.json"), Strategy::NetworkFirst);
    }

    #[test]
    fn test_query_string_defeats_suffix_match() {
        assert_eq!(classify("/css/main.css?v=2"), Strategy::NetworkFirst);
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let patterns = StrategyPatterns { cache_only: vec!["(".to_string()], ..Default::default() };
        let result = StrategyTable::from_patterns(&patterns);
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("cache-only")));
    }
}
