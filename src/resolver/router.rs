// Platform router - ordered strategy table per platform
//
// Strategy order per platform:
// 1. Platform-native provider first (cheapest, most accurate metadata)
// 2. Universal yt-dlp provider as the last resort
//
// TikTok strategies are validated against the watermark signature because
// some upstream mirrors stamp their domain into the video.

use std::collections::HashMap;

use super::platform::Platform;

/// Provider identifiers used by the default table
pub mod provider_ids {
    pub const YT_DLP: &str = "yt-dlp";
    pub const YOUTUBE_NATIVE: &str = "youtube-native";
    pub const TIKTOK_V1: &str = "tiktok-v1";
    pub const TIKTOK_V2: &str = "tiktok-v2";
    pub const INSTAGRAM_NATIVE: &str = "instagram-native";
    pub const TWITTER_NATIVE: &str = "twitter-native";
}

use provider_ids::*;

/// One way to extract media for a platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strategy {
    pub platform: Platform,
    pub provider: &'static str,
    /// Lower is tried first
    pub priority: u8,
    /// Always >= 1
    pub max_attempts: u32,
    /// Whether candidates go through watermark validation
    pub validate: bool,
}

impl Strategy {
    pub fn new(platform: Platform, provider: &'static str, priority: u8) -> Self {
        Self {
            platform,
            provider,
            priority,
            max_attempts: 1,
            validate: false,
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn validated(mut self) -> Self {
        self.validate = true;
        self
    }
}

/// Maps a platform to its ordered strategies
#[derive(Debug, Clone)]
pub struct PlatformRouter {
    table: HashMap<Platform, Vec<Strategy>>,
}

impl PlatformRouter {
    /// Router with no platform entries; everything routes to the universal strategy
    pub fn empty() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    /// Replace the strategies for a platform
    pub fn with_strategies(mut self, platform: Platform, mut strategies: Vec<Strategy>) -> Self {
        strategies.sort_by_key(|s| s.priority);
        self.table.insert(platform, strategies);
        self
    }

    /// Ordered strategies for a platform, lowest priority value first
    pub fn route(&self, platform: Platform) -> Vec<Strategy> {
        match self.table.get(&platform) {
            Some(strategies) if !strategies.is_empty() => strategies.clone(),
            _ => vec![Self::universal(platform)],
        }
    }

    /// Single unvalidated yt-dlp attempt
    pub fn universal(platform: Platform) -> Strategy {
        Strategy::new(platform, YT_DLP, 0)
    }
}

impl Default for PlatformRouter {
    fn default() -> Self {
        use Platform::*;

        Self::empty()
            .with_strategies(
                Youtube,
                vec![
                    Strategy::new(Youtube, YOUTUBE_NATIVE, 0),
                    Strategy::new(Youtube, YT_DLP, 1),
                ],
            )
            .with_strategies(
                Tiktok,
                vec![
                    Strategy::new(Tiktok, TIKTOK_V2, 0)
                        .with_max_attempts(2)
                        .validated(),
                    Strategy::new(Tiktok, TIKTOK_V1, 1).validated(),
                    Strategy::new(Tiktok, YT_DLP, 2).validated(),
                ],
            )
            .with_strategies(
                Instagram,
                vec![
                    Strategy::new(Instagram, INSTAGRAM_NATIVE, 0),
                    Strategy::new(Instagram, YT_DLP, 1),
                ],
            )
            .with_strategies(
                Twitter,
                vec![
                    Strategy::new(Twitter, TWITTER_NATIVE, 0),
                    Strategy::new(Twitter, YT_DLP, 1),
                ],
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_routes_to_universal() {
        let router = PlatformRouter::default();
        let strategies = router.route(Platform::Unknown);

        assert_eq!(strategies.len(), 1);
        assert_eq!(strategies[0].provider, YT_DLP);
        assert_eq!(strategies[0].max_attempts, 1);
        assert!(!strategies[0].validate);
    }

    #[test]
    fn test_tiktok_table() {
        let router = PlatformRouter::default();
        let providers: Vec<_> = router
            .route(Platform::Tiktok)
            .iter()
            .map(|s| (s.provider, s.max_attempts, s.validate))
            .collect();

        assert_eq!(
            providers,
            vec![(TIKTOK_V2, 2, true), (TIKTOK_V1, 1, true), (YT_DLP, 1, true)]
        );
    }

    #[test]
    fn test_strategies_sorted_by_priority() {
        let router = PlatformRouter::empty().with_strategies(
            Platform::Twitter,
            vec![
                Strategy::new(Platform::Twitter, YT_DLP, 5),
                Strategy::new(Platform::Twitter, TWITTER_NATIVE, 1),
            ],
        );
        let order: Vec<_> = router
            .route(Platform::Twitter)
            .iter()
            .map(|s| s.priority)
            .collect();

        assert_eq!(order, vec![1, 5]);
    }

    #[test]
    fn test_attempt_budget_never_zero() {
        let strategy = Strategy::new(Platform::Tiktok, TIKTOK_V1, 0).with_max_attempts(0);
        assert_eq!(strategy.max_attempts, 1);
    }
}
