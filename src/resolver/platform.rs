// Source platform detection

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported source platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Youtube,
    Tiktok,
    Instagram,
    Twitter,
    Unknown,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Self::Youtube,
        Self::Tiktok,
        Self::Instagram,
        Self::Twitter,
        Self::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Youtube => "youtube",
            Self::Tiktok => "tiktok",
            Self::Instagram => "instagram",
            Self::Twitter => "twitter",
            Self::Unknown => "unknown",
        }
    }

    /// Detect the platform from a URL's host, `Unknown` when nothing matches
    pub fn detect(url: &str) -> Self {
        let Some(host) = host_of(url) else {
            return Self::Unknown;
        };
        let on = |domain: &str| host == domain || host.ends_with(&format!(".{}", domain));

        if on("youtube.com") || on("youtu.be") {
            return Self::Youtube;
        }

        if on("tiktok.com") {
            return Self::Tiktok;
        }

        if on("instagram.com") || on("instagr.am") {
            return Self::Instagram;
        }

        if on("twitter.com") || on("x.com") {
            return Self::Twitter;
        }

        Self::Unknown
    }

    /// Caller hint wins, else the URL decides
    pub fn resolve(url: &str, hint: Option<Platform>) -> Self {
        match hint {
            Some(platform) => platform,
            None => Self::detect(url),
        }
    }
}

/// Lowercased host; scheme-less links like `tiktok.com/@user` are accepted
fn host_of(url: &str) -> Option<String> {
    let trimmed = url.trim();
    let parsed = Url::parse(trimmed)
        .ok()
        .filter(|u| u.has_host())
        .or_else(|| Url::parse(&format!("https://{}", trimmed)).ok())?;

    parsed.host_str().map(|h| h.trim_end_matches('.').to_lowercase())
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "youtube" => Ok(Self::Youtube),
            "tiktok" => Ok(Self::Tiktok),
            "instagram" => Ok(Self::Instagram),
            "twitter" | "x" => Ok(Self::Twitter),
            "unknown" => Ok(Self::Unknown),
            other => Err(format!("Unknown platform: {}", other)),
        }
    }
}
