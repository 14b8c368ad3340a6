// Platform metadata backing the registry startup function.

use serde::Serialize;

/// Broad platform grouping, used by reporting layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformCategory {
    Streaming,
    Social,
    Regional,
    Gaming,
    Other,
}

/// Static metadata for one supported platform.
#[derive(Debug, Clone, Serialize)]
pub struct PlatformInfo {
    pub name: &'static str,
    pub display_name: &'static str,
    pub category: PlatformCategory,
    pub priority: u8,
}

/// All platforms shipped with built-in detectors.
pub const PLATFORMS: &[PlatformInfo] = &[
    PlatformInfo {
        name: "Netflix",
        display_name: "Netflix",
        category: PlatformCategory::Streaming,
        priority: 1,
    },
    PlatformInfo {
        name: "YouTube",
        display_name: "YouTube Premium",
        category: PlatformCategory::Streaming,
        priority: 1,
    },
    PlatformInfo {
        name: "Disney+",
        display_name: "Disney Plus",
        category: PlatformCategory::Streaming,
        priority: 2,
    },
    PlatformInfo {
        name: "ChatGPT",
        display_name: "OpenAI ChatGPT",
        category: PlatformCategory::Social,
        priority: 1,
    },
    PlatformInfo {
        name: "Spotify",
        display_name: "Spotify",
        category: PlatformCategory::Streaming,
        priority: 2,
    },
    PlatformInfo {
        name: "Bilibili",
        display_name: "Bilibili",
        category: PlatformCategory::Regional,
        priority: 3,
    },
];

/// Default probe set used when a sweep names no platforms.
pub fn default_platforms() -> Vec<String> {
    PLATFORMS.iter().map(|p| p.name.to_owned()).collect()
}

/// Look up static metadata for a platform name.
pub fn platform_info(name: &str) -> Option<&'static PlatformInfo> {
    PLATFORMS.iter().find(|p| p.name == name)
}

/// Dispatch priority for a platform, from the metadata table. The
/// built-in detectors all read their priority from here so the table
/// and the detectors cannot diverge.
pub fn priority_for(name: &str) -> u8 {
    platform_info(name).map_or(crate::detector::DEFAULT_PRIORITY, |p| p.priority)
}

/// Platforms in a given category.
pub fn platforms_by_category(category: PlatformCategory) -> Vec<&'static str> {
    PLATFORMS
        .iter()
        .filter(|p| p.category == category)
        .map(|p| p.name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_info_lookup() {
        assert_eq!(platform_info("Netflix").map(|p| p.priority), Some(1));
        assert!(platform_info("NoSuchPlatform").is_none());
    }

    #[test]
    fn priority_falls_back_for_unknown_platforms() {
        assert_eq!(priority_for("Netflix"), 1);
        assert_eq!(
            priority_for("NoSuchPlatform"),
            crate::detector::DEFAULT_PRIORITY
        );
    }

    #[test]
    fn category_filter() {
        let regional = platforms_by_category(PlatformCategory::Regional);
        assert_eq!(regional, vec!["Bilibili"]);
    }
}
