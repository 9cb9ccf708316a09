use std::fmt;

use serde::{Deserialize, Serialize};

/// Build metadata captured by `build.rs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    pub version: String,
    pub git_hash: String,
    pub build_profile: String,
    pub build_features: String,
    pub build_timestamp: String,
    pub rust_version: String,
    pub target: String,
}

impl BuildInfo {
    pub fn new() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            git_hash: option_env!("REPO_VERSION").unwrap_or("unknown").to_string(),
            build_profile: option_env!("BUILD_PROFILE").unwrap_or("unknown").to_string(),
            build_features: option_env!("BUILD_FEATURES").unwrap_or("none").to_string(),
            build_timestamp: option_env!("BUILD_TIMESTAMP")
                .unwrap_or("unknown")
                .to_string(),
            rust_version: option_env!("RUST_VERSION").unwrap_or("unknown").to_string(),
            target: option_env!("BUILD_TARGET").unwrap_or("unknown").to_string(),
        }
    }

    pub fn features(&self) -> Vec<&str> {
        if self.build_features == "none" {
            Vec::new()
        } else {
            self.build_features.split(',').map(str::trim).collect()
        }
    }

    pub fn short_hash(&self) -> &str {
        self.git_hash.get(..7).unwrap_or(&self.git_hash)
    }

    pub fn is_dirty(&self) -> bool {
        self.git_hash.ends_with("-dirty")
    }
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "gcs-drive {} ({}{}) {} build for {}, {}",
            self.version,
            self.short_hash(),
            if self.is_dirty() { ", dirty" } else { "" },
            self.build_profile,
            self.target,
            self.rust_version
        )
    }
}

pub fn build_info() -> BuildInfo {
    BuildInfo::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_info_creation() {
        let info = BuildInfo::new();
        assert_eq!(info.version, env!("CARGO_PKG_VERSION"));
        assert!(!info.git_hash.is_empty());
        assert!(info.to_string().contains(&info.version));
    }

    #[test]
    fn test_features_list() {
        let mut info = BuildInfo::new();
        info.build_features = "testkit, default".to_string();
        assert_eq!(info.features(), vec!["testkit", "default"]);

        info.build_features = "none".to_string();
        assert!(info.features().is_empty());
    }

    #[test]
    fn test_short_hash_and_dirty() {
        let mut info = BuildInfo::new();
        info.git_hash = "abc".to_string();
        assert_eq!(info.short_hash(), "abc");

        info.git_hash = "abcdef123456-dirty".to_string();
        assert_eq!(info.short_hash(), "abcdef1");
        assert!(info.is_dirty());
    }
}
