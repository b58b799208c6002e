//! Version and build metadata shown by `get_status` and the startup banner

use serde::Serialize;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    /// Counter kept by `build.rs`; 0 when built without it
    pub build_number: u64,
    pub build_timestamp: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            version: VERSION,
            build_number: option_env!("NUTRIEYEQ_BUILD_NUMBER")
                .and_then(|n| n.parse().ok())
                .unwrap_or(0),
            build_timestamp: option_env!("NUTRIEYEQ_BUILD_TIMESTAMP").unwrap_or("unknown"),
        }
    }

    fn banner(&self) -> String {
        format!(
            "NutriEyeQ Formulation Calculator v{} (build {}, compiled {})",
            self.version, self.build_number, self.build_timestamp
        )
    }
}

/// Print the startup banner to stderr
pub fn print_startup_banner() {
    eprintln!("{}", BuildInfo::current().banner());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_script_metadata_is_embedded() {
        let info = BuildInfo::current();
        assert!(info.build_number >= 1);
        assert_ne!(info.build_timestamp, "unknown");
        assert!(info.banner().contains(&format!("v{} (build {}", VERSION, info.build_number)));
    }
}
