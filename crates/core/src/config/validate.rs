use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Downloads directory is set
/// - Fetcher tool path, timeout and quality ceiling are sane
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.downloads.dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "downloads.dir cannot be empty".to_string(),
        ));
    }

    if config.fetcher.yt_dlp_path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "fetcher.yt_dlp_path cannot be empty".to_string(),
        ));
    }

    if config.fetcher.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "fetcher.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.fetcher.max_video_height == 0 {
        return Err(ConfigError::ValidationError(
            "fetcher.max_video_height cannot be 0".to_string(),
        ));
    }

    Ok(())
}
