//! Command-line flags and config-file loading for the `canhunt` binary.

use std::path::{Path, PathBuf};

use canhunt_core::GameConfig;
use clap::Parser;

use crate::CanhuntError;

/// Canhunt - kick the can with a flashlight, served over WebSocket
#[derive(Parser, Debug, Clone)]
#[command(name = "canhunt")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    pub bind: String,

    /// Simulation frames per second for every room
    #[arg(short, long, default_value = "60")]
    pub frame_rate: u32,

    /// JSON file with game tuning; missing fields keep their defaults
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Spectators allowed per room (0 = unlimited)
    #[arg(long, default_value = "8")]
    pub max_spectators: usize,

    /// Seconds of client silence before the connection is dropped (at most a day)
    #[arg(long, default_value = "15", value_parser = clap::value_parser!(u64).range(1..=86_400))]
    pub idle_timeout: u64,
}

/// Reads a [`GameConfig`] from a JSON file and validates it.
pub fn load_game_config(path: &Path) -> Result<GameConfig, CanhuntError> {
    let text = std::fs::read_to_string(path).map_err(|source| CanhuntError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let config: GameConfig = serde_json::from_str(&text).map_err(|source| CanhuntError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("canhunt-{}-{name}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["canhunt"]);
        assert_eq!(args.bind, "127.0.0.1:8080");
        assert_eq!(args.frame_rate, 60);
        assert!(args.config.is_none());
        assert_eq!(args.max_spectators, 8);
        assert_eq!(args.idle_timeout, 15);
    }

    #[test]
    fn test_args_flags() {
        let args = Args::parse_from(["canhunt", "--bind", "0.0.0.0:9000", "-f", "30", "--config", "game.json"]);
        assert_eq!(args.bind, "0.0.0.0:9000");
        assert_eq!(args.frame_rate, 30);
        assert_eq!(args.config.as_deref(), Some(Path::new("game.json")));
    }

    #[test]
    fn test_idle_timeout_bounds() {
        let args = Args::parse_from(["canhunt", "--idle-timeout", "86400"]);
        assert_eq!(args.idle_timeout, 86_400);
        assert!(Args::try_parse_from(["canhunt", "--idle-timeout", "18446744073709551615"]).is_err());
        assert!(Args::try_parse_from(["canhunt", "--idle-timeout", "0"]).is_err());
    }

    #[test]
    fn test_load_partial_config() {
        let path = temp_file("partial.json", r#"{"countdown_secs": 5.0, "seeker": {"speed": 240.0}}"#);
        let config = load_game_config(&path).unwrap();
        assert_eq!(config.countdown_secs, 5.0);
        assert_eq!(config.seeker.speed, 240.0);
        assert_eq!(config.seeker.flashlight_radius, GameConfig::default().seeker.flashlight_radius);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_game_config(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, CanhuntError::ConfigRead { .. }));
    }

    #[test]
    fn test_load_bad_json() {
        let path = temp_file("bad.json", "{ nope");
        let err = load_game_config(&path).unwrap_err();
        assert!(matches!(err, CanhuntError::ConfigParse { .. }));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_load_invalid_values() {
        let path = temp_file("invalid.json", r#"{"hiders": {"count": 0}}"#);
        let err = load_game_config(&path).unwrap_err();
        assert!(matches!(err, CanhuntError::Config(_)));
        let _ = std::fs::remove_file(path);
    }
}
