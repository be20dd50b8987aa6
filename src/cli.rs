// cli.rs - Command-line interface configuration
use std::path::PathBuf;

use clap::Parser;

use crate::config::SceneConfig;

#[derive(Parser, Debug, Clone)]
#[command(name = "starfield")]
#[command(about = "Animated starfield with a procedural tube and loaded models", long_about = None)]
pub struct Cli {
    /// JSON scene configuration; built-in defaults when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Render off-screen with a fixed-step clock instead of opening a window
    #[arg(long)]
    pub headless: bool,

    /// Frames to run in headless mode
    #[arg(long, default_value_t = 120)]
    pub frames: u64,

    /// Override the star count
    #[arg(long)]
    pub stars: Option<usize>,

    /// Seed for a reproducible star field
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write the last headless frame to this PNG
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    #[arg(long)]
    pub width: Option<u32>,

    #[arg(long)]
    pub height: Option<u32>,
}

impl Cli {
    /// Fold command-line overrides into a loaded config
    pub fn apply(&self, config: &mut SceneConfig) {
        if let Some(stars) = self.stars {
            config.stars.count = stars;
        }
        if let Some(seed) = self.seed {
            config.stars.seed = Some(seed);
        }
        if let Some(width) = self.width {
            config.viewport.width = width;
        }
        if let Some(height) = self.height {
            config.viewport.height = height;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["starfield"]);
        assert!(!cli.headless);
        assert_eq!(cli.frames, 120);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_overrides_apply_to_config() {
        let cli = Cli::parse_from(["starfield", "--headless", "--stars", "0", "--seed", "7", "--width", "320"]);
        let mut config = SceneConfig::default();
        cli.apply(&mut config);

        assert!(cli.headless);
        assert_eq!(config.stars.count, 0);
        assert_eq!(config.stars.seed, Some(7));
        assert_eq!(config.viewport.width, 320);
        assert_eq!(config.viewport.height, 600);
    }
}
