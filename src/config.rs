use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Configuration {
    /// Directory the image references are resolved against.
    pub image_root: PathBuf,
    /// How often the timed galleries sample their clock.
    #[serde(with = "humantime_serde")]
    pub frame_period: Duration,
    pub scroll_gallery: ScrollGalleryConfig,
    pub loop_gallery: LoopGalleryConfig,
    pub one_shot_gallery: OneShotGalleryConfig,
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(
            !self.frame_period.is_zero(),
            "frame-period must be greater than zero"
        );
        self.scroll_gallery
            .validate()
            .context("invalid scroll-gallery configuration")?;
        self.loop_gallery
            .validate()
            .context("invalid loop-gallery configuration")?;
        self.one_shot_gallery
            .validate()
            .context("invalid one-shot-gallery configuration")?;
        Ok(self)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            image_root: PathBuf::from("."),
            frame_period: Self::default_frame_period(),
            scroll_gallery: ScrollGalleryConfig::default(),
            loop_gallery: LoopGalleryConfig::default(),
            one_shot_gallery: OneShotGalleryConfig::default(),
        }
    }
}

impl Configuration {
    const fn default_frame_period() -> Duration {
        Duration::from_millis(16)
    }
}

fn validate_prefix(prefix: &str) -> Result<()> {
    ensure!(!prefix.is_empty(), "prefix must not be empty");
    ensure!(
        !prefix.contains(['/', '\\']),
        "prefix must not contain path separators"
    );
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct ScrollGalleryConfig {
    pub prefix: String,
    /// Minimum spacing between accepted wheel gestures.
    #[serde(with = "humantime_serde")]
    pub gesture_spacing: Duration,
    /// Grace period after an image loads before another transition may start.
    #[serde(with = "humantime_serde")]
    pub settle_delay: Duration,
    /// Accessible label; rendered as `"{label} {n}"`.
    pub label: String,
}

impl ScrollGalleryConfig {
    fn validate(&self) -> Result<()> {
        validate_prefix(&self.prefix)
    }
}

impl Default for ScrollGalleryConfig {
    fn default() -> Self {
        Self {
            prefix: "g".into(),
            gesture_spacing: Duration::from_millis(150),
            settle_delay: Duration::from_millis(300),
            label: "Image".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct LoopGalleryConfig {
    pub prefix: String,
    /// Time between frames.
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    pub label: String,
}

impl LoopGalleryConfig {
    fn validate(&self) -> Result<()> {
        validate_prefix(&self.prefix)?;
        ensure!(!self.interval.is_zero(), "interval must be greater than zero");
        Ok(())
    }
}

impl Default for LoopGalleryConfig {
    fn default() -> Self {
        Self {
            prefix: "h".into(),
            interval: Duration::from_millis(100),
            label: "Auto Image".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct OneShotGalleryConfig {
    pub prefix: String,
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    /// Fraction of the container that must be on screen to count as visible.
    pub visibility_threshold: f32,
    pub label: String,
}

impl OneShotGalleryConfig {
    fn validate(&self) -> Result<()> {
        validate_prefix(&self.prefix)?;
        ensure!(!self.interval.is_zero(), "interval must be greater than zero");
        ensure!(
            self.visibility_threshold > 0.0 && self.visibility_threshold <= 1.0,
            "visibility-threshold must be within (0, 1]"
        );
        Ok(())
    }
}

impl Default for OneShotGalleryConfig {
    fn default() -> Self {
        Self {
            prefix: "i".into(),
            interval: Duration::from_millis(100),
            visibility_threshold: 0.5,
            label: "I Image".into(),
        }
    }
}
