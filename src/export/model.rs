//! Data models for export jobs and produced artifacts.

use chrono::NaiveDate;

use crate::draft::{Platform, Quality};

/// One export invocation. Transient; not retained after completion.
#[derive(Debug, Clone)]
pub struct ExportJob {
    /// Platforms to render, in order.
    pub platforms: Vec<Platform>,
    /// Number of leading slides to export.
    pub slide_count: usize,
    /// Output quality preset.
    pub quality: Quality,
}

impl ExportJob {
    /// Creates a new export job.
    pub fn new(platforms: Vec<Platform>, slide_count: usize, quality: Quality) -> Self {
        Self {
            platforms,
            slide_count,
            quality,
        }
    }
}

/// Produced artifact: a direct image, or an archive of images.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportArtifact {
    /// Single rendered slide.
    Png { filename: String, bytes: Vec<u8> },
    /// Carousel or multi-platform bundle.
    Archive { filename: String, bytes: Vec<u8> },
}

impl ExportArtifact {
    /// Filename of the artifact.
    pub fn filename(&self) -> &str {
        match self {
            ExportArtifact::Png { filename, .. } => filename,
            ExportArtifact::Archive { filename, .. } => filename,
        }
    }

    /// Raw bytes of the artifact.
    pub fn bytes(&self) -> &[u8] {
        match self {
            ExportArtifact::Png { bytes, .. } => bytes,
            ExportArtifact::Archive { bytes, .. } => bytes,
        }
    }
}

/// Result of a completed export: the artifact, the persisted post records,
/// and any non-fatal warnings collected along the way.
#[derive(Debug)]
pub struct ExportOutcome {
    pub artifact: ExportArtifact,
    pub posts: Vec<super::service::PostRecord>,
    pub warnings: Vec<String>,
}

// =============================================================================
// FILENAMES
// =============================================================================

/// Lowercases and strips a name component to `[a-z0-9-]`.
pub fn slug(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut last_dash = true;
    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// `<brand>_<category>_<platform>_<date>_<NN>.png` — one rendered slide,
/// `slide_number` 1-based and zero-padded to two digits.
pub fn slide_filename(
    brand: &str,
    category: &str,
    platform: Platform,
    date: NaiveDate,
    slide_number: usize,
) -> String {
    format!(
        "{}_{}_{}_{}_{:02}.png",
        slug(brand),
        slug(category),
        platform.as_str(),
        date.format("%Y-%m-%d"),
        slide_number
    )
}

/// `<brand>_<category>_<platform>_<date>_carousel.zip` — multi-slide bundle.
pub fn carousel_filename(
    brand: &str,
    category: &str,
    platform: Platform,
    date: NaiveDate,
) -> String {
    format!(
        "{}_{}_{}_{}_carousel.zip",
        slug(brand),
        slug(category),
        platform.as_str(),
        date.format("%Y-%m-%d")
    )
}

/// `<brand>_<category>_all_platforms_<date>.zip` — one folder per platform.
pub fn multi_platform_filename(brand: &str, category: &str, date: NaiveDate) -> String {
    format!(
        "{}_{}_all_platforms_{}.zip",
        slug(brand),
        slug(category),
        date.format("%Y-%m-%d")
    )
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 7).unwrap()
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Daily Fitness!"), "daily-fitness");
        assert_eq!(slug("postcraft"), "postcraft");
        assert_eq!(slug("  a  b  "), "a-b");
    }

    #[test]
    fn test_slide_filename_zero_padded() {
        assert_eq!(
            slide_filename("postcraft", "fitness", Platform::Feed, date(), 3),
            "postcraft_fitness_feed_2026-08-07_03.png"
        );
        assert_eq!(
            slide_filename("postcraft", "fitness", Platform::Story, date(), 12),
            "postcraft_fitness_story_2026-08-07_12.png"
        );
    }

    #[test]
    fn test_carousel_filename() {
        assert_eq!(
            carousel_filename("postcraft", "fitness", Platform::Feed, date()),
            "postcraft_fitness_feed_2026-08-07_carousel.zip"
        );
    }

    #[test]
    fn test_multi_platform_filename() {
        assert_eq!(
            multi_platform_filename("postcraft", "Daily Fitness", date()),
            "postcraft_daily-fitness_all_platforms_2026-08-07.zip"
        );
    }
}
