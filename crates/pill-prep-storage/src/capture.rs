//! Capture naming and metadata.

use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Capture parameters encoded in a photo's filename.
///
/// `{kcode}_{sequence}_{led}_{angle}_{turntable}_{quality}_{background}_{size}.jpg`,
/// e.g. `K-030864_0_3_front_0_90_000_200.jpg`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSpec {
    pub sequence: u32,
    /// LED brightness step
    pub led_brightness: u8,
    /// `front` or `back`
    pub capture_angle: String,
    /// Turntable rotation in degrees
    pub turntable_angle: u16,
    /// JPEG quality
    pub quality: u8,
    /// Background code, zero-padded to three digits
    pub background: u16,
    /// Image edge length in pixels
    pub size: u32,
}

impl Default for CaptureSpec {
    fn default() -> Self {
        Self {
            sequence: 0,
            led_brightness: 3,
            capture_angle: "front".to_string(),
            turntable_angle: 0,
            quality: 90,
            background: 0,
            size: 200,
        }
    }
}

impl CaptureSpec {
    /// Filename for a capture of `kcode`.
    pub fn filename(&self, kcode: &str) -> String {
        format!(
            "{kcode}_{}_{}_{}_{}_{}_{:03}_{}.jpg",
            self.sequence,
            self.led_brightness,
            self.capture_angle,
            self.turntable_angle,
            self.quality,
            self.background,
            self.size
        )
    }
}

/// Object path inside the photo bucket: `category/kcode/filename`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturePath {
    pub category: String,
    pub kcode: String,
    pub filename: String,
}

impl CapturePath {
    pub fn new(category: impl Into<String>, kcode: impl Into<String>, spec: &CaptureSpec) -> Self {
        let kcode = kcode.into();
        Self {
            category: category.into(),
            filename: spec.filename(&kcode),
            kcode,
        }
    }
}

impl fmt::Display for CapturePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.category, self.kcode, self.filename)
    }
}

/// One row of the capture metadata table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureMetadata {
    pub kcode: String,
    /// Object path within the bucket
    pub photo_url: String,
    pub capture_angle: String,
    pub turntable_angle: u16,
    pub background_color: String,
    pub led_brightness: u8,
    pub quality_grade: String,
    pub blur_score: f64,
    pub exposure_score: f64,
    pub centering_score: f64,
    pub capture_date: String,
}

impl CaptureMetadata {
    /// Metadata for a synthetic smoke-test capture.
    pub fn smoke_test(path: &CapturePath, spec: &CaptureSpec, captured_at: DateTime<Local>) -> Self {
        Self {
            kcode: path.kcode.clone(),
            photo_url: path.to_string(),
            capture_angle: spec.capture_angle.clone(),
            turntable_angle: spec.turntable_angle,
            background_color: "skin_palm".to_string(),
            led_brightness: spec.led_brightness,
            quality_grade: "A".to_string(),
            blur_score: 0.95,
            exposure_score: 0.88,
            centering_score: 0.92,
            capture_date: captured_at.to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filename() {
        let spec = CaptureSpec::default();
        assert_eq!(
            spec.filename("K-030864"),
            "K-030864_0_3_front_0_90_000_200.jpg"
        );
    }

    #[test]
    fn test_capture_path_display() {
        let spec = CaptureSpec {
            capture_angle: "back".into(),
            turntable_angle: 45,
            background: 7,
            ..CaptureSpec::default()
        };
        let path = CapturePath::new("CS_1_single", "K-000001", &spec);
        assert_eq!(
            path.to_string(),
            "CS_1_single/K-000001/K-000001_0_3_back_45_90_007_200.jpg"
        );
    }

    #[test]
    fn test_smoke_test_metadata() {
        let spec = CaptureSpec::default();
        let path = CapturePath::new("CS_1_single", "K-030864", &spec);
        let meta = CaptureMetadata::smoke_test(&path, &spec, Local::now());

        assert_eq!(meta.photo_url, path.to_string());
        assert_eq!(meta.capture_angle, "front");
        assert_eq!(meta.led_brightness, 3);

        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["kcode"], "K-030864");
        assert_eq!(json["quality_grade"], "A");
    }
}
