use image::Rgb;
use serde::Serialize;

use crate::constants::{DEFAULT_PLATFORM, DEFAULT_QUALITY};
use crate::transform::dimensions::ScalePolicy;

/// 出力フォーマット
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
    WebP,
}

impl OutputFormat {
    /// 文字列から OutputFormat を作成
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpeg" | "jpg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Content-Type を取得
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// ファイル拡張子
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }
}

/// エンコード設定
#[derive(Debug, Clone, Copy)]
pub struct OutputSpec {
    pub format: OutputFormat,
    pub quality: u8,
}

impl OutputSpec {
    pub fn new(format: OutputFormat, quality: Option<u8>) -> Self {
        Self {
            format,
            quality: quality.unwrap_or(DEFAULT_QUALITY),
        }
    }
}

impl Default for OutputSpec {
    fn default() -> Self {
        Self::new(OutputFormat::Png, None)
    }
}

/// 背景色と、背景とみなす色差の許容値（チャンネルごと）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Background {
    pub color: Rgb<u8>,
    pub tolerance: u8,
}

impl Background {
    pub const WHITE: Self = Self {
        color: Rgb([255, 255, 255]),
        tolerance: 0,
    };

    /// 画素が背景とみなせるか
    pub fn matches(&self, pixel: &Rgb<u8>) -> bool {
        pixel
            .0
            .iter()
            .zip(self.color.0.iter())
            .all(|(&p, &b)| p.abs_diff(b) <= self.tolerance)
    }
}

impl Default for Background {
    fn default() -> Self {
        Self::WHITE
    }
}

/// 正規化パラメータ
///
/// 割合が None の場合はプロファイルの既定値を使う。
#[derive(Debug, Clone)]
pub struct NormalizeParams {
    pub platform: String,
    pub width_percent: Option<u32>,
    pub height_percent: Option<u32>,
    pub policy: ScalePolicy,
    /// 拡大縮小の前に背景の余白を切り落とすか
    pub crop: bool,
    pub background: Background,
}

impl NormalizeParams {
    pub fn new(platform: &str, width_percent: Option<u32>, height_percent: Option<u32>) -> Self {
        Self {
            platform: platform.to_string(),
            width_percent,
            height_percent,
            ..Self::default()
        }
    }

    pub fn with_policy(mut self, policy: ScalePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_crop(mut self, crop: bool) -> Self {
        self.crop = crop;
        self
    }
}

impl Default for NormalizeParams {
    fn default() -> Self {
        Self {
            platform: DEFAULT_PLATFORM.to_string(),
            width_percent: None,
            height_percent: None,
            policy: ScalePolicy::Contain,
            crop: true,
            background: Background::WHITE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("png"), Some(OutputFormat::Png));
        assert_eq!(OutputFormat::from_str("JPG"), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::from_str("jpeg"), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::from_str(" webp "), Some(OutputFormat::WebP));
        assert_eq!(OutputFormat::from_str("avif"), None);
    }

    #[test]
    fn test_content_type_and_extension() {
        assert_eq!(OutputFormat::Png.content_type(), "image/png");
        assert_eq!(OutputFormat::Jpeg.content_type(), "image/jpeg");
        assert_eq!(OutputFormat::Jpeg.extension(), "jpg");
        assert_eq!(OutputFormat::WebP.extension(), "webp");
    }

    #[test]
    fn test_output_spec_default_quality() {
        let spec = OutputSpec::new(OutputFormat::Jpeg, None);
        assert_eq!(spec.quality, DEFAULT_QUALITY);
    }

    #[test]
    fn test_background_tolerance() {
        let exact = Background::WHITE;
        assert!(exact.matches(&Rgb([255, 255, 255])));
        assert!(!exact.matches(&Rgb([254, 255, 255])));

        let loose = Background {
            tolerance: 8,
            ..Background::WHITE
        };
        assert!(loose.matches(&Rgb([250, 247, 255])));
        assert!(!loose.matches(&Rgb([246, 255, 255])));
    }

    #[test]
    fn test_normalize_params_defaults() {
        let params = NormalizeParams::new("jumpseller", Some(94), None);
        assert_eq!(params.platform, "jumpseller");
        assert_eq!(params.width_percent, Some(94));
        assert_eq!(params.height_percent, None);
        assert!(params.crop);
        assert_eq!(params.policy, ScalePolicy::Contain);
    }
}
