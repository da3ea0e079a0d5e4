//! 対話クライアント向けのプレビュー（元画像と処理後画像の base64 データ URL）

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, Rgb};
use serde::Serialize;

use crate::constants::PREVIEW_MAX_DIMENSION;
use crate::errors::TransformError;
use crate::transform::{
    NormalizeReport, Normalized, OutputFormat, OutputSpec, encode_image, flatten_to_rgb,
    preview_dimensions, resize_image,
};

const ORIGINAL_PREVIEW_QUALITY: u8 = 90;

#[derive(Debug, Clone, Serialize)]
pub struct PreviewPayload {
    pub original: String,
    pub processed: String,
    pub platform: String,
    pub dimensions: String,
    pub details: NormalizeReport,
}

/// プレビュー用のペイロードを作る
///
/// 元画像は 800x800 に収まるよう縮小（拡大はしない）して JPEG にする。
pub fn build_preview(
    source: &DynamicImage,
    normalized: &Normalized,
    output: OutputSpec,
) -> Result<PreviewPayload, TransformError> {
    let rgb = flatten_to_rgb(source, Rgb([255, 255, 255]));
    let (w, h) = preview_dimensions(
        rgb.width(),
        rgb.height(),
        PREVIEW_MAX_DIMENSION,
        PREVIEW_MAX_DIMENSION,
    );
    let thumbnail = resize_image(&rgb, w, h)?;
    let original_spec = OutputSpec::new(OutputFormat::Jpeg, Some(ORIGINAL_PREVIEW_QUALITY));
    let original = encode_image(&DynamicImage::ImageRgb8(thumbnail), original_spec)?;

    let processed = encode_image(&normalized.image, output)?;
    let (canvas_w, canvas_h) = normalized.report.canvas;

    Ok(PreviewPayload {
        original: data_url(original_spec.format, &original),
        processed: data_url(output.format, &processed),
        platform: normalized.report.platform.clone(),
        dimensions: format!("{canvas_w}x{canvas_h}"),
        details: normalized.report.clone(),
    })
}

fn data_url(format: OutputFormat, data: &[u8]) -> String {
    format!("data:{};base64,{}", format.content_type(), STANDARD.encode(data))
}
