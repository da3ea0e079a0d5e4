use crate::errors::TransformError;
use crate::transform::params::{OutputFormat, OutputSpec};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::DynamicImage;
use std::io::Cursor;

/// 画像をエンコードする
pub fn encode_image(img: &DynamicImage, spec: OutputSpec) -> Result<Vec<u8>, TransformError> {
    let mut buf = Cursor::new(Vec::new());

    match spec.format {
        OutputFormat::Png => {
            let encoder = PngEncoder::new(&mut buf);
            img.write_with_encoder(encoder)
                .map_err(|e| TransformError::ProcessingFailed(format!("PNG encode failed: {e}")))?;
        }
        OutputFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut buf, spec.quality);
            img.to_rgb8()
                .write_with_encoder(encoder)
                .map_err(|e| TransformError::ProcessingFailed(format!("JPEG encode failed: {e}")))?;
        }
        OutputFormat::WebP => {
            // image クレートの WebP エンコーダはロスレスのみ対応（quality は無視）
            let encoder = WebPEncoder::new_lossless(&mut buf);
            img.write_with_encoder(encoder)
                .map_err(|e| TransformError::ProcessingFailed(format!("WebP encode failed: {e}")))?;
        }
    }

    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_png() {
        let img = DynamicImage::new_rgb8(10, 10);
        let data = encode_image(&img, OutputSpec::default()).unwrap();
        assert_eq!(&data[0..8], &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]);
    }

    #[test]
    fn test_encode_jpeg_from_rgba() {
        let img = DynamicImage::new_rgba8(10, 10);
        let data = encode_image(&img, OutputSpec::new(OutputFormat::Jpeg, Some(80))).unwrap();
        assert_eq!(&data[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_encode_webp() {
        let img = DynamicImage::new_rgb8(10, 10);
        let data = encode_image(&img, OutputSpec::new(OutputFormat::WebP, None)).unwrap();
        // WebP は RIFF コンテナ
        assert_eq!(&data[0..4], b"RIFF");
    }
}
