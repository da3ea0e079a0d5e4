use image::{DynamicImage, ImageReader};
use std::io::Cursor;

use crate::constants::MAX_PIXELS;
use crate::errors::TransformError;

/// 画像バイト列をデコードし、EXIF の向きを反映した画像を返す
///
/// スマートフォンで撮影した商品写真は横倒しのまま保存されていることが多いため、
/// 外接矩形の検出より前に正立させておく。
pub fn decode_image(data: &[u8]) -> Result<DynamicImage, TransformError> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| TransformError::Decode(format!("failed to read input: {e}")))?;

    if reader.format().is_none() {
        return Err(TransformError::Decode("unrecognized image format".to_string()));
    }

    let img = reader
        .decode()
        .map_err(|e| TransformError::Decode(e.to_string()))?;

    let (width, height) = (img.width(), img.height());
    if width as u64 * height as u64 > MAX_PIXELS {
        return Err(TransformError::ResolutionTooLarge { width, height });
    }

    Ok(match exif_orientation(data) {
        Some(tag) => upright(img, tag),
        None => img,
    })
}

/// EXIF Orientation タグ (1-8) を読み取る。EXIF が無ければ None。
fn exif_orientation(data: &[u8]) -> Option<u32> {
    let mut cursor = Cursor::new(data);
    let exif = exif::Reader::new().read_from_container(&mut cursor).ok()?;
    let field = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?;
    field.value.get_uint(0)
}

/// Orientation タグに従って回転・反転する
fn upright(img: DynamicImage, tag: u32) -> DynamicImage {
    match tag {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        // 1 (正立) と範囲外の値はそのまま
        _ => img,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageFormat;

    fn png_bytes(img: &DynamicImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_decode_png() {
        let data = png_bytes(&DynamicImage::new_rgb8(12, 7));
        let img = decode_image(&data).unwrap();
        assert_eq!((img.width(), img.height()), (12, 7));
    }

    #[test]
    fn test_decode_garbage() {
        let result = decode_image(b"definitely not an image");
        assert!(matches!(result, Err(TransformError::Decode(_))));
    }

    #[test]
    fn test_decode_truncated_png() {
        let data = png_bytes(&DynamicImage::new_rgb8(50, 50));
        let result = decode_image(&data[..20]);
        assert!(matches!(result, Err(TransformError::Decode(_))));
    }

    /// JPEG の SOI 直後に Orientation だけを持つ EXIF (APP1) を差し込む
    fn jpeg_with_orientation(img: &DynamicImage, orientation: u16) -> Vec<u8> {
        let mut jpeg = Cursor::new(Vec::new());
        img.write_to(&mut jpeg, ImageFormat::Jpeg).unwrap();
        let jpeg = jpeg.into_inner();

        let mut payload = b"Exif\0\0".to_vec();
        // ビッグエンディアンの TIFF ヘッダと IFD0 (エントリ1件)
        payload.extend_from_slice(b"MM\x00\x2a\x00\x00\x00\x08");
        payload.extend_from_slice(&[0x00, 0x01]);
        payload.extend_from_slice(&[0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01]);
        payload.extend_from_slice(&orientation.to_be_bytes());
        payload.extend_from_slice(&[0x00, 0x00]);
        payload.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);

        let mut out = jpeg[..2].to_vec();
        out.extend_from_slice(&[0xFF, 0xE1]);
        out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
        out.extend_from_slice(&payload);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    #[test]
    fn test_decode_applies_exif_orientation() {
        let img = DynamicImage::new_rgb8(16, 8);

        let data = jpeg_with_orientation(&img, 6);
        assert_eq!(exif_orientation(&data), Some(6));
        let decoded = decode_image(&data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 16));

        let data = jpeg_with_orientation(&img, 1);
        let decoded = decode_image(&data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 8));
    }

    #[test]
    fn test_upright_swaps_axes_for_quarter_turns() {
        let img = DynamicImage::new_rgb8(10, 20);
        let rotated = upright(img.clone(), 6);
        assert_eq!((rotated.width(), rotated.height()), (20, 10));

        let rotated = upright(img.clone(), 8);
        assert_eq!((rotated.width(), rotated.height()), (20, 10));

        let same = upright(img, 1);
        assert_eq!((same.width(), same.height()), (10, 20));
    }

    #[test]
    fn test_upright_ignores_unknown_tag() {
        let img = DynamicImage::new_rgb8(3, 4);
        let result = upright(img, 42);
        assert_eq!((result.width(), result.height()), (3, 4));
    }
}
