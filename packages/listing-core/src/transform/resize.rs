use crate::constants::MAX_PIXELS;
use crate::errors::{GeometryStage, TransformError};
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer, images::Image};
use image::RgbImage;

/// 画像をリサイズする
///
/// fast_image_resize の Lanczos3 フィルタを拡大・縮小の両方に使う。
/// 寸法が変わらない場合は再サンプリングせずに複製を返す。
pub fn resize_image(
    img: &RgbImage,
    target_w: u32,
    target_h: u32,
) -> Result<RgbImage, TransformError> {
    if target_w == 0 || target_h == 0 {
        return Err(TransformError::DegenerateGeometry {
            stage: GeometryStage::Scale,
            width: target_w as u64,
            height: target_h as u64,
        });
    }

    // ピクセル数チェック
    let total_pixels = target_w as u64 * target_h as u64;
    if total_pixels > MAX_PIXELS {
        return Err(TransformError::ResolutionTooLarge {
            width: target_w,
            height: target_h,
        });
    }

    if img.dimensions() == (target_w, target_h) {
        return Ok(img.clone());
    }

    let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3));
    resample(img, target_w, target_h, &options)
}

/// 拡大後にキャンバス内に見える範囲だけをリサイズする
///
/// `scaled_w` x `scaled_h` に拡大した画像を、その中心を基準に
/// `max_w` x `max_h` で切り詰めた結果と同じ領域を返す。
/// 切り詰める窓を元画像の座標に戻して切り出してから再サンプリングするため、
/// 拡大後の画像全体は確保しない。
pub fn resize_clipped(
    img: &RgbImage,
    scaled_w: u32,
    scaled_h: u32,
    max_w: u32,
    max_h: u32,
) -> Result<RgbImage, TransformError> {
    if scaled_w == 0 || scaled_h == 0 {
        return Err(TransformError::DegenerateGeometry {
            stage: GeometryStage::Scale,
            width: scaled_w as u64,
            height: scaled_h as u64,
        });
    }
    if max_w == 0 || max_h == 0 {
        return Err(TransformError::DegenerateGeometry {
            stage: GeometryStage::Canvas,
            width: max_w as u64,
            height: max_h as u64,
        });
    }

    let window_w = scaled_w.min(max_w);
    let window_h = scaled_h.min(max_h);
    if (window_w, window_h) == (scaled_w, scaled_h) {
        return resize_image(img, scaled_w, scaled_h);
    }

    if window_w as u64 * window_h as u64 > MAX_PIXELS {
        return Err(TransformError::ResolutionTooLarge {
            width: window_w,
            height: window_h,
        });
    }

    let (src_w, src_h) = (img.width() as f64, img.height() as f64);
    let ratio_x = src_w / scaled_w as f64;
    let ratio_y = src_h / scaled_h as f64;

    let left = ((scaled_w - window_w) / 2) as f64 * ratio_x;
    let top = ((scaled_h - window_h) / 2) as f64 * ratio_y;
    // 浮動小数の誤差で元画像からはみ出さないよう詰める
    let width = (window_w as f64 * ratio_x).min(src_w - left);
    let height = (window_h as f64 * ratio_y).min(src_h - top);

    let options = ResizeOptions::new()
        .resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3))
        .crop(left, top, width, height);
    resample(img, window_w, window_h, &options)
}

fn resample(
    img: &RgbImage,
    target_w: u32,
    target_h: u32,
    options: &ResizeOptions,
) -> Result<RgbImage, TransformError> {
    let src_image = Image::from_vec_u8(
        img.width(),
        img.height(),
        img.as_raw().clone(),
        PixelType::U8x3,
    )
    .map_err(|e| TransformError::ProcessingFailed(format!("failed to create source image: {e}")))?;

    let mut dst_image = Image::new(target_w, target_h, PixelType::U8x3);

    Resizer::new()
        .resize(&src_image, &mut dst_image, options)
        .map_err(|e| TransformError::ProcessingFailed(format!("resize failed: {e}")))?;

    RgbImage::from_raw(target_w, target_h, dst_image.into_vec()).ok_or_else(|| {
        TransformError::ProcessingFailed("failed to convert resized image".to_string())
    })
}
