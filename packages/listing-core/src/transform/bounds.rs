//! 背景以外の内容が占める外接矩形の検出

use image::{DynamicImage, Rgb, RgbImage, imageops};
use serde::Serialize;

use crate::errors::{GeometryStage, TransformError};
use crate::transform::params::Background;

/// 切り出し領域（right / bottom は含まない）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContentBounds {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl ContentBounds {
    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }
}

/// 画像を RGB に変換する
///
/// アルファ付きの画像は背景色の上に合成してから落とす。
/// 透過の切り抜き画像がそのまま黒背景にならないようにするため。
pub fn flatten_to_rgb(img: &DynamicImage, background: Rgb<u8>) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }

    let rgba = img.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (dst, src) in out.pixels_mut().zip(rgba.pixels()) {
        let alpha = src[3] as u32;
        for c in 0..3 {
            let fg = src[c] as u32 * alpha;
            let bg = background[c] as u32 * (255 - alpha);
            dst[c] = ((fg + bg + 127) / 255) as u8;
        }
    }
    out
}

/// 背景と異なる画素をすべて含む最小の矩形を返す
///
/// 全面が背景色なら None。
pub fn find_content_bounds(img: &RgbImage, background: &Background) -> Option<ContentBounds> {
    let mut bounds: Option<ContentBounds> = None;

    for (x, y, pixel) in img.enumerate_pixels() {
        if background.matches(pixel) {
            continue;
        }
        let b = bounds.get_or_insert(ContentBounds {
            left: x,
            top: y,
            right: x + 1,
            bottom: y + 1,
        });
        b.left = b.left.min(x);
        b.top = b.top.min(y);
        b.right = b.right.max(x + 1);
        b.bottom = b.bottom.max(y + 1);
    }

    bounds
}

/// 矩形で切り出す
pub fn crop_to_bounds(img: &RgbImage, bounds: ContentBounds) -> Result<RgbImage, TransformError> {
    let (width, height) = (bounds.width(), bounds.height());
    if width == 0 || height == 0 || bounds.right > img.width() || bounds.bottom > img.height() {
        return Err(TransformError::DegenerateGeometry {
            stage: GeometryStage::Bounds,
            width: width as u64,
            height: height as u64,
        });
    }

    Ok(imageops::crop_imm(img, bounds.left, bounds.top, width, height).to_image())
}

/// 背景の余白を切り落とした商品領域を返す
///
/// 内容が見つからなければ元画像（RGB 変換済み）をそのまま返す。
pub fn extract_product(
    img: &DynamicImage,
    background: &Background,
) -> Result<(RgbImage, Option<ContentBounds>), TransformError> {
    let rgb = flatten_to_rgb(img, background.color);
    match find_content_bounds(&rgb, background) {
        Some(bounds) => {
            let cropped = crop_to_bounds(&rgb, bounds)?;
            Ok((cropped, Some(bounds)))
        }
        None => Ok((rgb, None)),
    }
}
