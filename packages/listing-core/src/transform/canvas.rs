//! 固定サイズのキャンバスへの合成
//!
//! 出力は常にプロファイルの寸法ちょうどの RGB 画像になる。

use image::{Rgb, RgbImage, imageops};

use crate::errors::{GeometryStage, TransformError};

/// 合成位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    /// 貼り付けた商品の寸法（クリップ後）
    pub width: u32,
    pub height: u32,
    pub clipped: bool,
}

/// キャンバスからはみ出す商品を、商品自身の中心を基準に切り詰める
///
/// はみ出しが無ければ None。
pub fn clip_to_canvas(product: &RgbImage, canvas_w: u32, canvas_h: u32) -> Option<RgbImage> {
    let (pw, ph) = product.dimensions();
    if pw <= canvas_w && ph <= canvas_h {
        return None;
    }

    let left = pw.saturating_sub(canvas_w) / 2;
    let top = ph.saturating_sub(canvas_h) / 2;
    let width = pw.min(canvas_w);
    let height = ph.min(canvas_h);

    Some(imageops::crop_imm(product, left, top, width, height).to_image())
}

/// 中央寄せのオフセット（切り捨て除算）
pub fn center_offset(canvas_w: u32, canvas_h: u32, product_w: u32, product_h: u32) -> (u32, u32) {
    (
        canvas_w.saturating_sub(product_w) / 2,
        canvas_h.saturating_sub(product_h) / 2,
    )
}

/// 背景色で塗ったキャンバスの中央に商品を貼り付ける
pub fn composite(
    product: &RgbImage,
    canvas_w: u32,
    canvas_h: u32,
    background: Rgb<u8>,
) -> Result<(RgbImage, Placement), TransformError> {
    if canvas_w == 0 || canvas_h == 0 {
        return Err(TransformError::DegenerateGeometry {
            stage: GeometryStage::Canvas,
            width: canvas_w as u64,
            height: canvas_h as u64,
        });
    }
    if product.width() == 0 || product.height() == 0 {
        return Err(TransformError::DegenerateGeometry {
            stage: GeometryStage::Scale,
            width: product.width() as u64,
            height: product.height() as u64,
        });
    }

    let mut canvas = RgbImage::from_pixel(canvas_w, canvas_h, background);

    let clipped = clip_to_canvas(product, canvas_w, canvas_h);
    let pasted = clipped.as_ref().unwrap_or(product);
    let (x, y) = center_offset(canvas_w, canvas_h, pasted.width(), pasted.height());

    // キャンバス外の画素は replace 側で切り捨てられる
    imageops::replace(&mut canvas, pasted, x as i64, y as i64);

    Ok((
        canvas,
        Placement {
            x,
            y,
            width: pasted.width(),
            height: pasted.height(),
            clipped: clipped.is_some(),
        },
    ))
}
