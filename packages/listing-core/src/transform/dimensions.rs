use serde::Serialize;

use crate::constants::{COVER_BIAS, COVER_MIN_FRACTION};
use crate::errors::{GeometryStage, TransformError};

/// 商品が占めるべき目標領域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FillSpec {
    pub width: u32,
    pub height: u32,
}

impl FillSpec {
    /// キャンバス寸法と割合（%）から目標領域を計算する
    ///
    /// 整数演算で切り捨て。100% を超える割合も受け付ける（Cover のクリップ経路に入る）。
    pub fn from_percent(
        canvas_w: u32,
        canvas_h: u32,
        width_percent: u32,
        height_percent: u32,
    ) -> Result<Self, TransformError> {
        let width = canvas_w as u64 * width_percent as u64 / 100;
        let height = canvas_h as u64 * height_percent as u64 / 100;

        if width == 0 || height == 0 {
            return Err(TransformError::DegenerateGeometry {
                stage: GeometryStage::FillSpec,
                width,
                height,
            });
        }

        let (Ok(width), Ok(height)) = (u32::try_from(width), u32::try_from(height)) else {
            return Err(TransformError::ResolutionTooLarge {
                width: u32::MAX,
                height: u32::MAX,
            });
        };

        Ok(Self { width, height })
    }
}

/// 拡大縮小ポリシー
///
/// 2軸の倍率をどのように1つの倍率にまとめるかだけが異なる。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ScalePolicy {
    /// 目標領域に収まる最大倍率。商品は切れない。
    #[default]
    Contain,
    /// 目標領域を両軸で満たす最小倍率に bias を上乗せする。
    /// はみ出した分はキャンバス合成時に切り落とす。
    Cover { bias: f64, min_fraction: f64 },
}

impl ScalePolicy {
    /// 既定の上乗せ倍率と最小充足率を持つ Cover
    pub fn cover() -> Self {
        Self::Cover {
            bias: COVER_BIAS,
            min_fraction: COVER_MIN_FRACTION,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "contain" | "fit" => Some(Self::Contain),
            "cover" | "fill" => Some(Self::cover()),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Contain => "contain",
            Self::Cover { .. } => "cover",
        }
    }
}

/// 拡大縮小の結果寸法
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScalePlan {
    /// アスペクト比を維持した等倍率の拡大縮小
    Proportional { width: u32, height: u32, scale: f64 },
    /// Cover のフォールバック。目標領域ちょうどに引き伸ばす（歪みが出る）。
    Stretch { width: u32, height: u32 },
}

impl ScalePlan {
    pub fn dimensions(&self) -> (u32, u32) {
        match *self {
            Self::Proportional { width, height, .. } | Self::Stretch { width, height } => {
                (width, height)
            }
        }
    }

    pub fn scale(&self) -> Option<f64> {
        match *self {
            Self::Proportional { scale, .. } => Some(scale),
            Self::Stretch { .. } => None,
        }
    }
}

/// ポリシーに従って商品画像の新しい寸法を計算する
///
/// 新しい寸法は浮動小数の結果を切り捨てて整数化する（四捨五入しない）。
/// いずれかの軸が 0 になる場合はリサイズ前にエラーとする。
pub fn plan_scale(
    src_w: u32,
    src_h: u32,
    fill: FillSpec,
    policy: ScalePolicy,
) -> Result<ScalePlan, TransformError> {
    if src_w == 0 || src_h == 0 {
        return Err(TransformError::DegenerateGeometry {
            stage: GeometryStage::Bounds,
            width: src_w as u64,
            height: src_h as u64,
        });
    }

    let scale_x = fill.width as f64 / src_w as f64;
    let scale_y = fill.height as f64 / src_h as f64;

    match policy {
        ScalePolicy::Contain => {
            let scale = scale_x.min(scale_y);
            let (width, height) = truncate_scaled(src_w, src_h, scale)?;
            Ok(ScalePlan::Proportional {
                width,
                height,
                scale,
            })
        }
        ScalePolicy::Cover { bias, min_fraction } => {
            let scale = scale_x.max(scale_y) * (1.0 + bias);
            let shortfall = truncate_scaled(src_w, src_h, scale).map(|(width, height)| {
                let short = (width as f64) < fill.width as f64 * min_fraction
                    || (height as f64) < fill.height as f64 * min_fraction;
                (width, height, short)
            });

            match shortfall {
                Ok((width, height, false)) => Ok(ScalePlan::Proportional {
                    width,
                    height,
                    scale,
                }),
                // 上乗せ後も足りない（または 0 に潰れた）場合は目標領域へ引き伸ばす
                Ok((_, _, true)) | Err(TransformError::DegenerateGeometry { .. }) => {
                    tracing::warn!(
                        src_w,
                        src_h,
                        fill_w = fill.width,
                        fill_h = fill.height,
                        scale,
                        "cover scale falls short of minimum fraction, stretching to fill area; aspect ratio not preserved"
                    );
                    Ok(ScalePlan::Stretch {
                        width: fill.width,
                        height: fill.height,
                    })
                }
                Err(e) => Err(e),
            }
        }
    }
}

/// 倍率を適用し、切り捨てで整数化する
fn truncate_scaled(src_w: u32, src_h: u32, scale: f64) -> Result<(u32, u32), TransformError> {
    let width = (src_w as f64 * scale).trunc();
    let height = (src_h as f64 * scale).trunc();

    if !(width >= 1.0 && height >= 1.0) {
        return Err(TransformError::DegenerateGeometry {
            stage: GeometryStage::Scale,
            width: width.max(0.0) as u64,
            height: height.max(0.0) as u64,
        });
    }

    if width > u32::MAX as f64 || height > u32::MAX as f64 {
        return Err(TransformError::ResolutionTooLarge {
            width: width.min(u32::MAX as f64) as u32,
            height: height.min(u32::MAX as f64) as u32,
        });
    }

    Ok((width as u32, height as u32))
}

/// プレビュー用の縮小寸法を計算する（拡大しない）
///
/// 指定領域に収まる最大倍率（最大1.0）を四捨五入で適用し、最小1pxを保証する。
pub fn preview_dimensions(src_w: u32, src_h: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    if src_w == 0 || src_h == 0 {
        return (src_w, src_h);
    }

    let scale = (max_w as f64 / src_w as f64)
        .min(max_h as f64 / src_h as f64)
        .min(1.0);

    let new_w = (src_w as f64 * scale).round() as u32;
    let new_h = (src_h as f64 * scale).round() as u32;

    (new_w.max(1), new_h.max(1))
}
