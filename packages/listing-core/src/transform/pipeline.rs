//! 正規化パイプライン
//!
//! デコード済み画像 → (任意) 外接矩形で切り出し → 拡大縮小 → キャンバス合成。
//! 各段は入力だけに依存する純粋な関数で、共有の可変状態は持たない。

use std::sync::Arc;

use image::DynamicImage;
use serde::Serialize;

use crate::errors::TransformError;
use crate::profile::{PlatformProfile, ProfileTable};
use crate::transform::bounds::{ContentBounds, extract_product, flatten_to_rgb};
use crate::transform::canvas::composite;
use crate::transform::dimensions::{FillSpec, plan_scale};
use crate::transform::params::NormalizeParams;
use crate::transform::resize::resize_clipped;

/// 1枚分の処理内容の記録
#[derive(Debug, Clone, Serialize)]
pub struct NormalizeReport {
    pub platform: String,
    pub canvas: (u32, u32),
    pub source: (u32, u32),
    pub bounds: Option<ContentBounds>,
    pub fill: FillSpec,
    pub policy: &'static str,
    /// 拡大縮小後の商品寸法（クリップ前）
    pub product: (u32, u32),
    /// 等倍率で拡大縮小した場合の倍率。引き伸ばしにフォールバックした場合は None
    pub scale: Option<f64>,
    pub offset: (u32, u32),
    pub clipped: bool,
}

/// 正規化結果
#[derive(Debug, Clone)]
pub struct Normalized {
    pub image: DynamicImage,
    pub report: NormalizeReport,
}

/// 1枚の画像をプロファイルのキャンバスへ正規化する
///
/// 入力画像は変更しない（RGB 変換は複製に対して行う）。
/// 割合が未指定ならプロファイルの既定値を使う。
pub fn normalize(
    image: &DynamicImage,
    profile: &PlatformProfile,
    params: &NormalizeParams,
) -> Result<Normalized, TransformError> {
    let width_percent = params.width_percent.unwrap_or(profile.width_percent);
    let height_percent = params.height_percent.unwrap_or(profile.height_percent);
    let fill = FillSpec::from_percent(profile.width, profile.height, width_percent, height_percent)?;

    let source = (image.width(), image.height());
    let (product, bounds) = if params.crop {
        extract_product(image, &params.background)?
    } else {
        (flatten_to_rgb(image, params.background.color), None)
    };

    let plan = plan_scale(product.width(), product.height(), fill, params.policy)?;
    let (scaled_w, scaled_h) = plan.dimensions();
    // キャンバスからはみ出す分は再サンプリング前に落とす
    let clipped = scaled_w > profile.width || scaled_h > profile.height;
    let visible = resize_clipped(&product, scaled_w, scaled_h, profile.width, profile.height)?;

    let (canvas, placement) = composite(&visible, profile.width, profile.height, params.background.color)?;

    tracing::debug!(
        platform = %profile.id,
        src_w = source.0,
        src_h = source.1,
        fill_w = fill.width,
        fill_h = fill.height,
        product_w = scaled_w,
        product_h = scaled_h,
        x = placement.x,
        y = placement.y,
        clipped,
        "image normalized"
    );

    Ok(Normalized {
        image: DynamicImage::ImageRgb8(canvas),
        report: NormalizeReport {
            platform: profile.id.clone(),
            canvas: (profile.width, profile.height),
            source,
            bounds,
            fill,
            policy: params.policy.name(),
            product: (scaled_w, scaled_h),
            scale: plan.scale(),
            offset: (placement.x, placement.y),
            clipped,
        },
    })
}

/// プロファイル表を保持し、プラットフォーム ID から正規化を行う
#[derive(Debug, Clone)]
pub struct Normalizer {
    profiles: Arc<ProfileTable>,
}

impl Normalizer {
    pub fn new(profiles: Arc<ProfileTable>) -> Self {
        Self { profiles }
    }

    pub fn profiles(&self) -> &ProfileTable {
        &self.profiles
    }

    /// プラットフォームを解決する（未知なら既定プロファイル）
    pub fn profile(&self, platform: &str) -> &PlatformProfile {
        self.profiles.resolve(platform)
    }

    pub fn normalize(
        &self,
        image: &DynamicImage,
        params: &NormalizeParams,
    ) -> Result<Normalized, TransformError> {
        normalize(image, self.profile(&params.platform), params)
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(Arc::new(ProfileTable::builtin()))
    }
}
