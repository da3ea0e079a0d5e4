use crate::constants::MIN_BATCH_SIZE;
use crate::errors::ListingError;

/// バッチの枚数を検証する
pub fn validate_batch_size(count: usize, max: usize) -> Result<(), ListingError> {
    if count < MIN_BATCH_SIZE || count > max {
        return Err(ListingError::Validation(format!(
            "batch must contain between {MIN_BATCH_SIZE} and {max} images, got {count}"
        )));
    }
    Ok(())
}

/// 正規化・エンコードのパラメータを検証する
///
/// 割合は 0 を拒否するが、100 を超える値は受け付ける（キャンバスからはみ出してクリップされる）。
pub fn validate_params(
    width_percent: Option<u32>,
    height_percent: Option<u32>,
    quality: Option<u8>,
) -> Result<(), ListingError> {
    // 品質の検証
    if let Some(q) = quality
        && (q == 0 || q > 100)
    {
        return Err(ListingError::Validation(format!(
            "quality must be 1-100, got {q}"
        )));
    }

    // 幅の割合
    if let Some(0) = width_percent {
        return Err(ListingError::Validation(
            "width_percent must be greater than 0".to_string(),
        ));
    }

    // 高さの割合
    if let Some(0) = height_percent {
        return Err(ListingError::Validation(
            "height_percent must be greater than 0".to_string(),
        ));
    }

    Ok(())
}
