/// リサイズ先・デコード対象の最大ピクセル数（極端な入力のみ防止）
pub const MAX_PIXELS: u64 = 100_000_000;

/// 1バッチあたりの画像枚数の下限・上限
pub const MIN_BATCH_SIZE: usize = 1;
pub const MAX_BATCH_SIZE: usize = 6;

/// デフォルト品質（JPEG、1-100）
pub const DEFAULT_QUALITY: u8 = 90;

/// Cover ポリシーの上乗せ倍率（+5%）
pub const COVER_BIAS: f64 = 0.05;

/// Cover ポリシーで許容する最小充足率。
///
/// これを下回る軸があれば、アスペクト比を崩して FillSpec ちょうどにリサイズする。
/// 経験的に決めた値なので調整可能にしてある。
pub const COVER_MIN_FRACTION: f64 = 0.90;

/// プレビュー用オリジナル画像の最大寸法
pub const PREVIEW_MAX_DIMENSION: u32 = 800;

/// プラットフォーム未指定・未知の場合に使うプロファイル
pub const DEFAULT_PLATFORM: &str = "kyte";
