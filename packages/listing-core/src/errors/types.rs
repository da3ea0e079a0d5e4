use thiserror::Error;

/// 正規化処理の統合エラー型
#[derive(Debug, Error)]
pub enum ListingError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("transform error: {0}")]
    Transform(#[from] TransformError),

    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),
}

/// 寸法が 0 になった処理段階
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryStage {
    FillSpec,
    Bounds,
    Scale,
    Canvas,
}

impl std::fmt::Display for GeometryStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::FillSpec => "fill spec",
            Self::Bounds => "content bounds",
            Self::Scale => "scaled product",
            Self::Canvas => "canvas",
        };
        f.write_str(name)
    }
}

/// 画像変換エラー
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("decode failed: {0}")]
    Decode(String),

    #[error("unknown platform profile: {0}")]
    InvalidProfile(String),

    #[error("degenerate geometry in {stage}: {width}x{height}")]
    DegenerateGeometry {
        stage: GeometryStage,
        width: u64,
        height: u64,
    },

    #[error("image resolution exceeds maximum ({width}x{height})")]
    ResolutionTooLarge { width: u32, height: u32 },

    #[error("processing failed: {0}")]
    ProcessingFailed(String),
}

/// 一時ファイル・アーカイブ作成エラー
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("archive is empty")]
    Empty,
}
