//! HTTP リクエストと listing-core の橋渡し
//!
//! いずれも CPU 負荷の高い同期処理なので、呼び出し側で spawn_blocking する。

use listing_core::{
    NormalizeParams, NormalizedImage, OutputSpec, PreviewPayload, UploadedImage, archive_name,
    build_archive, build_preview, decode_image, process_batch, process_image,
    validation::output_stem,
};

use crate::AppState;
use crate::config::BatchPolicy;
use crate::handler::AppError;

/// バッチ処理の結果アーカイブ
#[derive(Debug)]
pub struct BatchArchive {
    pub file_name: String,
    pub data: Vec<u8>,
    /// Skip ポリシーで除外された画像のファイル名
    pub skipped: Vec<String>,
}

/// 複数画像を正規化して zip にまとめる
pub fn normalize_batch(
    state: &AppState,
    uploads: &[UploadedImage],
    params: &NormalizeParams,
    output: OutputSpec,
) -> Result<BatchArchive, AppError> {
    let results = process_batch(
        &state.normalizer,
        uploads,
        params,
        output,
        state.config.max_batch_size,
    )?;

    let mut images: Vec<NormalizedImage> = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(image) => images.push(image),
            Err(failure) => {
                tracing::warn!(
                    index = failure.index,
                    file_name = %failure.file_name,
                    error = %failure.error,
                    "image failed in batch"
                );
                failures.push(failure);
            }
        }
    }

    if !failures.is_empty() && (state.config.batch_policy == BatchPolicy::Abort || images.is_empty()) {
        let summary = failures
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(AppError::TransformFailed(summary));
    }

    let platform = state.normalizer.profile(&params.platform).id.clone();
    let data = build_archive(&images, &platform, state.config.temp_dir.as_deref())?;

    Ok(BatchArchive {
        file_name: archive_name(&platform),
        data,
        skipped: failures.iter().map(|f| output_stem(&f.file_name)).collect(),
    })
}

/// 1枚を正規化してエンコードする
pub fn normalize_single(
    state: &AppState,
    upload: &UploadedImage,
    params: &NormalizeParams,
    output: OutputSpec,
) -> Result<NormalizedImage, AppError> {
    Ok(process_image(&state.normalizer, upload, params, output)?)
}

/// プレビュー用のペイロードを作る
pub fn preview(
    state: &AppState,
    upload: &UploadedImage,
    params: &NormalizeParams,
    output: OutputSpec,
) -> Result<PreviewPayload, AppError> {
    let source = decode_image(&upload.data)?;
    let normalized = state.normalizer.normalize(&source, params)?;
    Ok(build_preview(&source, &normalized, output)?)
}
