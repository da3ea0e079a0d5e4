//! 複数画像の一括処理
//!
//! 画像同士に依存関係は無いので rayon で並列に処理し、結果は入力順で返す。
//! 1枚の失敗で全体を止めるか、失敗を報告して続けるかは呼び出し側が決める。

use std::collections::HashSet;

use bytes::Bytes;
use rayon::prelude::*;
use thiserror::Error;

use crate::errors::{ListingError, TransformError};
use crate::transform::{
    NormalizeParams, NormalizeReport, Normalizer, OutputSpec, decode_image, encode_image,
};
use crate::validation::{output_file_name, validate_batch_size};

/// アップロードされた1ファイル
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub data: Bytes,
}

impl UploadedImage {
    pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            data: data.into(),
        }
    }
}

/// エンコード済みの出力画像
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub file_name: String,
    pub content_type: &'static str,
    pub data: Vec<u8>,
    pub report: NormalizeReport,
}

/// バッチ内の1枚の失敗
#[derive(Debug, Error)]
#[error("{file_name}: {error}")]
pub struct BatchItemError {
    pub index: usize,
    pub file_name: String,
    #[source]
    pub error: TransformError,
}

/// 1枚をデコード → 正規化 → エンコードする
pub fn process_image(
    normalizer: &Normalizer,
    upload: &UploadedImage,
    params: &NormalizeParams,
    output: OutputSpec,
) -> Result<NormalizedImage, TransformError> {
    let image = decode_image(&upload.data)?;
    let normalized = normalizer.normalize(&image, params)?;
    let data = encode_image(&normalized.image, output)?;

    let (width, height) = normalized.report.canvas;
    let file_name = output_file_name(
        &normalized.report.platform,
        &upload.file_name,
        width,
        height,
        output.format,
    );

    Ok(NormalizedImage {
        file_name,
        content_type: output.format.content_type(),
        data,
        report: normalized.report,
    })
}

/// バッチ全体を処理する
///
/// 枚数が範囲外ならバッチごとエラー。それ以外は1枚ごとの結果を入力順に返す。
pub fn process_batch(
    normalizer: &Normalizer,
    uploads: &[UploadedImage],
    params: &NormalizeParams,
    output: OutputSpec,
    max_batch_size: usize,
) -> Result<Vec<Result<NormalizedImage, BatchItemError>>, ListingError> {
    validate_batch_size(uploads.len(), max_batch_size)?;

    let mut results: Vec<Result<NormalizedImage, BatchItemError>> = uploads
        .par_iter()
        .enumerate()
        .map(|(index, upload)| {
            process_image(normalizer, upload, params, output).map_err(|error| BatchItemError {
                index,
                file_name: upload.file_name.clone(),
                error,
            })
        })
        .collect();

    dedupe_file_names(results.iter_mut().filter_map(|r| r.as_mut().ok()));

    let failed = results.iter().filter(|r| r.is_err()).count();
    tracing::info!(
        platform = %params.platform,
        total = uploads.len(),
        failed,
        "batch processed"
    );

    Ok(results)
}

/// 同じ出力名が重複した場合に `_2`, `_3` ... を付ける
fn dedupe_file_names<'a>(images: impl Iterator<Item = &'a mut NormalizedImage>) {
    let mut seen: HashSet<String> = HashSet::new();
    for image in images {
        if seen.insert(image.file_name.clone()) {
            continue;
        }
        let (stem, ext) = match image.file_name.rsplit_once('.') {
            Some((stem, ext)) => (stem.to_string(), format!(".{ext}")),
            None => (image.file_name.clone(), String::new()),
        };
        let mut n = 2;
        loop {
            let candidate = format!("{stem}_{n}{ext}");
            if seen.insert(candidate.clone()) {
                image.file_name = candidate;
                break;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MAX_BATCH_SIZE;
    use crate::transform::OutputFormat;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png_upload(name: &str, w: u32, h: u32) -> UploadedImage {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([90, 10, 10])));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        UploadedImage::new(name, buf.into_inner())
    }

    #[test]
    fn test_process_image_names_output() {
        let normalizer = Normalizer::default();
        let upload = png_upload("zapatilla.jpg", 40, 30);
        let params = NormalizeParams::new("jumpseller", None, None);

        let out = process_image(&normalizer, &upload, &params, OutputSpec::default()).unwrap();
        assert_eq!(out.file_name, "jumpseller_zapatilla_800x800.png");
        assert_eq!(out.content_type, "image/png");

        let decoded = image::load_from_memory(&out.data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (800, 800));
    }

    #[test]
    fn test_batch_keeps_order_and_reports_failures() {
        let normalizer = Normalizer::default();
        let uploads = vec![
            png_upload("a.png", 10, 10),
            UploadedImage::new("broken.png", b"not an image".to_vec()),
            png_upload("c.png", 20, 5),
        ];
        let params = NormalizeParams::default();

        let results =
            process_batch(&normalizer, &uploads, &params, OutputSpec::default(), MAX_BATCH_SIZE)
                .unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().file_name, "kyte_a_1200x1000.png");
        let failure = results[1].as_ref().unwrap_err();
        assert_eq!(failure.index, 1);
        assert_eq!(failure.file_name, "broken.png");
        assert!(matches!(failure.error, TransformError::Decode(_)));
        assert_eq!(results[2].as_ref().unwrap().file_name, "kyte_c_1200x1000.png");
    }

    #[test]
    fn test_batch_size_is_validated() {
        let normalizer = Normalizer::default();
        let params = NormalizeParams::default();

        let empty = process_batch(&normalizer, &[], &params, OutputSpec::default(), MAX_BATCH_SIZE);
        assert!(matches!(empty, Err(ListingError::Validation(_))));

        let uploads: Vec<_> = (0..7).map(|i| png_upload(&format!("{i}.png"), 4, 4)).collect();
        let too_many =
            process_batch(&normalizer, &uploads, &params, OutputSpec::default(), MAX_BATCH_SIZE);
        assert!(matches!(too_many, Err(ListingError::Validation(_))));
    }

    #[test]
    fn test_duplicate_names_get_suffix() {
        let normalizer = Normalizer::default();
        let uploads = vec![
            png_upload("foto.png", 8, 8),
            png_upload("foto.jpg", 8, 8),
            png_upload("foto.webp", 8, 8),
        ];
        let params = NormalizeParams::default();
        let output = OutputSpec::new(OutputFormat::Jpeg, None);

        let names: Vec<String> = process_batch(&normalizer, &uploads, &params, output, MAX_BATCH_SIZE)
            .unwrap()
            .into_iter()
            .map(|r| r.unwrap().file_name)
            .collect();

        assert_eq!(
            names,
            vec![
                "kyte_foto_1200x1000.jpg",
                "kyte_foto_1200x1000_2.jpg",
                "kyte_foto_1200x1000_3.jpg",
            ]
        );
    }
}
