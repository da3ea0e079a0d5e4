use axum::extract::Multipart;
use serde::Deserialize;

use crate::AppState;
use crate::config::parse_bool;
use crate::handler::AppError;
use listing_core::{
    DEFAULT_PLATFORM, ListingError, NormalizeParams, OutputFormat, OutputSpec, ScalePolicy,
    UploadedImage, validate_params,
};

/// クエリ文字列・フォームフィールドで受け取る正規化オプション
#[derive(Debug, Default, Deserialize)]
pub struct NormalizeQuery {
    pub platform: Option<String>,
    pub width_percent: Option<u32>,
    pub height_percent: Option<u32>,
    pub policy: Option<String>,
    pub crop: Option<bool>,
    #[serde(alias = "f")]
    pub format: Option<String>,
    #[serde(alias = "q")]
    pub quality: Option<u8>,
}

impl NormalizeQuery {
    /// フォームのテキストフィールドで上書きする。未知のフィールドは無視。
    pub fn apply_field(&mut self, name: &str, value: &str) -> Result<(), ListingError> {
        let value = value.trim();
        match name {
            "platform" => self.platform = Some(value.to_string()),
            "width_percent" => self.width_percent = Some(parse_number(name, value)?),
            "height_percent" => self.height_percent = Some(parse_number(name, value)?),
            "policy" => self.policy = Some(value.to_string()),
            "crop" => {
                let crop = parse_bool(value).ok_or_else(|| {
                    ListingError::Validation(format!("crop must be a boolean, got {value}"))
                })?;
                self.crop = Some(crop);
            }
            "format" | "f" => self.format = Some(value.to_string()),
            "quality" | "q" => self.quality = Some(parse_number(name, value)?),
            _ => {}
        }
        Ok(())
    }

    /// 検証して正規化・エンコードのパラメータに変換する
    pub fn resolve(&self, state: &AppState) -> Result<(NormalizeParams, OutputSpec), ListingError> {
        validate_params(self.width_percent, self.height_percent, self.quality)?;

        let platform = self
            .platform
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_PLATFORM);
        if state.config.strict_platform && !state.normalizer.profiles().contains(platform) {
            return Err(ListingError::Validation(format!("unknown platform: {platform}")));
        }

        let policy = match self.policy.as_deref() {
            Some(p) => ScalePolicy::from_str(p)
                .ok_or_else(|| ListingError::Validation(format!("unknown policy: {p}")))?,
            None => ScalePolicy::Contain,
        };

        let format = match self.format.as_deref() {
            Some(f) => OutputFormat::from_str(f)
                .ok_or_else(|| ListingError::Validation(format!("unsupported format: {f}")))?,
            None => OutputFormat::Png,
        };

        let params = NormalizeParams::new(platform, self.width_percent, self.height_percent)
            .with_policy(policy)
            .with_crop(self.crop.unwrap_or(true));

        Ok((params, OutputSpec::new(format, self.quality)))
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ListingError> {
    value
        .parse()
        .map_err(|_| ListingError::Validation(format!("{name} must be a number, got {value}")))
}

/// マルチパートフォームの内容
#[derive(Debug)]
pub struct UploadForm {
    pub files: Vec<UploadedImage>,
    pub options: NormalizeQuery,
}

/// マルチパートを読み取り、ファイルとテキストフィールドを振り分ける
///
/// ファイル名付きのフィールドはすべて画像として扱う。
pub async fn read_form(
    mut multipart: Multipart,
    options: NormalizeQuery,
    state: &AppState,
) -> Result<UploadForm, AppError> {
    let mut form = UploadForm {
        files: Vec::new(),
        options,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if let Some(file_name) = field.file_name().map(str::to_string) {
            if form.files.len() >= state.config.max_batch_size {
                return Err(AppError::BadRequest(format!(
                    "at most {} images per request",
                    state.config.max_batch_size
                )));
            }

            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("failed to read {file_name}: {e}")))?;
            if data.len() > state.config.max_upload_bytes {
                return Err(AppError::PayloadTooLarge(format!(
                    "{file_name} exceeds {} bytes",
                    state.config.max_upload_bytes
                )));
            }

            tracing::debug!(field = %name, file_name = %file_name, size = data.len(), "file received");
            form.files.push(UploadedImage::new(file_name, data));
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(format!("failed to read field {name}: {e}")))?;
            form.options.apply_field(&name, &value)?;
        }
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use listing_core::Normalizer;
    use std::sync::Arc;

    fn state(strict: bool) -> AppState {
        AppState {
            normalizer: Normalizer::default(),
            config: Arc::new(ServiceConfig {
                strict_platform: strict,
                ..ServiceConfig::default()
            }),
        }
    }

    #[test]
    fn test_fields_override_query() {
        let mut query = NormalizeQuery {
            platform: Some("kyte".to_string()),
            width_percent: Some(70),
            ..NormalizeQuery::default()
        };
        query.apply_field("platform", "jumpseller").unwrap();
        query.apply_field("height_percent", " 80 ").unwrap();
        query.apply_field("crop", "false").unwrap();
        query.apply_field("unrelated", "whatever").unwrap();

        let (params, output) = query.resolve(&state(false)).unwrap();
        assert_eq!(params.platform, "jumpseller");
        assert_eq!(params.width_percent, Some(70));
        assert_eq!(params.height_percent, Some(80));
        assert!(!params.crop);
        assert_eq!(output.format, OutputFormat::Png);
    }

    #[test]
    fn test_invalid_field_values() {
        let mut query = NormalizeQuery::default();
        assert!(query.apply_field("width_percent", "seventy").is_err());
        assert!(query.apply_field("crop", "perhaps").is_err());
    }

    #[test]
    fn test_resolve_rejects_bad_options() {
        let query = NormalizeQuery {
            policy: Some("stretch".to_string()),
            ..NormalizeQuery::default()
        };
        assert!(query.resolve(&state(false)).is_err());

        let query = NormalizeQuery {
            width_percent: Some(0),
            ..NormalizeQuery::default()
        };
        assert!(query.resolve(&state(false)).is_err());
    }

    #[test]
    fn test_strict_platform() {
        let query = NormalizeQuery {
            platform: Some("mercadolibre".to_string()),
            ..NormalizeQuery::default()
        };
        // 既定ではフォールバックに任せる
        assert!(query.resolve(&state(false)).is_ok());
        assert!(query.resolve(&state(true)).is_err());
    }

    #[test]
    fn test_cover_policy_and_format() {
        let query = NormalizeQuery {
            policy: Some("cover".to_string()),
            format: Some("jpg".to_string()),
            quality: Some(75),
            ..NormalizeQuery::default()
        };
        let (params, output) = query.resolve(&state(false)).unwrap();
        assert_eq!(params.policy, ScalePolicy::cover());
        assert_eq!(output.format, OutputFormat::Jpeg);
        assert_eq!(output.quality, 75);
    }
}
