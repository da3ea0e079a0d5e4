//! プラットフォームごとのキャンバス設定
//!
//! 起動時に一度だけ構築し、以降は読み取り専用で共有する。
//! 未知の ID は例外にせず既定プロファイルへフォールバックする（可用性優先）。
//! 厳密に検証したい呼び出し側は `get` / `contains` を使う。

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_PLATFORM;
use crate::errors::TransformError;

/// 出品プラットフォームのキャンバス設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformProfile {
    pub id: String,
    #[serde(default)]
    pub label: String,
    pub width: u32,
    pub height: u32,
    /// 商品が占める幅の既定割合（%）
    pub width_percent: u32,
    /// 商品が占める高さの既定割合（%）
    pub height_percent: u32,
}

impl PlatformProfile {
    pub fn new(id: &str, label: &str, width: u32, height: u32, fill: (u32, u32)) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            width,
            height,
            width_percent: fill.0,
            height_percent: fill.1,
        }
    }

    /// "1200x1000" 形式の寸法文字列
    pub fn dimensions_label(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }

    fn validate(&self) -> Result<(), TransformError> {
        if self.id.trim().is_empty() {
            return Err(TransformError::InvalidProfile("profile id is empty".to_string()));
        }
        if self.width == 0 || self.height == 0 {
            return Err(TransformError::InvalidProfile(format!(
                "{}: canvas must be positive, got {}x{}",
                self.id, self.width, self.height
            )));
        }
        if self.width_percent == 0 || self.height_percent == 0 {
            return Err(TransformError::InvalidProfile(format!(
                "{}: default fill percent must be positive",
                self.id
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ProfileDocument {
    #[serde(default = "default_platform_id")]
    default: String,
    profiles: Vec<PlatformProfile>,
}

fn default_platform_id() -> String {
    DEFAULT_PLATFORM.to_string()
}

/// 不変のプロファイル表
#[derive(Debug, Clone)]
pub struct ProfileTable {
    profiles: Vec<PlatformProfile>,
    default_index: usize,
}

impl ProfileTable {
    /// プロファイル一覧と既定 ID から表を作成する
    ///
    /// 既定 ID が一覧に無い場合、ID が重複している場合はエラー。
    pub fn new(profiles: Vec<PlatformProfile>, default_id: &str) -> Result<Self, TransformError> {
        let mut normalized: Vec<PlatformProfile> = Vec::with_capacity(profiles.len());
        for mut profile in profiles {
            profile.validate()?;
            profile.id = normalize_id(&profile.id);
            if normalized.iter().any(|p| p.id == profile.id) {
                return Err(TransformError::InvalidProfile(format!(
                    "duplicate profile id: {}",
                    profile.id
                )));
            }
            normalized.push(profile);
        }

        let default_key = normalize_id(default_id);
        let default_index = normalized
            .iter()
            .position(|p| p.id == default_key)
            .ok_or_else(|| {
                TransformError::InvalidProfile(format!("default profile not found: {default_id}"))
            })?;

        Ok(Self {
            profiles: normalized,
            default_index,
        })
    }

    /// 組み込みのプロファイル表
    pub fn builtin() -> Self {
        let jumpseller_fill = (90, 90);
        let profiles = vec![
            PlatformProfile::new("kyte", "Kyte", 1200, 1000, (70, 75)),
            PlatformProfile::new("jumpseller", "Jumpseller", 800, 800, jumpseller_fill),
            PlatformProfile::new(
                "jumpseller_proportion65",
                "Jumpseller 6:5",
                1200,
                1000,
                jumpseller_fill,
            ),
            PlatformProfile::new("jumpseller_square", "Jumpseller 1:1", 527, 527, jumpseller_fill),
            PlatformProfile::new("jumpseller_portrait", "Jumpseller 3:4", 527, 702, jumpseller_fill),
            PlatformProfile::new(
                "jumpseller_landscape",
                "Jumpseller 16:9",
                527,
                296,
                jumpseller_fill,
            ),
            PlatformProfile::new(
                "jumpseller_rectangular",
                "Jumpseller 4:3",
                527,
                395,
                jumpseller_fill,
            ),
        ];

        Self {
            profiles,
            default_index: 0,
        }
    }

    /// JSON 文書から表を作成する
    ///
    /// `{ "default": "kyte", "profiles": [{ "id": ..., "width": ..., ... }] }`
    pub fn from_json(json: &str) -> Result<Self, TransformError> {
        let doc: ProfileDocument = serde_json::from_str(json)
            .map_err(|e| TransformError::InvalidProfile(format!("malformed profile table: {e}")))?;
        Self::new(doc.profiles, &doc.default)
    }

    /// ID に一致するプロファイルを返す。未知なら既定プロファイル。
    pub fn resolve(&self, id: &str) -> &PlatformProfile {
        match self.get(id) {
            Some(profile) => profile,
            None => {
                let fallback = self.default_profile();
                tracing::debug!(requested = %id, fallback = %fallback.id, "unknown platform, using default");
                fallback
            }
        }
    }

    /// 厳密な検索（フォールバックしない）
    pub fn get(&self, id: &str) -> Option<&PlatformProfile> {
        let key = normalize_id(id);
        self.profiles.iter().find(|p| p.id == key)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn default_profile(&self) -> &PlatformProfile {
        &self.profiles[self.default_index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlatformProfile> {
        self.profiles.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(|p| p.id.as_str())
    }
}

impl Default for ProfileTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn normalize_id(id: &str) -> String {
    id.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_platforms() {
        let table = ProfileTable::builtin();

        let kyte = table.resolve("kyte");
        assert_eq!((kyte.width, kyte.height), (1200, 1000));
        assert_eq!((kyte.width_percent, kyte.height_percent), (70, 75));

        let jumpseller = table.resolve("jumpseller");
        assert_eq!((jumpseller.width, jumpseller.height), (800, 800));
    }

    #[test]
    fn test_resolve_unknown_falls_back_to_default() {
        let table = ProfileTable::builtin();
        let profile = table.resolve("mercadolibre");
        assert_eq!(profile.id, "kyte");

        let profile = table.resolve("");
        assert_eq!(profile.id, "kyte");
    }

    #[test]
    fn test_strict_lookup() {
        let table = ProfileTable::builtin();
        assert!(table.contains("jumpseller_square"));
        assert!(table.contains("  Kyte "));
        assert!(table.get("mercadolibre").is_none());
    }

    #[test]
    fn test_builtin_ids_in_order() {
        let table = ProfileTable::builtin();
        let ids: Vec<&str> = table.ids().collect();
        assert_eq!(ids[0], "kyte");
        assert_eq!(ids.len(), 7);
    }

    #[test]
    fn test_from_json_synthetic_table() {
        let json = r#"{
            "default": "tiny",
            "profiles": [
                { "id": "tiny", "width": 10, "height": 20, "width_percent": 50, "height_percent": 50 },
                { "id": "wide", "label": "Wide", "width": 300, "height": 100, "width_percent": 80, "height_percent": 90 }
            ]
        }"#;
        let table = ProfileTable::from_json(json).unwrap();
        assert_eq!(table.resolve("unknown").id, "tiny");
        assert_eq!(table.resolve("wide").label, "Wide");
    }

    #[test]
    fn test_missing_default_rejected() {
        let profiles = vec![PlatformProfile::new("a", "A", 10, 10, (50, 50))];
        let result = ProfileTable::new(profiles, "b");
        assert!(matches!(result, Err(TransformError::InvalidProfile(_))));
    }

    #[test]
    fn test_zero_canvas_rejected() {
        let profiles = vec![PlatformProfile::new("a", "A", 0, 10, (50, 50))];
        assert!(ProfileTable::new(profiles, "a").is_err());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let profiles = vec![
            PlatformProfile::new("a", "A", 10, 10, (50, 50)),
            PlatformProfile::new("A", "A2", 20, 20, (50, 50)),
        ];
        assert!(ProfileTable::new(profiles, "a").is_err());
    }
}
