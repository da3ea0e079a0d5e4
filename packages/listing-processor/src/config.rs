use std::path::PathBuf;

use listing_core::{MAX_BATCH_SIZE, ProfileTable};

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// バッチ内の一部が失敗したときの扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPolicy {
    /// 1枚でも失敗したらリクエスト全体をエラーにする
    Abort,
    /// 失敗した画像を除いてアーカイブを返し、ヘッダで失敗を知らせる
    Skip,
}

impl BatchPolicy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "abort" => Some(Self::Abort),
            "skip" => Some(Self::Skip),
            _ => None,
        }
    }
}

/// サービス設定
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub listen_addr: String,
    pub profiles_path: Option<PathBuf>,
    pub max_batch_size: usize,
    pub max_upload_bytes: usize,
    pub batch_policy: BatchPolicy,
    /// 未知のプラットフォームを既定プロファイルへ落とさずに拒否する
    pub strict_platform: bool,
    pub temp_dir: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            profiles_path: None,
            max_batch_size: MAX_BATCH_SIZE,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            batch_policy: BatchPolicy::Abort,
            strict_platform: false,
            temp_dir: None,
        }
    }
}

impl ServiceConfig {
    /// 環境変数から設定を作成する
    ///
    /// いずれも任意:
    /// - LISTEN_ADDR
    /// - PROFILES_PATH
    /// - MAX_BATCH_SIZE
    /// - MAX_UPLOAD_BYTES
    /// - BATCH_POLICY (abort / skip)
    /// - STRICT_PLATFORM
    /// - TEMP_DIR
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let defaults = Self::default();

        let max_batch_size = match lookup("MAX_BATCH_SIZE") {
            Some(v) => v
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n >= 1)
                .ok_or_else(|| format!("MAX_BATCH_SIZE must be a positive integer, got {v}"))?,
            None => defaults.max_batch_size,
        };

        let max_upload_bytes = match lookup("MAX_UPLOAD_BYTES") {
            Some(v) => v
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n >= 1)
                .ok_or_else(|| format!("MAX_UPLOAD_BYTES must be a positive integer, got {v}"))?,
            None => defaults.max_upload_bytes,
        };

        let batch_policy = match lookup("BATCH_POLICY") {
            Some(v) => BatchPolicy::from_str(&v)
                .ok_or_else(|| format!("BATCH_POLICY must be abort or skip, got {v}"))?,
            None => defaults.batch_policy,
        };

        let strict_platform = match lookup("STRICT_PLATFORM") {
            Some(v) => parse_bool(&v)
                .ok_or_else(|| format!("STRICT_PLATFORM must be a boolean, got {v}"))?,
            None => defaults.strict_platform,
        };

        Ok(Self {
            listen_addr: lookup("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            profiles_path: lookup("PROFILES_PATH").map(PathBuf::from),
            max_batch_size,
            max_upload_bytes,
            batch_policy,
            strict_platform,
            temp_dir: lookup("TEMP_DIR").map(PathBuf::from),
        })
    }

    /// プロファイル表を読み込む。PROFILES_PATH が無ければ組み込みの表。
    pub fn load_profiles(&self) -> Result<ProfileTable, String> {
        let Some(path) = &self.profiles_path else {
            return Ok(ProfileTable::builtin());
        };
        let json = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
        ProfileTable::from_json(&json).map_err(|e| e.to_string())
    }

    /// リクエストボディの上限（全ファイル分 + フォームフィールドの余裕）
    pub fn body_limit(&self) -> usize {
        self.max_upload_bytes
            .saturating_mul(self.max_batch_size)
            .saturating_add(64 * 1024)
    }
}

pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:8000");
        assert_eq!(config.max_batch_size, 6);
        assert_eq!(config.batch_policy, BatchPolicy::Abort);
        assert!(!config.strict_platform);
        assert!(config.profiles_path.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = ServiceConfig::from_lookup(lookup_from(&[
            ("LISTEN_ADDR", "127.0.0.1:9000"),
            ("MAX_BATCH_SIZE", "3"),
            ("BATCH_POLICY", "skip"),
            ("STRICT_PLATFORM", "yes"),
            ("TEMP_DIR", "/var/tmp/listing"),
        ]))
        .unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.max_batch_size, 3);
        assert_eq!(config.batch_policy, BatchPolicy::Skip);
        assert!(config.strict_platform);
        assert_eq!(config.temp_dir, Some(PathBuf::from("/var/tmp/listing")));
    }

    #[test]
    fn test_invalid_values() {
        assert!(ServiceConfig::from_lookup(lookup_from(&[("MAX_BATCH_SIZE", "0")])).is_err());
        assert!(ServiceConfig::from_lookup(lookup_from(&[("BATCH_POLICY", "retry")])).is_err());
        assert!(ServiceConfig::from_lookup(lookup_from(&[("STRICT_PLATFORM", "maybe")])).is_err());
    }

    #[test]
    fn test_builtin_profiles_without_path() {
        let table = ServiceConfig::default().load_profiles().unwrap();
        assert!(table.contains("jumpseller"));
    }
}
