//! アップロードされたファイル名から出力ファイル名を作る

use crate::transform::params::OutputFormat;

const MAX_STEM_LEN: usize = 64;
const FALLBACK_STEM: &str = "image";

/// ファイル名から安全な語幹を取り出す
///
/// URL デコードし、ディレクトリ部分と拡張子を取り除いたうえで、
/// 英数字・ハイフン・アンダースコア以外を `_` に置き換える。
/// 何も残らなければ `image`。
pub fn output_stem(file_name: &str) -> String {
    let decoded = urlencoding::decode(file_name)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| file_name.to_string());

    // パス区切りはどちらも落とす（Windows クライアントのフルパス対策）
    let base = decoded
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    // 最初のドットより前を語幹とする
    let stem = base.split('.').next().unwrap_or_default();

    let cleaned: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_STEM_LEN)
        .collect();

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        trimmed.to_string()
    }
}

/// `{platform}_{stem}_{W}x{H}.{ext}` 形式の出力ファイル名
pub fn output_file_name(
    platform: &str,
    file_name: &str,
    width: u32,
    height: u32,
    format: OutputFormat,
) -> String {
    format!(
        "{platform}_{}_{width}x{height}.{}",
        output_stem(file_name),
        format.extension()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_names() {
        assert_eq!(output_stem("zapato.jpg"), "zapato");
        assert_eq!(output_stem("photo-123.final.png"), "photo-123");
        assert_eq!(output_stem("IMG_0001"), "IMG_0001");
    }

    #[test]
    fn test_directories_are_stripped() {
        assert_eq!(output_stem("../../etc/passwd"), "passwd");
        assert_eq!(output_stem("C:\\Users\\ana\\bolso rojo.jpeg"), "bolso_rojo");
        assert_eq!(output_stem("%2E%2E%2Fsecret.png"), "secret");
    }

    #[test]
    fn test_fallback_stem() {
        assert_eq!(output_stem(""), "image");
        assert_eq!(output_stem(".hidden"), "image");
        assert_eq!(output_stem("???.png"), "image");
    }

    #[test]
    fn test_long_name_is_capped() {
        let long = "a".repeat(200);
        assert_eq!(output_stem(&long).len(), MAX_STEM_LEN);
    }

    #[test]
    fn test_output_file_name() {
        let name = output_file_name("kyte", "camisa azul.jpg", 1200, 1000, OutputFormat::Png);
        assert_eq!(name, "kyte_camisa_azul_1200x1000.png");
    }
}
