//! 一時ディレクトリとアーカイブ
//!
//! 出力画像とアーカイブはリクエストごとの一時ディレクトリに置く。
//! `BatchWorkspace` を drop するとディレクトリごと削除されるため、
//! エラーで途中終了した場合も一時ファイルが残らない。

use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::batch::runner::NormalizedImage;
use crate::errors::ArchiveError;

/// `{platform}_images.zip`
pub fn archive_name(platform: &str) -> String {
    format!("{platform}_images.zip")
}

/// リクエスト単位の一時作業領域
#[derive(Debug)]
pub struct BatchWorkspace {
    dir: TempDir,
}

impl BatchWorkspace {
    /// 一時ディレクトリを作成する。root が None ならシステムの一時領域。
    pub fn new(root: Option<&Path>) -> Result<Self, ArchiveError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("listing-batch-");
        let dir = match root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        tracing::debug!(path = %dir.path().display(), "batch workspace created");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// 出力画像を書き出し、そのパスを返す
    pub fn write_image(&self, image: &NormalizedImage) -> Result<PathBuf, ArchiveError> {
        let path = self.dir.path().join(&image.file_name);
        fs::write(&path, &image.data)?;
        Ok(path)
    }

    /// 書き出したファイルを zip にまとめ、アーカイブのバイト列を返す
    pub fn bundle(&self, archive_name: &str, files: &[PathBuf]) -> Result<Vec<u8>, ArchiveError> {
        if files.is_empty() {
            return Err(ArchiveError::Empty);
        }

        let archive_path = self.dir.path().join(archive_name);
        let mut zip = ZipWriter::new(BufWriter::new(File::create(&archive_path)?));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for path in files {
            let entry_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| {
                    ArchiveError::Io(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("invalid archive entry: {}", path.display()),
                    ))
                })?;
            zip.start_file(entry_name, options)?;
            io::copy(&mut File::open(path)?, &mut zip)?;
        }

        let mut writer = zip.finish()?;
        io::Write::flush(&mut writer)?;
        drop(writer);

        Ok(fs::read(&archive_path)?)
    }
}

impl Drop for BatchWorkspace {
    fn drop(&mut self) {
        tracing::debug!(path = %self.dir.path().display(), "batch workspace released");
    }
}

/// 出力画像一式を zip にまとめる
///
/// 一時ファイルは関数を抜けた時点で削除される。
pub fn build_archive(
    images: &[NormalizedImage],
    platform: &str,
    temp_root: Option<&Path>,
) -> Result<Vec<u8>, ArchiveError> {
    let workspace = BatchWorkspace::new(temp_root)?;
    let files = images
        .iter()
        .map(|image| workspace.write_image(image))
        .collect::<Result<Vec<_>, _>>()?;
    workspace.bundle(&archive_name(platform), &files)
}
