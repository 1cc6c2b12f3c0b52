//! ローカルのスプレッドシートを読み込む

use crate::error::{OptimizerError, Result};
use salon_optimizer_common::{UploadedFile, MAX_UPLOAD_BYTES};
use std::path::Path;

/// パスからアップロード対象を作る
///
/// 拡張子とサイズはファイル本体を読む前に検査する。
/// `max_bytes` は 10MiB を超えて指定しても 10MiB として扱う。
pub fn read_spreadsheet(path: &Path, max_bytes: u64) -> Result<UploadedFile> {
    let max_bytes = max_bytes.min(MAX_UPLOAD_BYTES);
    if !path.is_file() {
        return Err(OptimizerError::InvalidFile(format!(
            "ファイルが見つかりません: {}",
            path.display()
        )));
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let size = std::fs::metadata(path)?.len();

    UploadedFile {
        name: name.clone(),
        size,
        content: Vec::new(),
    }
    .validate(max_bytes)
    .map_err(OptimizerError::from_validation)?;

    let content = std::fs::read(path)?;
    Ok(UploadedFile::new(name, content))
}
