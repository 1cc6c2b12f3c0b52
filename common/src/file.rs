//! アップロード対象ファイル

use crate::error::{Error, Result};

/// 受け付ける拡張子（大文字小文字は区別しない）
pub const ACCEPTED_EXTENSIONS: &[&str] = &["xlsx", "xls"];

/// アップロード上限: 10 MiB
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// ユーザーが選択したスプレッドシート
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub size: u64,
    pub content: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size: content.len() as u64,
            content,
        }
    }

    /// 拡張子（小文字化済み）
    pub fn extension(&self) -> Option<String> {
        extension_of(&self.name)
    }

    /// 拡張子とサイズの検証。ネットワークに出す前に必ず通す
    pub fn validate(&self, max_bytes: u64) -> Result<()> {
        if !has_accepted_extension(&self.name) {
            return Err(Error::InvalidFile(format!(
                "{}: Excelファイル(.xlsx / .xls)を選択してください",
                self.name
            )));
        }

        if self.size > max_bytes {
            return Err(Error::InvalidFile(format!(
                "{}: ファイルが大きすぎます（{} > 最大{}）",
                self.name,
                format_file_size(self.size),
                format_file_size(max_bytes)
            )));
        }

        Ok(())
    }

    /// multipart送信時のContent-Type
    pub fn mime_type(&self) -> &'static str {
        match self.extension().as_deref() {
            Some("xls") => "application/vnd.ms-excel",
            _ => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }
}

fn extension_of(name: &str) -> Option<String> {
    name.rsplit_once('.').map(|(_, ext)| ext.to_lowercase())
}

pub fn has_accepted_extension(name: &str) -> bool {
    extension_of(name)
        .map(|ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// 人が読めるサイズ表記（B / KB / MB、小数1桁）
pub fn format_file_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
