use chrono::{DateTime, Local};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct FileFacts {
    pub modified: DateTime<Local>,
    pub size: u64,
    pub original_stem: String,
    pub extension: String,
    pub path: PathBuf,
}

pub fn strip_timestamp_prefix(stem: &str) -> &str {
    let bytes = stem.as_bytes();
    if bytes.len() > 15 && bytes[..14].iter().all(u8::is_ascii_digit) && bytes[14] == b'_' {
        &stem[15..]
    } else {
        stem
    }
}
