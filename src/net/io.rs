//! 网描述的读写：JSON（编辑器的 `.apn` 文件）与 RON。
use std::fs;
use std::path::Path;

use ron::ser::PrettyConfig;
use thiserror::Error;

use crate::net::data::NetData;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("ron error: {0}")]
    Ron(#[from] ron::Error),
    #[error("ron syntax error: {0}")]
    RonSpanned(#[from] ron::error::SpannedError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub fn to_json_string(net: &NetData) -> Result<String, IoError> {
    Ok(serde_json::to_string_pretty(net)?)
}

pub fn from_json_str(s: &str) -> Result<NetData, IoError> {
    Ok(serde_json::from_str(s)?)
}

pub fn to_ron_string(net: &NetData) -> Result<String, IoError> {
    let pretty = PrettyConfig::default().new_line("\n".to_owned());
    Ok(ron::ser::to_string_pretty(net, pretty)?)
}

pub fn from_ron_str(s: &str) -> Result<NetData, IoError> {
    Ok(ron::from_str(s)?)
}

fn is_ron(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("ron"))
}

/// Reads a net description; `.ron` files are RON, anything else is JSON.
pub fn read_net<P: AsRef<Path>>(path: P) -> Result<NetData, IoError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    if is_ron(path) {
        from_ron_str(&content)
    } else {
        from_json_str(&content)
    }
}

pub fn write_net<P: AsRef<Path>>(path: P, net: &NetData) -> Result<(), IoError> {
    let path = path.as_ref();
    let content = if is_ron(path) {
        to_ron_string(net)?
    } else {
        to_json_string(net)?
    };
    fs::write(path, content)?;
    Ok(())
}
