//! 設定ファイルの探索と読み込み

use std::path::{
    Path,
    PathBuf,
};

use super::{
    ConfigError,
    TranslationSettings,
};

/// 設定ファイル名
pub const CONFIG_FILE_NAME: &str = ".content-translation.json";

/// `start` から親ディレクトリへ向かって設定ファイルを探す
///
/// 入れ子のプロジェクトでは最も近いファイルが優先される
pub(super) fn find_config_file(start: &Path) -> Option<PathBuf> {
    start.ancestors().map(|dir| dir.join(CONFIG_FILE_NAME)).find(|path| path.is_file())
}

/// 最も近い設定ファイルを読み込む
///
/// # Returns
/// - `Ok(Some((path, settings)))`: 見つかったファイルとその設定
/// - `Ok(None)`: どの祖先ディレクトリにも設定ファイルがない
///
/// # Errors
/// - ファイル読み込みエラー
/// - JSON パースエラー
pub(super) fn load_nearest(start: &Path) -> Result<Option<(PathBuf, TranslationSettings)>, ConfigError> {
    let Some(config_path) = find_config_file(start) else {
        tracing::debug!(start = ?start, "Configuration file not found");
        return Ok(None);
    };

    tracing::debug!(path = ?config_path, "Loading configuration");

    let content = std::fs::read_to_string(&config_path)?;
    let settings: TranslationSettings = serde_json::from_str(&content)?;

    Ok(Some((config_path, settings)))
}
