//! 設定管理を行うモジュール

use std::path::{
    Path,
    PathBuf,
};

use super::{
    ConfigError,
    TranslationSettings,
    loader,
};

/// 翻訳設定とその読み込み元を管理する
#[derive(Default, Debug, Clone)]
pub struct ConfigManager {
    /// 現在の設定
    current_settings: TranslationSettings,

    /// 設定を読み込んだファイル（デフォルト値の場合は `None`）
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// デフォルト設定のマネージャーを作成
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `start` から最も近い設定ファイルを読み込む
    ///
    /// `start` が `None` か設定ファイルが見つからない場合はデフォルト値になる。
    /// 失敗した場合、現在の設定と読み込み元は変更されない。
    ///
    /// # Errors
    /// - ファイル読み込みエラー
    /// - JSON パースエラー
    /// - バリデーションエラー
    pub fn load_settings(&mut self, start: Option<&Path>) -> Result<(), ConfigError> {
        tracing::debug!(start = ?start, "Loading settings");

        let (config_path, settings) = match start.map(loader::load_nearest).transpose()?.flatten() {
            Some((path, settings)) => (Some(path), settings),
            None => (None, TranslationSettings::default()),
        };

        settings.validate().map_err(ConfigError::ValidationErrors)?;

        self.current_settings = settings;
        self.config_path = config_path;
        tracing::debug!(path = ?self.config_path, settings = ?self.current_settings, "Settings loaded");

        Ok(())
    }

    /// 読み込み元のファイルから設定を読み直す
    ///
    /// ファイルから読み込んでいない場合は何もしない。
    ///
    /// # Errors
    /// - [`ConfigManager::load_settings`] と同じ
    pub fn reload(&mut self) -> Result<(), ConfigError> {
        let Some(dir) = self.config_path.as_deref().and_then(Path::parent).map(Path::to_path_buf) else {
            return Ok(());
        };
        self.load_settings(Some(&dir))
    }

    /// 設定を更新する
    ///
    /// # Errors
    /// - バリデーションエラー（現在の設定は変更されない）
    pub fn update_settings(&mut self, new_settings: TranslationSettings) -> Result<(), ConfigError> {
        new_settings.validate().map_err(ConfigError::ValidationErrors)?;

        self.current_settings = new_settings;
        tracing::debug!("Settings updated");

        Ok(())
    }

    /// 現在の設定を取得
    #[must_use]
    pub const fn get_settings(&self) -> &TranslationSettings {
        &self.current_settings
    }

    /// 設定の読み込み元ファイルを取得
    #[must_use]
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}
