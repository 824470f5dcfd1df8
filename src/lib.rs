//! content-translation
//!
//! 構造化されたコンテンツの翻訳を抽出・再構成し、公開版と検証版が並行する
//! リビジョンの中で翻訳の参照先を管理するライブラリ

pub mod config;
pub mod content;
pub mod error;
pub mod field;
pub mod logging;
pub mod mapping;
pub mod revision;
pub mod service;
pub mod source;
pub mod storage;
pub mod tree;
pub mod types;

mod test_utils;

pub use error::TranslationError;
pub use service::{
    TranslationRequest,
    TranslationService,
};
