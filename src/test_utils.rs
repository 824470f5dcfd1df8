//! テスト用ユーティリティ関数
//!
//! 複数のテストモジュールで使用される共通のヘルパー関数を提供します。
#![cfg(test)]

use serde_json::Value;

use crate::content::{
    BundleDefinition,
    ContentEntity,
    EntityTypeDefinition,
    FieldDefinition,
    FieldItem,
    FieldItemList,
    SchemaRegistry,
    TARGET_ID,
    TARGET_REVISION_ID,
};
use crate::types::{
    EntityId,
    RevisionId,
};

/// JSON 配列からフィールドアイテムのリストを作成する
///
/// 配列以外、またはオブジェクト以外の要素は無視される
pub(crate) fn items(json: Value) -> FieldItemList {
    let Value::Array(values) = json else {
        return Vec::new();
    };
    values
        .into_iter()
        .filter_map(|value| match value {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect()
}

/// 参照フィールドのアイテムを作成する
pub(crate) fn reference(target_id: EntityId, target_revision_id: RevisionId) -> FieldItem {
    let mut item = FieldItem::new();
    item.insert(TARGET_ID.to_string(), Value::from(target_id));
    item.insert(TARGET_REVISION_ID.to_string(), Value::from(target_revision_id));
    item
}

/// テスト用のスキーマを作成する
///
/// - `node.article`: 翻訳可能。`status` は翻訳不可、`field_paragraphs` は埋め込み
/// - `paragraph.text`: 言語を区別する埋め込みエンティティ
/// - `paragraph.shared`: 言語を区別しない埋め込みエンティティ（翻訳時に複製される）
pub(crate) fn schema() -> SchemaRegistry {
    let article = BundleDefinition::new("article", true)
        .label("Article")
        .field(FieldDefinition::new("title", "string").label("Title").max_length(255))
        .field(FieldDefinition::new("status", "list_string").label("Status").translatable(false))
        .field(FieldDefinition::new("body", "text_with_summary").label("Body"))
        .field(FieldDefinition::new("field_link", "link").label("Link"))
        .field(FieldDefinition::new("created", "created").label("Authored on"))
        .field(
            FieldDefinition::new("field_tags", "entity_reference")
                .label("Tags")
                .target_type("taxonomy_term"),
        )
        .field(
            FieldDefinition::new("field_paragraphs", "entity_reference_revisions")
                .label("Paragraphs")
                .translatable(false)
                .target_type("paragraph"),
        );

    let text_paragraph = BundleDefinition::new("text", true)
        .label("Text paragraph")
        .field(FieldDefinition::new("field_text", "text_long").label("Text"))
        .field(
            FieldDefinition::new("field_nested", "entity_reference_revisions")
                .label("Nested")
                .translatable(false)
                .target_type("paragraph"),
        );

    let shared_paragraph = BundleDefinition::new("shared", false)
        .label("Shared paragraph")
        .field(FieldDefinition::new("field_text", "text_long").label("Text"));

    SchemaRegistry::new()
        .with_type(EntityTypeDefinition::new("node", true).bundle(article))
        .with_type(
            EntityTypeDefinition::new("paragraph", true)
                .composite(true)
                .bundle(text_paragraph)
                .bundle(shared_paragraph),
        )
        .with_type(
            EntityTypeDefinition::new("taxonomy_term", true)
                .bundle(BundleDefinition::new("tags", true).label("Tags")),
        )
}

/// テスト用の記事を作成する（英語、`status` 付き）
pub(crate) fn article(id: EntityId, revision_id: RevisionId, title: &str) -> ContentEntity {
    ContentEntity::new("node", "article", id, revision_id, "en")
        .with_field("title", items(serde_json::json!([{"value": title}])))
        .with_field("status", items(serde_json::json!([{"value": "featured"}])))
}

/// テスト用の段落を作成する
pub(crate) fn paragraph(
    bundle: &str,
    id: EntityId,
    revision_id: RevisionId,
    text: &str,
) -> ContentEntity {
    ContentEntity::new("paragraph", bundle, id, revision_id, "en")
        .with_field("field_text", items(serde_json::json!([{"value": text, "format": "basic_html"}])))
}
