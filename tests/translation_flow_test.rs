//! 翻訳の抽出・保存・リビジョン対応付けの一連の流れに関するテスト

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]
#![allow(missing_docs)]

use std::collections::BTreeSet;
use std::fs;
use std::sync::Arc;

use content_translation::config::{
    CONFIG_FILE_NAME,
    ConfigManager,
    TranslationSettings,
};
use content_translation::content::{
    BundleDefinition,
    ContentEntity,
    EntityTypeDefinition,
    FieldDefinition,
    FieldItemList,
    SchemaRegistry,
    property_text,
};
use content_translation::mapping::InMemoryMappingStore;
use content_translation::revision::{
    InMemoryModeration,
    ModerationEvent,
    ResolveRequest,
    RevisionResolver,
};
use content_translation::source::{
    FieldWeightPolicy,
    PreviewCache,
    RecomposeOptions,
    TranslationContext,
};
use content_translation::storage::{
    EntityStorage,
    InMemoryStorage,
};
use content_translation::tree::FlatUnits;
use content_translation::types::{
    EntityKey,
    ModerationState,
    RevisionId,
    RevisionRef,
    Scope,
};
use content_translation::{
    TranslationError,
    TranslationRequest,
    TranslationService,
};
use googletest::prelude::*;
use rstest::{
    fixture,
    rstest,
};
use serde_json::json;
use tempfile::TempDir;

fn items(value: serde_json::Value) -> FieldItemList {
    serde_json::from_value(value).unwrap()
}

fn schema() -> SchemaRegistry {
    SchemaRegistry::new()
        .with_type(
            EntityTypeDefinition::new("node", true).bundle(
                BundleDefinition::new("article", true)
                    .label("Article")
                    .field(FieldDefinition::new("title", "string").label("Title"))
                    .field(
                        FieldDefinition::new("status", "list_string")
                            .label("Status")
                            .translatable(false),
                    )
                    .field(FieldDefinition::new("body", "text_with_summary").label("Body"))
                    .field(
                        FieldDefinition::new("field_paragraphs", "entity_reference_revisions")
                            .label("Paragraphs")
                            .translatable(false)
                            .target_type("paragraph"),
                    ),
            ),
        )
        .with_type(
            EntityTypeDefinition::new("paragraph", true).composite(true).bundle(
                BundleDefinition::new("text", true)
                    .label("Text paragraph")
                    .field(FieldDefinition::new("field_text", "text_long").label("Text")),
            ),
        )
}

fn article(revision_id: RevisionId, title: &str) -> ContentEntity {
    ContentEntity::new("node", "article", 1, revision_id, "en")
        .with_field("title", items(json!([{"value": title}])))
        .with_field("status", items(json!([{"value": "featured"}])))
        .with_field("body", items(json!([{"value": "<p>Body</p>", "format": "basic_html"}])))
}

struct World {
    storage: Arc<InMemoryStorage>,
    moderation: Arc<InMemoryModeration>,
    service: TranslationService,
    key: EntityKey,
}

impl World {
    fn new(settings: TranslationSettings) -> Self {
        Self::build(settings, |context| context)
    }

    fn build(
        settings: TranslationSettings,
        customize: impl FnOnce(TranslationContext) -> TranslationContext,
    ) -> Self {
        let storage = Arc::new(InMemoryStorage::new());
        let moderation = Arc::new(InMemoryModeration::new());
        let context = customize(TranslationContext::new(schema(), storage.clone(), settings).unwrap());
        let service =
            TranslationService::new(context, moderation.clone(), Arc::new(InMemoryMappingStore::new()));
        Self { storage, moderation, service, key: EntityKey::new("node", 1) }
    }

    /// Stores a revision of node 1 and records it in the moderation history.
    fn revision(&self, entity: ContentEntity, state: ModerationState) {
        self.moderation.record_default(&self.key, entity.revision_id, state);
        self.storage.insert(entity.with_moderation_state(state));
    }

    fn value(&self, revision_id: RevisionId, langcode: &str, field: &str) -> Option<String> {
        let entity = self.storage.load_revision("node", revision_id).unwrap();
        entity.translation(langcode)?.items(field).first()?.get("value").map(property_text)
    }

    fn scope_of(&self, langcode: &str) -> Option<Scope> {
        let record = self.service.mappings().record(&self.key).unwrap()?;
        record.entry(langcode).map(|entry| entry.scope)
    }

    fn advance(&self, advanced: Scope, previous_revision: RevisionId, new_revision: RevisionId) {
        self.service
            .handle_moderation_event(&ModerationEvent::NewDefaultRevision {
                entity: self.key.clone(),
                advanced,
                previous_revision,
                new_revision,
                retranslated: BTreeSet::new(),
                drop_translations: false,
            })
            .unwrap();
    }
}

/// 翻訳可能なすべてのユニットに `[langcode] 原文` を訳文として入れる
fn translate(request: &TranslationRequest) -> FlatUnits {
    let mut units = request.units.clone();
    let paths: Vec<String> = units
        .iter()
        .filter(|(_, unit)| unit.translatable)
        .map(|(path, _)| path.to_string())
        .collect();
    for path in paths {
        let text = units.get(&path).unwrap().text.clone();
        units.set_translation(&path, format!("[{}] {text}", request.target_langcode)).unwrap();
    }
    units
}

/// `it` への翻訳だけを常に R1 へ書き込むリゾルバー
#[derive(Debug)]
struct PinnedItalian;

impl RevisionResolver for PinnedItalian {
    fn priority(&self) -> i32 {
        100
    }

    fn resolve(&self, request: &ResolveRequest<'_>) -> Option<RevisionId> {
        (request.target_langcode == "it").then_some(1)
    }
}

/// タイトルだけに重みを付ける
#[derive(Debug)]
struct TitleFirst;

impl FieldWeightPolicy for TitleFirst {
    fn weight_of(&self, _entity_type: &str, _bundle: &str, field_name: &str) -> Option<i32> {
        (field_name == "title").then_some(-1)
    }
}

/// R1 公開済み（`fr` 翻訳あり）、R2 検証済み（英語のみ）
#[fixture]
fn world() -> World {
    let world = World::new(TranslationSettings::default());
    world.revision(
        article(1, "Hello").with_translated_field("fr", "title", items(json!([{"value": "Bonjour"}]))),
        ModerationState::Published,
    );
    world.revision(article(2, "Hello again").with_default_revision(false), ModerationState::Validated);
    world
}

/// 翻訳可能なフィールドだけが抽出され、翻訳不可のフィールドは保存後も保持される
#[rstest]
#[googletest::test]
fn title_is_translated_and_status_is_kept(world: World) {
    let request = world.service.open_request(&world.key, "de", Some(ModerationState::Published)).unwrap();

    expect_that!(
        request.units.paths().collect::<Vec<_>>(),
        elements_are![eq(&"body][0][format"), eq(&"body][0][value"), eq(&"title][0][value")]
    );

    let outcome =
        world.service.submit(&request, &translate(&request), RecomposeOptions::default()).unwrap();

    expect_that!(outcome.persisted, eq(true));
    expect_that!(outcome.entity.revision_id, eq(1));
    expect_that!(world.value(1, "de", "title"), some(eq("[de] Hello")));
    expect_that!(world.value(1, "de", "status"), some(eq("featured")));
    expect_that!(world.value(1, "en", "title"), some(eq("Hello")));
}

/// 検証版が再翻訳されずに作られた場合は旧リビジョンの翻訳を参照し、再翻訳で解除される
#[rstest]
#[googletest::test]
fn validated_revision_maps_to_the_published_translation(world: World) {
    world.advance(Scope::Validated, 1, 2);

    expect_that!(world.scope_of("fr"), some(eq(Scope::Validated)));
    expect_that!(
        world.service.display_revision(&world.key, "fr", ModerationState::Validated).unwrap(),
        some(eq(&RevisionRef::new(&world.key, 1)))
    );

    let request = world.service.open_request(&world.key, "fr", Some(ModerationState::Validated)).unwrap();
    let outcome =
        world.service.submit(&request, &translate(&request), RecomposeOptions::default()).unwrap();

    expect_that!(outcome.entity.revision_id, eq(2));
    expect_that!(world.value(2, "fr", "title"), some(eq("[fr] Hello again")));
    expect_that!(world.service.mappings().record(&world.key).unwrap().is_none(), eq(true));
    expect_that!(
        world.service.display_revision(&world.key, "fr", ModerationState::Validated).unwrap(),
        some(eq(&RevisionRef::new(&world.key, 2)))
    );
}

/// `Both` のエントリは公開版の再翻訳で `Validated` に狭まり、検証版の再翻訳で削除される
#[rstest]
#[googletest::test]
fn both_scope_narrows_then_disappears() {
    let world = World::new(TranslationSettings::default());
    world.revision(
        article(1, "Hello").with_translated_field("fr", "title", items(json!([{"value": "Bonjour"}]))),
        ModerationState::Published,
    );
    world.revision(article(2, "Hello published"), ModerationState::Published);
    world.revision(article(3, "Hello validated").with_default_revision(false), ModerationState::Validated);
    world.advance(Scope::Both, 1, 2);
    expect_that!(world.scope_of("fr"), some(eq(Scope::Both)));

    let published = world.service.open_request(&world.key, "fr", Some(ModerationState::Published)).unwrap();
    world.service.submit(&published, &translate(&published), RecomposeOptions::default()).unwrap();

    expect_that!(world.value(2, "fr", "title"), some(eq("[fr] Hello published")));
    expect_that!(world.scope_of("fr"), some(eq(Scope::Validated)));

    let validated = world.service.open_request(&world.key, "fr", Some(ModerationState::Validated)).unwrap();
    world.service.submit(&validated, &translate(&validated), RecomposeOptions::default()).unwrap();

    expect_that!(world.value(3, "fr", "title"), some(eq("[fr] Hello validated")));
    expect_that!(world.service.mappings().record(&world.key).unwrap().is_none(), eq(true));
}

/// 保存しないオプションではストレージへの書き込みが一切発生しない
#[rstest]
#[googletest::test]
fn preview_never_writes(world: World) {
    let request = world.service.open_request(&world.key, "de", None).unwrap();
    let units = translate(&request);

    let outcome = world.service.submit(&request, &units, RecomposeOptions::preview()).unwrap();
    let cache = PreviewCache::new();
    let preview = world.service.preview(&request, &units, &cache).unwrap();
    let cached = world.service.preview(&request, &units, &cache).unwrap();

    expect_that!(units.translations().count(), eq(2));
    expect_that!(outcome.persisted, eq(false));
    expect_that!(world.storage.write_count(), eq(0));
    expect_that!(Arc::ptr_eq(&preview, &cached), eq(true));
    expect_that!(
        preview.translation("de").and_then(|values| values.items("title").first()?.get("value").cloned()),
        some(eq(&json!("[de] Hello")))
    );
}

/// 同じ内容を二度保存しても二度目は書き込みが発生しない
#[rstest]
#[googletest::test]
fn saving_the_same_translation_twice_writes_once(world: World) {
    let request = world.service.open_request(&world.key, "de", Some(ModerationState::Published)).unwrap();
    let units = translate(&request);

    world.service.submit(&request, &units, RecomposeOptions::default()).unwrap();
    let first = world.storage.write_count();
    let outcome = world.service.submit(&request, &units, RecomposeOptions::default()).unwrap();

    expect_that!(first, eq(1));
    expect_that!(outcome.persisted, eq(false));
    expect_that!(world.storage.write_count(), eq(1));
}

/// 現在の検証版リビジョンへの手動の対応付けは拒否される
#[rstest]
#[googletest::test]
fn manual_mapping_rules(world: World) {
    expect_that!(
        world.service.set_mapping(&world.key, "fr", 2, Scope::Validated),
        err(displays_as(contains_substring("not older than the current validated revision 2")))
    );
    expect_that!(world.service.mappings().record(&world.key).unwrap().is_none(), eq(true));

    world.service.set_mapping(&world.key, "fr", 1, Scope::Validated).unwrap();
    expect_that!(world.scope_of("fr"), some(eq(Scope::Validated)));

    world.service.hide_translation(&world.key, "fr", Scope::Published).unwrap();
    expect_that!(
        world
            .service
            .display_revision(&world.key, "fr", ModerationState::Published)
            .unwrap()
            .as_ref()
            .map(RevisionRef::is_hidden),
        some(eq(true))
    );

    world.service.remove_mapping(&world.key, "fr").unwrap();
    expect_that!(world.service.mappings().record(&world.key).unwrap().is_none(), eq(true));
}

/// 構造の合わない翻訳は何も保存せずに失敗する
#[rstest]
fn mismatched_units_abort_the_save(world: World) {
    let request = world.service.open_request(&world.key, "de", None).unwrap();
    let mut units = translate(&request);
    units.insert(
        "title][0][value][extra",
        content_translation::tree::TranslationUnit::new("x").with_translation("y"),
    );

    let result = world.service.submit(&request, &units, RecomposeOptions::default());

    assert!(matches!(result, Err(TranslationError::ShapeMismatch { .. })));
    assert_eq!(world.storage.write_count(), 0);
}

/// 親ディレクトリの設定ファイルの区切り文字と除外設定がサービスに反映される
#[rstest]
#[googletest::test]
fn service_is_built_from_the_nearest_settings_file() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join(CONFIG_FILE_NAME),
        r#"{"pathDelimiter": "|", "fieldWeights": {"node.article.title": -1}, "excludedFields": ["node.article.body"]}"#,
    )
    .unwrap();
    let site = temp_dir.path().join("sites").join("default");
    fs::create_dir_all(&site).unwrap();
    let mut config = ConfigManager::new();
    config.load_settings(Some(&site)).unwrap();

    let storage = Arc::new(InMemoryStorage::new());
    let moderation = Arc::new(InMemoryModeration::new());
    let key = EntityKey::new("node", 1);
    moderation.record_default(&key, 1, ModerationState::Published);
    storage.insert(article(1, "Hello"));
    let service = TranslationService::from_config(
        &config,
        schema(),
        storage,
        moderation,
        Arc::new(InMemoryMappingStore::new()),
    )
    .unwrap();
    let request = service.open_request(&key, "fr", None).unwrap();

    expect_that!(service.codec().delimiter(), eq("|"));
    expect_that!(request.units.paths().collect::<Vec<_>>(), elements_are![eq(&"title|0|value")]);
    expect_that!(request.units.get("title|0|value").map(|unit| unit.text.as_str()), some(eq("Hello")));
}

/// 無効な除外パターンを含む設定からはサービスを作れない
#[rstest]
fn invalid_glob_in_settings_rejects_service() {
    let mut config = ConfigManager::new();
    let invalid = TranslationSettings { excluded_fields: vec!["node.[".to_string()], ..TranslationSettings::default() };
    assert!(config.update_settings(invalid.clone()).is_err());

    let result = TranslationContext::new(schema(), Arc::new(InMemoryStorage::new()), invalid);

    assert!(result.is_err());
}

/// プレビューはキャッシュを無効化するまで最初の結果を返す
#[rstest]
#[googletest::test]
fn edited_units_need_cache_invalidation(world: World) {
    let request = world.service.open_request(&world.key, "de", None).unwrap();
    let cache = PreviewCache::new();
    world.service.preview(&request, &translate(&request), &cache).unwrap();
    let mut edited = translate(&request);
    edited.set_translation("title][0][value", "Hallo").unwrap();

    let stale = world.service.preview(&request, &edited, &cache).unwrap();
    cache.invalidate(&world.key);
    let fresh = world.service.preview(&request, &edited, &cache).unwrap();

    let title = |entity: &ContentEntity| {
        entity.translation("de").and_then(|values| values.items("title").first()?.get("value").cloned())
    };
    expect_that!(title(&*stale), some(eq(&json!("[de] Hello"))));
    expect_that!(title(&*fresh), some(eq(&json!("Hallo"))));
}

/// 優先度の高いリゾルバーとフィールドの重みを差し替えられる
#[rstest]
#[googletest::test]
fn custom_resolver_and_weights_take_precedence() {
    let world = World::build(TranslationSettings::default(), |context| {
        context.with_weights(Arc::new(TitleFirst))
    });
    world.revision(article(1, "Hello"), ModerationState::Published);
    world.revision(article(2, "Hello again").with_default_revision(false), ModerationState::Validated);
    let World { storage, service, key, .. } = world;
    let service = service.with_resolver(Box::new(PinnedItalian));

    let request = service.open_request(&key, "it", Some(ModerationState::Validated)).unwrap();
    expect_that!(
        request.units.paths().collect::<Vec<_>>(),
        elements_are![eq(&"title][0][value"), eq(&"body][0][format"), eq(&"body][0][value")]
    );

    let outcome = service.submit(&request, &translate(&request), RecomposeOptions::default()).unwrap();

    expect_that!(outcome.entity.revision_id, eq(1));
    expect_that!(storage.load_revision("node", 1).unwrap().has_translation("it"), eq(true));
    expect_that!(storage.load_revision("node", 2).unwrap().has_translation("it"), eq(false));
}
