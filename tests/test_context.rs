mod common;

use common::ScriptedExtractor;
use mockito::Matcher;
use serde_json::json;
use std::fs;
use std::time::Duration;
use video_recipes::{
    CacheEntry, ContextConfig, ContextError, FileStore, HttpExtractor, MemoryStore, RecipeContext,
    RecipeError, SavedRecipe, SavedStore, VideoId,
};

const TOMATO_SOUP: &str = r#"{
    "title": "Tomato Soup",
    "ingredients": [
        {"name": "tomatoes", "quantity": "4"},
        {"name": "onion", "quantity": "1"}
    ],
    "steps": [
        {"step_number": 1, "description": "Chop"},
        {"step_number": 2, "description": "Simmer"}
    ]
}"#;

#[tokio::test]
async fn test_views_share_one_source_of_truth() {
    let extractor = ScriptedExtractor::with_delay(Duration::from_millis(20));
    let context = RecipeContext::builder()
        .extractor(extractor.clone())
        .build()
        .unwrap();
    let home = context.clone();
    let detail = context.clone();
    let id = VideoId::from("vid1");

    // Home list prefetch and detail view open at the same time
    let (prefetch, opened) = tokio::join!(home.get_or_fetch(&id), detail.get_or_fetch(&id));

    assert_eq!(prefetch.unwrap(), opened.unwrap());
    assert_eq!(extractor.calls(), 1);
    assert!(matches!(context.peek(&id), Some(CacheEntry::Ready(_))));
}

#[tokio::test]
async fn test_saving_does_not_fetch() {
    let extractor = ScriptedExtractor::new();
    let context = RecipeContext::builder()
        .extractor(extractor.clone())
        .build()
        .unwrap();
    let id = VideoId::from("vid1");

    context.save(&id);

    assert!(context.is_saved(&id));
    assert_eq!(context.peek(&id), None);
    assert_eq!(extractor.calls(), 0);
    assert_eq!(
        context.saved_recipes(),
        vec![SavedRecipe {
            video_id: id,
            entry: None
        }]
    );
}

#[tokio::test]
async fn test_saved_recipes_reflect_cache_state() {
    let extractor = ScriptedExtractor::new();
    extractor.script("bad", Err(RecipeError::ExtractionFailed("nope".to_string())));
    let context = RecipeContext::builder()
        .extractor(extractor.clone())
        .build()
        .unwrap();

    for id in ["good", "bad", "unfetched"] {
        context.save(&VideoId::from(id));
    }
    context.get_or_fetch(&VideoId::from("good")).await.unwrap();
    let _ = context.get_or_fetch(&VideoId::from("bad")).await;

    let saved = context.saved_recipes();
    assert_eq!(saved.len(), 3);
    let first = saved[0].entry.as_ref().and_then(|e| e.recipe());
    assert_eq!(first.map(|r| r.title.as_str()), Some("Recipe good"));
    assert!(matches!(saved[1].entry, Some(CacheEntry::Failed(_))));
    assert_eq!(saved[2].entry, None);
    assert_eq!(extractor.calls(), 2);
}

#[tokio::test]
async fn test_invalidate_does_not_touch_saved_set() {
    let context = RecipeContext::builder()
        .extractor(ScriptedExtractor::new())
        .build()
        .unwrap();
    let id = VideoId::from("vid1");

    context.save(&id);
    context.get_or_fetch(&id).await.unwrap();
    assert!(context.invalidate(&id));

    assert!(context.is_saved(&id));
    assert_eq!(context.list(), vec![id]);
}

#[tokio::test]
async fn test_toggle_saved() {
    let context = RecipeContext::builder()
        .extractor(ScriptedExtractor::new())
        .store(MemoryStore::default())
        .build()
        .unwrap();
    let id = VideoId::from("vid1");

    assert!(context.toggle_saved(&id));
    assert!(!context.toggle_saved(&id));
    assert!(context.list().is_empty());
}

#[tokio::test]
async fn test_cold_start_subscription() {
    let context = RecipeContext::builder()
        .extractor(ScriptedExtractor::new())
        .build()
        .unwrap();
    let mut notices = context.subscribe_cold_start();

    context.save(&VideoId::from("saved-only"));
    assert!(notices.try_recv().is_err());

    context.get_or_fetch(&VideoId::from("vid1")).await.unwrap();
    context.get_or_fetch(&VideoId::from("vid2")).await.unwrap();

    assert_eq!(notices.try_recv().unwrap().video_id, VideoId::from("vid1"));
    assert!(notices.try_recv().is_err());
}

#[tokio::test]
async fn test_cold_start_notice_arrives_before_fetch_completes() {
    let context = RecipeContext::builder()
        .extractor(ScriptedExtractor::with_delay(Duration::from_millis(300)))
        .build()
        .unwrap();
    let mut notices = context.subscribe_cold_start();
    let id = VideoId::from("vid1");

    let fetch = {
        let context = context.clone();
        let id = id.clone();
        tokio::spawn(async move { context.get_or_fetch(&id).await })
    };

    let notice = tokio::time::timeout(Duration::from_millis(100), notices.recv())
        .await
        .expect("notice should arrive while the extraction runs")
        .unwrap();
    assert_eq!(notice.video_id, id);
    assert_eq!(context.peek(&id), Some(CacheEntry::Pending));

    fetch.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_fetch_saved_reports_outcomes_in_order() {
    let extractor = ScriptedExtractor::with_delay(Duration::from_millis(10));
    extractor.script("gone", Err(RecipeError::NotFound(VideoId::from("gone"))));
    let context = RecipeContext::builder()
        .extractor(extractor.clone())
        .build()
        .unwrap();

    for id in ["b", "gone", "a"] {
        context.save(&VideoId::from(id));
    }
    context.get_or_fetch(&VideoId::from("a")).await.unwrap();

    let saved = context.fetch_saved().await;

    let ids: Vec<&str> = saved.iter().map(|s| s.video_id.as_str()).collect();
    assert_eq!(ids, vec!["b", "gone", "a"]);
    let title = saved[0].entry.as_ref().and_then(|e| e.recipe()).map(|r| r.title.clone());
    assert_eq!(title.as_deref(), Some("Recipe b"));
    assert_eq!(
        saved[1].entry,
        Some(CacheEntry::Failed(RecipeError::NotFound(VideoId::from("gone"))))
    );
    assert!(matches!(saved[2].entry, Some(CacheEntry::Ready(_))));
    // "a" was already cached
    assert_eq!(extractor.calls(), 3);
    assert_eq!(context.saved_recipes(), saved);
}

#[tokio::test]
async fn test_cold_start_rearms_when_idle_configured() {
    let context = RecipeContext::builder()
        .extractor(ScriptedExtractor::new())
        .cold_start_idle(Duration::ZERO)
        .build()
        .unwrap();
    let mut notices = context.subscribe_cold_start();

    context.get_or_fetch(&VideoId::from("vid1")).await.unwrap();
    context.get_or_fetch(&VideoId::from("vid2")).await.unwrap();

    assert!(notices.try_recv().is_ok());
    assert!(notices.try_recv().is_ok());
}

#[tokio::test]
async fn test_context_over_http_backend() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/scrape_video_id")
        .match_body(Matcher::Json(json!({"id": "vid1", "language": "en"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(TOMATO_SOUP)
        .expect(1)
        .create_async()
        .await;
    server
        .mock("POST", "/scrape_video_id")
        .match_body(Matcher::PartialJson(json!({"id": "gone"})))
        .with_status(404)
        .with_body(r#"{"detail": "Video not found or no transcript available"}"#)
        .create_async()
        .await;

    let context = RecipeContext::builder()
        .extractor(HttpExtractor::with_base_url(server.url()))
        .build()
        .unwrap();
    let id = VideoId::from("vid1");

    let (a, b) = tokio::join!(context.get_or_fetch(&id), context.get_or_fetch(&id));
    let recipe = a.unwrap();
    assert_eq!(recipe, b.unwrap());
    assert_eq!(recipe.title, "Tomato Soup");
    assert_eq!(recipe.ingredients, vec!["4 tomatoes", "1 onion"]);
    assert_eq!(context.get_or_fetch(&id).await.unwrap(), recipe);
    mock.assert_async().await;

    let gone = VideoId::from("gone");
    assert_eq!(
        context.get_or_fetch(&gone).await,
        Err(RecipeError::NotFound(gone.clone()))
    );
    assert_eq!(
        context.peek(&gone),
        Some(CacheEntry::Failed(RecipeError::NotFound(gone)))
    );
}

#[tokio::test]
async fn test_from_config_with_file_storage() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/scrape_video_id")
        .match_body(Matcher::Json(json!({"id": "vid1", "language": "fr"})))
        .with_status(200)
        .with_body(TOMATO_SOUP)
        .create_async()
        .await;

    let path = std::env::temp_dir().join(format!(
        "video-recipes-context-{}.json",
        std::process::id()
    ));
    let _ = fs::remove_file(&path);

    let mut config = ContextConfig::default();
    config.extractor.base_url = server.url();
    config.extractor.language = "fr".to_string();
    config.storage.path = Some(path.clone());

    let context = RecipeContext::from_config(config.clone()).unwrap();
    context.save(&VideoId::from("vid1"));
    context.save(&VideoId::from("vid2"));
    assert_eq!(
        context.get_or_fetch(&VideoId::from("vid1")).await.unwrap().title,
        "Tomato Soup"
    );

    // A new session rehydrates the saved list but starts with a cold cache
    let next = RecipeContext::from_config(config).unwrap();
    assert_eq!(next.list(), vec![VideoId::from("vid1"), VideoId::from("vid2")]);
    assert_eq!(next.peek(&VideoId::from("vid1")), None);
    assert_eq!(
        FileStore::new(&path).load().unwrap(),
        vec![VideoId::from("vid1"), VideoId::from("vid2")]
    );

    let _ = fs::remove_file(path);
}

#[test]
fn test_builder_requires_extractor() {
    let result = RecipeContext::builder().build();
    assert!(matches!(result, Err(ContextError::BuilderError(_))));
}
