use async_trait::async_trait;
use bytes::Bytes;
use image::{codecs::jpeg::JpegEncoder, Rgb, RgbImage};
use std::sync::{Arc, Mutex};

use cropbot_core::{
    config::AppConfig,
    mocks::{MockFileFetcher, Outbound, RecordingTransport},
    traits::{ChatMessage, GenerationParams, LlmClient, LlmResponse, LlmUsage},
    types::{ChatId, FileRef, InboundEvent},
};
use cropbot_gateway::{
    crop::RECEIVED_TEXT,
    router::{GENERIC_ERROR_TEXT, NOT_FOUND_TEXT},
    EventRouter,
};
use cropbot_store::InMemoryPendingStore;

// =============================================================================
// Scripted model for system tests
// =============================================================================

struct ScriptedLlm {
    reply: String,
    seen: Mutex<Vec<GenerationParams>>,
}

impl ScriptedLlm {
    fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn chat(
        &self,
        _messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> cropbot_core::Result<LlmResponse> {
        self.seen.lock().unwrap().push(*params);
        Ok(LlmResponse {
            content: self.reply.clone(),
            finish_reason: "stop".to_string(),
            usage: LlmUsage::default(),
        })
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// 1024x768 JPEG: red upper half, blue lower half.
fn listing_photo() -> Bytes {
    let img = RgbImage::from_fn(1024, 768, |_, y| {
        if y < 384 {
            Rgb([220, 20, 20])
        } else {
            Rgb([20, 20, 220])
        }
    });
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, 95)
        .encode_image(&img)
        .unwrap();
    Bytes::from(buf)
}

fn build(
    config: &AppConfig,
    llm: Option<Arc<dyn LlmClient>>,
) -> (EventRouter, Arc<RecordingTransport>) {
    let transport = Arc::new(RecordingTransport::new());
    let fetcher = MockFileFetcher::new().with_file("listing", listing_photo());
    let router = EventRouter::from_config(
        config,
        Arc::new(InMemoryPendingStore::new()),
        transport.clone(),
        Arc::new(fetcher),
        llm,
    );
    (router, transport)
}

fn photo(chat: i64) -> InboundEvent {
    InboundEvent::Photo {
        chat_id: ChatId(chat),
        file: FileRef::new("listing"),
    }
}

fn press(chat: i64, data: &str) -> InboundEvent {
    InboundEvent::ButtonPress {
        chat_id: ChatId(chat),
        data: data.to_string(),
    }
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_photo_to_north_crop() {
    let config = AppConfig::default();
    let (router, transport) = build(&config, None);

    router.handle(photo(42)).await;
    router.handle(press(42, "crop_1110x398_north")).await;

    assert_eq!(transport.texts(), vec![RECEIVED_TEXT.to_string()]);
    assert_eq!(transport.menus().len(), 2);

    let photos = transport.photos();
    assert_eq!(photos.len(), 1);
    assert_eq!(photos[0].1, "1110x398 (north)");

    let out = image::load_from_memory(&photos[0].0).unwrap().to_rgb8();
    assert_eq!(out.dimensions(), (1110, 398));
    let top = out.get_pixel(555, 10);
    let bottom = out.get_pixel(555, 390);
    assert!(top[0] > 180 && top[2] < 80, "got {:?}", top);
    assert!(bottom[0] > 180 && bottom[2] < 80, "got {:?}", bottom);
}

#[tokio::test]
async fn test_button_before_any_photo() {
    let (router, transport) = build(&AppConfig::default(), None);

    router.handle(press(42, "crop_345x250_center")).await;

    assert_eq!(transport.texts(), vec![NOT_FOUND_TEXT.to_string()]);
}

#[tokio::test]
async fn test_configured_menu_is_enforced() {
    let config = AppConfig::from_toml(
        r#"
        [crop]
        targets = [{ width = 200, height = 100 }]
        output_quality = 70
        "#,
    )
    .unwrap();
    let (router, transport) = build(&config, None);

    router.handle(photo(7)).await;
    let menus = transport.menus();
    assert_eq!(menus.len(), 1);
    assert!(menus[0].1.iter().all(|b| b.payload.starts_with("crop_200x100_")));

    router.handle(press(7, "crop_345x250_center")).await;
    assert_eq!(transport.texts().last().unwrap(), GENERIC_ERROR_TEXT);

    router.handle(press(7, "crop_200x100_south")).await;
    let photos = transport.photos();
    assert_eq!(photos.len(), 1);
    let out = image::load_from_memory(&photos[0].0).unwrap();
    assert_eq!((out.width(), out.height()), (200, 100));
}

#[tokio::test]
async fn test_rewrite_uses_configured_limits() {
    let config = AppConfig::from_toml(
        r#"
        [model_gateway]
        temperature = 0.2
        max_tokens = 300

        [safety]
        max_message_chars = 100
        "#,
    )
    .unwrap();
    let llm = Arc::new(ScriptedLlm::new("y".repeat(250)));
    let (router, transport) = build(&config, Some(llm.clone()));

    router
        .handle(InboundEvent::from_text(ChatId(5), "Ceramic mug, 350ml"))
        .await;

    assert_eq!(transport.sent()[0], Outbound::Typing { chat_id: ChatId(5) });
    let texts = transport.texts();
    assert_eq!(texts.iter().map(|t| t.len()).collect::<Vec<_>>(), vec![100, 100, 50]);

    let seen = llm.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!((seen[0].temperature - 0.2).abs() < f32::EPSILON);
    assert_eq!(seen[0].max_tokens, 300);
}

#[tokio::test]
async fn test_chats_are_served_independently() {
    let (router, transport) = build(&AppConfig::default(), None);
    let router = Arc::new(router);

    let a = {
        let router = router.clone();
        tokio::spawn(async move {
            router.handle(photo(1)).await;
            router.handle(press(1, "crop_345x250_north")).await;
        })
    };
    let b = {
        let router = router.clone();
        tokio::spawn(async move {
            router.handle(press(2, "crop_345x250_north")).await;
        })
    };
    a.await.unwrap();
    b.await.unwrap();

    let sent = transport.sent();
    let photos_for_1 = sent
        .iter()
        .filter(|o| matches!(o, Outbound::Photo { chat_id: ChatId(1), .. }))
        .count();
    assert_eq!(photos_for_1, 1);
    assert!(sent.iter().any(|o| matches!(
        o,
        Outbound::Text { chat_id: ChatId(2), text } if text == NOT_FOUND_TEXT
    )));
}
