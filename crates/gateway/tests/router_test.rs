use bytes::Bytes;
use image::{DynamicImage, ImageFormat as CodecFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;
use std::sync::Arc;

use cropbot_core::{
    mocks::{MockFileFetcher, MockLlm, Outbound, RecordingTransport},
    traits::PendingUploadStore,
    types::{ChatCommand, ChatId, FileRef, ImageFormat, InboundEvent, TargetSize},
    Error,
};
use cropbot_gateway::{
    crop::RECEIVED_TEXT,
    router::{
        GENERIC_ERROR_TEXT, HELP_TEXT, NOT_FOUND_TEXT, REWRITE_DISABLED_TEXT, REWRITE_FAILED_TEXT,
        SEND_IMAGE_TEXT,
    },
    CropMenu, CropProtocol, EventRouter, ImageProcessor, TextRewriter,
};
use cropbot_store::InMemoryPendingStore;

const CHAT: ChatId = ChatId(42);

fn png(width: u32, height: u32) -> Bytes {
    let img = RgbaImage::from_pixel(width, height, Rgba([10, 200, 10, 255]));
    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), CodecFormat::Png)
        .unwrap();
    Bytes::from(buf)
}

fn jpeg(width: u32, height: u32) -> Bytes {
    let img = RgbImage::from_pixel(width, height, Rgb([200, 10, 10]));
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), CodecFormat::Jpeg)
        .unwrap();
    Bytes::from(buf)
}

struct Bot {
    router: EventRouter,
    store: Arc<InMemoryPendingStore>,
    transport: Arc<RecordingTransport>,
}

fn bot(llm: Option<Arc<MockLlm>>) -> Bot {
    let store = Arc::new(InMemoryPendingStore::new());
    let transport = Arc::new(RecordingTransport::new());
    let fetcher = MockFileFetcher::new()
        .with_file("photo", jpeg(320, 240))
        .with_file("sticker", png(64, 64));

    let crop = CropProtocol::new(
        store.clone(),
        transport.clone(),
        Arc::new(fetcher),
        ImageProcessor::default(),
        CropMenu::new(vec![
            TargetSize::new(1110, 398).unwrap(),
            TargetSize::new(345, 250).unwrap(),
        ]),
    );
    let mut router = EventRouter::new(crop, transport.clone()).with_greeting("Hi there!");
    if let Some(llm) = llm {
        router = router.with_rewriter(TextRewriter::new(llm));
    }

    Bot {
        router,
        store,
        transport,
    }
}

fn photo_event() -> InboundEvent {
    InboundEvent::Photo {
        chat_id: CHAT,
        file: FileRef::new("photo"),
    }
}

fn press(data: &str) -> InboundEvent {
    InboundEvent::ButtonPress {
        chat_id: CHAT,
        data: data.to_string(),
    }
}

#[tokio::test]
async fn test_photo_then_button_delivers_crop() {
    let bot = bot(None);

    bot.router.handle(photo_event()).await;
    bot.router.handle(press("crop_345x250_center")).await;

    assert_eq!(bot.transport.texts(), vec![RECEIVED_TEXT.to_string()]);
    assert_eq!(bot.transport.menus().len(), 2);
    let photos = bot.transport.photos();
    assert_eq!(photos.len(), 1);
    assert_eq!(photos[0].1, "345x250 (center)");
}

#[tokio::test]
async fn test_button_without_photo_asks_to_resend() {
    let bot = bot(None);

    bot.router.handle(press("crop_1110x398_north")).await;

    assert_eq!(bot.transport.texts(), vec![NOT_FOUND_TEXT.to_string()]);
    assert!(bot.transport.photos().is_empty());
}

#[tokio::test]
async fn test_png_document_is_normalized() {
    let bot = bot(None);

    bot.router
        .handle(InboundEvent::Document {
            chat_id: CHAT,
            file: FileRef::new("sticker"),
            mime_type: Some("image/png".into()),
        })
        .await;

    let pending = bot.store.get(CHAT).await.unwrap().expect("image stored");
    assert_eq!(pending.source_format, ImageFormat::Png);
    assert_eq!(
        image::guess_format(&pending.bytes).unwrap(),
        CodecFormat::Jpeg
    );
    assert_eq!(bot.transport.menus().len(), 2);
}

#[tokio::test]
async fn test_non_image_document_asks_for_image() {
    let bot = bot(None);

    bot.router
        .handle(InboundEvent::Document {
            chat_id: CHAT,
            file: FileRef::new("report"),
            mime_type: Some("application/pdf".into()),
        })
        .await;
    bot.router
        .handle(InboundEvent::Document {
            chat_id: CHAT,
            file: FileRef::new("unknown"),
            mime_type: None,
        })
        .await;

    assert_eq!(
        bot.transport.texts(),
        vec![SEND_IMAGE_TEXT.to_string(), SEND_IMAGE_TEXT.to_string()]
    );
    assert!(bot.store.is_empty());
}

#[tokio::test]
async fn test_failed_download_gets_generic_reply() {
    let bot = bot(None);

    bot.router
        .handle(InboundEvent::Photo {
            chat_id: CHAT,
            file: FileRef::new("missing"),
        })
        .await;

    assert_eq!(bot.transport.texts(), vec![GENERIC_ERROR_TEXT.to_string()]);
}

#[tokio::test]
async fn test_malformed_payload_gets_generic_reply() {
    let bot = bot(None);

    bot.router.handle(photo_event()).await;
    bot.router.handle(press("crop_everything")).await;

    assert_eq!(bot.transport.texts().last().unwrap(), GENERIC_ERROR_TEXT);
    assert!(bot.transport.photos().is_empty());
}

#[tokio::test]
async fn test_commands() {
    let llm = Arc::new(MockLlm::new(vec![]));
    let bot = bot(Some(llm.clone()));

    for command in [
        ChatCommand::Start,
        ChatCommand::Help,
        ChatCommand::Unknown("resize".into()),
    ] {
        bot.router
            .handle(InboundEvent::Command {
                chat_id: CHAT,
                command,
            })
            .await;
    }

    assert_eq!(
        bot.transport.texts(),
        vec![
            "Hi there!".to_string(),
            HELP_TEXT.to_string(),
            HELP_TEXT.to_string()
        ]
    );
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn test_text_is_rewritten_in_chunks() {
    let llm = Arc::new(MockLlm::constant(&"x".repeat(9000)));
    let bot = bot(Some(llm.clone()));

    bot.router
        .handle(InboundEvent::from_text(CHAT, "Wool scarf, grey, 180cm"))
        .await;

    let sent = bot.transport.sent();
    assert_eq!(sent[0], Outbound::Typing { chat_id: CHAT });
    let texts = bot.transport.texts();
    assert_eq!(texts.len(), 3);
    assert!(texts.iter().all(|t| t.chars().count() <= 4096));
    assert_eq!(texts.concat(), "x".repeat(9000));
    assert_eq!(llm.call_count(), 1);
}

#[tokio::test]
async fn test_rejected_rewrite_gets_failure_reply() {
    let llm = Arc::new(MockLlm::constant("Title 1: <b>Scarf</b>"));
    let bot = bot(Some(llm));

    bot.router.handle(InboundEvent::from_text(CHAT, "scarf")).await;

    assert_eq!(bot.transport.texts(), vec![REWRITE_FAILED_TEXT.to_string()]);
}

#[tokio::test]
async fn test_unreachable_model_gets_failure_reply() {
    let llm = Arc::new(MockLlm::failing(Error::network("connection refused")));
    let bot = bot(Some(llm));

    bot.router.handle(InboundEvent::from_text(CHAT, "scarf")).await;

    assert_eq!(bot.transport.texts(), vec![REWRITE_FAILED_TEXT.to_string()]);
}

#[tokio::test]
async fn test_text_without_rewriter() {
    let bot = bot(None);

    bot.router.handle(InboundEvent::from_text(CHAT, "scarf")).await;

    assert_eq!(bot.transport.texts(), vec![REWRITE_DISABLED_TEXT.to_string()]);
}
