//! End-to-end runs against a scripted model.

use std::collections::VecDeque;
use std::io::Cursor;
use std::str::FromStr;
use std::sync::Mutex;

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;

use cartbill_core::{
    BillFormatter, BillSession, CartBillError, ImageInput, ImagePayload, ImageStatus,
    InferenceError, InferenceProvider, ItemExtractor,
};

/// Replies with canned text, one per call, in order.
struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, InferenceError>>>,
}

impl ScriptedModel {
    fn new(replies: Vec<Result<&str, InferenceError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| r.map(str::to_string)).collect()),
        }
    }
}

#[async_trait]
impl InferenceProvider for ScriptedModel {
    async fn infer(&self, _image: &ImagePayload, _prompt: &str) -> Result<String, InferenceError> {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(InferenceError::EmptyResponse))
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-1"
    }
}

fn session(replies: Vec<Result<&str, InferenceError>>) -> BillSession {
    BillSession::new(
        ItemExtractor::new(Box::new(ScriptedModel::new(replies))),
        BillFormatter::default(),
    )
}

fn png(name: &str) -> ImageInput {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::new_rgb8(8, 8)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    ImageInput::new(name, buf.into_inner())
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

#[tokio::test]
async fn two_images_are_combined_in_order() {
    let session = session(vec![
        Ok(r#"[{"title":"Phone Case","emoji":"📱","details":"Black, iPhone 13","quantity":1,"price":25.50}]"#),
        Ok("```json\n[{\"title\":\"Shoes\",\"emoji\":\"👟\",\"details\":\"Size 42\",\"quantity\":2,\"price\":150.00}]\n```"),
    ]);

    let outcome = session
        .run(&[png("cart1.png"), png("cart2.png")], "Temu")
        .await
        .unwrap();

    assert_eq!(outcome.bill.subtotal, dec("325.50"));
    assert_eq!(outcome.bill.rounded_total, dec("326"));
    assert!(outcome.bill.text.contains("✅ Provisional Total: 326 QAR + Delivery fee"));
    assert_eq!(outcome.summary.len(), 2);
    assert_eq!(outcome.summary.rows[0].item, "📱 Phone Case\nBlack, iPhone 13");
    assert_eq!(outcome.summary.rows[1].item, "👟 Shoes\nSize 42");

    let phone = outcome.bill.text.find("Phone Case").unwrap();
    let shoes = outcome.bill.text.find("Shoes").unwrap();
    assert!(phone < shoes);
}

#[tokio::test]
async fn all_empty_extractions_fail_the_run() {
    let session = session(vec![
        Ok("[]"),
        Err(InferenceError::Api {
            status: 503,
            body: "unavailable".to_string(),
        }),
    ]);

    let result = session.run(&[png("a.png"), png("b.png")], "Shein").await;

    assert!(matches!(result, Err(CartBillError::NoItemsExtracted)));
}

#[tokio::test]
async fn unreadable_price_is_billed_out_but_tabulated() {
    let session = session(vec![Ok(
        r#"[{"title":"Mug","emoji":"☕","details":"","quantity":1,"price":"abc"},
            {"title":"Pen","emoji":"🖊️","details":"Blue","quantity":3,"price":2.10}]"#,
    )]);

    let outcome = session.run(&[png("cart.png")], "Noon").await.unwrap();

    assert!(!outcome.bill.text.contains("Mug"));
    assert_eq!(outcome.bill.item_count, 1);
    assert_eq!(outcome.bill.subtotal, dec("6.30"));
    assert_eq!(outcome.summary.len(), 2);
    assert_eq!(outcome.summary.rows[0].unit_price, Decimal::ZERO);
    assert!(outcome.summary.len() >= outcome.bill.item_count);
}

#[tokio::test]
async fn failing_image_contributes_nothing() {
    let session = session(vec![
        Ok("not json at all"),
        Ok(r#"[{"title":"Lamp","emoji":"💡","details":"Warm","quantity":1,"price":40}]"#),
    ]);

    let outcome = session
        .run(&[png("bad.png"), png("good.png")], "Temu")
        .await
        .unwrap();

    assert_eq!(outcome.batch.len(), 1);
    assert_eq!(outcome.reports[0].status, ImageStatus::NoItems);
    assert_eq!(outcome.reports[1].status, ImageStatus::Extracted);
    assert_eq!(outcome.reports[1].items, 1);
}

#[tokio::test]
async fn undecodable_image_is_skipped() {
    let session = session(vec![Ok(
        r#"[{"title":"Lamp","emoji":"💡","details":"Warm","quantity":1,"price":40}]"#,
    )]);

    let outcome = session
        .run(
            &[ImageInput::new("notes.png", b"plain text".to_vec()), png("cart.png")],
            "Temu",
        )
        .await
        .unwrap();

    assert!(matches!(outcome.reports[0].status, ImageStatus::DecodeFailed(_)));
    assert_eq!(outcome.reports[1].items, 1);
    assert_eq!(outcome.bill.rounded_total, dec("40"));
}

#[tokio::test]
async fn progress_reports_each_image() {
    let session = session(vec![Ok("[]"), Ok(r#"[{"title":"Cup","price":1}]"#)]);
    let mut seen = Vec::new();

    session
        .run_with_progress(&[png("one.png"), png("two.png")], "Temu", |i, name| {
            seen.push(format!("{i}:{name}"))
        })
        .await
        .unwrap();

    assert_eq!(seen, vec!["0:one.png".to_string(), "1:two.png".to_string()]);
}
