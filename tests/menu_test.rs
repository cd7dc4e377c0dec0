//! Public menu route integration tests.
//!
//! Run with: `cargo test --test menu_test`

mod helpers;

use axum::http::StatusCode;
use helpers::{ACCOUNT_ID, setup_test_app};
use scraper::{Html, Selector};

#[tokio::test]
async fn menu_page_embeds_public_pdf_url() {
    let app = setup_test_app().await;

    let response = app.client().get(&format!("/m/{ACCOUNT_ID}")).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let doc = Html::parse_document(&response.text());
    let iframe = Selector::parse("iframe").unwrap();
    let link = Selector::parse("a[target=_blank]").unwrap();

    let src = doc
        .select(&iframe)
        .next()
        .and_then(|el| el.value().attr("src"))
        .expect("page embeds the menu");
    assert_eq!(src, app.public_pdf_url());

    let open = doc.select(&link).next().expect("page offers an open link");
    assert_eq!(open.value().attr("href"), Some(app.public_pdf_url().as_str()));
    assert_eq!(open.text().collect::<String>(), "Open PDF in new tab");
}

#[tokio::test]
async fn menu_page_is_stable_across_loads() {
    let app = setup_test_app().await;

    let first = app.client().get(&format!("/m/{ACCOUNT_ID}")).await.text();
    let second = app.client().get(&format!("/m/{ACCOUNT_ID}")).await.text();

    assert_eq!(first, second);
}

#[tokio::test]
async fn unusable_account_id_is_not_found() {
    let app = setup_test_app().await;

    let response = app.client().get("/m/bad%2F..%2Fid").await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(response.text(), "Menu not found");
}

#[tokio::test]
async fn pages_view_reports_missing_menu_without_failing_request() {
    let mut app = setup_test_app().await;
    app.backend
        .mock(
            "GET",
            format!("/storage/v1/object/public/menus/{ACCOUNT_ID}/menu.pdf").as_str(),
        )
        .with_status(400)
        .with_body(r#"{"statusCode":"404","error":"not_found","message":"Object not found"}"#)
        .create_async()
        .await;

    let response = app.client().get(&format!("/m/{ACCOUNT_ID}/pages")).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let text = response.text();
    assert!(text.starts_with("Loading menu..."), "{text}");
    assert!(text.contains("Could not load menu. download returned status 400"), "{text}");
    assert!(!text.contains("=== Page"));
}

#[tokio::test]
async fn pages_view_streams_each_page_in_order() {
    let mut app = setup_test_app().await;
    app.backend
        .mock(
            "GET",
            format!("/storage/v1/object/public/menus/{ACCOUNT_ID}/menu.pdf").as_str(),
        )
        .with_status(200)
        .with_header("content-type", "application/pdf")
        .with_body(include_bytes!("fixtures/two_page_menu.pdf"))
        .create_async()
        .await;

    let response = app.client().get(&format!("/m/{ACCOUNT_ID}/pages")).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let text = response.text();
    let position = |needle: &str| {
        text.find(needle)
            .unwrap_or_else(|| panic!("missing {needle:?} in {text}"))
    };
    let loading = position("Loading menu...");
    let rendering = position("Rendering 2 page(s)...");
    let first = position("=== Page 1 of 2 ===");
    let starters = position("Starters");
    let second = position("=== Page 2 of 2 ===");
    let desserts = position("Desserts");

    assert!(loading < rendering && rendering < first);
    assert!(first < starters && starters < second && second < desserts);
    assert!(!text.contains("Could not load menu"), "{text}");
}
