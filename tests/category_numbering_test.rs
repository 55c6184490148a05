mod common;

use axum::http::StatusCode;
use sea_orm::ConnectionTrait;
use serde_json::json;

use common::TestApp;

async fn next_number(app: &TestApp, group_id: i64) -> i64 {
    let (status, body) = app
        .get(&format!("/api/categories-next-number?group_id={group_id}"))
        .await;
    assert_eq!(status, StatusCode::OK, "next number: {body}");
    body["next_number"].as_i64().expect("next_number")
}

#[tokio::test]
async fn empty_group_starts_at_sequence_one() {
    let app = TestApp::new().await;
    let group_id = app.create_group(3, "Books").await;

    assert_eq!(next_number(&app, group_id).await, 31);
}

#[tokio::test]
async fn next_number_follows_highest_existing() {
    let app = TestApp::new().await;
    let group_id = app.create_group(3, "Books").await;

    let first = app.create_category(group_id, "Textbooks").await;
    let second = app.create_category(group_id, "Story books").await;
    assert_eq!(first["category_number"], 31);
    assert_eq!(second["category_number"], 32);
    assert_eq!(second["group_number"], 3);

    assert_eq!(next_number(&app, group_id).await, 33);
}

#[tokio::test]
async fn tenth_category_widens_the_suffix() {
    let app = TestApp::new().await;
    let group_id = app.create_group(3, "Books").await;
    for n in 1..=9 {
        app.create_category(group_id, &format!("Shelf {n}")).await;
    }

    assert_eq!(next_number(&app, group_id).await, 310);
    let tenth = app.create_category(group_id, "Shelf 10").await;
    assert_eq!(tenth["category_number"], 310);
    assert_eq!(next_number(&app, group_id).await, 311);
}

#[tokio::test]
async fn two_digit_group_prefix() {
    let app = TestApp::new().await;
    let group_id = app.create_group(12, "Uniforms").await;

    let first = app.create_category(group_id, "Shirts").await;
    assert_eq!(first["category_number"], 121);
    assert_eq!(next_number(&app, group_id).await, 122);
}

#[tokio::test]
async fn group_ending_in_nine_is_not_a_transition() {
    let app = TestApp::new().await;
    let group_id = app.create_group(9, "Sports").await;

    let first = app.create_category(group_id, "Balls").await;
    assert_eq!(first["category_number"], 91);
    assert_eq!(next_number(&app, group_id).await, 92);
}

#[tokio::test]
async fn next_number_is_idempotent() {
    let app = TestApp::new().await;
    let group_id = app.create_group(4, "Toys").await;
    app.create_category(group_id, "Puzzles").await;

    let once = next_number(&app, group_id).await;
    let twice = next_number(&app, group_id).await;
    assert_eq!(once, 42);
    assert_eq!(once, twice);
}

#[tokio::test]
async fn groups_number_independently() {
    let app = TestApp::new().await;
    let books = app.create_group(3, "Books").await;
    let toys = app.create_group(4, "Toys").await;
    app.create_category(books, "Textbooks").await;
    app.create_category(books, "Story books").await;

    assert_eq!(next_number(&app, toys).await, 41);
    assert_eq!(next_number(&app, books).await, 33);

    let (status, body) = app
        .get(&format!("/api/categories?group_id={books}"))
        .await;
    assert_eq!(status, StatusCode::OK);
    let numbers: Vec<i64> = body
        .as_array()
        .expect("category list")
        .iter()
        .map(|c| c["category_number"].as_i64().unwrap())
        .collect();
    assert_eq!(numbers, vec![31, 32]);
}

#[tokio::test]
async fn next_number_for_unknown_group_is_not_found() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/api/categories-next-number?group_id=99").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");
}

#[tokio::test]
async fn explicit_number_must_belong_to_group() {
    let app = TestApp::new().await;
    let group_id = app.create_group(3, "Books").await;

    let (status, body) = app
        .post(
            "/api/categories",
            json!({ "group_id": group_id, "category_name": "Atlases", "category_number": 41 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, body) = app
        .post(
            "/api/categories",
            json!({ "group_id": group_id, "category_name": "Atlases", "category_number": 35 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["sequence"], 5);
    assert_eq!(next_number(&app, group_id).await, 36);

    let (status, _) = app
        .post(
            "/api/categories",
            json!({ "group_id": group_id, "category_name": "Maps", "category_number": 35 }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn category_for_unknown_group_is_rejected() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/api/categories",
            json!({ "group_id": 7, "category_name": "Orphans" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("Group 7"));
}

#[tokio::test]
async fn renumbering_a_group_recomposes_its_categories() {
    let app = TestApp::new().await;
    let group_id = app.create_group(3, "Books").await;
    app.create_category(group_id, "Textbooks").await;
    app.create_category(group_id, "Story books").await;

    let (status, body) = app
        .put(&format!("/api/groups/{group_id}"), json!({ "group_number": 12 }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["group_number"], 12);

    let (_, categories) = app
        .get(&format!("/api/categories?group_id={group_id}"))
        .await;
    let numbers: Vec<i64> = categories
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["category_number"].as_i64().unwrap())
        .collect();
    assert_eq!(numbers, vec![121, 122]);
    assert_eq!(next_number(&app, group_id).await, 123);

    let (_, issues) = app.get("/api/categories/audit").await;
    assert_eq!(issues, json!([]));
}

#[tokio::test]
async fn audit_reports_hand_edited_numbers() {
    let app = TestApp::new().await;
    let group_id = app.create_group(3, "Books").await;
    let category = app.create_category(group_id, "Textbooks").await;

    app.state
        .db
        .execute_unprepared(&format!(
            "UPDATE tbl_categories SET category_number = 41 WHERE id = {}",
            category["id"]
        ))
        .await
        .expect("hand edit");

    let (status, issues) = app.get("/api/categories/audit").await;
    assert_eq!(status, StatusCode::OK);
    let issues = issues.as_array().expect("issue list");
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0]["category_number"], 41);
    assert_eq!(issues[0]["expected_number"], 31);

    // Numbering keeps following the stored sequence
    assert_eq!(next_number(&app, group_id).await, 32);
}

#[tokio::test]
async fn group_with_categories_cannot_be_deleted() {
    let app = TestApp::new().await;
    let group_id = app.create_group(3, "Books").await;
    let category = app.create_category(group_id, "Textbooks").await;

    let (status, _) = app.delete(&format!("/api/groups/{group_id}")).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .delete(&format!("/api/categories/{}", category["id"]))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.delete(&format!("/api/groups/{group_id}")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
