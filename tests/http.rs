//! HTTP surface conformance, driven through the router in-process.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use highscores::server::GameServer;
use highscores::{HighscoresList, MutexScoreTable, PositionedUser, ScoreTable, UserScore};

fn service() -> (Arc<dyn ScoreTable>, Router) {
    let table: Arc<dyn ScoreTable> = Arc::new(MutexScoreTable::new());
    let router = GameServer::router(Arc::clone(&table));
    (table, router)
}

async fn post_score(router: &Router, body: &str) -> StatusCode {
    let request = Request::builder()
        .method("POST")
        .uri("/score")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap();
    router.clone().oneshot(request).await.unwrap().status()
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
    (status, body.to_vec())
}

#[tokio::test]
async fn posting_scores_and_reading_them_back() {
    let (_, router) = service();

    for (user, points) in [(555u64, 70u64), (777, 80), (555, 90), (888, 80), (333, 20)] {
        let body = serde_json::to_string(&UserScore {
            user_id: user,
            points,
        })
        .unwrap();
        assert_eq!(post_score(&router, &body).await, StatusCode::OK);
    }

    let (status, body) = get(&router, "/score/777/position").await;
    assert_eq!(status, StatusCode::OK);
    let found: PositionedUser = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        found,
        PositionedUser {
            user_id: 777,
            points: 80,
            position: 2
        }
    );

    let (status, body) = get(&router, "/highscorelist").await;
    assert_eq!(status, StatusCode::OK);
    let list: HighscoresList = serde_json::from_slice(&body).unwrap();
    let ranking: Vec<(u64, u64, u32)> = list
        .highscores
        .iter()
        .map(|p| (p.user_id, p.points, p.position))
        .collect();
    assert_eq!(
        ranking,
        vec![(555, 160, 1), (777, 80, 2), (888, 80, 2), (333, 20, 4)]
    );
}

#[tokio::test]
async fn bad_score_payloads_are_422_and_do_not_touch_the_table() {
    let (table, router) = service();

    for bad in [
        "",
        "garbage",
        r#"{"userId": 1}"#,
        r#"{"points": 1}"#,
        r#"{"userId": 1, "points": 2, "extra": 3}"#,
        r#"{"userId": null, "points": 2}"#,
        r#"{"userId": 1, "points": null}"#,
        r#"{"userId": 1, "points": 2, "points": 3}"#,
        r#"{"userId": -1, "points": 2}"#,
        r#"{"userId": 1, "points": -2}"#,
        r#"{"userId": 1.5, "points": 2}"#,
        r#"{"userId": "1", "points": "2"}"#,
    ] {
        assert_eq!(
            post_score(&router, bad).await,
            StatusCode::UNPROCESSABLE_ENTITY,
            "payload: {bad}"
        );
    }

    assert!(table.high_scores(10).is_empty());
}

#[tokio::test]
async fn score_overflow_is_422_and_state_survives() {
    let (table, router) = service();
    table.add_score(9, u64::MAX).unwrap();

    let status = post_score(&router, r#"{"userId": 9, "points": 1}"#).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(table.find_user(9).unwrap().points, u64::MAX);
}

#[tokio::test]
async fn unparseable_user_id_is_404() {
    let (_, router) = service();
    for uri in [
        "/score/abc/position",
        "/score/-1/position",
        "/score/1.5/position",
        "/score/18446744073709551616/position",
        "/score//position",
    ] {
        let (status, _) = get(&router, uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "uri: {uri}");
    }
}

#[tokio::test]
async fn unknown_user_is_an_empty_200() {
    let (_, router) = service();
    let (status, body) = get(&router, "/score/42/position").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
}

#[tokio::test]
async fn user_id_zero_and_points_zero_are_accepted() {
    let (_, router) = service();
    assert_eq!(
        post_score(&router, r#"{"userId": 0, "points": 0}"#).await,
        StatusCode::OK
    );
    let (status, body) = get(&router, "/score/0/position").await;
    assert_eq!(status, StatusCode::OK);
    let found: PositionedUser = serde_json::from_slice(&body).unwrap();
    assert_eq!(found.points, 0);
    assert_eq!(found.position, 1);
}

#[tokio::test]
async fn empty_table_yields_an_empty_list() {
    let (_, router) = service();
    let (status, body) = get(&router, "/highscorelist").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, br#"{"highscores":[]}"#.to_vec());
}

#[tokio::test]
async fn list_is_capped_at_twenty_thousand_entries() {
    let (table, router) = service();
    // Seed straight through the table; driving 20k HTTP posts adds nothing.
    for user in 0..20_050u64 {
        table.add_score(user, user % 1000).unwrap();
    }
    let (status, body) = get(&router, "/highscorelist").await;
    assert_eq!(status, StatusCode::OK);
    let list: HighscoresList = serde_json::from_slice(&body).unwrap();
    assert_eq!(list.highscores.len(), 20_000);
    // Best first, and the cap cuts the tail, not the head.
    assert_eq!(list.highscores[0].points, 999);
}
