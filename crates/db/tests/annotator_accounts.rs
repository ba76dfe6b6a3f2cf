//! Integration tests for annotator accounts and the validation log.

use hanami_db::models::annotator::CreateAnnotator;
use hanami_db::models::fullview_validation_log::CreateFullviewValidationLog;
use hanami_db::repositories::{AnnotatorRepo, FullviewValidationLogRepo};
use sqlx::PgPool;

fn new_annotator(username: &str, role: &str) -> CreateAnnotator {
    CreateAnnotator {
        username: username.to_string(),
        password_hash: "$argon2id$stub".to_string(),
        role: role.to_string(),
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_find_and_delete(pool: PgPool) {
    let created = AnnotatorRepo::create(&pool, &new_annotator("taro", "admin"))
        .await
        .unwrap();
    assert_eq!(created.role, "admin");
    assert!(created.last_login.is_none());

    let by_name = AnnotatorRepo::find_by_username(&pool, "taro").await.unwrap().unwrap();
    assert_eq!(by_name.id, created.id);
    let by_id = AnnotatorRepo::find_by_id(&pool, created.id).await.unwrap().unwrap();
    assert_eq!(by_id.username, "taro");

    assert!(AnnotatorRepo::delete_by_username(&pool, "taro").await.unwrap());
    assert!(!AnnotatorRepo::delete_by_username(&pool, "taro").await.unwrap());
    assert!(AnnotatorRepo::find_by_id(&pool, created.id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_username_violates_unique_constraint(pool: PgPool) {
    AnnotatorRepo::create(&pool, &new_annotator("jiro", "annotator"))
        .await
        .unwrap();
    let err = AnnotatorRepo::create(&pool, &new_annotator("jiro", "annotator"))
        .await
        .unwrap_err();

    let db_err = err.as_database_error().expect("should be a database error");
    assert_eq!(db_err.code().as_deref(), Some("23505"));
    assert_eq!(db_err.constraint(), Some("uq_annotators_username"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_role_is_rejected(pool: PgPool) {
    let result = AnnotatorRepo::create(&pool, &new_annotator("saburo", "reviewer")).await;
    assert!(result.is_err());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn record_login_and_list(pool: PgPool) {
    let first = AnnotatorRepo::create(&pool, &new_annotator("a", "annotator"))
        .await
        .unwrap();
    AnnotatorRepo::create(&pool, &new_annotator("b", "annotator"))
        .await
        .unwrap();

    AnnotatorRepo::record_login(&pool, first.id).await.unwrap();
    let reloaded = AnnotatorRepo::find_by_id(&pool, first.id).await.unwrap().unwrap();
    assert!(reloaded.last_login.is_some());

    let names: Vec<String> = AnnotatorRepo::list(&pool)
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.username)
        .collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn validation_log_round_trip(pool: PgPool) {
    let log = FullviewValidationLogRepo::create(
        &pool,
        &CreateFullviewValidationLog {
            image_obj_key: "2025/04/01/a.jpg".into(),
            is_valid: false,
            reason: "枝先端のみ".into(),
            confidence: 0.8,
            model_id: "test-model".into(),
        },
    )
    .await
    .unwrap();
    assert!(!log.is_valid);

    let recent = FullviewValidationLogRepo::list_recent(&pool, 10).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].uid, log.uid);
}
