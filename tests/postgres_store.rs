use chrono::{DateTime, Duration, TimeZone, Utc};
use sqlx::{Connection, Executor, PgConnection, PgPool};
use uuid::Uuid;

use chirpy::configuration::{get_configuration, DatabaseSettings};
use chirpy::error::StoreError;
use chirpy::store::{
    PgRefreshTokenStore, PgUserStore, RefreshTokenRecord, RefreshTokenStore, UserRecord,
    UserStore,
};

pub struct TestDatabase {
    pub users: PgUserStore,
    pub refresh_tokens: PgRefreshTokenStore,
    pub db_pool: PgPool,
}

async fn spawn_database() -> TestDatabase {
    let mut configuration = get_configuration().expect("Failed to read configuration.");
    configuration.database.database_name = Uuid::new_v4().to_string();
    let db_pool = configure_database(&configuration.database).await;

    TestDatabase {
        users: PgUserStore::new(db_pool.clone()),
        refresh_tokens: PgRefreshTokenStore::new(db_pool.clone()),
        db_pool,
    }
}

pub async fn configure_database(config: &DatabaseSettings) -> PgPool {
    // Create database
    let mut connection = PgConnection::connect(&config.connection_string_without_db())
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(&*format!(r#"CREATE DATABASE "{}";"#, config.database_name))
        .await
        .expect("Failed to create database.");
    // Migrate database
    let connection_pool = PgPool::connect(&config.connection_string())
        .await
        .expect("Failed to connect to Postgres.");
    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .expect("Failed to migrate the database.");
    connection_pool
}

// Whole seconds, so values survive the round trip through TIMESTAMPTZ.
fn at(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap()
}

fn user(email: &str) -> UserRecord {
    UserRecord {
        id: Uuid::new_v4(),
        email: email.to_string(),
        password_hash: "$2b$04$notarealhashnotarealhashnotarealhashnotarealhash12".to_string(),
        created_at: at(0),
        updated_at: at(0),
    }
}

fn refresh_token(token: &str, owner_id: Uuid) -> RefreshTokenRecord {
    RefreshTokenRecord {
        token: token.to_string(),
        owner_id,
        issued_at: at(0),
        expires_at: at(0) + Duration::days(60),
        revoked_at: None,
    }
}

// --- Users ---

#[tokio::test]
async fn user_insert_then_find_by_email_and_id() {
    let db = spawn_database().await;
    let walt = user("walt@breakingbad.com");

    db.users.insert(&walt).await.unwrap();

    assert_eq!(
        db.users.find_by_email("walt@breakingbad.com").await,
        Ok(Some(walt.clone()))
    );
    assert_eq!(db.users.find_by_id(walt.id).await, Ok(Some(walt)));
    assert_eq!(db.users.find_by_email("jesse@breakingbad.com").await, Ok(None));
    assert_eq!(db.users.find_by_id(Uuid::new_v4()).await, Ok(None));
}

#[tokio::test]
async fn duplicate_email_is_reported_as_duplicate() {
    let db = spawn_database().await;
    db.users.insert(&user("walt@breakingbad.com")).await.unwrap();

    let result = db.users.insert(&user("walt@breakingbad.com")).await;

    assert!(matches!(result, Err(StoreError::Duplicate(_))), "{:?}", result);
}

// --- Refresh tokens ---

#[tokio::test]
async fn refresh_token_insert_then_find() {
    let db = spawn_database().await;
    let owner = user("walt@breakingbad.com");
    db.users.insert(&owner).await.unwrap();
    let record = refresh_token("tok-1", owner.id);

    db.refresh_tokens.insert(&record).await.unwrap();

    assert_eq!(db.refresh_tokens.find_by_token("tok-1").await, Ok(Some(record)));
    assert_eq!(db.refresh_tokens.find_by_token("tok-2").await, Ok(None));
}

#[tokio::test]
async fn second_revocation_keeps_first_timestamp() {
    let db = spawn_database().await;
    let owner = user("walt@breakingbad.com");
    db.users.insert(&owner).await.unwrap();
    db.refresh_tokens
        .insert(&refresh_token("tok-1", owner.id))
        .await
        .unwrap();

    db.refresh_tokens.mark_revoked("tok-1", at(10)).await.unwrap();
    db.refresh_tokens.mark_revoked("tok-1", at(20)).await.unwrap();

    let row = db.refresh_tokens.find_by_token("tok-1").await.unwrap().unwrap();
    assert_eq!(row.revoked_at, Some(at(10)));
}

#[tokio::test]
async fn revoking_unknown_token_is_not_found() {
    let db = spawn_database().await;

    assert_eq!(
        db.refresh_tokens.mark_revoked("missing", at(0)).await,
        Err(StoreError::NotFound)
    );
}

#[tokio::test]
async fn delete_all_clears_both_tables() {
    let db = spawn_database().await;
    let walt = user("walt@breakingbad.com");
    let jesse = user("jesse@breakingbad.com");
    db.users.insert(&walt).await.unwrap();
    db.users.insert(&jesse).await.unwrap();
    db.refresh_tokens
        .insert(&refresh_token("tok-1", walt.id))
        .await
        .unwrap();
    db.refresh_tokens
        .insert(&refresh_token("tok-2", jesse.id))
        .await
        .unwrap();

    assert_eq!(db.refresh_tokens.delete_all().await, Ok(2));
    assert_eq!(db.users.delete_all().await, Ok(2));

    let remaining: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(&db.db_pool)
        .await
        .unwrap();
    assert_eq!(remaining.0, 0);
}

#[tokio::test]
async fn deleting_users_cascades_to_their_refresh_tokens() {
    let db = spawn_database().await;
    let owner = user("walt@breakingbad.com");
    db.users.insert(&owner).await.unwrap();
    db.refresh_tokens
        .insert(&refresh_token("tok-1", owner.id))
        .await
        .unwrap();

    db.users.delete_all().await.unwrap();

    assert_eq!(db.refresh_tokens.find_by_token("tok-1").await, Ok(None));
}
