#![allow(dead_code)]

use blog_api::config::hashids::{HashidsConfig, HashidsManager, MAIN_CONNECTION, USERS_CONNECTION};
use blog_api::config::reaction::ReactionConfig;
use blog_api::models::{
    comment, emotion, emotionable, post, user, Comment, Emotion, Emotionable, Post, User,
};
use reqwest::Client;
use sea_orm::{
    ActiveModelTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait,
    Schema, Set,
};
use sea_orm::sea_query::Index;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Once,
};

static INIT: Once = Once::new();
static USER_COUNTER: AtomicUsize = AtomicUsize::new(0);
static DB_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn init_env() {
    INIT.call_once(|| {
        std::env::set_var(
            "JWT_SECRET",
            "integration_test_secret_that_is_at_least_32_characters_long",
        );
        // Keep bcrypt cheap for tests
        std::env::set_var("BCRYPT_COST", "4");
        let config = blog_api::config::jwt::JwtConfig::from_env().unwrap();
        let _ = blog_api::utils::jwt::init_jwt_config(config);
    });
}

pub struct TestApp {
    pub addr: String,
    pub db: DatabaseConnection,
    pub client: Client,
    pub hashids: HashidsManager,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.addr, path)
    }

    /// Opaque ID for a non-user row.
    pub fn main_id(&self, id: i32) -> String {
        self.hashids.encode_id(MAIN_CONNECTION, id).unwrap()
    }

    /// Opaque ID for a user row.
    pub fn user_id(&self, id: i32) -> String {
        self.hashids.encode_id(USERS_CONNECTION, id).unwrap()
    }
}

pub struct TestUser {
    pub id: i32,
    pub opaque_id: String,
    pub token: String,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(ReactionConfig::default()).await
}

/// Each app gets its own in-memory SQLite database. A single pooled
/// connection keeps the database alive and serialises transactions.
pub async fn spawn_app_with(reaction_config: ReactionConfig) -> TestApp {
    init_env();

    let mut opt = ConnectOptions::new("sqlite::memory:".to_string());
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt)
        .await
        .expect("Failed to open in-memory database");

    serve(db, reaction_config).await
}

/// App backed by a fresh SQLite file behind a pool of several connections,
/// so transactions from different tasks really overlap.
pub async fn spawn_app_on_disk() -> TestApp {
    init_env();

    let path = std::env::temp_dir().join(format!(
        "blog_api_test_{}_{}.db",
        std::process::id(),
        DB_COUNTER.fetch_add(1, Ordering::SeqCst)
    ));
    let _ = std::fs::remove_file(&path);

    let mut opt = ConnectOptions::new(format!("sqlite://{}?mode=rwc", path.display()));
    opt.max_connections(8).min_connections(4).sqlx_logging(false);
    let db = Database::connect(opt)
        .await
        .expect("Failed to open file database");

    serve(db, ReactionConfig::default()).await
}

async fn serve(db: DatabaseConnection, reaction_config: ReactionConfig) -> TestApp {
    create_schema(&db).await;

    let hashids = HashidsConfig::from_env()
        .build()
        .expect("Failed to build hashids");

    let app = axum::Router::new()
        .route("/", axum::routing::get(|| async { "ok" }))
        .merge(blog_api::routes::create_routes())
        .layer(axum::extract::Extension(db.clone()))
        .layer(axum::extract::Extension(hashids.clone()))
        .layer(axum::extract::Extension(reaction_config));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        addr: format!("http://{}", addr),
        db,
        client: Client::new(),
        hashids,
    }
}

/// Tables from the entities, plus the unique indexes the migrations add.
async fn create_schema(db: &DatabaseConnection) {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let statements = [
        schema.create_table_from_entity(User),
        schema.create_table_from_entity(Post),
        schema.create_table_from_entity(Comment),
        schema.create_table_from_entity(Emotion),
        schema.create_table_from_entity(Emotionable),
    ];
    for stmt in statements {
        db.execute(backend.build(&stmt))
            .await
            .expect("Failed to create table");
    }

    let one_reaction = Index::create()
        .name("idx_emotionables_unique")
        .table(Emotionable)
        .col(emotionable::Column::UserId)
        .col(emotionable::Column::TargetKind)
        .col(emotionable::Column::TargetId)
        .unique()
        .to_owned();
    db.execute(backend.build(&one_reaction))
        .await
        .expect("Failed to create reaction index");

    // Partial indexes are not expressible through the builder
    db.execute_unprepared(
        "CREATE UNIQUE INDEX idx_emotions_name_live ON emotions(name) WHERE deleted_at IS NULL",
    )
    .await
    .expect("Failed to create emotion name index");
}

/// Register a user over HTTP.
pub async fn create_test_user(app: &TestApp, username_prefix: &str) -> TestUser {
    let counter = USER_COUNTER.fetch_add(1, Ordering::SeqCst);
    let unique_username = format!("{}_{}", username_prefix, counter);

    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&serde_json::json!({
            "username": unique_username,
            "email": format!("{}@test.com", unique_username),
            "password": "test_password_123"
        }))
        .send()
        .await
        .expect("Failed to register user");

    let status = resp.status();
    let body: serde_json::Value = resp.json().await.expect("Failed to parse response");
    if !body["success"].as_bool().unwrap_or(false) {
        panic!(
            "Failed to register user '{}': status={}, body={}",
            unique_username, status, body
        );
    }

    let opaque_id = body["data"]["user_id"]
        .as_str()
        .expect("Response missing user_id")
        .to_string();
    let token = body["data"]["token"]
        .as_str()
        .expect("Response missing token")
        .to_string();
    let id = app
        .hashids
        .decode_id(USERS_CONNECTION, &opaque_id)
        .expect("user_id is not a users hashid");

    TestUser {
        id,
        opaque_id,
        token,
    }
}

/// Register a user and promote it to admin.
pub async fn create_admin(app: &TestApp) -> TestUser {
    let admin = create_test_user(app, "admin").await;
    set_role(&app.db, admin.id, user::ROLE_ADMIN).await;
    admin
}

pub async fn set_role(db: &DatabaseConnection, user_id: i32, role: &str) {
    let found = User::find_by_id(user_id)
        .one(db)
        .await
        .unwrap()
        .expect("user exists");
    let mut active: user::ActiveModel = found.into();
    active.role = Set(role.to_string());
    active.update(db).await.expect("Failed to update role");
}

fn now() -> chrono::NaiveDateTime {
    chrono::Utc::now().naive_utc()
}

pub async fn seed_post(db: &DatabaseConnection, user_id: i32) -> i32 {
    post::ActiveModel {
        user_id: Set(user_id),
        title: Set("A post".to_string()),
        content: Set("Body".to_string()),
        created_at: Set(now()),
        updated_at: Set(now()),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to seed post")
    .id
}

pub async fn seed_comment(db: &DatabaseConnection, post_id: i32, user_id: i32) -> i32 {
    comment::ActiveModel {
        post_id: Set(post_id),
        user_id: Set(user_id),
        content: Set("A comment".to_string()),
        created_at: Set(now()),
        updated_at: Set(now()),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to seed comment")
    .id
}

pub async fn seed_emotion(db: &DatabaseConnection, name: &str) -> i32 {
    emotion::ActiveModel {
        name: Set(name.to_string()),
        description: Set(None),
        avatar: Set(None),
        created_at: Set(now()),
        updated_at: Set(now()),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to seed emotion")
    .id
}

pub async fn soft_delete_post(db: &DatabaseConnection, post_id: i32) {
    let found = Post::find_by_id(post_id)
        .one(db)
        .await
        .unwrap()
        .expect("post exists");
    let mut active: post::ActiveModel = found.into();
    active.deleted_at = Set(Some(now()));
    active.update(db).await.expect("Failed to trash post");
}

pub async fn soft_delete_emotion(db: &DatabaseConnection, emotion_id: i32) {
    let found = Emotion::find_by_id(emotion_id)
        .one(db)
        .await
        .unwrap()
        .expect("emotion exists");
    let mut active: emotion::ActiveModel = found.into();
    active.deleted_at = Set(Some(now()));
    active.update(db).await.expect("Failed to trash emotion");
}
