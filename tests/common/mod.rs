use chrono::Duration as ChronoDuration;
use investwise::api::Api;
use investwise::auth::TokenIssuer;
use investwise::bank::LinkDelay;
use investwise::db::Db;
use investwise::models::Session;
use std::path::Path;
use tokio::time::Duration;

pub const PASSWORD: &str = "password123";

pub async fn api_at(dir: &Path) -> Api {
    api_with_link_delay(dir, Duration::ZERO).await
}

pub async fn api_with_link_delay(dir: &Path, link_delay: Duration) -> Api {
    let db = Db::new(dir);
    Api::new(
        db.load_or_default().await,
        db,
        TokenIssuer::new("integration-secret", ChronoDuration::minutes(5)),
        LinkDelay::new(link_delay),
    )
}

#[allow(dead_code)]
pub async fn sign_up_and_login(api: &mut Api, username: &str) -> Session {
    api.sign_up(username, "Test User", "test.user@example.com", PASSWORD)
        .await
        .expect("sign up");
    api.login(username, PASSWORD).expect("login").0
}
