//! Test fixtures for common test data

use uuid::Uuid;

use shke_portal::{db::ApiKeyRepository, models::ApiKey};

use super::test_app::TestApp;

/// Fixed UUIDs for testing (reproducible tests)
pub mod ids {
    use uuid::Uuid;

    pub const ALICE: Uuid = Uuid::from_u128(0x12345678_1234_1234_1234_123456789abc);
    pub const BOB: Uuid = Uuid::from_u128(0xabcdef12_abcd_abcd_abcd_abcdef123456);
}

pub const TEST_EMAIL: &str = "dev@example.com";
pub const TEST_PASSWORD: &str = "correct-horse";

pub const DEMO_OWNER: &str = "octo";
pub const DEMO_REPO: &str = "hello";
pub const DEMO_URL: &str = "https://github.com/octo/hello";
pub const DEMO_README: &str = "# hello\n\nA tiny demo repository used in tests.";

/// Insert a key for `owner` straight through the repository
pub async fn create_key(app: &TestApp, owner: Uuid, name: &str, limit: i64) -> ApiKey {
    ApiKeyRepository::new(&app.state.db)
        .create(owner, name, limit)
        .await
        .expect("Failed to create fixture key")
}
