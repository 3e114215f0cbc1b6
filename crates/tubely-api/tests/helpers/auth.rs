use tubely_api::auth::issue_access_token;
use uuid::Uuid;

/// Secret the test router validates tokens with.
pub const TEST_JWT_SECRET: &str = "test-jwt-secret-at-least-32-characters-long";

/// A user with a valid access token.
pub struct TestUser {
    pub user_id: Uuid,
    pub token: String,
}

impl TestUser {
    pub fn new() -> Self {
        let user_id = Uuid::new_v4();
        let token = issue_access_token(user_id, TEST_JWT_SECRET, chrono::Duration::hours(1))
            .expect("Failed to issue test token");
        Self { user_id, token }
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}
