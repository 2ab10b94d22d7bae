use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const REALM: &str = "test";

/// Start a mock identity provider serving the discovery document for [`REALM`].
pub async fn start_mock_idp() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/realms/{REALM}/.well-known/openid-configuration")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "issuer": format!("{}/realms/{REALM}", server.uri()),
            "authorization_endpoint": format!("{}/realms/{REALM}/protocol/openid-connect/auth", server.uri()),
            "token_endpoint": format!("{}/realms/{REALM}/protocol/openid-connect/token", server.uri()),
        })))
        .mount(&server)
        .await;

    server
}

pub fn token_endpoint(server: &MockServer) -> String {
    format!("{}/realms/{REALM}/protocol/openid-connect/token", server.uri())
}

pub fn authorization_endpoint(server: &MockServer) -> String {
    format!("{}/realms/{REALM}/protocol/openid-connect/auth", server.uri())
}

/// Answer token requests of `grant_type` with `status` and `body`, expecting `calls` hits.
pub async fn mount_token_response(
    server: &MockServer,
    grant_type: &str,
    status: u16,
    body: serde_json::Value,
    calls: u64,
) {
    Mock::given(method("POST"))
        .and(path(format!("/realms/{REALM}/protocol/openid-connect/token")))
        .and(body_string_contains(format!("grant_type={grant_type}")))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .expect(calls)
        .mount(server)
        .await;
}
