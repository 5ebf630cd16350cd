//! Page request gate tests

use rstest::rstest;
use uuid::Uuid;

use crate::common::{ids, TestApp};

#[rstest]
#[case("/dashboard")]
#[case("/playground")]
#[case("/settings/profile")]
#[tokio::test]
async fn test_protected_page_without_cookie_redirects_to_login(#[case] path: &str) {
    let app = TestApp::new().await;

    let response = app.get(path).await;

    response.assert_redirect("/login");
    assert!(response.set_cookies().is_empty());
}

#[tokio::test]
async fn test_protected_page_with_invalid_cookie_clears_it() {
    let app = TestApp::new().await;

    let response = app.get_with_cookie("/dashboard", "jwt=forged.token.value").await;

    response.assert_redirect("/login");
    let cookies = response.set_cookies();
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].starts_with("jwt="));
    assert!(cookies[0].contains("Max-Age=0"));
}

#[tokio::test]
async fn test_expired_signature_from_other_secret_is_invalid() {
    let app = TestApp::new().await;
    let token = shke_portal::middleware::session::issue_session_token(
        ids::ALICE,
        "a-completely-different-secret-value-0123456789",
        24,
    )
    .unwrap();

    let response = app
        .get_with_cookie("/dashboard", &format!("jwt={}", token))
        .await;

    response.assert_redirect("/login");
    assert_eq!(response.set_cookies().len(), 1);
}

#[tokio::test]
async fn test_login_with_valid_session_redirects_to_dashboard() {
    let app = TestApp::new().await;
    let cookie = app.session_cookie(ids::ALICE);

    let response = app.get_with_cookie("/login", &cookie).await;

    response.assert_redirect("/dashboard");
}

#[tokio::test]
async fn test_protected_page_with_valid_session_passes() {
    let app = TestApp::new().await;
    let cookie = app.session_cookie(ids::ALICE);

    let response = app.get_with_cookie("/dashboard", &cookie).await;

    // No frontend configured, so the page itself is a 404 after the gate
    response.assert_not_found();
    assert!(response.location().is_none());
}

#[rstest]
#[case("/")]
#[case("/login")]
#[case("/auth/callback")]
#[tokio::test]
async fn test_public_pages_pass_without_session(#[case] path: &str) {
    let app = TestApp::new().await;

    let response = app.get(path).await;

    response.assert_not_found();
}

#[tokio::test]
async fn test_public_page_with_invalid_cookie_keeps_cookie() {
    let app = TestApp::new().await;

    let response = app.get_with_cookie("/login", "jwt=garbage").await;

    response.assert_not_found();
    assert!(response.set_cookies().is_empty());
}

#[rstest]
#[case("/favicon.ico")]
#[case("/assets/app.js")]
#[case("/_next/static/chunk.js")]
#[case("/_next/image")]
#[tokio::test]
async fn test_assets_bypass_gate(#[case] path: &str) {
    let app = TestApp::new().await;

    let response = app.get(path).await;

    assert!(response.location().is_none());
}

#[tokio::test]
async fn test_api_routes_bypass_gate() {
    let app = TestApp::new().await;

    let response = app.get_with_cookie("/api/keys", "jwt=garbage").await;

    // The API answers for itself instead of redirecting
    response.assert_unauthorized();
    assert!(response.location().is_none());
}

#[tokio::test]
async fn test_frontend_served_behind_gate() {
    let dir = std::env::temp_dir().join(format!("shke-static-{}", Uuid::new_v4()));
    std::fs::create_dir_all(dir.join("assets")).unwrap();
    std::fs::write(dir.join("index.html"), "<html>portal</html>").unwrap();
    std::fs::write(dir.join("assets/app.js"), "console.log(1)").unwrap();

    let app = TestApp::with_static_dir(dir.clone()).await;

    // SPA fallback for a client-side route
    let cookie = app.session_cookie(ids::ALICE);
    let page = app.get_with_cookie("/dashboard", &cookie).await;
    page.assert_ok();
    assert_eq!(page.text(), "<html>portal</html>");

    // Assets are served without a session
    let asset = app.get("/assets/app.js").await;
    asset.assert_ok();
    assert_eq!(asset.text(), "console.log(1)");

    // Pages still require one
    app.get("/dashboard").await.assert_redirect("/login");

    let _ = std::fs::remove_dir_all(&dir);
}
