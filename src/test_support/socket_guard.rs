//! Mock-server start-up for sandboxes that may forbid localhost sockets.
//!
//! Tests skip (return early) when no socket can be bound. Setting
//! `LINKCARD_REQUIRE_SOCKET_TESTS` to `1`, `true` or `yes` turns the skip into
//! a failure, for CI runs where every HTTP test must execute.

use std::net::TcpListener;

use wiremock::MockServer;

const REQUIRE_ENV: &str = "LINKCARD_REQUIRE_SOCKET_TESTS";

fn skipping_forbidden() -> bool {
    std::env::var(REQUIRE_ENV)
        .is_ok_and(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

/// Starts a wiremock server, or returns `None` when localhost cannot be bound.
///
/// # Panics
///
/// Panics instead of returning `None` when skipping is forbidden.
pub async fn start_mock_server_or_skip() -> Option<MockServer> {
    if let Err(error) = TcpListener::bind("127.0.0.1:0") {
        assert!(
            !skipping_forbidden(),
            "cannot bind a localhost socket for a mock server: {error}"
        );
        eprintln!("skipping mock-server test: cannot bind localhost ({error}); set {REQUIRE_ENV}=1 to fail instead");
        return None;
    }
    Some(MockServer::start().await)
}
