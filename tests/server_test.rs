#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
    use futures_util::future::{BoxFuture, FutureExt};
    use quizshim::config::{BasicAuthSecrets, Settings};
    use quizshim::hardening::RetryPolicy;
    use quizshim::server::build_router;
    use quizshim::upstream::{ModelBackend, ModelRequest};
    use quizshim::*;
    use std::sync::Arc;
    use tower::util::ServiceExt;

    struct CannedBackend;

    impl ModelBackend for CannedBackend {
        fn name(&self) -> &str {
            "canned"
        }

        fn complete<'a>(
            &'a self,
            _api_key: &'a str,
            _request: &'a ModelRequest,
        ) -> BoxFuture<'a, Result<UpstreamResult>> {
            async move {
                Ok(UpstreamResult {
                    text: "```json\n{\"question\":\"Q?\",\"options\":[\"a\",\"b\"],\"correct\":1}\n```"
                        .to_string(),
                    usage: Usage {
                        input_tokens: 5,
                        output_tokens: 9,
                    },
                })
            }
            .boxed()
        }
    }

    fn setup_test_app(api_key: Option<&str>) -> axum::Router {
        setup_test_app_with_limit(api_key, 64 * 1024)
    }

    fn setup_test_app_with_limit(api_key: Option<&str>, max_body_size: usize) -> axum::Router {
        let settings = Settings {
            anthropic_api_key: api_key.map(|k| k.to_string()),
            basic_auth: BasicAuthSecrets {
                username: Some("quiz".to_string()),
                password: Some("master".to_string()),
            },
            require_auth: true,
            ..Settings::default()
        };
        let state = AppState::new(settings, Arc::new(CannedBackend), RetryPolicy::default());
        build_router(state, max_body_size)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn auth_header() -> String {
        format!("Basic {}", BASE64.encode("quiz:master"))
    }

    #[tokio::test]
    async fn test_health_liveness() {
        let app = setup_test_app(Some("sk"));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get("x-request-id").is_some());
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_readiness_without_api_key() {
        let app = setup_test_app(None);
        let response = app
            .oneshot(Request::builder().uri("/readyz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = body_json(response).await;
        assert_eq!(json["status"], "unready");
        assert_eq!(json["upstream_credential"], "missing");
        assert_eq!(json["basic_auth"], "ok");
    }

    #[tokio::test]
    async fn test_generate_with_credentials() {
        let app = setup_test_app(Some("sk"));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/generate")
                    .header("authorization", auth_header())
                    .header("x-request-id", "req-42")
                    .body(Body::from(r#"{"prompt":"Quiz me","tags":["gk"]}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
            Some("req-42")
        );
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["correct"], 1);
        assert_eq!(json["usage"]["output_tokens"], 9);
    }

    #[tokio::test]
    async fn test_generate_without_credentials() {
        let app = setup_test_app(Some("sk"));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/generate")
                    .body(Body::from(r#"{"prompt":"Quiz me"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response
                .headers()
                .get("www-authenticate")
                .and_then(|v| v.to_str().ok()),
            Some("Basic realm=\"Restricted Area\"")
        );
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn test_invoke_event_uses_event_headers() {
        let app = setup_test_app(Some("sk"));
        let event = serde_json::json!({
            "headers": { "Authorization": auth_header() },
            "body": "{\"prompt\":\"Quiz me\"}"
        });
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/invoke")
                    .body(Body::from(event.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["question"], "Q?");
    }

    #[tokio::test]
    async fn test_generate_rejects_bad_tags() {
        let app = setup_test_app(Some("sk"));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header("authorization", auth_header())
                    .body(Body::from(r#"{"prompt":"Quiz me","tags":"gk"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "'tags' must be a list of strings");
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let app = setup_test_app(Some("sk"));
        let response = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/generate")
                    .header("origin", "https://quiz.example")
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );
    }

    fn content_type(response: &axum::response::Response) -> Option<String> {
        response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
    }

    #[tokio::test]
    async fn test_non_utf8_body_without_credentials_is_challenged() {
        let app = setup_test_app(Some("sk"));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/generate")
                    .body(Body::from(vec![0xff, 0xfe, b'{']))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get("www-authenticate").is_some());
        assert_eq!(content_type(&response).as_deref(), Some("application/json"));
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn test_non_utf8_body_is_validation_envelope() {
        let app = setup_test_app(Some("sk"));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/generate")
                    .header("authorization", auth_header())
                    .body(Body::from(vec![0xff, 0xfe, b'{']))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(content_type(&response).as_deref(), Some("application/json"));
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Request body is not valid UTF-8");
    }

    #[tokio::test]
    async fn test_oversized_body_is_envelope() {
        let oversized = r#"{"prompt":"a prompt well past the sixteen byte limit"}"#;

        let app = setup_test_app_with_limit(Some("sk"), 16);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/generate")
                    .header("authorization", auth_header())
                    .body(Body::from(oversized))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(content_type(&response).as_deref(), Some("application/json"));
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Request body too large");

        let app = setup_test_app_with_limit(Some("sk"), 16);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/invoke")
                    .body(Body::from(oversized))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_invoke_falls_back_to_http_headers() {
        let app = setup_test_app(Some("sk"));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/invoke")
                    .header("authorization", auth_header())
                    .body(Body::from(r#"{"prompt":"Quiz me"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["question"], "Q?");
    }

    #[tokio::test]
    async fn test_invoke_non_json_event_is_raw_body() {
        let app = setup_test_app(Some("sk"));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/invoke")
                    .header("authorization", auth_header())
                    .body(Body::from("prompt: Quiz me"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Missing required field: 'prompt'");
    }
}
