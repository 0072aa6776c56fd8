//! Route table

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::ApiState;

/// Build the HTTP router
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/book", post(handlers::create_booking))
        .route("/respond", get(handlers::respond))
        .route("/status/:booking_id", get(handlers::booking_status))
        .route("/user/:user_id", get(handlers::user_bookings))
        .route("/bookings/:booking_id/reissue", post(handlers::reissue_link))
        .route("/conversations", post(handlers::open_conversation))
        .route(
            "/conversations/user/:user_id",
            get(handlers::user_conversations),
        )
        .route(
            "/conversations/:conversation_id/messages",
            get(handlers::list_messages).post(handlers::post_message),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, Response, StatusCode},
    };
    use handyhub_core::{Config, Database, MemoryNotifier, Notifier, User, UserRepository};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    struct Harness {
        app: Router,
        notifier: Arc<MemoryNotifier>,
        client: User,
        provider: User,
    }

    fn harness() -> Harness {
        let db = Database::open_in_memory().unwrap();
        let client = User::client("u1");
        let provider = User::provider("p1", "electrician");
        db.create_user(&client).unwrap();
        db.create_user(&provider).unwrap();

        let notifier = Arc::new(MemoryNotifier::new());
        let state = ApiState::new(
            db,
            Config::default(),
            notifier.clone() as Arc<dyn Notifier>,
        );
        Harness {
            app: router(state),
            notifier,
            client,
            provider,
        }
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response: Response<Body> = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    impl Harness {
        async fn book(&self, description: &str) -> (Uuid, String) {
            let (status, body) = send(
                &self.app,
                post_json(
                    "/book",
                    json!({
                        "userId": self.client.id,
                        "providerId": self.provider.id,
                        "description": description,
                    }),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED, "{body}");
            let id: Uuid = body["booking"]["id"].as_str().unwrap().parse().unwrap();
            let token = self.notifier.latest_for(id).unwrap().link.token.to_string();
            (id, token)
        }
    }

    #[tokio::test]
    async fn test_health() {
        let h = harness();
        let response = h.app.clone().oneshot(get_req("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_book_and_accept() {
        let h = harness();
        let (id, token) = h.book("fix outlet").await;

        let (status, body) = send(&h.app, get_req(&format!("/status/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "pending");

        let (status, body) = send(
            &h.app,
            get_req(&format!("/respond?token={token}&decision=accept&price=80")),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["booking"]["status"], "accepted");
        assert_eq!(body["booking"]["price"], 80.0);
        assert_eq!(body["warnings"], json!([]));

        // Acceptance opened a conversation tagged with the booking
        let (status, body) = send(
            &h.app,
            get_req(&format!("/conversations/user/{}", h.client.id)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["bookingId"], id.to_string());
    }

    #[tokio::test]
    async fn test_book_response_hides_token() {
        let h = harness();
        let (status, body) = send(
            &h.app,
            post_json(
                "/book",
                json!({
                    "userId": h.client.id,
                    "providerId": h.provider.id,
                    "description": "fix outlet",
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body.get("token").is_none());
        assert!(body["booking"].get("token").is_none());
    }

    #[tokio::test]
    async fn test_book_validation_and_unknown_provider() {
        let h = harness();
        let (status, body) = send(
            &h.app,
            post_json(
                "/book",
                json!({
                    "userId": h.client.id,
                    "providerId": h.provider.id,
                    "description": "   ",
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, body) = send(
            &h.app,
            post_json(
                "/book",
                json!({
                    "userId": h.client.id,
                    "providerId": Uuid::new_v4(),
                    "description": "fix outlet",
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_replay_is_gone_and_second_link_already_decided() {
        let h = harness();
        let (id, token) = h.book("paint room").await;

        let (status, _) = send(
            &h.app,
            post_json(&format!("/bookings/{id}/reissue"), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let spare = h.notifier.latest_for(id).unwrap().link.token.to_string();
        assert_ne!(spare, token);

        let (status, body) = send(
            &h.app,
            get_req(&format!("/respond?token={token}&decision=reject")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["booking"]["status"], "rejected");

        let (status, body) = send(
            &h.app,
            get_req(&format!("/respond?token={token}&decision=accept")),
        )
        .await;
        assert_eq!(status, StatusCode::GONE);
        assert_eq!(body["code"], "INVALID_TOKEN");

        let (status, body) = send(
            &h.app,
            get_req(&format!("/respond?token={spare}&decision=accept")),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "ALREADY_DECIDED");
        assert_eq!(body["status"], "rejected");
    }

    #[tokio::test]
    async fn test_respond_bad_input() {
        let h = harness();
        let (_, token) = h.book("fix outlet").await;

        let (status, body) = send(
            &h.app,
            get_req(&format!("/respond?token={token}&decision=maybe")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");

        let (status, _) = send(&h.app, get_req("/respond?decision=accept")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&h.app, get_req("/respond?token=garbage&decision=accept")).await;
        assert_eq!(status, StatusCode::GONE);
    }

    #[tokio::test]
    async fn test_malformed_input_is_json_bad_request() {
        let h = harness();

        let missing_description = post_json(
            "/book",
            json!({ "userId": h.client.id, "providerId": h.provider.id }),
        );
        let bad_user_id = post_json(
            "/book",
            json!({ "userId": "u1", "providerId": h.provider.id, "description": "fix outlet" }),
        );
        let not_json = Request::builder()
            .method("POST")
            .uri("/book")
            .header("content-type", "application/json")
            .body(Body::from("{"))
            .unwrap();

        for request in [missing_description, bad_user_id, not_json] {
            let (status, body) = send(&h.app, request).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
            assert_eq!(body["code"], "BAD_REQUEST");
            assert!(body["message"].is_string());
        }

        for uri in [
            "/status/b1".to_string(),
            "/user/u1".to_string(),
            format!("/conversations/{}/messages?limit=many", Uuid::new_v4()),
        ] {
            let (status, body) = send(&h.app, get_req(&uri)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}: {body}");
            assert_eq!(body["code"], "BAD_REQUEST");
        }
        assert!(h.notifier.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_ids() {
        let h = harness();
        let (status, _) = send(&h.app, get_req(&format!("/status/{}", Uuid::new_v4()))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&h.app, get_req(&format!("/user/{}", Uuid::new_v4()))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(&h.app, get_req(&format!("/user/{}", h.client.id))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_conversation_messages() {
        let h = harness();
        let open = json!({
            "participantA": h.provider.id,
            "participantB": h.client.id,
        });
        let (status, first) = send(&h.app, post_json("/conversations", open.clone())).await;
        assert_eq!(status, StatusCode::OK);
        let (_, second) = send(&h.app, post_json("/conversations", open)).await;
        assert_eq!(first["id"], second["id"]);
        let conv = first["id"].as_str().unwrap().to_string();

        for text in ["what time works?", "tomorrow 9am", "great"] {
            let (status, body) = send(
                &h.app,
                post_json(
                    &format!("/conversations/{conv}/messages"),
                    json!({ "senderId": h.client.id, "content": text }),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED, "{body}");
        }

        let (status, page) = send(
            &h.app,
            get_req(&format!("/conversations/{conv}/messages?limit=2")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["messages"].as_array().unwrap().len(), 2);
        assert_eq!(page["messages"][0]["content"], "what time works?");
        let cursor = page["nextCursor"].as_i64().unwrap();

        let (_, rest) = send(
            &h.app,
            get_req(&format!("/conversations/{conv}/messages?cursor={cursor}")),
        )
        .await;
        assert_eq!(rest["messages"].as_array().unwrap().len(), 1);
        assert_eq!(rest["messages"][0]["content"], "great");
        assert!(rest["nextCursor"].is_null());

        let (status, _) = send(
            &h.app,
            get_req(&format!("/conversations/{conv}/messages?cursor=abc")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &h.app,
            post_json(
                &format!("/conversations/{conv}/messages"),
                json!({ "senderId": Uuid::new_v4(), "content": "let me in" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }
}
