mod common;

use hushy_client::ClientError;
use hushy_shared::error::ValidationError;
use hushy_shared::validation::SecretDraft;

use common::{client_for, signed_in_client, spawn_backend};

const POST_SECRET: &str = "POST /api/secrets";

#[tokio::test]
async fn price_below_minimum_is_rejected_locally() {
    let server = spawn_backend().await;
    let client = signed_in_client(&server).await;

    let err = client
        .secrets()
        .post_secret(&SecretDraft::new("I never liked jazz", "Confession", 2.99))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ClientError::Validation(ValidationError::PriceTooLow { .. })
    ));
    assert_eq!(server.backend.hits(POST_SECRET), 0);
}

#[tokio::test]
async fn valid_secret_is_published() {
    let server = spawn_backend().await;
    let client = signed_in_client(&server).await;
    let mut events = client.subscribe();

    let secret = client
        .secrets()
        .post_secret(&SecretDraft::new("  I never liked jazz ", " Confession ", 5.0))
        .await
        .unwrap();

    assert_eq!(secret.label, "Confession");
    let sent = server.backend.bodies(POST_SECRET);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["label"], "Confession");
    assert_eq!(sent[0]["content"], "I never liked jazz");
    assert_eq!(sent[0]["price"].as_f64(), Some(5.0));
    assert_eq!(sent[0]["currency"], "EUR");

    let event = events.recv().await.unwrap();
    assert!(matches!(
        event,
        hushy_client::ClientEvent::SecretPosted(id) if id.as_str() == "s1"
    ));
}

#[tokio::test]
async fn detected_currency_is_sent() {
    let server = spawn_backend().await;
    let client = signed_in_client(&server).await;
    client.currency().detect(Some("United States"), None).unwrap();

    client
        .secrets()
        .post_secret(&SecretDraft::new("My landlord is my cousin", "Family", 12.5))
        .await
        .unwrap();

    assert_eq!(server.backend.bodies(POST_SECRET)[0]["currency"], "USD");
}

#[tokio::test]
async fn posting_requires_a_session() {
    let server = spawn_backend().await;
    let client = client_for(&server, None);

    let err = client
        .secrets()
        .post_secret(&SecretDraft::new("content", "Label", 5.0))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::NotAuthenticated));
    assert_eq!(server.backend.hits(POST_SECRET), 0);
}
