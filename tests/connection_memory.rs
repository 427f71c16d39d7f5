// tests/connection_memory.rs

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tokio::time::{sleep, timeout, Duration};

use errwatch::{
    // ---
    ConnectionBuilder,
    Error,
    MemoryBroker,
    MemoryBrokerConfig,
    Message,
    Subject,
};

fn message(subject: &str, payload: &'static [u8]) -> Message {
    Message::new(Subject::new(subject).unwrap(), Bytes::from_static(payload))
}

#[tokio::test]
async fn memory_flush_hands_publishes_to_broker() {
    // ---
    // Arrange
    // ---
    let broker = MemoryBroker::new(MemoryBrokerConfig::default().with_enforce_reserved(false));

    let (connection, _errors) = ConnectionBuilder::new()
        .url("memory://")
        .memory_broker(broker.clone())
        .build()
        .await
        .expect("failed to create memory connection");

    // ---
    // Act
    // ---
    connection
        .publish(message("greet.one", b"1"))
        .await
        .expect("publish failed");
    connection
        .publish(message("greet.two", b"2"))
        .await
        .expect("publish failed");
    connection.flush().await.expect("flush failed");

    // ---
    // Assert
    // ---
    assert_eq!(broker.publish_attempts(), 2);

    let accepted = broker.accepted();
    assert_eq!(accepted.len(), 2);
    assert_eq!(accepted[0].subject.as_str(), "greet.one");
    assert_eq!(accepted[1].payload, Bytes::from_static(b"2"));

    connection.close().await.expect("close failed");
}

#[tokio::test]
async fn memory_reserved_publish_reports_async_error() {
    // ---
    let broker = MemoryBroker::default();
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);

    let (connection, mut errors) = ConnectionBuilder::new()
        .url("memory://")
        .memory_broker(broker.clone())
        .error_observer(move |_err| {
            seen.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .await
        .expect("failed to create memory connection");

    // publish succeeds; the rejection arrives out-of-band
    connection
        .publish(message("_SYS.hi", b"hi"))
        .await
        .expect("publish failed");
    connection.flush().await.expect("flush failed");

    let err = timeout(Duration::from_millis(500), errors.next())
        .await
        .expect("timed out waiting for async error")
        .expect("error stream closed unexpectedly");

    assert_eq!(
        err.to_string(),
        "permissions violation for publish to \"_SYS.hi\""
    );
    assert_eq!(&err.connection_id, connection.connection_id());
    assert!(err.subscription.is_none());
    assert_eq!(connection.last_error(), Some(err));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(broker.accepted().is_empty());

    connection.close().await.expect("close failed");
}

#[tokio::test]
async fn memory_unreachable_broker_fails_connect() {
    // ---
    let broker = MemoryBroker::new(MemoryBrokerConfig::default().with_reachable(false));

    let result = ConnectionBuilder::new()
        .url("memory://")
        .memory_broker(broker.clone())
        .build()
        .await;

    let err = result.err().expect("connect unexpectedly succeeded");
    assert!(matches!(err, Error::Connect { ref url, .. } if url == "memory://"));
    assert_eq!(broker.connection_count(), 0);
    assert_eq!(broker.publish_attempts(), 0);
}

#[tokio::test]
async fn memory_close_drops_late_errors() {
    // ---
    let broker =
        MemoryBroker::new(MemoryBrokerConfig::default().with_error_delay(Duration::from_millis(100)));
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);

    let (connection, mut errors) = ConnectionBuilder::new()
        .url("memory://")
        .memory_broker(broker.clone())
        .error_observer(move |_err| {
            seen.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .await
        .unwrap();

    connection.publish(message("_SYS.hi", b"hi")).await.unwrap();
    connection.flush().await.unwrap();
    connection.close().await.unwrap();

    // outlive the broker's delivery delay
    sleep(Duration::from_millis(250)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(connection.last_error().is_none());
    assert!(errors.drain().is_empty());
}

#[tokio::test]
async fn memory_use_after_close_is_rejected() {
    // ---
    let (connection, _errors) = ConnectionBuilder::new()
        .url("memory://")
        .build()
        .await
        .unwrap();

    connection.close().await.unwrap();
    // closing twice is fine
    connection.close().await.unwrap();

    let err = connection
        .publish(message("greet.hi", b"hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Closed));

    let err = connection.flush().await.unwrap_err();
    assert!(matches!(err, Error::Closed));
}
