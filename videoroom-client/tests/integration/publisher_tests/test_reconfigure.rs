use serde_json::json;
use videoroom_client::{
    MediaFlags, Negotiable, Publisher, Reconfigurable, SessionState, SignalingError,
};

use crate::integration::{create_test_gateway, init_tracing, join_alice};
use crate::utils::{ack, body, error_reply, next_request, plugin_event};

#[tokio::test]
async fn test_reconfigure_to_current_flags_sends_nothing() {
    init_tracing();

    let mut tg = create_test_gateway();
    let (publisher, _events, _) = join_alice(&mut tg).await;
    let sent_before = tg.transport.sent().await.len();

    publisher.reconfigure(true, true).await.unwrap();
    publisher.start_audio().await.unwrap();

    assert_eq!(tg.transport.sent().await.len(), sent_before);
    assert_eq!(publisher.core().state().await, SessionState::Active);
}

#[tokio::test]
async fn test_stop_video_then_failed_restart() {
    init_tracing();

    let mut tg = create_test_gateway();
    let (publisher, _events, _) = join_alice(&mut tg).await;
    let gateway = tg.gateway.clone();

    let (stopped, ()) = tokio::join!(publisher.stop_video(), async {
        let request = next_request(&mut tg.requests).await;
        let configure = body(&request);
        assert_eq!(configure["request"], "configure");
        assert_eq!(configure["audio"], true);
        assert_eq!(configure["video"], false);
        gateway.dispatch(ack(&request));
        gateway.dispatch(plugin_event(
            &request,
            json!({ "videoroom": "event", "room": 1234, "configured": "ok" }),
            None,
        ));
    });
    stopped.unwrap();
    assert_eq!(publisher.core().media().await, MediaFlags::new(true, false));

    let (restarted, ()) = tokio::join!(publisher.start_video(), async {
        let request = next_request(&mut tg.requests).await;
        gateway.dispatch(error_reply(&request, 490, "Bad request"));
    });

    match restarted {
        Err(SignalingError::Server { code, .. }) => assert_eq!(code, 490),
        other => panic!("unexpected reconfigure result: {other:?}"),
    }
    assert_eq!(publisher.core().media().await, MediaFlags::new(true, false));
    assert_eq!(publisher.core().state().await, SessionState::Active);
    assert!(tg.observer.failures().contains(&"reconfigure"));
}

#[tokio::test]
async fn test_reconfigure_requires_configured_ok() {
    init_tracing();

    let mut tg = create_test_gateway();
    let (publisher, _events, _) = join_alice(&mut tg).await;
    let gateway = tg.gateway.clone();

    let (result, ()) = tokio::join!(publisher.reconfigure(false, false), async {
        let request = next_request(&mut tg.requests).await;
        gateway.dispatch(plugin_event(
            &request,
            json!({ "videoroom": "event", "room": 1234 }),
            None,
        ));
    });

    assert!(matches!(result, Err(SignalingError::ProtocolViolation(_))));
    assert_eq!(publisher.core().media().await, MediaFlags::default());
}

#[tokio::test]
async fn test_reconfigure_before_join_is_illegal() {
    init_tracing();

    let tg = create_test_gateway();
    let (publisher, _events) = Publisher::attach(&tg.gateway, tg.settings()).await.unwrap();

    let err = publisher.stop_audio().await.unwrap_err();
    assert!(matches!(
        err,
        SignalingError::IllegalState {
            operation: "reconfigure",
            state: SessionState::Idle,
        }
    ));
    assert!(tg.transport.sent().await.is_empty());
}
