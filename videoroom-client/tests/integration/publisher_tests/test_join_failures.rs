use serde_json::json;
use videoroom_client::{Negotiable, PublishOptions, Publisher, SessionState, SignalingError};
use videoroom_core::Jsep;

use crate::integration::{ALICE, ROOM, create_test_gateway, init_tracing};
use crate::utils::{ANSWER_SDP, OFFER_SDP, ack, body, next_request, plugin_event};

#[tokio::test]
async fn test_join_without_private_id_changes_nothing() {
    init_tracing();

    let mut tg = create_test_gateway();
    let (publisher, _events) = Publisher::attach(&tg.gateway, tg.settings()).await.unwrap();
    let gateway = tg.gateway.clone();
    let offer = Jsep::offer(OFFER_SDP);

    let (result, ()) = tokio::join!(
        publisher.join_and_publish(ROOM, "Alice", &offer, PublishOptions::default()),
        async {
            let request = next_request(&mut tg.requests).await;
            gateway.dispatch(ack(&request));
            gateway.dispatch(plugin_event(
                &request,
                json!({ "videoroom": "joined", "room": 1234, "id": 1, "publishers": [] }),
                Some(Jsep::answer(ANSWER_SDP)),
            ));
        }
    );

    match result {
        Err(SignalingError::ProtocolViolation(message)) => assert!(message.contains("private_id")),
        other => panic!("unexpected join result: {other:?}"),
    }

    let core = publisher.core();
    assert_eq!(core.state().await, SessionState::Idle);
    assert_eq!(core.room_id(), None);
    assert_eq!(core.member_id().await, None);
    assert_eq!(core.private_member_id().await, None);
    assert_eq!(publisher.offer_sdp().await, None);
    assert_eq!(tg.observer.failures(), vec!["join_and_publish"]);

    // back in Idle, a later join is accepted
    let (retry, ()) = tokio::join!(
        publisher.join_and_publish(ROOM, "Alice", &offer, PublishOptions::default()),
        async {
            let request = next_request(&mut tg.requests).await;
            gateway.dispatch(plugin_event(
                &request,
                json!({
                    "videoroom": "joined",
                    "room": 1234,
                    "id": 1,
                    "private_id": 9001,
                    "publishers": []
                }),
                Some(Jsep::answer(ANSWER_SDP)),
            ));
        }
    );

    assert!(retry.unwrap().publishers.is_empty());
    assert_eq!(core.member_id().await, Some(ALICE));
    assert_eq!(core.room_id(), Some(ROOM));
}

#[tokio::test]
async fn test_join_unknown_room_reports_no_such_room() {
    init_tracing();

    let mut tg = create_test_gateway();
    let (publisher, _events) = Publisher::attach(&tg.gateway, tg.settings()).await.unwrap();
    let gateway = tg.gateway.clone();

    let options = PublishOptions {
        pin: Some("1111".into()),
        ..Default::default()
    };
    let offer = Jsep::offer(OFFER_SDP);
    let (result, ()) = tokio::join!(
        publisher.join_and_publish(ROOM, "Alice", &offer, options),
        async {
            let request = next_request(&mut tg.requests).await;
            assert_eq!(body(&request)["pin"], "1111");
            gateway.dispatch(ack(&request));
            gateway.dispatch(plugin_event(
                &request,
                json!({ "videoroom": "event", "error_code": 426, "error": "No such room (1234)" }),
                None,
            ));
        }
    );

    let err = result.unwrap_err();
    assert!(err.is_no_such_room(), "unexpected error: {err}");
    assert_eq!(publisher.core().state().await, SessionState::Idle);
}

#[tokio::test]
async fn test_join_with_offer_instead_of_answer_is_rejected() {
    init_tracing();

    let mut tg = create_test_gateway();
    let (publisher, _events) = Publisher::attach(&tg.gateway, tg.settings()).await.unwrap();
    let gateway = tg.gateway.clone();

    let offer = Jsep::offer(OFFER_SDP);
    let (result, ()) = tokio::join!(
        publisher.join_and_publish(ROOM, "Alice", &offer, PublishOptions::default()),
        async {
            let request = next_request(&mut tg.requests).await;
            gateway.dispatch(plugin_event(
                &request,
                json!({
                    "videoroom": "joined",
                    "room": 1234,
                    "id": 1,
                    "private_id": 9001,
                    "publishers": []
                }),
                Some(Jsep::offer(ANSWER_SDP)),
            ));
        }
    );

    assert!(matches!(result, Err(SignalingError::ProtocolViolation(_))));
    assert_eq!(publisher.core().state().await, SessionState::Idle);
}
