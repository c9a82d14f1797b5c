use serde_json::json;
use videoroom_client::{Negotiable, PublishOptions, Publisher, SessionState};
use videoroom_core::Jsep;

use crate::integration::{ROOM, create_test_gateway, init_tracing};
use crate::utils::{ANSWER_SDP, MockEngine, OFFER_SDP, ack, next_request, plugin_event};

#[tokio::test]
async fn test_publish_with_engine_negotiates_in_order() {
    init_tracing();

    let mut tg = create_test_gateway();
    let (publisher, _events) = Publisher::attach(&tg.gateway, tg.settings()).await.unwrap();
    let gateway = tg.gateway.clone();
    let engine = MockEngine::new(OFFER_SDP, ANSWER_SDP);

    let (joined, ()) = tokio::join!(
        publisher.publish_with(&engine, ROOM, "Alice", PublishOptions::default()),
        async {
            let request = next_request(&mut tg.requests).await;
            let offer = request.payload.jsep.as_ref().unwrap();
            assert!(!offer.sdp.contains("typ host"));
            gateway.dispatch(ack(&request));
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

    joined.unwrap();
    assert_eq!(
        engine.calls(),
        vec!["create_offer", "set_local:offer", "set_remote:answer"]
    );
    assert_eq!(publisher.core().state().await, SessionState::Active);
}

#[tokio::test]
async fn test_publish_with_engine_refuses_second_join() {
    init_tracing();

    let mut tg = create_test_gateway();
    let (publisher, _events, _) = crate::integration::join_alice(&mut tg).await;
    let engine = MockEngine::new(OFFER_SDP, ANSWER_SDP);

    let result = publisher
        .publish_with(&engine, ROOM, "Alice", PublishOptions::default())
        .await;

    assert!(result.is_err());
    assert!(engine.calls().is_empty());
}
