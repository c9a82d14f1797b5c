use serde_json::json;
use videoroom_client::{MediaFlags, Negotiable, Reconfigurable, SubscribeOptions};
use videoroom_core::Jsep;

use crate::integration::{BOB, create_test_gateway, init_tracing, join_alice};
use crate::utils::{ANSWER_SDP, OFFER_SDP, body, next_request, plugin_event};

#[tokio::test]
async fn test_subscriber_configure_carries_full_context() {
    init_tracing();

    let mut tg = create_test_gateway();
    let (publisher, _events, _) = join_alice(&mut tg).await;
    let gateway = tg.gateway.clone();

    let (subscription, ()) = tokio::join!(
        publisher.subscribe(
            BOB,
            SubscribeOptions {
                pin: Some("1111".into()),
                ..Default::default()
            }
        ),
        async {
            let request = next_request(&mut tg.requests).await;
            gateway.dispatch(plugin_event(
                &request,
                json!({ "videoroom": "attached", "room": 1234, "id": 7 }),
                Some(Jsep::offer(ANSWER_SDP)),
            ));
        }
    );
    let subscriber = subscription.unwrap().subscriber;

    let answer = Jsep::answer(OFFER_SDP);
    let (started, ()) = tokio::join!(subscriber.start_with_answer(&answer), async {
        let request = next_request(&mut tg.requests).await;
        gateway.dispatch(plugin_event(
            &request,
            json!({ "videoroom": "event", "room": 1234, "started": "ok" }),
            None,
        ));
    });
    started.unwrap();

    // unchanged flags still resend the subscription
    let sent_before = tg.transport.sent().await.len();
    let (resent, ()) = tokio::join!(subscriber.reconfigure(true, true), async {
        let request = next_request(&mut tg.requests).await;
        assert_eq!(body(&request)["request"], "configure");
        assert_eq!(body(&request)["feed"], 7);
        assert_eq!(body(&request)["audio"], true);
        assert_eq!(body(&request)["video"], true);
        gateway.dispatch(plugin_event(
            &request,
            json!({ "videoroom": "event", "room": 1234, "configured": "ok" }),
            None,
        ));
    });
    resent.unwrap();
    assert_eq!(tg.transport.sent().await.len(), sent_before + 1);

    let (configured, ()) = tokio::join!(subscriber.stop_audio(), async {
        let request = next_request(&mut tg.requests).await;
        assert_eq!(
            body(&request),
            &json!({
                "request": "configure",
                "ptype": "subscriber",
                "feed": 7,
                "room": 1234,
                "audio": false,
                "video": true,
                "offer_audio": false,
                "offer_video": true,
                "pin": "1111",
                "private_id": 9001
            })
        );
        gateway.dispatch(plugin_event(
            &request,
            json!({ "videoroom": "event", "room": 1234, "configured": "ok" }),
            None,
        ));
    });

    configured.unwrap();
    assert_eq!(subscriber.core().media().await, MediaFlags::new(false, true));
}
