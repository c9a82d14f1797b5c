use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use videoroom_client::{EventCallback, VIDEOROOM_PLUGIN};
use videoroom_core::{HandleId, InboundEnvelope, Jsep, OutboundEnvelope};

/// Timeout for a request to reach the transport (ms).
pub const REQUEST_TIMEOUT_MS: u64 = 2000;

/// Offer with one host, one server-reflexive and one relay candidate.
pub const OFFER_SDP: &str = "v=0\r\n\
o=- 20518 0 IN IP4 0.0.0.0\r\n\
s=-\r\n\
m=video 9 UDP/TLS/RTP/SAVPF 96\r\n\
a=candidate:1 1 udp 2122260223 192.168.1.20 50000 typ host\r\n\
a=candidate:2 1 udp 1686052607 198.51.100.20 50001 typ srflx raddr 192.168.1.20 rport 50000\r\n\
a=candidate:3 1 udp 41885439 203.0.113.5 3478 typ relay raddr 198.51.100.20 rport 50001\r\n\
a=sendonly\r\n";

/// Gateway answer carrying one host and one relay candidate.
pub const ANSWER_SDP: &str = "v=0\r\n\
o=- 1 1 IN IP4 203.0.113.1\r\n\
s=VideoRoom\r\n\
m=video 9 UDP/TLS/RTP/SAVPF 96\r\n\
a=candidate:1 1 udp 2015363327 10.1.0.4 20000 typ host\r\n\
a=candidate:2 1 udp 41885439 203.0.113.1 3478 typ relay raddr 10.1.0.4 rport 20000\r\n\
a=recvonly\r\n";

pub const HOST_CANDIDATE: &str = "candidate:1 1 udp 2122260223 192.168.1.20 50000 typ host";
pub const RELAY_CANDIDATE: &str =
    "candidate:3 1 udp 41885439 203.0.113.5 3478 typ relay raddr 198.51.100.20 rport 50001";

/// Waits for the next envelope written to the transport.
pub async fn next_request(rx: &mut mpsc::UnboundedReceiver<OutboundEnvelope>) -> OutboundEnvelope {
    tokio::time::timeout(Duration::from_millis(REQUEST_TIMEOUT_MS), rx.recv())
        .await
        .expect("timed out waiting for a request")
        .expect("transport channel closed")
}

/// Push callback for handles whose events the test does not care about.
pub fn ignore_events() -> EventCallback {
    Arc::new(|_: HandleId, _: InboundEnvelope| {})
}

pub fn body(request: &OutboundEnvelope) -> &Value {
    request.payload.body.as_ref().expect("request without body")
}

fn reply(kind: &str, request: &OutboundEnvelope) -> Value {
    json!({
        "janus": kind,
        "session_id": 4242,
        "sender": request.handle_id,
        "transaction": request.transaction,
    })
}

fn envelope(value: Value) -> InboundEnvelope {
    serde_json::from_value(value).expect("invalid test envelope")
}

/// Intermediate acknowledgment of an asynchronous plugin request.
pub fn ack(request: &OutboundEnvelope) -> InboundEnvelope {
    envelope(reply("ack", request))
}

/// Asynchronous plugin reply.
pub fn plugin_event(request: &OutboundEnvelope, data: Value, jsep: Option<Jsep>) -> InboundEnvelope {
    let mut value = reply("event", request);
    value["plugindata"] = json!({ "plugin": VIDEOROOM_PLUGIN, "data": data });
    if let Some(jsep) = jsep {
        value["jsep"] = serde_json::to_value(jsep).unwrap();
    }
    envelope(value)
}

/// Synchronous plugin reply.
pub fn plugin_success(request: &OutboundEnvelope, data: Value) -> InboundEnvelope {
    let mut value = reply("success", request);
    value["plugindata"] = json!({ "plugin": VIDEOROOM_PLUGIN, "data": data });
    envelope(value)
}

/// Core reply without plugin data, as sent for `detach`.
pub fn core_success(request: &OutboundEnvelope) -> InboundEnvelope {
    envelope(reply("success", request))
}

pub fn error_reply(request: &OutboundEnvelope, code: i64, reason: &str) -> InboundEnvelope {
    let mut value = reply("error", request);
    value["error"] = json!({ "code": code, "reason": reason });
    envelope(value)
}

/// Unsolicited plugin event for `handle`.
pub fn push_event(handle: HandleId, data: Value) -> InboundEnvelope {
    envelope(json!({
        "janus": "event",
        "session_id": 4242,
        "sender": handle,
        "plugindata": { "plugin": VIDEOROOM_PLUGIN, "data": data },
    }))
}

/// Unsolicited core notification such as `webrtcup` or `hangup`.
pub fn core_notice(handle: HandleId, kind: &str) -> InboundEnvelope {
    envelope(json!({ "janus": kind, "session_id": 4242, "sender": handle }))
}
