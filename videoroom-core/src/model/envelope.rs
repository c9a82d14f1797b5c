use crate::model::ids::{HandleId, TransactionId};
use crate::model::jsep::Jsep;
use crate::model::signaling::IceCandidate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of an outbound request, written to the `janus` field.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Message,
    Trickle,
    Detach,
}

/// Inbound kind that settles a transaction.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AckKind {
    /// Synchronous plugin replies and core requests such as detach.
    Success,
    /// Asynchronous plugin replies, delivered after an intermediate `ack`.
    Event,
}

/// Value of the `janus` field on inbound envelopes.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InboundKind {
    Ack,
    Success,
    Event,
    Error,
    WebrtcUp,
    Media,
    Hangup,
    SlowLink,
    Detached,
    Other(String),
}

impl InboundKind {
    pub fn settles(&self, expected: AckKind) -> bool {
        matches!(
            (self, expected),
            (Self::Success, AckKind::Success) | (Self::Event, AckKind::Event)
        )
    }
}

impl From<String> for InboundKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "ack" => Self::Ack,
            "success" => Self::Success,
            "event" => Self::Event,
            "error" => Self::Error,
            "webrtcup" => Self::WebrtcUp,
            "media" => Self::Media,
            "hangup" => Self::Hangup,
            "slowlink" => Self::SlowLink,
            "detached" => Self::Detached,
            _ => Self::Other(kind),
        }
    }
}

impl From<InboundKind> for String {
    fn from(kind: InboundKind) -> Self {
        match kind {
            InboundKind::Ack => "ack".into(),
            InboundKind::Success => "success".into(),
            InboundKind::Event => "event".into(),
            InboundKind::Error => "error".into(),
            InboundKind::WebrtcUp => "webrtcup".into(),
            InboundKind::Media => "media".into(),
            InboundKind::Hangup => "hangup".into(),
            InboundKind::SlowLink => "slowlink".into(),
            InboundKind::Detached => "detached".into(),
            InboundKind::Other(kind) => kind,
        }
    }
}

/// Request content; which fields are set depends on the request kind.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Payload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsep: Option<Jsep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate: Option<IceCandidate>,
}

impl Payload {
    pub fn body(body: Value) -> Self {
        Self {
            body: Some(body),
            ..Default::default()
        }
    }

    pub fn with_jsep(mut self, jsep: Jsep) -> Self {
        self.jsep = Some(jsep);
        self
    }

    pub fn candidate(candidate: IceCandidate) -> Self {
        Self {
            candidate: Some(candidate),
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OutboundEnvelope {
    pub janus: RequestKind,
    pub transaction: TransactionId,
    pub handle_id: HandleId,
    #[serde(flatten)]
    pub payload: Payload,
}

impl OutboundEnvelope {
    /// The `request` field of the message body, if any.
    pub fn request(&self) -> Option<&str> {
        self.payload.body.as_ref()?.get("request")?.as_str()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PluginData {
    pub plugin: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ErrorBody {
    pub code: i64,
    #[serde(default)]
    pub reason: String,
}

/// Anything the gateway sends back: replies, acks, errors and push events.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InboundEnvelope {
    pub janus: InboundKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<TransactionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<HandleId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugindata: Option<PluginData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsep: Option<Jsep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InboundEnvelope {
    pub fn new(janus: InboundKind) -> Self {
        Self {
            janus,
            transaction: None,
            sender: None,
            plugindata: None,
            jsep: None,
            error: None,
            extra: Map::new(),
        }
    }

    pub fn plugin_data(&self) -> Option<&Value> {
        self.plugindata.as_ref().map(|p| &p.data)
    }
}
