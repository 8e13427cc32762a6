use serde::Serialize;

/// Standard success envelope: `{ "status": "success", "data": ... }` with an
/// optional top-level message.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

pub fn success<T: Serialize>(data: T) -> Envelope<T> {
    Envelope {
        status: "success",
        message: None,
        data,
    }
}

pub fn success_with_message<T: Serialize>(message: impl Into<String>, data: T) -> Envelope<T> {
    Envelope {
        status: "success",
        message: Some(message.into()),
        data,
    }
}

/// Data-less confirmation body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub status: &'static str,
    pub message: String,
}

pub fn message(text: impl Into<String>) -> MessageResponse {
    MessageResponse {
        status: "success",
        message: text.into(),
    }
}
