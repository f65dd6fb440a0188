use serde::Serialize;

#[derive(Clone, Debug)]
/// Payload fanned out to every subscriber of a room, shared between the
/// WebSocket forwarders and the SSE streams.
pub struct ServerEvent {
    /// Optional event name (used as the SSE `event:` field).
    pub event: Option<String>,
    /// Serialized JSON body.
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}
