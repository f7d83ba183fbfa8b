//! SMS message concept: a flat, typed record mapped 1:1 from the provider payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wire payload of a Twilio message resource, as returned by the REST API.
///
/// Dates are RFC 2822 text and `price` is a decimal string; typing happens
/// in [`SmsMessage::from_payload`], not here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagePayload {
    pub sid: Option<String>,
    pub body: Option<String>,
    pub num_segments: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub price: Option<String>,
    pub account_sid: Option<String>,
    pub num_media: Option<String>,
    pub status: Option<String>,
    pub messaging_service_sid: Option<String>,
    pub date_sent: Option<String>,
    pub date_created: Option<String>,
    pub date_updated: Option<String>,
    pub price_unit: Option<String>,
    pub error_code: Option<i64>,
    pub error_message: Option<String>,
}

/// An SMS (Short Message Service) message: a text communication sent over a
/// cellular network.
///
/// A pure field-for-field copy of the provider's message resource. Fields
/// the provider omits (or sends in a shape that cannot be typed, such as an
/// unparseable date) are `None`; nothing is validated or derived.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmsMessage {
    /// Unique provider-assigned identifier of the message resource.
    pub sid: Option<String>,
    /// Text content of the message.
    pub body: Option<String>,
    /// Number of billed segments the body was split into.
    pub num_segments: Option<String>,
    /// Sender's phone number (E.164), sender ID or channel address.
    pub sender_number: Option<String>,
    /// Recipient's phone number (E.164) or channel address.
    pub recipient_number: Option<String>,
    /// Amount billed for the message, in `price_unit` currency.
    pub price: Option<f64>,
    /// Account the message belongs to.
    pub account_sid: Option<String>,
    /// Number of media files attached to the message.
    pub num_media: Option<String>,
    /// Delivery status (queued, sent, delivered, failed, ...).
    pub status: Option<String>,
    /// Messaging service the message was sent through, if any.
    pub messaging_service_sid: Option<String>,
    /// When the provider sent (or received) the message.
    pub date_sent: Option<DateTime<Utc>>,
    /// When the message resource was created.
    pub date_created: Option<DateTime<Utc>>,
    /// When the message resource was last updated.
    pub date_updated: Option<DateTime<Utc>>,
    /// ISO 4217 currency of `price`.
    pub price_unit: Option<String>,
    /// Provider error code when the status is failed or undelivered.
    pub error_code: Option<i64>,
    /// Description of `error_code`, if any.
    pub error_message: Option<String>,
}

impl SmsMessage {
    /// Build a message record from a provider payload.
    pub fn from_payload(payload: MessagePayload) -> Self {
        Self {
            sid: payload.sid,
            body: payload.body,
            num_segments: payload.num_segments,
            sender_number: payload.from,
            recipient_number: payload.to,
            price: payload.price.as_deref().and_then(|p| p.parse().ok()),
            account_sid: payload.account_sid,
            num_media: payload.num_media,
            status: payload.status,
            messaging_service_sid: payload.messaging_service_sid,
            date_sent: parse_rfc2822(payload.date_sent.as_deref()),
            date_created: parse_rfc2822(payload.date_created.as_deref()),
            date_updated: parse_rfc2822(payload.date_updated.as_deref()),
            price_unit: payload.price_unit,
            error_code: payload.error_code,
            error_message: payload.error_message,
        }
    }
}

/// Parse the provider's RFC 2822 timestamps into UTC; anything unparseable
/// maps to absent.
fn parse_rfc2822(text: Option<&str>) -> Option<DateTime<Utc>> {
    text.and_then(|t| DateTime::parse_from_rfc2822(t).ok())
        .map(|d| d.with_timezone(&Utc))
}
