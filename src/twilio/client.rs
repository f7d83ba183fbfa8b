//! Twilio REST client abstraction: trait + synchronous HTTP implementation.
//!
//! `TwilioApi` defines the three provider calls the book needs (account
//! fetch for the connect canary, message create, message list). The HTTP
//! implementation uses `ureq` with a per-call timeout and follows the list
//! endpoint's `next_page_uri` until the full filtered result set is fetched;
//! tests substitute an in-memory implementation.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;

use super::message::MessagePayload;
use crate::error::ProviderError;

/// Origin of the Twilio REST API.
pub const TWILIO_API_BASE: &str = "https://api.twilio.com";

/// API version path segment.
const API_VERSION: &str = "2010-04-01";

/// Account SID + auth token pair.
#[derive(Debug, Clone)]
pub struct TwilioCredentials {
    pub account_sid: String,
    pub auth_token: String,
}

impl TwilioCredentials {
    /// The `Authorization: Basic` header value for this credential pair.
    pub fn basic_auth(&self) -> String {
        let raw = format!("{}:{}", self.account_sid, self.auth_token);
        format!("Basic {}", BASE64.encode(raw))
    }
}

/// Query parameters for the message list endpoint. Unset slots are omitted
/// from the request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageListQuery {
    /// Exact recipient number.
    pub to: Option<String>,
    /// Exact sender number.
    pub from: Option<String>,
    /// Messages sent at exactly this instant.
    pub date_sent: Option<DateTime<Utc>>,
    /// Messages sent strictly before this instant.
    pub date_sent_before: Option<DateTime<Utc>>,
    /// Messages sent strictly after this instant.
    pub date_sent_after: Option<DateTime<Utc>>,
}

impl MessageListQuery {
    /// Render the populated slots as wire query pairs.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(to) = &self.to {
            pairs.push(("To", to.clone()));
        }
        if let Some(from) = &self.from {
            pairs.push(("From", from.clone()));
        }
        if let Some(at) = self.date_sent {
            pairs.push(("DateSent", iso8601(at)));
        }
        if let Some(before) = self.date_sent_before {
            pairs.push(("DateSent<", iso8601(before)));
        }
        if let Some(after) = self.date_sent_after {
            pairs.push(("DateSent>", iso8601(after)));
        }
        pairs
    }
}

fn iso8601(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// The provider calls the Twilio book performs.
///
/// Implementations are stateless with respect to credentials: the book owns
/// the validated credential pair and passes it into every call.
pub trait TwilioApi: Send {
    /// Fetch the account resource; used as the connect-time canary.
    fn fetch_account(
        &self,
        credentials: &TwilioCredentials,
        timeout: Duration,
    ) -> Result<(), ProviderError>;

    /// Create (send) a message and return its payload.
    fn create_message(
        &self,
        credentials: &TwilioCredentials,
        from: &str,
        to: &str,
        body: &str,
        timeout: Duration,
    ) -> Result<MessagePayload, ProviderError>;

    /// List all messages matching the query, exhausting provider-side pages.
    fn list_messages(
        &self,
        credentials: &TwilioCredentials,
        query: &MessageListQuery,
        timeout: Duration,
    ) -> Result<Vec<MessagePayload>, ProviderError>;
}

/// One page of the message list endpoint.
#[derive(Debug, Deserialize)]
struct MessagePage {
    messages: Vec<MessagePayload>,
    next_page_uri: Option<String>,
}

/// `TwilioApi` implementation speaking HTTPS via ureq.
#[derive(Debug, Clone)]
pub struct HttpTwilioClient {
    base_url: String,
}

impl HttpTwilioClient {
    /// Client against the production API origin.
    pub fn new() -> Self {
        Self::with_base_url(TWILIO_API_BASE)
    }

    /// Client against an alternate origin.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    fn agent(timeout: Duration) -> ureq::Agent {
        ureq::AgentBuilder::new().timeout(timeout).build()
    }
}

impl Default for HttpTwilioClient {
    fn default() -> Self {
        Self::new()
    }
}

impl TwilioApi for HttpTwilioClient {
    fn fetch_account(
        &self,
        credentials: &TwilioCredentials,
        timeout: Duration,
    ) -> Result<(), ProviderError> {
        let url = format!(
            "{}/{}/Accounts/{}.json",
            self.base_url, API_VERSION, credentials.account_sid
        );
        Self::agent(timeout)
            .get(&url)
            .set("Authorization", &credentials.basic_auth())
            .call()
            .map_err(|e| ProviderError::from_ureq("twilio", e))?;
        Ok(())
    }

    fn create_message(
        &self,
        credentials: &TwilioCredentials,
        from: &str,
        to: &str,
        body: &str,
        timeout: Duration,
    ) -> Result<MessagePayload, ProviderError> {
        let url = format!(
            "{}/{}/Accounts/{}/Messages.json",
            self.base_url, API_VERSION, credentials.account_sid
        );
        let response = Self::agent(timeout)
            .post(&url)
            .set("Authorization", &credentials.basic_auth())
            .send_form(&[("To", to), ("From", from), ("Body", body)])
            .map_err(|e| ProviderError::from_ureq("twilio", e))?;
        response
            .into_json()
            .map_err(|e| ProviderError::UnexpectedPayload {
                provider: "twilio",
                message: e.to_string(),
            })
    }

    fn list_messages(
        &self,
        credentials: &TwilioCredentials,
        query: &MessageListQuery,
        timeout: Duration,
    ) -> Result<Vec<MessagePayload>, ProviderError> {
        let agent = Self::agent(timeout);
        let auth = credentials.basic_auth();
        let mut messages = Vec::new();

        let first = format!(
            "{}/{}/Accounts/{}/Messages.json",
            self.base_url, API_VERSION, credentials.account_sid
        );
        let mut request = agent.get(&first);
        for (name, value) in query.to_pairs() {
            request = request.query(name, &value);
        }

        loop {
            let response = request
                .set("Authorization", &auth)
                .call()
                .map_err(|e| ProviderError::from_ureq("twilio", e))?;
            let page: MessagePage =
                response
                    .into_json()
                    .map_err(|e| ProviderError::UnexpectedPayload {
                        provider: "twilio",
                        message: e.to_string(),
                    })?;
            messages.extend(page.messages);

            // next_page_uri already carries the query string.
            match page.next_page_uri {
                Some(uri) if !uri.is_empty() => {
                    request = agent.get(&format!("{}{uri}", self.base_url));
                }
                _ => break,
            }
        }

        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn basic_auth_encodes_sid_and_token() {
        let credentials = TwilioCredentials {
            account_sid: "AC123".into(),
            auth_token: "secret".into(),
        };
        // base64("AC123:secret")
        assert_eq!(credentials.basic_auth(), "Basic QUMxMjM6c2VjcmV0");
    }

    #[test]
    fn query_omits_unset_slots() {
        assert!(MessageListQuery::default().to_pairs().is_empty());

        let query = MessageListQuery {
            from: Some("+1800".into()),
            date_sent_after: Some(Utc.with_ymd_and_hms(2022, 3, 1, 15, 0, 0).unwrap()),
            ..Default::default()
        };
        assert_eq!(
            query.to_pairs(),
            vec![
                ("From", "+1800".to_string()),
                ("DateSent>", "2022-03-01T15:00:00Z".to_string()),
            ]
        );
    }
}
