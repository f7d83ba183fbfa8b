//! Twilio book: send and read SMS messages via the Twilio REST API.

pub mod client;
pub mod filter;
pub mod message;

pub use client::{HttpTwilioClient, MessageListQuery, TwilioApi, TwilioCredentials};
pub use filter::SmsMessageFilter;
pub use message::{MessagePayload, SmsMessage};

use std::time::Duration;

use crate::book::{
    Book, BookSignature, Concept, ConnectInput, ProcedureInput, ProcedureParam,
    ProcedureSignature, paginate,
};
use crate::error::{BookError, BookResult, ConfigError, ProviderError};
use crate::filter::FilterExpr;
use crate::value::Value;

/// Default per-call timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: f64 = 30.0;

/// The Twilio book.
///
/// Holds the configured timeout and, once [`TwilioBook::connect`] succeeds,
/// the validated credential pair. Every procedure performs exactly one
/// provider call; there are no retries and no shared state beyond the
/// configuration itself.
pub struct TwilioBook {
    client: Box<dyn TwilioApi>,
    credentials: Option<TwilioCredentials>,
    timeout_secs: f64,
}

impl TwilioBook {
    /// Book speaking to the production Twilio API.
    pub fn new() -> Self {
        Self::with_client(Box::new(HttpTwilioClient::new()))
    }

    /// Book over an explicit provider client (used by tests).
    pub fn with_client(client: Box<dyn TwilioApi>) -> Self {
        Self {
            client,
            credentials: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// The per-call timeout, in seconds.
    pub fn timeout(&self) -> f64 {
        self.timeout_secs
    }

    /// Set the per-call timeout; must be strictly positive.
    pub fn set_timeout(&mut self, seconds: f64) -> Result<(), ConfigError> {
        if !(seconds > 0.0) {
            return Err(ConfigError::NonPositiveTimeout { seconds });
        }
        self.timeout_secs = seconds;
        Ok(())
    }

    fn timeout_duration(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_secs)
    }

    fn credentials(&self) -> BookResult<&TwilioCredentials> {
        self.credentials.as_ref().ok_or(BookError::NotConnected {
            book: "twilio".into(),
        })
    }

    /// Verify the credential pair by fetching the account resource.
    ///
    /// On any rejection the credential is not retained: an authentication
    /// status maps to an invalid-credentials error, anything else propagates
    /// as the transport/status failure it was.
    pub fn connect(&mut self, account_sid: &str, auth_token: &str) -> BookResult<()> {
        tracing::info!(account_sid, "connecting to Twilio");
        let candidate = TwilioCredentials {
            account_sid: account_sid.to_string(),
            auth_token: auth_token.to_string(),
        };

        match self
            .client
            .fetch_account(&candidate, self.timeout_duration())
        {
            Ok(()) => {
                self.credentials = Some(candidate);
                tracing::info!("connected to Twilio");
                Ok(())
            }
            Err(error) => {
                tracing::error!(%error, "could not connect to Twilio");
                match error {
                    ProviderError::Status { status, .. } if status == 401 || status == 403 => {
                        Err(ProviderError::InvalidCredentials { provider: "twilio" }.into())
                    }
                    other => Err(other.into()),
                }
            }
        }
    }

    /// Send an SMS message and return the provider-assigned message sid.
    pub fn send_sms_message(
        &self,
        sender_number: &str,
        recipient_number: &str,
        message_body: &str,
    ) -> BookResult<Option<String>> {
        let credentials = self.credentials()?;
        let payload = self
            .client
            .create_message(
                credentials,
                sender_number,
                recipient_number,
                message_body,
                self.timeout_duration(),
            )
            .inspect_err(|error| tracing::error!(%error, "could not send SMS message"))?;
        Ok(payload.sid)
    }

    /// Read messages matching the optional filter expression.
    ///
    /// The filter is translated into provider query parameters; offset and
    /// limit are applied to the already-fetched list, not pushed down.
    pub fn read_sms_messages(
        &self,
        offset: Option<usize>,
        limit: Option<usize>,
        filter: Option<&FilterExpr>,
    ) -> BookResult<Vec<SmsMessage>> {
        let credentials = self.credentials()?;
        let query = match filter {
            Some(expression) => SmsMessageFilter::extract(expression)?.into_query(),
            None => MessageListQuery::default(),
        };

        let payloads = self
            .client
            .list_messages(credentials, &query, self.timeout_duration())
            .inspect_err(|error| tracing::error!(%error, "could not list SMS messages"))?;

        let messages = payloads.into_iter().map(SmsMessage::from_payload).collect();
        Ok(paginate(messages, offset, limit))
    }
}

impl Default for TwilioBook {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TwilioBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioBook")
            .field("connected", &self.credentials.is_some())
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Book for TwilioBook {
    fn signature(&self) -> BookSignature {
        BookSignature {
            name: "twilio".into(),
            description: "Send and read SMS messages via the Twilio communication platform.".into(),
            procedures: vec![
                ProcedureSignature {
                    name: "send_sms_message".into(),
                    description: "Send an SMS message and return its message sid.".into(),
                    parameters: vec![
                        ProcedureParam::required("sender_number", "Phone number to send from."),
                        ProcedureParam::required("recipient_number", "Phone number to send to."),
                        ProcedureParam::required("message_body", "Text body of the message."),
                    ],
                },
                ProcedureSignature {
                    name: "read_sms_messages".into(),
                    description: "Read SMS messages matching an optional filter, with client-side offset/limit slicing.".into(),
                    parameters: vec![],
                },
            ],
        }
    }

    fn connect(&mut self, input: ConnectInput) -> BookResult<()> {
        if let Some(seconds) = input.timeout()? {
            self.set_timeout(seconds)?;
        }
        let account_sid = input.require("account_sid", "twilio")?.to_string();
        let auth_token = input.require("auth_token", "twilio")?.to_string();
        TwilioBook::connect(self, &account_sid, &auth_token)
    }

    fn call(&self, procedure: &str, input: ProcedureInput) -> BookResult<Concept> {
        match procedure {
            "send_sms_message" => {
                let sender = input.require_text("sender_number", procedure)?;
                let recipient = input.require_text("recipient_number", procedure)?;
                let body = input.require_text("message_body", procedure)?;
                match self.send_sms_message(sender, recipient, body)? {
                    Some(sid) => Ok(Concept::Scalar(Value::Text(sid))),
                    None => Ok(Concept::Empty),
                }
            }
            "read_sms_messages" => {
                let messages =
                    self.read_sms_messages(input.offset, input.limit, input.filter.as_ref())?;
                let records = messages
                    .into_iter()
                    .map(|m| serde_json::to_value(m).unwrap_or(serde_json::Value::Null))
                    .collect();
                Ok(Concept::Records(records))
            }
            other => Err(BookError::UnknownProcedure {
                book: "twilio".into(),
                name: other.to_string(),
            }),
        }
    }
}
