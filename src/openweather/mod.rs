//! OpenWeather book: fetch real-time temperature data for any city.

use std::time::Duration;

use crate::book::{
    Book, BookSignature, Concept, ConnectInput, ProcedureInput, ProcedureParam,
    ProcedureSignature,
};
use crate::error::{BookError, BookResult, ConfigError, ProviderError};
use crate::value::Value;

/// Current-weather endpoint.
pub const OPENWEATHER_BASE_URL: &str = "http://api.openweathermap.org/data/2.5/weather";

/// Default per-call timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: f64 = 30.0;

/// Environment variable that, when set, overrides the explicit API key
/// argument at connect time.
pub const API_KEY_ENV: &str = "API_KEY";

/// Measurement system for the reported temperature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Unit {
    /// Kelvin.
    #[default]
    Standard,
    /// Celsius.
    Metric,
    /// Fahrenheit.
    Imperial,
}

impl Unit {
    /// The wire value of the `units` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Standard => "standard",
            Unit::Metric => "metric",
            Unit::Imperial => "imperial",
        }
    }
}

impl std::str::FromStr for Unit {
    type Err = ConfigError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text.to_lowercase().as_str() {
            "standard" => Ok(Unit::Standard),
            "metric" => Ok(Unit::Metric),
            "imperial" => Ok(Unit::Imperial),
            _ => Err(ConfigError::UnknownUnit {
                value: text.to_string(),
            }),
        }
    }
}

/// The provider call the OpenWeather book performs.
pub trait WeatherApi: Send {
    /// Fetch the current-weather payload for a city. The city is
    /// percent-encoded on the wire; the raw JSON payload comes back for the
    /// book to map.
    fn fetch_current(
        &self,
        api_key: &str,
        city: &str,
        units: Unit,
        timeout: Duration,
    ) -> Result<serde_json::Value, ProviderError>;
}

/// `WeatherApi` implementation speaking HTTP via ureq.
#[derive(Debug, Clone)]
pub struct HttpWeatherClient {
    base_url: String,
}

impl HttpWeatherClient {
    /// Client against the production endpoint.
    pub fn new() -> Self {
        Self::with_base_url(OPENWEATHER_BASE_URL)
    }

    /// Client against an alternate endpoint.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Default for HttpWeatherClient {
    fn default() -> Self {
        Self::new()
    }
}

impl WeatherApi for HttpWeatherClient {
    fn fetch_current(
        &self,
        api_key: &str,
        city: &str,
        units: Unit,
        timeout: Duration,
    ) -> Result<serde_json::Value, ProviderError> {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        let response = agent
            .get(&self.base_url)
            .query("appid", api_key)
            .query("q", city)
            .query("units", units.as_str())
            .call()
            .map_err(|e| ProviderError::from_ureq("openweather", e))?;
        response
            .into_json()
            .map_err(|e| ProviderError::UnexpectedPayload {
                provider: "openweather",
                message: e.to_string(),
            })
    }
}

/// The OpenWeather book.
///
/// Holds the configured timeout and, once [`OpenWeatherBook::connect`]
/// succeeds, the validated API key.
pub struct OpenWeatherBook {
    client: Box<dyn WeatherApi>,
    api_key: Option<String>,
    timeout_secs: f64,
}

impl OpenWeatherBook {
    /// Book speaking to the production OpenWeather API.
    pub fn new() -> Self {
        Self::with_client(Box::new(HttpWeatherClient::new()))
    }

    /// Book over an explicit provider client (used by tests).
    pub fn with_client(client: Box<dyn WeatherApi>) -> Self {
        Self {
            client,
            api_key: None,
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

    fn api_key(&self) -> BookResult<&str> {
        self.api_key.as_deref().ok_or(BookError::NotConnected {
            book: "openweather".into(),
        })
    }

    /// Authenticate with an API key, verified by a canary request.
    ///
    /// Precedence: when the `API_KEY` environment variable is set it wins
    /// over the explicit argument. The key is rejected (and not retained)
    /// only when the provider answers 401 with an "Invalid API key"
    /// message; transport failures propagate as such.
    pub fn connect(&mut self, api_key: &str) -> BookResult<()> {
        let api_key = std::env::var(API_KEY_ENV).unwrap_or_else(|_| api_key.to_string());

        tracing::info!("connecting to OpenWeather");
        match self
            .client
            .fetch_current(&api_key, "London", Unit::Standard, self.timeout_duration())
        {
            Ok(_) => {}
            Err(ProviderError::Status { status: 401, body, .. })
                if body_reports_invalid_key(&body) =>
            {
                tracing::error!("OpenWeather rejected the API key");
                return Err(ProviderError::InvalidCredentials {
                    provider: "openweather",
                }
                .into());
            }
            Err(ProviderError::Status { status, .. }) => {
                // Canary reached the provider and authenticated; a non-auth
                // status (e.g. quota) does not invalidate the key.
                tracing::warn!(status, "OpenWeather canary returned a non-success status");
            }
            Err(error) => {
                tracing::error!(%error, "could not connect to OpenWeather");
                return Err(error.into());
            }
        }

        self.api_key = Some(api_key);
        Ok(())
    }

    /// Fetch the current temperature for a city, in the requested unit
    /// (standard/Kelvin when omitted).
    pub fn current_temperature(&self, city: &str, unit: Option<Unit>) -> BookResult<f64> {
        let api_key = self.api_key()?;
        let units = unit.unwrap_or_default();

        tracing::info!(city, "retrieving temperature");
        let payload = self
            .client
            .fetch_current(api_key, city, units, self.timeout_duration())
            .inspect_err(|error| tracing::error!(%error, "could not retrieve temperature"))?;

        payload["main"]["temp"]
            .as_f64()
            .ok_or_else(|| {
                ProviderError::UnexpectedPayload {
                    provider: "openweather",
                    message: "missing main.temp field".into(),
                }
                .into()
            })
    }
}

/// Whether a 401 body carries the provider's invalid-key message.
fn body_reports_invalid_key(body: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            json.get("message")
                .and_then(|m| m.as_str())
                .map(|m| m.contains("Invalid API key"))
        })
        .unwrap_or(false)
}

impl Default for OpenWeatherBook {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for OpenWeatherBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherBook")
            .field("connected", &self.api_key.is_some())
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Book for OpenWeatherBook {
    fn signature(&self) -> BookSignature {
        BookSignature {
            name: "openweather".into(),
            description: "Fetch real-time temperature data for any city via the OpenWeather API."
                .into(),
            procedures: vec![ProcedureSignature {
                name: "current_temperature".into(),
                description: "Fetch the current temperature for a city.".into(),
                parameters: vec![
                    ProcedureParam::required("city", "City name, optionally with an ISO 3166 state or country code."),
                    ProcedureParam::optional("unit", "Measurement unit: standard, metric or imperial (default standard)."),
                ],
            }],
        }
    }

    fn connect(&mut self, input: ConnectInput) -> BookResult<()> {
        if let Some(seconds) = input.timeout()? {
            self.set_timeout(seconds)?;
        }
        let api_key = input.require("api_key", "openweather")?.to_string();
        OpenWeatherBook::connect(self, &api_key)
    }

    fn call(&self, procedure: &str, input: ProcedureInput) -> BookResult<Concept> {
        match procedure {
            "current_temperature" => {
                let city = input.require_text("city", procedure)?;
                let unit = match input.text("unit") {
                    Some(text) => Some(text.parse::<Unit>()?),
                    None => None,
                };
                let temperature = self.current_temperature(city, unit)?;
                Ok(Concept::Scalar(Value::Number(temperature)))
            }
            other => Err(BookError::UnknownProcedure {
                book: "openweather".into(),
                name: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// `connect` reads the `API_KEY` override from the process environment,
    /// so tests that connect take this lock to serialize against the test
    /// that sets the variable.
    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static LOCK: Mutex<()> = Mutex::new(());
        LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// In-memory provider standing in for the OpenWeather API.
    struct MockWeather {
        api_key: String,
        temp: f64,
    }

    impl WeatherApi for MockWeather {
        fn fetch_current(
            &self,
            api_key: &str,
            city: &str,
            _units: Unit,
            _timeout: Duration,
        ) -> Result<serde_json::Value, ProviderError> {
            if api_key != self.api_key {
                return Err(ProviderError::Status {
                    provider: "openweather",
                    status: 401,
                    body: r#"{"cod":401,"message":"Invalid API key. Please see https://openweathermap.org/faq#error401 for more info."}"#.into(),
                });
            }
            if city.is_empty() {
                return Err(ProviderError::Status {
                    provider: "openweather",
                    status: 404,
                    body: r#"{"cod":"404","message":"city not found"}"#.into(),
                });
            }
            Ok(serde_json::json!({"main": {"temp": self.temp}}))
        }
    }

    fn book(temp: f64) -> OpenWeatherBook {
        OpenWeatherBook::with_client(Box::new(MockWeather {
            api_key: "good-key".into(),
            temp,
        }))
    }

    #[test]
    fn timeout_must_be_positive() {
        let mut b = book(0.0);
        assert!(matches!(
            b.set_timeout(0.0),
            Err(ConfigError::NonPositiveTimeout { .. })
        ));
        assert!(b.set_timeout(-1.0).is_err());
        b.set_timeout(12.5).unwrap();
        assert_eq!(b.timeout(), 12.5);
    }

    #[test]
    fn dynamic_connect_configures_the_timeout() {
        let _env = env_lock();
        let mut b = book(0.0);
        let err = Book::connect(
            &mut b,
            ConnectInput::new()
                .with_param("api_key", "good-key")
                .with_param("timeout", "-1"),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            BookError::Config(ConfigError::NonPositiveTimeout { .. })
        ));
        assert_eq!(b.timeout(), DEFAULT_TIMEOUT_SECS);

        Book::connect(
            &mut b,
            ConnectInput::new()
                .with_param("api_key", "good-key")
                .with_param("timeout", "5"),
        )
        .unwrap();
        assert_eq!(b.timeout(), 5.0);

        let err = Book::connect(
            &mut b,
            ConnectInput::new()
                .with_param("api_key", "good-key")
                .with_param("timeout", "fast"),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            BookError::Config(ConfigError::UnparseableTimeout { .. })
        ));
    }

    #[test]
    fn env_api_key_overrides_the_argument() {
        let _env = env_lock();
        let mut b = book(290.0);
        // Set/remove is process-global; the lock keeps other connecting
        // tests out of this window.
        unsafe { std::env::set_var(API_KEY_ENV, "good-key") };
        let result = b.connect("bad-key");
        unsafe { std::env::remove_var(API_KEY_ENV) };

        // The env value won the precedence race and was retained.
        result.unwrap();
        assert_eq!(b.current_temperature("London", None).unwrap(), 290.0);
    }

    #[test]
    fn invalid_api_key_is_not_retained() {
        let _env = env_lock();
        let mut b = book(0.0);
        let err = b.connect("bad-key").unwrap_err();
        assert!(matches!(
            err,
            BookError::Provider(ProviderError::InvalidCredentials { .. })
        ));
        assert!(matches!(
            b.current_temperature("London", None),
            Err(BookError::NotConnected { .. })
        ));
    }

    #[test]
    fn temperature_comes_from_the_payload() {
        let _env = env_lock();
        let mut b = book(285.3);
        b.connect("good-key").unwrap();
        assert_eq!(b.current_temperature("London", None).unwrap(), 285.3);
        assert_eq!(
            b.current_temperature("Buenos Aires", Some(Unit::Metric))
                .unwrap(),
            285.3
        );
    }

    #[test]
    fn provider_status_failures_propagate() {
        let _env = env_lock();
        let mut b = book(1.0);
        b.connect("good-key").unwrap();
        let err = b.current_temperature("", None).unwrap_err();
        match err {
            BookError::Provider(ProviderError::Status { status, .. }) => assert_eq!(status, 404),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unit_parsing_is_case_insensitive_and_closed() {
        assert_eq!("Metric".parse::<Unit>().unwrap(), Unit::Metric);
        assert_eq!("IMPERIAL".parse::<Unit>().unwrap(), Unit::Imperial);
        assert!(matches!(
            "fahrenheit".parse::<Unit>(),
            Err(ConfigError::UnknownUnit { .. })
        ));
    }

    #[test]
    fn dynamic_call_maps_unit_and_returns_a_number() {
        let _env = env_lock();
        let mut b = book(300.0);
        b.connect("good-key").unwrap();
        let out = b
            .call(
                "current_temperature",
                ProcedureInput::new()
                    .with_text("city", "São Paulo")
                    .with_text("unit", "metric"),
            )
            .unwrap();
        assert_eq!(out.as_number(), Some(300.0));

        let err = b
            .call(
                "current_temperature",
                ProcedureInput::new()
                    .with_text("city", "London")
                    .with_text("unit", "kelvinish"),
            )
            .unwrap_err();
        assert!(matches!(err, BookError::Config(_)));
    }

    #[test]
    fn invalid_key_detection_requires_the_provider_message() {
        assert!(body_reports_invalid_key(
            r#"{"cod":401,"message":"Invalid API key."}"#
        ));
        assert!(!body_reports_invalid_key(
            r#"{"cod":401,"message":"API key expired"}"#
        ));
        assert!(!body_reports_invalid_key("not json"));
    }
}
