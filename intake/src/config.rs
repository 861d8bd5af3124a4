use serde::Deserialize;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug, PartialEq)]
pub enum InvalidConfig {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Listener and admin listener cannot share {0}")]
    SharedAddress(String),

    #[error("Empty table name for {0}")]
    EmptyTableName(&'static str),

    #[error("Timeout for {0} cannot be 0")]
    ZeroTimeout(&'static str),

    #[error("Invalid mail API URL: {0}")]
    InvalidMailApiUrl(String),
}

/// Intake service configuration. Secrets are read from the environment, never from here.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Listener for the public submission endpoints
    pub listener: Listener,
    /// Listener for health and readiness probes
    pub admin_listener: Listener,
    pub tables: Tables,
    pub chat: ChatConfig,
    pub mail: MailConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listener: Listener {
                host: "0.0.0.0".into(),
                port: 3000,
            },
            admin_listener: Listener {
                host: "127.0.0.1".into(),
                port: 3001,
            },
            tables: Tables::default(),
            chat: ChatConfig::default(),
            mail: MailConfig::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), InvalidConfig> {
        self.listener.validate()?;
        self.admin_listener.validate()?;

        if self.listener == self.admin_listener {
            return Err(InvalidConfig::SharedAddress(self.listener.address()));
        }

        if self.tables.consultations.trim().is_empty() {
            return Err(InvalidConfig::EmptyTableName("consultations"));
        }
        if self.tables.tracking.trim().is_empty() {
            return Err(InvalidConfig::EmptyTableName("tracking"));
        }

        if self.chat.timeout_secs == 0 {
            return Err(InvalidConfig::ZeroTimeout("chat"));
        }
        if self.mail.timeout_secs == 0 {
            return Err(InvalidConfig::ZeroTimeout("mail"));
        }

        Url::parse(&self.mail.api_url)
            .map_err(|e| InvalidConfig::InvalidMailApiUrl(format!("{}: {e}", self.mail.api_url)))?;

        Ok(())
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Listener {
    pub fn validate(&self) -> Result<(), InvalidConfig> {
        if self.port == 0 {
            return Err(InvalidConfig::InvalidPort);
        }
        Ok(())
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Names of the collections written to.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Tables {
    pub consultations: String,
    pub tracking: String,
}

impl Default for Tables {
    fn default() -> Self {
        Tables {
            consultations: "consultations".into(),
            tracking: "tracking_logs".into(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChatConfig {
    pub timeout_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        ChatConfig { timeout_secs: 5 }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct MailConfig {
    pub api_url: String,
    /// Budget for the single send attempt
    pub timeout_secs: u64,
}

impl Default for MailConfig {
    fn default() -> Self {
        MailConfig {
            api_url: "https://api.mailjet.com/v3.1/send".into(),
            timeout_secs: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
listener:
    host: "0.0.0.0"
    port: 8080
admin_listener:
    host: "127.0.0.1"
    port: 8081
tables:
    consultations: leads
    tracking: events
chat:
    timeout_secs: 3
mail:
    api_url: "http://mail.internal/send"
    timeout_secs: 20
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.listener.port, 8080);
        assert_eq!(config.admin_listener.address(), "127.0.0.1:8081");
        assert_eq!(config.tables.consultations, "leads");
        assert_eq!(config.tables.tracking, "events");
        assert_eq!(config.chat.timeout_secs, 3);
        assert_eq!(config.mail.api_url, "http://mail.internal/send");
    }

    #[test]
    fn test_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.validate().is_ok());
        assert_eq!(config.tables.tracking, "tracking_logs");
        assert_eq!(config.chat.timeout_secs, 5);
        assert_eq!(config.mail.timeout_secs, 30);

        let partial: Config = serde_yaml::from_str("tables: {tracking: events}").unwrap();
        assert_eq!(partial.tables.consultations, "consultations");
        assert_eq!(partial.tables.tracking, "events");
    }

    #[test]
    fn test_validation_errors() {
        let mut config = Config::default();
        config.listener.port = 0;
        assert_eq!(config.validate().unwrap_err(), InvalidConfig::InvalidPort);

        let mut config = Config::default();
        config.admin_listener = config.listener.clone();
        assert!(matches!(
            config.validate().unwrap_err(),
            InvalidConfig::SharedAddress(_)
        ));

        let mut config = Config::default();
        config.tables.tracking = " ".into();
        assert_eq!(
            config.validate().unwrap_err(),
            InvalidConfig::EmptyTableName("tracking")
        );

        let mut config = Config::default();
        config.chat.timeout_secs = 0;
        assert_eq!(config.validate().unwrap_err(), InvalidConfig::ZeroTimeout("chat"));

        let mut config = Config::default();
        config.mail.api_url = "not-a-url".into();
        assert!(matches!(
            config.validate().unwrap_err(),
            InvalidConfig::InvalidMailApiUrl(_)
        ));
    }

    #[test]
    fn test_deserialization_errors() {
        // Missing port on an explicit listener
        assert!(serde_yaml::from_str::<Config>("listener: {host: \"0.0.0.0\"}").is_err());

        // Invalid port type
        assert!(
            serde_yaml::from_str::<Config>("listener: {host: \"0.0.0.0\", port: \"http\"}").is_err()
        );
    }
}
