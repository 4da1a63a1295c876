use serde::{Deserialize, Deserializer};

/// Mail settings as they appear in the site configuration.
///
/// `mailer_dsn` wins when set; otherwise a DSN is built from `mailer` and the
/// `smtp*` keys (see [`crate::dsn::build`]).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub mailer: String,
    pub mailer_dsn: String,
    pub smtphost: String,
    /// Accepts a number or a numeric string; empty means the scheme default.
    #[serde(deserialize_with = "port")]
    pub smtpport: u16,
    pub smtpuser: String,
    pub smtppass: String,
    pub mailfrom: String,
    pub fromname: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            mailer: "sendmail".to_string(),
            mailer_dsn: String::new(),
            smtphost: "localhost".to_string(),
            smtpport: 0,
            smtpuser: String::new(),
            smtppass: String::new(),
            mailfrom: String::new(),
            fromname: String::new(),
        }
    }
}

fn port<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u16, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PortValue {
        Number(u64),
        Text(String),
    }

    let number = match PortValue::deserialize(deserializer)? {
        PortValue::Number(n) => n,
        PortValue::Text(text) if text.trim().is_empty() => 0,
        PortValue::Text(text) => text
            .trim()
            .parse::<u64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid port `{text}`")))?,
    };
    u16::try_from(number).map_err(|_| serde::de::Error::custom(format!("port {number} out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: MailConfig =
            serde_json::from_str(r#"{"mailer": "smtp", "smtpport": 2525}"#).unwrap();
        assert_eq!(config.mailer, "smtp");
        assert_eq!(config.smtpport, 2525);
        assert_eq!(config.smtphost, "localhost");
        assert!(config.mailer_dsn.is_empty());
    }

    #[test]
    fn test_port_as_string() {
        let config: MailConfig = serde_json::from_str(r#"{"smtpport": "2525"}"#).unwrap();
        assert_eq!(config.smtpport, 2525);
        let config: MailConfig = serde_json::from_str(r#"{"smtpport": ""}"#).unwrap();
        assert_eq!(config.smtpport, 0);
    }

    #[test]
    fn test_bad_ports() {
        assert!(serde_json::from_str::<MailConfig>(r#"{"smtpport": "smtp"}"#).is_err());
        assert!(serde_json::from_str::<MailConfig>(r#"{"smtpport": 70000}"#).is_err());
        assert!(serde_json::from_str::<MailConfig>(r#"{"smtpport": -1}"#).is_err());
    }
}
