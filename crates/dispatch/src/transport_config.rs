//! Shared provider credentials for the batch-addressed channels (email,
//! SMS). Feishu and Slack carry their address directly on the contact, so
//! they need no shared credential.

/// Environment variable names, following the teacher's `ENV_*` const
/// convention (`notify::Notifier::from_env`).
const ENV_RESEND_API_KEY: &str = "RESEND_API_KEY";
const ENV_RESEND_FROM_EMAIL: &str = "RESEND_FROM_EMAIL";
const ENV_RESEND_API_URL: &str = "RESEND_API_URL";
const ENV_TWILIO_ACCOUNT_SID: &str = "TWILIO_ACCOUNT_SID";
const ENV_TWILIO_AUTH_TOKEN: &str = "TWILIO_AUTH_TOKEN";
const ENV_TWILIO_FROM_NUMBER: &str = "TWILIO_FROM_NUMBER";
const ENV_TWILIO_API_BASE: &str = "TWILIO_API_BASE";

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub resend_api_key: String,
    pub resend_from_email: String,
    pub resend_api_url: String,
    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    pub twilio_from_number: String,
    pub twilio_api_base: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            resend_api_key: String::new(),
            resend_from_email: String::new(),
            resend_api_url: "https://api.resend.com/emails".to_string(),
            twilio_account_sid: String::new(),
            twilio_auth_token: String::new(),
            twilio_from_number: String::new(),
            twilio_api_base: "https://api.twilio.com".to_string(),
        }
    }
}

impl TransportConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            resend_api_key: std::env::var(ENV_RESEND_API_KEY).unwrap_or_default(),
            resend_from_email: std::env::var(ENV_RESEND_FROM_EMAIL).unwrap_or_default(),
            resend_api_url: std::env::var(ENV_RESEND_API_URL)
                .unwrap_or_else(|_| "https://api.resend.com/emails".to_string()),
            twilio_account_sid: std::env::var(ENV_TWILIO_ACCOUNT_SID).unwrap_or_default(),
            twilio_auth_token: std::env::var(ENV_TWILIO_AUTH_TOKEN).unwrap_or_default(),
            twilio_from_number: std::env::var(ENV_TWILIO_FROM_NUMBER).unwrap_or_default(),
            twilio_api_base: std::env::var(ENV_TWILIO_API_BASE)
                .unwrap_or_else(|_| "https://api.twilio.com".to_string()),
        }
    }
}
