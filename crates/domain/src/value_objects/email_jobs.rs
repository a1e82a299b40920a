use serde::{Deserialize, Serialize};

pub const EMAIL_JOB_TYPE: &str = "Email";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmailKind {
    Activation,
    ActivationComplete,
    PasswordReset,
    PasswordResetComplete,
    OrderConfirmation,
}

impl EmailKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailKind::Activation => "activation",
            EmailKind::ActivationComplete => "activation_complete",
            EmailKind::PasswordReset => "password_reset",
            EmailKind::PasswordResetComplete => "password_reset_complete",
            EmailKind::OrderConfirmation => "order_confirmation",
        }
    }
}

/// Payload stored in `jobs.payload` for every email job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailJobPayload {
    pub kind: EmailKind,
    pub recipient: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_minor: Option<i32>,
}

impl EmailJobPayload {
    /// Dedup key for jobs that must be enqueued at most once per
    /// source event. Token mails are naturally unique per token.
    pub fn dedup_key(&self) -> Option<String> {
        match self.kind {
            EmailKind::OrderConfirmation => self
                .order_id
                .map(|order_id| format!("{}:{}", self.kind.as_str(), order_id)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_confirmation_dedup_key_includes_order_id() {
        let payload = EmailJobPayload {
            kind: EmailKind::OrderConfirmation,
            recipient: "user@example.com".to_string(),
            token: None,
            order_id: Some(42),
            total_minor: Some(1998),
        };
        assert_eq!(
            payload.dedup_key().as_deref(),
            Some("order_confirmation:42")
        );
    }

    #[test]
    fn token_mails_have_no_dedup_key() {
        let payload = EmailJobPayload {
            kind: EmailKind::Activation,
            recipient: "user@example.com".to_string(),
            token: Some("abc".to_string()),
            order_id: None,
            total_minor: None,
        };
        assert!(payload.dedup_key().is_none());
    }
}
