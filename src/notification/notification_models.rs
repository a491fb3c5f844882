use serde::Serialize;

use crate::{messaging::SendError, user::user_models::RecipientRecord};

/// Tokens that should receive the notification for one job event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationBatch {
    tokens: Vec<String>,
    without_token: usize,
}

impl NotificationBatch {
    pub fn from_recipients(recipients: &[RecipientRecord]) -> Self {
        let mut batch = Self::default();
        for recipient in recipients {
            match recipient.eligible_token() {
                Some(token) => batch.tokens.push(token.to_string()),
                None => batch.without_token += 1,
            }
        }
        batch
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn into_tokens(self) -> Vec<String> {
        self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Recipients skipped for lacking a token or having opted out of push.
    pub fn without_token(&self) -> usize {
        self.without_token
    }
}

/// Summary returned for each dispatched job event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResult {
    pub success: bool,
    /// Recipients with job alerts enabled.
    pub eligible: usize,
    pub sent: usize,
    pub failed: usize,
    pub without_token: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DispatchResult {
    pub fn no_recipients() -> Self {
        Self {
            success: true,
            eligible: 0,
            sent: 0,
            failed: 0,
            without_token: 0,
            message: None,
        }
    }

    pub fn no_tokens(eligible: usize, without_token: usize) -> Self {
        Self {
            success: false,
            eligible,
            sent: 0,
            failed: 0,
            without_token,
            message: Some("No FCM tokens available".to_string()),
        }
    }

    /// True when at least one recipient had a usable token.
    pub fn tokens_available(&self) -> bool {
        self.sent + self.failed > 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryFailure {
    pub token: String,
    pub error: Option<SendError>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub result: DispatchResult,
    pub failures: Vec<DeliveryFailure>,
}

impl DispatchOutcome {
    pub fn without_send(result: DispatchResult) -> Self {
        Self {
            result,
            failures: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::recipient;

    #[test]
    fn test_batch_keeps_recipient_order() {
        let batch = NotificationBatch::from_recipients(&[
            recipient(true, None, Some("A")),
            recipient(true, Some(false), Some("opted-out")),
            recipient(true, Some(true), Some("B")),
            recipient(true, None, None),
            recipient(true, None, Some("C")),
        ]);

        assert_eq!(batch.tokens(), ["A", "B", "C"]);
        assert_eq!(batch.without_token(), 2);
    }

    #[test]
    fn test_empty_batch() {
        let batch = NotificationBatch::from_recipients(&[recipient(true, None, None)]);
        assert!(batch.is_empty());
        assert!(batch.tokens().is_empty());
        assert_eq!(batch.without_token(), 1);
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let value = serde_json::to_value(DispatchResult::no_tokens(4, 4)).unwrap();

        assert_eq!(value["success"], false);
        assert_eq!(value["eligible"], 4);
        assert_eq!(value["withoutToken"], 4);
        assert_eq!(value["message"], "No FCM tokens available");
    }

    #[test]
    fn test_no_recipients_omits_message() {
        let value = serde_json::to_value(DispatchResult::no_recipients()).unwrap();
        assert!(value.get("message").is_none());
        assert!(!DispatchResult::no_recipients().tokens_available());
    }
}
