// SPDX-FileCopyrightText: 2024 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Classification of APNs responses.
//!
//! APNs returns 200 for every accepted push; any other status carries a
//! JSON body with a `reason` field from a fixed vocabulary. The reason →
//! remediation table below is plain data so it stays trivially auditable.

use serde::Deserialize;

/// Reason codes that are conventionally worth retrying on the caller side.
/// All other reasons indicate a permanent input or credential problem.
const RETRYABLE_REASONS: &[&str] = &[
    "TooManyRequests",
    "InternalServerError",
    "ServiceUnavailable",
    "Shutdown",
];

/// Remediation advice for every known reason code.
const REASON_EXPLANATIONS: &[(&str, &str)] = &[
    (
        "BadDeviceToken",
        "The device token is invalid or was issued for a different environment.\n\
         Make sure the token was obtained from this app in this environment: sandbox\n\
         tokens are rejected by the production host and vice versa. Tokens are also\n\
         invalidated when the app is reinstalled, when the user restores the device\n\
         from a backup, or when notification permission is revoked; fetch a fresh\n\
         token from the device and try again.",
    ),
    (
        "Unregistered",
        "The device token is no longer active for this topic.\n\
         The app was probably uninstalled from the device; stop sending to this\n\
         token and remove it from your records.",
    ),
    (
        "BadCertificate",
        "The certificate used for the connection is not valid.\n\
         This client authenticates with a provider token rather than a certificate,\n\
         so this usually points at a stale certificate still configured on the\n\
         provider side; remove it or switch that sender to token authentication.",
    ),
    (
        "BadCertificateEnvironment",
        "The client certificate is for the wrong environment.\n\
         Sandbox certificates cannot push through the production host and vice\n\
         versa; match the certificate to the endpoint you are targeting.",
    ),
    (
        "ExpiredProviderToken",
        "The provider token is expired.\n\
         APNs accepts tokens for roughly an hour after their issued-at time.\n\
         This client stamps each token at send time, so an expired token almost\n\
         always means the local clock is wrong; check the system time.",
    ),
    (
        "InvalidProviderToken",
        "The provider token could not be validated.\n\
         Check that the team identifier matches your developer account, that the\n\
         key identifier matches the downloaded .p8 file, and that the key has not\n\
         been revoked in the developer portal.",
    ),
    (
        "MissingProviderToken",
        "No provider token was attached to the request and no certificate was\n\
         presented. The authorization header was dropped somewhere along the way;\n\
         this is a bug in the sending pipeline.",
    ),
    (
        "TopicDisallowed",
        "Pushing to this topic is not allowed with these credentials.\n\
         The signing key belongs to a team that does not own this bundle\n\
         identifier; check the topic and the team identifier.",
    ),
    (
        "BadMessageId",
        "The apns-id header value is malformed.\n\
         If you set one, it must be a canonical UUID; omit the header to let APNs\n\
         assign one.",
    ),
    (
        "PayloadEmpty",
        "The message payload was empty.\n\
         APNs requires a non-empty JSON payload with an aps dictionary.",
    ),
    (
        "PayloadTooLarge",
        "The message payload is too large.\n\
         Regular notifications are limited to 4096 bytes (5120 for VoIP); trim\n\
         the payload.",
    ),
    (
        "BadTopic",
        "The apns-topic header is malformed.\n\
         It must be the app's bundle identifier, e.g. com.example.app.",
    ),
    (
        "DeviceTokenNotForTopic",
        "The device token does not match the topic.\n\
         The token was issued to a different app than the bundle identifier in\n\
         apns-topic; check that token and topic belong to the same app.",
    ),
    (
        "TooManyRequests",
        "Too many requests were made consecutively to the same device token.\n\
         Back off before sending to this token again.",
    ),
    (
        "InternalServerError",
        "An internal server error occurred at APNs.\n\
         This is not an input problem; retry after a short delay.",
    ),
    (
        "ServiceUnavailable",
        "The APNs service is currently unavailable.\n\
         Retry with backoff, honoring any retry-after response header.",
    ),
    (
        "Shutdown",
        "The APNs server that handled the request is shutting down.\n\
         The notification was not processed; retry against a fresh connection.",
    ),
];

#[derive(Debug, Deserialize)]
struct ErrorBody {
    reason: Option<String>,
}

/// Outcome of one delivery attempt: the provider's verdict, already
/// classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    /// HTTP status code returned by APNs.
    pub status: u16,
    /// `true` iff the status is exactly 200.
    pub success: bool,
    /// Provider-assigned delivery identifier from the `apns-id` header.
    pub apns_id: Option<String>,
    /// Reason code extracted from the error body, if any.
    pub reason: Option<String>,
    /// Raw response body, if non-empty.
    pub body: Option<String>,
}

impl DeliveryOutcome {
    /// Remediation advice for the failure reason. Unknown or absent reasons
    /// have none; the raw reason and status are still available.
    pub fn explanation(&self) -> Option<&'static str> {
        explanation_for(self.reason.as_deref()?)
    }

    /// Whether the failure reason is conventionally retryable by the
    /// caller. Successful outcomes and permanent input problems are not.
    pub fn is_retryable(&self) -> bool {
        self.reason
            .as_deref()
            .is_some_and(|reason| RETRYABLE_REASONS.contains(&reason))
    }
}

/// Looks up the remediation text for a known reason code.
pub fn explanation_for(reason: &str) -> Option<&'static str> {
    REASON_EXPLANATIONS
        .iter()
        .find(|(known, _)| *known == reason)
        .map(|(_, explanation)| *explanation)
}

/// Classifies a raw APNs response. Success iff the status is exactly 200;
/// on any other status the body is parsed for a `reason` field. A body
/// that fails to parse is not an error — the reason just stays empty.
pub fn interpret(status: u16, apns_id: Option<String>, body: Option<String>) -> DeliveryOutcome {
    let success = status == 200;
    let reason = if success {
        None
    } else {
        body.as_deref()
            .and_then(|body| serde_json::from_str::<ErrorBody>(body).ok())
            .and_then(|parsed| parsed.reason)
    };
    DeliveryOutcome {
        status,
        success,
        apns_id,
        reason,
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_200_is_success_regardless_of_body() {
        let outcome = interpret(200, None, Some(r#"{"reason":"BadDeviceToken"}"#.to_owned()));
        assert!(outcome.success);
        assert_eq!(outcome.reason, None);

        let outcome = interpret(200, Some("some-id".to_owned()), None);
        assert!(outcome.success);
        assert_eq!(outcome.apns_id.as_deref(), Some("some-id"));
    }

    #[test]
    fn other_2xx_statuses_are_failures() {
        let outcome = interpret(202, None, None);
        assert!(!outcome.success);
    }

    #[test]
    fn reason_is_extracted_from_error_body() {
        let outcome = interpret(400, None, Some(r#"{"reason":"BadDeviceToken"}"#.to_owned()));
        assert!(!outcome.success);
        assert_eq!(outcome.reason.as_deref(), Some("BadDeviceToken"));
        let explanation = outcome.explanation().expect("known reason");
        assert!(explanation.contains("invalidated"));
    }

    #[test]
    fn unparseable_body_leaves_reason_empty() {
        let outcome = interpret(500, None, Some("<html>bad gateway</html>".to_owned()));
        assert!(!outcome.success);
        assert_eq!(outcome.reason, None);
        assert_eq!(outcome.explanation(), None);
    }

    #[test]
    fn unknown_reason_has_no_explanation() {
        let outcome = interpret(400, None, Some(r#"{"reason":"SomethingNew"}"#.to_owned()));
        assert_eq!(outcome.reason.as_deref(), Some("SomethingNew"));
        assert_eq!(outcome.explanation(), None);
    }

    #[test]
    fn every_known_reason_has_a_nonempty_explanation() {
        assert_eq!(REASON_EXPLANATIONS.len(), 17);
        for (reason, explanation) in REASON_EXPLANATIONS {
            assert!(
                !explanation.trim().is_empty(),
                "missing explanation for {reason}"
            );
            assert_eq!(explanation_for(reason), Some(*explanation));
        }
    }

    #[test]
    fn retryable_reasons_follow_convention() {
        for reason in ["TooManyRequests", "InternalServerError", "ServiceUnavailable", "Shutdown"] {
            let outcome = interpret(503, None, Some(format!(r#"{{"reason":"{reason}"}}"#)));
            assert!(outcome.is_retryable(), "{reason} should be retryable");
        }
        let outcome = interpret(400, None, Some(r#"{"reason":"BadDeviceToken"}"#.to_owned()));
        assert!(!outcome.is_retryable());
    }

    #[test]
    fn classification_is_idempotent() {
        let classify = || interpret(410, None, Some(r#"{"reason":"Unregistered"}"#.to_owned()));
        assert_eq!(classify(), classify());
    }
}
