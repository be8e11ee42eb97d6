// SPDX-FileCopyrightText: 2024 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Delivery of a single push notification over the APNs provider API.

use reqwest::{
    ClientBuilder,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use tracing::{debug, warn};

use crate::{
    error::PushError,
    key, response,
    response::DeliveryOutcome,
    settings::Credentials,
    token,
};

pub type HttpClient = reqwest::Client;

/// The two APNs hosts. Device tokens and provider tokens are
/// environment-specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Sandbox,
}

impl Environment {
    pub fn base_url(&self) -> &'static str {
        match self {
            Environment::Production => "https://api.push.apple.com",
            Environment::Sandbox => "https://api.development.push.apple.com",
        }
    }
}

/// One notification to deliver: a normalized device token, the app's
/// bundle identifier as topic, and the raw JSON payload.
#[derive(Debug, Clone)]
pub struct Notification {
    pub device_token: String,
    pub topic: String,
    pub payload: String,
}

/// Strips separators, whitespace and angle brackets from a raw device
/// token (as pasted from Xcode or a debug log) and lowercases it.
///
/// Fails with [`PushError::InvalidDeviceToken`] if the result is not
/// exactly 64 hex characters.
pub fn normalize_device_token(raw: &str) -> Result<String, PushError> {
    let normalized: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '<' | '>' | '-' | ':'))
        .collect::<String>()
        .to_lowercase();
    if normalized.len() != 64 || !normalized.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(PushError::InvalidDeviceToken(format!(
            "expected 64 hex characters, got {} after normalization",
            normalized.len()
        )));
    }
    Ok(normalized)
}

/// Client for the APNs HTTP/2 provider API.
///
/// Each [`send`](ApnsClient::send) is one independent unit of work: one
/// key-load, one token signature, one request, one classification. No
/// token, key or connection state is retained across calls, so a single
/// client may be shared freely between concurrent sends.
///
/// The client imposes no timeout of its own; callers bound the call either
/// by building the [`HttpClient`] with one ([`with_http_client`]) or by
/// wrapping [`send`] in `tokio::time::timeout`.
///
/// [`with_http_client`]: ApnsClient::with_http_client
/// [`send`]: ApnsClient::send
#[derive(Debug, Clone)]
pub struct ApnsClient {
    client: HttpClient,
    base_url: String,
}

impl ApnsClient {
    /// Creates a client for the given environment with a default HTTP
    /// client.
    pub fn new(environment: Environment) -> Result<Self, PushError> {
        let client = ClientBuilder::new()
            .user_agent("ApnsPush/0.1")
            .build()
            .map_err(|error| PushError::NetworkError(error.to_string()))?;
        Ok(Self::with_http_client(client, environment.base_url()))
    }

    /// Creates a client from an existing HTTP client and base URL. This is
    /// also the seam tests use to point the client at a mock server.
    pub fn with_http_client(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Delivers one notification.
    ///
    /// Local problems (unreadable key, malformed payload, empty device
    /// token) fail before any network I/O. A response from APNs, whatever
    /// its status, is returned as a classified [`DeliveryOutcome`]; only
    /// transport failures surface as [`PushError::NetworkError`].
    pub async fn send(
        &self,
        credentials: &Credentials,
        notification: &Notification,
    ) -> Result<DeliveryOutcome, PushError> {
        let signing_key = key::signing_key_from_pem(&credentials.private_key)?;

        serde_json::from_str::<serde_json::Value>(&notification.payload)
            .map_err(|error| PushError::InvalidPayload(error.to_string()))?;

        if notification.device_token.is_empty() {
            return Err(PushError::InvalidDeviceToken(
                "device token is empty".to_owned(),
            ));
        }

        let provider_token =
            token::generate(&credentials.team_id, &credentials.key_id, &signing_key)?;

        let url = format!("{}/3/device/{}", self.base_url, notification.device_token);
        debug!(
            device_token = %notification.device_token,
            topic = %notification.topic,
            "sending push notification"
        );

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, format!("bearer {provider_token}"))
            .header("apns-topic", &notification.topic)
            .body(notification.payload.clone())
            .send()
            .await
            .map_err(|error| PushError::NetworkError(error.to_string()))?;

        let status = response.status().as_u16();
        let apns_id = response
            .headers()
            .get("apns-id")
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response
            .text()
            .await
            .map_err(|error| {
                PushError::NetworkError(format!("failed to read response body: {error}"))
            })?;
        let body = Some(body).filter(|body| !body.is_empty());

        let outcome = response::interpret(status, apns_id, body);
        if !outcome.success {
            warn!(
                status = outcome.status,
                reason = outcome.reason.as_deref().unwrap_or(""),
                "push notification rejected"
            );
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environments_map_to_the_two_apns_hosts() {
        assert_eq!(
            Environment::Production.base_url(),
            "https://api.push.apple.com"
        );
        assert_eq!(
            Environment::Sandbox.base_url(),
            "https://api.development.push.apple.com"
        );
    }

    #[test]
    fn device_tokens_are_normalized_to_lowercase_hex() {
        let raw = "<740F4707 BEBCF74F 9B7C25D4 8E335894 5F6AA01D A5DDB387 462C7EAF 61BB78AD>";
        let normalized = normalize_device_token(raw).expect("normalization");
        assert_eq!(
            normalized,
            "740f4707bebcf74f9b7c25d48e3358945f6aa01da5ddb387462c7eaf61bb78ad"
        );
    }

    #[test]
    fn short_or_non_hex_tokens_are_rejected() {
        assert!(matches!(
            normalize_device_token("abc123"),
            Err(PushError::InvalidDeviceToken(_))
        ));
        assert!(matches!(
            normalize_device_token(&"zz".repeat(32)),
            Err(PushError::InvalidDeviceToken(_))
        ));
        assert!(matches!(
            normalize_device_token(""),
            Err(PushError::InvalidDeviceToken(_))
        ));
    }
}
