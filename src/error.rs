// SPDX-FileCopyrightText: 2024 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use thiserror::Error;

/// Error sending a push notification.
///
/// Local/input errors (`InvalidKey`, `InvalidPayload`, `InvalidDeviceToken`)
/// are always detected before any network I/O. A non-200 response from the
/// provider is not an error; it is a [`DeliveryOutcome`] with
/// `success == false` carrying the provider's reason code.
///
/// [`DeliveryOutcome`]: crate::response::DeliveryOutcome
#[derive(Error, Debug)]
pub enum PushError {
    /// The private key container could not be read, decoded or recognized.
    /// The diagnostic never contains key material.
    #[error("invalid private key: {0}")]
    InvalidKey(String),
    /// The payload is not well-formed JSON.
    #[error("payload is not valid JSON: {0}")]
    InvalidPayload(String),
    /// The device token is empty or otherwise unusable.
    #[error("invalid device token: {0}")]
    InvalidDeviceToken(String),
    /// The cryptographic primitive rejected valid-looking input.
    #[error("signing failed: {0}")]
    SigningFailed(String),
    /// Transport-level failure; no response was obtained. Retrying with
    /// backoff is a caller concern.
    #[error("network error: {0}")]
    NetworkError(String),
}
