// SPDX-FileCopyrightText: 2024 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Token-based delivery client for Apple's Push Notification service
//! (APNs) HTTP/2 provider API.
//!
//! One call to [`ApnsClient::send`] loads the `.p8` key container, signs a
//! fresh ES256 provider token, performs a single `POST /3/device/{token}`
//! and classifies the response: either the push was accepted (status 200)
//! or the provider returned one of a fixed vocabulary of reason codes, for
//! which [`DeliveryOutcome::explanation`] carries remediation advice.
//!
//! Retry policy, timeouts, batching and device-token bookkeeping are
//! deliberately left to the caller.

pub mod client;
pub mod error;
pub mod key;
pub mod response;
pub mod settings;
pub mod token;

pub use client::{ApnsClient, Environment, HttpClient, Notification, normalize_device_token};
pub use error::PushError;
pub use response::DeliveryOutcome;
pub use settings::{ApnsSettings, Credentials};
