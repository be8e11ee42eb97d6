// SPDX-FileCopyrightText: 2024 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Provider authentication tokens for APNs.
//!
//! A token is the compact three-segment form `header.claims.signature`:
//! base64url (no padding) over the JSON header `{"alg":"ES256","kid":…}`
//! and claims `{"iss":…,"iat":…}`, signed with ECDSA P-256/SHA-256. APNs
//! enforces the validity window server-side; the client's only obligation
//! is to stamp the current time.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use p256::ecdsa::{Signature, SigningKey, signature::Signer};
use serde::Serialize;

use crate::error::PushError;

#[derive(Debug, Serialize)]
struct Header<'a> {
    alg: &'static str,
    kid: &'a str,
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    iat: u64,
}

/// Generates a signed provider token for the given credentials, stamped
/// with the current Unix time.
pub fn generate(
    team_id: &str,
    key_id: &str,
    signing_key: &SigningKey,
) -> Result<String, PushError> {
    let issued_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|error| PushError::SigningFailed(format!("clock error: {error}")))?
        .as_secs();
    generate_at(team_id, key_id, signing_key, issued_at)
}

/// Token generation with an explicit issued-at timestamp. Split out so
/// tests can sign deterministically.
pub(crate) fn generate_at(
    team_id: &str,
    key_id: &str,
    signing_key: &SigningKey,
    issued_at: u64,
) -> Result<String, PushError> {
    let header = serde_json::to_vec(&Header {
        alg: "ES256",
        kid: key_id,
    })
    .map_err(|error| PushError::SigningFailed(format!("header serialization: {error}")))?;
    let claims = serde_json::to_vec(&Claims {
        iss: team_id,
        iat: issued_at,
    })
    .map_err(|error| PushError::SigningFailed(format!("claims serialization: {error}")))?;

    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header),
        URL_SAFE_NO_PAD.encode(claims)
    );

    // Raw 64-byte r‖s signature, which is exactly the JOSE ES256 form.
    let signature: Signature = signing_key
        .try_sign(signing_input.as_bytes())
        .map_err(|error| PushError::SigningFailed(error.to_string()))?;

    Ok(format!(
        "{signing_input}.{}",
        URL_SAFE_NO_PAD.encode(signature.to_bytes())
    ))
}
