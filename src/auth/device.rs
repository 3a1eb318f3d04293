//! Device binding cookie signing and verification.
//!
//! The device id is an opaque client-supplied string. Login stores it in a
//! companion cookie as `{device_id}.{signature}`, HMAC-SHA256 keyed by the
//! global pepper, so a client cannot tamper with the binding. Refresh requires
//! the `X-Device-Id` header, the cookie device id, and the signature to all
//! agree.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::errors::Error;

type HmacSha256 = Hmac<Sha256>;

/// Sign a device id for the `did` cookie: `{device_id}.{hex signature}`.
pub fn sign_device_id(device_id: &str, pepper: &str) -> Result<String, Error> {
    let mut mac = HmacSha256::new_from_slice(pepper.as_bytes()).map_err(|e| Error::Internal {
        operation: format!("create device id signer: {e}"),
    })?;
    mac.update(device_id.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    Ok(format!("{device_id}.{signature}"))
}

/// Verify a signed device cookie value and extract the device id.
///
/// Returns `None` when the value is malformed or the signature does not
/// verify; callers collapse both into the same authentication failure.
pub fn verify_device_cookie(value: &str, pepper: &str) -> Option<String> {
    // Device ids may themselves contain dots; the signature never does.
    let (device_id, signature_hex) = value.rsplit_once('.')?;
    let signature = hex::decode(signature_hex).ok()?;

    let mut mac = HmacSha256::new_from_slice(pepper.as_bytes()).ok()?;
    mac.update(device_id.as_bytes());
    mac.verify_slice(&signature).ok()?;

    Some(device_id.to_string())
}
