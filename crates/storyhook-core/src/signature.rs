//! `X-Hub-Signature` verification.
//!
//! GitHub signs each delivery with `sha1=<hex HMAC-SHA1(secret, body)>`. The
//! digest covers the raw body bytes exactly as received, so callers must hash
//! the same buffer they later decode.

use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

pub const SIGNATURE_HEADER: &str = "x-hub-signature";
pub const SIGNATURE_PREFIX: &str = "sha1=";

fn mac_over(secret: &[u8], body: &[u8]) -> HmacSha1 {
    let mut mac = HmacSha1::new_from_slice(secret).expect("HMAC accepts keys of any length");
    mac.update(body);
    mac
}

/// Compute the header value GitHub would send for `body` signed with `secret`.
pub fn signature_for(secret: &[u8], body: &[u8]) -> String {
    format!(
        "{SIGNATURE_PREFIX}{}",
        hex::encode(mac_over(secret, body).finalize().into_bytes())
    )
}

/// Check a header-supplied signature against the body.
///
/// A missing header never verifies. The header must be `sha1=` followed by
/// lowercase hex, the form GitHub sends; the digest itself is compared in
/// constant time by the `hmac` crate.
pub fn verify(secret: &[u8], body: &[u8], header: Option<&str>) -> bool {
    let Some(digest_hex) = header.and_then(|h| h.strip_prefix(SIGNATURE_PREFIX)) else {
        return false;
    };
    if digest_hex.bytes().any(|b| b.is_ascii_uppercase()) {
        return false;
    }
    let Ok(digest) = hex::decode(digest_hex) else {
        return false;
    };
    mac_over(secret, body).verify_slice(&digest).is_ok()
}
