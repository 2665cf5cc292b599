use argon2::password_hash::{
    rand_core::OsRng, Error as PasswordHashError, PasswordHash, PasswordHasher,
    PasswordVerifier, SaltString,
};
use argon2::Argon2;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

// =============================================================================
// Passwords
// =============================================================================

/// Hash a password into an Argon2id PHC string with a fresh salt
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::PasswordHash(e.to_string()))
}

/// Check a candidate password against a stored PHC string
pub fn verify_password(candidate: &str, stored_hash: &str) -> Result<bool> {
    let parsed =
        PasswordHash::new(stored_hash).map_err(|e| AppError::PasswordHash(e.to_string()))?;
    match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(PasswordHashError::Password) => Ok(false),
        Err(e) => Err(AppError::PasswordHash(e.to_string())),
    }
}

// =============================================================================
// Session Tokens
// =============================================================================

/// Compute the hex HMAC-SHA256 of `data`
pub fn sign(data: &str, secret: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AppError::PasswordHash("invalid signing key".to_string()))?;
    mac.update(data.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Build the bearer token handed to clients: `<session_id>.<signature>`
pub fn issue_session_token(session_id: &str, secret: &str) -> Result<String> {
    Ok(format!("{}.{}", session_id, sign(session_id, secret)?))
}

/// Split a bearer token and return its session id if the signature holds
///
/// Forged or truncated tokens are rejected here, before any database lookup.
pub fn open_session_token(token: &str, secret: &str) -> Option<String> {
    let (session_id, signature) = token.rsplit_once('.')?;
    if session_id.is_empty() || !verify_hmac(session_id, signature, secret) {
        return None;
    }
    Some(session_id.to_string())
}

/// Verify HMAC-SHA256 signature
pub fn verify_hmac(data: &str, signature: &str, secret: &str) -> bool {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            tracing::error!("Failed to create HMAC instance");
            return false;
        }
    };

    mac.update(data.as_bytes());

    let sig_bytes = match hex::decode(signature) {
        Ok(bytes) => bytes,
        Err(_) => {
            tracing::warn!("Invalid hex signature format");
            return false;
        }
    };

    // Constant-time comparison
    mac.verify_slice(&sig_bytes).is_ok()
}

// =============================================================================
// Base64 (image uploads)
// =============================================================================

/// Standard base64 (with + and /), used to build upload fixtures
#[cfg(test)]
pub(crate) fn base64_encode(data: &[u8]) -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut result = String::with_capacity(data.len().div_ceil(3) * 4);

    for chunk in data.chunks(3) {
        let b0 = chunk[0] as usize;
        let b1 = chunk.get(1).copied().unwrap_or(0) as usize;
        let b2 = chunk.get(2).copied().unwrap_or(0) as usize;

        result.push(ALPHABET[b0 >> 2] as char);
        result.push(ALPHABET[((b0 & 0x03) << 4) | (b1 >> 4)] as char);

        if chunk.len() > 1 {
            result.push(ALPHABET[((b1 & 0x0f) << 2) | (b2 >> 6)] as char);
        } else {
            result.push('=');
        }

        if chunk.len() > 2 {
            result.push(ALPHABET[b2 & 0x3f] as char);
        } else {
            result.push('=');
        }
    }

    result
}

/// Simple base64 decoder
///
/// Accepts standard and URL-safe alphabets, optional padding, embedded
/// whitespace, and a leading `data:<mime>;base64,` prefix.
pub fn base64_decode(input: &str) -> std::result::Result<Vec<u8>, String> {
    let input = input.trim();
    let input = match input.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => input,
    };

    let clean: String = input
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            c => c,
        })
        .collect();

    let padded = match clean.len() % 4 {
        2 => format!("{}==", clean),
        3 => format!("{}=", clean),
        1 => return Err("Invalid base64 length".to_string()),
        _ => clean,
    };

    let mut result = Vec::with_capacity(padded.len() * 3 / 4);
    let chars: Vec<char> = padded.chars().collect();
    let chunk_count = chars.len() / 4;

    for (index, chunk) in chars.chunks(4).enumerate() {
        // Padding only closes the final chunk, and never eats more than two
        let padding = chunk.iter().rev().take_while(|&&c| c == '=').count();
        if padding > 2
            || (padding > 0 && index + 1 != chunk_count)
            || chunk[..4 - padding].contains(&'=')
        {
            return Err("Misplaced base64 padding".to_string());
        }

        let values = chunk
            .iter()
            .map(|&c| decode_base64_char(c))
            .collect::<std::result::Result<Vec<u8>, String>>()?;

        result.push((values[0] << 2) | (values[1] >> 4));
        if padding < 2 {
            result.push((values[1] << 4) | (values[2] >> 2));
        }
        if padding < 1 {
            result.push((values[2] << 6) | values[3]);
        }
    }

    Ok(result)
}

fn decode_base64_char(c: char) -> std::result::Result<u8, String> {
    match c {
        'A'..='Z' => Ok(c as u8 - b'A'),
        'a'..='z' => Ok(c as u8 - b'a' + 26),
        '0'..='9' => Ok(c as u8 - b'0' + 52),
        '+' => Ok(62),
        '/' => Ok(63),
        '=' => Ok(0),
        _ => Err(format!("Invalid base64 character: {}", c)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key";

    // =========================================================================
    // Password Tests
    // =========================================================================

    #[test]
    fn test_password_round_trip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse battery", &hash).unwrap());
        assert!(!verify_password("wrong horse", &hash).unwrap());
    }

    #[test]
    fn test_password_hashes_are_salted() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_password_rejects_garbage_hash() {
        assert!(verify_password("anything", "not-a-phc-string").is_err());
    }

    // =========================================================================
    // Token Tests
    // =========================================================================

    #[test]
    fn test_session_token_round_trip() {
        let token = issue_session_token("session-123", SECRET).unwrap();
        assert_eq!(
            open_session_token(&token, SECRET).as_deref(),
            Some("session-123")
        );
    }

    #[test]
    fn test_session_token_wrong_secret() {
        let token = issue_session_token("session-123", SECRET).unwrap();
        assert!(open_session_token(&token, "other-secret").is_none());
    }

    #[test]
    fn test_session_token_tampered() {
        let token = issue_session_token("session-123", SECRET).unwrap();
        let forged = token.replacen("session-123", "session-124", 1);
        assert!(open_session_token(&forged, SECRET).is_none());
        assert!(open_session_token("no-signature", SECRET).is_none());
        assert!(open_session_token(".abcd", SECRET).is_none());
    }

    #[test]
    fn test_verify_hmac_invalid_signature() {
        assert!(!verify_hmac("test data", &"0".repeat(64), SECRET));
        assert!(!verify_hmac("test data", "not-hex", SECRET));
    }

    // =========================================================================
    // Base64 Tests
    // =========================================================================

    #[test]
    fn test_base64_decode_simple() {
        assert_eq!(base64_decode("SGVsbG8=").unwrap(), b"Hello");
        assert_eq!(base64_decode("SGVsbG8").unwrap(), b"Hello");
    }

    #[test]
    fn test_base64_decode_data_url() {
        let decoded = base64_decode("data:image/png;base64,SGVsbG8=").unwrap();
        assert_eq!(decoded, b"Hello");
    }

    #[test]
    fn test_base64_decode_invalid() {
        assert!(base64_decode("SGVs@G8!").is_err());
        assert!(base64_decode("SGVsb").is_err());
    }

    #[test]
    fn test_base64_decode_rejects_misplaced_padding() {
        // Padding in the middle of the stream
        assert!(base64_decode("QQ==QUFB").is_err());
        // Nothing but padding must not decode to a zero byte
        assert!(base64_decode("====").is_err());
        assert!(base64_decode("==").is_err());
        assert!(base64_decode("QUF=QUFB").is_err());
        assert!(base64_decode("Q===").is_err());
        assert!(base64_decode("Q=Q=").is_err());
    }

    #[test]
    fn test_base64_decode_trailing_padding() {
        assert_eq!(base64_decode("QQ==").unwrap(), b"A");
        assert_eq!(base64_decode("QUE=").unwrap(), b"AA");
        assert_eq!(base64_decode("QUFBQQ==").unwrap(), b"AAAA");
    }

    #[test]
    fn test_base64_encode_matches_decoder() {
        let bytes: Vec<u8> = (0..=255u8).collect();
        assert_eq!(base64_decode(&base64_encode(&bytes)).unwrap(), bytes);
        assert_eq!(base64_encode(b"Hello"), "SGVsbG8=");
    }
}
