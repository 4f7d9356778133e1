//! Token Codec
//!
//! Stable binary format for [`RefreshableToken`].
//!
//! Layout (big-endian):
//!
//! ```text
//! u8  version (1)
//! u32 len | utf8  token_type
//! u32 len | utf8  access_token
//! u32 len | utf8  refresh_token
//! i64             expires, unix seconds
//! u32             expires, subsecond nanoseconds
//! ```

use base64::Engine;
use bytes::{Buf, BufMut, BytesMut};
use chrono::{DateTime, Utc};

use crate::error::SerializationError;
use crate::types::RefreshableToken;

const FORMAT_VERSION: u8 = 1;

/// Encode a token into its binary form.
pub fn encode(token: &RefreshableToken) -> Vec<u8> {
    let fields = [
        token.token_type(),
        token.access_token(),
        token.refresh_token(),
    ];
    let capacity = 1 + fields.iter().map(|f| 4 + f.len()).sum::<usize>() + 12;

    let mut buf = BytesMut::with_capacity(capacity);
    buf.put_u8(FORMAT_VERSION);
    for field in fields {
        buf.put_u32(field.len() as u32);
        buf.put_slice(field.as_bytes());
    }

    let expires = token.expires();
    buf.put_i64(expires.timestamp());
    buf.put_u32(expires.timestamp_subsec_nanos());

    buf.to_vec()
}

/// Encode a token as standard padded base64.
pub fn encode_base64(token: &RefreshableToken) -> String {
    base64::engine::general_purpose::STANDARD.encode(encode(token))
}

/// Decode a token from its binary form.
pub fn decode(mut data: &[u8]) -> Result<RefreshableToken, SerializationError> {
    ensure_remaining(data, 1)?;
    let version = data.get_u8();
    if version != FORMAT_VERSION {
        return Err(SerializationError::UnsupportedVersion { version });
    }

    let token_type = read_string(&mut data, "token_type")?;
    let access_token = read_string(&mut data, "access_token")?;
    let refresh_token = read_string(&mut data, "refresh_token")?;

    ensure_remaining(data, 12)?;
    let seconds = data.get_i64();
    let nanos = data.get_u32();
    let expires = DateTime::<Utc>::from_timestamp(seconds, nanos).ok_or_else(|| {
        SerializationError::InvalidField {
            field: "expires",
            message: format!("{}s {}ns is out of range", seconds, nanos),
        }
    })?;

    if data.has_remaining() {
        return Err(SerializationError::TrailingBytes {
            count: data.remaining(),
        });
    }

    RefreshableToken::new(token_type, access_token, refresh_token, expires).map_err(|e| {
        SerializationError::InvalidField {
            field: e.parameter(),
            message: e.to_string(),
        }
    })
}

/// Decode a token from standard padded base64.
pub fn decode_base64(value: &str) -> Result<RefreshableToken, SerializationError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(value.trim())
        .map_err(|e| SerializationError::InvalidBase64 {
            message: e.to_string(),
        })?;
    decode(&bytes)
}

fn ensure_remaining(data: &[u8], needed: usize) -> Result<(), SerializationError> {
    if data.remaining() < needed {
        return Err(SerializationError::Truncated {
            needed: needed - data.remaining(),
        });
    }
    Ok(())
}

fn read_string(data: &mut &[u8], field: &'static str) -> Result<String, SerializationError> {
    ensure_remaining(data, 4)?;
    let len = data.get_u32() as usize;
    ensure_remaining(data, len)?;

    let value = std::str::from_utf8(&data[..len])
        .map_err(|_| SerializationError::InvalidUtf8 { field })?
        .to_string();
    data.advance(len);
    Ok(value)
}
