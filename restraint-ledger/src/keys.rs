//! Composite key encoding
//!
//! All ledger state lives in one flat byte-keyed space. Keys are built as
//!
//! ```text
//! 0x00 | namespace | 0x00 | component_1 | 0x00 | ... | component_n | 0x00
//! ```
//!
//! with three namespaces:
//!
//! - `u_i:` - account info, components `[username]`
//! - `u_b:` - account balance, components `[username]`
//! - `u_r:` - restraint, components `[from, to]`
//!
//! Components may not contain `U+0000` (the separator) or `U+10FFFF`, so no
//! two distinct component lists encode to the same key and every key of one
//! namespace sorts inside that namespace's prefix.

use crate::{Error, Result};

/// Namespace of account info records
pub const NS_ACCOUNT_INFO: &str = "u_i:";
/// Namespace of account balance records
pub const NS_ACCOUNT_BALANCE: &str = "u_b:";
/// Namespace of restraint records
pub const NS_RESTRAINT: &str = "u_r:";

const SEPARATOR: u8 = 0x00;
const MAX_UNICODE_RUNE: char = '\u{10FFFF}';

/// Build a composite key from a namespace and ordered components
pub fn composite_key(namespace: &str, components: &[&str]) -> Result<Vec<u8>> {
    validate_component(namespace)?;

    let capacity = 2 + namespace.len() + components.iter().map(|c| c.len() + 1).sum::<usize>();
    let mut key = Vec::with_capacity(capacity);
    key.push(SEPARATOR);
    key.extend_from_slice(namespace.as_bytes());
    key.push(SEPARATOR);

    for component in components {
        validate_component(component)?;
        key.extend_from_slice(component.as_bytes());
        key.push(SEPARATOR);
    }

    Ok(key)
}

/// Split a composite key back into its namespace and components
pub fn split_composite_key(key: &[u8]) -> Result<(String, Vec<String>)> {
    let body = match key {
        [SEPARATOR, body @ .., SEPARATOR] => body,
        _ => {
            return Err(Error::Store(format!(
                "{:?} is not a composite key",
                String::from_utf8_lossy(key)
            )))
        }
    };

    let mut parts = body.split(|b| *b == SEPARATOR).map(|part| {
        String::from_utf8(part.to_vec())
            .map_err(|e| Error::Store(format!("Composite key is not UTF-8: {}", e)))
    });

    let namespace = parts
        .next()
        .ok_or_else(|| Error::Store("Composite key without namespace".to_string()))??;
    let components = parts.collect::<Result<Vec<_>>>()?;

    Ok((namespace, components))
}

/// Key of the account info record
pub fn account_info_key(username: &str) -> Result<Vec<u8>> {
    composite_key(NS_ACCOUNT_INFO, &[username])
}

/// Key of the account balance record
pub fn account_balance_key(username: &str) -> Result<Vec<u8>> {
    composite_key(NS_ACCOUNT_BALANCE, &[username])
}

/// Key of the directed restraint record `from → to`
pub fn restraint_key(from: &str, to: &str) -> Result<Vec<u8>> {
    composite_key(NS_RESTRAINT, &[from, to])
}

/// Scan prefix covering every restraint record whose first party is `from`
pub fn restraint_prefix(from: &str) -> Result<Vec<u8>> {
    composite_key(NS_RESTRAINT, &[from])
}

fn validate_component(component: &str) -> Result<()> {
    if let Some(bad) = component
        .chars()
        .find(|c| *c == '\u{0}' || *c == MAX_UNICODE_RUNE)
    {
        return Err(Error::Store(format!(
            "key component {:?} contains reserved character U+{:04X}",
            component, bad as u32
        )));
    }
    Ok(())
}
