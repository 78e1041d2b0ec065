//! Restraint manager
//!
//! Each restraint between `a` and `b` is materialized as two mirrored records,
//! `(a, b) = r` and `(b, a) = r.reverse()`. Resetting to forbidden removes both.
//! [`stage_pair`] is the only place that writes restraint records, so the two
//! halves are always staged together and land in the same commit.

use crate::{
    keys::{restraint_key, restraint_prefix, split_composite_key},
    registry::ensure_registered,
    restraint::Restraint,
    store::Transaction,
    Error, Result,
};
use std::collections::BTreeMap;

/// Set the restraint between `a` and `b`, as seen from `a`
pub fn set_restraint(tx: &mut Transaction<'_>, a: &str, b: &str, code: &str) -> Result<()> {
    if a == b {
        return Err(Error::InvalidArgument(
            "username_a and username_b must not be equal".to_string(),
        ));
    }

    let restraint = Restraint::parse(code).ok_or_else(|| {
        Error::InvalidArgument(format!(
            "transfer restraint type got {:?}, expected one of [0, 1, 2, 3], respectively \
             [forbid transfer, allow a to b, allow b to a, allow two-way]",
            code
        ))
    })?;

    ensure_registered(tx, a)?;
    ensure_registered(tx, b)?;

    stage_pair(tx, a, b, restraint)
}

/// Stage both halves of the `(a, b)` restraint
fn stage_pair(tx: &mut Transaction<'_>, a: &str, b: &str, restraint: Restraint) -> Result<()> {
    let ab = restraint_key(a, b)?;
    let ba = restraint_key(b, a)?;

    match restraint {
        Restraint::Forbidden => {
            tx.delete(ab);
            tx.delete(ba);
        }
        allowed => {
            tx.put(ab, vec![allowed.code()]);
            tx.put(ba, vec![allowed.reverse().code()]);
        }
    }

    Ok(())
}

/// Restraint stored for `(from, to)`, forbidden when absent.
///
/// Does not check registration; see [`get_restraint`].
pub(crate) fn lookup(tx: &Transaction<'_>, from: &str, to: &str) -> Result<Restraint> {
    match tx.get(&restraint_key(from, to)?)? {
        None => Ok(Restraint::Forbidden),
        Some(raw) => decode(&raw),
    }
}

/// Restraint between two registered accounts, as seen from `a`
pub fn get_restraint(tx: &Transaction<'_>, a: &str, b: &str) -> Result<Restraint> {
    ensure_registered(tx, a)?;
    ensure_registered(tx, b)?;
    lookup(tx, a, b)
}

/// Every materialized restraint of `username`, keyed by counterparty
pub fn restraints_of(tx: &Transaction<'_>, username: &str) -> Result<BTreeMap<String, Restraint>> {
    ensure_registered(tx, username)?;

    let mut restraints = BTreeMap::new();
    for (key, value) in tx.scan_prefix(&restraint_prefix(username)?)? {
        let (_, components) = split_composite_key(&key)?;
        let counterparty = match components.as_slice() {
            [_, counterparty] => counterparty.clone(),
            _ => {
                return Err(Error::Store(format!(
                    "Failed to parse restraint stored: {} key components",
                    components.len()
                )))
            }
        };
        restraints.insert(counterparty, decode(&value)?);
    }

    Ok(restraints)
}

fn decode(raw: &[u8]) -> Result<Restraint> {
    let restraint = match raw {
        [code] => Restraint::from_code(*code),
        _ => None,
    };
    restraint.ok_or_else(|| Error::Store(format!("Failed to parse restraint stored: {:?}", raw)))
}
