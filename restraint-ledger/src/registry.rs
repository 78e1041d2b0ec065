//! Account registry
//!
//! An account is two records: its info (`u_i:`) and its balance (`u_b:`).
//! Registration writes both; nothing ever updates the info record or removes
//! either one.

use crate::{
    decimal::Amount,
    keys::{account_balance_key, account_info_key},
    store::Transaction,
    Error, Result,
};
use serde::{Deserialize, Serialize};

/// Account metadata as stored.
///
/// Field order matters: it fixes the JSON layout to `{"extras":..,"name":..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Opaque caller-supplied blob, stored verbatim
    pub extras: String,
    /// Username
    pub name: String,
}

/// Register `username`, creating its info record and a zero balance
pub fn register(tx: &mut Transaction<'_>, username: &str, extras: &str) -> Result<()> {
    if username.is_empty() {
        return Err(Error::InvalidArgument("username should not be empty".to_string()));
    }

    let info_key = account_info_key(username)?;
    let balance_key = account_balance_key(username)?;

    // Either record on its own still blocks registration
    if tx.contains(&info_key)? || tx.contains(&balance_key)? {
        return Err(Error::AlreadyExists(format!(
            "username {} already registered",
            username
        )));
    }

    let info = AccountInfo {
        extras: extras.to_string(),
        name: username.to_string(),
    };

    tx.put(info_key, serde_json::to_vec(&info)?);
    tx.put(balance_key, Amount::ZERO.to_canonical().into_bytes());

    Ok(())
}

/// Raw info record of `username`, exactly as stored
pub fn get_info_raw(tx: &Transaction<'_>, username: &str) -> Result<Vec<u8>> {
    tx.get(&account_info_key(username)?)?
        .ok_or_else(|| Error::not_registered(username))
}

/// Info record of `username`
pub fn get_info(tx: &Transaction<'_>, username: &str) -> Result<AccountInfo> {
    let raw = get_info_raw(tx, username)?;
    serde_json::from_slice(&raw)
        .map_err(|e| Error::Store(format!("Failed to parse account info stored: {}", e)))
}

/// Canonical balance string of `username`
pub fn get_balance(tx: &Transaction<'_>, username: &str) -> Result<String> {
    let raw = tx
        .get(&account_balance_key(username)?)?
        .ok_or_else(|| Error::not_registered(username))?;
    String::from_utf8(raw)
        .map_err(|e| Error::Store(format!("Failed to parse balance stored: {}", e)))
}

/// True if `username` has an info record
pub fn exists(tx: &Transaction<'_>, username: &str) -> Result<bool> {
    tx.contains(&account_info_key(username)?)
}

/// Fail with `NotFound` unless `username` has an info record
pub fn ensure_registered(tx: &Transaction<'_>, username: &str) -> Result<()> {
    if exists(tx, username)? {
        Ok(())
    } else {
        Err(Error::not_registered(username))
    }
}

/// Balance of `username` as a decimal
pub(crate) fn load_balance(tx: &Transaction<'_>, username: &str) -> Result<Amount> {
    let raw = tx
        .get(&account_balance_key(username)?)?
        .ok_or_else(|| Error::not_registered(username))?;
    Amount::parse_stored(&raw)
}

/// Stage a new balance for `username`
pub(crate) fn store_balance(tx: &mut Transaction<'_>, username: &str, balance: Amount) -> Result<()> {
    tx.put(
        account_balance_key(username)?,
        balance.to_canonical().into_bytes(),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{KvStore, MemoryStore};

    fn registered(store: &MemoryStore, username: &str, extras: &str) {
        let mut tx = Transaction::new(store);
        register(&mut tx, username, extras).unwrap();
        tx.commit().unwrap();
    }

    #[test]
    fn test_register_creates_both_records() {
        let store = MemoryStore::new();
        registered(&store, "user_a", "company A");

        let tx = Transaction::new(&store);
        assert_eq!(get_balance(&tx, "user_a").unwrap(), "0");
        assert_eq!(
            get_info_raw(&tx, "user_a").unwrap(),
            br#"{"extras":"company A","name":"user_a"}"#.to_vec()
        );
        assert_eq!(
            get_info(&tx, "user_a").unwrap(),
            AccountInfo {
                extras: "company A".to_string(),
                name: "user_a".to_string(),
            }
        );
        assert!(exists(&tx, "user_a").unwrap());
    }

    #[test]
    fn test_register_twice_fails() {
        let store = MemoryStore::new();
        registered(&store, "user_a", "company A");
        let before = store.snapshot();

        let mut tx = Transaction::new(&store);
        let err = register(&mut tx, "user_a", "other").unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));
        assert!(tx.writes().is_empty());
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_orphan_balance_blocks_registration() {
        let store = MemoryStore::new();
        store
            .put(&account_balance_key("ghost").unwrap(), b"5")
            .unwrap();

        let mut tx = Transaction::new(&store);
        assert!(matches!(
            register(&mut tx, "ghost", ""),
            Err(Error::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_empty_username_rejected() {
        let store = MemoryStore::new();
        let mut tx = Transaction::new(&store);
        assert!(matches!(
            register(&mut tx, "", "test empty username"),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_unknown_account() {
        let store = MemoryStore::new();
        let tx = Transaction::new(&store);
        assert!(matches!(get_info(&tx, "user_b"), Err(Error::NotFound(_))));
        assert!(matches!(get_balance(&tx, "user_b"), Err(Error::NotFound(_))));
        assert!(matches!(ensure_registered(&tx, "user_b"), Err(Error::NotFound(_))));
        assert!(!exists(&tx, "user_b").unwrap());
    }

    #[test]
    fn test_extras_stored_verbatim() {
        let store = MemoryStore::new();
        registered(&store, "u", "  {\"nested\": \"json\"}  ");

        let tx = Transaction::new(&store);
        assert_eq!(get_info(&tx, "u").unwrap().extras, "  {\"nested\": \"json\"}  ");
    }
}
