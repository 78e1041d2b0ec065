//! Balance mutations: recharge, withdraw and restrained transfer
//!
//! Every function validates completely before staging a write, and a transfer
//! stages both balances in the same transaction.

use crate::{
    config::TransferConfig,
    decimal::Amount,
    registry::{load_balance, store_balance},
    restraint::Direction,
    restraints::lookup,
    store::Transaction,
    Error, Result,
};

/// Move `amount` from `from` to `to`, if the restraint between them allows it
pub fn transfer(
    tx: &mut Transaction<'_>,
    from: &str,
    to: &str,
    amount: &str,
    policy: &TransferConfig,
) -> Result<()> {
    if from == to {
        return Err(Error::InvalidArgument(
            "username_a and username_b must not be equal".to_string(),
        ));
    }

    let from_balance = load_balance(tx, from)?;
    let to_balance = load_balance(tx, to)?;

    let restraint = lookup(tx, from, to)?;
    if !restraint.allows(Direction::Forward) {
        return Err(Error::Forbidden(format!(
            "transfer from {} to {} is forbidden",
            from, to
        )));
    }

    let amount = Amount::parse(amount)?;
    if policy.reject_non_positive_amounts && !amount.is_positive() {
        return Err(Error::InvalidArgument(format!(
            "invalid transfer amount {}, expecting a number greater than 0",
            amount
        )));
    }

    if from_balance < amount {
        return Err(Error::InsufficientFunds(format!(
            "failed transfer, balance of {} is {}, needs {}",
            from, from_balance, amount
        )));
    }

    let new_from = from_balance.checked_sub(amount)?;
    let new_to = to_balance.checked_add(amount)?;

    // A negative amount debits the recipient, which must still cover it
    if new_to < Amount::ZERO {
        return Err(Error::InsufficientFunds(format!(
            "failed transfer, balance of {} is {}, needs {}",
            to, to_balance, amount
        )));
    }

    store_balance(tx, from, new_from)?;
    store_balance(tx, to, new_to)?;

    Ok(())
}

/// Credit `amount` to `username`
pub fn recharge(tx: &mut Transaction<'_>, username: &str, amount: &str) -> Result<()> {
    let balance = load_balance(tx, username)?;
    let amount = positive_amount(amount, "recharge")?;

    store_balance(tx, username, balance.checked_add(amount)?)
}

/// Debit `amount` from `username`
pub fn withdraw(tx: &mut Transaction<'_>, username: &str, amount: &str) -> Result<()> {
    let balance = load_balance(tx, username)?;
    let amount = positive_amount(amount, "withdraw")?;

    if balance < amount {
        return Err(Error::InsufficientFunds(format!(
            "failed withdraw, balance of {} is {}, needs {}",
            username, balance, amount
        )));
    }

    store_balance(tx, username, balance.checked_sub(amount)?)
}

fn positive_amount(input: &str, operation: &str) -> Result<Amount> {
    let amount = Amount::parse(input)?;
    if !amount.is_positive() {
        return Err(Error::InvalidArgument(format!(
            "invalid {} amount {}, expecting a number greater than 0",
            operation, amount
        )));
    }
    Ok(amount)
}
