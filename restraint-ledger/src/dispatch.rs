//! Invocation dispatch
//!
//! Callers address the ledger with a function name and positional string
//! arguments. [`Operation`] is the static table of supported functions;
//! [`invoke`] checks arity, trims arguments, runs the operation and encodes its
//! payload. [`Response`] is the envelope handed back to transports.
//!
//! | Function | Arguments | Payload |
//! |---|---|---|
//! | `register` | username, extras | none |
//! | `getUserInfo` | username | stored info record, byte for byte |
//! | `getBalance` | username | canonical decimal |
//! | `recharge` | username, amount | none |
//! | `withdraw` | username, amount | none |
//! | `setRestraint` | username_a, username_b, restraint | none |
//! | `getRestraintsOfUser` | username | `{"counterparty":"code",..}` |
//! | `getRestraintBetweenUsers` | username_a, username_b | code |
//! | `transfer` | username_a, username_b, amount | none |

use crate::{store::KvStore, Error, Ledger, Result};
use serde::Serialize;
use std::fmt;

/// Supported ledger functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Register an account
    Register,
    /// Read account metadata
    GetUserInfo,
    /// Read a balance
    GetBalance,
    /// Credit a balance
    Recharge,
    /// Debit a balance
    Withdraw,
    /// Set a restraint
    SetRestraint,
    /// List restraints of an account
    GetRestraintsOfUser,
    /// Read the restraint of a pair
    GetRestraintBetweenUsers,
    /// Restrained transfer
    Transfer,
}

impl Operation {
    /// Every operation
    pub const ALL: [Operation; 9] = [
        Operation::Register,
        Operation::GetUserInfo,
        Operation::GetBalance,
        Operation::Recharge,
        Operation::Withdraw,
        Operation::SetRestraint,
        Operation::GetRestraintsOfUser,
        Operation::GetRestraintBetweenUsers,
        Operation::Transfer,
    ];

    /// Look up an operation by function name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    /// Function name
    pub fn name(self) -> &'static str {
        match self {
            Operation::Register => "register",
            Operation::GetUserInfo => "getUserInfo",
            Operation::GetBalance => "getBalance",
            Operation::Recharge => "recharge",
            Operation::Withdraw => "withdraw",
            Operation::SetRestraint => "setRestraint",
            Operation::GetRestraintsOfUser => "getRestraintsOfUser",
            Operation::GetRestraintBetweenUsers => "getRestraintBetweenUsers",
            Operation::Transfer => "transfer",
        }
    }

    /// Positional parameter names
    pub fn params(self) -> &'static [&'static str] {
        match self {
            Operation::Register => &["username", "extras"],
            Operation::GetUserInfo | Operation::GetBalance | Operation::GetRestraintsOfUser => {
                &["username"]
            }
            Operation::Recharge | Operation::Withdraw => &["username", "amount"],
            Operation::SetRestraint => &["username_a", "username_b", "restraint_type"],
            Operation::GetRestraintBetweenUsers => &["username_a", "username_b"],
            Operation::Transfer => &["username_a", "username_b", "amount"],
        }
    }

    /// Usage string reported on arity errors
    pub fn usage(self) -> String {
        let params = self
            .params()
            .iter()
            .map(|p| format!("'{}'", p))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{{fcn: '{}', args: [{}]}}", self.name(), params)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Invoke `function` with positional `args`, returning the encoded payload
pub fn invoke<S, A>(ledger: &Ledger<S>, function: &str, args: &[A]) -> Result<Option<Vec<u8>>>
where
    S: KvStore,
    A: AsRef<str>,
{
    let operation = Operation::from_name(function).ok_or_else(|| {
        Error::InvalidArgument(format!("unknown chaincode function {}", function))
    })?;

    if args.len() != operation.params().len() {
        return Err(Error::InvalidArgument(format!(
            "parameter error. usage: \"{}\"",
            operation.usage()
        )));
    }

    // `extras` is the only argument kept verbatim
    let arg = |i: usize| trimmed(args, i);

    let payload = match operation {
        Operation::Register => {
            ledger.register(arg(0), args[1].as_ref())?;
            None
        }
        Operation::GetUserInfo => Some(ledger.get_user_info_raw(arg(0))?),
        Operation::GetBalance => Some(ledger.get_balance(arg(0))?.into_bytes()),
        Operation::Recharge => {
            ledger.recharge(arg(0), arg(1))?;
            None
        }
        Operation::Withdraw => {
            ledger.withdraw(arg(0), arg(1))?;
            None
        }
        Operation::SetRestraint => {
            ledger.set_restraint(arg(0), arg(1), arg(2))?;
            None
        }
        Operation::GetRestraintsOfUser => {
            Some(serde_json::to_vec(&ledger.get_restraints_of_user(arg(0))?)?)
        }
        Operation::GetRestraintBetweenUsers => {
            let restraint = ledger.get_restraint_between_users(arg(0), arg(1))?;
            Some(vec![restraint.code()])
        }
        Operation::Transfer => {
            ledger.transfer(arg(0), arg(1), arg(2))?;
            None
        }
    };

    Ok(payload)
}

fn trimmed<A: AsRef<str>>(args: &[A], index: usize) -> &str {
    args[index].as_ref().trim()
}

/// Response status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    /// Invocation succeeded
    Ok,
    /// Invocation failed, state unchanged
    Error,
}

/// Response envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Outcome
    pub status: Status,
    /// Payload of a successful invocation
    pub payload: Option<Vec<u8>>,
    /// Error message (empty on success)
    pub message: String,
    /// Error kind label (see [`Error::kind`])
    pub error_kind: Option<&'static str>,
}

impl Response {
    /// Successful response
    pub fn success(payload: Option<Vec<u8>>) -> Self {
        Self {
            status: Status::Ok,
            payload,
            message: String::new(),
            error_kind: None,
        }
    }

    /// Failed response
    pub fn error(err: &Error) -> Self {
        Self {
            status: Status::Error,
            payload: None,
            message: err.to_string(),
            error_kind: Some(err.kind()),
        }
    }

    /// True on success
    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// Payload as UTF-8 text
    pub fn payload_str(&self) -> Option<&str> {
        self.payload
            .as_deref()
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
    }
}

impl From<Result<Option<Vec<u8>>>> for Response {
    fn from(result: Result<Option<Vec<u8>>>) -> Self {
        match result {
            Ok(payload) => Response::success(payload),
            Err(e) => Response::error(&e),
        }
    }
}

/// Invoke and wrap the outcome in a [`Response`]
pub fn dispatch<S, A>(ledger: &Ledger<S>, function: &str, args: &[A]) -> Response
where
    S: KvStore,
    A: AsRef<str>,
{
    tracing::debug!(function, args = args.len(), "Dispatching invocation");
    invoke(ledger, function, args).into()
}
