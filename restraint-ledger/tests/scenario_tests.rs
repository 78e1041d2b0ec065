//! End-to-end scenario through the dispatcher on a RocksDB-backed ledger
//!
//! Replays a full account lifecycle: registration, queries, recharge and
//! withdraw, restraint changes from both sides, and restrained transfers.

use restraint_ledger::{dispatch, Config, Ledger, Response};
use tempfile::TempDir;

struct Harness {
    ledger: Ledger,
    _temp: TempDir,
}

impl Harness {
    fn new() -> Self {
        let temp = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.data_dir = temp.path().to_path_buf();
        config.rocksdb.sync_writes = false;

        Self {
            ledger: Ledger::open(&config).unwrap(),
            _temp: temp,
        }
    }

    fn call(&self, function: &str, args: &[&str]) -> Response {
        dispatch(&self.ledger, function, args)
    }

    fn ok(&self, function: &str, args: &[&str]) {
        let response = self.call(function, args);
        assert!(response.is_ok(), "{} {:?} failed: {}", function, args, response.message);
        assert_eq!(response.payload, None, "{} {:?} returned a payload", function, args);
    }

    fn expect(&self, function: &str, args: &[&str], expected: &str) {
        let response = self.call(function, args);
        assert!(response.is_ok(), "{} {:?} failed: {}", function, args, response.message);
        assert_eq!(response.payload_str(), Some(expected), "{} {:?}", function, args);
    }

    fn fail(&self, function: &str, args: &[&str], kind: &str) {
        let response = self.call(function, args);
        assert!(!response.is_ok(), "{} {:?} should fail", function, args);
        assert_eq!(response.error_kind, Some(kind), "{} {:?}: {}", function, args, response.message);
    }
}

#[test]
fn test_full_lifecycle() {
    let h = Harness::new();

    h.fail("register", &["", "test empty username"], "InvalidArgument");
    h.ok("register", &["user_a", "company A"]);
    h.fail("register", &["user_a", "company A"], "AlreadyExists");

    h.expect("getUserInfo", &["user_a"], r#"{"extras":"company A","name":"user_a"}"#);
    h.fail("getUserInfo", &["user_b"], "NotFound");

    h.expect("getBalance", &["user_a"], "0");
    h.fail("getBalance", &["user_b"], "NotFound");

    h.expect("getRestraintsOfUser", &["user_a"], "{}");
    h.fail("getRestraintsOfUser", &["user_b"], "NotFound");
    h.fail("getRestraintBetweenUsers", &["user_a", "user_b"], "NotFound");

    h.ok("register", &["user_b", "company A"]);
    h.expect("getRestraintBetweenUsers", &["user_a", "user_b"], "0");
    h.fail("getRestraintBetweenUsers", &["user_a", "user_c"], "NotFound");

    h.ok("recharge", &["user_a", "10000"]);
    h.expect("getBalance", &["user_a"], "10000");
    h.ok("recharge", &["user_a", "1000"]);
    h.expect("getBalance", &["user_a"], "11000");
    h.fail("recharge", &["user_a", "-10000"], "InvalidArgument");

    h.ok("withdraw", &["user_a", "10000"]);
    h.expect("getBalance", &["user_a"], "1000");
    h.ok("withdraw", &["user_a", "1000"]);
    h.expect("getBalance", &["user_a"], "0");
    h.fail("withdraw", &["user_a", "0"], "InvalidArgument");
    h.fail("withdraw", &["user_a", "-1"], "InvalidArgument");

    h.ok("setRestraint", &["user_a", "user_b", "1"]);
    h.fail("setRestraint", &["user_a", "user_b", ""], "InvalidArgument");
    h.fail("setRestraint", &["user_a", "user_b", "4"], "InvalidArgument");
    h.fail("setRestraint", &["user_a", "user_b", "-1"], "InvalidArgument");
    h.fail("setRestraint", &["user_a", "user_c", "0"], "NotFound");

    h.expect("getRestraintBetweenUsers", &["user_a", "user_b"], "1");
    h.expect("getRestraintBetweenUsers", &["user_b", "user_a"], "2");

    h.expect("getRestraintsOfUser", &["user_a"], r#"{"user_b":"1"}"#);
    h.expect("getRestraintsOfUser", &["user_b"], r#"{"user_a":"2"}"#);

    h.ok("register", &["user_c", "company C"]);
    h.ok("setRestraint", &["user_a", "user_c", "2"]);

    h.expect("getRestraintsOfUser", &["user_a"], r#"{"user_b":"1","user_c":"2"}"#);
    h.expect("getRestraintsOfUser", &["user_c"], r#"{"user_a":"1"}"#);
    h.expect("getRestraintBetweenUsers", &["user_a", "user_c"], "2");
    h.expect("getRestraintBetweenUsers", &["user_c", "user_a"], "1");

    h.ok("setRestraint", &["user_a", "user_c", "0"]);
    h.expect("getRestraintsOfUser", &["user_a"], r#"{"user_b":"1"}"#);
    h.expect("getRestraintsOfUser", &["user_c"], "{}");
    h.expect("getRestraintBetweenUsers", &["user_a", "user_c"], "0");
    h.expect("getRestraintBetweenUsers", &["user_c", "user_a"], "0");

    // Zero transfers pass with an empty balance
    h.ok("transfer", &["user_a", "user_b", "0"]);

    h.ok("recharge", &["user_a", "10000"]);
    h.expect("getBalance", &["user_a"], "10000");
    h.expect("getBalance", &["user_b"], "0");
    h.expect("getBalance", &["user_c"], "0");

    h.ok("transfer", &["user_a", "user_b", "1000"]);
    h.expect("getBalance", &["user_a"], "9000");
    h.expect("getBalance", &["user_b"], "1000");

    h.fail("transfer", &["user_a", "user_c", "1000"], "Forbidden");
    h.expect("getBalance", &["user_a"], "9000");
    h.expect("getBalance", &["user_c"], "0");

    h.fail("transfer", &["user_b", "user_a", "1000"], "Forbidden");
    h.expect("getBalance", &["user_a"], "9000");
    h.expect("getBalance", &["user_b"], "1000");

    h.ok("setRestraint", &["user_a", "user_b", "2"]);
    h.ok("transfer", &["user_b", "user_a", "1000"]);
    h.expect("getBalance", &["user_a"], "10000");
    h.expect("getBalance", &["user_b"], "0");
    h.fail("transfer", &["user_b", "user_a", "1000"], "Forbidden");

    h.ok("setRestraint", &["user_a", "user_b", "3"]);
    h.ok("transfer", &["user_a", "user_b", "1000"]);
    h.expect("getBalance", &["user_a"], "9000");
    h.expect("getBalance", &["user_b"], "1000");

    h.ok("transfer", &["user_b", "user_a", "100.123"]);
    h.expect("getBalance", &["user_a"], "9100.123");
    h.expect("getBalance", &["user_b"], "899.877");

    h.fail("setRestraint", &["user_a", "user_a", "3"], "InvalidArgument");
    h.fail("transfer", &["user_a", "user_a", "5000"], "InvalidArgument");
}

#[test]
fn test_insufficient_funds_through_dispatcher() {
    let h = Harness::new();
    h.ok("register", &["a", ""]);
    h.ok("register", &["b", ""]);
    h.ok("setRestraint", &["a", "b", "1"]);
    h.ok("recharge", &["a", "50"]);

    h.fail("transfer", &["a", "b", "50.01"], "InsufficientFunds");
    h.fail("withdraw", &["a", "51"], "InsufficientFunds");
    h.fail("transfer", &["a", "b", "fifty"], "InvalidNumber");
    h.fail("recharge", &["a", "1_000"], "InvalidNumber");
    h.fail("transfer", &["a", "b", "1_0e1"], "InvalidNumber");
    h.expect("getBalance", &["a"], "50");
    h.expect("getBalance", &["b"], "0");
}

#[test]
fn test_state_survives_reopen() {
    let temp = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.data_dir = temp.path().to_path_buf();

    {
        let ledger = Ledger::open(&config).unwrap();
        ledger.register("a", "x").unwrap();
        ledger.register("b", "y").unwrap();
        ledger.set_restraint("a", "b", "1").unwrap();
        ledger.recharge("a", "7.25").unwrap();
        ledger.transfer("a", "b", "2.25").unwrap();
    }

    let ledger = Ledger::open(&config).unwrap();
    assert_eq!(ledger.get_balance("a").unwrap(), "5");
    assert_eq!(ledger.get_balance("b").unwrap(), "2.25");
    assert_eq!(
        dispatch(&ledger, "getRestraintsOfUser", &["b"]).payload_str(),
        Some(r#"{"a":"2"}"#)
    );
}
