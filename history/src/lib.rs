pub mod groups;
pub mod reconstruct;

pub use groups::{Group, ReceiveTransaction, SendTransaction, TransactionGroup};
pub use reconstruct::{list_records, reconstruct, ReconstructOptions};

fn _version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
fn _pkg_name() -> &'static str {
    env!("CARGO_PKG_NAME")
}

pub fn version() -> String {
    format!("{}: {}", _pkg_name(), _version())
}

#[test]
fn test_version() {
    println!("{}", version());
}
