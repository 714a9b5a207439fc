pub mod ledger;
pub mod numerals;
pub mod orders;
pub mod receipt;
pub mod units;
