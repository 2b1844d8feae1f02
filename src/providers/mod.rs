pub mod privatbank;

pub use privatbank::{PrivatBankProvider, PrivatBankSession};
