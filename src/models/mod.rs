pub mod callback;
pub mod transaction;
pub mod wallet;

pub use callback::{CallbackOutcome, CallbackPayload, ProviderCallback};
pub use transaction::{Transaction, TransactionStatus, TransitionMetadata};
pub use wallet::WalletBalance;
