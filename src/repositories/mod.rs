pub mod callback_repository;
pub mod transaction_repository;
pub mod wallet_repository;

pub use callback_repository::CallbackRepository;
pub use transaction_repository::TransactionRepository;
pub use wallet_repository::WalletRepository;
