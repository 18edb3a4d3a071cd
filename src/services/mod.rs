pub mod reconciler;
pub mod topup_service;

pub use reconciler::{CallbackDisposition, Reconciler};
pub use topup_service::TopupService;
