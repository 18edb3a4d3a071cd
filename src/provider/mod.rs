pub mod client;
pub mod signature;

pub use client::{
    CreatePaymentRequest, CreatedPayment, HttpProviderGateway, PaymentDetail, ProviderGateway,
};
pub use signature::{SignatureError, SignatureVerifier};
