//! Checkout side of the payment flow: turns a shopper's cart into a gateway payment intent
//! and hands the client secret back to the frontend.
pub mod cart;
pub mod client;
pub mod config;
pub mod http;

pub use cart::{CartError, CartItem, CreatePaymentIntentRequest};
pub use client::{
    CreatedPaymentIntent, GatewayError, HttpPaymentIntentClient, InMemoryPaymentIntentClient,
    PaymentIntentClient, PaymentIntentParams,
};
pub use config::PaymentsConfig;
pub use http::{AppState, CREATE_PATH, CheckoutSettings, build_router, cors_layer};
