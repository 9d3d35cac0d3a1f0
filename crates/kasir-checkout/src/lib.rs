//! # kasir-checkout: Checkout Session for Kasir POS
//!
//! Orchestrates the pure `kasir-core` engine against the remote
//! collaborators of the cashier screen.
//!
//! ## Module Organization
//! ```text
//! kasir_checkout/
//! ├── lib.rs          ◄─── You are here
//! ├── ports.rs        ◄─── Collaborator traits + ServiceError
//! ├── session.rs      ◄─── CheckoutSession (engine + collaborators)
//! ├── state.rs        ◄─── CheckoutState busy gate
//! ├── config.rs       ◄─── CheckoutConfig (TOML + KASIR_* env)
//! ├── advisory.rs     ◄─── User-facing error payloads
//! ├── error.rs        ◄─── CheckoutError
//! ├── telemetry.rs    ◄─── tracing subscriber setup
//! └── in_memory.rs    ◄─── In-memory collaborators
//! ```
//!
//! ## Startup Sequence
//! ```rust,ignore
//! kasir_checkout::telemetry::init_tracing();
//!
//! let config = CheckoutConfig::load(None)?;
//! let session = CheckoutSession::open(context, config, collaborators).await?;
//! let state = CheckoutState::new(session);
//!
//! state.add_item("kopi-susu")?;
//! state.select_payment_method(PaymentMethod::Cash).await?;
//! ```

pub mod advisory;
pub mod config;
pub mod error;
pub mod in_memory;
pub mod ports;
pub mod session;
pub mod state;
pub mod telemetry;

pub use advisory::{Advisory, ErrorCode, Severity};
pub use config::CheckoutConfig;
pub use error::{CheckoutError, CheckoutResult};
pub use ports::{
    CatalogProvider, Collaborators, DiscountResolver, PaymentGateway, ServiceError,
    TransactionSubmitter,
};
pub use session::CheckoutSession;
pub use state::CheckoutState;
