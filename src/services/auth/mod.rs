pub mod claims;
pub mod error;
pub mod factory;
pub mod gate;
pub mod key_cache;
pub mod key_set;
pub mod resolver;
pub mod token;
pub mod verifier;

pub use claims::VerifiedClaims;
pub use error::AuthError;
pub use factory::build_bearer_gate;
pub use gate::BearerGate;
