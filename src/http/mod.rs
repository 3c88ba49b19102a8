//! HTTP trigger for issuance

pub mod router;
pub mod server;

pub use router::{AppState, GenerateResponse, create_router};
pub use server::IssuerServer;
