//! Repository layer
//!
//! Services depend on the traits only; `Bounded` adds per-call deadlines on
//! top of whichever backend is configured.

pub mod bounded;
pub mod credential_repo;
pub mod memory;
pub mod movie_repo;

pub use bounded::Bounded;
pub use credential_repo::{CredentialRepository, PgCredentialRepository};
pub use memory::{InMemoryCredentialRepository, InMemoryMovieRepository};
pub use movie_repo::{MovieRepository, PgMovieRepository};
