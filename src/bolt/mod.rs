//! # Bolt Protocol Implementation
//!
//! Low-level client side of the Bolt protocol spoken by Memgraph and other
//! Bolt-compatible graph databases.
//!
//! ## Overview
//!
//! - **PackStream** - Binary serialization format for all values
//! - **Message Types** - Client requests and server responses
//! - **Handshake** - Protocol version negotiation (Bolt 5.0 to 5.2)
//! - **Codec** - Chunked message framing for Tokio
//!
//! ## Submodules
//!
//! - [`packstream`] - Binary serialization/deserialization
//! - [`message`] - Bolt message types (HELLO, RUN, PULL, etc.)
//! - [`handshake`] - Version negotiation
//! - [`codec`] - Tokio codec for async I/O
//! - [`error`] - Protocol error types
//!
//! ## Note
//!
//! Most users should use the DB-API layer in [`crate::dbapi`] instead of
//! talking to the protocol directly.

pub mod codec;
pub mod error;
pub mod handshake;
pub mod message;
pub mod packstream;

pub use codec::BoltCodec;
pub use error::{BoltError, BoltResult, HandshakeError};
pub use handshake::{BoltVersion, BOLT_MAGIC, HANDSHAKE_RESPONSE_SIZE};
pub use message::{
    AuthToken, BeginMessage, BoltRequest, BoltResponse, FailureMessage, HelloMessage,
    PullMessage, RunMessage, SuccessMessage,
};
pub use packstream::{
    PackStreamDecoder, PackStreamEncoder, PackStreamError, PackStreamMap, PackStreamStructure,
    PackStreamValue,
};
