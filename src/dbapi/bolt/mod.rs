//! Bolt session for the DB-API layer.
//!
//! ```text
//! Connection
//!   └── BoltSession (Session impl, auto-RESET after FAILURE)
//!         ├── Framed<Transport, BoltCodec>
//!         └── Transport
//!               ├── Plain(TcpStream)
//!               └── Tls(TlsStream)  ← trust callback verifier
//! ```

pub mod client;
pub mod tls;
pub mod transport;

pub use client::BoltSession;
pub use transport::Transport;
