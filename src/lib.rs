//! # bolt-dbapi
//!
//! A DB-API 2.0 style client for Bolt graph databases (Memgraph and other
//! Bolt 5 servers), with connections, cursors and a typed value model.
//!
//! ## Features
//!
//! - **Bolt Protocol 5.0-5.2** - PackStream codec, chunked framing, HELLO/LOGON
//! - **Async/Await** - Built on Tokio
//! - **Eager and lazy results** - buffer a whole result or pull one record at a time
//! - **Transactions** - implicit transactions with explicit `commit`/`rollback`
//! - **TLS** - rustls with a fingerprint-based trust callback
//!
//! ## Quick Start
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! bolt-dbapi = "0.1"
//! tokio = { version = "1", features = ["full"] }
//! ```
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use bolt_dbapi::{connect, params, ConnectConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConnectConfig::builder("localhost")
//!         .with_credentials("memgraph", "password")
//!         .build()?;
//!     let conn = connect(config).await?;
//!
//!     let mut cursor = conn.cursor()?;
//!     cursor
//!         .execute(
//!             "CREATE (n:Person {name: $name}) RETURN n.name AS name",
//!             Some(params! {"name" => "Alice"}),
//!         )
//!         .await?;
//!
//!     for record in cursor.fetchall().await? {
//!         println!("{}", record);
//!     }
//!
//!     // autocommit is off by default
//!     conn.commit().await?;
//!     conn.close().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Lazy Connections
//!
//! With `lazy` enabled every fetch pulls from the server on demand. Lazy
//! connections are always in autocommit mode and only one cursor at a time
//! may be reading a result:
//!
//! ```rust,no_run
//! # use bolt_dbapi::{connect, ConnectConfig};
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConnectConfig::builder("localhost").with_lazy(true).build()?;
//! let conn = connect(config).await?;
//!
//! let mut cursor = conn.cursor()?;
//! cursor.execute("UNWIND range(1, 10) AS n RETURN n", None).await?;
//! while let Some(record) = cursor.fetchone().await? {
//!     println!("{}", record[0]);
//! }
//! cursor.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## TLS
//!
//! ```rust
//! use bolt_dbapi::{ConnectConfig, SslMode};
//!
//! let config = ConnectConfig::builder("db.example.com")
//!     .with_sslmode(SslMode::Require)
//!     .with_trust_callback(|host, ip, key_type, fingerprint| {
//!         println!("{} ({}) presented a {} key: {}", host, ip, key_type, fingerprint);
//!         true
//!     })
//!     .build()
//!     .unwrap();
//! ```
//!
//! ## Value Types
//!
//! ```rust
//! use bolt_dbapi::Value;
//!
//! let null = Value::Null;
//! let integer = Value::from(42);
//! let string = Value::from("hello");
//! let list = Value::from(vec![1, 2, 3]);
//! assert_eq!(list.to_string(), "[1, 2, 3]");
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`ClientResult`]. [`ClientError`] mirrors the DB-API
//! exception classes:
//!
//! ```rust,no_run
//! # use bolt_dbapi::{connect, ClientError, ConnectConfig};
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! match connect(ConnectConfig::builder("localhost").build()?).await {
//!     Ok(_) => println!("Connected!"),
//!     Err(ClientError::Operational(msg)) => eprintln!("Connection failed: {}", msg),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`dbapi`] - Connections, cursors, values and errors
//! - [`bolt`] - Low-level Bolt protocol implementation
//!

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod bolt;
pub mod dbapi;

// Re-exports for convenience
pub use dbapi::{
    connect, ClientError, ClientResult, Column, ConnectConfig, ConnectConfigBuilder, Connection,
    ConnectionStatus, Cursor, CursorStatus, Node, Path, Record, Relationship, SslMode, Value,
    ValueMap, APILEVEL, PARAMSTYLE, THREADSAFETY,
};

pub use bolt::{BoltError, BoltVersion, PackStreamValue};
