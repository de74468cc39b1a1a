//! Bolt protocol message types.
//!
//! Only the client side of the exchange is modelled: requests are encoded,
//! responses are parsed.

pub mod request;
pub mod response;

pub use request::*;
pub use response::*;

/// Structure tags of the messages this client sends and understands.
pub mod tag {
    // Requests
    /// `HELLO {user_agent, [auth]}`
    pub const HELLO: u8 = 0x01;
    /// `GOODBYE`
    pub const GOODBYE: u8 = 0x02;
    /// `RESET`
    pub const RESET: u8 = 0x0F;
    /// `RUN query params extra`
    pub const RUN: u8 = 0x10;
    /// `BEGIN extra`
    pub const BEGIN: u8 = 0x11;
    /// `COMMIT`
    pub const COMMIT: u8 = 0x12;
    /// `ROLLBACK`
    pub const ROLLBACK: u8 = 0x13;
    /// `DISCARD {n}`
    pub const DISCARD: u8 = 0x2F;
    /// `PULL {n}`
    pub const PULL: u8 = 0x3F;
    /// `LOGON auth`, Bolt 5.1 and later
    pub const LOGON: u8 = 0x6A;

    // Responses
    /// `SUCCESS metadata`
    pub const SUCCESS: u8 = 0x70;
    /// `RECORD [values]`
    pub const RECORD: u8 = 0x71;
    /// `IGNORED`
    pub const IGNORED: u8 = 0x7E;
    /// `FAILURE {code, message}`
    pub const FAILURE: u8 = 0x7F;
}
