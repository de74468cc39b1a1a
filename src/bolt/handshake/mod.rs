//! Bolt protocol handshake.
//!
//! The client opens with a 4-byte magic number followed by four 4-byte
//! version proposals (highest first); the server answers with the 4-byte
//! version it picked, or zeros if it supports none of them.

mod version;

pub use version::BoltVersion;

use super::error::HandshakeError;

/// Bolt protocol magic number: 0x6060B017
pub const BOLT_MAGIC: [u8; 4] = [0x60, 0x60, 0xB0, 0x17];

/// Size of the complete handshake message from client (magic + 4 versions)
pub const HANDSHAKE_SIZE: usize = 20;

/// Size of server response (negotiated version)
pub const HANDSHAKE_RESPONSE_SIZE: usize = 4;

/// Newest version this client speaks and how many minors below it it accepts.
const PROPOSAL: (BoltVersion, u8) = (BoltVersion::V5_2, 2);

/// Build the opening bytes: magic, one ranged proposal, three empty slots.
pub fn client_handshake() -> [u8; HANDSHAKE_SIZE] {
    let mut buf = [0u8; HANDSHAKE_SIZE];
    buf[..4].copy_from_slice(&BOLT_MAGIC);
    let (version, range) = PROPOSAL;
    buf[4..8].copy_from_slice(&version.to_proposal(range));
    buf
}

/// Validate the server's answer against what was proposed.
pub fn negotiate(response: [u8; HANDSHAKE_RESPONSE_SIZE]) -> Result<BoltVersion, HandshakeError> {
    let version = BoltVersion::from_response(response)?;
    let (newest, range) = PROPOSAL;
    let proposed = version.major == newest.major
        && version.minor <= newest.minor
        && version.minor >= newest.minor.saturating_sub(range);
    if !proposed {
        return Err(HandshakeError::UnexpectedVersion {
            major: version.major,
            minor: version.minor,
        });
    }
    Ok(version)
}
