//! Bolt protocol version definitions.

use std::fmt;

use super::super::error::HandshakeError;

/// A negotiated Bolt protocol version.
///
/// On the wire a version is four bytes: `[0x00, range, minor, major]`, where
/// `range` lets one proposal cover `minor`, `minor - 1`, ... `minor - range`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoltVersion {
    /// Major version number
    pub major: u8,
    /// Minor version number
    pub minor: u8,
}

impl BoltVersion {
    /// Bolt 5.0
    pub const V5_0: BoltVersion = BoltVersion::new(5, 0);
    /// Bolt 5.1, authentication moves from HELLO to LOGON
    pub const V5_1: BoltVersion = BoltVersion::new(5, 1);
    /// Bolt 5.2
    pub const V5_2: BoltVersion = BoltVersion::new(5, 2);

    /// Create a version.
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// Encode as a proposal covering this version and `range` minors below it.
    pub fn to_proposal(self, range: u8) -> [u8; 4] {
        [0, range, self.minor, self.major]
    }

    /// Parse the server's four-byte answer.
    pub fn from_response(bytes: [u8; 4]) -> Result<Self, HandshakeError> {
        match bytes {
            [0, 0, 0, 0] => Err(HandshakeError::NoCompatibleVersion),
            [0, 0, minor, major] => Ok(Self::new(major, minor)),
            other => Err(HandshakeError::InvalidResponse(other)),
        }
    }

    /// Whether credentials are sent in a separate LOGON message.
    pub fn uses_logon(self) -> bool {
        self >= Self::V5_1
    }
}

impl fmt::Display for BoltVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proposal_bytes() {
        assert_eq!(BoltVersion::V5_2.to_proposal(2), [0x00, 0x02, 0x02, 0x05]);
        assert_eq!(BoltVersion::V5_0.to_proposal(0), [0x00, 0x00, 0x00, 0x05]);
    }

    #[test]
    fn test_from_response() {
        assert_eq!(
            BoltVersion::from_response([0, 0, 2, 5]).unwrap(),
            BoltVersion::V5_2
        );
        assert_eq!(
            BoltVersion::from_response([0, 0, 0, 0]),
            Err(HandshakeError::NoCompatibleVersion)
        );
        assert!(matches!(
            BoltVersion::from_response(*b"HTTP"),
            Err(HandshakeError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_ordering_and_logon() {
        assert!(BoltVersion::V5_2 > BoltVersion::V5_0);
        assert!(!BoltVersion::V5_0.uses_logon());
        assert!(BoltVersion::V5_1.uses_logon());
        assert!(BoltVersion::V5_2.uses_logon());
        assert_eq!(BoltVersion::V5_1.to_string(), "5.1");
    }
}
