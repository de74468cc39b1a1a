//! Bolt protocol request messages.
//!
//! Request messages are sent from the client to the server.

use super::tag;
use crate::bolt::packstream::{PackStreamMap, PackStreamStructure, PackStreamValue};

/// Credentials carried by HELLO (Bolt 5.0) or LOGON (Bolt 5.1+).
#[derive(Clone, PartialEq)]
pub struct AuthToken {
    /// Authentication scheme ("none" or "basic")
    pub scheme: String,
    /// Principal (username)
    pub principal: Option<String>,
    /// Credentials (password)
    pub credentials: Option<String>,
}

impl AuthToken {
    /// Create a basic auth token.
    pub fn basic(principal: &str, credentials: &str) -> Self {
        Self {
            scheme: "basic".to_string(),
            principal: Some(principal.to_string()),
            credentials: Some(credentials.to_string()),
        }
    }

    /// Create an anonymous auth token (no auth).
    pub fn none() -> Self {
        Self {
            scheme: "none".to_string(),
            principal: None,
            credentials: None,
        }
    }

    /// Write the token entries into a message map.
    fn write_into(&self, map: &mut PackStreamMap) {
        map.insert("scheme", self.scheme.as_str());
        if let Some(ref p) = self.principal {
            map.insert("principal", p.as_str());
        }
        if let Some(ref c) = self.credentials {
            map.insert("credentials", c.as_str());
        }
    }
}

// Keeps passwords out of logs.
impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthToken")
            .field("scheme", &self.scheme)
            .field("principal", &self.principal)
            .field("credentials", &self.credentials.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Client request messages.
#[derive(Debug, Clone)]
pub enum BoltRequest {
    /// HELLO - Initialize connection
    Hello(HelloMessage),
    /// LOGON - Authenticate (Bolt 5.1+)
    Logon(AuthToken),
    /// GOODBYE - Close connection gracefully
    Goodbye,
    /// RESET - Return the server to a clean state
    Reset,
    /// RUN - Execute a query
    Run(RunMessage),
    /// PULL - Pull results
    Pull(PullMessage),
    /// DISCARD - Throw results away
    Discard(PullMessage),
    /// BEGIN - Start transaction
    Begin(BeginMessage),
    /// COMMIT - Commit transaction
    Commit,
    /// ROLLBACK - Rollback transaction
    Rollback,
}

impl BoltRequest {
    /// Get message name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            BoltRequest::Hello(_) => "HELLO",
            BoltRequest::Logon(_) => "LOGON",
            BoltRequest::Goodbye => "GOODBYE",
            BoltRequest::Reset => "RESET",
            BoltRequest::Run(_) => "RUN",
            BoltRequest::Pull(_) => "PULL",
            BoltRequest::Discard(_) => "DISCARD",
            BoltRequest::Begin(_) => "BEGIN",
            BoltRequest::Commit => "COMMIT",
            BoltRequest::Rollback => "ROLLBACK",
        }
    }

    /// Convert to PackStream structure.
    pub fn to_structure(&self) -> PackStreamStructure {
        match self {
            BoltRequest::Hello(msg) => msg.to_structure(),
            BoltRequest::Logon(auth) => {
                let mut map = PackStreamMap::new();
                auth.write_into(&mut map);
                PackStreamStructure::new(tag::LOGON, vec![map.into()])
            }
            BoltRequest::Goodbye => PackStreamStructure::new(tag::GOODBYE, vec![]),
            BoltRequest::Reset => PackStreamStructure::new(tag::RESET, vec![]),
            BoltRequest::Run(msg) => msg.to_structure(),
            BoltRequest::Pull(msg) => msg.to_structure(tag::PULL),
            BoltRequest::Discard(msg) => msg.to_structure(tag::DISCARD),
            BoltRequest::Begin(msg) => msg.to_structure(),
            BoltRequest::Commit => PackStreamStructure::new(tag::COMMIT, vec![]),
            BoltRequest::Rollback => PackStreamStructure::new(tag::ROLLBACK, vec![]),
        }
    }
}

/// HELLO message - Initialize connection.
#[derive(Debug, Clone)]
pub struct HelloMessage {
    /// User agent string
    pub user_agent: String,
    /// Credentials, only for protocol versions without LOGON
    pub auth: Option<AuthToken>,
}

impl HelloMessage {
    /// Create a new HELLO message.
    pub fn new(user_agent: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            auth: None,
        }
    }

    /// Set authentication.
    pub fn with_auth(mut self, auth: AuthToken) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Convert to PackStream structure.
    pub fn to_structure(&self) -> PackStreamStructure {
        let mut extra = PackStreamMap::new();
        extra.insert("user_agent", self.user_agent.as_str());
        if let Some(ref auth) = self.auth {
            auth.write_into(&mut extra);
        }
        PackStreamStructure::new(tag::HELLO, vec![extra.into()])
    }
}

/// RUN message - Execute a query.
#[derive(Debug, Clone)]
pub struct RunMessage {
    /// Query text
    pub query: String,
    /// Encoded query parameters
    pub parameters: PackStreamMap,
    /// Extra metadata (`db`)
    pub extra: PackStreamMap,
}

impl RunMessage {
    /// Create a new RUN message.
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            parameters: PackStreamMap::new(),
            extra: PackStreamMap::new(),
        }
    }

    /// Set parameters.
    pub fn with_parameters(mut self, params: PackStreamMap) -> Self {
        self.parameters = params;
        self
    }

    /// Run against a specific database.
    pub fn with_database(mut self, db: &str) -> Self {
        self.extra.insert("db", db);
        self
    }

    /// Convert to PackStream structure.
    pub fn to_structure(&self) -> PackStreamStructure {
        PackStreamStructure::new(
            tag::RUN,
            vec![
                PackStreamValue::String(self.query.clone()),
                PackStreamValue::Map(self.parameters.clone()),
                PackStreamValue::Map(self.extra.clone()),
            ],
        )
    }
}

/// PULL or DISCARD message body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PullMessage {
    /// Number of records, -1 for all
    pub n: i64,
}

impl PullMessage {
    /// All remaining records.
    pub fn all() -> Self {
        Self { n: -1 }
    }

    /// At most `n` records.
    pub fn with_n(n: i64) -> Self {
        Self { n }
    }

    fn to_structure(self, tag: u8) -> PackStreamStructure {
        let mut extra = PackStreamMap::new();
        extra.insert("n", self.n);
        PackStreamStructure::new(tag, vec![extra.into()])
    }
}

/// BEGIN message - Start an explicit transaction.
#[derive(Debug, Clone, Default)]
pub struct BeginMessage {
    /// Extra metadata (`db`)
    pub extra: PackStreamMap,
}

impl BeginMessage {
    /// Create a new BEGIN message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin against a specific database.
    pub fn with_database(mut self, db: &str) -> Self {
        self.extra.insert("db", db);
        self
    }

    /// Convert to PackStream structure.
    pub fn to_structure(&self) -> PackStreamStructure {
        PackStreamStructure::new(tag::BEGIN, vec![self.extra.clone().into()])
    }
}
