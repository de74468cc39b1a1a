//! Bolt session over a real transport.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::Framed;
use tracing::{debug, warn};

use crate::bolt::handshake::{client_handshake, negotiate, HANDSHAKE_RESPONSE_SIZE};
use crate::bolt::{
    AuthToken, BeginMessage, BoltCodec, BoltError, BoltRequest, BoltResponse, BoltResult,
    BoltVersion, HelloMessage, PackStreamMap, PullMessage, RunMessage, SuccessMessage,
};
use crate::dbapi::config::ConnectConfig;
use crate::dbapi::error::{ClientError, ClientResult};
use crate::dbapi::session::{Fetch, Session, SessionError, SessionResult};

use super::transport::Transport;

/// Bolt client session.
///
/// After a FAILURE the session sends RESET on its own, so a rejected
/// statement never leaves the server in the FAILED state.
pub struct BoltSession<S = Transport> {
    framed: Framed<S, BoltCodec>,
    version: BoltVersion,
    server_agent: Option<String>,
    connection_id: Option<String>,
    bad: bool,
}

impl BoltSession<Transport> {
    /// Open the transport, negotiate the protocol version and authenticate.
    ///
    /// Every failure here is an `OperationalError`.
    pub async fn connect(config: &ConnectConfig) -> ClientResult<Self> {
        let transport = Transport::open(config).await.map_err(connect_error)?;
        Self::start(transport, &config.user_agent, config.auth_token())
            .await
            .map_err(connect_error)
    }
}

fn connect_error(err: BoltError) -> ClientError {
    match err {
        BoltError::Authentication { code, message } => {
            ClientError::operational(format!("authentication failed: {}: {}", code, message))
        }
        other => ClientError::operational(other.to_string()),
    }
}

impl<S> BoltSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Handshake and HELLO (plus LOGON on 5.1+) over an open stream.
    pub async fn start(mut stream: S, user_agent: &str, auth: AuthToken) -> BoltResult<Self> {
        stream.write_all(&client_handshake()).await?;
        stream.flush().await?;
        let mut response = [0u8; HANDSHAKE_RESPONSE_SIZE];
        stream.read_exact(&mut response).await?;
        let version = negotiate(response)?;
        debug!(%version, "bolt version negotiated");

        let mut session = Self {
            framed: Framed::new(stream, BoltCodec::new()),
            version,
            server_agent: None,
            connection_id: None,
            bad: false,
        };

        let hello = HelloMessage::new(user_agent);
        let success = if version.uses_logon() {
            let success = session.authenticate(BoltRequest::Hello(hello)).await?;
            session.authenticate(BoltRequest::Logon(auth)).await?;
            success
        } else {
            session
                .authenticate(BoltRequest::Hello(hello.with_auth(auth)))
                .await?
        };
        session.server_agent = success.server().map(String::from);
        session.connection_id = success.connection_id().map(String::from);
        debug!(
            server = session.server_agent.as_deref().unwrap_or("unknown"),
            "session authenticated"
        );
        Ok(session)
    }

    async fn authenticate(&mut self, request: BoltRequest) -> BoltResult<SuccessMessage> {
        let name = request.name();
        self.send(request).await?;
        match self.recv().await? {
            BoltResponse::Success(success) => Ok(success),
            BoltResponse::Failure(failure) => Err(BoltError::Authentication {
                code: failure.code,
                message: failure.message,
            }),
            other => Err(BoltError::Protocol(format!(
                "unexpected {} in reply to {}",
                other.name(),
                name
            ))),
        }
    }

    /// Negotiated protocol version.
    pub fn version(&self) -> BoltVersion {
        self.version
    }

    /// Server agent reported by HELLO.
    pub fn server_agent(&self) -> Option<&str> {
        self.server_agent.as_deref()
    }

    /// Connection id reported by HELLO.
    pub fn connection_id(&self) -> Option<&str> {
        self.connection_id.as_deref()
    }

    async fn send(&mut self, request: BoltRequest) -> BoltResult<()> {
        debug!(message = request.name(), "bolt send");
        self.framed.send(request).await
    }

    async fn recv(&mut self) -> BoltResult<BoltResponse> {
        match self.framed.next().await {
            Some(response) => response,
            None => Err(BoltError::ConnectionClosed),
        }
    }

    /// One request, one summary.
    async fn request(&mut self, request: BoltRequest) -> SessionResult<SuccessMessage> {
        let name = request.name();
        if self.bad {
            return Err(SessionError::connection("session is no longer usable"));
        }
        if let Err(e) = self.send(request).await {
            return Err(self.broken(e));
        }
        self.summary(name).await
    }

    async fn summary(&mut self, name: &str) -> SessionResult<SuccessMessage> {
        match self.recv().await {
            Ok(BoltResponse::Success(success)) => Ok(success),
            Ok(BoltResponse::Failure(failure)) => Err(self.failed(failure.code, failure.message).await),
            Ok(other) => Err(self.broken(BoltError::Protocol(format!(
                "unexpected {} in reply to {}",
                other.name(),
                name
            )))),
            Err(e) => Err(self.broken(e)),
        }
    }

    /// The server rejected a request: RESET so the session stays usable.
    async fn failed(&mut self, code: String, message: String) -> SessionError {
        debug!(%code, "server failure, resetting session");
        if let Err(e) = self.reset_after_failure().await {
            warn!(error = %e, "reset after failure did not succeed");
            return self.broken(e);
        }
        SessionError::statement(code, message)
    }

    async fn reset_after_failure(&mut self) -> BoltResult<()> {
        self.send(BoltRequest::Reset).await?;
        loop {
            match self.recv().await? {
                BoltResponse::Success(_) => return Ok(()),
                // Replies to requests already queued before the failure
                BoltResponse::Ignored | BoltResponse::Record(_) => continue,
                BoltResponse::Failure(f) => {
                    return Err(BoltError::Failure {
                        code: f.code,
                        message: f.message,
                    })
                }
            }
        }
    }

    fn broken(&mut self, err: BoltError) -> SessionError {
        if !self.bad {
            warn!(error = %err, "bolt session broken");
        }
        self.bad = true;
        SessionError::connection(err.to_string())
    }
}

#[async_trait]
impl<S> Session for BoltSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn run(
        &mut self,
        query: &str,
        params: PackStreamMap,
        database: Option<&str>,
    ) -> SessionResult<Vec<String>> {
        let mut run = RunMessage::new(query).with_parameters(params);
        if let Some(db) = database {
            run = run.with_database(db);
        }
        let success = self.request(BoltRequest::Run(run)).await?;
        Ok(success.fields())
    }

    async fn pull(&mut self, n: Option<i64>) -> SessionResult<()> {
        if self.bad {
            return Err(SessionError::connection("session is no longer usable"));
        }
        let pull = n.map_or_else(PullMessage::all, PullMessage::with_n);
        if let Err(e) = self.send(BoltRequest::Pull(pull)).await {
            return Err(self.broken(e));
        }
        Ok(())
    }

    async fn fetch(&mut self) -> SessionResult<Fetch> {
        match self.recv().await {
            Ok(BoltResponse::Record(fields)) => Ok(Fetch::Record(fields)),
            Ok(BoltResponse::Success(success)) => Ok(Fetch::Summary {
                has_more: success.has_more(),
            }),
            Ok(BoltResponse::Failure(failure)) => Err(self.failed(failure.code, failure.message).await),
            Ok(BoltResponse::Ignored) => Err(self.broken(BoltError::Protocol(
                "unexpected IGNORED in reply to PULL".to_string(),
            ))),
            Err(e) => Err(self.broken(e)),
        }
    }

    async fn begin(&mut self, database: Option<&str>) -> SessionResult<()> {
        let mut begin = BeginMessage::new();
        if let Some(db) = database {
            begin = begin.with_database(db);
        }
        self.request(BoltRequest::Begin(begin)).await.map(|_| ())
    }

    async fn commit(&mut self) -> SessionResult<()> {
        self.request(BoltRequest::Commit).await.map(|_| ())
    }

    async fn rollback(&mut self) -> SessionResult<()> {
        self.request(BoltRequest::Rollback).await.map(|_| ())
    }

    async fn reset(&mut self) -> SessionResult<()> {
        if self.bad {
            return Err(SessionError::connection("session is no longer usable"));
        }
        self.reset_after_failure().await.map_err(|e| self.broken(e))
    }

    async fn close(&mut self) {
        if !self.bad {
            let _ = self.send(BoltRequest::Goodbye).await;
        }
        let _ = self.framed.get_mut().shutdown().await;
        self.bad = true;
        debug!("bolt session closed");
    }

    fn is_bad(&self) -> bool {
        self.bad
    }
}

impl<S> std::fmt::Debug for BoltSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoltSession")
            .field("version", &self.version)
            .field("server_agent", &self.server_agent)
            .field("connection_id", &self.connection_id)
            .field("bad", &self.bad)
            .finish()
    }
}
