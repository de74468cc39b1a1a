//! Connection Configuration
//!
//! 연결 설정 및 빌더

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::bolt::AuthToken;

use super::error::{ClientError, ClientResult};

/// 기본 포트
pub const DEFAULT_PORT: u16 = 7687;

/// 기본 연결 타임아웃
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// SslMode - TLS 모드
// ============================================================================

/// TLS 사용 모드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SslMode {
    /// 평문 연결
    #[default]
    Disable,
    /// TLS 필수
    Require,
}

impl SslMode {
    /// 정수 코드 (0 = Disable, 1 = Require)
    pub fn code(self) -> i32 {
        match self {
            SslMode::Disable => 0,
            SslMode::Require => 1,
        }
    }
}

impl FromStr for SslMode {
    type Err = ClientError;

    fn from_str(s: &str) -> ClientResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disable" => Ok(SslMode::Disable),
            "require" => Ok(SslMode::Require),
            _ => Err(ClientError::value("invalid sslmode")),
        }
    }
}

impl TryFrom<i32> for SslMode {
    type Error = ClientError;

    fn try_from(code: i32) -> ClientResult<Self> {
        match code {
            0 => Ok(SslMode::Disable),
            1 => Ok(SslMode::Require),
            _ => Err(ClientError::value("invalid sslmode")),
        }
    }
}

impl fmt::Display for SslMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SslMode::Disable => write!(f, "disable"),
            SslMode::Require => write!(f, "require"),
        }
    }
}

// ============================================================================
// TrustCallback - 서버 인증서 확인
// ============================================================================

/// 서버 인증서 확인 콜백
///
/// 인자는 `(hostname, ip, key_type, fingerprint)` 순서입니다. `key_type`은
/// `"RSA"`, `"EC"`, `"ED25519"`, `"UNKNOWN"` 중 하나이고 `fingerprint`는
/// 인증서 DER의 SHA-512 16진수 문자열입니다. `false`를 반환하면 연결이
/// 중단됩니다.
pub type TrustCallback = Arc<dyn Fn(&str, &str, &str, &str) -> bool + Send + Sync>;

// ============================================================================
// ConnectConfig - 연결 설정
// ============================================================================

/// 연결 설정
#[derive(Clone)]
pub struct ConnectConfig {
    /// 호스트 이름 (DNS 조회 및 TLS SNI에 사용)
    pub host: Option<String>,
    /// IP 주소 (설정되면 DNS 조회 없이 사용)
    pub address: Option<String>,
    /// 포트
    pub port: u16,
    /// 사용자명
    pub username: Option<String>,
    /// 비밀번호
    pub password: Option<String>,
    /// User Agent
    pub user_agent: String,
    /// TLS 모드
    pub sslmode: SslMode,
    /// 클라이언트 인증서 (PEM)
    pub sslcert: Option<PathBuf>,
    /// 클라이언트 개인키 (PEM)
    pub sslkey: Option<PathBuf>,
    /// 서버 인증서 확인 콜백
    pub trust_callback: Option<TrustCallback>,
    /// 지연(pull) 모드
    pub lazy: bool,
    /// 고정 데이터베이스
    pub database: Option<String>,
    /// 연결 타임아웃
    pub connect_timeout: Duration,
}

impl ConnectConfig {
    /// 빌더 시작
    pub fn builder(host: impl Into<String>) -> ConnectConfigBuilder {
        ConnectConfigBuilder {
            config: ConnectConfig {
                host: Some(host.into()),
                ..ConnectConfig::default()
            },
            port: u32::from(DEFAULT_PORT),
            error: None,
        }
    }

    /// 접속 대상 (`address`가 우선)
    pub fn target_host(&self) -> &str {
        self.address
            .as_deref()
            .or(self.host.as_deref())
            .unwrap_or("localhost")
    }

    /// TLS 서버 이름 (`host`가 우선)
    pub fn server_name(&self) -> &str {
        self.host
            .as_deref()
            .or(self.address.as_deref())
            .unwrap_or("localhost")
    }

    /// 인증 토큰
    pub fn auth_token(&self) -> AuthToken {
        match &self.username {
            Some(user) => AuthToken::basic(user, self.password.as_deref().unwrap_or("")),
            None => AuthToken::none(),
        }
    }
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            host: None,
            address: None,
            port: DEFAULT_PORT,
            username: None,
            password: None,
            user_agent: format!("bolt-dbapi/{}", env!("CARGO_PKG_VERSION")),
            sslmode: SslMode::default(),
            sslcert: None,
            sslkey: None,
            trust_callback: None,
            lazy: false,
            database: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl fmt::Debug for ConnectConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectConfig")
            .field("host", &self.host)
            .field("address", &self.address)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "********"))
            .field("user_agent", &self.user_agent)
            .field("sslmode", &self.sslmode)
            .field("sslcert", &self.sslcert)
            .field("sslkey", &self.sslkey)
            .field("trust_callback", &self.trust_callback.is_some())
            .field("lazy", &self.lazy)
            .field("database", &self.database)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

// ============================================================================
// ConnectConfigBuilder - 설정 빌더
// ============================================================================

/// 연결 설정 빌더
///
/// 잘못된 값은 기록해 두었다가 [`build`](Self::build)에서 `ValueError`로 보고합니다.
pub struct ConnectConfigBuilder {
    config: ConnectConfig,
    port: u32,
    error: Option<ClientError>,
}

impl ConnectConfigBuilder {
    fn fail(&mut self, err: ClientError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    /// IP 주소 설정
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.config.address = Some(address.into());
        self
    }

    /// 포트 설정
    pub fn with_port(mut self, port: u32) -> Self {
        self.port = port;
        self
    }

    /// 사용자 인증 설정
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.config.username = Some(username.into());
        self.config.password = Some(password.into());
        self
    }

    /// User Agent 설정
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// TLS 모드 설정
    pub fn with_sslmode(mut self, mode: SslMode) -> Self {
        self.config.sslmode = mode;
        self
    }

    /// 문자열로 TLS 모드 설정
    pub fn with_sslmode_str(mut self, mode: &str) -> Self {
        match mode.parse() {
            Ok(mode) => self.config.sslmode = mode,
            Err(e) => self.fail(e),
        }
        self
    }

    /// 클라이언트 인증서 설정
    pub fn with_client_cert(mut self, cert: impl Into<PathBuf>, key: impl Into<PathBuf>) -> Self {
        self.config.sslcert = Some(cert.into());
        self.config.sslkey = Some(key.into());
        self
    }

    /// 인증서 확인 콜백 설정
    pub fn with_trust_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str, &str, &str, &str) -> bool + Send + Sync + 'static,
    {
        self.config.trust_callback = Some(Arc::new(callback));
        self
    }

    /// 지연(pull) 모드 설정
    pub fn with_lazy(mut self, lazy: bool) -> Self {
        self.config.lazy = lazy;
        self
    }

    /// 데이터베이스 고정
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.config.database = Some(database.into());
        self
    }

    /// 연결 타임아웃 설정
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// 빌드
    pub fn build(mut self) -> ClientResult<ConnectConfig> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.config.port =
            u16::try_from(self.port).map_err(|_| ClientError::value("port out of range"))?;
        if self.config.sslcert.is_some() && self.config.sslmode == SslMode::Disable {
            return Err(ClientError::value(
                "client certificate requires sslmode Require",
            ));
        }
        if matches!(self.config.database.as_deref(), Some(db) if db.trim().is_empty()) {
            return Err(ClientError::value("database name must not be empty"));
        }
        Ok(self.config)
    }
}
