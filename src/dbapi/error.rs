//! DB-API Error Types
//!
//! DB-API 에러 분류 정의

use std::io;
use thiserror::Error;

use crate::bolt::{BoltError, PackStreamError};

// ============================================================================
// ClientError - 클라이언트 에러
// ============================================================================

/// 클라이언트 에러
///
/// DB-API 예외 계층을 하나의 열거형으로 표현합니다.
///
/// | 변형 | DB-API 클래스 |
/// |------|---------------|
/// | `Interface` | `InterfaceError` |
/// | `Database` | `DatabaseError` |
/// | `Operational` | `OperationalError` (`DatabaseError` 하위) |
/// | `Protocol` | `InternalError` (`DatabaseError` 하위) |
/// | `Value` | `ValueError` |
/// | `Overflow` | `OverflowError` |
#[derive(Error, Debug)]
pub enum ClientError {
    /// API 오용 (닫힌 리소스, 잘못된 상태 전이)
    #[error("Interface error: {0}")]
    Interface(String),

    /// 서버가 쿼리를 거부함
    #[error("Database error: {code} - {message}")]
    Database { code: String, message: String },

    /// 네트워크/TLS/인증 실패
    #[error("Operational error: {0}")]
    Operational(String),

    /// 잘못된 와이어 데이터
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// 잘못된 입력 값
    #[error("Value error: {0}")]
    Value(String),

    /// 범위를 벗어난 정수
    #[error("Overflow error: {0}")]
    Overflow(String),

    /// I/O 에러
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ClientError {
    /// 인터페이스 에러 생성
    pub fn interface(msg: impl Into<String>) -> Self {
        Self::Interface(msg.into())
    }

    /// 데이터베이스 에러 생성
    pub fn database(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Database {
            code: code.into(),
            message: message.into(),
        }
    }

    /// 운영 에러 생성
    pub fn operational(msg: impl Into<String>) -> Self {
        Self::Operational(msg.into())
    }

    /// 프로토콜 에러 생성
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// 값 에러 생성
    pub fn value(msg: impl Into<String>) -> Self {
        Self::Value(msg.into())
    }

    /// 오버플로 에러 생성
    pub fn overflow(msg: impl Into<String>) -> Self {
        Self::Overflow(msg.into())
    }

    /// InterfaceError 여부
    pub fn is_interface_error(&self) -> bool {
        matches!(self, Self::Interface(_))
    }

    /// DatabaseError 계열 여부
    pub fn is_database_error(&self) -> bool {
        matches!(
            self,
            Self::Database { .. } | Self::Operational(_) | Self::Protocol(_) | Self::Io(_)
        )
    }

    /// OperationalError 여부
    pub fn is_operational_error(&self) -> bool {
        matches!(self, Self::Operational(_) | Self::Io(_))
    }

    /// ValueError 여부
    pub fn is_value_error(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    /// OverflowError 여부
    pub fn is_overflow_error(&self) -> bool {
        matches!(self, Self::Overflow(_))
    }

    /// 서버 에러 코드
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Database { code, .. } => Some(code),
            _ => None,
        }
    }

    /// 재시도 가능 여부
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Database { code, .. } => code.contains(".TransientError."),
            _ => false,
        }
    }
}

// ============================================================================
// Result Type
// ============================================================================

/// 클라이언트 결과 타입
pub type ClientResult<T> = Result<T, ClientError>;

// ============================================================================
// 변환
// ============================================================================

impl From<BoltError> for ClientError {
    fn from(err: BoltError) -> Self {
        match err {
            BoltError::Failure { code, message } => ClientError::Database { code, message },
            BoltError::PackStream(e) => ClientError::Protocol(e.to_string()),
            BoltError::Protocol(msg) => ClientError::Protocol(msg),
            other => ClientError::Operational(other.to_string()),
        }
    }
}

impl From<PackStreamError> for ClientError {
    fn from(err: PackStreamError) -> Self {
        ClientError::Protocol(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(ClientError::interface("cursor closed").is_interface_error());
        assert!(!ClientError::interface("x").is_database_error());

        let db = ClientError::database("Memgraph.ClientError.Statement.SyntaxError", "bad");
        assert!(db.is_database_error());
        assert!(!db.is_operational_error());
        assert_eq!(db.code(), Some("Memgraph.ClientError.Statement.SyntaxError"));

        let op = ClientError::operational("refused");
        assert!(op.is_operational_error());
        assert!(op.is_database_error());

        assert!(ClientError::value("bad").is_value_error());
        assert!(ClientError::overflow("big").is_overflow_error());
        assert!(ClientError::protocol("tag").is_database_error());
    }

    #[test]
    fn test_display() {
        let err = ClientError::database("Code.X", "boom");
        assert_eq!(err.to_string(), "Database error: Code.X - boom");
        assert_eq!(
            ClientError::interface("cursor closed").to_string(),
            "Interface error: cursor closed"
        );
    }

    #[test]
    fn test_from_bolt_error() {
        let failure = BoltError::Failure {
            code: "Memgraph.TransientError.General.Busy".into(),
            message: "busy".into(),
        };
        let err = ClientError::from(failure);
        assert!(err.is_database_error());
        assert!(err.is_retryable());

        assert!(ClientError::from(BoltError::ConnectionClosed).is_operational_error());
        assert!(ClientError::from(BoltError::Tls("rejected".into())).is_operational_error());
        assert!(matches!(
            ClientError::from(BoltError::PackStream(PackStreamError::InvalidMapKey)),
            ClientError::Protocol(_)
        ));
        let auth = BoltError::Authentication {
            code: "Memgraph.ClientError.Security.Unauthenticated".into(),
            message: "denied".into(),
        };
        assert!(ClientError::from(auth).is_operational_error());
    }
}
