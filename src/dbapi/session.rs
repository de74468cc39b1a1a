//! Session Boundary
//!
//! 연결/커서 계층이 프로토콜 엔진에 요구하는 기본 동작

use async_trait::async_trait;
use thiserror::Error;

use crate::bolt::{BoltError, PackStreamMap, PackStreamValue};

use super::error::ClientError;

// ============================================================================
// SessionError - 세션 에러
// ============================================================================

/// 세션 에러
///
/// 연결 수준 실패(전송, TLS, 인증)와 문장 수준 실패(컴파일, 실행)를 구분합니다.
/// 문장 수준 실패 후에도 세션은 계속 사용할 수 있어야 합니다.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// 전송 계층 실패 (세션 사용 불가)
    #[error("{0}")]
    Connection(String),

    /// 서버가 요청을 거부함
    #[error("{code}: {message}")]
    Statement { code: String, message: String },
}

impl SessionError {
    /// 연결 에러 생성
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// 문장 에러 생성
    pub fn statement(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Statement {
            code: code.into(),
            message: message.into(),
        }
    }

    /// 연결 수준 실패 여부
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

impl From<BoltError> for SessionError {
    fn from(err: BoltError) -> Self {
        match err {
            BoltError::Failure { code, message } => Self::Statement { code, message },
            other => Self::Connection(other.to_string()),
        }
    }
}

impl From<SessionError> for ClientError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Connection(msg) => ClientError::Operational(msg),
            SessionError::Statement { code, message } => ClientError::Database { code, message },
        }
    }
}

/// 세션 결과 타입
pub type SessionResult<T> = Result<T, SessionError>;

// ============================================================================
// Fetch - 결과 프레임
// ============================================================================

/// PULL 이후 수신한 프레임
#[derive(Debug, Clone, PartialEq)]
pub enum Fetch {
    /// 레코드 한 건
    Record(Vec<PackStreamValue>),
    /// PULL 응답 종료
    Summary {
        /// 서버에 남은 레코드가 있는지 여부
        has_more: bool,
    },
}

// ============================================================================
// Session - 프로토콜 세션
// ============================================================================

/// 프로토콜 세션
///
/// 하나의 세션은 한 번에 하나의 요청만 처리합니다. 호출 순서는
/// `run` → (`pull` → `fetch`* → `Summary`)* 입니다.
///
/// 문장 수준 실패가 보고되면 구현체는 세션을 다시 사용 가능한 상태로
/// 되돌려야 합니다 (열린 트랜잭션은 사라집니다).
#[async_trait]
pub trait Session: Send {
    /// 쿼리 실행, 컬럼 이름 반환
    async fn run(
        &mut self,
        query: &str,
        params: PackStreamMap,
        database: Option<&str>,
    ) -> SessionResult<Vec<String>>;

    /// 레코드 요청 (`None`이면 전부)
    async fn pull(&mut self, n: Option<i64>) -> SessionResult<()>;

    /// 다음 프레임 수신
    async fn fetch(&mut self) -> SessionResult<Fetch>;

    /// 명시적 트랜잭션 시작
    async fn begin(&mut self, database: Option<&str>) -> SessionResult<()>;

    /// 커밋
    async fn commit(&mut self) -> SessionResult<()>;

    /// 롤백
    async fn rollback(&mut self) -> SessionResult<()>;

    /// 진행 중인 결과와 트랜잭션 폐기
    async fn reset(&mut self) -> SessionResult<()>;

    /// 세션 종료
    async fn close(&mut self);

    /// 세션 사용 불가 여부
    fn is_bad(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bolt_error() {
        let failure = BoltError::Failure {
            code: "Memgraph.ClientError.Statement.SyntaxError".into(),
            message: "bad".into(),
        };
        assert!(!SessionError::from(failure).is_connection_error());
        assert!(SessionError::from(BoltError::ConnectionClosed).is_connection_error());
        assert!(SessionError::from(BoltError::Timeout).is_connection_error());
    }

    #[test]
    fn test_into_client_error() {
        let err: ClientError = SessionError::connection("reset by peer").into();
        assert!(err.is_operational_error());

        let err: ClientError = SessionError::statement("Code.X", "boom").into();
        assert!(err.is_database_error());
        assert!(!err.is_operational_error());
        assert_eq!(err.code(), Some("Code.X"));
    }
}
