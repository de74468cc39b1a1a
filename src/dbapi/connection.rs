//! Connection
//!
//! 연결 상태 기계와 세션 소유

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, MutexGuard as AsyncMutexGuard};
use tracing::{debug, warn};

use crate::bolt::PackStreamMap;

use super::bolt::BoltSession;
use super::config::ConnectConfig;
use super::cursor::Cursor;
use super::error::{ClientError, ClientResult};
use super::record::Column;
use super::session::{Fetch, Session, SessionError};
use super::stream::{read_result, ResultStream};
use super::types::ValueMap;
use super::wire::encode_params;

/// DB-API 버전
pub const APILEVEL: &str = "2.0";

/// 스레드 안전성 수준 (모듈은 공유 가능, 연결은 공유 불가)
pub const THREADSAFETY: u8 = 1;

/// 파라미터 표기 방식 (`$name`)
pub const PARAMSTYLE: &str = "cypher";

// ============================================================================
// ConnectionStatus - 연결 상태
// ============================================================================

/// 연결 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// 요청 가능
    Ready,
    /// 결과 스트림 진행 중 (pull 모드)
    Executing,
    /// 명시적 트랜잭션 진행 중
    InTransaction,
    /// 닫힘
    Closed,
    /// 전송 계층 실패로 사용 불가
    Bad,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionStatus::Ready => "ready",
            ConnectionStatus::Executing => "executing",
            ConnectionStatus::InTransaction => "in transaction",
            ConnectionStatus::Closed => "closed",
            ConnectionStatus::Bad => "bad",
        };
        f.write_str(s)
    }
}

#[derive(Debug)]
pub(crate) struct ConnectionState {
    pub(crate) status: ConnectionStatus,
    pub(crate) autocommit: bool,
    /// pull 스트림을 가진 커서
    pub(crate) active_cursor: Option<u64>,
    /// 활성 커서가 스트림을 비우지 않고 사라짐
    pub(crate) orphaned: bool,
}

// ============================================================================
// ConnectionInner - 공유 상태
// ============================================================================

pub(crate) struct ConnectionInner {
    session: AsyncMutex<Option<Box<dyn Session>>>,
    state: Mutex<ConnectionState>,
    lazy: bool,
    database: Option<String>,
    cursor_ids: AtomicU64,
}

impl ConnectionInner {
    /// 세션 잠금 (닫힘/불량 확인 포함)
    pub(crate) async fn lock(&self) -> ClientResult<SessionGuard<'_>> {
        let slot = self.session.lock().await;
        if slot.as_ref().is_some_and(|session| session.is_bad()) {
            self.mark_bad();
        }
        let guard = SessionGuard { slot, inner: self };
        self.ensure_usable()?;
        Ok(guard)
    }

    fn ensure_usable(&self) -> ClientResult<()> {
        match self.state.lock().status {
            ConnectionStatus::Closed => Err(ClientError::interface("connection closed")),
            ConnectionStatus::Bad => Err(ClientError::interface("bad connection")),
            _ => Ok(()),
        }
    }

    pub(crate) fn lazy(&self) -> bool {
        self.lazy
    }

    pub(crate) fn next_cursor_id(&self) -> u64 {
        self.cursor_ids.fetch_add(1, Ordering::Relaxed)
    }

    /// 이 커서의 결과를 아직 읽는 중인지 여부
    pub(crate) fn is_streaming(&self, cursor_id: u64) -> bool {
        let state = self.state.lock();
        state.status == ConnectionStatus::Executing && state.active_cursor == Some(cursor_id)
    }

    /// 커서가 사라질 때 호출
    pub(crate) fn cursor_dropped(&self, cursor_id: u64) {
        let mut state = self.state.lock();
        if state.status == ConnectionStatus::Executing && state.active_cursor == Some(cursor_id) {
            debug!(cursor_id, "cursor dropped with a pending result");
            state.orphaned = true;
        }
    }

    fn status(&self) -> ConnectionStatus {
        self.state.lock().status
    }

    /// 세션이 스스로 사용 불가를 보고함
    fn mark_bad(&self) {
        let mut state = self.state.lock();
        if !matches!(state.status, ConnectionStatus::Closed | ConnectionStatus::Bad) {
            warn!("session reports itself unusable, connection marked bad");
            state.status = ConnectionStatus::Bad;
        }
        state.active_cursor = None;
        state.orphaned = false;
    }

    /// 세션 실패 반영
    fn session_failed(&self, err: SessionError) -> ClientError {
        let mut state = self.state.lock();
        if state.status != ConnectionStatus::Closed {
            state.status = if err.is_connection_error() {
                warn!(error = %err, "session failed, connection marked bad");
                ConnectionStatus::Bad
            } else {
                ConnectionStatus::Ready
            };
        }
        state.active_cursor = None;
        state.orphaned = false;
        err.into()
    }

    /// 쿼리 실행 시작
    ///
    /// 상태 확인을 통과하면 `on_accepted`를 호출한 뒤 파라미터를 인코딩하고
    /// 서버에 요청합니다.
    pub(crate) async fn execute(
        self: &Arc<Self>,
        cursor_id: u64,
        query: &str,
        params: Option<&ValueMap>,
        on_accepted: impl FnOnce(),
    ) -> ClientResult<(Vec<Column>, ResultStream)> {
        let mut guard = self.lock().await?;

        let orphaned = {
            let state = self.state.lock();
            match (state.status, state.orphaned) {
                (ConnectionStatus::Executing, true) => true,
                (ConnectionStatus::Executing, false) => {
                    return Err(ClientError::interface(
                        "cannot call execute during execution of a query",
                    ))
                }
                _ => false,
            }
        };
        if orphaned {
            warn!("discarding the pending result of a dropped cursor");
            guard.reset().await?;
            let mut state = self.state.lock();
            state.status = ConnectionStatus::Ready;
            state.active_cursor = None;
            state.orphaned = false;
        }

        on_accepted();
        let params = match params {
            Some(params) => encode_params(params)?,
            None => PackStreamMap::new(),
        };

        if let Some(db) = &self.database {
            if is_database_switch(query) {
                return Err(ClientError::database(
                    "ClientError.MultiDatabase.SwitchForbidden",
                    format!("connection is bound to database '{}'", db),
                ));
            }
        }

        let begin = {
            let state = self.state.lock();
            !self.lazy && !state.autocommit && state.status == ConnectionStatus::Ready
        };
        if begin {
            guard.begin(self.database.as_deref()).await?;
            self.state.lock().status = ConnectionStatus::InTransaction;
        }

        // 트랜잭션 안의 RUN은 BEGIN에서 지정한 데이터베이스를 따릅니다.
        let run_database = match self.status() {
            ConnectionStatus::InTransaction => None,
            _ => self.database.as_deref(),
        };
        self.state.lock().status = ConnectionStatus::Executing;
        debug!(cursor_id, lazy = self.lazy, "running query");
        let names = guard.run(query, params, run_database).await?;
        let description = names.iter().map(Column::new).collect();
        let columns: Arc<[String]> = names.into();

        if self.lazy {
            let mut state = self.state.lock();
            state.active_cursor = Some(cursor_id);
            state.orphaned = false;
            return Ok((description, ResultStream::pull(Arc::downgrade(self), cursor_id, columns)));
        }

        let (records, _) = read_result(&mut guard, &columns, None).await?;
        Ok((description, ResultStream::eager(records)))
    }
}

/// `USE DATABASE name` 여부
fn is_database_switch(query: &str) -> bool {
    let mut words = query.split_whitespace();
    matches!(
        (words.next(), words.next()),
        (Some(a), Some(b)) if a.eq_ignore_ascii_case("use") && b.eq_ignore_ascii_case("database")
    )
}

// ============================================================================
// SessionGuard - 왕복 요청 동안의 세션 잠금
// ============================================================================

/// 잠긴 세션
///
/// 모든 세션 에러는 여기서 연결 상태에 반영됩니다.
pub(crate) struct SessionGuard<'a> {
    slot: AsyncMutexGuard<'a, Option<Box<dyn Session>>>,
    inner: &'a ConnectionInner,
}

impl SessionGuard<'_> {
    fn session(&mut self) -> ClientResult<&mut (dyn Session + 'static)> {
        self.slot
            .as_deref_mut()
            .ok_or_else(|| ClientError::interface("connection closed"))
    }

    pub(crate) async fn run(
        &mut self,
        query: &str,
        params: PackStreamMap,
        database: Option<&str>,
    ) -> ClientResult<Vec<String>> {
        let result = self.session()?.run(query, params, database).await;
        result.map_err(|e| self.inner.session_failed(e))
    }

    pub(crate) async fn pull(&mut self, n: Option<i64>) -> ClientResult<()> {
        let result = self.session()?.pull(n).await;
        result.map_err(|e| self.inner.session_failed(e))
    }

    pub(crate) async fn fetch(&mut self) -> ClientResult<Fetch> {
        let result = self.session()?.fetch().await;
        result.map_err(|e| self.inner.session_failed(e))
    }

    pub(crate) async fn begin(&mut self, database: Option<&str>) -> ClientResult<()> {
        let result = self.session()?.begin(database).await;
        result.map_err(|e| self.inner.session_failed(e))
    }

    pub(crate) async fn commit(&mut self) -> ClientResult<()> {
        let result = self.session()?.commit().await;
        result.map_err(|e| self.inner.session_failed(e))
    }

    pub(crate) async fn rollback(&mut self) -> ClientResult<()> {
        let result = self.session()?.rollback().await;
        result.map_err(|e| self.inner.session_failed(e))
    }

    pub(crate) async fn reset(&mut self) -> ClientResult<()> {
        let result = self.session()?.reset().await;
        result.map_err(|e| self.inner.session_failed(e))
    }

    /// 결과 스트림 정상 종료
    pub(crate) fn finish_result(&self) {
        let mut state = self.inner.state.lock();
        if state.status == ConnectionStatus::Executing {
            state.status = if state.autocommit {
                ConnectionStatus::Ready
            } else {
                ConnectionStatus::InTransaction
            };
        }
        state.active_cursor = None;
        state.orphaned = false;
    }

    /// 디코딩 실패 후 복구
    ///
    /// 결과는 이미 비워진 상태입니다. 열린 트랜잭션은 RESET으로 버립니다.
    pub(crate) async fn abandon_result(&mut self) {
        let in_transaction = !self.inner.state.lock().autocommit;
        if in_transaction {
            if let Err(e) = self.reset().await {
                warn!(error = %e, "reset after undecodable result failed");
                return;
            }
        }
        let mut state = self.inner.state.lock();
        if state.status == ConnectionStatus::Executing || state.status == ConnectionStatus::InTransaction {
            state.status = ConnectionStatus::Ready;
        }
        state.active_cursor = None;
        state.orphaned = false;
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        // close()가 진행 중인 요청 때문에 세션을 가져가지 못한 경우
        if self.inner.state.lock().status == ConnectionStatus::Closed {
            if let Some(session) = self.slot.take() {
                debug!("releasing session of a closed connection");
                drop(session);
            }
        }
    }
}

// ============================================================================
// Connection - 연결
// ============================================================================

/// 데이터베이스 연결
///
/// 복제 비용이 낮고 태스크 사이에 공유할 수 있지만, 세션은 하나이므로
/// 요청은 차례대로 처리됩니다.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<ConnectionInner>,
}

impl Connection {
    /// 세션으로 연결 생성
    ///
    /// `lazy`이면 결과를 한 건씩 가져오고 autocommit이 항상 켜집니다.
    pub fn from_session(
        session: impl Session + 'static,
        lazy: bool,
        database: Option<String>,
    ) -> Self {
        Self {
            inner: Arc::new(ConnectionInner {
                session: AsyncMutex::new(Some(Box::new(session))),
                state: Mutex::new(ConnectionState {
                    status: ConnectionStatus::Ready,
                    autocommit: lazy,
                    active_cursor: None,
                    orphaned: false,
                }),
                lazy,
                database,
                cursor_ids: AtomicU64::new(1),
            }),
        }
    }

    /// 커서 생성
    pub fn cursor(&self) -> ClientResult<Cursor> {
        if self.inner.status() == ConnectionStatus::Closed {
            return Err(ClientError::interface("connection closed"));
        }
        Ok(Cursor::new(&self.inner))
    }

    /// 커밋
    ///
    /// autocommit이거나 열린 트랜잭션이 없으면 아무것도 하지 않습니다.
    pub async fn commit(&self) -> ClientResult<()> {
        self.end_transaction(true).await
    }

    /// 롤백
    pub async fn rollback(&self) -> ClientResult<()> {
        self.end_transaction(false).await
    }

    async fn end_transaction(&self, commit: bool) -> ClientResult<()> {
        let mut guard = self.inner.lock().await?;
        {
            let state = self.inner.state.lock();
            if state.status != ConnectionStatus::InTransaction || state.autocommit {
                return Ok(());
            }
        }
        if commit {
            debug!("committing transaction");
            guard.commit().await?;
        } else {
            debug!("rolling back transaction");
            guard.rollback().await?;
        }
        self.inner.state.lock().status = ConnectionStatus::Ready;
        Ok(())
    }

    /// 연결 종료
    ///
    /// 여러 번 호출해도 안전하며 커밋하지 않습니다. 다른 태스크가 요청 중이면
    /// 세션은 그 요청이 끝날 때 해제됩니다.
    pub async fn close(&self) {
        {
            let mut state = self.inner.state.lock();
            if state.status == ConnectionStatus::Closed {
                return;
            }
            state.status = ConnectionStatus::Closed;
            state.active_cursor = None;
            state.orphaned = false;
        }
        let session = match self.inner.session.try_lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => None,
        };
        if let Some(mut session) = session {
            session.close().await;
        }
        debug!("connection closed");
    }

    /// 연결 상태
    pub fn status(&self) -> ConnectionStatus {
        self.inner.status()
    }

    /// 닫힘 여부
    pub fn is_closed(&self) -> bool {
        self.status() == ConnectionStatus::Closed
    }

    /// autocommit 여부
    pub fn autocommit(&self) -> bool {
        self.inner.state.lock().autocommit
    }

    /// autocommit 설정
    pub fn set_autocommit(&self, autocommit: bool) -> ClientResult<()> {
        let mut state = self.inner.state.lock();
        match state.status {
            ConnectionStatus::Closed => return Err(ClientError::interface("connection closed")),
            ConnectionStatus::Bad => return Err(ClientError::interface("bad connection")),
            _ => {}
        }
        if self.inner.lazy {
            return Err(ClientError::interface(
                "autocommit is always enabled in lazy mode",
            ));
        }
        if matches!(
            state.status,
            ConnectionStatus::Executing | ConnectionStatus::InTransaction
        ) {
            return Err(ClientError::interface(
                "cannot change autocommit property while in a transaction",
            ));
        }
        state.autocommit = autocommit;
        Ok(())
    }

    /// autocommit 속성 삭제 (지원하지 않음)
    pub fn clear_autocommit(&self) -> ClientResult<()> {
        Err(ClientError::interface("cannot delete autocommit property"))
    }

    /// pull 모드 여부
    pub fn lazy(&self) -> bool {
        self.inner.lazy()
    }

    /// 고정 데이터베이스
    pub fn database(&self) -> Option<&str> {
        self.inner.database.as_deref()
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("status", &self.status())
            .field("autocommit", &self.autocommit())
            .field("lazy", &self.inner.lazy)
            .field("database", &self.inner.database)
            .finish()
    }
}

/// 서버에 연결
pub async fn connect(config: ConnectConfig) -> ClientResult<Connection> {
    let session = BoltSession::connect(&config).await?;
    debug!(
        host = config.server_name(),
        port = config.port,
        lazy = config.lazy,
        "connection established"
    );
    Ok(Connection::from_session(
        session,
        config.lazy,
        config.database.clone(),
    ))
}
