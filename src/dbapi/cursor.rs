//! Cursor
//!
//! 쿼리 실행과 결과 조회

use std::fmt;
use std::sync::{Arc, Weak};

use futures::stream::{self, Stream};
use tracing::debug;

use super::connection::ConnectionInner;
use super::error::{ClientError, ClientResult};
use super::record::{Column, Record};
use super::stream::ResultStream;
use super::types::ValueMap;

/// 커서 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorStatus {
    /// 결과 없음
    Idle,
    /// 결과 보유
    HasResult,
    /// 닫힘
    Closed,
}

// ============================================================================
// Cursor - 커서
// ============================================================================

/// 커서
///
/// 연결을 약하게 참조하므로 커서가 연결을 살려 두지 않습니다.
///
/// # Example
///
/// ```rust,ignore
/// let mut cursor = conn.cursor()?;
/// cursor.execute("RETURN 5 AS x, 6 AS y", None).await?;
/// let row = cursor.fetchone().await?;
/// ```
pub struct Cursor {
    conn: Weak<ConnectionInner>,
    id: u64,
    closed: bool,
    description: Option<Vec<Column>>,
    rowcount: i64,
    arraysize: u64,
    results: Option<ResultStream>,
}

impl Cursor {
    pub(crate) fn new(conn: &Arc<ConnectionInner>) -> Self {
        Self {
            conn: Arc::downgrade(conn),
            id: conn.next_cursor_id(),
            closed: false,
            description: None,
            rowcount: -1,
            arraysize: 1,
            results: None,
        }
    }

    /// 쿼리 실행
    ///
    /// 이전 결과와 컬럼 설명은 버려집니다. 파라미터는 `$name`으로 참조합니다.
    pub async fn execute(&mut self, query: &str, params: Option<ValueMap>) -> ClientResult<()> {
        if self.closed {
            return Err(ClientError::interface("cursor closed"));
        }
        let conn = self
            .conn
            .upgrade()
            .ok_or_else(|| ClientError::interface("connection closed"))?;

        // 연결 상태 확인을 통과해야 이전 결과를 버림
        let mut accepted = false;
        let result = conn
            .execute(self.id, query, params.as_ref(), || accepted = true)
            .await;
        if accepted {
            self.reset();
        }
        let (description, results) = result?;
        self.rowcount = results
            .buffered_len()
            .and_then(|n| i64::try_from(n).ok())
            .unwrap_or(-1);
        self.description = Some(description);
        self.results = Some(results);
        Ok(())
    }

    /// 레코드 한 건 조회 (끝이면 `None`)
    pub async fn fetchone(&mut self) -> ClientResult<Option<Record>> {
        let results = self.results_mut()?;
        let result = results.next().await;
        self.reset_on_error(result)
    }

    /// 최대 `size`건 조회 (`None`이면 `arraysize`)
    pub async fn fetchmany(&mut self, size: Option<u64>) -> ClientResult<Vec<Record>> {
        let size = size.unwrap_or(self.arraysize);
        if size > u64::from(u32::MAX) {
            return Err(ClientError::overflow(format!(
                "fetch size {} does not fit in 32 bits",
                size
            )));
        }
        let results = self.results_mut()?;
        let mut records = Vec::new();
        let mut result = Ok(());
        for _ in 0..size {
            match results.next().await {
                Ok(Some(record)) => records.push(record),
                Ok(None) => break,
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }
        self.reset_on_error(result)?;
        Ok(records)
    }

    /// 남은 레코드 전부 조회
    pub async fn fetchall(&mut self) -> ClientResult<Vec<Record>> {
        let results = self.results_mut()?;
        let result = results.drain().await;
        self.reset_on_error(result)
    }

    /// 남은 레코드가 있는지 여부
    ///
    /// pull 모드에서는 아직 받지 않은 레코드를 한 건 미리 읽을 수 있습니다.
    pub async fn has_more(&mut self) -> ClientResult<bool> {
        let results = self.results_mut()?;
        let result = results.has_more().await;
        self.reset_on_error(result)
    }

    /// 커서 닫기
    ///
    /// pull 모드에서 결과를 끝까지 읽지 않았으면 실패합니다.
    pub async fn close(&mut self) -> ClientResult<()> {
        if self.closed {
            return Ok(());
        }
        if self.results.as_ref().is_some_and(ResultStream::is_pending) {
            return Err(ClientError::interface(
                "cannot close cursor during execution of a query",
            ));
        }
        self.reset();
        self.closed = true;
        debug!(cursor_id = self.id, "cursor closed");
        Ok(())
    }

    /// 레코드 스트림으로 변환
    ///
    /// 에러가 나면 그 에러를 마지막 항목으로 내보내고 끝납니다.
    pub fn into_stream(self) -> impl Stream<Item = ClientResult<Record>> {
        stream::unfold(Some(self), |state| async move {
            let mut cursor = state?;
            match cursor.fetchone().await {
                Ok(Some(record)) => Some((Ok(record), Some(cursor))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }

    /// 입력 크기 지정 (아무 동작 안 함)
    pub fn setinputsizes(&self, _sizes: &[Option<u32>]) -> ClientResult<()> {
        self.ensure_open()
    }

    /// 출력 크기 지정 (아무 동작 안 함)
    pub fn setoutputsizes(&self, _size: u32, _column: Option<usize>) -> ClientResult<()> {
        self.ensure_open()
    }

    /// 마지막 실행의 컬럼 설명
    pub fn description(&self) -> Option<&[Column]> {
        self.description.as_deref()
    }

    /// 결과 행 수 (알 수 없으면 -1)
    pub fn rowcount(&self) -> i64 {
        self.rowcount
    }

    /// `fetchmany` 기본 크기
    pub fn arraysize(&self) -> u64 {
        self.arraysize
    }

    /// `fetchmany` 기본 크기 설정
    pub fn set_arraysize(&mut self, arraysize: u64) {
        self.arraysize = arraysize;
    }

    /// 커서 상태
    pub fn status(&self) -> CursorStatus {
        if self.closed {
            CursorStatus::Closed
        } else if self.results.is_some() {
            CursorStatus::HasResult
        } else {
            CursorStatus::Idle
        }
    }

    /// 닫힘 여부
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> ClientResult<()> {
        if self.closed {
            Err(ClientError::interface("cursor closed"))
        } else {
            Ok(())
        }
    }

    fn results_mut(&mut self) -> ClientResult<&mut ResultStream> {
        self.ensure_open()?;
        self.results
            .as_mut()
            .ok_or_else(|| ClientError::interface("no results available"))
    }

    fn reset(&mut self) {
        self.description = None;
        self.rowcount = -1;
        self.results = None;
    }

    fn reset_on_error<T>(&mut self, result: ClientResult<T>) -> ClientResult<T> {
        if result.is_err() {
            self.reset();
        }
        result
    }
}

impl Drop for Cursor {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.upgrade() {
            conn.cursor_dropped(self.id);
        }
    }
}

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("id", &self.id)
            .field("status", &self.status())
            .field("description", &self.description)
            .field("rowcount", &self.rowcount)
            .field("arraysize", &self.arraysize)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bolt::PackStreamValue;
    use crate::dbapi::connection::{Connection, ConnectionStatus};
    use crate::dbapi::scripted::{init_tracing, Script, ScriptedSession};
    use crate::dbapi::session::SessionError;
    use crate::dbapi::types::Node;
    use futures::StreamExt;

    fn x_y() -> Script {
        Script::rows(
            &["x", "y"],
            vec![vec![PackStreamValue::Integer(5), PackStreamValue::Integer(6)]],
        )
    }

    #[tokio::test]
    async fn test_execute_and_fetchone() {
        for lazy in [false, true] {
            let (session, _) = ScriptedSession::new(vec![x_y()]);
            let conn = Connection::from_session(session, lazy, None);
            let mut cursor = conn.cursor().unwrap();
            assert_eq!(cursor.status(), CursorStatus::Idle);

            cursor.execute("RETURN 5 AS x, 6 AS y", None).await.unwrap();
            let names: Vec<&str> = cursor
                .description()
                .unwrap()
                .iter()
                .map(|c| c.name.as_str())
                .collect();
            assert_eq!(names, vec!["x", "y"]);
            assert_eq!(cursor.status(), CursorStatus::HasResult);

            let row = cursor.fetchone().await.unwrap().unwrap();
            assert!(row == [5i64, 6]);
            assert!(cursor.fetchone().await.unwrap().is_none());
            assert!(cursor.fetchone().await.unwrap().is_none());
            cursor.close().await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_rowcount() {
        let (session, _) = ScriptedSession::new(vec![Script::counting("n", 3), Script::counting("n", 3)]);
        let conn = Connection::from_session(session, false, None);
        let mut cursor = conn.cursor().unwrap();
        assert_eq!(cursor.rowcount(), -1);
        cursor.execute("UNWIND range(1, 3) AS n RETURN n", None).await.unwrap();
        assert_eq!(cursor.rowcount(), 3);

        let (session, _) = ScriptedSession::new(vec![Script::counting("n", 3)]);
        let lazy = Connection::from_session(session, true, None);
        let mut cursor = lazy.cursor().unwrap();
        cursor.execute("UNWIND range(1, 3) AS n RETURN n", None).await.unwrap();
        assert_eq!(cursor.rowcount(), -1);
    }

    #[tokio::test]
    async fn test_fetch_variants_agree() {
        for lazy in [false, true] {
            let scripts = vec![Script::counting("n", 5); 4];
            let (session, _) = ScriptedSession::new(scripts);
            let conn = Connection::from_session(session, lazy, None);
            conn.set_autocommit(true).ok();
            let mut cursor = conn.cursor().unwrap();

            cursor.execute("Q", None).await.unwrap();
            let all = cursor.fetchall().await.unwrap();

            cursor.execute("Q", None).await.unwrap();
            let mut one_by_one = Vec::new();
            while let Some(record) = cursor.fetchone().await.unwrap() {
                one_by_one.push(record);
            }

            cursor.execute("Q", None).await.unwrap();
            let mut batched = Vec::new();
            loop {
                let batch = cursor.fetchmany(Some(2)).await.unwrap();
                if batch.is_empty() {
                    break;
                }
                batched.extend(batch);
            }

            cursor.execute("Q", None).await.unwrap();
            cursor.set_arraysize(3);
            let first = cursor.fetchmany(None).await.unwrap();
            assert_eq!(first.len(), 3);
            let rest = cursor.fetchall().await.unwrap();

            assert_eq!(all.len(), 5);
            assert_eq!(all, one_by_one);
            assert_eq!(all, batched);
            assert_eq!(all, [first, rest].concat());
        }
    }

    #[tokio::test]
    async fn test_fetch_without_results() {
        let (session, _) = ScriptedSession::new(vec![]);
        let conn = Connection::from_session(session, false, None);
        let mut cursor = conn.cursor().unwrap();
        assert!(cursor.fetchone().await.unwrap_err().is_interface_error());
        assert!(cursor.fetchall().await.unwrap_err().is_interface_error());
        assert!(cursor.fetchmany(None).await.unwrap_err().is_interface_error());
    }

    #[tokio::test]
    async fn test_fetchmany_overflow() {
        let (session, log) = ScriptedSession::new(vec![Script::counting("n", 2)]);
        let conn = Connection::from_session(session, true, None);
        let mut cursor = conn.cursor().unwrap();
        cursor.execute("Q", None).await.unwrap();

        let err = cursor.fetchmany(Some(u64::from(u32::MAX) + 1)).await.unwrap_err();
        assert!(err.is_overflow_error());
        assert_eq!(log.lock().len(), 1);
        // 스트림은 그대로
        assert_eq!(cursor.fetchall().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_execute_clears_description() {
        let (session, _) = ScriptedSession::new(vec![
            x_y(),
            Script::run_fails(SessionError::statement(
                "Memgraph.ClientError.MemgraphError.MemgraphError",
                "Invalid input 'RETRUN'",
            )),
        ]);
        let conn = Connection::from_session(session, false, None);
        let mut cursor = conn.cursor().unwrap();
        cursor.execute("RETURN 5 AS x, 6 AS y", None).await.unwrap();
        assert!(cursor.description().is_some());

        let err = cursor.execute("RETRUN 1", None).await.unwrap_err();
        assert!(err.is_database_error());
        assert!(cursor.description().is_none());
        assert_eq!(cursor.rowcount(), -1);
        assert_eq!(cursor.status(), CursorStatus::Idle);
        assert_eq!(conn.status(), ConnectionStatus::Ready);
    }

    #[tokio::test]
    async fn test_closed_cursor() {
        let (session, _) = ScriptedSession::new(vec![]);
        let conn = Connection::from_session(session, false, None);
        let mut cursor = conn.cursor().unwrap();
        cursor.close().await.unwrap();
        cursor.close().await.unwrap();
        assert!(cursor.is_closed());

        let err = cursor.execute("RETURN 1", None).await.unwrap_err();
        assert_eq!(err.to_string(), "Interface error: cursor closed");
        assert!(cursor.fetchone().await.unwrap_err().is_interface_error());
        assert!(cursor.setinputsizes(&[]).unwrap_err().is_interface_error());
        assert!(cursor.setoutputsizes(10, None).unwrap_err().is_interface_error());
    }

    #[tokio::test]
    async fn test_size_hints_are_noops() {
        let (session, log) = ScriptedSession::new(vec![]);
        let conn = Connection::from_session(session, false, None);
        let cursor = conn.cursor().unwrap();
        cursor.setinputsizes(&[Some(10), None]).unwrap();
        cursor.setoutputsizes(100, Some(0)).unwrap();
        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn test_cursor_after_connection_closed() {
        let (session, _) = ScriptedSession::new(vec![Script::counting("n", 3)]);
        let conn = Connection::from_session(session, true, None);
        let mut cursor = conn.cursor().unwrap();
        cursor.execute("Q", None).await.unwrap();
        conn.close().await;

        assert!(cursor.fetchone().await.unwrap_err().is_interface_error());
        let err = cursor.execute("Q", None).await.unwrap_err();
        assert_eq!(err.to_string(), "Interface error: connection closed");
        cursor.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_connection_checks_precede_parameter_encoding() {
        let node_param = || {
            let mut params = ValueMap::new();
            params.insert("n", Node::new(1, ["A"], ValueMap::new()));
            Some(params)
        };

        let (session, log) = ScriptedSession::new(vec![]);
        let conn = Connection::from_session(session, false, None);
        let mut cursor = conn.cursor().unwrap();
        let err = cursor.execute("RETURN $n", node_param()).await.unwrap_err();
        assert!(err.is_value_error());
        assert!(log.lock().is_empty());

        conn.close().await;
        let err = cursor.execute("RETURN $n", node_param()).await.unwrap_err();
        assert_eq!(err.to_string(), "Interface error: connection closed");

        let (session, _) = ScriptedSession::new(vec![]);
        let conn = Connection::from_session(session.unusable(), false, None);
        let mut cursor = conn.cursor().unwrap();
        let err = cursor.execute("RETURN $n", node_param()).await.unwrap_err();
        assert_eq!(err.to_string(), "Interface error: bad connection");
    }

    #[tokio::test]
    async fn test_cursor_outlives_connection() {
        let (session, _) = ScriptedSession::new(vec![]);
        let conn = Connection::from_session(session, false, None);
        let mut cursor = conn.cursor().unwrap();
        drop(conn);
        let err = cursor.execute("RETURN 1", None).await.unwrap_err();
        assert_eq!(err.to_string(), "Interface error: connection closed");
    }

    #[tokio::test]
    async fn test_close_during_pull_fails() {
        let (session, _) = ScriptedSession::new(vec![Script::counting("n", 10)]);
        let conn = Connection::from_session(session, true, None);
        let mut busy = conn.cursor().unwrap();
        let mut idle = conn.cursor().unwrap();
        busy.execute("UNWIND range(1, 10) AS n RETURN n", None).await.unwrap();

        let err = busy.close().await.unwrap_err();
        assert!(err.is_interface_error());
        assert_eq!(
            err.to_string(),
            "Interface error: cannot close cursor during execution of a query"
        );
        idle.close().await.unwrap();

        assert_eq!(busy.fetchall().await.unwrap().len(), 10);
        busy.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_second_cursor_cannot_execute_during_pull() {
        let (session, _) = ScriptedSession::new(vec![Script::counting("n", 4), Script::counting("m", 1)]);
        let conn = Connection::from_session(session, true, None);
        let mut first = conn.cursor().unwrap();
        let mut second = conn.cursor().unwrap();
        first.execute("Q1", None).await.unwrap();
        assert!(first.fetchone().await.unwrap().is_some());

        let err = second.execute("Q2", None).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Interface error: cannot call execute during execution of a query"
        );
        // 실패한 execute는 첫 커서의 결과를 건드리지 않음
        assert_eq!(first.fetchall().await.unwrap().len(), 3);

        second.execute("Q2", None).await.unwrap();
        assert_eq!(second.fetchall().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_same_cursor_cannot_restart_during_pull() {
        let (session, _) = ScriptedSession::new(vec![Script::counting("n", 4)]);
        let conn = Connection::from_session(session, true, None);
        let mut cursor = conn.cursor().unwrap();
        cursor.execute("Q1", None).await.unwrap();

        let err = cursor.execute("Q2", None).await.unwrap_err();
        assert!(err.is_interface_error());
        assert!(cursor.description().is_some());
        assert_eq!(cursor.fetchall().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_dropped_cursor_result_is_discarded() {
        init_tracing();
        let (session, log) = ScriptedSession::new(vec![Script::counting("n", 10), Script::counting("m", 1)]);
        let conn = Connection::from_session(session, true, None);
        {
            let mut cursor = conn.cursor().unwrap();
            cursor.execute("Q1", None).await.unwrap();
            cursor.fetchone().await.unwrap();
        }
        assert_eq!(conn.status(), ConnectionStatus::Executing);

        let mut cursor = conn.cursor().unwrap();
        cursor.execute("Q2", None).await.unwrap();
        assert!(log.lock().iter().any(|l| l == "RESET"));
        assert_eq!(cursor.fetchall().await.unwrap().len(), 1);
        assert_eq!(conn.status(), ConnectionStatus::Ready);
    }

    #[tokio::test]
    async fn test_commit_is_noop_while_executing() {
        let (session, log) = ScriptedSession::new(vec![Script::counting("n", 2)]);
        let conn = Connection::from_session(session, true, None);
        let mut cursor = conn.cursor().unwrap();
        cursor.execute("Q", None).await.unwrap();
        conn.commit().await.unwrap();
        conn.rollback().await.unwrap();
        assert_eq!(conn.status(), ConnectionStatus::Executing);
        assert!(!log.lock().iter().any(|l| l == "COMMIT" || l == "ROLLBACK"));

        cursor.fetchall().await.unwrap();
        assert_eq!(conn.status(), ConnectionStatus::Ready);
    }

    #[tokio::test]
    async fn test_into_stream() {
        let (session, _) = ScriptedSession::new(vec![Script::counting("n", 3)]);
        let conn = Connection::from_session(session, true, None);
        let mut cursor = conn.cursor().unwrap();
        cursor.execute("Q", None).await.unwrap();

        let values: Vec<i64> = cursor
            .into_stream()
            .map(|r| r.unwrap()[0].as_int().unwrap())
            .collect()
            .await;
        assert_eq!(values, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_into_stream_ends_after_error() {
        init_tracing();
        let script = Script::counting("n", 5).failing_at(1, SessionError::connection("reset by peer"));
        let (session, _) = ScriptedSession::new(vec![script]);
        let conn = Connection::from_session(session, true, None);
        let mut cursor = conn.cursor().unwrap();
        cursor.execute("Q", None).await.unwrap();

        let items: Vec<ClientResult<Record>> = cursor.into_stream().collect().await;
        assert_eq!(items.len(), 1);
        assert!(items[0].as_ref().unwrap_err().is_operational_error());
        assert_eq!(conn.status(), ConnectionStatus::Bad);
    }
}
