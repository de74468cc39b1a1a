//! Result Stream
//!
//! 서버 결과를 레코드 단위로 꺼내는 어댑터

use std::collections::VecDeque;
use std::sync::{Arc, Weak};

use tracing::debug;

use super::connection::{ConnectionInner, SessionGuard};
use super::error::{ClientError, ClientResult};
use super::record::Record;
use super::session::Fetch;
use super::wire::decode_record;

/// PULL 한 번과 요약 프레임까지 읽기
///
/// 레코드 디코딩에 실패하면 나머지 결과를 모두 받아 버린 뒤 첫 에러를 반환합니다.
pub(crate) async fn read_result(
    guard: &mut SessionGuard<'_>,
    columns: &Arc<[String]>,
    n: Option<i64>,
) -> ClientResult<(VecDeque<Record>, bool)> {
    guard.pull(n).await?;
    let mut records = VecDeque::new();
    let mut decode_error: Option<ClientError> = None;
    loop {
        match guard.fetch().await? {
            Fetch::Record(fields) => {
                if decode_error.is_some() {
                    continue;
                }
                match decode_record(fields) {
                    Ok(values) => records.push_back(Record::new(Arc::clone(columns), values)),
                    Err(e) => {
                        debug!(error = %e, "record decoding failed, discarding the rest");
                        decode_error = Some(e);
                    }
                }
            }
            Fetch::Summary { has_more } => match decode_error {
                Some(_) if has_more => guard.pull(None).await?,
                Some(err) => {
                    guard.abandon_result().await;
                    return Err(err);
                }
                None => {
                    if !has_more {
                        guard.finish_result();
                    }
                    return Ok((records, has_more));
                }
            },
        }
    }
}

// ============================================================================
// ResultStream - 결과 스트림
// ============================================================================

/// 커서가 소유하는 결과 스트림
pub(crate) enum ResultStream {
    /// 전부 받아 둔 결과
    Eager(VecDeque<Record>),
    /// 한 건씩 당겨 오는 결과
    Pull(PullResult),
}

impl ResultStream {
    pub(crate) fn eager(records: VecDeque<Record>) -> Self {
        ResultStream::Eager(records)
    }

    pub(crate) fn pull(conn: Weak<ConnectionInner>, cursor_id: u64, columns: Arc<[String]>) -> Self {
        ResultStream::Pull(PullResult {
            conn,
            cursor_id,
            columns,
            peeked: None,
            primed: false,
            server_has_more: true,
        })
    }

    /// 다음 레코드
    pub(crate) async fn next(&mut self) -> ClientResult<Option<Record>> {
        match self {
            ResultStream::Eager(records) => Ok(records.pop_front()),
            ResultStream::Pull(pull) => pull.next().await,
        }
    }

    /// 남은 레코드가 있는지 여부
    pub(crate) async fn has_more(&mut self) -> ClientResult<bool> {
        match self {
            ResultStream::Eager(records) => Ok(!records.is_empty()),
            ResultStream::Pull(pull) => pull.has_more().await,
        }
    }

    /// 남은 레코드 전부
    pub(crate) async fn drain(&mut self) -> ClientResult<Vec<Record>> {
        match self {
            ResultStream::Eager(records) => Ok(records.drain(..).collect()),
            ResultStream::Pull(pull) => pull.drain().await,
        }
    }

    /// 서버 쪽 결과가 아직 남아 있어 닫을 수 없는지 여부
    pub(crate) fn is_pending(&self) -> bool {
        match self {
            ResultStream::Eager(_) => false,
            ResultStream::Pull(pull) => {
                !pull.is_exhausted()
                    && pull
                        .conn
                        .upgrade()
                        .map_or(false, |conn| conn.is_streaming(pull.cursor_id))
            }
        }
    }

    /// 전부 받아 둔 결과의 레코드 수
    pub(crate) fn buffered_len(&self) -> Option<usize> {
        match self {
            ResultStream::Eager(records) => Some(records.len()),
            ResultStream::Pull(_) => None,
        }
    }
}

// ============================================================================
// PullResult - 한 건 미리 읽기
// ============================================================================

/// pull 모드 결과
///
/// 다음 레코드 하나를 항상 미리 받아 두어 "더 있는지"를 서버 왕복 없이
/// 답합니다. 그 대가로 어떤 레코드의 수신 실패는 바로 앞 레코드를 요청한
/// `next()`에서 보고됩니다.
pub(crate) struct PullResult {
    conn: Weak<ConnectionInner>,
    cursor_id: u64,
    columns: Arc<[String]>,
    peeked: Option<Record>,
    primed: bool,
    server_has_more: bool,
}

impl PullResult {
    async fn next(&mut self) -> ClientResult<Option<Record>> {
        if !self.primed {
            self.refill().await?;
        }
        let current = self.peeked.take();
        if current.is_some() && self.server_has_more {
            self.refill().await?;
        }
        Ok(current)
    }

    async fn has_more(&mut self) -> ClientResult<bool> {
        if !self.primed {
            self.refill().await?;
        }
        Ok(self.peeked.is_some())
    }

    async fn drain(&mut self) -> ClientResult<Vec<Record>> {
        let mut out: Vec<Record> = self.peeked.take().into_iter().collect();
        if !self.primed || self.server_has_more {
            self.primed = true;
            let records = self.exchange(None).await?;
            out.extend(records);
        }
        Ok(out)
    }

    fn is_exhausted(&self) -> bool {
        self.primed && self.peeked.is_none() && !self.server_has_more
    }

    /// PULL 1 한 번으로 미리 읽기 칸 채우기
    async fn refill(&mut self) -> ClientResult<()> {
        self.primed = true;
        let mut records = self.exchange(Some(1)).await?;
        self.peeked = records.pop_front();
        Ok(())
    }

    async fn exchange(&mut self, n: Option<i64>) -> ClientResult<VecDeque<Record>> {
        let result = match self.conn.upgrade() {
            Some(conn) => match conn.lock().await {
                Ok(mut guard) => read_result(&mut guard, &self.columns, n).await,
                Err(e) => Err(e),
            },
            None => Err(ClientError::interface("connection closed")),
        };
        match result {
            Ok((records, has_more)) => {
                self.server_has_more = has_more;
                Ok(records)
            }
            Err(e) => {
                self.server_has_more = false;
                self.peeked = None;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bolt::{PackStreamStructure, PackStreamValue};
    use crate::dbapi::connection::{Connection, ConnectionStatus};
    use crate::dbapi::scripted::{Script, ScriptedSession};
    use crate::dbapi::session::SessionError;

    #[tokio::test]
    async fn test_pull_reads_one_ahead() {
        let (session, log) = ScriptedSession::new(vec![Script::counting("n", 3)]);
        let conn = Connection::from_session(session, true, None);
        let mut cursor = conn.cursor().unwrap();
        cursor.execute("UNWIND range(0, 2) AS n RETURN n", None).await.unwrap();
        assert_eq!(log.lock().len(), 1);

        let first = cursor.fetchone().await.unwrap().unwrap();
        assert!(first == [0i64]);
        // 첫 레코드와 미리 읽은 두 번째 레코드
        assert_eq!(
            *log.lock(),
            vec!["RUN UNWIND range(0, 2) AS n RETURN n", "PULL 1", "PULL 1"]
        );

        assert!(cursor.fetchone().await.unwrap().unwrap() == [1i64]);
        assert!(cursor.fetchone().await.unwrap().unwrap() == [2i64]);
        assert!(cursor.fetchone().await.unwrap().is_none());
        assert_eq!(log.lock().iter().filter(|l| *l == "PULL 1").count(), 3);
        assert_eq!(conn.status(), ConnectionStatus::Ready);
    }

    #[tokio::test]
    async fn test_failure_surfaces_one_fetch_early() {
        let script = Script::counting("n", 5).failing_at(
            2,
            SessionError::statement("Memgraph.ClientError.Statement.ArithmeticError", "/ by zero"),
        );
        let (session, _) = ScriptedSession::new(vec![script]);
        let conn = Connection::from_session(session, true, None);
        let mut cursor = conn.cursor().unwrap();
        cursor.execute("UNWIND range(0, 4) AS n RETURN 1 / (2 - n)", None).await.unwrap();

        assert!(cursor.fetchone().await.unwrap().unwrap() == [0i64]);
        // 두 번째 레코드는 받았지만 세 번째를 미리 읽다가 실패
        let err = cursor.fetchone().await.unwrap_err();
        assert!(err.is_database_error());
        assert_eq!(conn.status(), ConnectionStatus::Ready);
        assert!(cursor.description().is_none());
        cursor.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_drain_after_peek() {
        let (session, log) = ScriptedSession::new(vec![Script::counting("n", 4)]);
        let conn = Connection::from_session(session, true, None);
        let mut cursor = conn.cursor().unwrap();
        cursor.execute("RETURN n", None).await.unwrap();
        assert!(cursor.fetchone().await.unwrap().unwrap() == [0i64]);

        let rest = cursor.fetchall().await.unwrap();
        assert_eq!(rest.len(), 3);
        assert!(rest[0] == [1i64]);
        assert!(rest[2] == [3i64]);
        assert_eq!(log.lock().last().map(String::as_str), Some("PULL -1"));
        cursor.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_undecodable_record_discards_rest() {
        let rows = vec![
            vec![PackStreamValue::Integer(1)],
            vec![PackStreamValue::Structure(PackStreamStructure::new(0x7F, vec![]))],
            vec![PackStreamValue::Integer(3)],
        ];
        let (session, log) = ScriptedSession::new(vec![
            Script::rows(&["x"], rows),
            Script::counting("y", 1),
        ]);
        let conn = Connection::from_session(session, false, None);
        let mut cursor = conn.cursor().unwrap();

        let err = cursor.execute("RETURN x", None).await.unwrap_err();
        assert!(matches!(err, ClientError::Protocol(_)));
        // 트랜잭션은 RESET으로 정리
        assert_eq!(log.lock().last().map(String::as_str), Some("RESET"));
        assert_eq!(conn.status(), ConnectionStatus::Ready);

        cursor.execute("RETURN y", None).await.unwrap();
        assert!(cursor.fetchone().await.unwrap().unwrap() == [0i64]);
    }
}
