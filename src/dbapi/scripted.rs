//! In-memory session that replays prepared results.

use std::collections::VecDeque;
use std::sync::{Arc, Once};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing_subscriber::EnvFilter;

use crate::bolt::{PackStreamMap, PackStreamValue};

use super::session::{Fetch, Session, SessionError, SessionResult};

/// Log to stderr during tests, filtered by `RUST_LOG`.
pub(crate) fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("bolt_dbapi=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .try_init();
    });
}

/// One prepared answer to a RUN.
#[derive(Debug, Clone, Default)]
pub(crate) struct Script {
    columns: Vec<String>,
    rows: Vec<Vec<PackStreamValue>>,
    run_failure: Option<SessionError>,
    /// The row at this index fails instead of being delivered.
    fail_at: Option<(usize, SessionError)>,
}

impl Script {
    pub(crate) fn rows(columns: &[&str], rows: Vec<Vec<PackStreamValue>>) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
            ..Self::default()
        }
    }

    /// `n` single-column integer rows 0..n.
    pub(crate) fn counting(column: &str, n: i64) -> Self {
        Self::rows(&[column], (0..n).map(|i| vec![PackStreamValue::Integer(i)]).collect())
    }

    pub(crate) fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn run_fails(err: SessionError) -> Self {
        Self {
            run_failure: Some(err),
            ..Self::default()
        }
    }

    pub(crate) fn failing_at(mut self, index: usize, err: SessionError) -> Self {
        self.fail_at = Some((index, err));
        self
    }
}

#[derive(Debug)]
struct Active {
    rows: VecDeque<Vec<PackStreamValue>>,
    fail_at: Option<(usize, SessionError)>,
    served: usize,
    budget: Option<i64>,
}

/// Records every call as a short line, e.g. `RUN MATCH (n) RETURN n db=x`.
pub(crate) type CallLog = Arc<Mutex<Vec<String>>>;

#[derive(Debug, Default)]
pub(crate) struct ScriptedSession {
    scripts: VecDeque<Script>,
    active: Option<Active>,
    /// Failures for the next call with the given name.
    failures: VecDeque<(&'static str, SessionError)>,
    log: CallLog,
    bad: bool,
}

impl ScriptedSession {
    pub(crate) fn new(scripts: Vec<Script>) -> (Self, CallLog) {
        let session = Self {
            scripts: scripts.into(),
            ..Self::default()
        };
        let log = Arc::clone(&session.log);
        (session, log)
    }

    /// Start out as if the transport had already broken.
    pub(crate) fn unusable(mut self) -> Self {
        self.bad = true;
        self
    }

    pub(crate) fn fail_next(mut self, call: &'static str, err: SessionError) -> Self {
        self.failures.push_back((call, err));
        self
    }

    fn record(&mut self, call: &'static str, line: String) -> SessionResult<()> {
        self.log.lock().push(line);
        if self.bad {
            return Err(SessionError::connection("session is bad"));
        }
        if matches!(self.failures.front(), Some((name, _)) if *name == call) {
            if let Some((_, err)) = self.failures.pop_front() {
                return Err(self.fail(err));
            }
        }
        Ok(())
    }

    fn fail(&mut self, err: SessionError) -> SessionError {
        self.active = None;
        if err.is_connection_error() {
            self.bad = true;
        }
        err
    }
}

#[async_trait]
impl Session for ScriptedSession {
    async fn run(
        &mut self,
        query: &str,
        params: PackStreamMap,
        database: Option<&str>,
    ) -> SessionResult<Vec<String>> {
        let mut line = format!("RUN {}", query);
        if !params.is_empty() {
            let keys: Vec<&str> = params.iter().map(|(k, _)| k).collect();
            line.push_str(&format!(" params={}", keys.join(",")));
        }
        if let Some(db) = database {
            line.push_str(&format!(" db={}", db));
        }
        self.record("run", line)?;
        let script = self.scripts.pop_front().unwrap_or_default();
        if let Some(err) = script.run_failure {
            return Err(self.fail(err));
        }
        self.active = Some(Active {
            rows: script.rows.into(),
            fail_at: script.fail_at,
            served: 0,
            budget: Some(0),
        });
        Ok(script.columns)
    }

    async fn pull(&mut self, n: Option<i64>) -> SessionResult<()> {
        let line = match n {
            Some(n) => format!("PULL {}", n),
            None => "PULL -1".to_string(),
        };
        self.record("pull", line)?;
        match self.active.as_mut() {
            Some(active) => {
                active.budget = n;
                Ok(())
            }
            None => Err(self.fail(SessionError::connection("PULL without a result"))),
        }
    }

    async fn fetch(&mut self) -> SessionResult<Fetch> {
        let Some(active) = self.active.as_mut() else {
            return Err(self.fail(SessionError::connection("FETCH without a result")));
        };
        if active.budget == Some(0) || active.rows.is_empty() {
            let has_more = !active.rows.is_empty();
            active.budget = Some(0);
            if !has_more {
                self.active = None;
            }
            return Ok(Fetch::Summary { has_more });
        }
        if matches!(&active.fail_at, Some((i, _)) if *i == active.served) {
            if let Some((_, err)) = active.fail_at.take() {
                return Err(self.fail(err));
            }
        }
        let row = active.rows.pop_front().unwrap_or_default();
        active.served += 1;
        if let Some(budget) = active.budget.as_mut() {
            *budget -= 1;
        }
        Ok(Fetch::Record(row))
    }

    async fn begin(&mut self, database: Option<&str>) -> SessionResult<()> {
        let line = match database {
            Some(db) => format!("BEGIN db={}", db),
            None => "BEGIN".to_string(),
        };
        self.record("begin", line)
    }

    async fn commit(&mut self) -> SessionResult<()> {
        self.record("commit", "COMMIT".to_string())
    }

    async fn rollback(&mut self) -> SessionResult<()> {
        self.record("rollback", "ROLLBACK".to_string())
    }

    async fn reset(&mut self) -> SessionResult<()> {
        self.record("reset", "RESET".to_string())?;
        self.active = None;
        Ok(())
    }

    async fn close(&mut self) {
        self.log.lock().push("CLOSE".to_string());
        self.active = None;
    }

    fn is_bad(&self) -> bool {
        self.bad
    }
}
