//! DB-API Module
//!
//! Bolt 그래프 데이터베이스용 DB-API 2.0 스타일 연결/커서 계층
//!
//! # Components
//!
//! - 값 모델 (Value, Node, Relationship, Path, 시간/공간 타입)
//! - 결과 스트림 (eager: 전부 버퍼링, lazy: 한 건씩 pull)
//! - 커서 (execute, fetchone, fetchmany, fetchall)
//! - 연결 (autocommit, commit, rollback, 데이터베이스 고정)
//!
//! # Example
//!
//! ```ignore
//! use bolt_dbapi::dbapi::{connect, ConnectConfig};
//! use bolt_dbapi::params;
//!
//! let config = ConnectConfig::builder("localhost")
//!     .with_credentials("memgraph", "secret")
//!     .build()?;
//! let conn = connect(config).await?;
//!
//! let mut cursor = conn.cursor()?;
//! cursor
//!     .execute("CREATE (n:Person {name: $name}) RETURN n", Some(params! {"name" => "Alice"}))
//!     .await?;
//! let rows = cursor.fetchall().await?;
//! conn.commit().await?;
//! conn.close().await;
//! ```
//!
//! # Lazy Example
//!
//! ```ignore
//! // lazy 연결은 autocommit이고, 한 번에 한 커서만 결과를 읽을 수 있음
//! let config = ConnectConfig::builder("localhost").with_lazy(true).build()?;
//! let conn = connect(config).await?;
//!
//! let mut cursor = conn.cursor()?;
//! cursor.execute("UNWIND range(1, 1000000) AS n RETURN n", None).await?;
//! while let Some(row) = cursor.fetchone().await? {
//!     println!("{}", row);
//! }
//! cursor.close().await?;
//! ```

pub mod bolt;
mod config;
mod connection;
mod cursor;
mod error;
mod record;
mod session;
mod stream;
mod types;
pub mod wire;

#[cfg(test)]
mod scripted;

// Re-exports
pub use config::{
    ConnectConfig, ConnectConfigBuilder, SslMode, TrustCallback, DEFAULT_CONNECT_TIMEOUT,
    DEFAULT_PORT,
};
pub use connection::{connect, Connection, ConnectionStatus, APILEVEL, PARAMSTYLE, THREADSAFETY};
pub use cursor::{Cursor, CursorStatus};
pub use error::{ClientError, ClientResult};
pub use record::{Column, Record};
pub use session::{Fetch, Session, SessionError, SessionResult};
pub use types::{
    Duration, Node, Path, Point2D, Point3D, Relationship, Value, ValueMap, Zone, ZonedDateTime,
};

/// 파라미터 맵 생성 매크로
#[macro_export]
macro_rules! params {
    () => {
        $crate::dbapi::ValueMap::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::dbapi::ValueMap::new();
        $(
            map.insert($key, $crate::dbapi::Value::from($value));
        )+
        map
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_macro() {
        let empty: ValueMap = params!();
        assert!(empty.is_empty());

        let map = params! {
            "name" => "Alice",
            "age" => 30,
            "tags" => vec!["a", "b"],
        };
        assert_eq!(map.len(), 3);
        assert_eq!(map.get("name"), Some(&Value::from("Alice")));
        assert_eq!(map.get("age").and_then(Value::as_int), Some(30));
    }

    #[tokio::test]
    #[ignore = "requires a running Bolt server on localhost:7687"]
    async fn test_live_server_round_trip() {
        let config = ConnectConfig::builder("localhost").build().unwrap();
        let conn = connect(config).await.unwrap();
        let mut cursor = conn.cursor().unwrap();
        cursor
            .execute("RETURN $x AS x, 6 AS y", Some(params! {"x" => 5}))
            .await
            .unwrap();
        let row = cursor.fetchone().await.unwrap().unwrap();
        assert!(row == [5i64, 6]);
        conn.rollback().await.unwrap();
        conn.close().await;
    }

    #[tokio::test]
    #[ignore = "requires a running Bolt server on localhost:7687"]
    async fn test_live_commit_visibility() {
        let writer = connect(ConnectConfig::builder("localhost").build().unwrap())
            .await
            .unwrap();
        let reader = connect(ConnectConfig::builder("localhost").build().unwrap())
            .await
            .unwrap();
        reader.set_autocommit(true).unwrap();

        let count = |conn: &Connection| {
            let conn = conn.clone();
            async move {
                let mut cursor = conn.cursor().unwrap();
                cursor
                    .execute("MATCH (n:CommitVisibility) RETURN count(n)", None)
                    .await
                    .unwrap();
                cursor.fetchone().await.unwrap().unwrap()[0].as_int().unwrap()
            }
        };

        let mut cursor = reader.cursor().unwrap();
        cursor.execute("MATCH (n:CommitVisibility) DETACH DELETE n", None).await.unwrap();
        cursor.fetchall().await.unwrap();

        let mut cursor = writer.cursor().unwrap();
        cursor.execute("CREATE (:CommitVisibility {id: 1})", None).await.unwrap();
        assert_eq!(writer.status(), ConnectionStatus::InTransaction);
        assert_eq!(count(&reader).await, 0);

        writer.commit().await.unwrap();
        assert_eq!(count(&reader).await, 1);

        writer.close().await;
        reader.close().await;
    }
}
