//! Record - 쿼리 결과 레코드
//!
//! 결과 행과 컬럼 메타데이터

use std::fmt;
use std::ops::Index;
use std::sync::Arc;

use serde::Serialize;

use super::error::{ClientError, ClientResult};
use super::types::Value;

// ============================================================================
// Column - 컬럼 설명
// ============================================================================

/// `description`의 한 항목
///
/// Bolt는 컬럼 이름만 알려주므로 타입 메타데이터는 모두 비어 있습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    /// 컬럼 이름
    pub name: String,
    /// 타입 코드
    pub type_code: Option<String>,
    /// 표시 크기
    pub display_size: Option<u32>,
    /// 내부 크기
    pub internal_size: Option<u32>,
    /// 정밀도
    pub precision: Option<u32>,
    /// 스케일
    pub scale: Option<u32>,
    /// Null 허용 여부
    pub null_ok: Option<bool>,
}

impl Column {
    /// 이름만 있는 컬럼 생성
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_code: None,
            display_size: None,
            internal_size: None,
            precision: None,
            scale: None,
            null_ok: None,
        }
    }
}

// ============================================================================
// Record - 단일 레코드
// ============================================================================

/// 쿼리 결과 레코드 (순서 있는 값 튜플)
///
/// 같은 결과의 레코드들은 컬럼 이름 목록을 공유합니다.
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    #[serde(skip)]
    keys: Arc<[String]>,
    values: Vec<Value>,
}

impl Record {
    /// 새 레코드 생성
    pub fn new(keys: Arc<[String]>, values: Vec<Value>) -> Self {
        Self { keys, values }
    }

    /// 컬럼 이름 목록
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// 값 목록
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// 값 목록으로 변환
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// 레코드 길이
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 빈 레코드 여부
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 인덱스로 값 가져오기
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// 컬럼 이름으로 값 가져오기
    pub fn get_by_name(&self, key: &str) -> Option<&Value> {
        self.keys
            .iter()
            .position(|k| k == key)
            .and_then(|i| self.values.get(i))
    }

    /// 컬럼 이름으로 타입 변환된 값 가져오기
    pub fn get_as<T>(&self, key: &str) -> ClientResult<T>
    where
        T: TryFrom<Value, Error = ClientError>,
    {
        self.get_by_name(key)
            .cloned()
            .ok_or_else(|| ClientError::value(format!("no column named '{}'", key)))
            .and_then(T::try_from)
    }

    /// 키 존재 여부
    pub fn contains_key(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }
}

impl Index<usize> for Record {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        &self.values[index]
    }
}

/// 값 튜플 비교 (`record == [5, 6]` 형태)
impl<T> PartialEq<[T]> for Record
where
    Value: PartialEq<T>,
{
    fn eq(&self, other: &[T]) -> bool {
        self.values.len() == other.len() && self.values.iter().zip(other).all(|(a, b)| a == b)
    }
}

impl<T, const N: usize> PartialEq<[T; N]> for Record
where
    Value: PartialEq<T>,
{
    fn eq(&self, other: &[T; N]) -> bool {
        *self == other[..]
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Record) -> bool {
        self.values == other.values
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, v) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", v)?;
        }
        if self.values.len() == 1 {
            f.write_str(",")?;
        }
        f.write_str(")")
    }
}

impl IntoIterator for Record {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> Record {
        let keys: Arc<[String]> = vec!["x".to_string(), "y".to_string()].into();
        Record::new(keys, vec![Value::from(5), Value::from("six")])
    }

    #[test]
    fn test_record_access() {
        let r = record();
        assert_eq!(r.len(), 2);
        assert_eq!(r[0], Value::Integer(5));
        assert_eq!(r.get(1), Some(&Value::from("six")));
        assert_eq!(r.get_by_name("y"), Some(&Value::from("six")));
        assert!(r.get(2).is_none());
        assert!(r.contains_key("x"));
        assert!(!r.contains_key("z"));
    }

    #[test]
    fn test_record_get_as() {
        let r = record();
        assert_eq!(r.get_as::<i64>("x").unwrap(), 5);
        assert_eq!(r.get_as::<String>("y").unwrap(), "six");
        assert!(r.get_as::<i64>("y").unwrap_err().is_value_error());
        assert!(r.get_as::<i64>("nope").unwrap_err().is_value_error());
    }

    #[test]
    fn test_record_tuple_equality() {
        let keys: Arc<[String]> = vec!["x".to_string(), "y".to_string()].into();
        let r = Record::new(keys, vec![Value::from(5), Value::from(6)]);
        assert!(r == [5i64, 6]);
        assert!(r != [5i64]);
    }

    #[test]
    fn test_record_display() {
        assert_eq!(record().to_string(), "(5, 'six')");
        let one = Record::new(vec!["a".to_string()].into(), vec![Value::Null]);
        assert_eq!(one.to_string(), "(null,)");
    }

    #[test]
    fn test_column_defaults() {
        let c = Column::new("x");
        assert_eq!(c.name, "x");
        assert!(c.type_code.is_none());
        assert!(c.null_ok.is_none());
    }
}
