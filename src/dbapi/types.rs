//! Value Types
//!
//! 서버와 주고받는 값 모델

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::error::{ClientError, ClientResult};

// ============================================================================
// Value - 그래프 값
// ============================================================================

/// 그래프 값 타입
///
/// 컨테이너와 그래프 엔티티는 `Arc`로 공유되므로 복제해도 깊은 복사가
/// 일어나지 않습니다. 모든 값은 불변입니다.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Null
    Null,
    /// Boolean
    Boolean(bool),
    /// Integer (i64)
    Integer(i64),
    /// Float (f64)
    Float(f64),
    /// String
    String(String),
    /// List
    List(Arc<[Value]>),
    /// Map
    Map(Arc<ValueMap>),
    /// Node
    Node(Arc<Node>),
    /// Relationship
    Relationship(Arc<Relationship>),
    /// Path
    Path(Arc<Path>),
    /// Date
    Date(NaiveDate),
    /// LocalTime
    LocalTime(NaiveTime),
    /// LocalDateTime
    LocalDateTime(NaiveDateTime),
    /// ZonedDateTime
    ZonedDateTime(ZonedDateTime),
    /// Duration
    Duration(Duration),
    /// Point2D
    Point2D(Point2D),
    /// Point3D
    Point3D(Point3D),
}

impl Value {
    /// Null 여부
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Boolean으로 변환
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer로 변환
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Float로 변환
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// String으로 변환
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// List로 변환
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Map으로 변환
    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Node로 변환
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Value::Node(n) => Some(n),
            _ => None,
        }
    }

    /// Relationship으로 변환
    pub fn as_relationship(&self) -> Option<&Relationship> {
        match self {
            Value::Relationship(r) => Some(r),
            _ => None,
        }
    }

    /// Path로 변환
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Value::Path(p) => Some(p),
            _ => None,
        }
    }

    /// 그래프 엔티티 여부 (파라미터로 사용할 수 없음)
    pub fn is_graph_entity(&self) -> bool {
        matches!(self, Value::Node(_) | Value::Relationship(_) | Value::Path(_))
    }

    /// 타입 이름
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Boolean(_) => "Boolean",
            Value::Integer(_) => "Integer",
            Value::Float(_) => "Float",
            Value::String(_) => "String",
            Value::List(_) => "List",
            Value::Map(_) => "Map",
            Value::Node(_) => "Node",
            Value::Relationship(_) => "Relationship",
            Value::Path(_) => "Path",
            Value::Date(_) => "Date",
            Value::LocalTime(_) => "LocalTime",
            Value::LocalDateTime(_) => "LocalDateTime",
            Value::ZonedDateTime(_) => "ZonedDateTime",
            Value::Duration(_) => "Duration",
            Value::Point2D(_) => "Point2D",
            Value::Point3D(_) => "Point3D",
        }
    }
}

/// 문자열 리터럴 출력 ('...' 형식)
fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("'")?;
    for c in s.chars() {
        match c {
            '\'' => f.write_str("\\'")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            _ => write!(f, "{}", c)?,
        }
    }
    f.write_str("'")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{:?}", fl),
            Value::String(s) => write_quoted(f, s),
            Value::List(l) => {
                f.write_str("[")?;
                for (i, item) in l.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Map(m) => write!(f, "{}", m),
            Value::Node(n) => write!(f, "{}", n),
            Value::Relationship(r) => write!(f, "{}", r),
            Value::Path(p) => write!(f, "{}", p),
            Value::Date(d) => write!(f, "{}", d),
            Value::LocalTime(t) => write!(f, "{}", t),
            Value::LocalDateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
            Value::ZonedDateTime(dt) => write!(f, "{}", dt),
            Value::Duration(d) => write!(f, "{}", d),
            Value::Point2D(p) => write!(f, "{}", p),
            Value::Point3D(p) => write!(f, "{}", p),
        }
    }
}

// ============================================================================
// 변환
// ============================================================================

macro_rules! value_from {
    ($($ty:ty => $variant:ident $(via $conv:ty)?),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v $(as $conv)?)
                }
            }
        )*
    };
}

value_from! {
    bool => Boolean,
    i64 => Integer,
    i32 => Integer via i64,
    i16 => Integer via i64,
    i8 => Integer via i64,
    u32 => Integer via i64,
    u16 => Integer via i64,
    u8 => Integer via i64,
    f64 => Float,
    f32 => Float via f64,
    String => String,
    NaiveDate => Date,
    NaiveTime => LocalTime,
    NaiveDateTime => LocalDateTime,
    ZonedDateTime => ZonedDateTime,
    Duration => Duration,
    Point2D => Point2D,
    Point3D => Point3D,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<ValueMap> for Value {
    fn from(v: ValueMap) -> Self {
        Value::Map(Arc::new(v))
    }
}

impl<T: Into<Value>> From<HashMap<String, T>> for Value {
    fn from(v: HashMap<String, T>) -> Self {
        Value::Map(Arc::new(v.into_iter().collect()))
    }
}

impl<T: Into<Value>> From<BTreeMap<String, T>> for Value {
    fn from(v: BTreeMap<String, T>) -> Self {
        Value::Map(Arc::new(v.into_iter().collect()))
    }
}

impl From<Node> for Value {
    fn from(v: Node) -> Self {
        Value::Node(Arc::new(v))
    }
}

impl From<Relationship> for Value {
    fn from(v: Relationship) -> Self {
        Value::Relationship(Arc::new(v))
    }
}

impl From<Path> for Value {
    fn from(v: Path) -> Self {
        Value::Path(Arc::new(v))
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(v: DateTime<FixedOffset>) -> Self {
        Value::ZonedDateTime(ZonedDateTime::from(v))
    }
}

impl PartialEq<i64> for Value {
    fn eq(&self, other: &i64) -> bool {
        matches!(self, Value::Integer(i) if i == other)
    }
}

impl PartialEq<&str> for Value {
    fn eq(&self, other: &&str) -> bool {
        matches!(self, Value::String(s) if s == other)
    }
}

macro_rules! value_try_from_wide {
    ($($ty:ty),*) => {
        $(
            impl TryFrom<$ty> for Value {
                type Error = ClientError;

                fn try_from(v: $ty) -> ClientResult<Self> {
                    i64::try_from(v).map(Value::Integer).map_err(|_| {
                        ClientError::overflow(format!("integer {} does not fit in 64 bits", v))
                    })
                }
            }
        )*
    };
}

value_try_from_wide!(u64, usize, i128, u128);

macro_rules! try_from_value {
    ($($ty:ty => $accessor:ident),* $(,)?) => {
        $(
            impl TryFrom<Value> for $ty {
                type Error = ClientError;

                fn try_from(v: Value) -> ClientResult<Self> {
                    v.$accessor().map(Into::into).ok_or_else(|| {
                        ClientError::value(format!(
                            "cannot convert {} to {}",
                            v.type_name(),
                            stringify!($ty)
                        ))
                    })
                }
            }
        )*
    };
}

try_from_value! {
    bool => as_bool,
    i64 => as_int,
    f64 => as_float,
    String => as_str,
}

// ============================================================================
// ValueMap - 순서 유지 맵
// ============================================================================

/// 문자열 키 맵
///
/// 삽입 순서를 유지하지만 동등성 비교에서는 순서를 무시합니다.
#[derive(Debug, Clone, Default)]
pub struct ValueMap {
    entries: IndexMap<String, Value>,
}

impl ValueMap {
    /// 빈 맵 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 용량 지정 생성
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity),
        }
    }

    /// 항목 삽입 (기존 키는 제자리에서 교체, 이전 값 반환)
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    /// 값 조회
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// 키 존재 여부
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// 항목 수
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 비어있는지 여부
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 삽입 순서대로 순회
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// 키 목록
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

// IndexMap 동등성은 순서 무시
impl PartialEq for ValueMap {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ValueMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl IntoIterator for ValueMap {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl fmt::Display for ValueMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write_quoted(f, k)?;
            write!(f, ": {}", v)?;
        }
        f.write_str("}")
    }
}

impl Serialize for ValueMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

// ============================================================================
// Node - 그래프 노드
// ============================================================================

/// 그래프 노드
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    id: i64,
    labels: BTreeSet<String>,
    properties: ValueMap,
}

impl Node {
    /// 새 노드 생성
    pub fn new<L, S>(id: i64, labels: L, properties: ValueMap) -> Self
    where
        L: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id,
            labels: labels.into_iter().map(Into::into).collect(),
            properties,
        }
    }

    /// 노드 ID
    pub fn id(&self) -> i64 {
        self.id
    }

    /// 레이블 (정렬 순서)
    pub fn labels(&self) -> &BTreeSet<String> {
        &self.labels
    }

    /// 레이블 보유 여부
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    /// 속성
    pub fn properties(&self) -> &ValueMap {
        &self.properties
    }

    /// 속성 조회
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for label in &self.labels {
            write!(f, ":{}", label)?;
        }
        if !self.properties.is_empty() {
            if !self.labels.is_empty() {
                f.write_str(" ")?;
            }
            write!(f, "{}", self.properties)?;
        }
        f.write_str(")")
    }
}

// ============================================================================
// Relationship - 관계
// ============================================================================

/// 그래프 관계
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Relationship {
    id: i64,
    start_id: i64,
    end_id: i64,
    #[serde(rename = "type")]
    rel_type: String,
    properties: ValueMap,
}

impl Relationship {
    /// 새 관계 생성
    pub fn new(
        id: i64,
        start_id: i64,
        end_id: i64,
        rel_type: impl Into<String>,
        properties: ValueMap,
    ) -> Self {
        Self {
            id,
            start_id,
            end_id,
            rel_type: rel_type.into(),
            properties,
        }
    }

    /// 관계 ID
    pub fn id(&self) -> i64 {
        self.id
    }

    /// 시작 노드 ID
    pub fn start_id(&self) -> i64 {
        self.start_id
    }

    /// 끝 노드 ID
    pub fn end_id(&self) -> i64 {
        self.end_id
    }

    /// 관계 타입
    pub fn rel_type(&self) -> &str {
        &self.rel_type
    }

    /// 속성
    pub fn properties(&self) -> &ValueMap {
        &self.properties
    }

    /// 속성 조회
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// 두 노드를 (방향 무관하게) 연결하는지 여부
    pub fn connects(&self, a: i64, b: i64) -> bool {
        (self.start_id == a && self.end_id == b) || (self.start_id == b && self.end_id == a)
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[:{}", self.rel_type)?;
        if !self.properties.is_empty() {
            write!(f, " {}", self.properties)?;
        }
        f.write_str("]")
    }
}

// ============================================================================
// Path - 경로
// ============================================================================

/// 그래프 경로
///
/// `relationships[i]`는 `nodes[i]`와 `nodes[i + 1]`을 어느 방향으로든 연결합니다.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Path {
    nodes: Vec<Arc<Node>>,
    relationships: Vec<Arc<Relationship>>,
}

impl Path {
    /// 새 경로 생성
    pub fn new(nodes: Vec<Node>, relationships: Vec<Relationship>) -> ClientResult<Self> {
        Self::from_shared(
            nodes.into_iter().map(Arc::new).collect(),
            relationships.into_iter().map(Arc::new).collect(),
        )
    }

    /// 공유 엔티티로부터 경로 생성
    pub fn from_shared(
        nodes: Vec<Arc<Node>>,
        relationships: Vec<Arc<Relationship>>,
    ) -> ClientResult<Self> {
        if nodes.is_empty() {
            return Err(ClientError::value("a path needs at least one node"));
        }
        if relationships.len() != nodes.len() - 1 {
            return Err(ClientError::value(format!(
                "a path with {} nodes needs {} relationships, got {}",
                nodes.len(),
                nodes.len() - 1,
                relationships.len()
            )));
        }
        for (i, rel) in relationships.iter().enumerate() {
            if !rel.connects(nodes[i].id, nodes[i + 1].id) {
                return Err(ClientError::value(format!(
                    "relationship {} does not connect nodes {} and {}",
                    rel.id,
                    nodes[i].id,
                    nodes[i + 1].id
                )));
            }
        }
        Ok(Self {
            nodes,
            relationships,
        })
    }

    /// 노드 목록
    pub fn nodes(&self) -> &[Arc<Node>] {
        &self.nodes
    }

    /// 관계 목록
    pub fn relationships(&self) -> &[Arc<Relationship>] {
        &self.relationships
    }

    /// 시작 노드
    pub fn start(&self) -> &Node {
        &self.nodes[0]
    }

    /// 끝 노드
    pub fn end(&self) -> &Node {
        &self.nodes[self.nodes.len() - 1]
    }

    /// 경로 길이 (관계 수)
    pub fn len(&self) -> usize {
        self.relationships.len()
    }

    /// 관계가 없는 경로 여부
    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.nodes[0])?;
        for (i, rel) in self.relationships.iter().enumerate() {
            if rel.start_id == self.nodes[i].id {
                write!(f, "-{}->", rel)?;
            } else {
                write!(f, "<-{}-", rel)?;
            }
            write!(f, "{}", self.nodes[i + 1])?;
        }
        Ok(())
    }
}

// ============================================================================
// ZonedDateTime - 시간대 포함 날짜시간
// ============================================================================

/// 시간대
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Zone {
    /// UTC 기준 고정 오프셋 (초)
    Offset(i32),
    /// IANA 시간대 이름
    Named(String),
}

/// 시간대 포함 날짜시간
///
/// UTC 시각과 시간대를 함께 보관합니다. 이름 있는 시간대의 현지 시각은
/// 시간대 데이터베이스 없이는 계산할 수 없으므로 UTC 시각만 제공합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZonedDateTime {
    utc: NaiveDateTime,
    zone: Zone,
}

impl ZonedDateTime {
    /// 오프셋 기반 생성
    pub fn with_offset(utc: NaiveDateTime, offset_seconds: i32) -> ClientResult<Self> {
        FixedOffset::east_opt(offset_seconds).ok_or_else(|| {
            ClientError::value(format!("invalid UTC offset of {} seconds", offset_seconds))
        })?;
        Ok(Self {
            utc,
            zone: Zone::Offset(offset_seconds),
        })
    }

    /// 시간대 이름 기반 생성
    pub fn with_zone_id(utc: NaiveDateTime, zone_id: impl Into<String>) -> Self {
        Self {
            utc,
            zone: Zone::Named(zone_id.into()),
        }
    }

    /// UTC 시각
    pub fn utc(&self) -> NaiveDateTime {
        self.utc
    }

    /// 시간대
    pub fn zone(&self) -> &Zone {
        &self.zone
    }

    /// 고정 오프셋 날짜시간 (이름 있는 시간대는 None)
    pub fn to_fixed_offset(&self) -> Option<DateTime<FixedOffset>> {
        match self.zone {
            Zone::Offset(secs) => {
                let offset = FixedOffset::east_opt(secs)?;
                Some(offset.from_utc_datetime(&self.utc))
            }
            Zone::Named(_) => None,
        }
    }
}

impl From<DateTime<FixedOffset>> for ZonedDateTime {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Self {
            utc: dt.naive_utc(),
            zone: Zone::Offset(dt.offset().local_minus_utc()),
        }
    }
}

impl fmt::Display for ZonedDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.zone, self.to_fixed_offset()) {
            (_, Some(dt)) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f%:z")),
            (Zone::Named(name), None) => {
                write!(f, "{}Z[{}]", self.utc.format("%Y-%m-%dT%H:%M:%S%.f"), name)
            }
            (Zone::Offset(_), None) => write!(f, "{}", self.utc),
        }
    }
}

// ============================================================================
// Duration - 시간 간격
// ============================================================================

/// 시간 간격
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Duration {
    /// 개월
    pub months: i64,
    /// 일
    pub days: i64,
    /// 초
    pub seconds: i64,
    /// 나노초
    pub nanoseconds: i32,
}

impl Duration {
    /// 새 Duration 생성
    pub fn new(months: i64, days: i64, seconds: i64, nanoseconds: i32) -> Self {
        Self {
            months,
            days,
            seconds,
            nanoseconds,
        }
    }

    /// 일에서 생성
    pub fn from_days(days: i64) -> Self {
        Self::new(0, days, 0, 0)
    }
}

impl From<chrono::Duration> for Duration {
    fn from(d: chrono::Duration) -> Self {
        let seconds = d.num_seconds();
        let nanos = (d - chrono::Duration::seconds(seconds))
            .num_nanoseconds()
            .unwrap_or(0) as i32;
        Self::new(0, 0, seconds, nanos)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}M{}DT{}", self.months, self.days, self.seconds)?;
        if self.nanoseconds != 0 {
            write!(f, ".{:09}", self.nanoseconds.unsigned_abs())?;
        }
        f.write_str("S")
    }
}

// ============================================================================
// Point - 공간 좌표
// ============================================================================

/// 2차원 좌표
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point2D {
    /// 좌표계 ID
    pub srid: u32,
    /// X 좌표
    pub x: f64,
    /// Y 좌표
    pub y: f64,
}

impl Point2D {
    /// 새 2D 좌표 생성
    pub fn new(srid: u32, x: f64, y: f64) -> Self {
        Self { srid, x, y }
    }
}

impl fmt::Display for Point2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Point2D({{srid: {}, x: {:?}, y: {:?}}})", self.srid, self.x, self.y)
    }
}

/// 3차원 좌표
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point3D {
    /// 좌표계 ID
    pub srid: u32,
    /// X 좌표
    pub x: f64,
    /// Y 좌표
    pub y: f64,
    /// Z 좌표
    pub z: f64,
}

impl Point3D {
    /// 새 3D 좌표 생성
    pub fn new(srid: u32, x: f64, y: f64, z: f64) -> Self {
        Self { srid, x, y, z }
    }
}

impl fmt::Display for Point3D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Point3D({{srid: {}, x: {:?}, y: {:?}, z: {:?}}})",
            self.srid, self.x, self.y, self.z
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
