//! Wire Conversion
//!
//! [`Value`]와 PackStream 값 사이의 변환

use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::bolt::packstream::marker::tag;
use crate::bolt::{PackStreamMap, PackStreamStructure, PackStreamValue};

use super::error::{ClientError, ClientResult};
use super::types::{
    Duration, Node, Path, Point2D, Point3D, Relationship, Value, ValueMap, Zone, ZonedDateTime,
};

const NANOS_PER_SECOND: i64 = 1_000_000_000;
const NANOS_PER_DAY: i64 = 86_400 * NANOS_PER_SECOND;

/// 0001-01-01 기준 1970-01-01의 일수
const UNIX_EPOCH_DAYS_FROM_CE: i64 = 719_163;

/// 컨테이너/문자열 최대 길이 (32비트 길이 필드)
const MAX_WIRE_SIZE: usize = u32::MAX as usize;

// ============================================================================
// 인코딩 (파라미터)
// ============================================================================

/// 쿼리 파라미터 인코딩
pub fn encode_params(params: &ValueMap) -> ClientResult<PackStreamMap> {
    check_size("parameter map", params.len())?;
    let mut map = PackStreamMap::with_capacity(params.len());
    for (key, value) in params.iter() {
        check_size("map key", key.len())?;
        map.insert(key, encode_value(value)?);
    }
    Ok(map)
}

/// 단일 값 인코딩
///
/// 그래프 엔티티는 결과로만 존재하므로 파라미터로 보낼 수 없습니다.
pub fn encode_value(value: &Value) -> ClientResult<PackStreamValue> {
    let encoded = match value {
        Value::Null => PackStreamValue::Null,
        Value::Boolean(b) => PackStreamValue::Boolean(*b),
        Value::Integer(i) => PackStreamValue::Integer(*i),
        Value::Float(f) => PackStreamValue::Float(*f),
        Value::String(s) => {
            check_size("string", s.len())?;
            PackStreamValue::String(s.clone())
        }
        Value::List(items) => {
            check_size("list", items.len())?;
            PackStreamValue::List(items.iter().map(encode_value).collect::<ClientResult<_>>()?)
        }
        Value::Map(map) => PackStreamValue::Map(encode_params(map)?),
        Value::Node(_) | Value::Relationship(_) | Value::Path(_) => {
            return Err(ClientError::value(format!(
                "{} values are results, not inputs",
                value.type_name()
            )))
        }
        Value::Date(d) => structure(tag::DATE, vec![days_since_epoch(*d).into()]),
        Value::LocalTime(t) => structure(tag::LOCAL_TIME, vec![nanos_of_day(*t).into()]),
        Value::LocalDateTime(dt) => {
            let (secs, nanos) = split_timestamp(*dt);
            structure(tag::LOCAL_DATE_TIME, vec![secs.into(), nanos.into()])
        }
        Value::ZonedDateTime(dt) => {
            let (secs, nanos) = split_timestamp(dt.utc());
            match dt.zone() {
                Zone::Offset(offset) => structure(
                    tag::DATE_TIME,
                    vec![secs.into(), nanos.into(), i64::from(*offset).into()],
                ),
                Zone::Named(name) => structure(
                    tag::DATE_TIME_ZONE_ID,
                    vec![secs.into(), nanos.into(), name.as_str().into()],
                ),
            }
        }
        Value::Duration(d) => structure(
            tag::DURATION,
            vec![
                d.months.into(),
                d.days.into(),
                d.seconds.into(),
                i64::from(d.nanoseconds).into(),
            ],
        ),
        Value::Point2D(p) => structure(
            tag::POINT_2D,
            vec![i64::from(p.srid).into(), p.x.into(), p.y.into()],
        ),
        Value::Point3D(p) => structure(
            tag::POINT_3D,
            vec![i64::from(p.srid).into(), p.x.into(), p.y.into(), p.z.into()],
        ),
    };
    Ok(encoded)
}

fn check_size(what: &str, len: usize) -> ClientResult<()> {
    if len > MAX_WIRE_SIZE {
        return Err(ClientError::value(format!(
            "{} of size {} exceeds the maximum of {}",
            what, len, MAX_WIRE_SIZE
        )));
    }
    Ok(())
}

fn structure(tag: u8, fields: Vec<PackStreamValue>) -> PackStreamValue {
    PackStreamStructure::new(tag, fields).into()
}

fn days_since_epoch(date: NaiveDate) -> i64 {
    i64::from(date.num_days_from_ce()) - UNIX_EPOCH_DAYS_FROM_CE
}

fn nanos_of_day(time: NaiveTime) -> i64 {
    i64::from(time.num_seconds_from_midnight()) * NANOS_PER_SECOND + i64::from(time.nanosecond())
}

fn split_timestamp(dt: NaiveDateTime) -> (i64, i64) {
    let utc = dt.and_utc();
    (utc.timestamp(), i64::from(utc.timestamp_subsec_nanos()))
}

// ============================================================================
// 디코딩 (결과)
// ============================================================================

/// 결과 값 디코딩
///
/// 알 수 없는 구조체 태그나 잘못된 필드 구성은 프로토콜 에러입니다.
pub fn decode_value(value: PackStreamValue) -> ClientResult<Value> {
    match value {
        PackStreamValue::Null => Ok(Value::Null),
        PackStreamValue::Boolean(b) => Ok(Value::Boolean(b)),
        PackStreamValue::Integer(i) => Ok(Value::Integer(i)),
        PackStreamValue::Float(f) => Ok(Value::Float(f)),
        PackStreamValue::String(s) => Ok(Value::String(s)),
        PackStreamValue::List(items) => Ok(Value::List(
            items
                .into_iter()
                .map(decode_value)
                .collect::<ClientResult<Arc<[Value]>>>()?,
        )),
        PackStreamValue::Map(map) => Ok(Value::Map(Arc::new(decode_map(map)?))),
        PackStreamValue::Structure(s) => decode_structure(s),
    }
}

/// 레코드 필드 디코딩
pub fn decode_record(fields: Vec<PackStreamValue>) -> ClientResult<Vec<Value>> {
    fields.into_iter().map(decode_value).collect()
}

fn decode_map(map: PackStreamMap) -> ClientResult<ValueMap> {
    let mut out = ValueMap::with_capacity(map.len());
    for (k, v) in map {
        out.insert(k, decode_value(v)?);
    }
    Ok(out)
}

fn decode_structure(s: PackStreamStructure) -> ClientResult<Value> {
    match s.tag {
        tag::NODE => Ok(Value::Node(Arc::new(decode_node(s)?))),
        tag::RELATIONSHIP => Ok(Value::Relationship(Arc::new(decode_relationship(s)?))),
        tag::PATH => Ok(Value::Path(Arc::new(decode_path(s)?))),
        tag::UNBOUND_RELATIONSHIP => Err(ClientError::protocol(
            "unbound relationship outside of a path",
        )),
        tag::DATE => {
            let mut f = Fields::new(s, "Date", &[1])?;
            let days = f.int()?;
            let date = days
                .checked_add(UNIX_EPOCH_DAYS_FROM_CE)
                .and_then(|d| i32::try_from(d).ok())
                .and_then(NaiveDate::from_num_days_from_ce_opt)
                .ok_or_else(|| out_of_range("Date"))?;
            Ok(Value::Date(date))
        }
        tag::LOCAL_TIME => {
            let mut f = Fields::new(s, "LocalTime", &[1])?;
            let nanos = f.int()?;
            if !(0..NANOS_PER_DAY).contains(&nanos) {
                return Err(out_of_range("LocalTime"));
            }
            let time = NaiveTime::from_num_seconds_from_midnight_opt(
                (nanos / NANOS_PER_SECOND) as u32,
                (nanos % NANOS_PER_SECOND) as u32,
            )
            .ok_or_else(|| out_of_range("LocalTime"))?;
            Ok(Value::LocalTime(time))
        }
        tag::LOCAL_DATE_TIME => {
            let mut f = Fields::new(s, "LocalDateTime", &[2])?;
            let dt = timestamp(f.int()?, f.int()?, "LocalDateTime")?;
            Ok(Value::LocalDateTime(dt))
        }
        tag::DATE_TIME => {
            let mut f = Fields::new(s, "DateTime", &[3])?;
            let utc = timestamp(f.int()?, f.int()?, "DateTime")?;
            let offset = i32::try_from(f.int()?).map_err(|_| out_of_range("DateTime"))?;
            let dt = ZonedDateTime::with_offset(utc, offset)
                .map_err(|_| out_of_range("DateTime"))?;
            Ok(Value::ZonedDateTime(dt))
        }
        tag::DATE_TIME_ZONE_ID => {
            let mut f = Fields::new(s, "DateTimeZoneId", &[3])?;
            let utc = timestamp(f.int()?, f.int()?, "DateTimeZoneId")?;
            let zone = f.string()?;
            Ok(Value::ZonedDateTime(ZonedDateTime::with_zone_id(utc, zone)))
        }
        tag::DURATION => {
            let mut f = Fields::new(s, "Duration", &[4])?;
            let months = f.int()?;
            let days = f.int()?;
            let seconds = f.int()?;
            let nanos = i32::try_from(f.int()?).map_err(|_| out_of_range("Duration"))?;
            Ok(Value::Duration(Duration::new(months, days, seconds, nanos)))
        }
        tag::POINT_2D => {
            let mut f = Fields::new(s, "Point2D", &[3])?;
            let srid = f.srid()?;
            Ok(Value::Point2D(Point2D::new(srid, f.float()?, f.float()?)))
        }
        tag::POINT_3D => {
            let mut f = Fields::new(s, "Point3D", &[4])?;
            let srid = f.srid()?;
            Ok(Value::Point3D(Point3D::new(
                srid,
                f.float()?,
                f.float()?,
                f.float()?,
            )))
        }
        other => Err(ClientError::protocol(format!(
            "unknown structure tag 0x{:02X}",
            other
        ))),
    }
}

fn out_of_range(what: &str) -> ClientError {
    ClientError::protocol(format!("{} value out of range", what))
}

fn timestamp(secs: i64, nanos: i64, what: &str) -> ClientResult<NaiveDateTime> {
    let nanos = u32::try_from(nanos)
        .ok()
        .filter(|n| i64::from(*n) < NANOS_PER_SECOND)
        .ok_or_else(|| out_of_range(what))?;
    DateTime::from_timestamp(secs, nanos)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| out_of_range(what))
}

// ============================================================================
// 그래프 구조체
// ============================================================================

// Bolt 5는 element_id 문자열 필드를 덧붙이지만 사용하지 않습니다.

fn decode_node(s: PackStreamStructure) -> ClientResult<Node> {
    let mut f = Fields::new(s, "Node", &[3, 4])?;
    let id = f.int()?;
    let labels = f
        .list()?
        .into_iter()
        .map(|l| match l {
            PackStreamValue::String(s) => Ok(s),
            other => Err(ClientError::protocol(format!(
                "node label must be a String, got {}",
                other.type_name()
            ))),
        })
        .collect::<ClientResult<Vec<_>>>()?;
    let properties = f.map()?;
    Ok(Node::new(id, labels, properties))
}

fn decode_relationship(s: PackStreamStructure) -> ClientResult<Relationship> {
    let mut f = Fields::new(s, "Relationship", &[5, 8])?;
    let id = f.int()?;
    let start = f.int()?;
    let end = f.int()?;
    let rel_type = f.string()?;
    let properties = f.map()?;
    Ok(Relationship::new(id, start, end, rel_type, properties))
}

/// 방향 없는 관계 (id, type, properties)
struct Unbound {
    id: i64,
    rel_type: String,
    properties: ValueMap,
}

fn decode_unbound(value: PackStreamValue) -> ClientResult<Unbound> {
    let s = match value {
        PackStreamValue::Structure(s) if s.tag == tag::UNBOUND_RELATIONSHIP => s,
        other => {
            return Err(ClientError::protocol(format!(
                "expected UnboundRelationship in path, got {}",
                other.type_name()
            )))
        }
    };
    let mut f = Fields::new(s, "UnboundRelationship", &[3, 4])?;
    Ok(Unbound {
        id: f.int()?,
        rel_type: f.string()?,
        properties: f.map()?,
    })
}

/// 경로 재구성
///
/// 인덱스 목록은 (관계, 노드) 쌍의 나열입니다. 관계 인덱스는 1부터 시작하며
/// 음수이면 역방향으로 순회한 것입니다.
fn decode_path(s: PackStreamStructure) -> ClientResult<Path> {
    let mut f = Fields::new(s, "Path", &[3])?;
    let nodes = f
        .list()?
        .into_iter()
        .map(|n| match n {
            PackStreamValue::Structure(s) if s.tag == tag::NODE => decode_node(s).map(Arc::new),
            other => Err(ClientError::protocol(format!(
                "expected Node in path, got {}",
                other.type_name()
            ))),
        })
        .collect::<ClientResult<Vec<_>>>()?;
    let unbound = f
        .list()?
        .into_iter()
        .map(decode_unbound)
        .collect::<ClientResult<Vec<_>>>()?;
    let indices = f
        .list()?
        .into_iter()
        .map(|i| {
            i.as_int()
                .ok_or_else(|| ClientError::protocol("path index must be an Integer"))
        })
        .collect::<ClientResult<Vec<_>>>()?;

    if nodes.is_empty() {
        return Err(ClientError::protocol("path without nodes"));
    }
    if indices.len() % 2 != 0 {
        return Err(ClientError::protocol("path index list has odd length"));
    }

    let mut seq_nodes = Vec::with_capacity(indices.len() / 2 + 1);
    let mut seq_rels = Vec::with_capacity(indices.len() / 2);
    seq_nodes.push(Arc::clone(&nodes[0]));

    for pair in indices.chunks_exact(2) {
        let (rel_index, node_index) = (pair[0], pair[1]);
        let prev = seq_nodes[seq_nodes.len() - 1].id();
        let next = usize::try_from(node_index)
            .ok()
            .and_then(|i| nodes.get(i))
            .ok_or_else(|| ClientError::protocol(format!("path node index {} out of range", node_index)))?;
        let rel = usize::try_from(rel_index.unsigned_abs())
            .ok()
            .filter(|i| *i >= 1)
            .and_then(|i| unbound.get(i - 1))
            .ok_or_else(|| {
                ClientError::protocol(format!("path relationship index {} out of range", rel_index))
            })?;
        let (start, end) = if rel_index > 0 {
            (prev, next.id())
        } else {
            (next.id(), prev)
        };
        seq_rels.push(Arc::new(Relationship::new(
            rel.id,
            start,
            end,
            rel.rel_type.clone(),
            rel.properties.clone(),
        )));
        seq_nodes.push(Arc::clone(next));
    }

    Path::from_shared(seq_nodes, seq_rels).map_err(|e| ClientError::protocol(e.to_string()))
}

// ============================================================================
// 필드 읽기 도우미
// ============================================================================

/// 구조체 필드를 순서대로 꺼내는 도우미
struct Fields {
    name: &'static str,
    fields: std::vec::IntoIter<PackStreamValue>,
}

impl Fields {
    fn new(s: PackStreamStructure, name: &'static str, arities: &[usize]) -> ClientResult<Self> {
        if !arities.contains(&s.fields.len()) {
            return Err(ClientError::protocol(format!(
                "{} structure has {} fields",
                name,
                s.fields.len()
            )));
        }
        Ok(Self {
            name,
            fields: s.fields.into_iter(),
        })
    }

    fn next(&mut self) -> ClientResult<PackStreamValue> {
        self.fields
            .next()
            .ok_or_else(|| ClientError::protocol(format!("{} structure is truncated", self.name)))
    }

    fn mismatch(&self, expected: &str, got: &PackStreamValue) -> ClientError {
        ClientError::protocol(format!(
            "{} field must be {}, got {}",
            self.name,
            expected,
            got.type_name()
        ))
    }

    fn int(&mut self) -> ClientResult<i64> {
        match self.next()? {
            PackStreamValue::Integer(i) => Ok(i),
            other => Err(self.mismatch("Integer", &other)),
        }
    }

    fn float(&mut self) -> ClientResult<f64> {
        match self.next()? {
            PackStreamValue::Float(f) => Ok(f),
            other => Err(self.mismatch("Float", &other)),
        }
    }

    fn string(&mut self) -> ClientResult<String> {
        match self.next()? {
            PackStreamValue::String(s) => Ok(s),
            other => Err(self.mismatch("String", &other)),
        }
    }

    fn list(&mut self) -> ClientResult<Vec<PackStreamValue>> {
        match self.next()? {
            PackStreamValue::List(l) => Ok(l),
            other => Err(self.mismatch("List", &other)),
        }
    }

    fn map(&mut self) -> ClientResult<ValueMap> {
        match self.next()? {
            PackStreamValue::Map(m) => decode_map(m),
            other => Err(self.mismatch("Map", &other)),
        }
    }

    fn srid(&mut self) -> ClientResult<u32> {
        let srid = self.int()?;
        u32::try_from(srid).map_err(|_| out_of_range(self.name))
    }
}
