//! Field type definitions
//!
//! Maps source column kinds (the relational types a model's casts declare)
//! to the engine field types the index mapping is generated from.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Accepted date/time patterns attached to every date-typed field.
pub const DATE_FORMATS: &str =
    "yyyy-MM-dd HH:mm:ss||yyyy-MM-dd||yyyy/MM/dd HH:mm:ss||yyyy/MM/dd||epoch_millis||epoch_second";

/// Source column kind, as declared in a model's casts table.
///
/// One enum is the single source of truth: the wire name comes from serde,
/// the engine type from [`FieldKind::engine_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Int,
    IntUnsigned,
    Varchar,
    Decimal,
    DecimalUnsigned,
    Tinyint,
    TinyintUnsigned,
    Mediumint,
    MediumintUnsigned,
    Smallint,
    SmallintUnsigned,
    Bigint,
    BigintUnsigned,
    Double,
    DoubleUnsigned,
    Float,
    FloatUnsigned,
    Char,
    Longtext,
    Mediumtext,
    Tinytext,
    Date,
    Datetime,
    Timestamp,
    Time,
    Year,
    Text,
    Json,
    /// Latitude/longitude pair.
    Point,
    Blob,
    Binary,
    Bit,
    Real,
    Geometry,
    Linestring,
    Polygon,
    Multipoint,
    Multilinestring,
    Multipolygon,
    Geometrycollection,
}

impl FieldKind {
    /// Parse the snake_case wire spelling (e.g. `"bigint_unsigned"`).
    pub fn parse(name: &str) -> Option<Self> {
        serde_json::from_value(Value::String(name.to_string())).ok()
    }

    /// The engine field type this source kind indexes as.
    pub fn engine_type(self) -> EngineType {
        match self {
            FieldKind::Int => EngineType::Integer,
            FieldKind::IntUnsigned => EngineType::Long,
            FieldKind::Tinyint => EngineType::Short,
            FieldKind::TinyintUnsigned => EngineType::Integer,
            FieldKind::Mediumint | FieldKind::MediumintUnsigned => EngineType::Integer,
            FieldKind::Smallint => EngineType::Short,
            FieldKind::SmallintUnsigned => EngineType::Integer,
            FieldKind::Bigint | FieldKind::BigintUnsigned => EngineType::Long,
            FieldKind::Bit => EngineType::Long,
            FieldKind::Decimal
            | FieldKind::DecimalUnsigned
            | FieldKind::Double
            | FieldKind::DoubleUnsigned
            | FieldKind::Real => EngineType::Double,
            FieldKind::Float | FieldKind::FloatUnsigned => EngineType::Float,
            FieldKind::Varchar
            | FieldKind::Char
            | FieldKind::Longtext
            | FieldKind::Mediumtext
            | FieldKind::Tinytext
            | FieldKind::Text => EngineType::Text,
            FieldKind::Date
            | FieldKind::Datetime
            | FieldKind::Timestamp
            | FieldKind::Time
            | FieldKind::Year => EngineType::Date,
            FieldKind::Json => EngineType::Object,
            FieldKind::Point => EngineType::GeoPoint,
            FieldKind::Blob | FieldKind::Binary => EngineType::Binary,
            FieldKind::Geometry
            | FieldKind::Linestring
            | FieldKind::Polygon
            | FieldKind::Multipoint
            | FieldKind::Multilinestring
            | FieldKind::Multipolygon
            | FieldKind::Geometrycollection => EngineType::GeoShape,
        }
    }

    /// Build the index-mapping fragment for this source kind.
    ///
    /// Text fields get the CJK-aware analyzer pair plus sub-fields for
    /// exact (`raw`), keyword-analyzed, English-stemmed, standard and smart
    /// querying on the one logical field. Date fields carry the accepted
    /// format list.
    pub fn mapping(self) -> Value {
        let engine = self.engine_type();
        let mut doc = Map::new();
        doc.insert("type".to_string(), Value::String(engine.to_string()));

        match engine {
            EngineType::Text => {
                doc.insert("analyzer".to_string(), json!("ik_max_word"));
                doc.insert("search_analyzer".to_string(), json!("ik_smart"));
                doc.insert(
                    "fields".to_string(),
                    json!({
                        "raw": {"type": "keyword"},
                        "keyword": {"type": "text", "analyzer": "keyword"},
                        "english": {"type": "text", "analyzer": "english"},
                        "standard": {"type": "text", "analyzer": "standard"},
                        "smart": {"type": "text", "analyzer": "ik_smart"},
                    }),
                );
            }
            EngineType::Date => {
                doc.insert("format".to_string(), json!(DATE_FORMATS));
            }
            _ => {}
        }

        Value::Object(doc)
    }
}

/// Engine-side field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineType {
    Integer,
    Long,
    Short,
    Text,
    Double,
    Float,
    Date,
    Object,
    GeoPoint,
    Binary,
    GeoShape,
}

impl fmt::Display for EngineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineType::Integer => "integer",
            EngineType::Long => "long",
            EngineType::Short => "short",
            EngineType::Text => "text",
            EngineType::Double => "double",
            EngineType::Float => "float",
            EngineType::Date => "date",
            EngineType::Object => "object",
            EngineType::GeoPoint => "geo_point",
            EngineType::Binary => "binary",
            EngineType::GeoShape => "geo_shape",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_type_table() {
        assert_eq!(FieldKind::Int.engine_type(), EngineType::Integer);
        assert_eq!(FieldKind::IntUnsigned.engine_type(), EngineType::Long);
        assert_eq!(FieldKind::Varchar.engine_type(), EngineType::Text);
        assert_eq!(FieldKind::Tinyint.engine_type(), EngineType::Short);
        assert_eq!(FieldKind::TinyintUnsigned.engine_type(), EngineType::Integer);
        assert_eq!(FieldKind::Bigint.engine_type(), EngineType::Long);
        assert_eq!(FieldKind::Decimal.engine_type(), EngineType::Double);
        assert_eq!(FieldKind::Float.engine_type(), EngineType::Float);
        assert_eq!(FieldKind::Timestamp.engine_type(), EngineType::Date);
        assert_eq!(FieldKind::Json.engine_type(), EngineType::Object);
        assert_eq!(FieldKind::Point.engine_type(), EngineType::GeoPoint);
        assert_eq!(FieldKind::Blob.engine_type(), EngineType::Binary);
        assert_eq!(FieldKind::Polygon.engine_type(), EngineType::GeoShape);
    }

    #[test]
    fn test_parse_wire_names() {
        assert_eq!(FieldKind::parse("varchar"), Some(FieldKind::Varchar));
        assert_eq!(
            FieldKind::parse("bigint_unsigned"),
            Some(FieldKind::BigintUnsigned)
        );
        assert_eq!(FieldKind::parse("point"), Some(FieldKind::Point));
        assert_eq!(FieldKind::parse("uuid"), None);
    }

    #[test]
    fn test_text_mapping_has_multi_fields() {
        let mapping = FieldKind::Varchar.mapping();
        assert_eq!(mapping["type"], "text");
        assert_eq!(mapping["analyzer"], "ik_max_word");
        assert_eq!(mapping["search_analyzer"], "ik_smart");

        let fields = mapping["fields"].as_object().unwrap();
        assert_eq!(fields["raw"]["type"], "keyword");
        assert_eq!(fields["keyword"]["analyzer"], "keyword");
        assert_eq!(fields["english"]["analyzer"], "english");
        assert_eq!(fields["standard"]["analyzer"], "standard");
        assert_eq!(fields["smart"]["analyzer"], "ik_smart");
    }

    #[test]
    fn test_date_mapping_has_formats() {
        let mapping = FieldKind::Datetime.mapping();
        assert_eq!(mapping["type"], "date");
        assert_eq!(mapping["format"], DATE_FORMATS);
        assert!(mapping.get("fields").is_none());
    }

    #[test]
    fn test_scalar_mapping_is_bare() {
        let mapping = FieldKind::Bigint.mapping();
        assert_eq!(mapping, serde_json::json!({"type": "long"}));
    }
}
