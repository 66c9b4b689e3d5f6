//! Policy-aware JSON serialization.
//!
//! A [`serde::Serializer`] that builds a [`serde_json::Value`] while
//! consulting a [`FieldPolicyTable`] for every struct or map field:
//!
//! - fields the [`SerializationMode`] excludes are skipped before their
//!   value is serialized;
//! - fields whose value serializes to `null` are omitted in every mode
//!   (array elements keep their nulls);
//! - nested objects are filtered with the table declared for the field, and
//!   sequence elements inherit the table of the sequence;
//! - nesting deeper than [`MAX_DEPTH`] fails with
//!   [`ErrorKind::Serialization`], which is how a cyclic graph surfaces.

use std::fmt::Display;

use serde::ser::{self, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, ErrorKind, Result};
use crate::policy::{FieldPolicies, FieldPolicyTable, SerializationMode};

/// Maximum object/array nesting accepted by the serializer.
pub const MAX_DEPTH: usize = 64;

/// Serialize `value` keeping only creatable, non-null fields.
pub fn serialize_for_create<T>(value: &T) -> Result<String>
where
    T: FieldPolicies + Serialize + ?Sized,
{
    let value = to_value(value, SerializationMode::Create)?;
    Ok(serde_json::to_string(&value)?)
}

/// Serialize `value` keeping only updateable, non-null fields.
pub fn serialize_for_update<T>(value: &T) -> Result<String>
where
    T: FieldPolicies + Serialize + ?Sized,
{
    let value = to_value(value, SerializationMode::Update)?;
    Ok(serde_json::to_string(&value)?)
}

/// Serialize every non-null field, optionally pretty-printed.
pub fn serialize_complete<T>(value: &T, indented: bool) -> Result<String>
where
    T: FieldPolicies + Serialize + ?Sized,
{
    let value = to_value(value, SerializationMode::Complete)?;
    if indented {
        Ok(serde_json::to_string_pretty(&value)?)
    } else {
        Ok(serde_json::to_string(&value)?)
    }
}

/// Build the filtered JSON tree using the type's own table.
pub fn to_value<T>(value: &T, mode: SerializationMode) -> Result<Value>
where
    T: FieldPolicies + Serialize + ?Sized,
{
    to_value_with_table(value, mode, T::field_policies())
}

/// Build the filtered JSON tree with an explicit table, such as one derived
/// from describe metadata at runtime.
pub fn to_value_with_table<T>(
    value: &T,
    mode: SerializationMode,
    table: &FieldPolicyTable,
) -> Result<Value>
where
    T: Serialize + ?Sized,
{
    let serializer = PolicySerializer {
        mode,
        table,
        depth: 0,
    };
    value
        .serialize(serializer)
        .map_err(|e| Error::new(ErrorKind::Serialization(e.0)))
}

// ============================================================================
// Serializer
// ============================================================================

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct SerializeError(String);

impl ser::Error for SerializeError {
    fn custom<T: Display>(msg: T) -> Self {
        SerializeError(msg.to_string())
    }
}

#[derive(Clone, Copy)]
struct PolicySerializer<'a> {
    mode: SerializationMode,
    table: &'a FieldPolicyTable,
    depth: usize,
}

impl<'a> PolicySerializer<'a> {
    /// The serializer for the contents of a new object or array level.
    fn enter(self) -> std::result::Result<Self, SerializeError> {
        let depth = self.depth + 1;
        if depth > MAX_DEPTH {
            return Err(SerializeError(format!(
                "Object graph nests deeper than {} levels; cyclic references are not supported",
                MAX_DEPTH
            )));
        }
        Ok(Self { depth, ..self })
    }

    fn object(
        self,
        variant: Option<&'static str>,
    ) -> std::result::Result<ObjectBuilder<'a>, SerializeError> {
        Ok(ObjectBuilder {
            fields: Map::new(),
            parent: self.enter()?,
            pending_key: None,
            variant,
        })
    }

    fn array(
        self,
        variant: Option<&'static str>,
        len: Option<usize>,
    ) -> std::result::Result<ArrayBuilder<'a>, SerializeError> {
        Ok(ArrayBuilder {
            items: Vec::with_capacity(len.unwrap_or(0)),
            element: self.enter()?,
            variant,
        })
    }
}

fn wrap_variant(variant: Option<&'static str>, value: Value) -> Value {
    match variant {
        Some(name) => {
            let mut map = Map::new();
            map.insert(name.to_string(), value);
            Value::Object(map)
        }
        None => value,
    }
}

impl<'a> ser::Serializer for PolicySerializer<'a> {
    type Ok = Value;
    type Error = SerializeError;

    type SerializeSeq = ArrayBuilder<'a>;
    type SerializeTuple = ArrayBuilder<'a>;
    type SerializeTupleStruct = ArrayBuilder<'a>;
    type SerializeTupleVariant = ArrayBuilder<'a>;
    type SerializeMap = ObjectBuilder<'a>;
    type SerializeStruct = ObjectBuilder<'a>;
    type SerializeStructVariant = ObjectBuilder<'a>;

    fn serialize_bool(self, v: bool) -> std::result::Result<Value, SerializeError> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> std::result::Result<Value, SerializeError> {
        Ok(Value::from(v))
    }

    fn serialize_i16(self, v: i16) -> std::result::Result<Value, SerializeError> {
        Ok(Value::from(v))
    }

    fn serialize_i32(self, v: i32) -> std::result::Result<Value, SerializeError> {
        Ok(Value::from(v))
    }

    fn serialize_i64(self, v: i64) -> std::result::Result<Value, SerializeError> {
        Ok(Value::from(v))
    }

    fn serialize_u8(self, v: u8) -> std::result::Result<Value, SerializeError> {
        Ok(Value::from(v))
    }

    fn serialize_u16(self, v: u16) -> std::result::Result<Value, SerializeError> {
        Ok(Value::from(v))
    }

    fn serialize_u32(self, v: u32) -> std::result::Result<Value, SerializeError> {
        Ok(Value::from(v))
    }

    fn serialize_u64(self, v: u64) -> std::result::Result<Value, SerializeError> {
        Ok(Value::from(v))
    }

    fn serialize_f32(self, v: f32) -> std::result::Result<Value, SerializeError> {
        Ok(Value::from(v))
    }

    fn serialize_f64(self, v: f64) -> std::result::Result<Value, SerializeError> {
        Ok(Value::from(v))
    }

    fn serialize_char(self, v: char) -> std::result::Result<Value, SerializeError> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> std::result::Result<Value, SerializeError> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> std::result::Result<Value, SerializeError> {
        Ok(Value::Array(v.iter().map(|b| Value::from(*b)).collect()))
    }

    fn serialize_none(self) -> std::result::Result<Value, SerializeError> {
        Ok(Value::Null)
    }

    fn serialize_some<T: ?Sized + Serialize>(
        self,
        value: &T,
    ) -> std::result::Result<Value, SerializeError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> std::result::Result<Value, SerializeError> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> std::result::Result<Value, SerializeError> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> std::result::Result<Value, SerializeError> {
        Ok(Value::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> std::result::Result<Value, SerializeError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> std::result::Result<Value, SerializeError> {
        let inner = value.serialize(self.enter()?)?;
        Ok(wrap_variant(Some(variant), inner))
    }

    fn serialize_seq(
        self,
        len: Option<usize>,
    ) -> std::result::Result<ArrayBuilder<'a>, SerializeError> {
        self.array(None, len)
    }

    fn serialize_tuple(self, len: usize) -> std::result::Result<ArrayBuilder<'a>, SerializeError> {
        self.array(None, Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> std::result::Result<ArrayBuilder<'a>, SerializeError> {
        self.array(None, Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> std::result::Result<ArrayBuilder<'a>, SerializeError> {
        self.array(Some(variant), Some(len))
    }

    fn serialize_map(
        self,
        _len: Option<usize>,
    ) -> std::result::Result<ObjectBuilder<'a>, SerializeError> {
        self.object(None)
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> std::result::Result<ObjectBuilder<'a>, SerializeError> {
        self.object(None)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> std::result::Result<ObjectBuilder<'a>, SerializeError> {
        self.object(Some(variant))
    }
}

struct ArrayBuilder<'a> {
    items: Vec<Value>,
    element: PolicySerializer<'a>,
    variant: Option<&'static str>,
}

impl ArrayBuilder<'_> {
    fn push<T: ?Sized + Serialize>(&mut self, value: &T) -> std::result::Result<(), SerializeError> {
        self.items.push(value.serialize(self.element)?);
        Ok(())
    }

    fn finish(self) -> Value {
        wrap_variant(self.variant, Value::Array(self.items))
    }
}

impl ser::SerializeSeq for ArrayBuilder<'_> {
    type Ok = Value;
    type Error = SerializeError;

    fn serialize_element<T: ?Sized + Serialize>(
        &mut self,
        value: &T,
    ) -> std::result::Result<(), SerializeError> {
        self.push(value)
    }

    fn end(self) -> std::result::Result<Value, SerializeError> {
        Ok(self.finish())
    }
}

impl ser::SerializeTuple for ArrayBuilder<'_> {
    type Ok = Value;
    type Error = SerializeError;

    fn serialize_element<T: ?Sized + Serialize>(
        &mut self,
        value: &T,
    ) -> std::result::Result<(), SerializeError> {
        self.push(value)
    }

    fn end(self) -> std::result::Result<Value, SerializeError> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for ArrayBuilder<'_> {
    type Ok = Value;
    type Error = SerializeError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        value: &T,
    ) -> std::result::Result<(), SerializeError> {
        self.push(value)
    }

    fn end(self) -> std::result::Result<Value, SerializeError> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleVariant for ArrayBuilder<'_> {
    type Ok = Value;
    type Error = SerializeError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        value: &T,
    ) -> std::result::Result<(), SerializeError> {
        self.push(value)
    }

    fn end(self) -> std::result::Result<Value, SerializeError> {
        Ok(self.finish())
    }
}

struct ObjectBuilder<'a> {
    fields: Map<String, Value>,
    parent: PolicySerializer<'a>,
    pending_key: Option<String>,
    variant: Option<&'static str>,
}

impl ObjectBuilder<'_> {
    fn insert<T: ?Sized + Serialize>(
        &mut self,
        key: &str,
        value: &T,
    ) -> std::result::Result<(), SerializeError> {
        let rule = self.parent.table.rule(key);
        if !self.parent.mode.includes(rule.policy) {
            return Ok(());
        }
        let child = PolicySerializer {
            table: rule.nested_table(),
            ..self.parent
        };
        let value = value.serialize(child)?;
        if !value.is_null() {
            self.fields.insert(key.to_string(), value);
        }
        Ok(())
    }

    fn finish(self) -> Value {
        wrap_variant(self.variant, Value::Object(self.fields))
    }
}

fn map_key<T: ?Sized + Serialize>(key: &T) -> std::result::Result<String, SerializeError> {
    match serde_json::to_value(key).map_err(|e| SerializeError(e.to_string()))? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(SerializeError("Map keys must be strings".to_string())),
    }
}

impl ser::SerializeMap for ObjectBuilder<'_> {
    type Ok = Value;
    type Error = SerializeError;

    fn serialize_key<T: ?Sized + Serialize>(
        &mut self,
        key: &T,
    ) -> std::result::Result<(), SerializeError> {
        self.pending_key = Some(map_key(key)?);
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(
        &mut self,
        value: &T,
    ) -> std::result::Result<(), SerializeError> {
        let key = self
            .pending_key
            .take()
            .ok_or_else(|| SerializeError("Map value serialized before its key".to_string()))?;
        self.insert(&key, value)
    }

    fn end(self) -> std::result::Result<Value, SerializeError> {
        Ok(self.finish())
    }
}

impl ser::SerializeStruct for ObjectBuilder<'_> {
    type Ok = Value;
    type Error = SerializeError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> std::result::Result<(), SerializeError> {
        self.insert(key, value)
    }

    fn end(self) -> std::result::Result<Value, SerializeError> {
        Ok(self.finish())
    }
}

impl ser::SerializeStructVariant for ObjectBuilder<'_> {
    type Ok = Value;
    type Error = SerializeError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> std::result::Result<(), SerializeError> {
        self.insert(key, value)
    }

    fn end(self) -> std::result::Result<Value, SerializeError> {
        Ok(self.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datetime::SfDateTime;
    use crate::policy::FieldPolicy;
    use serde::ser::SerializeStruct;
    use serde::Serialize;
    use serde_json::json;
    use std::sync::LazyLock;

    #[derive(Serialize, Default)]
    #[serde(rename_all = "PascalCase")]
    struct Opportunity {
        id: Option<String>,
        name: Option<String>,
        stage_name: Option<String>,
        amount: Option<f64>,
        forecast_category: Option<String>,
        close_date: Option<SfDateTime>,
        account: Option<Parent>,
    }

    #[derive(Serialize, Default)]
    #[serde(rename_all = "PascalCase")]
    struct Parent {
        id: Option<String>,
        name: Option<String>,
        rating: Option<String>,
    }

    static OPPORTUNITY: LazyLock<FieldPolicyTable> = LazyLock::new(|| {
        FieldPolicyTable::builder()
            .field("Name", FieldPolicy::CREATE_ONLY)
            .field("ForecastCategory", FieldPolicy::READ_ONLY)
            .field("Amount", FieldPolicy::UPDATE_ONLY)
            .nested("Account", FieldPolicy::EDITABLE, Parent::field_policies)
            .build()
    });

    static PARENT: LazyLock<FieldPolicyTable> = LazyLock::new(|| {
        FieldPolicyTable::builder()
            .field("Rating", FieldPolicy::READ_ONLY)
            .build()
    });

    impl FieldPolicies for Opportunity {
        fn field_policies() -> &'static FieldPolicyTable {
            &OPPORTUNITY
        }
    }

    impl FieldPolicies for Parent {
        fn field_policies() -> &'static FieldPolicyTable {
            &PARENT
        }
    }

    fn sample() -> Opportunity {
        Opportunity {
            id: Some("006xx0000000001".to_string()),
            name: Some("Big Deal".to_string()),
            stage_name: Some("Prospecting".to_string()),
            amount: Some(1000.0),
            forecast_category: Some("Pipeline".to_string()),
            close_date: None,
            account: Some(Parent {
                id: Some("001xx".to_string()),
                name: Some("Acme".to_string()),
                rating: Some("Hot".to_string()),
            }),
        }
    }

    #[test]
    fn test_create_mode_keeps_only_creatable_fields() {
        let value = to_value(&sample(), SerializationMode::Create).unwrap();
        assert_eq!(
            value,
            json!({
                "Name": "Big Deal",
                "StageName": "Prospecting",
                "Account": {"Name": "Acme"}
            })
        );
    }

    #[test]
    fn test_update_mode_keeps_only_updateable_fields() {
        let value = to_value(&sample(), SerializationMode::Update).unwrap();
        assert_eq!(
            value,
            json!({
                "StageName": "Prospecting",
                "Amount": 1000.0,
                "Account": {"Name": "Acme"}
            })
        );
    }

    #[test]
    fn test_complete_mode_keeps_everything_non_null() {
        let value = to_value(&sample(), SerializationMode::Complete).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 6);
        assert_eq!(object["Id"], "006xx0000000001");
        assert_eq!(object["Account"]["Rating"], "Hot");
        assert!(!object.contains_key("CloseDate"));
    }

    #[test]
    fn test_null_fields_are_omitted_in_every_mode() {
        let empty = Opportunity::default();
        assert_eq!(serialize_for_create(&empty).unwrap(), "{}");
        assert_eq!(serialize_for_update(&empty).unwrap(), "{}");
        assert_eq!(serialize_complete(&empty, false).unwrap(), "{}");
    }

    #[test]
    fn test_non_creatable_value_is_never_emitted() {
        let text = serialize_for_create(&sample()).unwrap();
        assert!(!text.contains("Pipeline"));
        assert!(!text.contains("006xx0000000001"));
        assert!(!text.contains("1000"));

        let text = serialize_for_update(&sample()).unwrap();
        assert!(!text.contains("Big Deal"));
        assert!(!text.contains("Pipeline"));
    }

    #[test]
    fn test_dates_use_salesforce_format() {
        let opportunity = Opportunity {
            close_date: Some("2017-11-21T19:15:25.000+0000".parse().unwrap()),
            ..Default::default()
        };
        let text = serialize_for_create(&opportunity).unwrap();
        assert_eq!(text, r#"{"CloseDate":"2017-11-21T19:15:25.000+0000"}"#);
    }

    #[test]
    fn test_dynamic_json_uses_permissive_table() {
        let record = json!({
            "Id": "001xx",
            "Name": "Acme",
            "Description": null,
            "Tags": ["a", null],
            "systemmodstamp": "2024-01-01"
        });
        let value = to_value(&record, SerializationMode::Create).unwrap();
        assert_eq!(value, json!({"Name": "Acme", "Tags": ["a", null]}));
    }

    #[test]
    fn test_sequence_elements_inherit_table() {
        let records = vec![sample(), sample()];
        let value = to_value(&records, SerializationMode::Update).unwrap();
        let items = value.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.get("Name").is_none()));
        assert!(items.iter().all(|i| i.get("Amount").is_some()));
    }

    #[test]
    fn test_indented_output() {
        let text = serialize_complete(&json!({"Name": "Acme"}), true).unwrap();
        assert_eq!(text, "{\n  \"Name\": \"Acme\"\n}");
    }

    #[test]
    fn test_table_from_runtime_metadata() {
        let table = FieldPolicyTable::builder()
            .field("Name", FieldPolicy::READ_ONLY)
            .build();
        let value = to_value_with_table(
            &json!({"Name": "Acme", "Phone": "555"}),
            SerializationMode::Update,
            &table,
        )
        .unwrap();
        assert_eq!(value, json!({"Phone": "555"}));
    }

    struct Loop;

    impl Serialize for Loop {
        fn serialize<S: ser::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
            let mut state = serializer.serialize_struct("Loop", 1)?;
            state.serialize_field("Next", self)?;
            state.end()
        }
    }

    impl FieldPolicies for Loop {}

    #[test]
    fn test_cyclic_graph_fails_fast() {
        let err = serialize_complete(&Loop, false).unwrap_err();
        match err.kind {
            ErrorKind::Serialization(message) => assert!(message.contains("64")),
            other => panic!("expected Serialization, got {other:?}"),
        }
    }

    #[test]
    fn test_enum_shapes() {
        #[derive(Serialize)]
        enum Shape {
            Unit,
            Wrapped(u8),
            Pair(u8, u8),
            Named { side: u8 },
        }

        let value = to_value_with_table(
            &vec![
                Shape::Unit,
                Shape::Wrapped(1),
                Shape::Pair(2, 3),
                Shape::Named { side: 4 },
            ],
            SerializationMode::Complete,
            FieldPolicyTable::permissive(),
        )
        .unwrap();
        assert_eq!(
            value,
            json!(["Unit", {"Wrapped": 1}, {"Pair": [2, 3]}, {"Named": {"side": 4}}])
        );
    }
}
