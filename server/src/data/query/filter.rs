//! Filter compiler
//!
//! Turns a bag of request filter values plus an entity's static filter map
//! into a WHERE fragment and the bind parameters it references.
//!
//! # SQL Injection Safety
//! Values only ever travel through the bind-parameter channel as
//! `{param:Type}` placeholders (ClickHouse server-side parameters). Column
//! names, operators and parameter names come from the static [`FilterSpec`]
//! tables, never from the request.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::Serialize;

use crate::utils::time::normalize_datetime;

/// Parameter names reserved for pagination binds
pub const RESERVED_PARAMS: &[&str] = &["limit", "offset"];

/// Comparison applied by a filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Eq,
    Gt,
    Lt,
    Gte,
    Lte,
    /// Membership in a list value
    In,
    /// Case-insensitive equality (not a substring match)
    ILike,
}

/// Store-level type of a bound value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    UInt32,
    UInt64,
    String,
    DateTime,
    /// Array of strings, used with [`FilterOperator::In`]
    StringArray,
}

impl ValueType {
    /// Element type when used inside an array membership test
    fn element(&self) -> ValueType {
        match self {
            Self::StringArray => Self::String,
            other => *other,
        }
    }

    /// Array type wrapping this type's element type
    fn array_name(&self) -> String {
        format!("Array({})", self.element())
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UInt32 => write!(f, "UInt32"),
            Self::UInt64 => write!(f, "UInt64"),
            Self::String => write!(f, "String"),
            Self::DateTime => write!(f, "DateTime"),
            Self::StringArray => write!(f, "Array(String)"),
        }
    }
}

/// One supported query filter of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSpec {
    /// Public query parameter name
    pub key: &'static str,
    /// Column in the entity table
    pub column: &'static str,
    /// Bind parameter name (unique within one filter map)
    pub param: &'static str,
    pub operator: FilterOperator,
    pub value_type: ValueType,
}

impl FilterSpec {
    pub const fn new(
        key: &'static str,
        column: &'static str,
        param: &'static str,
        operator: FilterOperator,
        value_type: ValueType,
    ) -> Self {
        Self {
            key,
            column,
            param,
            operator,
            value_type,
        }
    }

    /// Filter whose bind parameter is named after its public key
    pub const fn keyed(
        key: &'static str,
        column: &'static str,
        operator: FilterOperator,
        value_type: ValueType,
    ) -> Self {
        Self::new(key, column, key, operator, value_type)
    }

    /// Render the comparison for a (non-blank) value
    fn render(&self, value: &FilterValue) -> String {
        let placeholder = |ty: String| format!("{{{}:{}}}", self.param, ty);

        let symbol = match self.operator {
            FilterOperator::ILike => {
                return format!(
                    "lower({}) = lower({})",
                    self.column,
                    placeholder(self.value_type.to_string())
                );
            }
            FilterOperator::In => {
                return match value {
                    FilterValue::List(_) => format!(
                        "has({}, {})",
                        placeholder(self.value_type.array_name()),
                        self.column
                    ),
                    // A scalar for a membership filter is a one-element set
                    _ => format!(
                        "{} = {}",
                        self.column,
                        placeholder(self.value_type.element().to_string())
                    ),
                };
            }
            FilterOperator::Eq => "=",
            FilterOperator::Gt => ">",
            FilterOperator::Lt => "<",
            FilterOperator::Gte => ">=",
            FilterOperator::Lte => "<=",
        };

        format!(
            "{} {} {}",
            self.column,
            symbol,
            placeholder(self.value_type.to_string())
        )
    }
}

/// Check filter map invariants: unique, non-reserved bind parameter names.
pub fn validate_filter_map(filters: &[FilterSpec]) -> Result<(), String> {
    let mut seen = HashSet::new();
    for spec in filters {
        if RESERVED_PARAMS.contains(&spec.param) {
            return Err(format!(
                "filter '{}' uses reserved bind parameter '{}'",
                spec.key, spec.param
            ));
        }
        if !seen.insert(spec.param) {
            return Err(format!(
                "duplicate bind parameter '{}' (filter '{}')",
                spec.param, spec.key
            ));
        }
    }
    Ok(())
}

/// A request-supplied filter value, already type-coerced
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    Text(String),
    Unsigned(u64),
    List(Vec<String>),
}

impl FilterValue {
    /// Empty strings and empty lists mean "no filter"
    fn is_blank(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty(),
            Self::List(v) => v.is_empty(),
            Self::Unsigned(_) => false,
        }
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<u64> for FilterValue {
    fn from(value: u64) -> Self {
        Self::Unsigned(value)
    }
}

impl From<u32> for FilterValue {
    fn from(value: u32) -> Self {
        Self::Unsigned(value as u64)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// Filter values of one request keyed by public filter name.
///
/// `None` records an explicit null, which compiles the same as absence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterBag {
    values: BTreeMap<String, Option<FilterValue>>,
}

impl FilterBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value (or an explicit null) for a public filter key
    pub fn set<V: Into<FilterValue>>(&mut self, key: impl Into<String>, value: Option<V>) {
        self.values.insert(key.into(), value.map(Into::into));
    }

    /// Builder-style [`set`](Self::set)
    pub fn with<V: Into<FilterValue>>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.values.get(key).and_then(Option::as_ref)
    }
}

/// Bind parameter name to value
pub type BoundParams = BTreeMap<String, FilterValue>;

/// Output of [`compile`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledFilter {
    /// Conditions joined with AND, without the WHERE keyword (empty if none)
    pub clause: String,
    pub params: BoundParams,
}

impl CompiledFilter {
    /// ` WHERE <clause>` or an empty string, for appending after `FROM table`
    pub fn where_sql(&self) -> String {
        if self.clause.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clause)
        }
    }
}

/// Compile request filters against an entity's filter map.
///
/// Filters are visited in map order so identical input always yields an
/// identical clause. Keys in `raw` that the map does not know are ignored.
pub fn compile(raw: &FilterBag, filters: &[FilterSpec]) -> CompiledFilter {
    let mut conditions = Vec::new();
    let mut params = BoundParams::new();

    for spec in filters {
        let Some(value) = raw.get(spec.key) else {
            continue;
        };
        if value.is_blank() {
            continue;
        }

        let value = match (spec.value_type, value) {
            (ValueType::DateTime, FilterValue::Text(ts)) => {
                FilterValue::Text(normalize_datetime(ts))
            }
            _ => value.clone(),
        };

        conditions.push(spec.render(&value));
        params.insert(spec.param.to_string(), value);
    }

    CompiledFilter {
        clause: conditions.join(" AND "),
        params,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use FilterOperator::*;
    use ValueType::{DateTime, StringArray, UInt32, UInt64};

    const CHAIN_ONLY: &[FilterSpec] = &[FilterSpec::keyed("chain", "chain", Eq, UInt64)];

    const BLOCK_LIKE: &[FilterSpec] = &[
        FilterSpec::keyed("chain", "chain", Eq, UInt64),
        FilterSpec::new("block_number", "number", "block_number", Eq, UInt32),
        FilterSpec::new("from_block", "number", "from_block", Gte, UInt32),
        FilterSpec::new("to_block", "number", "to_block", Lte, UInt32),
        FilterSpec::new("from_timestamp", "timestamp", "from_ts", Gte, DateTime),
        FilterSpec::new("to_timestamp", "timestamp", "to_ts", Lte, DateTime),
        FilterSpec::keyed("miner", "miner", ILike, ValueType::String),
        FilterSpec::keyed("hash", "hash", Eq, ValueType::String),
        FilterSpec::keyed("types", "type", In, StringArray),
    ];

    #[test]
    fn test_compile_chain_scenario() {
        let raw = FilterBag::new().with("chain", Some(10143u64));
        let compiled = compile(&raw, CHAIN_ONLY);

        assert_eq!(compiled.clause, "chain = {chain:UInt64}");
        assert_eq!(compiled.where_sql(), " WHERE chain = {chain:UInt64}");
        assert_eq!(compiled.params.len(), 1);
        assert_eq!(compiled.params["chain"], FilterValue::Unsigned(10143));
    }

    #[test]
    fn test_compile_no_filters() {
        let compiled = compile(&FilterBag::new(), BLOCK_LIKE);
        assert_eq!(compiled.clause, "");
        assert_eq!(compiled.where_sql(), "");
        assert!(compiled.params.is_empty());
    }

    #[test]
    fn test_compile_skips_null_and_empty() {
        let raw = FilterBag::new()
            .with("chain", None::<u64>)
            .with("miner", Some(""))
            .with("types", Some(Vec::<String>::new()))
            .with("hash", Some("0xabc"));
        let compiled = compile(&raw, BLOCK_LIKE);

        assert_eq!(compiled.clause, "hash = {hash:String}");
        assert_eq!(compiled.params.len(), 1);
        assert!(!compiled.params.contains_key("chain"));
        assert!(!compiled.params.contains_key("miner"));
    }

    #[test]
    fn test_compile_zero_is_a_filter() {
        let raw = FilterBag::new().with("block_number", Some(0u32));
        let compiled = compile(&raw, BLOCK_LIKE);
        assert_eq!(compiled.clause, "number = {block_number:UInt32}");
        assert_eq!(compiled.params["block_number"], FilterValue::Unsigned(0));
    }

    #[test]
    fn test_compile_uses_param_name_not_key() {
        let raw = FilterBag::new().with("from_timestamp", Some("2024-01-15T10:30:00Z"));
        let compiled = compile(&raw, BLOCK_LIKE);

        assert_eq!(compiled.clause, "timestamp >= {from_ts:DateTime}");
        assert!(!compiled.params.contains_key("from_timestamp"));
        assert_eq!(
            compiled.params["from_ts"],
            FilterValue::Text("2024-01-15 10:30:00".to_string())
        );
    }

    #[test]
    fn test_compile_datetime_offset_normalized() {
        let raw = FilterBag::new().with("to_timestamp", Some("2024-01-15T10:30:00+02:00"));
        let compiled = compile(&raw, BLOCK_LIKE);
        assert_eq!(
            compiled.params["to_ts"],
            FilterValue::Text("2024-01-15 10:30:00".to_string())
        );
    }

    #[test]
    fn test_compile_case_insensitive_equality() {
        let raw = FilterBag::new().with("miner", Some("0xABC"));
        let compiled = compile(&raw, BLOCK_LIKE);

        assert_eq!(compiled.clause, "lower(miner) = lower({miner:String})");
        // Value is bound as given; folding happens in the store
        assert_eq!(compiled.params["miner"], FilterValue::Text("0xABC".into()));
    }

    #[test]
    fn test_compile_membership_list() {
        let raw = FilterBag::new().with(
            "types",
            Some(vec!["ERC20".to_string(), "ERC721".to_string()]),
        );
        let compiled = compile(&raw, BLOCK_LIKE);

        assert_eq!(compiled.clause, "has({types:Array(String)}, type)");
        assert_eq!(
            compiled.params["types"],
            FilterValue::List(vec!["ERC20".into(), "ERC721".into()])
        );
    }

    #[test]
    fn test_compile_membership_scalar_degrades_to_equality() {
        let raw = FilterBag::new().with("types", Some("ERC20"));
        let compiled = compile(&raw, BLOCK_LIKE);
        assert_eq!(compiled.clause, "type = {types:String}");
    }

    #[test]
    fn test_compile_joins_in_map_order() {
        let raw = FilterBag::new()
            .with("to_block", Some(200u32))
            .with("chain", Some(1u64))
            .with("from_block", Some(100u32));
        let compiled = compile(&raw, BLOCK_LIKE);

        assert_eq!(
            compiled.clause,
            "chain = {chain:UInt64} AND number >= {from_block:UInt32} AND number <= {to_block:UInt32}"
        );
        assert_eq!(compiled.params.len(), 3);
    }

    #[test]
    fn test_compile_ignores_unknown_keys() {
        let raw = FilterBag::new().with("order_by", Some("1; DROP TABLE blocks"));
        let compiled = compile(&raw, BLOCK_LIKE);
        assert!(compiled.clause.is_empty());
        assert!(compiled.params.is_empty());
    }

    #[test]
    fn test_compile_injection_shaped_values_stay_bound() {
        let hostile = [
            "' OR 1=1 --",
            "0xabc'; DROP TABLE blocks; --",
            "}; SELECT 1; {",
            "\\' UNION SELECT *",
        ];
        let expected = compile(&FilterBag::new().with("hash", Some("x")), BLOCK_LIKE).clause;

        for input in hostile {
            let compiled = compile(&FilterBag::new().with("hash", Some(input)), BLOCK_LIKE);
            assert_eq!(compiled.clause, expected);
            assert!(!compiled.clause.contains(input));
            assert_eq!(compiled.params["hash"], FilterValue::Text(input.to_string()));
        }
    }

    #[test]
    fn test_compile_is_deterministic() {
        let raw = FilterBag::new()
            .with("miner", Some("0xabc"))
            .with("chain", Some(10143u64))
            .with("from_timestamp", Some("2024-01-15T10:30:00Z"));
        assert_eq!(compile(&raw, BLOCK_LIKE), compile(&raw, BLOCK_LIKE));
    }

    #[test]
    fn test_operator_rendering() {
        let specs = [
            FilterSpec::keyed("a", "col_a", Gt, UInt64),
            FilterSpec::keyed("b", "col_b", Lt, UInt64),
            FilterSpec::keyed("c", "col_c", Gte, UInt32),
            FilterSpec::keyed("d", "col_d", Lte, UInt32),
            FilterSpec::keyed("e", "col_e", Eq, UInt32),
        ];
        let raw = FilterBag::new()
            .with("a", Some(5u64))
            .with("b", Some(7u64))
            .with("c", Some(1u32))
            .with("d", Some(2u32))
            .with("e", Some(3u32));
        let compiled = compile(&raw, &specs);
        assert_eq!(
            compiled.clause,
            "col_a > {a:UInt64} AND col_b < {b:UInt64} AND col_c >= {c:UInt32} AND col_d <= {d:UInt32} AND col_e = {e:UInt32}"
        );
    }

    #[test]
    fn test_membership_and_folded_operators_render_without_symbol() {
        let specs = [
            FilterSpec::keyed("names", "name", In, StringArray),
            FilterSpec::keyed("one", "kind", In, StringArray),
            FilterSpec::keyed("addr", "address", ILike, ValueType::String),
        ];
        let raw = FilterBag::new()
            .with("names", Some(vec!["a".to_string()]))
            .with("one", Some("b"))
            .with("addr", Some("0xAB"));
        let compiled = compile(&raw, &specs);
        assert_eq!(
            compiled.clause,
            "has({names:Array(String)}, name) AND kind = {one:String} AND lower(address) = lower({addr:String})"
        );
        assert!(!compiled.clause.contains("IN"));
        assert!(!compiled.clause.contains("ILIKE"));
    }

    #[test]
    fn test_validate_filter_map() {
        assert!(validate_filter_map(BLOCK_LIKE).is_ok());

        let duplicate = [
            FilterSpec::new("from_block", "number", "block", Gte, UInt32),
            FilterSpec::new("to_block", "number", "block", Lte, UInt32),
        ];
        let err = validate_filter_map(&duplicate).unwrap_err();
        assert!(err.contains("duplicate bind parameter 'block'"));

        let reserved = [FilterSpec::keyed("limit", "limit", Eq, UInt32)];
        assert!(validate_filter_map(&reserved).unwrap_err().contains("reserved"));
    }

    #[test]
    fn test_filter_value_serializes_untagged() {
        assert_eq!(
            serde_json::to_value(FilterValue::Unsigned(5)).unwrap(),
            serde_json::json!(5)
        );
        assert_eq!(
            serde_json::to_value(FilterValue::List(vec!["a".into()])).unwrap(),
            serde_json::json!(["a"])
        );
    }
}
