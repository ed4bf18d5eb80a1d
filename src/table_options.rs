//! Table-level storage options and their CQL rendering.
//!
//! The vocabulary is closed: every known option maps to exactly one [`OptionKind`],
//! which decides how its value is written into the `WITH` clause of a `CREATE TABLE`.
//! Names outside the vocabulary are kept as [`TableOption::Other`] and rendered as
//! quoted strings.

use crate::error::{Result, SchemaError};
use phf::phf_map;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

static NAMES: phf::Map<&'static str, TableOption> = phf_map! {
	"compactStorage" => TableOption::CompactStorage,
	"clusteringOrder" => TableOption::ClusteringOrder,
	"comment" => TableOption::Comment,
	"speculative_retry" => TableOption::SpeculativeRetry,
	"additional_write_policy" => TableOption::AdditionalWritePolicy,
	"gc_grace_seconds" => TableOption::GcGraceSeconds,
	"bloom_filter_fp_chance" => TableOption::BloomFilterFpChance,
	"default_time_to_live" => TableOption::DefaultTimeToLive,
	"compaction" => TableOption::Compaction,
	"compression" => TableOption::Compression,
	"caching" => TableOption::Caching,
	"memtable_flush_period_in_ms" => TableOption::MemtableFlushPeriodInMs,
	"read_repair" => TableOption::ReadRepair,
};

/// A table option name. Variant order is rendering order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum TableOption {
	CompactStorage,
	ClusteringOrder,
	Comment,
	SpeculativeRetry,
	AdditionalWritePolicy,
	GcGraceSeconds,
	BloomFilterFpChance,
	DefaultTimeToLive,
	Compaction,
	Compression,
	Caching,
	MemtableFlushPeriodInMs,
	ReadRepair,
	Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
	/// `COMPACT STORAGE` when truthy, nothing otherwise.
	Flag,
	/// `CLUSTERING ORDER BY (<value>)`, value inserted verbatim.
	Clause,
	/// `name = value`, value must be numeric.
	Numeric,
	/// `name = value`, value is a caller-supplied CQL map literal.
	MapLiteral,
	/// `name = 'value'` with quotes escaped.
	Text,
}

impl TableOption {
	/// Every known option, in rendering order.
	pub const VOCABULARY: [TableOption; 13] = [
		TableOption::CompactStorage,
		TableOption::ClusteringOrder,
		TableOption::Comment,
		TableOption::SpeculativeRetry,
		TableOption::AdditionalWritePolicy,
		TableOption::GcGraceSeconds,
		TableOption::BloomFilterFpChance,
		TableOption::DefaultTimeToLive,
		TableOption::Compaction,
		TableOption::Compression,
		TableOption::Caching,
		TableOption::MemtableFlushPeriodInMs,
		TableOption::ReadRepair,
	];

	/// Case-sensitive lookup; unknown names become [`TableOption::Other`].
	pub fn from_name(name: &str) -> Self {
		NAMES.get(name).cloned().unwrap_or_else(|| TableOption::Other(name.to_string()))
	}

	pub fn name(&self) -> &str {
		match self {
			TableOption::CompactStorage => "compactStorage",
			TableOption::ClusteringOrder => "clusteringOrder",
			TableOption::Comment => "comment",
			TableOption::SpeculativeRetry => "speculative_retry",
			TableOption::AdditionalWritePolicy => "additional_write_policy",
			TableOption::GcGraceSeconds => "gc_grace_seconds",
			TableOption::BloomFilterFpChance => "bloom_filter_fp_chance",
			TableOption::DefaultTimeToLive => "default_time_to_live",
			TableOption::Compaction => "compaction",
			TableOption::Compression => "compression",
			TableOption::Caching => "caching",
			TableOption::MemtableFlushPeriodInMs => "memtable_flush_period_in_ms",
			TableOption::ReadRepair => "read_repair",
			TableOption::Other(name) => name,
		}
	}

	pub fn kind(&self) -> OptionKind {
		match self {
			TableOption::CompactStorage => OptionKind::Flag,
			TableOption::ClusteringOrder => OptionKind::Clause,
			TableOption::GcGraceSeconds
			| TableOption::MemtableFlushPeriodInMs
			| TableOption::DefaultTimeToLive
			| TableOption::BloomFilterFpChance => OptionKind::Numeric,
			TableOption::Compaction | TableOption::Compression | TableOption::Caching => OptionKind::MapLiteral,
			TableOption::Comment
			| TableOption::SpeculativeRetry
			| TableOption::AdditionalWritePolicy
			| TableOption::ReadRepair
			| TableOption::Other(_) => OptionKind::Text,
		}
	}

	/// Renders one option as a CQL fragment. `Ok(None)` means the option emits nothing.
	pub fn format(&self, value: &OptionValue) -> Result<Option<String>> {
		let fragment = match self.kind() {
			OptionKind::Flag => {
				if !value.is_truthy() {
					return Ok(None);
				}
				"COMPACT STORAGE".to_string()
			},
			OptionKind::Clause => format!("CLUSTERING ORDER BY ({})", value),
			OptionKind::Numeric => {
				if !value.is_numeric() {
					return Err(SchemaError::InvalidOptionValue {
						option: self.name().to_string(),
						value: value.to_string(),
					});
				}
				format!("{} = {}", self.name(), value)
			},
			OptionKind::MapLiteral => format!("{} = {}", self.name(), value),
			OptionKind::Text => format!("{} = '{}'", self.name(), value.to_string().replace('\'', "''")),
		};
		Ok(Some(fragment))
	}
}

impl From<String> for TableOption {
	fn from(name: String) -> Self {
		TableOption::from_name(&name)
	}
}

impl From<TableOption> for String {
	fn from(option: TableOption) -> Self {
		match option {
			TableOption::Other(name) => name,
			known => known.name().to_string(),
		}
	}
}

impl fmt::Display for TableOption {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
	Bool(bool),
	Int(i64),
	Float(f64),
	Text(String),
}

impl OptionValue {
	pub fn is_truthy(&self) -> bool {
		match self {
			OptionValue::Bool(b) => *b,
			OptionValue::Int(i) => *i != 0,
			OptionValue::Float(f) => *f != 0.0,
			OptionValue::Text(s) => !s.is_empty() && s != "0",
		}
	}

	pub fn is_numeric(&self) -> bool {
		match self {
			OptionValue::Bool(_) => false,
			OptionValue::Int(_) => true,
			OptionValue::Float(f) => f.is_finite(),
			OptionValue::Text(s) => s.trim().parse::<f64>().map(f64::is_finite).unwrap_or(false),
		}
	}
}

impl fmt::Display for OptionValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			OptionValue::Bool(b) => write!(f, "{}", b),
			OptionValue::Int(i) => write!(f, "{}", i),
			OptionValue::Float(x) => write!(f, "{}", x),
			OptionValue::Text(s) => f.write_str(s),
		}
	}
}

impl From<bool> for OptionValue {
	fn from(value: bool) -> Self {
		OptionValue::Bool(value)
	}
}

impl From<i64> for OptionValue {
	fn from(value: i64) -> Self {
		OptionValue::Int(value)
	}
}

impl From<f64> for OptionValue {
	fn from(value: f64) -> Self {
		OptionValue::Float(value)
	}
}

impl From<&str> for OptionValue {
	fn from(value: &str) -> Self {
		OptionValue::Text(value.to_string())
	}
}

/// Formats an option given by name.
pub fn format_option(name: &str, value: &OptionValue) -> Result<Option<String>> {
	TableOption::from_name(name).format(value)
}

/// Option values keyed by option; a `None` value means "not set".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableOptions(BTreeMap<TableOption, Option<OptionValue>>);

impl TableOptions {
	/// An empty mapping, as opposed to [`Default`] which lists the whole vocabulary unset.
	pub fn empty() -> Self {
		Self(BTreeMap::new())
	}

	pub fn set(&mut self, option: TableOption, value: impl Into<OptionValue>) -> &mut Self {
		self.0.insert(option, Some(value.into()));
		self
	}

	pub fn with(mut self, name: &str, value: impl Into<OptionValue>) -> Self {
		self.set(TableOption::from_name(name), value);
		self
	}

	pub fn get(&self, option: &TableOption) -> Option<&OptionValue> {
		self.0.get(option).and_then(Option::as_ref)
	}

	/// Options that carry a value, in rendering order.
	pub fn iter_set(&self) -> impl Iterator<Item = (&TableOption, &OptionValue)> {
		self.0.iter().filter_map(|(option, value)| value.as_ref().map(|value| (option, value)))
	}

	pub fn is_empty(&self) -> bool {
		self.iter_set().next().is_none()
	}

	/// Renders the ` WITH ...` clause, or an empty string when no option emits anything.
	pub fn to_cql(&self) -> Result<String> {
		let mut fragments = Vec::new();
		for (option, value) in self.iter_set() {
			if let Some(fragment) = option.format(value)? {
				fragments.push(fragment);
			}
		}
		if fragments.is_empty() {
			return Ok(String::new());
		}
		Ok(format!(" WITH {}", fragments.join(" AND ")))
	}
}

impl Default for TableOptions {
	fn default() -> Self {
		Self(TableOption::VOCABULARY.iter().cloned().map(|option| (option, None)).collect())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_numeric_option() {
		assert_eq!(format_option("gc_grace_seconds", &"5".into()).unwrap().unwrap(), "gc_grace_seconds = 5");
		assert_eq!(
			format_option("bloom_filter_fp_chance", &OptionValue::Float(0.01)).unwrap().unwrap(),
			"bloom_filter_fp_chance = 0.01"
		);
		assert_eq!(
			format_option("default_time_to_live", &OptionValue::Int(3600)).unwrap().unwrap(),
			"default_time_to_live = 3600"
		);
	}

	#[test]
	fn test_numeric_option_rejects_non_numeric() {
		let err = format_option("gc_grace_seconds", &"abc".into()).unwrap_err();
		assert!(matches!(err, SchemaError::InvalidOptionValue { ref option, ref value }
			if option == "gc_grace_seconds" && value == "abc"));
		assert!(format_option("memtable_flush_period_in_ms", &OptionValue::Bool(true)).is_err());
		assert!(format_option("default_time_to_live", &"inf".into()).is_err());
	}

	#[test]
	fn test_map_literal_option_is_unquoted() {
		let value = OptionValue::from("{'class': 'LZ4Compressor'}");
		assert_eq!(format_option("compression", &value).unwrap().unwrap(), "compression = {'class': 'LZ4Compressor'}");
	}

	#[test]
	fn test_string_option_escapes_quotes() {
		let value = OptionValue::from("it's a table");
		assert_eq!(format_option("comment", &value).unwrap().unwrap(), "comment = 'it''s a table'");
		assert_eq!(format_option("speculative_retry", &"99PERCENTILE".into()).unwrap().unwrap(), "speculative_retry = '99PERCENTILE'");
	}

	#[test]
	fn test_unknown_option_falls_through_to_string() {
		assert_eq!(TableOption::from_name("cdc"), TableOption::Other("cdc".to_string()));
		assert_eq!(format_option("cdc", &OptionValue::Bool(true)).unwrap().unwrap(), "cdc = 'true'");
		// lookup is case-sensitive
		assert_eq!(TableOption::from_name("CompactStorage").kind(), OptionKind::Text);
	}

	#[test]
	fn test_flag_and_clause() {
		assert_eq!(format_option("compactStorage", &OptionValue::Bool(true)).unwrap().unwrap(), "COMPACT STORAGE");
		assert_eq!(format_option("compactStorage", &OptionValue::Bool(false)).unwrap(), None);
		assert_eq!(format_option("compactStorage", &"0".into()).unwrap(), None);
		assert_eq!(
			format_option("clusteringOrder", &"date DESC".into()).unwrap().unwrap(),
			"CLUSTERING ORDER BY (date DESC)"
		);
	}

	#[test]
	fn test_with_clause_ordering() {
		let options = TableOptions::empty()
			.with("comment", "events")
			.with("gc_grace_seconds", 10i64)
			.with("clusteringOrder", "date DESC")
			.with("zzz_custom", "x")
			.with("compactStorage", true);
		assert_eq!(
			options.to_cql().unwrap(),
			" WITH COMPACT STORAGE AND CLUSTERING ORDER BY (date DESC) AND comment = 'events' AND gc_grace_seconds = 10 \
			 AND zzz_custom = 'x'"
		);
	}

	#[test]
	fn test_default_options_render_nothing() {
		let options = TableOptions::default();
		assert_eq!(options.iter_set().count(), 0);
		assert!(options.is_empty());
		assert_eq!(options.to_cql().unwrap(), "");
		assert_eq!(TableOptions::empty().with("compactStorage", false).to_cql().unwrap(), "");
	}

	#[test]
	fn test_options_deserialize_from_json() {
		let options: TableOptions =
			serde_json::from_str(r#"{"compactStorage": true, "comment": null, "gc_grace_seconds": 5}"#).unwrap();
		assert_eq!(options.get(&TableOption::CompactStorage), Some(&OptionValue::Bool(true)));
		assert_eq!(options.get(&TableOption::Comment), None);
		assert_eq!(options.to_cql().unwrap(), " WITH COMPACT STORAGE AND gc_grace_seconds = 5");
	}
}
