use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single measurement produced by a module.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
    Map(BTreeMap<String, MetricValue>),
}

impl MetricValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, MetricValue>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<usize> for MetricValue {
    fn from(value: usize) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&str> for MetricValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for MetricValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<BTreeMap<String, MetricValue>> for MetricValue {
    fn from(value: BTreeMap<String, MetricValue>) -> Self {
        Self::Map(value)
    }
}

impl<V: Into<MetricValue>> FromIterator<(String, V)> for MetricValue {
    fn from_iter<T: IntoIterator<Item = (String, V)>>(iter: T) -> Self {
        Self::Map(iter.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

/// Named metrics produced by one module in one run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricsBundle {
    module_name: String,
    values: BTreeMap<String, MetricValue>,
}

impl MetricsBundle {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            values: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<MetricValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<MetricValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub(crate) fn rename(mut self, module_name: &str) -> Self {
        if self.module_name != module_name {
            self.module_name = module_name.to_string();
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&MetricValue> {
        self.values.get(key)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(MetricValue::as_number)
    }

    pub fn map(&self, key: &str) -> Option<&BTreeMap<String, MetricValue>> {
        self.get(key).and_then(MetricValue::as_map)
    }

    pub fn values(&self) -> &BTreeMap<String, MetricValue> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let avg = mean(values);
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Summary statistics as a metric map: min, max, mean, median, std_dev.
pub fn describe(values: &[f64]) -> MetricValue {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut map = BTreeMap::new();
    map.insert("min".into(), MetricValue::Number(if values.is_empty() { 0.0 } else { min }));
    map.insert("max".into(), MetricValue::Number(if values.is_empty() { 0.0 } else { max }));
    map.insert("mean".into(), MetricValue::Number(mean(values)));
    map.insert("median".into(), MetricValue::Number(median(values)));
    map.insert("std_dev".into(), MetricValue::Number(std_dev(values)));
    MetricValue::Map(map)
}

/// Share of `part` in `whole`, zero for an empty whole.
pub fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}
