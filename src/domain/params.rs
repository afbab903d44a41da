//! Strategy parameters and parameter grids.

use std::fmt;
use std::str::FromStr;

/// A single parameter value. Integers stay integers so that windows print
/// and round-trip without a trailing `.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
}

impl ParamValue {
    pub fn as_f64(&self) -> f64 {
        match *self {
            ParamValue::Int(v) => v as f64,
            ParamValue::Float(v) => v,
        }
    }

    /// Whole, non-negative values only (`20` and `20.0` both qualify).
    pub fn as_usize(&self) -> Option<usize> {
        match *self {
            ParamValue::Int(v) => usize::try_from(v).ok(),
            ParamValue::Float(v) if v >= 0.0 && v.fract() == 0.0 && v.is_finite() => {
                Some(v as usize)
            }
            ParamValue::Float(_) => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{v}"),
        }
    }
}

impl FromStr for ParamValue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(v) = s.parse::<i64>() {
            return Ok(ParamValue::Int(v));
        }
        match s.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(ParamValue::Float(v)),
            _ => Err(format!("not a number: {s:?}")),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

/// One concrete parameter combination, in grid declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParamSet {
    entries: Vec<(String, ParamValue)>,
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name`, replacing any earlier value in place.
    pub fn with(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.set(name, value.into());
        self
    }

    pub fn set(&mut self, name: &str, value: ParamValue) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<ParamValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ParamValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), *v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for ParamSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str("}")
    }
}

/// Ordered mapping from parameter name to candidate values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParamGrid {
    axes: Vec<(String, Vec<ParamValue>)>,
}

impl ParamGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values<V: Into<ParamValue>>(
        mut self,
        name: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.insert(name, values.into_iter().map(Into::into).collect());
        self
    }

    /// Adds an axis, or replaces the values of an existing one in place.
    pub fn insert(&mut self, name: &str, values: Vec<ParamValue>) {
        match self.axes.iter_mut().find(|(n, _)| n == name) {
            Some(axis) => axis.1 = values,
            None => self.axes.push((name.to_string(), values)),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.axes.iter().map(|(n, _)| n.as_str())
    }

    pub fn values(&self, name: &str) -> Option<&[ParamValue]> {
        self.axes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    /// Number of combinations in the Cartesian product.
    pub fn size(&self) -> usize {
        self.axes.iter().map(|(_, v)| v.len()).product()
    }

    /// Cartesian product in nested-loop order: the first axis varies slowest.
    pub fn combinations(&self) -> Vec<ParamSet> {
        self.axes
            .iter()
            .fold(vec![ParamSet::new()], |acc, (name, values)| {
                acc.iter()
                    .flat_map(|prefix| {
                        values
                            .iter()
                            .map(move |&v| prefix.clone().with(name, v))
                    })
                    .collect()
            })
    }

    /// Parses `name=v1,v2;name2=v3` as used on the command line.
    pub fn parse(spec: &str) -> Result<Self, String> {
        let mut grid = ParamGrid::new();
        for axis in spec.split(';').map(str::trim).filter(|a| !a.is_empty()) {
            let (name, values) = axis
                .split_once('=')
                .ok_or_else(|| format!("expected name=values, got {axis:?}"))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(format!("missing parameter name in {axis:?}"));
            }
            grid.insert(name, parse_values(values)?);
        }
        Ok(grid)
    }
}

/// Parses a comma-separated value list.
pub fn parse_values(list: &str) -> Result<Vec<ParamValue>, String> {
    list.split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::parse)
        .collect()
}
