// SPDX-License-Identifier: MIT OR Apache-2.0
//! Socket definitions for processor inputs/outputs.
//!
//! Inputs carry a typed literal value used when nothing is linked, outputs
//! fan out to any number of inputs. Links are stored as ids on both ends
//! and only [`ProcessingGraph`](crate::graph::ProcessingGraph) mutates them.

use crate::io_type::IoType;
use crate::processor::ProcessorId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{self, Debug};
use uuid::Uuid;

/// Unique identifier for an input socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputId(pub Uuid);

impl InputId {
    /// Create a new random input ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InputId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for an output socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputId(pub Uuid);

impl OutputId {
    /// Create a new random output ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OutputId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Number type usable as a bounded socket value
pub trait Numeric: Copy + PartialOrd + Debug {
    /// Default lower bound
    const LOWEST: Self;
    /// Default upper bound
    const HIGHEST: Self;
    /// Step used when the bounds are the defaults
    const UNIT_STEP: Self;

    /// Step derived from custom bounds
    fn span_step(min: Self, max: Self) -> Self;

    /// Code literal for this number
    fn render(self) -> String;
}

impl Numeric for i64 {
    const LOWEST: Self = i64::MIN;
    const HIGHEST: Self = i64::MAX;
    const UNIT_STEP: Self = 1;

    fn span_step(min: Self, max: Self) -> Self {
        (max.saturating_sub(min) / 100).max(1)
    }

    fn render(self) -> String {
        self.to_string()
    }
}

impl Numeric for f64 {
    const LOWEST: Self = f64::MIN;
    const HIGHEST: Self = f64::MAX;
    const UNIT_STEP: Self = 1.0;

    fn span_step(min: Self, max: Self) -> Self {
        let step = (max - min) / 100.0;
        if step > 0.0 && step.is_finite() {
            step
        } else {
            Self::UNIT_STEP
        }
    }

    fn render(self) -> String {
        // Debug keeps the decimal point on whole numbers
        format!("{self:?}")
    }
}

/// Bounded numeric value; always kept within `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericValue<T> {
    value: T,
    min: T,
    max: T,
    step: T,
    /// Alternative display (slider instead of drag field)
    pub alt: bool,
}

impl<T: Numeric> NumericValue<T> {
    /// Create a value with optional bounds and step
    pub fn new(value: T, min: Option<T>, max: Option<T>, step: Option<T>, alt: bool) -> Self {
        let mut min = min.map_or(T::LOWEST, |m| ordered_or(m, T::LOWEST));
        let mut max = max.map_or(T::HIGHEST, |m| ordered_or(m, T::HIGHEST));
        if min > max {
            std::mem::swap(&mut min, &mut max);
        }
        let step = step.unwrap_or_else(|| Self::fallback_step(min, max));
        Self {
            value: clamp(value, min, max),
            min,
            max,
            step,
            alt,
        }
    }

    /// Unbounded value with the default step
    pub fn unbounded(value: T) -> Self {
        Self::new(value, None, None, None, false)
    }

    fn fallback_step(min: T, max: T) -> T {
        if min == T::LOWEST || max == T::HIGHEST {
            T::UNIT_STEP
        } else {
            T::span_step(min, max)
        }
    }

    /// Current value
    pub fn get(&self) -> T {
        self.value
    }

    /// Set the value, clamped into the bounds
    pub fn set(&mut self, value: T) {
        self.value = clamp(value, self.min, self.max);
    }

    /// Lower bound
    pub fn min(&self) -> T {
        self.min
    }

    /// Upper bound
    pub fn max(&self) -> T {
        self.max
    }

    /// Edit step
    pub fn step(&self) -> T {
        self.step
    }

    /// Whether the bounds are the type defaults
    pub fn has_default_bounds(&self) -> bool {
        self.min == T::LOWEST && self.max == T::HIGHEST
    }

    /// Whether the step is what the bounds would yield on their own
    pub fn has_default_step(&self) -> bool {
        self.step == Self::fallback_step(self.min, self.max)
    }

    fn script_args(&self) -> Vec<Option<String>> {
        let bounded = !self.has_default_bounds();
        vec![
            Some(self.value.render()),
            bounded.then(|| self.min.render()),
            bounded.then(|| self.max.render()),
            self.alt.then(|| "true".to_string()),
            (!self.has_default_step()).then(|| self.step.render()),
        ]
    }
}

/// Clamp into `[min, max]`; an unordered value (NaN) falls back to `min`
fn clamp<T: PartialOrd>(value: T, min: T, max: T) -> T {
    match (value.partial_cmp(&min), value.partial_cmp(&max)) {
        (None, _) | (_, None) | (Some(Ordering::Less), _) => min,
        (_, Some(Ordering::Greater)) => max,
        _ => value,
    }
}

/// `bound` unless it is unordered
fn ordered_or<T: PartialOrd>(bound: T, fallback: T) -> T {
    if bound.partial_cmp(&bound).is_some() {
        bound
    } else {
        fallback
    }
}

/// String or path value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextValue {
    /// Text content
    pub value: String,
    /// Alternative display (multi-line editor / save dialog)
    pub alt: bool,
    /// File dialog filter (paths only)
    pub filter: String,
}

impl TextValue {
    /// Create a plain text value
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }
}

/// Enumerated choice
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListValue {
    items: Vec<String>,
    selected: usize,
}

impl ListValue {
    /// Create a list with the given items and selection
    pub fn new(items: Vec<String>, selected: usize) -> Self {
        let mut list = Self { items, selected: 0 };
        list.select(selected);
        list
    }

    /// Available items
    pub fn items(&self) -> &[String] {
        &self.items
    }

    /// Selected index
    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Select an item, clamped to the last one
    pub fn select(&mut self, index: usize) {
        self.selected = index.min(self.items.len().saturating_sub(1));
    }
}

/// Fixed-size vector with shared component bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorValue {
    components: Vec<f64>,
    min: f64,
    max: f64,
    /// Alternative display (color picker)
    pub alt: bool,
}

impl VectorValue {
    /// Create a vector of `len` components; missing components are zero
    pub fn new(len: usize, components: &[f64], min: Option<f64>, max: Option<f64>, alt: bool) -> Self {
        let mut min = min.map_or(f64::MIN, |m| ordered_or(m, f64::MIN));
        let mut max = max.map_or(f64::MAX, |m| ordered_or(m, f64::MAX));
        if min > max {
            std::mem::swap(&mut min, &mut max);
        }
        let components = (0..len)
            .map(|i| clamp(components.get(i).copied().unwrap_or(0.0), min, max))
            .collect();
        Self {
            components,
            min,
            max,
            alt,
        }
    }

    /// Components
    pub fn components(&self) -> &[f64] {
        &self.components
    }

    /// Set one component, clamped into the bounds; out-of-range index is ignored
    pub fn set(&mut self, index: usize, value: f64) {
        let (min, max) = (self.min, self.max);
        if let Some(c) = self.components.get_mut(index) {
            *c = clamp(value, min, max);
        }
    }

    /// Lower bound
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Upper bound
    pub fn max(&self) -> f64 {
        self.max
    }

    fn literal(&self) -> String {
        let parts: Vec<String> = self.components.iter().map(|c| c.render()).collect();
        format!("{{{}}}", parts.join(", "))
    }
}

/// Argument of a socket declaration, as read from a node definition
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    /// `nil`, meaning "use the default"
    Nil,
    /// Boolean literal
    Bool(bool),
    /// Numeric literal
    Number(f64),
    /// Quoted string
    Text(String),
    /// Braced list
    Array(Vec<ArgValue>),
}

impl ArgValue {
    fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Typed literal carried by an input
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum SocketValue {
    /// No literal
    #[default]
    Undef,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(NumericValue<i64>),
    /// Scalar
    Scalar(NumericValue<f64>),
    /// String
    String(TextValue),
    /// Path
    Path(TextValue),
    /// Enumerated choice
    List(ListValue),
    /// 3D vector
    Vec3(VectorValue),
    /// 4D vector
    Vec4(VectorValue),
    /// Implicit surface (link only)
    Implicit,
    /// Shape (link only)
    Shape,
    /// Field (link only)
    Field,
}

impl SocketValue {
    /// Default literal for a socket type
    pub fn default_for(ty: IoType) -> Self {
        Self::from_args(ty, &[])
    }

    /// Build a value from declaration arguments, interpreted per type:
    ///
    /// - boolean: `value`
    /// - int/scalar: `value, min, max, alt, step`
    /// - string/path: `value, alt, filter`
    /// - vec3/vec4: `{components}, min, max, alt`
    /// - list: `{items}, selected`
    ///
    /// Missing or mistyped arguments fall back to defaults.
    pub fn from_args(ty: IoType, args: &[ArgValue]) -> Self {
        static NIL: ArgValue = ArgValue::Nil;
        let arg = |i: usize| args.get(i).unwrap_or(&NIL);
        let number = |i: usize| arg(i).as_number();
        let flag = |i: usize| arg(i).as_bool().unwrap_or(false);

        match ty {
            IoType::Undef => Self::Undef,
            IoType::Implicit => Self::Implicit,
            IoType::Shape => Self::Shape,
            IoType::Field => Self::Field,
            IoType::Boolean => Self::Bool(flag(0)),
            IoType::Integer => {
                let int = |i: usize| number(i).map(|n| n.round() as i64);
                Self::Int(NumericValue::new(
                    int(0).unwrap_or(0),
                    int(1),
                    int(2),
                    int(4),
                    flag(3),
                ))
            }
            IoType::Scalar => Self::Scalar(NumericValue::new(
                number(0).unwrap_or(0.0),
                number(1),
                number(2),
                number(4),
                flag(3),
            )),
            IoType::String | IoType::Path => {
                let text = TextValue {
                    value: arg(0).as_text().unwrap_or_default().to_string(),
                    alt: flag(1),
                    filter: arg(2).as_text().unwrap_or_default().to_string(),
                };
                if ty == IoType::Path {
                    Self::Path(text)
                } else {
                    Self::String(text)
                }
            }
            IoType::Vec3 | IoType::Vec4 => {
                let components: Vec<f64> = match arg(0) {
                    ArgValue::Array(items) => items.iter().filter_map(ArgValue::as_number).collect(),
                    ArgValue::Number(n) => vec![*n],
                    _ => Vec::new(),
                };
                let len = if ty == IoType::Vec3 { 3 } else { 4 };
                let vector = VectorValue::new(len, &components, number(1), number(2), flag(3));
                if ty == IoType::Vec3 {
                    Self::Vec3(vector)
                } else {
                    Self::Vec4(vector)
                }
            }
            IoType::List => {
                let items = match arg(0) {
                    ArgValue::Array(items) => items
                        .iter()
                        .filter_map(|item| item.as_text().map(str::to_string))
                        .collect(),
                    _ => Vec::new(),
                };
                let selected = number(1).map_or(0, |n| n.max(0.0) as usize);
                Self::List(ListValue::new(items, selected))
            }
        }
    }

    /// Socket type of this value
    pub fn io_type(&self) -> IoType {
        match self {
            Self::Undef => IoType::Undef,
            Self::Bool(_) => IoType::Boolean,
            Self::Int(_) => IoType::Integer,
            Self::Scalar(_) => IoType::Scalar,
            Self::String(_) => IoType::String,
            Self::Path(_) => IoType::Path,
            Self::List(_) => IoType::List,
            Self::Vec3(_) => IoType::Vec3,
            Self::Vec4(_) => IoType::Vec4,
            Self::Implicit => IoType::Implicit,
            Self::Shape => IoType::Shape,
            Self::Field => IoType::Field,
        }
    }

    /// Code literal used when the owning input is unlinked
    pub fn literal(&self) -> String {
        match self {
            Self::Undef | Self::Implicit | Self::Shape | Self::Field => "nil".to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Int(n) => n.get().render(),
            Self::Scalar(n) => n.get().render(),
            Self::String(t) | Self::Path(t) => quote(&t.value),
            Self::List(l) => l.selected().to_string(),
            Self::Vec3(v) | Self::Vec4(v) => v.literal(),
        }
    }

    /// Declaration arguments after the type name, with trailing defaults dropped
    fn script_args(&self) -> Vec<String> {
        let args: Vec<Option<String>> = match self {
            Self::Undef | Self::Implicit | Self::Shape | Self::Field => Vec::new(),
            Self::Bool(b) => vec![Some(b.to_string())],
            Self::Int(n) => n.script_args(),
            Self::Scalar(n) => n.script_args(),
            Self::String(t) | Self::Path(t) => vec![
                Some(quote(&t.value)),
                t.alt.then(|| "true".to_string()),
                (!t.filter.is_empty()).then(|| quote(&t.filter)),
            ],
            Self::List(l) => {
                let items: Vec<String> = l.items().iter().map(|i| quote(i)).collect();
                vec![
                    Some(format!("{{{}}}", items.join(", "))),
                    (l.selected() > 0).then(|| l.selected().to_string()),
                ]
            }
            Self::Vec3(v) | Self::Vec4(v) => {
                let bounded = v.min != f64::MIN || v.max != f64::MAX;
                vec![
                    Some(v.literal()),
                    bounded.then(|| v.min.render()),
                    bounded.then(|| v.max.render()),
                    v.alt.then(|| "true".to_string()),
                ]
            }
        };

        let keep = args.iter().rposition(Option::is_some).map_or(0, |i| i + 1);
        args.into_iter()
            .take(keep)
            .map(|a| a.unwrap_or_else(|| "nil".to_string()))
            .collect()
    }
}

/// Quote and escape a string literal
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// An input socket on a processor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Input {
    /// Unique input ID
    pub id: InputId,
    /// Input name, unique on the owning processor
    pub name: String,
    /// Display color
    pub color: [u8; 3],
    /// Tweaked only, never linked interactively
    pub data_only: bool,
    value: SocketValue,
    pub(crate) owner: Option<ProcessorId>,
    pub(crate) link: Option<OutputId>,
}

impl Input {
    /// Create an input with the default literal for its type
    pub fn new(name: impl Into<String>, ty: IoType) -> Self {
        Self::with_value(name, SocketValue::default_for(ty))
    }

    /// Create an input carrying the given literal
    pub fn with_value(name: impl Into<String>, value: SocketValue) -> Self {
        Self {
            id: InputId::new(),
            name: name.into(),
            color: value.io_type().color(),
            data_only: false,
            value,
            owner: None,
            link: None,
        }
    }

    /// Build an input from declaration arguments
    pub fn from_args(name: impl Into<String>, ty: IoType, args: &[ArgValue]) -> Self {
        Self::with_value(name, SocketValue::from_args(ty, args))
    }

    /// Mark as data-only
    pub fn data_only(mut self) -> Self {
        self.data_only = true;
        self
    }

    /// Socket type
    pub fn io_type(&self) -> IoType {
        self.value.io_type()
    }

    /// Current literal
    pub fn value(&self) -> &SocketValue {
        &self.value
    }

    /// Replace the literal; rejected when the type differs
    pub fn set_value(&mut self, value: SocketValue) -> bool {
        if value.io_type() != self.io_type() {
            return false;
        }
        self.value = value;
        true
    }

    /// Owning processor
    pub fn owner(&self) -> Option<ProcessorId> {
        self.owner
    }

    /// Linked output, if any
    pub fn link(&self) -> Option<OutputId> {
        self.link
    }

    /// Whether an output feeds this input
    pub fn is_linked(&self) -> bool {
        self.link.is_some()
    }

    /// Independent copy with a fresh id, no owner and no link
    pub fn duplicate(&self) -> Self {
        Self {
            id: InputId::new(),
            name: self.name.clone(),
            color: self.color,
            data_only: self.data_only,
            value: self.value.clone(),
            owner: None,
            link: None,
        }
    }

    /// Code literal for the unlinked case
    pub fn literal(&self) -> String {
        self.value.literal()
    }

    /// Declaration statement that rebuilds this input
    pub fn to_script(&self) -> String {
        let keyword = if self.data_only { "param" } else { "input" };
        let mut args = vec![quote(&self.name), quote(self.io_type().name())];
        args.extend(self.value.script_args());
        format!("{keyword}({})", args.join(", "))
    }
}

/// An output socket on a processor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Output {
    /// Unique output ID
    pub id: OutputId,
    /// Output name, unique on the owning processor
    pub name: String,
    /// Socket type
    pub io_type: IoType,
    /// Display color
    pub color: [u8; 3],
    /// Surfaced as a side-effecting result
    pub emitable: bool,
    pub(crate) owner: Option<ProcessorId>,
    pub(crate) links: Vec<InputId>,
}

impl Output {
    /// Create an output
    pub fn new(name: impl Into<String>, io_type: IoType) -> Self {
        Self {
            id: OutputId::new(),
            name: name.into(),
            io_type,
            color: io_type.color(),
            emitable: false,
            owner: None,
            links: Vec::new(),
        }
    }

    /// Mark as emitable
    pub fn emitable(mut self) -> Self {
        self.emitable = true;
        self
    }

    /// Owning processor
    pub fn owner(&self) -> Option<ProcessorId> {
        self.owner
    }

    /// Inputs fed by this output, in connection order
    pub fn links(&self) -> &[InputId] {
        &self.links
    }

    /// Whether anything is fed by this output
    pub fn is_linked(&self) -> bool {
        !self.links.is_empty()
    }

    /// Independent copy with a fresh id, no owner and no links
    pub fn duplicate(&self) -> Self {
        Self {
            id: OutputId::new(),
            name: self.name.clone(),
            io_type: self.io_type,
            color: self.color,
            emitable: self.emitable,
            owner: None,
            links: Vec::new(),
        }
    }

    /// Declaration statement that rebuilds this output
    pub fn to_script(&self) -> String {
        if self.emitable {
            format!("output({}, {}, true)", quote(&self.name), quote(self.io_type.name()))
        } else {
            format!("output({}, {})", quote(&self.name), quote(self.io_type.name()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_clamped_on_construction_and_edit() {
        let mut n = NumericValue::new(15.0, Some(0.0), Some(10.0), None, false);
        assert_eq!(n.get(), 10.0);
        n.set(-3.0);
        assert_eq!(n.get(), 0.0);
        n.set(4.5);
        assert_eq!(n.get(), 4.5);
    }

    #[test]
    fn test_nan_never_escapes_the_bounds() {
        let mut n = NumericValue::new(0.5, Some(0.0), Some(1.0), None, false);
        n.set(f64::NAN);
        assert_eq!(n.get(), 0.0);

        let n = NumericValue::new(f64::NAN, Some(f64::NAN), Some(1.0), None, false);
        assert_eq!(n.min(), f64::MIN);
        assert!(!n.get().is_nan());

        let mut v = VectorValue::new(2, &[f64::NAN, 0.5], Some(0.0), Some(1.0), false);
        assert_eq!(v.components(), &[0.0, 0.5]);
        v.set(1, f64::NAN);
        assert_eq!(v.components(), &[0.0, 0.0]);
    }

    #[test]
    fn test_step_fallbacks() {
        assert_eq!(NumericValue::<i64>::unbounded(3).step(), 1);
        assert_eq!(NumericValue::<f64>::unbounded(3.0).step(), 1.0);

        let custom = NumericValue::new(0.0, Some(0.0), Some(50.0), None, false);
        assert_eq!(custom.step(), 0.5);

        let explicit = NumericValue::new(0.0, Some(0.0), Some(50.0), Some(2.0), false);
        assert_eq!(explicit.step(), 2.0);

        let int = NumericValue::new(0_i64, Some(0), Some(50), None, false);
        assert_eq!(int.step(), 1);
    }

    #[test]
    fn test_from_args_per_type() {
        let value = SocketValue::from_args(
            IoType::Scalar,
            &[ArgValue::Number(2.0), ArgValue::Number(0.0), ArgValue::Number(1.0)],
        );
        match value {
            SocketValue::Scalar(n) => {
                assert_eq!(n.get(), 1.0);
                assert_eq!(n.max(), 1.0);
            }
            other => panic!("unexpected value {other:?}"),
        }

        let vec = SocketValue::from_args(
            IoType::Vec4,
            &[ArgValue::Array(vec![ArgValue::Number(1.0), ArgValue::Number(2.0)])],
        );
        assert_eq!(vec.literal(), "{1.0, 2.0, 0.0, 0.0}");

        assert_eq!(SocketValue::from_args(IoType::Shape, &[ArgValue::Number(1.0)]), SocketValue::Shape);
        assert_eq!(SocketValue::default_for(IoType::Undef).io_type(), IoType::Undef);
    }

    #[test]
    fn test_literals() {
        assert_eq!(Input::with_value("b", SocketValue::Bool(true)).literal(), "true");
        assert_eq!(Input::new("i", IoType::Integer).literal(), "0");
        assert_eq!(Input::new("s", IoType::Scalar).literal(), "0.0");
        assert_eq!(
            Input::with_value("t", SocketValue::String(TextValue::new("a \"b\"\n"))).literal(),
            "\"a \\\"b\\\"\\n\""
        );
        assert_eq!(Input::new("u", IoType::Undef).literal(), "nil");
    }

    #[test]
    fn test_duplicate_drops_link_and_owner() {
        let mut input = Input::new("x", IoType::Scalar).data_only();
        input.link = Some(OutputId::new());
        input.owner = Some(ProcessorId::new());

        let copy = input.duplicate();
        assert_ne!(copy.id, input.id);
        assert_eq!(copy.name, "x");
        assert!(copy.data_only);
        assert_eq!(copy.value(), input.value());
        assert!(copy.link().is_none());
        assert!(copy.owner().is_none());
    }

    #[test]
    fn test_set_value_rejects_other_types() {
        let mut input = Input::new("x", IoType::Scalar);
        assert!(!input.set_value(SocketValue::Bool(true)));
        assert!(input.set_value(SocketValue::Scalar(NumericValue::unbounded(2.5))));
        assert_eq!(input.literal(), "2.5");
    }

    #[test]
    fn test_to_script_trims_defaults() {
        assert_eq!(
            Input::new("r", IoType::Scalar).to_script(),
            "input(\"r\", \"scalar\", 0.0)"
        );

        let bounded = Input::with_value(
            "r",
            SocketValue::Scalar(NumericValue::new(1.0, Some(0.0), Some(2.0), None, true)),
        );
        assert_eq!(
            bounded.to_script(),
            "input(\"r\", \"scalar\", 1.0, 0.0, 2.0, true)"
        );

        let alt_only = Input::with_value(
            "n",
            SocketValue::Int(NumericValue::new(4, None, None, None, true)),
        );
        assert_eq!(alt_only.to_script(), "input(\"n\", \"int\", 4, nil, nil, true)");

        assert_eq!(Input::new("s", IoType::Shape).data_only().to_script(), "param(\"s\", \"shape\")");
        assert_eq!(
            Output::new("o", IoType::Shape).emitable().to_script(),
            "output(\"o\", \"shape\", true)"
        );
    }

    #[test]
    fn test_list_selection_clamped() {
        let list = ListValue::new(vec!["a".into(), "b".into()], 5);
        assert_eq!(list.selected(), 1);
        assert_eq!(ListValue::new(Vec::new(), 3).selected(), 0);
    }
}
