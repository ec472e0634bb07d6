//! Prediction form state and validation.
//!
//! Kept free of terminal types so the validation rules are testable and the
//! CLI can apply the same ranges to its flags.

use crate::domain::{Clarity, Color, Cut, Grade, Target};
use crate::error::AppError;
use crate::predict::{CaratInput, PriceInput};

/// Inclusive bounds for a numeric field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Number(Range),
    /// Options in display order (worst grade first).
    Choice(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    /// Dataset column the field feeds.
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
}

const fn number(name: &'static str, label: &'static str, min: f64, max: f64) -> FieldSpec {
    FieldSpec {
        name,
        label,
        kind: FieldKind::Number(Range { min, max }),
    }
}

const CUT_OPTIONS: &[&str] = &["Fair", "Good", "Very Good", "Premium", "Ideal"];
const COLOR_OPTIONS: &[&str] = &["J", "I", "H", "G", "F", "E", "D"];
const CLARITY_OPTIONS: &[&str] = &["I1", "SI2", "SI1", "VS2", "VS1", "VVS2", "VVS1", "IF"];

const CARAT: FieldSpec = number("carat", "Carat", 0.2, 5.01);
const CUT: FieldSpec = FieldSpec {
    name: "cut",
    label: "Cut",
    kind: FieldKind::Choice(CUT_OPTIONS),
};
const COLOR: FieldSpec = FieldSpec {
    name: "color",
    label: "Color",
    kind: FieldKind::Choice(COLOR_OPTIONS),
};
const CLARITY: FieldSpec = FieldSpec {
    name: "clarity",
    label: "Clarity",
    kind: FieldKind::Choice(CLARITY_OPTIONS),
};
const DEPTH: FieldSpec = number("depth", "Depth (%)", 43.0, 79.0);
const TABLE: FieldSpec = number("table", "Table", 43.0, 95.0);
const PRICE: FieldSpec = number("price", "Budget ($)", 0.0, 18800.0);
const X: FieldSpec = number("x", "X (mm)", 0.1, 10.74);
const Y: FieldSpec = number("y", "Y (mm)", 0.1, 58.9);
const Z: FieldSpec = number("z", "Z (mm)", 0.1, 31.8);

pub const PRICE_FORM: [FieldSpec; 9] = [CARAT, CUT, COLOR, CLARITY, DEPTH, TABLE, X, Y, Z];
pub const CARAT_FORM: [FieldSpec; 9] = [CUT, COLOR, CLARITY, DEPTH, TABLE, PRICE, X, Y, Z];

pub fn form_fields(target: Target) -> &'static [FieldSpec] {
    match target {
        Target::Price => &PRICE_FORM,
        Target::Carat => &CARAT_FORM,
    }
}

/// Reject values outside the field's bounds.
pub fn check_range(spec: &FieldSpec, value: f64) -> Result<f64, AppError> {
    let FieldKind::Number(range) = spec.kind else {
        return Ok(value);
    };
    if !value.is_finite() || value < range.min || value > range.max {
        return Err(AppError::invalid_input(format!(
            "{} must be between {} and {}, got {value}.",
            spec.label, range.min, range.max
        )));
    }
    Ok(value)
}

fn check_all(target: Target, values: &[(&str, f64)]) -> Result<(), AppError> {
    for spec in form_fields(target) {
        if let Some((_, v)) = values.iter().find(|(n, _)| *n == spec.name) {
            check_range(spec, *v)?;
        }
    }
    Ok(())
}

pub fn validate_price_input(input: &PriceInput) -> Result<(), AppError> {
    check_all(
        Target::Price,
        &[
            ("carat", input.carat),
            ("depth", input.depth),
            ("table", input.table),
            ("x", input.x),
            ("y", input.y),
            ("z", input.z),
        ],
    )
}

pub fn validate_carat_input(input: &CaratInput) -> Result<(), AppError> {
    check_all(
        Target::Carat,
        &[
            ("depth", input.depth),
            ("table", input.table),
            ("price", input.price),
            ("x", input.x),
            ("y", input.y),
            ("z", input.z),
        ],
    )
}

/// Why a submission did not produce an input.
#[derive(Debug, Clone)]
pub enum FormError {
    /// A required field is empty. Shown as a warning; nothing is submitted.
    Missing(&'static str),
    Invalid(AppError),
}

impl FormError {
    pub fn is_warning(&self) -> bool {
        matches!(self, FormError::Missing(_))
    }
}

impl std::fmt::Display for FormError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormError::Missing(label) => write!(f, "Please fill the {label} field."),
            FormError::Invalid(err) => write!(f, "{err}"),
        }
    }
}

impl From<AppError> for FormError {
    fn from(err: AppError) -> Self {
        FormError::Invalid(err)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum FieldValue {
    Text(String),
    Choice(Option<usize>),
}

/// Editable values for one prediction direction.
#[derive(Debug, Clone)]
pub struct Form {
    target: Target,
    values: Vec<FieldValue>,
    focus: usize,
}

impl Form {
    pub fn new(target: Target) -> Self {
        let values = form_fields(target)
            .iter()
            .map(|spec| match spec.kind {
                FieldKind::Number(_) => FieldValue::Text(String::new()),
                FieldKind::Choice(_) => FieldValue::Choice(None),
            })
            .collect();
        Self {
            target,
            values,
            focus: 0,
        }
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        form_fields(self.target)
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % self.values.len();
    }

    pub fn focus_prev(&mut self) {
        self.focus = (self.focus + self.values.len() - 1) % self.values.len();
    }

    /// Displayed value of field `idx` (empty when unset).
    pub fn display_value(&self, idx: usize) -> String {
        match (&self.values[idx], self.fields()[idx].kind) {
            (FieldValue::Text(s), _) => s.clone(),
            (FieldValue::Choice(Some(i)), FieldKind::Choice(opts)) => opts[*i].to_string(),
            _ => String::new(),
        }
    }

    /// Type into the focused numeric field. Non-numeric characters are ignored.
    pub fn input_char(&mut self, c: char) {
        if let FieldValue::Text(s) = &mut self.values[self.focus] {
            if c.is_ascii_digit() || (c == '.' && !s.contains('.')) {
                s.push(c);
            }
        }
    }

    pub fn backspace(&mut self) {
        match &mut self.values[self.focus] {
            FieldValue::Text(s) => {
                s.pop();
            }
            FieldValue::Choice(sel) => *sel = None,
        }
    }

    /// Step the focused choice field forward or backward, wrapping around.
    pub fn cycle(&mut self, forward: bool) {
        let FieldKind::Choice(opts) = self.fields()[self.focus].kind else {
            return;
        };
        if let FieldValue::Choice(sel) = &mut self.values[self.focus] {
            let n = opts.len();
            *sel = Some(match (*sel, forward) {
                (None, true) => 0,
                (None, false) => n - 1,
                (Some(i), true) => (i + 1) % n,
                (Some(i), false) => (i + n - 1) % n,
            });
        }
    }

    pub fn set_text(&mut self, name: &str, value: &str) {
        if let Some(idx) = self.index_of(name) {
            if let FieldValue::Text(s) = &mut self.values[idx] {
                *s = value.to_string();
            }
        }
    }

    pub fn set_choice(&mut self, name: &str, label: &str) {
        let Some(idx) = self.index_of(name) else {
            return;
        };
        let kind = self.fields()[idx].kind;
        if let (FieldValue::Choice(sel), FieldKind::Choice(opts)) = (&mut self.values[idx], kind) {
            *sel = opts.iter().position(|o| *o == label);
        }
    }

    pub fn clear(&mut self) {
        *self = Form::new(self.target);
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.fields().iter().position(|f| f.name == name)
    }

    /// First empty field in display order.
    pub fn first_missing(&self) -> Option<&'static str> {
        self.fields()
            .iter()
            .zip(&self.values)
            .find(|(_, v)| match v {
                FieldValue::Text(s) => s.trim().is_empty(),
                FieldValue::Choice(sel) => sel.is_none(),
            })
            .map(|(spec, _)| spec.label)
    }

    fn number(&self, name: &str) -> Result<f64, FormError> {
        let idx = self.index_of(name).ok_or_else(|| {
            AppError::schema(format!("Form has no `{name}` field."))
        })?;
        let spec = &self.fields()[idx];
        let raw = self.display_value(idx);
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(FormError::Missing(spec.label));
        }
        let value: f64 = raw.parse().map_err(|_| {
            AppError::invalid_input(format!("{} must be a number, got '{raw}'.", spec.label))
        })?;
        Ok(check_range(spec, value)?)
    }

    fn grade<G: Grade>(&self) -> Result<G, FormError> {
        let idx = self.index_of(G::COLUMN).ok_or_else(|| {
            AppError::schema(format!("Form has no `{}` field.", G::COLUMN))
        })?;
        let label = self.display_value(idx);
        if label.is_empty() {
            return Err(FormError::Missing(self.fields()[idx].label));
        }
        Ok(G::parse_label(&label)?)
    }

    fn ensure_complete(&self) -> Result<(), FormError> {
        match self.first_missing() {
            Some(label) => Err(FormError::Missing(label)),
            None => Ok(()),
        }
    }

    pub fn price_input(&self) -> Result<PriceInput, FormError> {
        self.ensure_complete()?;
        Ok(PriceInput {
            carat: self.number("carat")?,
            cut: self.grade::<Cut>()?,
            color: self.grade::<Color>()?,
            clarity: self.grade::<Clarity>()?,
            depth: self.number("depth")?,
            table: self.number("table")?,
            x: self.number("x")?,
            y: self.number("y")?,
            z: self.number("z")?,
        })
    }

    pub fn carat_input(&self) -> Result<CaratInput, FormError> {
        self.ensure_complete()?;
        Ok(CaratInput {
            cut: self.grade::<Cut>()?,
            color: self.grade::<Color>()?,
            clarity: self.grade::<Clarity>()?,
            depth: self.number("depth")?,
            table: self.number("table")?,
            price: self.number("price")?,
            x: self.number("x")?,
            y: self.number("y")?,
            z: self.number("z")?,
        })
    }
}
