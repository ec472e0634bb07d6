//! Form inputs to single-row frames, and result formatting.

use serde::{Deserialize, Serialize};

use crate::domain::{Clarity, Color, Cut, Frame, Grade};
use crate::error::AppError;

/// `round(2z / (x + y), 3) * 100`: depth percentage from the three dimensions.
///
/// The ratio is rounded on its exact binary value with ties to even, so
/// `0.5625` becomes `0.562`.
pub fn derive_depth(x: f64, y: f64, z: f64) -> Result<f64, AppError> {
    let width = x + y;
    if !(width.is_finite() && z.is_finite()) || width <= 0.0 {
        return Err(AppError::invalid_input(format!(
            "Cannot derive depth: x + y must be positive (x={x}, y={y})."
        )));
    }
    let ratio = 2.0 * z / width;
    let rounded: f64 = format!("{ratio:.3}")
        .parse()
        .map_err(|e| AppError::invalid_input(format!("Cannot derive depth from {ratio}: {e}")))?;
    Ok(rounded * 100.0)
}

fn categorical(frame: Frame, name: &str, label: &str) -> Result<Frame, AppError> {
    frame.with_categorical(name, vec![label.to_string()])
}

fn numeric(frame: Frame, name: &str, value: f64) -> Result<Frame, AppError> {
    frame.with_numeric(name, vec![value])
}

/// Raw price-form fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceInput {
    pub carat: f64,
    pub cut: Cut,
    pub color: Color,
    pub clarity: Clarity,
    /// Entered depth; replaced by the value derived from x, y, z.
    pub depth: f64,
    pub table: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl PriceInput {
    /// One-row frame in the price pipeline's column order.
    pub fn to_frame(&self) -> Result<Frame, AppError> {
        let depth = derive_depth(self.x, self.y, self.z)?;
        let frame = numeric(Frame::new(), "carat", self.carat)?;
        let frame = categorical(frame, "cut", self.cut.label())?;
        let frame = categorical(frame, "color", self.color.label())?;
        let frame = categorical(frame, "clarity", self.clarity.label())?;
        let frame = numeric(frame, "depth", depth)?;
        let frame = numeric(frame, "table", self.table)?;
        let frame = numeric(frame, "x", self.x)?;
        let frame = numeric(frame, "y", self.y)?;
        numeric(frame, "z", self.z)
    }
}

/// Raw carat-form fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaratInput {
    pub cut: Cut,
    pub color: Color,
    pub clarity: Clarity,
    /// Entered depth; replaced by the value derived from x, y, z.
    pub depth: f64,
    pub table: f64,
    pub price: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl CaratInput {
    /// One-row frame in the carat pipeline's column order.
    pub fn to_frame(&self) -> Result<Frame, AppError> {
        let depth = derive_depth(self.x, self.y, self.z)?;
        let frame = categorical(Frame::new(), "cut", self.cut.label())?;
        let frame = categorical(frame, "color", self.color.label())?;
        let frame = categorical(frame, "clarity", self.clarity.label())?;
        let frame = numeric(frame, "depth", depth)?;
        let frame = numeric(frame, "table", self.table)?;
        let frame = numeric(frame, "price", self.price)?;
        let frame = numeric(frame, "x", self.x)?;
        let frame = numeric(frame, "y", self.y)?;
        numeric(frame, "z", self.z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceEstimate {
    /// Rounded to cents.
    pub price: f64,
}

impl PriceEstimate {
    pub fn from_prediction(raw: f64) -> Self {
        Self {
            price: (raw * 100.0).round() / 100.0,
        }
    }
}

impl std::fmt::Display for PriceEstimate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Based on your input, the predicted price is around ${:.2}",
            self.price
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CaratEstimate {
    /// Rounded to three decimals.
    pub carat: f64,
    /// `carat / 5` (1 carat = 0.2 g).
    pub grams: f64,
}

impl CaratEstimate {
    pub fn from_prediction(raw: f64) -> Self {
        let carat = (raw * 1000.0).round() / 1000.0;
        Self {
            carat,
            grams: carat / 5.0,
        }
    }
}

impl std::fmt::Display for CaratEstimate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Based on your input, you will get a stone of about {:.2} carat or {:.2} gram (1 carat = 0.2 g)",
            self.carat, self.grams
        )
    }
}
