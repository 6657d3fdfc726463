//! Freehand strokes and their transport records.

use kurbo::Point;
use peniko::Color;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Node class written into every record.
pub const LINE_CLASS_NAME: &str = "Line";

/// A stroke with fewer points than this is never finalized or persisted.
pub const MIN_STROKE_POINTS: usize = 2;

/// Errors raised while decoding a stroke record.
#[derive(Debug, Error, PartialEq)]
pub enum MalformedStrokeError {
    #[error("Missing style attribute: {0}")]
    MissingAttribute(&'static str),
    #[error("Odd number of point coordinates: {0}")]
    OddPointCount(usize),
    #[error("Invalid record JSON: {0}")]
    InvalidJson(String),
}

/// Line cap style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineCap {
    Butt,
    #[default]
    Round,
    Square,
}

/// How a stroke is composited onto the drawing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CompositeOperation {
    /// Regular pen.
    #[default]
    #[serde(rename = "source-over")]
    SourceOver,
    /// Eraser: clears whatever it passes over.
    #[serde(rename = "destination-out")]
    DestinationOut,
}

/// A CSS colour string, carried verbatim through records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CssColor(String);

impl CssColor {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse the hex forms (`#rgb`, `#rrggbb`, `#rrggbbaa`) into a renderer colour.
    ///
    /// Named colours and functional notation return `None`.
    pub fn to_color(&self) -> Option<Color> {
        let hex = self.0.strip_prefix('#')?;
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => {
                let mut c = [0u8; 3];
                for (i, slot) in c.iter_mut().enumerate() {
                    *slot = channel(&hex[i..i + 1])? * 0x11;
                }
                Some(Color::from_rgba8(c[0], c[1], c[2], 255))
            }
            6 | 8 => {
                let r = channel(&hex[0..2])?;
                let g = channel(&hex[2..4])?;
                let b = channel(&hex[4..6])?;
                let a = if hex.len() == 8 { channel(&hex[6..8])? } else { 255 };
                Some(Color::from_rgba8(r, g, b, a))
            }
            _ => None,
        }
    }
}

impl Default for CssColor {
    fn default() -> Self {
        Self::new("#000")
    }
}

impl From<&str> for CssColor {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Style attributes fixed for the lifetime of a stroke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    pub color: CssColor,
    pub width: f64,
    pub cap: LineCap,
    pub composite: CompositeOperation,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            color: CssColor::default(),
            width: 5.0,
            cap: LineCap::Round,
            composite: CompositeOperation::SourceOver,
        }
    }
}

impl LineStyle {
    /// Same style with another colour.
    pub fn with_color(mut self, color: CssColor) -> Self {
        self.color = color;
        self
    }

    pub fn is_eraser(&self) -> bool {
        self.composite == CompositeOperation::DestinationOut
    }
}

/// One continuous freehand line.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    id: String,
    style: LineStyle,
    points: Vec<Point>,
}

impl Stroke {
    /// Start a new stroke, optionally seeded with its first point.
    pub fn begin(origin: Option<Point>, style: LineStyle) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            style,
            points: origin.into_iter().collect(),
        }
    }

    /// Append a point. Callers only do this while the stroke is open.
    pub fn append(&mut self, point: Point) {
        self.points.push(point);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn style(&self) -> &LineStyle {
        &self.style
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Too short to be finalized.
    pub fn is_degenerate(&self) -> bool {
        self.points.len() < MIN_STROKE_POINTS
    }

    /// Points as `[x0, y0, x1, y1, ..]`.
    pub fn flat_points(&self) -> Vec<f64> {
        self.points.iter().flat_map(|p| [p.x, p.y]).collect()
    }

    /// Encode into a value-only transport record.
    pub fn to_record(&self) -> StrokeRecord {
        StrokeRecord {
            attrs: LineAttrs {
                id: Some(self.id.clone()),
                stroke: Some(self.style.color.clone()),
                stroke_width: Some(self.style.width),
                line_cap: Some(self.style.cap),
                global_composite_operation: Some(self.style.composite),
                points: self.flat_points(),
            },
            class_name: LINE_CLASS_NAME.to_string(),
        }
    }

    /// Decode a transport record.
    pub fn from_record(record: &StrokeRecord) -> Result<Self, MalformedStrokeError> {
        let attrs = &record.attrs;
        let id = attrs
            .id
            .clone()
            .ok_or(MalformedStrokeError::MissingAttribute("id"))?;
        let style = LineStyle {
            color: attrs
                .stroke
                .clone()
                .ok_or(MalformedStrokeError::MissingAttribute("stroke"))?,
            width: attrs
                .stroke_width
                .ok_or(MalformedStrokeError::MissingAttribute("strokeWidth"))?,
            cap: attrs
                .line_cap
                .ok_or(MalformedStrokeError::MissingAttribute("lineCap"))?,
            composite: attrs
                .global_composite_operation
                .ok_or(MalformedStrokeError::MissingAttribute("globalCompositeOperation"))?,
        };
        let points = pair_points(&attrs.points)?;
        Ok(Self { id, style, points })
    }
}

/// Group a flat coordinate list into points.
pub fn pair_points(flat: &[f64]) -> Result<Vec<Point>, MalformedStrokeError> {
    if flat.len() % 2 != 0 {
        return Err(MalformedStrokeError::OddPointCount(flat.len()));
    }
    Ok(flat
        .chunks_exact(2)
        .map(|pair| Point::new(pair[0], pair[1]))
        .collect())
}

/// Attributes of a serialized line node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineAttrs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<CssColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_cap: Option<LineCap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_composite_operation: Option<CompositeOperation>,
    #[serde(default)]
    pub points: Vec<f64>,
}

/// Transport form of a stroke.
///
/// Only the JSON shape is checked when parsing; style presence and point
/// parity are checked by [`Stroke::from_record`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrokeRecord {
    pub attrs: LineAttrs,
    #[serde(default = "line_class_name")]
    pub class_name: String,
}

fn line_class_name() -> String {
    LINE_CLASS_NAME.to_string()
}

impl StrokeRecord {
    pub fn from_json(json: &str) -> Result<Self, MalformedStrokeError> {
        serde_json::from_str(json).map_err(|e| MalformedStrokeError::InvalidJson(e.to_string()))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
