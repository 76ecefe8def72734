//! Position records emitted by the marker macros.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::units::{self, PageSize};

/// Where a record's page number came from.
///
/// Variants are listed from most to least trustworthy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum PageSource {
    /// Page resolved through `\label`/`\pageref`
    Label,
    /// Page resolved through zref's abspage property
    Zref,
    /// Live page counter at shipout
    Counter,
    /// Counter used because no reference was available yet
    CounterFallback,
    /// Missing or unrecognized source
    #[default]
    #[serde(other)]
    Unknown,
}

impl PageSource {
    /// All sources, most trustworthy first.
    pub const ALL: [PageSource; 5] = [
        PageSource::Label,
        PageSource::Zref,
        PageSource::Counter,
        PageSource::CounterFallback,
        PageSource::Unknown,
    ];

    /// Confidence tier for this source.
    pub fn confidence(self) -> Confidence {
        match self {
            PageSource::Label | PageSource::Zref => Confidence::High,
            PageSource::Counter => Confidence::Medium,
            PageSource::CounterFallback => Confidence::Low,
            PageSource::Unknown => Confidence::Unscored,
        }
    }

    /// Wire name (`counter-fallback`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            PageSource::Label => "label",
            PageSource::Zref => "zref",
            PageSource::Counter => "counter",
            PageSource::CounterFallback => "counter-fallback",
            PageSource::Unknown => "unknown",
        }
    }

    /// Whether the page number comes from the page counter.
    pub fn is_counter_based(self) -> bool {
        matches!(self, PageSource::Counter | PageSource::CounterFallback)
    }
}

impl std::fmt::Display for PageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accuracy tier of a page-number source. Orders `Unscored < Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Unscored,
    Low,
    Medium,
    High,
}

/// Which end of an element a record marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Start,
    End,
}

/// One emitted marker event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    /// Element identifier (shared by the start and end markers)
    pub id: String,

    /// 1-indexed page number
    #[serde(deserialize_with = "de::page")]
    pub page: u32,

    /// Marker role, `<kind>-start` or `<kind>-end`
    pub role: String,

    /// Horizontal position in scaled points
    #[serde(deserialize_with = "de::coordinate")]
    pub xsp: f64,

    /// Vertical position in scaled points
    #[serde(deserialize_with = "de::coordinate")]
    pub ysp: f64,

    /// Enclosing column width in scaled points
    #[serde(
        default,
        deserialize_with = "de::opt_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub cwsp: Option<f64>,

    /// Text block width in scaled points
    #[serde(
        default,
        deserialize_with = "de::opt_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub twsp: Option<f64>,

    /// Column index (0 = left)
    #[serde(
        default,
        deserialize_with = "de::opt_column",
        skip_serializing_if = "Option::is_none"
    )]
    pub col: Option<u32>,

    /// Column separation in scaled points
    #[serde(
        default,
        deserialize_with = "de::opt_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub colsep: Option<f64>,

    /// Whether the page was set in two-column mode
    #[serde(
        default,
        deserialize_with = "de::opt_flag",
        skip_serializing_if = "Option::is_none"
    )]
    pub twocolumn: Option<bool>,

    /// Page-number source
    #[serde(default)]
    pub page_source: PageSource,

    /// Physical page width in points
    #[serde(
        default,
        deserialize_with = "de::opt_dimension",
        serialize_with = "ser::opt_dimension",
        skip_serializing_if = "Option::is_none"
    )]
    pub pw: Option<f64>,

    /// Physical page height in points
    #[serde(
        default,
        deserialize_with = "de::opt_dimension",
        serialize_with = "ser::opt_dimension",
        skip_serializing_if = "Option::is_none"
    )]
    pub ph: Option<f64>,
}

impl PositionRecord {
    /// Create a record with only the required fields set.
    pub fn new(id: impl Into<String>, page: u32, role: impl Into<String>, xsp: f64, ysp: f64) -> Self {
        Self {
            id: id.into(),
            page,
            role: role.into(),
            xsp,
            ysp,
            cwsp: None,
            twsp: None,
            col: None,
            colsep: None,
            twocolumn: None,
            page_source: PageSource::Unknown,
            pw: None,
            ph: None,
        }
    }

    /// Set the page source.
    pub fn with_source(mut self, source: PageSource) -> Self {
        self.page_source = source;
        self
    }

    /// Set column and text-block widths (scaled points).
    pub fn with_widths(mut self, cwsp: Option<f64>, twsp: Option<f64>) -> Self {
        self.cwsp = cwsp;
        self.twsp = twsp;
        self
    }

    /// Set the column index.
    pub fn with_column(mut self, col: u32) -> Self {
        self.col = Some(col);
        self
    }

    /// Set the physical page size in points.
    pub fn with_page_size(mut self, width: f64, height: f64) -> Self {
        self.pw = Some(width);
        self.ph = Some(height);
        self
    }

    /// Which end this record marks, if the role has a recognized suffix.
    pub fn edge(&self) -> Option<Edge> {
        if self.role.ends_with("-start") {
            Some(Edge::Start)
        } else if self.role.ends_with("-end") {
            Some(Edge::End)
        } else {
            None
        }
    }

    /// Element kind, i.e. the role without its `-start`/`-end` suffix.
    pub fn kind(&self) -> &str {
        self.role
            .strip_suffix("-start")
            .or_else(|| self.role.strip_suffix("-end"))
            .unwrap_or(&self.role)
    }

    /// Physical page size, falling back to `default` for missing dimensions.
    pub fn page_size_or(&self, default: PageSize) -> PageSize {
        PageSize {
            width: self.pw.unwrap_or(default.width),
            height: self.ph.unwrap_or(default.height),
        }
    }

    /// Physical page size, falling back to the standard TeX A4 box.
    pub fn page_size(&self) -> PageSize {
        self.page_size_or(PageSize::default())
    }
}

mod de {
    use super::*;
    use serde::de::Error as _;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberRepr {
        Number(f64),
        Text(String),
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum FlagRepr {
        Bool(bool),
        Number(f64),
        Text(String),
    }

    fn parse_number<E: serde::de::Error>(repr: NumberRepr) -> Result<f64, E> {
        let value = match repr {
            NumberRepr::Number(n) => n,
            NumberRepr::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| E::custom(format!("non-numeric value {:?}", s)))?,
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(E::custom("non-finite value"))
        }
    }

    /// Positions are measured from the page origin and never negative.
    pub fn coordinate<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        let value = parse_number(NumberRepr::deserialize(d)?)?;
        if value < 0.0 {
            return Err(D::Error::custom(format!("negative position {}", value)));
        }
        Ok(value)
    }

    pub fn opt_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Option::<NumberRepr>::deserialize(d)?
            .map(parse_number)
            .transpose()
    }

    fn whole<E: serde::de::Error>(value: f64, what: &str) -> Result<u32, E> {
        if value.fract() != 0.0 || value < 0.0 || value > u32::MAX as f64 {
            return Err(E::custom(format!("{} must be a non-negative integer", what)));
        }
        Ok(value as u32)
    }

    pub fn page<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
        let value = parse_number(NumberRepr::deserialize(d)?)?;
        match whole(value, "page")? {
            0 => Err(D::Error::custom("page must be positive")),
            page => Ok(page),
        }
    }

    pub fn opt_column<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        Option::<NumberRepr>::deserialize(d)?
            .map(|repr| parse_number(repr).and_then(|v| whole(v, "col")))
            .transpose()
    }

    pub fn opt_flag<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
        Ok(match Option::<FlagRepr>::deserialize(d)? {
            None => None,
            Some(FlagRepr::Bool(b)) => Some(b),
            Some(FlagRepr::Number(n)) => Some(n != 0.0),
            Some(FlagRepr::Text(s)) => match s.trim() {
                "1" | "true" => Some(true),
                "0" | "false" | "" => Some(false),
                other => return Err(D::Error::custom(format!("invalid flag {:?}", other))),
            },
        })
    }

    pub fn opt_dimension<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        match Option::<NumberRepr>::deserialize(d)? {
            None => Ok(None),
            Some(NumberRepr::Number(n)) => Ok(Some(n)),
            Some(NumberRepr::Text(s)) => units::parse_dimension(&s)
                .map(Some)
                .map_err(D::Error::custom),
        }
    }
}

mod ser {
    use super::*;

    pub fn opt_dimension<S: Serializer>(value: &Option<f64>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => s.serialize_str(&format!("{}pt", v)),
            None => s.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_source_confidence_order() {
        assert!(PageSource::Label.confidence() > PageSource::Counter.confidence());
        assert!(PageSource::Counter.confidence() > PageSource::CounterFallback.confidence());
        assert!(PageSource::CounterFallback.confidence() > PageSource::Unknown.confidence());
        assert_eq!(PageSource::Label.confidence(), PageSource::Zref.confidence());
    }

    #[test]
    fn test_page_source_wire_names() {
        let source: PageSource = serde_json::from_str("\"counter-fallback\"").unwrap();
        assert_eq!(source, PageSource::CounterFallback);

        let source: PageSource = serde_json::from_str("\"pdfsavepos\"").unwrap();
        assert_eq!(source, PageSource::Unknown);

        assert_eq!(
            serde_json::to_string(&PageSource::CounterFallback).unwrap(),
            "\"counter-fallback\""
        );
    }

    #[test]
    fn test_edge_and_kind() {
        let start = PositionRecord::new("fig1", 1, "figure-start", 0.0, 0.0);
        let end = PositionRecord::new("fig1", 1, "figure-end", 0.0, 0.0);
        let other = PositionRecord::new("fig1", 1, "figure-mid", 0.0, 0.0);

        assert_eq!(start.edge(), Some(Edge::Start));
        assert_eq!(end.edge(), Some(Edge::End));
        assert_eq!(other.edge(), None);
        assert_eq!(start.kind(), "figure");
        assert_eq!(other.kind(), "figure-mid");
    }

    #[test]
    fn test_deserialize_string_numbers() {
        let line = r#"{"id":"sec-p-002","role":"P-start","xsp":"3729359","ysp":"30964035","page":1,"page_source":"zref","pw":"597.50787pt","ph":"845.04684pt","col":0,"twocolumn":1}"#;
        let record: PositionRecord = serde_json::from_str(line).unwrap();

        assert_eq!(record.xsp, 3729359.0);
        assert_eq!(record.page_source, PageSource::Zref);
        assert_eq!(record.pw, Some(597.50787));
        assert_eq!(record.col, Some(0));
        assert_eq!(record.twocolumn, Some(true));
    }

    #[test]
    fn test_missing_page_source_is_unknown() {
        let line = r#"{"id":"a","role":"P-end","xsp":1,"ysp":2,"page":4}"#;
        let record: PositionRecord = serde_json::from_str(line).unwrap();
        assert_eq!(record.page_source, PageSource::Unknown);
        assert_eq!(record.page_size(), PageSize::default());
    }

    #[test]
    fn test_reject_invalid_page() {
        for line in [
            r#"{"id":"a","role":"P-end","xsp":1,"ysp":2,"page":0}"#,
            r#"{"id":"a","role":"P-end","xsp":1,"ysp":2,"page":-3}"#,
            r#"{"id":"a","role":"P-end","xsp":1,"ysp":2,"page":1.5}"#,
        ] {
            assert!(serde_json::from_str::<PositionRecord>(line).is_err(), "{}", line);
        }
    }

    #[test]
    fn test_reject_non_numeric_coordinate() {
        let line = r#"{"id":"a","role":"P-end","xsp":"left","ysp":2,"page":1}"#;
        assert!(serde_json::from_str::<PositionRecord>(line).is_err());
    }

    #[test]
    fn test_reject_negative_coordinate() {
        for line in [
            r#"{"id":"a","role":"P-end","xsp":-65536,"ysp":2,"page":1}"#,
            r#"{"id":"a","role":"P-end","xsp":1,"ysp":"-2","page":1}"#,
        ] {
            assert!(serde_json::from_str::<PositionRecord>(line).is_err(), "{}", line);
        }
        let line = r#"{"id":"a","role":"P-end","xsp":0,"ysp":0,"page":1}"#;
        assert!(serde_json::from_str::<PositionRecord>(line).is_ok());
    }

    #[test]
    fn test_serialize_dimensions_as_points() {
        let record = PositionRecord::new("a", 1, "P-start", 1.0, 2.0).with_page_size(597.5, 845.0);
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"pw\":\"597.5pt\""));
        assert!(!json.contains("cwsp"));

        let back: PositionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
