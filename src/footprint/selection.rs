use super::FootprintError;
use geojson::{Feature, JsonValue};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

pub const CLOUDCOVER_MAX: f64 = 0.2;
pub const SENSORS: [&str; 2] = ["WV02", "WV03"];
pub const PROD_CODE: &str = "M1BS";

/// Footprint inventory a candidate layer comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Source {
    Mfp,
    MfpTest,
    Dg,
    Nasa,
    Oh,
}

impl Source {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mfp => "mfp",
            Self::MfpTest => "mfp_test",
            Self::Dg => "dg",
            Self::Nasa => "nasa",
            Self::Oh => "oh",
        }
    }

    /// Attribute holding the acquisition timestamp.
    pub fn date_column(&self) -> &'static str {
        match self {
            Self::Dg => "acqdate",
            Self::Nasa => "ACQ_TIME",
            Self::Mfp | Self::MfpTest | Self::Oh => "acq_time",
        }
    }
}

impl FromStr for Source {
    type Err = FootprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mfp" => Ok(Self::Mfp),
            "mfp_test" => Ok(Self::MfpTest),
            "dg" => Ok(Self::Dg),
            "nasa" => Ok(Self::Nasa),
            "oh" => Ok(Self::Oh),
            other => Err(FootprintError::UnknownSource(other.to_string())),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One attribute test. A null or absent attribute never matches.
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    AtMost(String, f64),
    In(String, Vec<String>),
    Equals(String, String),
    NotNull(String),
    NotIn(String, BTreeSet<String>),
}

impl Predicate {
    pub fn matches(&self, feature: &Feature) -> bool {
        match self {
            Self::AtMost(field, limit) => number(feature.property(field)).is_some_and(|v| v <= *limit),
            Self::In(field, values) => {
                text(feature.property(field)).is_some_and(|v| values.contains(&v))
            }
            Self::Equals(field, value) => text(feature.property(field)).is_some_and(|v| v == *value),
            Self::NotNull(field) => !matches!(feature.property(field), None | Some(JsonValue::Null)),
            Self::NotIn(field, values) => {
                text(feature.property(field)).is_some_and(|v| !values.contains(&v))
            }
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list<'a>(values: impl Iterator<Item = &'a String>) -> String {
            values
                .map(|v| format!("'{v}'"))
                .collect::<Vec<_>>()
                .join(", ")
        }
        match self {
            Self::AtMost(field, limit) => write!(f, "({field} <= {limit})"),
            Self::In(field, values) => write!(f, "({field} IN ({}))", list(values.iter())),
            Self::Equals(field, value) => write!(f, "({field} = '{value}')"),
            Self::NotNull(field) => write!(f, "({field} IS NOT NULL)"),
            Self::NotIn(field, values) => {
                write!(f, "({field} NOT IN ({}))", list(values.iter()))
            }
        }
    }
}

fn number(value: Option<&JsonValue>) -> Option<f64> {
    match value? {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn text(value: Option<&JsonValue>) -> Option<String> {
    match value? {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Conjunction of attribute predicates for one source schema.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectionClause {
    pub predicates: Vec<Predicate>,
}

impl SelectionClause {
    /// Coastline candidate criteria, excluding the higher off-nadir image of each stereo pair.
    pub fn for_source(source: Source, exclude: &BTreeSet<String>) -> Result<Self, FootprintError> {
        let sensors: Vec<String> = SENSORS.iter().map(|s| s.to_string()).collect();
        let predicates = match source {
            Source::Mfp | Source::Nasa => {
                let column = |name: &str| match source {
                    Source::Nasa => name.to_uppercase(),
                    _ => name.to_string(),
                };
                vec![
                    Predicate::AtMost(column("cloudcover"), CLOUDCOVER_MAX),
                    Predicate::In(column("sensor"), sensors),
                    Predicate::Equals(column("prod_code"), PROD_CODE.to_string()),
                    Predicate::NotNull(column("abscalfact")),
                    Predicate::NotNull(column("bandwidth")),
                    Predicate::NotNull(column("sun_elev")),
                    Predicate::NotIn(column("catalog_id"), exclude.clone()),
                ]
            }
            // Percent rather than fraction
            Source::Dg => vec![
                Predicate::AtMost("cloudcover".to_string(), (CLOUDCOVER_MAX * 100.0).trunc()),
                Predicate::In("platform".to_string(), sensors),
                Predicate::NotIn("catalogid".to_string(), exclude.clone()),
            ],
            other => return Err(FootprintError::UnsupportedSource(other)),
        };
        Ok(Self { predicates })
    }

    pub fn matches(&self, feature: &Feature) -> bool {
        self.predicates.iter().all(|p| p.matches(feature))
    }

    /// SQL rendering for logs.
    pub fn where_clause(&self) -> String {
        self.predicates
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(" AND ")
    }
}
