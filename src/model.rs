//! Snapshot model for mooring facility payloads.
//!
//! Upstream producers are loosely typed: arrays go missing, elements are
//! `null`, numbers occasionally arrive as strings, and the facility may be
//! wrapped in a `{ "locations": [...], "data": {...} }` envelope by the
//! stream relay. Everything in this module degrades to "empty" or "no data"
//! instead of failing, so the engine always receives a usable [`Snapshot`].
//! Only an unparseable document or a non-object root is an error.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Location name used when the payload carries none.
pub const UNKNOWN_LOCATION: &str = "Unknown location";

/// Ship name used when a berth has no ship attached.
pub const NO_SHIP: &str = "No Ship";

/// Radar status value that marks a radar as monitored.
pub const RADAR_ACTIVE: &str = "ACTIVE";

// ---------------------------------------------------------------------------
// Entity identity
// ---------------------------------------------------------------------------

/// Kind of monitored instrument. Selects the threshold band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentKind {
    Radar,
    Hook,
}

impl InstrumentKind {
    /// All kinds, in the order they are evaluated and reported.
    pub const ALL: [InstrumentKind; 2] = [InstrumentKind::Radar, InstrumentKind::Hook];
}

impl fmt::Display for InstrumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstrumentKind::Radar => write!(f, "RADAR"),
            InstrumentKind::Hook => write!(f, "HOOK"),
        }
    }
}

/// Stable identifier of one monitored instrument.
///
/// Hooks are addressed through their bollard: `instrument` holds the bollard
/// name and `sub_instrument` the hook name. The `Display` form is scoped to
/// the facility and doubles as the stem of alert keys:
///
/// - radar: `<berth>::RADAR::<radar>`
/// - hook:  `<berth>::BOLLARD::<bollard>::HOOK::<hook>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EntityId {
    pub facility: String,
    pub berth: String,
    pub kind: InstrumentKind,
    pub instrument: String,
    pub sub_instrument: Option<String>,
}

impl EntityId {
    pub fn radar(facility: &str, berth: &str, radar: &str) -> Self {
        Self {
            facility: facility.to_string(),
            berth: berth.to_string(),
            kind: InstrumentKind::Radar,
            instrument: radar.to_string(),
            sub_instrument: None,
        }
    }

    pub fn hook(facility: &str, berth: &str, bollard: &str, hook: &str) -> Self {
        Self {
            facility: facility.to_string(),
            berth: berth.to_string(),
            kind: InstrumentKind::Hook,
            instrument: bollard.to_string(),
            sub_instrument: Some(hook.to_string()),
        }
    }

    /// Human-readable subject used in alert text, e.g.
    /// `Distance at radar R1` or `Tension on B2's H3`.
    pub fn subject(&self) -> String {
        match self.kind {
            InstrumentKind::Radar => format!("Distance at radar {}", self.instrument),
            InstrumentKind::Hook => format!(
                "Tension on {}'s {}",
                self.instrument,
                self.sub_instrument.as_deref().unwrap_or_default()
            ),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            InstrumentKind::Radar => write!(f, "{}::RADAR::{}", self.berth, self.instrument),
            InstrumentKind::Hook => write!(
                f,
                "{}::BOLLARD::{}::HOOK::{}",
                self.berth,
                self.instrument,
                self.sub_instrument.as_deref().unwrap_or_default()
            ),
        }
    }
}

/// Returns the value only if it is a usable finite reading.
///
/// `NaN` and infinities are treated as "no data this tick" so they can never
/// reach the history buffers or the remediation arithmetic.
pub fn finite_reading(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn numeric(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    finite_reading(parsed)
}

// ---------------------------------------------------------------------------
// Lenient field helpers
// ---------------------------------------------------------------------------

/// Distinguishes a key that is present (possibly `null`) from a missing key.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

/// Keeps a string; any other JSON value reads as absent.
fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

/// A `ship` that is not an object reads as no ship.
fn lenient_ship<'de, D>(deserializer: D) -> Result<Option<Ship>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) => Some(Ship {
            name: map.get("name").and_then(Value::as_str).map(str::to_string),
        }),
        _ => None,
    })
}

fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(collect_lenient(value))
}

/// Keeps every array element that deserializes; `null` or malformed entries
/// are skipped. Anything that is not an array yields an empty list.
fn collect_lenient<T: serde::de::DeserializeOwned>(value: Value) -> Vec<T> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Snapshot types
// ---------------------------------------------------------------------------

/// One parsed facility update.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub location_name: String,
    pub berths: Vec<Berth>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Berth {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(
        default,
        deserialize_with = "lenient_ship",
        skip_serializing_if = "Option::is_none"
    )]
    pub ship: Option<Ship>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub radars: Vec<Radar>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub bollards: Vec<Bollard>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ship {
    #[serde(default, deserialize_with = "optional_text")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Radar {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "optional_text")]
    pub distance_status: Option<String>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub ship_distance: Option<Value>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub distance_change: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bollard {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub hooks: Vec<Hook>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hook {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "present")]
    pub attached_line: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub tension: Option<Value>,
}

impl Berth {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_ship(mut self, ship_name: &str) -> Self {
        self.ship = Some(Ship {
            name: Some(ship_name.to_string()),
        });
        self
    }

    pub fn with_radar(mut self, radar: Radar) -> Self {
        self.radars.push(radar);
        self
    }

    pub fn with_bollard(mut self, bollard: Bollard) -> Self {
        self.bollards.push(bollard);
        self
    }

    /// Ship name for display, or [`NO_SHIP`].
    pub fn ship_name(&self) -> &str {
        self.ship
            .as_ref()
            .and_then(|s| s.name.as_deref())
            .unwrap_or(NO_SHIP)
    }
}

impl Radar {
    pub fn new(name: &str, status: &str, ship_distance: Option<f64>) -> Self {
        Self {
            name: name.to_string(),
            distance_status: Some(status.to_string()),
            ship_distance: Some(ship_distance.map(Value::from).unwrap_or(Value::Null)),
            distance_change: None,
        }
    }

    pub fn active(name: &str, ship_distance: Option<f64>) -> Self {
        Self::new(name, RADAR_ACTIVE, ship_distance)
    }

    pub fn is_active(&self) -> bool {
        self.distance_status.as_deref() == Some(RADAR_ACTIVE)
    }

    /// Current ship distance.
    ///
    /// `shipDistance` wins whenever the key is present, even when it is
    /// `null`; older producers only send `distanceChange`.
    pub fn distance(&self) -> Option<f64> {
        match &self.ship_distance {
            Some(value) => numeric(value),
            None => self.distance_change.as_ref().and_then(numeric),
        }
    }
}

impl Bollard {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            hooks: Vec::new(),
        }
    }

    pub fn with_hook(mut self, hook: Hook) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Sum of the available hook tensions; missing tensions count as zero.
    pub fn total_tension(&self) -> f64 {
        self.hooks.iter().filter_map(Hook::tension).sum()
    }
}

impl Hook {
    pub fn new(name: &str, attached_line: Option<&str>, tension: Option<f64>) -> Self {
        Self {
            name: name.to_string(),
            attached_line: Some(attached_line.map(Value::from).unwrap_or(Value::Null)),
            tension: Some(tension.map(Value::from).unwrap_or(Value::Null)),
        }
    }

    /// A hook is monitored only while a line is attached.
    pub fn in_use(&self) -> bool {
        matches!(&self.attached_line, Some(v) if !v.is_null())
    }

    pub fn tension(&self) -> Option<f64> {
        self.tension.as_ref().and_then(numeric)
    }

    pub fn attached_line(&self) -> Option<String> {
        match &self.attached_line {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        }
    }

    /// Display label, e.g. `H1 (Line 4)`.
    pub fn label(&self) -> String {
        match self.attached_line() {
            Some(line) => format!("{} ({})", self.name, line),
            None => self.name.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Envelope parsing
// ---------------------------------------------------------------------------

/// Errors raised while unwrapping a transport payload.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("payload root must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Parses one transport message into a [`Snapshot`].
pub fn parse_snapshot(payload: &str) -> Result<Snapshot, SnapshotError> {
    let root: Value = serde_json::from_str(payload)?;
    Snapshot::from_value(root)
}

impl Snapshot {
    pub fn new(location_name: &str) -> Self {
        Self {
            location_name: location_name.to_string(),
            berths: Vec::new(),
        }
    }

    pub fn with_berth(mut self, berth: Berth) -> Self {
        self.berths.push(berth);
        self
    }

    /// Builds a snapshot from an already-decoded JSON document.
    ///
    /// The facility may sit at the root or under `data`. The location name
    /// is taken from `location_name`/`locationName`, then `data.name`, then
    /// the root `name`.
    pub fn from_value(root: Value) -> Result<Self, SnapshotError> {
        let mut root = match root {
            Value::Object(map) => map,
            other => return Err(SnapshotError::NotAnObject(json_type_name(&other))),
        };

        let data = match root.remove("data") {
            Some(Value::Object(data)) => Some(data),
            _ => None,
        };

        let text = |v: Option<&Value>| v.and_then(Value::as_str).map(str::to_string);

        let location_name = text(root.get("location_name"))
            .or_else(|| text(root.get("locationName")))
            .or_else(|| data.as_ref().and_then(|d| text(d.get("name"))))
            .or_else(|| text(root.get("name")))
            .unwrap_or_else(|| UNKNOWN_LOCATION.to_string());

        let berths = match root.remove("berths") {
            Some(berths @ Value::Array(_)) => collect_lenient(berths),
            _ => data
                .and_then(|mut d| d.remove("berths"))
                .map(collect_lenient)
                .unwrap_or_default(),
        };

        Ok(Self {
            location_name,
            berths,
        })
    }

    pub fn berth(&self, name: &str) -> Option<&Berth> {
        // Duplicate berth names: the last one wins.
        self.berths.iter().rev().find(|b| b.name == name)
    }
}
