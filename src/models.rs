//! Core data types for AbuseWatch.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Synthetic traffic scenario kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimType {
    Normal,
    Bruteforce,
    Geohop,
    Credstuff,
}

impl SimType {
    /// All scenario kinds in display order.
    pub const ALL: [SimType; 4] = [
        SimType::Normal,
        SimType::Bruteforce,
        SimType::Geohop,
        SimType::Credstuff,
    ];

    /// Wire name used by the backend (`sim_type` field).
    pub fn wire_name(&self) -> &'static str {
        match self {
            SimType::Normal => "normal",
            SimType::Bruteforce => "bruteforce",
            SimType::Geohop => "geohop",
            SimType::Credstuff => "credstuff",
        }
    }
}

impl fmt::Display for SimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimType::Normal => write!(f, "Normal"),
            SimType::Bruteforce => write!(f, "Brute Force"),
            SimType::Geohop => write!(f, "Geo-Hop"),
            SimType::Credstuff => write!(f, "Credential Stuffing"),
        }
    }
}

impl FromStr for SimType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(SimType::Normal),
            "bruteforce" => Ok(SimType::Bruteforce),
            "geohop" => Ok(SimType::Geohop),
            "credstuff" => Ok(SimType::Credstuff),
            _ => Err(format!("Unknown sim type: {}", s)),
        }
    }
}

/// Outcome of one simulated login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptResult {
    Success,
    Failure,
}

/// One simulated login attempt as reported by the backend.
/// Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptEvent {
    /// Seconds since epoch. Tolerates backends that omit the field.
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub ip: String,
    /// Region code, e.g. "US".
    #[serde(default)]
    pub geo: String,
    #[serde(default)]
    pub user: String,
    pub sim_type: SimType,
    pub result: AttemptResult,
    #[serde(default)]
    pub is_suspicious: bool,
    #[serde(default)]
    pub is_blocked: bool,
}

/// One immutable, fully-formed read of the metrics time series.
///
/// `labels` carries one epoch-seconds timestamp per sample bucket; the four
/// numeric series are index-aligned to it. Every array defaults to empty so
/// a backend that omits one cannot poison the whole snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    #[serde(default)]
    pub labels: Vec<i64>,
    #[serde(default)]
    pub attempts: Vec<u64>,
    #[serde(default)]
    pub failures: Vec<u64>,
    #[serde(default)]
    pub suspicions: Vec<u64>,
    #[serde(default)]
    pub blocks: Vec<u64>,
    #[serde(default)]
    pub recent: Vec<AttemptEvent>,
}

impl MetricsSnapshot {
    /// Number of sample buckets the chart may safely draw: the shortest of
    /// the five index-aligned arrays, so a backend that violates the
    /// equal-length invariant degrades instead of panicking.
    pub fn drawable_len(&self) -> usize {
        self.labels
            .len()
            .min(self.attempts.len())
            .min(self.failures.len())
            .min(self.suspicions.len())
            .min(self.blocks.len())
    }
}

/// Blocklist entry kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BlockKind {
    Ip,
    User,
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockKind::Ip => write!(f, "IP"),
            BlockKind::User => write!(f, "USER"),
        }
    }
}

/// One entry of the server-side blocklist. Transported as an ordered
/// sequence; no client-side dedup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlocklistEntry {
    #[serde(rename = "type")]
    pub kind: BlockKind,
    pub value: String,
}

/// Server-authoritative detection thresholds. The client holds at most one
/// draft copy while the settings panel is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefenseThresholds {
    pub brute_threshold: i64,
    pub brute_window: i64,
    pub geohop_threshold: i64,
    pub cred_threshold: i64,
    pub cred_window: i64,
}

impl Default for DefenseThresholds {
    fn default() -> Self {
        Self {
            brute_threshold: 5,
            brute_window: 60,
            geohop_threshold: 2,
            cred_threshold: 10,
            cred_window: 60,
        }
    }
}

/// Generation parameters for one scenario kind.
///
/// `failure_rate` is ignored by the bruteforce and geohop kinds server-side
/// but is still stored and round-tripped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioParams {
    pub delay: f64,
    pub iterations: i64,
    pub failure_rate: f64,
    pub workers: i64,
}

/// Per-scenario generation defaults. Client-resident for the whole session:
/// seeded at startup, mutated only by a successful settings save, never
/// fetched from the server.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDefaults {
    pub normal: ScenarioParams,
    pub bruteforce: ScenarioParams,
    pub geohop: ScenarioParams,
    pub credstuff: ScenarioParams,
}

impl Default for ScenarioDefaults {
    fn default() -> Self {
        Self {
            normal: ScenarioParams {
                delay: 0.5,
                iterations: 30,
                failure_rate: 0.2,
                workers: 3,
            },
            bruteforce: ScenarioParams {
                delay: 0.5,
                iterations: 30,
                failure_rate: 0.0,
                workers: 5,
            },
            geohop: ScenarioParams {
                delay: 1.0,
                iterations: 10,
                failure_rate: 0.2,
                workers: 1,
            },
            credstuff: ScenarioParams {
                delay: 1.0,
                iterations: 10,
                failure_rate: 0.0,
                workers: 1,
            },
        }
    }
}

impl ScenarioDefaults {
    pub fn get(&self, kind: SimType) -> &ScenarioParams {
        match kind {
            SimType::Normal => &self.normal,
            SimType::Bruteforce => &self.bruteforce,
            SimType::Geohop => &self.geohop,
            SimType::Credstuff => &self.credstuff,
        }
    }

    pub fn get_mut(&mut self, kind: SimType) -> &mut ScenarioParams {
        match kind {
            SimType::Normal => &mut self.normal,
            SimType::Bruteforce => &mut self.bruteforce,
            SimType::Geohop => &mut self.geohop,
            SimType::Credstuff => &mut self.credstuff,
        }
    }
}

/// Request body for POST /simulate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulateRequest {
    pub sim_type: SimType,
    pub delay: f64,
    pub iterations: i64,
    pub failure_rate: f64,
    pub workers: i64,
}

impl SimulateRequest {
    pub fn from_defaults(kind: SimType, defaults: &ScenarioDefaults) -> Self {
        let params = defaults.get(kind);
        Self {
            sim_type: kind,
            delay: params.delay,
            iterations: params.iterations,
            failure_rate: params.failure_rate,
            workers: params.workers,
        }
    }
}

/// Generic status reply from the backend write endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusReply {
    #[serde(default)]
    pub status: String,
}
