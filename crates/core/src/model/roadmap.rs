use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::{RoadmapId, StepId};
use crate::model::step::RoadmapStep;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RoadmapError {
    #[error("technology cannot be empty")]
    EmptyTechnology,

    #[error("a roadmap must contain at least one step")]
    EmptySteps,

    #[error("duplicate step id within roadmap: {0}")]
    DuplicateStepId(String),

    #[error("unrecognized timeframe: {0}")]
    UnknownTimeframe(String),
}

//
// ─── TIMEFRAME ─────────────────────────────────────────────────────────────────
//

/// How long the learner intends to spend on the roadmap.
///
/// The provider contract only accepts these four durations, and their string
/// forms are part of the request payload, so the round-trip through
/// `Display`/`FromStr` must stay exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1 month")]
    OneMonth,
    #[serde(rename = "3 months")]
    ThreeMonths,
    #[serde(rename = "6 months")]
    SixMonths,
    #[serde(rename = "1 year")]
    OneYear,
}

impl Timeframe {
    pub const ALL: [Timeframe; 4] = [
        Timeframe::OneMonth,
        Timeframe::ThreeMonths,
        Timeframe::SixMonths,
        Timeframe::OneYear,
    ];

    /// Stable display string, also the persisted and wire representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Timeframe::OneMonth => "1 month",
            Timeframe::ThreeMonths => "3 months",
            Timeframe::SixMonths => "6 months",
            Timeframe::OneYear => "1 year",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = RoadmapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1 month" => Ok(Self::OneMonth),
            "3 months" => Ok(Self::ThreeMonths),
            "6 months" => Ok(Self::SixMonths),
            "1 year" => Ok(Self::OneYear),
            other => Err(RoadmapError::UnknownTimeframe(other.to_string())),
        }
    }
}

//
// ─── REQUEST ───────────────────────────────────────────────────────────────────
//

/// Input to the generation provider: what to learn and in how long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoadmapRequest {
    technology: String,
    timeframe: Timeframe,
}

impl RoadmapRequest {
    /// Builds a request, trimming the technology name.
    ///
    /// # Errors
    ///
    /// Returns `RoadmapError::EmptyTechnology` when the technology is blank.
    pub fn new(technology: impl Into<String>, timeframe: Timeframe) -> Result<Self, RoadmapError> {
        let technology = technology.into().trim().to_string();
        if technology.is_empty() {
            return Err(RoadmapError::EmptyTechnology);
        }
        Ok(Self {
            technology,
            timeframe,
        })
    }

    #[must_use]
    pub fn technology(&self) -> &str {
        &self.technology
    }

    #[must_use]
    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }
}

//
// ─── ROADMAP ───────────────────────────────────────────────────────────────────
//

/// A materialized learning roadmap: the request it answers plus its ordered
/// steps.
///
/// Step order is the order the provider returned, which is also display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roadmap {
    id: RoadmapId,
    technology: String,
    timeframe: Timeframe,
    created_at: DateTime<Utc>,
    steps: Vec<RoadmapStep>,
}

impl Roadmap {
    /// Builds a roadmap from provider output.
    ///
    /// # Errors
    ///
    /// Returns `RoadmapError::EmptySteps` for an empty step list and
    /// `RoadmapError::DuplicateStepId` when two steps share an id.
    pub fn new(
        id: RoadmapId,
        request: &RoadmapRequest,
        created_at: DateTime<Utc>,
        steps: Vec<RoadmapStep>,
    ) -> Result<Self, RoadmapError> {
        if steps.is_empty() {
            return Err(RoadmapError::EmptySteps);
        }

        let mut seen: HashSet<&StepId> = HashSet::with_capacity(steps.len());
        for step in &steps {
            if !seen.insert(&step.id) {
                return Err(RoadmapError::DuplicateStepId(step.id.as_str().to_string()));
            }
        }

        Ok(Self {
            id,
            technology: request.technology().to_string(),
            timeframe: request.timeframe(),
            created_at,
            steps,
        })
    }

    /// Rehydrate a roadmap from persisted storage.
    ///
    /// # Errors
    ///
    /// Same validation as `new`; persisted rows that violate it are corrupt.
    pub fn from_persisted(
        id: RoadmapId,
        technology: impl Into<String>,
        timeframe: Timeframe,
        created_at: DateTime<Utc>,
        steps: Vec<RoadmapStep>,
    ) -> Result<Self, RoadmapError> {
        let request = RoadmapRequest::new(technology, timeframe)?;
        Self::new(id, &request, created_at, steps)
    }

    #[must_use]
    pub fn id(&self) -> RoadmapId {
        self.id
    }

    #[must_use]
    pub fn technology(&self) -> &str {
        &self.technology
    }

    #[must_use]
    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn steps(&self) -> &[RoadmapStep] {
        &self.steps
    }

    /// Looks a step up by id.
    #[must_use]
    pub fn step(&self, id: &StepId) -> Option<&RoadmapStep> {
        self.steps.iter().find(|step| &step.id == id)
    }

    /// Iterator over step ids in display order.
    pub fn step_ids(&self) -> impl Iterator<Item = &StepId> {
        self.steps.iter().map(|step| &step.id)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
