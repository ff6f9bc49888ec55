//! Need lifecycle: status values, the ordered intake step table, and the
//! rules that keep `status` and `current_step` consistent.
//!
//! The step table is the backbone of the intake state machine. Every step
//! maps to exactly one caller-facing route segment and label through
//! [`STEP_TABLE`], so adding a step cannot fall through to a default.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Need status
// ---------------------------------------------------------------------------

/// Lifecycle status of a need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeedStatus {
    Draft,
    Submitted,
    UnderReview,
    Approved,
    Rejected,
    Active,
    Funded,
}

impl NeedStatus {
    pub const ALL: [NeedStatus; 7] = [
        Self::Draft,
        Self::Submitted,
        Self::UnderReview,
        Self::Approved,
        Self::Rejected,
        Self::Active,
        Self::Funded,
    ];

    /// Parse a status string from the database.
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Invalid need status '{s}'")))
    }

    /// Convert to a database-compatible string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::UnderReview => "under_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Active => "active",
            Self::Funded => "funded",
        }
    }

    /// Whether the requester may still edit intake steps.
    pub fn is_editable(self) -> bool {
        self == Self::Draft
    }

    /// Statuses that count as an intake still owned by the wizard: a draft
    /// being filled in, or a submission awaiting its confirmation view.
    pub fn is_in_flight(self) -> bool {
        matches!(self, Self::Draft | Self::Submitted)
    }
}

impl TryFrom<String> for NeedStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str_db(&value)
    }
}

// ---------------------------------------------------------------------------
// Intake steps
// ---------------------------------------------------------------------------

/// One stage of the ordered intake wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeedStep {
    Welcome,
    Location,
    Categories,
    Story,
    Documents,
    Review,
    Complete,
}

/// Static description of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepInfo {
    pub step: NeedStep,
    /// Database value and caller-facing route segment.
    pub key: &'static str,
    pub label: &'static str,
}

/// The intake steps in order. Index `i` holds the step whose ordinal is `i`.
pub const STEP_TABLE: [StepInfo; 7] = [
    StepInfo { step: NeedStep::Welcome, key: "welcome", label: "Welcome" },
    StepInfo { step: NeedStep::Location, key: "location", label: "Location" },
    StepInfo { step: NeedStep::Categories, key: "categories", label: "Categories" },
    StepInfo { step: NeedStep::Story, key: "story", label: "Need Story" },
    StepInfo { step: NeedStep::Documents, key: "documents", label: "Documents" },
    StepInfo { step: NeedStep::Review, key: "review", label: "Review" },
    StepInfo { step: NeedStep::Complete, key: "complete", label: "Complete" },
];

impl NeedStep {
    /// Zero-based position in [`STEP_TABLE`].
    pub fn ordinal(self) -> usize {
        self as usize
    }

    fn info(self) -> &'static StepInfo {
        &STEP_TABLE[self.ordinal()]
    }

    pub fn as_str(self) -> &'static str {
        self.info().key
    }

    pub fn label(self) -> &'static str {
        self.info().label
    }

    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        STEP_TABLE
            .iter()
            .find(|info| info.key == s)
            .map(|info| info.step)
            .ok_or_else(|| CoreError::Validation(format!("Invalid intake step '{s}'")))
    }

    /// The immediate successor, `None` for the terminal step.
    pub fn next(self) -> Option<Self> {
        STEP_TABLE.get(self.ordinal() + 1).map(|info| info.step)
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }
}

impl TryFrom<String> for NeedStep {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str_db(&value)
    }
}

/// Highest value `current_step` is ever persisted with. The confirmation view
/// is reached through the `Submitted` status, not through a stored marker.
pub const MAX_PERSISTED_STEP: NeedStep = NeedStep::Review;

/// The step marker a need carries after `applied` succeeds on a need whose
/// marker was `current`.
///
/// The marker only moves forward: re-applying an earlier step keeps the
/// later marker.
pub fn marker_after(current: NeedStep, applied: NeedStep) -> NeedStep {
    let advanced = applied
        .next()
        .unwrap_or(applied)
        .min(MAX_PERSISTED_STEP);
    current.max(advanced)
}

/// A step may be applied once the marker has reached it. Skipping ahead of
/// the marker is rejected.
pub fn ensure_step_reachable(current: NeedStep, requested: NeedStep) -> Result<(), CoreError> {
    if requested == NeedStep::Complete {
        return Err(CoreError::Validation(
            "The confirmation step cannot be submitted directly".to_string(),
        ));
    }
    if requested > current {
        return Err(CoreError::Validation(format!(
            "Step '{}' is not available yet; complete '{}' first",
            requested.as_str(),
            current.as_str()
        )));
    }
    Ok(())
}

/// Check that a status and step marker are mutually consistent.
///
/// A draft may sit on any persisted step. Every later status implies the
/// review step has been confirmed.
pub fn validate_status_step(status: NeedStatus, step: NeedStep) -> Result<(), CoreError> {
    if step > MAX_PERSISTED_STEP {
        return Err(CoreError::Validation(format!(
            "Step '{}' is never persisted on a need",
            step.as_str()
        )));
    }
    if status != NeedStatus::Draft && step != NeedStep::Review {
        return Err(CoreError::Validation(format!(
            "Status '{}' requires step 'review', found '{}'",
            status.as_str(),
            step.as_str()
        )));
    }
    Ok(())
}

/// Where a caller should be sent for a need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "step")]
pub enum IntakeRoute {
    /// Entry point of an editable step.
    Step(NeedStep),
    /// The post-submission confirmation view.
    Confirmation,
}

impl IntakeRoute {
    /// Total mapping from persisted need state to the caller's destination.
    pub fn for_need(status: NeedStatus, current_step: NeedStep) -> Self {
        if status.is_editable() {
            Self::Step(current_step.min(MAX_PERSISTED_STEP))
        } else {
            Self::Confirmation
        }
    }

    /// Route segment for the caller (e.g. `location`, `confirmation`).
    pub fn segment(self) -> &'static str {
        match self {
            Self::Step(step) => step.as_str(),
            Self::Confirmation => "confirmation",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
