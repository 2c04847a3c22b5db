//! Domain entities returned by the PeerFlow API.
//!
//! DESIGN
//! ======
//! Field names mirror the remote JSON exactly (the assignment service uses
//! camelCase, the review and submission services use PascalCase), so each
//! struct carries explicit serde renames. Closed vocabularies are enums, and
//! rubric bounds are checked while deserializing, so a malformed response
//! fails at the API boundary instead of reaching the session cache.
//!
//! Timestamps stay as the ISO-8601 strings the services emit; some of them
//! are naive datetimes with no offset, which the client only displays.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// =============================================================================
// USERS
// =============================================================================

/// Account role as issued by the auth service.
///
/// Serialized as the plain role string. Roles this client does not know about
/// are kept verbatim in `Other` so a stored session still restores.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Teacher,
    Student,
    Other(String),
}

impl Role {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Teacher => "Teacher",
            Self::Student => "Student",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for Role {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Teacher" => Self::Teacher,
            "Student" => Self::Student,
            _ => Self::Other(raw),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Other(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated user record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    pub email: String,
    /// Absent or null for accounts the auth service has not assigned a role.
    #[serde(default)]
    pub role: Option<Role>,
}

impl User {
    /// Name and surname joined for display.
    #[must_use]
    pub fn display_name(&self) -> String {
        match self.surname.as_deref() {
            Some(surname) if !surname.is_empty() => format!("{} {surname}", self.name),
            _ => self.name.clone(),
        }
    }
}

/// A student enrolled in an assignment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    pub email: String,
}

// =============================================================================
// ASSIGNMENT
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub description: String,
    /// The API spells this field `submissonDeadline`.
    #[serde(rename = "submissonDeadline", alias = "submissionDeadline")]
    pub submission_deadline: String,
    pub created_date: String,
    pub last_modified_date: String,
    pub teacher_id: String,
    #[serde(default)]
    pub involved_students: Vec<Student>,
    /// Submission or review phase label computed by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

// =============================================================================
// RUBRIC
// =============================================================================

/// One scored rubric criterion. `min_score <= max_score` always holds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CriterionWire")]
pub struct Criterion {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "MinScore")]
    pub min_score: i64,
    #[serde(rename = "MaxScore")]
    pub max_score: i64,
}

impl Criterion {
    /// Whether `score` falls inside this criterion's bounds.
    #[must_use]
    pub fn accepts(&self, score: i64) -> bool {
        (self.min_score..=self.max_score).contains(&score)
    }
}

#[derive(Deserialize)]
struct CriterionWire {
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Description")]
    description: String,
    #[serde(rename = "MinScore")]
    min_score: i64,
    #[serde(rename = "MaxScore")]
    max_score: i64,
}

impl TryFrom<CriterionWire> for Criterion {
    type Error = String;

    fn try_from(wire: CriterionWire) -> Result<Self, Self::Error> {
        if wire.min_score > wire.max_score {
            return Err(format!(
                "criterion `{}` has MinScore {} above MaxScore {}",
                wire.title, wire.min_score, wire.max_score
            ));
        }
        Ok(Self {
            title: wire.title,
            description: wire.description,
            min_score: wire.min_score,
            max_score: wire.max_score,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rubric {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Ordered as the teacher authored them.
    #[serde(rename = "Criteria")]
    pub criteria: Vec<Criterion>,
}

// =============================================================================
// PEER REVIEW
// =============================================================================

/// Review window state derived by the server from the review deadline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReviewPhase {
    Started,
    Closed,
    Other(String),
}

impl From<String> for ReviewPhase {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Peer Review Started" => Self::Started,
            "Peer Review Closed" => Self::Closed,
            _ => Self::Other(raw),
        }
    }
}

impl From<ReviewPhase> for String {
    fn from(phase: ReviewPhase) -> Self {
        match phase {
            ReviewPhase::Started => "Peer Review Started".to_owned(),
            ReviewPhase::Closed => "Peer Review Closed".to_owned(),
            ReviewPhase::Other(raw) => raw,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewerAssignmentMode {
    Automatic,
    Manual,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PairingStatus {
    #[serde(rename = "In progress", alias = "In Progress")]
    InProgress,
    Completed,
}

/// A reviewer's score and comment for one criterion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionReview {
    #[serde(rename = "Score")]
    pub score: i64,
    #[serde(rename = "Justification")]
    pub justification: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewResult {
    /// Keyed by criterion title.
    #[serde(rename = "PerCriterionScoresAndJustifications")]
    pub per_criterion: BTreeMap<String, CriterionReview>,
    #[serde(rename = "ReviewTimestamp")]
    pub review_timestamp: String,
}

impl ReviewResult {
    /// Mean score across all reviewed criteria, `None` if nothing was scored.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average_score(&self) -> Option<f64> {
        if self.per_criterion.is_empty() {
            return None;
        }
        let total: i64 = self.per_criterion.values().map(|r| r.score).sum();
        Some(total as f64 / self.per_criterion.len() as f64)
    }
}

/// A reviewer matched to one submission they must review.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerReviewPairing {
    #[serde(rename = "ReviewerStudentID")]
    pub reviewer_student_id: String,
    #[serde(rename = "RevieweeStudentID", default, skip_serializing_if = "Option::is_none")]
    pub reviewee_student_id: Option<String>,
    #[serde(rename = "RevieweeSubmissionID")]
    pub reviewee_submission_id: String,
    #[serde(rename = "Status")]
    pub status: PairingStatus,
    #[serde(rename = "ReviewResults", default)]
    pub review_results: Option<ReviewResult>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerReviewAssignment {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(rename = "AssignmentID")]
    pub assignment_id: String,
    #[serde(rename = "ReviewDeadline")]
    pub review_deadline: String,
    #[serde(rename = "RubricID")]
    pub rubric_id: String,
    #[serde(rename = "Rubric")]
    pub rubric: Rubric,
    #[serde(rename = "Status")]
    pub status: ReviewPhase,
    #[serde(rename = "ReviewerAssignmentMode")]
    pub reviewer_assignment_mode: ReviewerAssignmentMode,
    #[serde(rename = "NumberOfReviewersPerSubmission")]
    pub reviewers_per_submission: u32,
    #[serde(rename = "PeerReviewPairings", default)]
    pub pairings: Vec<PeerReviewPairing>,
}

impl PeerReviewAssignment {
    /// Pairings in which `student_id` is the reviewer.
    pub fn pairings_for_reviewer<'a>(&'a self, student_id: &'a str) -> impl Iterator<Item = &'a PeerReviewPairing> {
        self.pairings
            .iter()
            .filter(move |p| p.reviewer_student_id == student_id)
    }

    /// Number of pairings whose review has been completed.
    #[must_use]
    pub fn completed_reviews(&self) -> usize {
        self.pairings
            .iter()
            .filter(|p| p.status == PairingStatus::Completed)
            .count()
    }
}

// =============================================================================
// SUBMISSIONS
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionStatus {
    #[serde(rename = "submitted")]
    Submitted,
    #[serde(rename = "not submitted")]
    NotSubmitted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AttachmentType {
    Pdf,
    Txt,
    Jpg,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(rename = "FileName")]
    pub file_name: String,
    #[serde(rename = "FileType")]
    pub file_type: AttachmentType,
    /// Opaque object-storage reference.
    #[serde(rename = "FileReference")]
    pub file_reference: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentSubmission {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(rename = "AssignmentID")]
    pub assignment_id: String,
    #[serde(rename = "Status")]
    pub status: SubmissionStatus,
    #[serde(rename = "StudentID")]
    pub student_id: String,
    #[serde(rename = "TextContent")]
    pub text_content: String,
    #[serde(rename = "SubmissionTimestamp", default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<String>,
    #[serde(rename = "Attachments", default)]
    pub attachments: Vec<Attachment>,
}

// =============================================================================
// API PAYLOADS
// =============================================================================

/// Success body of `GET /api/v1/assignments/{id}`.
///
/// Students receive only `assignment`; teachers also get the peer review
/// configuration (`null` when none exists yet) and the submissions list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentDetails {
    pub assignment: Assignment,
    #[serde(default)]
    pub peer_review_assignment: Option<PeerReviewAssignment>,
    #[serde(default)]
    pub submissions: Option<Vec<AssignmentSubmission>>,
}

/// Success body of `POST /authentication/login`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;
