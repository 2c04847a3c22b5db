use super::*;
use serde_json::json;

fn criterion_json(min: i64, max: i64) -> serde_json::Value {
    json!({ "Title": "Clarity", "Description": "Is it clear?", "MinScore": min, "MaxScore": max })
}

fn teacher_payload() -> serde_json::Value {
    json!({
        "message": "Assignment retrieved",
        "assignment": {
            "id": "A1",
            "name": "Essay",
            "description": "Write an essay",
            "submissonDeadline": "2025-06-01T12:00:00",
            "createdDate": "2025-05-01T09:00:00Z",
            "lastModifiedDate": "2025-05-02T09:00:00Z",
            "teacherId": "T1",
            "involvedStudents": [
                { "id": "S1", "name": "Ada", "surname": "Lovelace", "email": "ada@test.com", "role": "Student" }
            ],
            "status": "Peer Review Started"
        },
        "peerReviewAssignment": {
            "_id": "PR1",
            "AssignmentID": "A1",
            "ReviewDeadline": "2025-06-10T12:00:00",
            "RubricID": "R1",
            "Rubric": { "_id": "R1", "Criteria": [criterion_json(0, 5)] },
            "Status": "Peer Review Started",
            "ReviewerAssignmentMode": "Automatic",
            "NumberOfReviewersPerSubmission": 2,
            "PeerReviewPairings": [
                {
                    "ReviewerStudentID": "S1",
                    "RevieweeStudentID": "S2",
                    "RevieweeSubmissionID": "SUB2",
                    "Status": "Completed",
                    "ReviewResults": {
                        "PerCriterionScoresAndJustifications": {
                            "Clarity": { "Score": 4, "Justification": "Clear" },
                            "Depth": { "Score": 2, "Justification": "Shallow" }
                        },
                        "ReviewTimestamp": "2025-06-05T10:00:00"
                    }
                },
                {
                    "ReviewerStudentID": "S2",
                    "RevieweeSubmissionID": "SUB1",
                    "Status": "In progress",
                    "ReviewResults": null
                }
            ]
        },
        "submissions": [
            {
                "_id": "SUB1",
                "AssignmentID": "A1",
                "Status": "submitted",
                "StudentID": "S1",
                "TextContent": "My essay",
                "SubmissionTimestamp": "2025-05-30T08:00:00",
                "Attachments": [
                    { "FileName": "essay.pdf", "FileType": "PDF", "FileReference": "s3://bucket/essay.pdf" }
                ]
            }
        ]
    })
}

// =============================================================================
// Role / User
// =============================================================================

#[test]
fn role_parses_known_values() {
    assert_eq!(serde_json::from_value::<Role>(json!("Teacher")).unwrap(), Role::Teacher);
    assert_eq!(serde_json::from_value::<Role>(json!("Student")).unwrap(), Role::Student);
}

#[test]
fn role_keeps_unknown_values() {
    let role: Role = serde_json::from_value(json!("Admin")).unwrap();
    assert_eq!(role, Role::Other("Admin".into()));
    assert_eq!(serde_json::to_value(&role).unwrap(), json!("Admin"));
}

#[test]
fn user_without_role_has_none() {
    let user: User = serde_json::from_value(json!({ "id": "u1", "name": "Ada", "email": "a@b.c" })).unwrap();
    assert_eq!(user.role, None);
    assert_eq!(user.surname, None);
}

#[test]
fn user_with_null_role_parses() {
    let user: User =
        serde_json::from_value(json!({ "id": "u1", "name": "Ada", "email": "a@b.c", "role": null })).unwrap();
    assert_eq!(user.role, None);
}

#[test]
fn user_display_name_joins_surname() {
    let mut user: User =
        serde_json::from_value(json!({ "id": "u1", "name": "Ada", "surname": "Lovelace", "email": "a@b.c" })).unwrap();
    assert_eq!(user.display_name(), "Ada Lovelace");
    user.surname = Some(String::new());
    assert_eq!(user.display_name(), "Ada");
}

// =============================================================================
// Criterion
// =============================================================================

#[test]
fn criterion_accepts_equal_bounds() {
    let c: Criterion = serde_json::from_value(criterion_json(3, 3)).unwrap();
    assert!(c.accepts(3));
    assert!(!c.accepts(4));
}

#[test]
fn criterion_rejects_inverted_bounds() {
    let err = serde_json::from_value::<Criterion>(criterion_json(5, 1)).unwrap_err();
    assert!(err.to_string().contains("MinScore 5 above MaxScore 1"));
}

#[test]
fn criterion_serializes_wire_names() {
    let c: Criterion = serde_json::from_value(criterion_json(0, 10)).unwrap();
    assert_eq!(serde_json::to_value(&c).unwrap(), criterion_json(0, 10));
}

// =============================================================================
// AssignmentDetails
// =============================================================================

#[test]
fn details_parse_full_teacher_payload() {
    let details: AssignmentDetails = serde_json::from_value(teacher_payload()).unwrap();
    assert_eq!(details.assignment.id, "A1");
    assert_eq!(details.assignment.submission_deadline, "2025-06-01T12:00:00");
    assert_eq!(details.assignment.involved_students[0].name, "Ada");

    let pr = details.peer_review_assignment.unwrap();
    assert_eq!(pr.id, "PR1");
    assert_eq!(pr.status, ReviewPhase::Started);
    assert_eq!(pr.reviewer_assignment_mode, ReviewerAssignmentMode::Automatic);
    assert_eq!(pr.reviewers_per_submission, 2);
    assert_eq!(pr.rubric.id.as_deref(), Some("R1"));
    assert_eq!(pr.completed_reviews(), 1);
    assert_eq!(pr.pairings_for_reviewer("S2").count(), 1);
    assert_eq!(pr.pairings[1].status, PairingStatus::InProgress);
    assert!(pr.pairings[1].review_results.is_none());

    let subs = details.submissions.unwrap();
    assert_eq!(subs[0].id, "SUB1");
    assert_eq!(subs[0].status, SubmissionStatus::Submitted);
    assert_eq!(subs[0].attachments[0].file_type, AttachmentType::Pdf);
}

#[test]
fn details_parse_student_payload_without_optionals() {
    let mut payload = teacher_payload();
    let obj = payload.as_object_mut().unwrap();
    obj.remove("peerReviewAssignment");
    obj.remove("submissions");

    let details: AssignmentDetails = serde_json::from_value(payload).unwrap();
    assert!(details.peer_review_assignment.is_none());
    assert!(details.submissions.is_none());
}

#[test]
fn details_accept_null_peer_review() {
    let mut payload = teacher_payload();
    payload["peerReviewAssignment"] = serde_json::Value::Null;
    let details: AssignmentDetails = serde_json::from_value(payload).unwrap();
    assert!(details.peer_review_assignment.is_none());
}

#[test]
fn details_reject_unknown_reviewer_mode() {
    let mut payload = teacher_payload();
    payload["peerReviewAssignment"]["ReviewerAssignmentMode"] = json!("Random");
    assert!(serde_json::from_value::<AssignmentDetails>(payload).is_err());
}

#[test]
fn details_reject_unknown_attachment_type() {
    let mut payload = teacher_payload();
    payload["submissions"][0]["Attachments"][0]["FileType"] = json!("EXE");
    assert!(serde_json::from_value::<AssignmentDetails>(payload).is_err());
}

#[test]
fn details_reject_inverted_rubric_bounds() {
    let mut payload = teacher_payload();
    payload["peerReviewAssignment"]["Rubric"]["Criteria"] = json!([criterion_json(9, 1)]);
    assert!(serde_json::from_value::<AssignmentDetails>(payload).is_err());
}

#[test]
fn assignment_accepts_corrected_deadline_spelling() {
    let mut payload = teacher_payload();
    let assignment = payload["assignment"].as_object_mut().unwrap();
    let deadline = assignment.remove("submissonDeadline").unwrap();
    assignment.insert("submissionDeadline".into(), deadline);

    let details: AssignmentDetails = serde_json::from_value(payload).unwrap();
    assert_eq!(details.assignment.submission_deadline, "2025-06-01T12:00:00");
}

// =============================================================================
// ReviewResult
// =============================================================================

#[test]
fn review_average_score() {
    let details: AssignmentDetails = serde_json::from_value(teacher_payload()).unwrap();
    let pr = details.peer_review_assignment.unwrap();
    let result = pr.pairings[0].review_results.as_ref().unwrap();
    assert_eq!(result.average_score(), Some(3.0));
}

#[test]
fn review_average_score_empty_is_none() {
    let result = ReviewResult { per_criterion: BTreeMap::new(), review_timestamp: "t".into() };
    assert_eq!(result.average_score(), None);
}

#[test]
fn review_phase_keeps_unknown_label() {
    let phase: ReviewPhase = serde_json::from_value(json!("Paused")).unwrap();
    assert_eq!(phase, ReviewPhase::Other("Paused".into()));
    assert_eq!(String::from(ReviewPhase::Closed), "Peer Review Closed");
}
