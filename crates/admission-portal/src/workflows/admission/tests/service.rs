use super::common::*;

use crate::workflows::admission::domain::{ApplicationStatus, TaskSubmission};
use crate::workflows::admission::{
    AdmissionRepository, AdmissionServiceError, CredentialsRequest, DecisionRequest,
    InterviewRequest, ProfileForm, RepositoryError, TimelineOrder, TransitionRequest,
};

fn transition(status: &str) -> TransitionRequest {
    TransitionRequest {
        user_email: APPLICANT.to_string(),
        status: Some(status.to_string()),
        note: None,
        expected_version: None,
    }
}

fn decision(value: &str) -> DecisionRequest {
    DecisionRequest {
        user_email: APPLICANT.to_string(),
        decision: Some(value.to_string()),
        note: None,
        expected_version: None,
    }
}

#[test]
fn registration_opens_pending_application_with_one_step() {
    let (service, _) = build_service();

    let view = service
        .register(registration_form(APPLICANT))
        .expect("registration succeeds");

    assert_eq!(view.status, ApplicationStatus::Pending);
    assert_eq!(view.version, 1);
    assert_eq!(view.timeline.len(), 1);
    assert_eq!(
        view.timeline[0].description,
        "Application Submitted for creator-marketer"
    );
    assert_eq!(view.next_step, "Your application is being reviewed.");
    assert!(view.application_id.0.starts_with("adm-"));
}

#[test]
fn registration_rejects_duplicates_and_incomplete_forms() {
    let (service, _) = registered_service();
    assert!(matches!(
        service.register(registration_form("ASHA@example.com")),
        Err(AdmissionServiceError::AlreadyRegistered)
    ));

    let mut short_password = registration_form("new@example.com");
    short_password.password = "abc".to_string();
    assert!(matches!(
        service.register(short_password),
        Err(AdmissionServiceError::InvalidInput(_))
    ));

    let mut underage = registration_form("young@example.com");
    underage.age = Some(16);
    assert!(matches!(
        service.register(underage),
        Err(AdmissionServiceError::InvalidInput(_))
    ));

    let mut missing_course = registration_form("nocourse@example.com");
    missing_course.course_choice = "  ".to_string();
    assert!(matches!(
        service.register(missing_course),
        Err(AdmissionServiceError::InvalidInput(message)) if message == "All fields are required"
    ));
}

#[test]
fn every_known_status_is_reachable_by_admin_transition() {
    for status in ApplicationStatus::ALL {
        let (service, repository) = registered_service();

        let view = service
            .transition(&admin(), transition(status.label()))
            .expect("transition succeeds");

        assert_eq!(view.status, status);
        let record = stored_record(&repository);
        assert_eq!(record.timeline.entries().len(), 2, "one step appended for {status}");
        let latest = record.timeline.entries().last().expect("latest step");
        assert_eq!(latest.to_status, Some(status));
        assert_eq!(latest.from_status, Some(ApplicationStatus::Pending));
        assert_eq!(latest.description, format!("Status updated to {status}"));
    }
}

#[test]
fn unknown_status_literals_change_nothing() {
    let (service, repository) = registered_service();
    let before = stored_record(&repository);

    for literal in ["archived", "Accepted", "interview scheduled", ""] {
        let result = service.transition(&admin(), transition(literal));
        assert!(
            matches!(result, Err(AdmissionServiceError::InvalidStatus(_))),
            "{literal:?} must be rejected"
        );
    }

    let after = stored_record(&repository);
    assert_eq!(after.status, before.status);
    assert_eq!(after.version, before.version);
    assert_eq!(after.timeline, before.timeline);
}

#[test]
fn transition_notes_are_appended_to_the_step() {
    let (service, repository) = registered_service();

    service
        .transition(
            &admin(),
            TransitionRequest {
                note: Some("strong portfolio".to_string()),
                ..transition("task")
            },
        )
        .expect("transition succeeds");

    let record = stored_record(&repository);
    assert_eq!(
        record.timeline.entries().last().map(|step| step.description.as_str()),
        Some("Status updated to task: strong portfolio")
    );
}

#[test]
fn stale_expected_version_is_a_conflict() {
    let (service, repository) = registered_service();
    service
        .transition(&admin(), transition("interview"))
        .expect("first transition");

    let result = service.transition(
        &admin(),
        TransitionRequest {
            expected_version: Some(1),
            ..transition("rejected")
        },
    );

    assert!(matches!(
        result,
        Err(AdmissionServiceError::Conflict {
            expected: 1,
            actual: 2
        })
    ));
    let record = stored_record(&repository);
    assert_eq!(record.status, ApplicationStatus::Interview);
    assert_eq!(record.timeline.entries().len(), 2);
}

#[test]
fn applicants_cannot_use_admin_operations() {
    let (service, repository) = registered_service();

    assert!(matches!(
        service.transition(&applicant(), transition("accepted")),
        Err(AdmissionServiceError::Forbidden)
    ));
    assert!(matches!(
        service.decide(&applicant(), decision("accepted")),
        Err(AdmissionServiceError::Forbidden)
    ));
    assert!(matches!(
        service.annotate(&applicant(), APPLICANT, "looks great"),
        Err(AdmissionServiceError::Forbidden)
    ));
    assert!(matches!(
        service.list_applications(&applicant(), None),
        Err(AdmissionServiceError::Forbidden)
    ));
    assert_eq!(stored_record(&repository).timeline.entries().len(), 1);
}

#[test]
fn applicants_only_see_their_own_application() {
    let (service, _) = registered_service();
    service
        .register(registration_form("other@example.com"))
        .expect("second registration");

    assert!(matches!(
        service.status(&applicant(), Some("other@example.com"), TimelineOrder::NewestFirst),
        Err(AdmissionServiceError::Forbidden)
    ));
    let own = service
        .status(&applicant(), Some(APPLICANT), TimelineOrder::NewestFirst)
        .expect("own status");
    assert_eq!(own.email.as_str(), APPLICANT);

    let as_admin = service
        .status(&admin(), Some("other@example.com"), TimelineOrder::NewestFirst)
        .expect("admin may look up anyone");
    assert_eq!(as_admin.email.as_str(), "other@example.com");
}

#[test]
fn unknown_applications_are_not_found() {
    let (service, _) = build_service();

    assert!(matches!(
        service.status(&applicant(), None, TimelineOrder::NewestFirst),
        Err(AdmissionServiceError::NotFound)
    ));
    assert!(matches!(
        service.transition(&admin(), transition("interview")),
        Err(AdmissionServiceError::NotFound)
    ));
}

#[test]
fn timeline_is_newest_first_by_default_and_oldest_first_on_request() {
    let (service, _) = registered_service();
    service
        .transition(&admin(), transition("interview"))
        .expect("interview");
    service
        .transition(&admin(), transition("payment"))
        .expect("payment");

    let newest = service
        .timeline(&applicant(), None, TimelineOrder::default())
        .expect("timeline");
    assert_eq!(newest.len(), 3);
    assert!(newest[0].timestamp > newest[1].timestamp);
    assert!(newest[1].timestamp > newest[2].timestamp);
    assert_eq!(newest[0].to_status, Some(ApplicationStatus::Payment));

    let oldest = service
        .timeline(&applicant(), None, TimelineOrder::OldestFirst)
        .expect("timeline");
    let reversed: Vec<_> = newest.into_iter().rev().collect();
    assert_eq!(oldest, reversed);
}

#[test]
fn end_to_end_interview_track() {
    let (service, _) = registered_service();

    let view = service
        .transition(&admin(), transition("interview"))
        .expect("interview");
    assert_eq!(view.timeline.len(), 2);

    let view = service
        .schedule_interview(
            &applicant(),
            InterviewRequest {
                date: "2025-05-01".to_string(),
                time_slot: "10:00 AM".to_string(),
            },
        )
        .expect("interview scheduled");
    assert_eq!(view.status, ApplicationStatus::InterviewScheduled);
    assert_eq!(view.timeline.len(), 3);
    assert!(view.timeline[0].description.contains("2025-05-01"));
    assert!(view.timeline[0].description.contains("10:00 AM"));

    let view = service
        .decide(&admin(), decision("accepted"))
        .expect("decision recorded");
    assert_eq!(view.status, ApplicationStatus::Accepted);
    assert_eq!(view.timeline.len(), 5);
    assert_eq!(view.timeline[0].description, "Application Accepted");
    assert_eq!(view.timeline[1].description, "Status updated to accepted");
}

#[test]
fn decisions_only_accept_terminal_outcomes() {
    let (service, repository) = registered_service();

    assert!(matches!(
        service.decide(&admin(), decision("payment")),
        Err(AdmissionServiceError::InvalidStatus(_))
    ));

    let view = service
        .decide(&admin(), decision("rejected"))
        .expect("rejection recorded");
    assert_eq!(view.status, ApplicationStatus::Rejected);
    assert_eq!(view.timeline[0].description, "Application Rejected");
    assert_eq!(stored_record(&repository).version, 2);
}

#[test]
fn admin_requests_missing_a_target_change_nothing() {
    let (service, repository) = registered_service();
    let before = stored_record(&repository);

    let missing_status = service.transition(
        &admin(),
        TransitionRequest {
            status: None,
            ..transition("task")
        },
    );
    let Err(AdmissionServiceError::InvalidInput(message)) = missing_status else {
        panic!("missing status must be invalid input");
    };
    assert_eq!(message, "User email and status are required");

    let missing_email = service.decide(
        &admin(),
        DecisionRequest {
            user_email: "  ".to_string(),
            ..decision("accepted")
        },
    );
    let Err(AdmissionServiceError::InvalidInput(message)) = missing_email else {
        panic!("missing email must be invalid input");
    };
    assert_eq!(message, "User email and decision are required");

    assert_eq!(stored_record(&repository), before);
}

#[test]
fn registration_stores_a_bcrypt_credential() {
    let (service, repository) = registered_service();

    let user = repository
        .user(&email(APPLICANT))
        .expect("repository available")
        .expect("user stored");
    let credential = user.credential.as_ref().expect("credential stored");
    assert!(credential.verify("s3cret-pass"));
    let digest = serde_json::to_value(credential).expect("serialize");
    assert!(digest
        .as_str()
        .is_some_and(|digest| digest.starts_with("$2b$") && !digest.contains("s3cret-pass")));

    let verified = service
        .verify_credentials(CredentialsRequest {
            email: APPLICANT.to_string(),
            password: "s3cret-pass".to_string(),
        })
        .expect("credentials accepted");
    assert_eq!(verified.email, email(APPLICANT));
}

#[test]
fn credential_checks_fail_closed() {
    let (service, _) = registered_service();
    let attempts = [
        (APPLICANT, "wrong-pass"),
        ("nobody@example.com", "s3cret-pass"),
        ("not-an-email", "s3cret-pass"),
    ];
    for (address, password) in attempts {
        let result = service.verify_credentials(CredentialsRequest {
            email: address.to_string(),
            password: password.to_string(),
        });
        assert!(
            matches!(result, Err(AdmissionServiceError::InvalidCredentials)),
            "{address} / {password} must be refused"
        );
    }

    assert!(matches!(
        service.verify_credentials(CredentialsRequest::default()),
        Err(AdmissionServiceError::InvalidInput(_))
    ));
}

#[test]
fn applicant_moves_outside_the_pipeline_are_refused() {
    let (service, repository) = registered_service();
    service
        .decide(&admin(), decision("accepted"))
        .expect("accepted");
    let before = stored_record(&repository);

    let result = service.submit_task(
        &applicant(),
        TaskSubmission {
            task_link: Some("https://example.com/proposal".to_string()),
            ..TaskSubmission::default()
        },
    );

    assert!(matches!(
        result,
        Err(AdmissionServiceError::InvalidTransition {
            from: ApplicationStatus::Accepted,
            to: ApplicationStatus::TaskSubmitted
        })
    ));
    let after = stored_record(&repository);
    assert_eq!(after.version, before.version);
    assert_eq!(after.timeline, before.timeline);
}

#[test]
fn task_submission_records_kind_and_comments() {
    let (service, _) = registered_service();
    service.transition(&admin(), transition("task")).expect("task");

    let view = service
        .submit_task(
            &applicant(),
            TaskSubmission {
                task_description: Some("A newsletter for indie makers".to_string()),
                task_link: None,
                comments: Some("draft attached".to_string()),
            },
        )
        .expect("task submitted");

    assert_eq!(view.status, ApplicationStatus::TaskSubmitted);
    assert_eq!(
        view.timeline[0].description,
        "Task Submitted: Written submission with comments: draft attached"
    );
    assert!(matches!(
        service.submit_task(&applicant(), TaskSubmission::default()),
        Err(AdmissionServiceError::InvalidInput(_))
    ));
}

#[test]
fn interview_requests_need_a_calendar_date() {
    let (service, _) = registered_service();
    service
        .transition(&admin(), transition("interview"))
        .expect("interview");

    let result = service.schedule_interview(
        &applicant(),
        InterviewRequest {
            date: "05/01/2025".to_string(),
            time_slot: "10:00 AM".to_string(),
        },
    );
    assert!(matches!(result, Err(AdmissionServiceError::InvalidInput(_))));
}

#[test]
fn annotations_append_without_changing_status() {
    let (service, repository) = registered_service();

    let step = service
        .annotate(&admin(), APPLICANT, "  Called applicant  ")
        .expect("annotation stored");

    assert_eq!(step.description, "Called applicant");
    assert_eq!(step.to_status, None);
    let record = stored_record(&repository);
    assert_eq!(record.status, ApplicationStatus::Pending);
    assert_eq!(record.timeline.entries().len(), 2);
    assert!(matches!(
        service.annotate(&admin(), APPLICANT, "   "),
        Err(AdmissionServiceError::InvalidInput(_))
    ));
}

#[test]
fn admin_listing_filters_by_status() {
    let (service, _) = registered_service();
    service
        .register(registration_form("other@example.com"))
        .expect("second registration");
    service
        .transition(&admin(), transition("interview"))
        .expect("interview");

    let all = service.list_applications(&admin(), Some("all")).expect("list");
    assert_eq!(all.len(), 2);

    let interviews = service
        .list_applications(&admin(), Some("interview"))
        .expect("filtered list");
    assert_eq!(interviews.len(), 1);
    assert_eq!(interviews[0].email.as_str(), APPLICANT);
    assert_eq!(interviews[0].name, "Asha Rao");

    assert!(matches!(
        service.list_applications(&admin(), Some("archived")),
        Err(AdmissionServiceError::InvalidStatus(_))
    ));
}

#[test]
fn profile_updates_keep_omitted_fields() {
    let (service, repository) = registered_service();

    let user = service
        .update_profile(
            &applicant(),
            ProfileForm {
                name: "Asha R.".to_string(),
                age: None,
                gender: None,
                qualification: None,
            },
        )
        .expect("profile updated");

    assert_eq!(user.profile.name, "Asha R.");
    assert_eq!(user.profile.age, Some(22));
    let stored = repository
        .user(&email(APPLICANT))
        .expect("repository available")
        .expect("user stored");
    assert_eq!(stored.profile, user.profile);

    assert!(matches!(
        service.update_profile(
            &applicant(),
            ProfileForm {
                name: "A".to_string(),
                ..ProfileForm::default()
            }
        ),
        Err(AdmissionServiceError::InvalidInput(_))
    ));
}

#[test]
fn repository_outages_surface_as_repository_errors() {
    let service = unavailable_service();

    assert!(matches!(
        service.register(registration_form(APPLICANT)),
        Err(AdmissionServiceError::Repository(RepositoryError::Unavailable(_)))
    ));
    assert!(matches!(
        service.status(&applicant(), None, TimelineOrder::NewestFirst),
        Err(AdmissionServiceError::Repository(_))
    ));
}
