use chrono::{NaiveDate, NaiveTime, Utc};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{from_str, from_value, json, to_value};
use classbook_core::{
    events::ScheduleEvent,
    models::{
        schedule::{
            AssistantAssignment, CreateScheduleRequest, DeleteScheduleQuery, MoveScheduleRequest,
            OccurrenceDetails, OccurrencePatch, ScheduleOccurrence, UpdateScheduleRequest,
            UpdateScope,
        },
        tenant::{quote_ident, TenantCode},
    },
};
use uuid::Uuid;

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn details() -> OccurrenceDetails {
    OccurrenceDetails {
        school_name: "Maple Elementary".to_string(),
        class_name: "Robotics A".to_string(),
        course_type: Some("STEM".to_string()),
        county: Some("North".to_string()),
        notes: Some("Bring kits".to_string()),
        teacher_id: Some(5),
        start_time: time(9, 0),
        end_time: time(10, 0),
        course_fee: 12_000,
        teacher_fee: Some(4_000),
    }
}

#[test]
fn test_create_request_uses_camel_case_fields() {
    let body = json!({
        "schoolName": "Maple Elementary",
        "className": "Robotics A",
        "teacherId": 5,
        "startTime": "09:00:00",
        "endTime": "10:00:00",
        "courseFee": 12000,
        "is_recurring": true,
        "weekdays": [1, 3],
        "recurrenceStartDate": "2024-01-01",
        "recurrenceEndDate": "2024-01-14",
        "assistants": [{ "assistantId": 9, "fee": 1500 }]
    });

    let request: CreateScheduleRequest = from_value(body).expect("Failed to deserialize request");

    assert_eq!(request.details.teacher_id, Some(5));
    assert_eq!(request.details.course_type, None);
    assert!(request.is_recurring);
    assert_eq!(request.weekdays, vec![1, 3]);
    assert_eq!(request.assistants[0].assistant_id, 9);
    assert_eq!(request.plan().unwrap().drafts.len(), 4);
}

#[test]
fn test_create_request_without_teacher_is_pending() {
    let body = json!({
        "schoolName": "Maple Elementary",
        "className": "Robotics A",
        "startTime": "09:00:00",
        "endTime": "10:00:00",
        "date": "2024-02-01"
    });

    let request: CreateScheduleRequest = from_value(body).unwrap();
    assert_eq!(request.details.teacher_id, None);
    assert_eq!(request.details.course_fee, 0);
}

#[test]
fn test_patch_distinguishes_absent_from_null() {
    let clear: OccurrencePatch = from_str(r#"{"teacherId": null}"#).unwrap();
    let absent: OccurrencePatch = from_str(r#"{"notes": "moved to gym"}"#).unwrap();

    assert_eq!(clear.teacher_id, Some(None));
    assert_eq!(absent.teacher_id, None);

    let mut cleared = details();
    clear.apply(&mut cleared);
    assert_eq!(cleared.teacher_id, None);

    let mut untouched = details();
    absent.apply(&mut untouched);
    assert_eq!(untouched.teacher_id, Some(5));
    assert_eq!(untouched.notes.as_deref(), Some("moved to gym"));
}

#[test]
fn test_patch_apply_leaves_unmentioned_fields() {
    let patch = OccurrencePatch {
        start_time: Some(time(13, 0)),
        end_time: Some(time(14, 30)),
        teacher_fee: Some(None),
        ..Default::default()
    };

    let mut merged = details();
    patch.apply(&mut merged);

    assert_eq!(
        merged,
        OccurrenceDetails {
            start_time: time(13, 0),
            end_time: time(14, 30),
            teacher_fee: None,
            ..details()
        }
    );
}

#[test]
fn test_patch_referenced_staff() {
    let patch: OccurrencePatch = from_str(
        r#"{"teacherId": 4, "assistants": [{"assistantId": 11}, {"assistantId": 12, "fee": 300}]}"#,
    )
    .unwrap();
    assert_eq!(patch.referenced_staff(), vec![4, 11, 12]);
    assert_eq!(patch.assistants.as_ref().map(Vec::len), Some(2));
}

#[rstest]
#[case(r#"{"updateType": "series", "notes": null}"#, UpdateScope::Series)]
#[case(r#"{"updateType": "single"}"#, UpdateScope::Single)]
#[case(r#"{"className": "Robotics B"}"#, UpdateScope::Single)]
fn test_update_request_scope(#[case] body: &str, #[case] expected: UpdateScope) {
    let request: UpdateScheduleRequest = from_str(body).unwrap();
    assert_eq!(request.update_type, expected);
}

#[test]
fn test_update_request_rejects_unknown_scope() {
    let result: Result<UpdateScheduleRequest, _> = from_str(r#"{"updateType": "everything"}"#);
    assert!(result.is_err());
}

#[test]
fn test_delete_query_defaults_to_single() {
    let query: DeleteScheduleQuery = from_str("{}").unwrap();
    assert_eq!(query.scope, UpdateScope::Single);

    let query: DeleteScheduleQuery = from_str(r#"{"type": "series"}"#).unwrap();
    assert_eq!(query.scope, UpdateScope::Series);
}

#[test]
fn test_move_request_defaults_to_move() {
    let request: MoveScheduleRequest = from_str(r#"{"date": "2024-03-04"}"#).unwrap();
    assert!(!request.is_copy);
    assert_eq!(request.date, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
}

#[test]
fn test_occurrence_serializes_flat() {
    let now = Utc::now();
    let occurrence = ScheduleOccurrence {
        id: 42,
        details: details(),
        teacher_name: Some("Ms. Lee".to_string()),
        date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        is_recurring: false,
        series_id: None,
        recurrence: None,
        company_code: "acme01".to_string(),
        assistants: vec![AssistantAssignment {
            assistant_id: 9,
            assistant_name: Some("Sam".to_string()),
            fee: Some(1_500),
        }],
        created_at: now,
        updated_at: now,
    };

    let value = to_value(&occurrence).unwrap();
    assert_eq!(value["schoolName"], "Maple Elementary");
    assert_eq!(value["teacherName"], "Ms. Lee");
    assert_eq!(value["startTime"], "09:00:00");
    assert_eq!(value["assistants"][0]["assistantId"], 9);

    let back: ScheduleOccurrence = from_value(value).unwrap();
    assert_eq!(back, occurrence);
}

#[test]
fn test_copy_draft_keeps_fields_and_assistants() {
    let now = Utc::now();
    let series_id = Uuid::new_v4();
    let occurrence = ScheduleOccurrence {
        id: 1,
        details: details(),
        teacher_name: None,
        date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        is_recurring: false,
        series_id: None,
        recurrence: None,
        company_code: "acme01".to_string(),
        assistants: vec![AssistantAssignment {
            assistant_id: 9,
            assistant_name: None,
            fee: Some(1_500),
        }],
        created_at: now,
        updated_at: now,
    };

    let target = NaiveDate::from_ymd_opt(2024, 2, 8).unwrap();
    let draft = occurrence.to_draft(target, series_id);

    assert_eq!(draft.date, target);
    assert_eq!(draft.details, occurrence.details);
    assert_eq!(draft.series_id(), Some(series_id));
    assert_eq!(draft.assistants[0].fee, Some(1_500));
}

#[rstest]
#[case("ACME01", true)]
#[case("acme2024", true)]
#[case("abc12", false)]
#[case("acme-01", false)]
#[case("acme01\"; DROP SCHEMA public; --", false)]
#[case("", false)]
fn test_tenant_code_validation(#[case] raw: &str, #[case] valid: bool) {
    assert_eq!(TenantCode::parse(raw).is_ok(), valid);
}

#[test]
fn test_tenant_code_is_case_insensitive() {
    let upper = TenantCode::parse("ACME01").unwrap();
    let lower = TenantCode::parse("acme01").unwrap();
    assert_eq!(upper, lower);
    assert_eq!(upper.schema_name(), "tenant_acme01");
}

#[test]
fn test_quote_ident_doubles_quotes() {
    assert_eq!(quote_ident("tenant_acme01"), "\"tenant_acme01\"");
    assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
}

#[test]
fn test_event_serialization_is_tagged() {
    let event = ScheduleEvent::Copied {
        source_id: 1,
        id: 2,
        date: NaiveDate::from_ymd_opt(2024, 2, 8).unwrap(),
    };
    let value = to_value(&event).unwrap();
    assert_eq!(value["type"], "copied");
    assert_eq!(value["sourceId"], 1);
    assert_eq!(event.kind(), "copied");
}
