// Verify wire format matches what existing Apollo clients send.
// These tests ensure request/response compatibility is never broken.

use apollo_proto::{
    DeleteJobRequest, JobType, ListSchedulesResponse, Resources, RunJobRequest, RunJobResponse,
    ScheduleItem, UpdateScheduleRequest,
};

#[test]
fn run_job_request_minimal() {
    let json = r#"{"name":"ack","command":"ack"}"#;
    let req: RunJobRequest = serde_json::from_str(json).unwrap();

    assert_eq!(req.name, "ack");
    assert_eq!(req.command, "ack");
    assert_eq!(req.job_type, JobType::OneTime);
    assert!(req.job_id.is_empty());
    assert!(req.schedule.is_empty());
    assert!(req.overrides.is_none());
}

#[test]
fn run_job_request_repeatable() {
    let json = r#"{
        "name": "nightly",
        "command": "report",
        "type": "JOB_TYPE_REPEATABLE",
        "schedule": "0 0 2 * * *",
        "resources": {"cpu": "500m", "memory": "1Gi"}
    }"#;
    let req: RunJobRequest = serde_json::from_str(json).unwrap();

    assert_eq!(req.job_type, JobType::Repeatable);
    assert_eq!(req.schedule, "0 0 2 * * *");
    assert_eq!(req.resources.cpu, "500m");
}

#[test]
fn run_job_request_overrides() {
    let json = r#"{
        "name": "ingest",
        "command": "ingest",
        "overrides": {
            "args": ["--fast"],
            "env": [{"name": "LOG_LEVEL", "value": "info"}],
            "resources": {"cpu": "2", "memory": "4Gi"},
            "task_count": 4
        }
    }"#;
    let req: RunJobRequest = serde_json::from_str(json).unwrap();
    let overrides = req.overrides.unwrap();

    assert_eq!(overrides.args, vec!["--fast"]);
    assert_eq!(overrides.env[0].name, "LOG_LEVEL");
    assert_eq!(overrides.env[0].value, "info");
    assert_eq!(overrides.resources.unwrap().memory, "4Gi");
    assert_eq!(overrides.task_count, 4);
}

#[test]
fn job_type_serializes_with_protobuf_names() {
    assert_eq!(
        serde_json::to_string(&JobType::OneTime).unwrap(),
        r#""JOB_TYPE_ONE_TIME""#
    );
    assert_eq!(
        serde_json::to_string(&JobType::Repeatable).unwrap(),
        r#""JOB_TYPE_REPEATABLE""#
    );
}

#[test]
fn run_job_response_round_trip() {
    let res = RunJobResponse {
        id: "job-ack-1700000000".into(),
        logs: "done\n".into(),
    };
    let json = serde_json::to_string(&res).unwrap();
    assert!(json.contains(r#""id":"job-ack-1700000000""#));

    let back: RunJobResponse = serde_json::from_str(&json).unwrap();
    assert_eq!(back.logs, "done\n");
}

#[test]
fn delete_and_update_requests_parse() {
    let del: DeleteJobRequest = serde_json::from_str(r#"{"name":"nightly"}"#).unwrap();
    assert_eq!(del.name, "nightly");

    let upd: UpdateScheduleRequest =
        serde_json::from_str(r#"{"name":"nightly","schedule":""}"#).unwrap();
    assert!(upd.schedule.is_empty());
}

#[test]
fn list_schedules_response_shape() {
    let res = ListSchedulesResponse {
        items: vec![ScheduleItem {
            name: "nightly".into(),
            command: "report".into(),
            args_base64: String::new(),
            cron: "0 0 2 * * *".into(),
            resources: Resources {
                cpu: "500m".into(),
                memory: "1Gi".into(),
            },
        }],
    };
    let json = serde_json::to_string(&res).unwrap();
    assert!(json.contains(r#""cron":"0 0 2 * * *""#));
    assert!(json.contains(r#""memory":"1Gi""#));
}
