use std::path::PathBuf;

use taskmate::error::{exit_codes, Error, JsonError};

#[test]
fn exit_codes_map_correctly() {
    let user = Error::Validation("bad".to_string());
    assert_eq!(user.exit_code(), exit_codes::USER_ERROR);

    let unknown = Error::UnknownResource("taskmate://nowhere".to_string());
    assert_eq!(unknown.exit_code(), exit_codes::USER_ERROR);

    let storage = Error::Storage {
        path: PathBuf::from("output/tasks.json"),
        source: std::io::Error::other("disk full"),
    };
    assert_eq!(storage.exit_code(), exit_codes::OPERATION_FAILED);
}

#[test]
fn only_validation_and_not_found_are_reportable() {
    assert!(Error::Validation("x".to_string()).is_reportable());
    assert!(Error::TaskNotFound(1).is_reportable());
    assert!(Error::SubtaskNotFound {
        task_id: 1,
        subtask_id: 2
    }
    .is_reportable());

    assert!(!Error::UnknownOperation("x".to_string()).is_reportable());
    assert!(!Error::InvalidArguments("x".to_string()).is_reportable());
    assert!(!Error::Io(std::io::Error::other("x")).is_reportable());
}

#[test]
fn not_found_messages_name_ids() {
    assert_eq!(Error::TaskNotFound(7).to_string(), "Task (ID: 7) not found");
    assert_eq!(
        Error::SubtaskNotFound {
            task_id: 7,
            subtask_id: 3
        }
        .to_string(),
        "Subtask (ID: 3) not found in task (ID: 7)"
    );
}

#[test]
fn json_error_includes_code_and_details() {
    let err = Error::SubtaskNotFound {
        task_id: 7,
        subtask_id: 3,
    };
    let json = JsonError::from(&err);
    assert_eq!(json.code, exit_codes::USER_ERROR);
    assert!(json.error.contains("Subtask (ID: 3)"));
    let details = json.details.expect("details");
    assert_eq!(details["task_id"], 7);
    assert_eq!(details["subtask_id"], 3);
}
