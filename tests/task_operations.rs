mod support;

use serde_json::json;
use support::{task_json, TestRoot};
use taskmate::error::Error;
use taskmate::scope::Scope;
use taskmate::task::{NewTask, TaskFilter, TaskStatus};

#[test]
fn next_task_keeps_in_progress_status() -> Result<(), Box<dyn std::error::Error>> {
    let root = TestRoot::new();
    let scope = Scope::agent("alice");
    root.write_tasks(
        &scope,
        &json!([
            task_json(1, "one", 3, "todo"),
            task_json(2, "two", 5, "in_progress"),
            task_json(3, "three", 1, "done"),
        ]),
    )?;

    let picked = root.store().next(&scope)?.expect("a pending task");
    assert_eq!(picked.id, 2);
    assert_eq!(picked.status, TaskStatus::InProgress);

    let stored = root.read_tasks(&scope)?;
    assert_eq!(stored[0]["status"], "todo");
    assert_eq!(stored[1]["status"], "in_progress");
    Ok(())
}

#[test]
fn next_task_flips_todo_to_in_progress() -> Result<(), Box<dyn std::error::Error>> {
    let root = TestRoot::new();
    let scope = Scope::root();
    root.write_tasks(
        &scope,
        &json!([task_json(1, "one", 3, "todo"), task_json(2, "two", 5, "done")]),
    )?;

    let picked = root.store().next(&scope)?.expect("a pending task");
    assert_eq!(picked.id, 1);
    assert_eq!(root.read_tasks(&scope)?[0]["status"], "in_progress");
    Ok(())
}

#[test]
fn next_task_ties_go_to_first_in_collection() -> Result<(), Box<dyn std::error::Error>> {
    let root = TestRoot::new();
    let scope = Scope::root();
    root.write_tasks(
        &scope,
        &json!([
            task_json(4, "low", 2, "todo"),
            task_json(7, "first high", 4, "todo"),
            task_json(5, "second high", 4, "todo"),
        ]),
    )?;

    assert_eq!(root.store().next(&scope)?.map(|task| task.id), Some(7));
    Ok(())
}

#[test]
fn next_task_on_finished_scope_writes_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let root = TestRoot::new();
    let scope = Scope::agent("bob");
    let path = root.write_raw(&scope, "[]")?;

    assert!(root.store().next(&scope)?.is_none());
    assert_eq!(std::fs::read_to_string(path)?, "[]");
    Ok(())
}

#[test]
fn create_task_builds_subtasks() -> Result<(), Box<dyn std::error::Error>> {
    let root = TestRoot::new();
    let scope = Scope::agent("alice").with_project("web");
    let task = root
        .store()
        .create(&scope, NewTask::new("T", "D").subtasks(["a", "b"]))?;

    assert_eq!(task.id, 1);
    assert_eq!(task.priority, 3);
    assert_eq!(task.status, TaskStatus::Todo);
    assert_eq!(task.progress, 0.0);
    let ids: Vec<u64> = task.subtasks.iter().map(|subtask| subtask.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert!(task
        .subtasks
        .iter()
        .all(|subtask| subtask.status == TaskStatus::Todo));

    let stored = root.read_tasks(&scope)?;
    assert_eq!(stored[0]["notes"], json!([]));
    assert_eq!(stored[0]["progress"], json!(0));
    Ok(())
}

#[test]
fn create_task_ids_follow_highest_existing() -> Result<(), Box<dyn std::error::Error>> {
    let root = TestRoot::new();
    let scope = Scope::root();
    root.write_tasks(
        &scope,
        &json!([task_json(9, "nine", 3, "done"), task_json(2, "two", 3, "todo")]),
    )?;

    let task = root.store().create(&scope, NewTask::new("next", "d"))?;
    assert_eq!(task.id, 10);
    Ok(())
}

#[test]
fn hand_edited_fields_survive_mutation() -> Result<(), Box<dyn std::error::Error>> {
    let root = TestRoot::new();
    let scope = Scope::root();
    let mut task = task_json(1, "a", 3, "todo");
    task["due"] = json!("2026-01-01");
    root.write_tasks(&scope, &json!([task]))?;

    root.store().create(&scope, NewTask::new("b", "d"))?;

    let stored = root.read_tasks(&scope)?;
    assert_eq!(stored[0]["due"], "2026-01-01");
    assert!(stored[1].get("due").is_none());
    Ok(())
}

#[test]
fn create_task_requires_title_and_description() {
    let root = TestRoot::new();
    let store = root.store();
    for new_task in [NewTask::new("", "d"), NewTask::new("t", "")] {
        assert!(matches!(
            store.create(&Scope::root(), new_task),
            Err(Error::Validation(_))
        ));
    }
    assert!(!root.tasks_path(&Scope::root()).exists());
}

#[test]
fn progress_drives_status() -> Result<(), Box<dyn std::error::Error>> {
    let root = TestRoot::new();
    let store = root.store();
    let scope = Scope::agent("alice");
    store.create(&scope, NewTask::new("t", "d").subtasks(["a"]))?;

    let task = store.update_progress(&scope, 1, 50.0)?;
    assert_eq!(task.status, TaskStatus::InProgress);

    let task = store.update_progress(&scope, 1, 100.0)?;
    assert_eq!(task.status, TaskStatus::Done);
    assert_eq!(task.subtasks[0].status, TaskStatus::Todo);

    // lowering progress moves a done task back
    let task = store.update_progress(&scope, 1, 40.0)?;
    assert_eq!(task.status, TaskStatus::InProgress);

    let task = store.update_progress(&scope, 1, 0.0)?;
    assert_eq!(task.status, TaskStatus::InProgress);
    Ok(())
}

#[test]
fn progress_out_of_range_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let root = TestRoot::new();
    let store = root.store();
    store.create(&Scope::root(), NewTask::new("t", "d"))?;

    for progress in [-1.0, 100.5] {
        assert!(matches!(
            store.update_progress(&Scope::root(), 1, progress),
            Err(Error::Validation(_))
        ));
    }
    assert!(matches!(
        store.update_progress(&Scope::root(), 2, 10.0),
        Err(Error::TaskNotFound(2))
    ));
    Ok(())
}

#[test]
fn subtask_completion_law() -> Result<(), Box<dyn std::error::Error>> {
    let root = TestRoot::new();
    let store = root.store();
    let scope = Scope::root();
    store.create(&scope, NewTask::new("t", "d").subtasks(["a", "b", "c"]))?;

    let task = store.update_subtask(&scope, 1, 1, TaskStatus::Done)?;
    assert_eq!(task.progress, 33.0);
    assert_eq!(task.status, TaskStatus::InProgress);

    let task = store.update_subtask(&scope, 1, 2, TaskStatus::Done)?;
    assert_eq!(task.progress, 67.0);

    let task = store.update_subtask(&scope, 1, 3, TaskStatus::Done)?;
    assert_eq!(task.progress, 100.0);
    assert_eq!(task.status, TaskStatus::Done);

    let stored = root.read_tasks(&scope)?;
    assert_eq!(stored[0]["progress"], json!(100));
    assert_eq!(stored[0]["subtasks"][2]["status"], "done");
    Ok(())
}

#[test]
fn subtask_reset_keeps_parent_status() -> Result<(), Box<dyn std::error::Error>> {
    let root = TestRoot::new();
    let store = root.store();
    let scope = Scope::root();
    store.create(&scope, NewTask::new("t", "d").subtasks(["a", "b"]))?;
    store.update_subtask(&scope, 1, 1, TaskStatus::Done)?;

    let task = store.update_subtask(&scope, 1, 1, TaskStatus::Todo)?;
    assert_eq!(task.progress, 0.0);
    assert_eq!(task.status, TaskStatus::InProgress);
    Ok(())
}

#[test]
fn missing_subtask_is_distinct_from_missing_task() -> Result<(), Box<dyn std::error::Error>> {
    let root = TestRoot::new();
    let store = root.store();
    store.create(&Scope::root(), NewTask::new("t", "d"))?;

    assert!(matches!(
        store.update_subtask(&Scope::root(), 1, 3, TaskStatus::Done),
        Err(Error::SubtaskNotFound {
            task_id: 1,
            subtask_id: 3
        })
    ));
    assert!(matches!(
        store.update_subtask(&Scope::root(), 5, 1, TaskStatus::Done),
        Err(Error::TaskNotFound(5))
    ));
    Ok(())
}

#[test]
fn add_subtask_uses_max_plus_one() -> Result<(), Box<dyn std::error::Error>> {
    let root = TestRoot::new();
    let scope = Scope::root();
    let mut task = task_json(1, "t", 3, "todo");
    task["subtasks"] = json!([{ "id": 4, "description": "x", "status": "todo" }]);
    root.write_tasks(&scope, &json!([task]))?;

    let subtask = root.store().add_subtask(&scope, 1, "y")?;
    assert_eq!(subtask.id, 5);
    assert_eq!(subtask.status, TaskStatus::Todo);
    Ok(())
}

#[test]
fn notes_are_numbered_by_count() -> Result<(), Box<dyn std::error::Error>> {
    let root = TestRoot::new();
    let store = root.store();
    let scope = Scope::agent("alice");
    // documents written without a notes field still accept notes
    root.write_tasks(&scope, &json!([task_json(1, "t", 3, "todo")]))?;

    let first = store.add_note(&scope, 1, "started")?;
    let second = store.add_note(&scope, 1, "日本語のメモ")?;
    assert_eq!((first.id, second.id), (1, 2));
    assert!(!first.timestamp.is_empty());

    let stored = root.read_tasks(&scope)?;
    assert_eq!(stored[0]["notes"][1]["content"], "日本語のメモ");
    Ok(())
}

#[test]
fn filters_preserve_order() -> Result<(), Box<dyn std::error::Error>> {
    let root = TestRoot::new();
    let scope = Scope::root();
    root.write_tasks(
        &scope,
        &json!([
            task_json(1, "a", 1, "done"),
            task_json(2, "b", 4, "todo"),
            task_json(3, "c", 3, "done"),
            task_json(4, "d", 5, "in_progress"),
        ]),
    )?;
    let store = root.store();

    let done = store.list(
        &scope,
        &TaskFilter {
            status: Some(TaskStatus::Done),
            priority_min: None,
        },
    )?;
    assert_eq!(done.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 3]);

    let urgent = store.list(
        &scope,
        &TaskFilter {
            status: None,
            priority_min: Some(3),
        },
    )?;
    assert_eq!(urgent.iter().map(|t| t.id).collect::<Vec<_>>(), vec![2, 3, 4]);
    Ok(())
}

#[test]
fn corrupt_collection_reads_as_empty() -> Result<(), Box<dyn std::error::Error>> {
    let root = TestRoot::new();
    let scope = Scope::agent("alice");
    root.write_raw(&scope, "{ not json")?;
    let store = root.store();

    assert!(store.list(&scope, &TaskFilter::default())?.is_empty());
    assert!(store.storage().read_collection(&scope).is_degraded());

    // the next write replaces the corrupt document
    let task = store.create(&scope, NewTask::new("fresh", "d"))?;
    assert_eq!(task.id, 1);
    assert_eq!(root.read_tasks(&scope)?.as_array().map(Vec::len), Some(1));
    Ok(())
}

#[test]
fn scopes_are_isolated() -> Result<(), Box<dyn std::error::Error>> {
    let root = TestRoot::new();
    let store = root.store();
    store.create(&Scope::root(), NewTask::new("root", "d"))?;
    store.create(&Scope::agent("alice"), NewTask::new("alice", "d"))?;
    store.create(
        &Scope::agent("alice").with_project("web"),
        NewTask::new("web", "d"),
    )?;

    for (scope, title) in [
        (Scope::root(), "root"),
        (Scope::agent("alice"), "alice"),
        (Scope::agent("alice").with_project("web"), "web"),
    ] {
        let tasks = store.list(&scope, &TaskFilter::default())?;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, 1);
        assert_eq!(tasks[0].title, title);
    }

    assert_eq!(store.storage().list_agents(), vec!["alice".to_string()]);
    assert_eq!(
        store.storage().list_projects("alice"),
        vec!["web".to_string()]
    );
    assert!(store.storage().list_projects("nobody").is_empty());
    Ok(())
}

#[test]
fn traversal_scopes_are_rejected() {
    let root = TestRoot::new();
    let store = root.store();
    for scope in [
        Scope::agent(".."),
        Scope::agent("a/b"),
        Scope::agent("alice").with_project(".."),
    ] {
        assert!(matches!(
            store.create(&scope, NewTask::new("t", "d")),
            Err(Error::Validation(_))
        ));
    }
}

#[test]
fn collection_file_name_cannot_be_an_agent() -> Result<(), Box<dyn std::error::Error>> {
    let root = TestRoot::new();
    let store = root.store();
    store.create(&Scope::root(), NewTask::new("root task", "d"))?;

    assert!(matches!(
        store.create(&Scope::agent("tasks.json"), NewTask::new("t", "d")),
        Err(Error::Validation(_))
    ));
    assert_eq!(store.list(&Scope::root(), &TaskFilter::default())?.len(), 1);
    Ok(())
}
