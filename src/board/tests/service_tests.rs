//! Unit tests for board service orchestration.

use crate::board::{
    domain::{Approval, Stage, UserId, Visibility},
    ports::{BoardAction, BoardRepository},
    services::{
        BoardServiceError, CreateProjectRequest, CreateTaskRequest, TransitionError,
        UpdateSubtaskRequest, UpdateTaskRequest,
    },
};

use super::helpers::{Harness, email};

#[tokio::test]
async fn creating_a_project_builds_the_board_and_enrolls_the_owner() {
    let harness = Harness::new();
    let owner = UserId::new();
    let request =
        CreateProjectRequest::new("Launch", Visibility::OnlyMe, email("owner@example.com"));

    let created = harness
        .service
        .create_project(owner, request)
        .await
        .expect("project creation should succeed");
    assert_eq!(created.value.name().as_str(), "Launch");
    assert_eq!(created.value.visibility(), Visibility::OnlyMe);
    assert_eq!(created.value.approval(), Approval::Pending);

    let columns = harness
        .repository
        .columns_of_project(created.value.id())
        .await
        .expect("columns should load");
    assert_eq!(columns.len(), 5);

    let watchers = harness
        .repository
        .watchers_of_project(created.value.id())
        .await
        .expect("watchers should load");
    assert_eq!(watchers.len(), 1);
    assert_eq!(watchers[0].user_id(), owner);

    // The owner watches the project, so the creation entry reaches them.
    assert_eq!(created.dispatch.sent, 1);
}

#[tokio::test]
async fn denied_actors_cannot_mutate() {
    let harness = Harness::new();
    let owner = UserId::new();
    let intruder = UserId::new();
    let (project, layout) = harness.project(owner).await;
    harness.authorizer.deny(intruder);

    let request = CreateTaskRequest::new(
        layout.column_for(Stage::Pending),
        "Ship the release",
    );
    let denied = harness.service.create_task(intruder, request).await;
    assert!(matches!(
        denied,
        Err(BoardServiceError::Unauthorized {
            actor,
            action: BoardAction::CreateTask,
            ..
        }) if actor == intruder
    ));

    let feed = harness
        .service
        .activity_feed(project.id())
        .await
        .expect("feed should load");
    assert_eq!(feed.len(), 1, "only the creation entry should exist");
}

#[tokio::test]
async fn archived_projects_reject_mutation_but_stay_readable() {
    let harness = Harness::new();
    let owner = UserId::new();
    let (project, layout) = harness.project(owner).await;
    let task = harness.task(owner, &layout).await;

    harness
        .service
        .archive_project(owner, project.id())
        .await
        .expect("archival should succeed");

    let request = UpdateTaskRequest::new(task.id(), "Renamed");
    let rejected = harness.service.update_task(owner, request).await;
    assert!(matches!(
        rejected,
        Err(BoardServiceError::InvalidTransition(
            TransitionError::ProjectArchived(id)
        )) if id == project.id()
    ));

    let rearchived = harness.service.archive_project(owner, project.id()).await;
    assert!(matches!(
        rearchived,
        Err(BoardServiceError::InvalidTransition(
            TransitionError::ProjectArchived(_)
        ))
    ));

    let feed = harness
        .service
        .activity_feed(project.id())
        .await
        .expect("archived projects keep their feed readable");
    assert!(!feed.is_empty());
}

#[tokio::test]
async fn project_lifecycle_round_trip() {
    let harness = Harness::new();
    let owner = UserId::new();
    let (project, _) = harness.project(owner).await;

    let completed = harness
        .service
        .complete_project(owner, project.id())
        .await
        .expect("completion should succeed");
    assert!(completed.value.is_completed());
    assert_eq!(completed.value.approval(), Approval::Pending);

    let approved = harness
        .service
        .approve_project(owner, project.id())
        .await
        .expect("approval should succeed");
    assert_eq!(approved.value.approval(), Approval::Approved);

    let reopened = harness
        .service
        .reopen_project(owner, project.id())
        .await
        .expect("reopening should succeed");
    assert!(!reopened.value.is_completed());
    assert_eq!(reopened.value.approval(), Approval::Pending);
}

#[tokio::test]
async fn approving_a_task_requires_the_review_column() {
    let harness = Harness::new();
    let owner = UserId::new();
    let (_, layout) = harness.project(owner).await;
    let task = harness.task(owner, &layout).await;

    let premature = harness.service.approve_task(owner, task.id()).await;
    assert!(matches!(
        premature,
        Err(BoardServiceError::InvalidTransition(
            TransitionError::NotAwaitingApproval(id)
        )) if id == task.id()
    ));

    let subtask = harness.subtask(owner, &task, "only step").await;
    harness
        .service
        .set_subtask_completion(owner, subtask.id(), true)
        .await
        .expect("completion should succeed");

    let approved = harness
        .service
        .approve_task(owner, task.id())
        .await
        .expect("a task in review can be approved");
    assert_eq!(approved.value.approval(), Approval::Approved);
    assert_eq!(harness.stage_of(&task, &layout).await, Stage::Completed);
}

#[tokio::test]
async fn rejecting_a_task_keeps_it_in_review() {
    let harness = Harness::new();
    let owner = UserId::new();
    let (_, layout) = harness.project(owner).await;
    let task = harness.task(owner, &layout).await;
    let subtask = harness.subtask(owner, &task, "only step").await;
    harness
        .service
        .set_subtask_completion(owner, subtask.id(), true)
        .await
        .expect("completion should succeed");

    let rejected = harness
        .service
        .reject_task(owner, task.id())
        .await
        .expect("a task in review can be rejected");
    assert_eq!(rejected.value.approval(), Approval::Rejected);
    assert_eq!(harness.stage_of(&task, &layout).await, Stage::Review);
}

#[tokio::test]
async fn commenting_on_a_task_records_and_notifies() {
    let harness = Harness::new();
    let owner = UserId::new();
    let (project, layout) = harness.project(owner).await;
    let task = harness.task(owner, &layout).await;

    let commented = harness
        .service
        .comment_task(owner, task.id(), "Looks ready to ship".into())
        .await
        .expect("comment should succeed");
    assert_eq!(commented.activity.task_id(), Some(task.id()));
    assert!(commented.activity.comment().contains("Looks ready to ship"));
    assert_eq!(commented.dispatch.sent, 1);

    let feed = harness
        .service
        .activity_feed(project.id())
        .await
        .expect("feed should load");
    assert!(feed[0].comment().contains("commented on task"));

    let blank = harness
        .service
        .comment_task(owner, task.id(), "   ".into())
        .await;
    assert!(blank.is_err());
}

#[tokio::test]
async fn deleting_a_task_removes_its_subtasks() {
    let harness = Harness::new();
    let owner = UserId::new();
    let (_, layout) = harness.project(owner).await;
    let task = harness.task(owner, &layout).await;
    let subtask = harness.subtask(owner, &task, "doomed step").await;

    harness
        .service
        .delete_task(owner, task.id())
        .await
        .expect("deletion should succeed");

    let gone_task = harness
        .repository
        .find_task(task.id())
        .await
        .expect("lookup should succeed");
    assert!(gone_task.is_none());
    let gone_subtask = harness
        .repository
        .find_subtask(subtask.id())
        .await
        .expect("lookup should succeed");
    assert!(gone_subtask.is_none());
}

#[tokio::test]
async fn redundant_assignment_is_a_silent_no_op() {
    let harness = Harness::new();
    let owner = UserId::new();
    let assignee = UserId::new();
    let (project, layout) = harness.project(owner).await;
    let task = harness.task(owner, &layout).await;

    let assigned = harness
        .service
        .assign_task(owner, task.id(), Some(assignee))
        .await
        .expect("assignment should succeed");
    assert!(assigned.is_some());

    let feed_before = harness
        .service
        .activity_feed(project.id())
        .await
        .expect("feed should load");
    let repeated = harness
        .service
        .assign_task(owner, task.id(), Some(assignee))
        .await
        .expect("redundant assignment should not fail");
    assert!(repeated.is_none());

    let feed_after = harness
        .service
        .activity_feed(project.id())
        .await
        .expect("feed should load");
    assert_eq!(feed_before.len(), feed_after.len());
}

#[tokio::test]
async fn every_mutation_lands_in_the_feed_newest_first() {
    let harness = Harness::new();
    let owner = UserId::new();
    let (project, layout) = harness.project(owner).await;
    let task = harness.task(owner, &layout).await;
    let subtask = harness.subtask(owner, &task, "first step").await;
    harness
        .service
        .update_subtask(
            owner,
            UpdateSubtaskRequest::new(subtask.id(), "renamed step"),
        )
        .await
        .expect("update should succeed");

    let feed = harness
        .service
        .activity_feed(project.id())
        .await
        .expect("feed should load");
    assert_eq!(feed.len(), 4);
    assert!(feed[0].comment().contains("renamed step"));
    for window in feed.windows(2) {
        assert!(window[0].created_at() >= window[1].created_at());
    }
}

#[tokio::test]
async fn read_markers_stick_without_new_feed_entries() {
    let harness = Harness::new();
    let owner = UserId::new();
    let (project, _) = harness.project(owner).await;
    let feed = harness
        .service
        .activity_feed(project.id())
        .await
        .expect("feed should load");
    let entry = feed.first().expect("creation entry should exist");
    assert!(!entry.is_read());

    let marked = harness
        .service
        .mark_activity_read(entry.id())
        .await
        .expect("marking should succeed");
    assert!(marked.is_read());

    let remarked = harness
        .service
        .mark_activity_read(entry.id())
        .await
        .expect("re-marking should be a no-op");
    assert_eq!(remarked.read_at(), marked.read_at());

    let after = harness
        .service
        .activity_feed(project.id())
        .await
        .expect("feed should load");
    assert_eq!(after.len(), feed.len());
}

#[tokio::test]
async fn watcher_additions_notify_existing_watchers() {
    let harness = Harness::new();
    let owner = UserId::new();
    let (project, _) = harness.project(owner).await;

    let added = harness
        .service
        .add_watcher(
            owner,
            project.id(),
            UserId::new(),
            email("colleague@example.com"),
        )
        .await
        .expect("watcher addition should succeed");
    // Both the owner and the newly added watcher receive the entry.
    assert_eq!(added.dispatch.sent, 2);

    let watchers = harness
        .repository
        .watchers_of_project(project.id())
        .await
        .expect("watchers should load");
    assert_eq!(watchers.len(), 2);
}
