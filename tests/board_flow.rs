//! Integration test driving a project board through a full delivery cycle
//! with the in-memory adapters.

use std::sync::Arc;

use mockable::DefaultClock;

use aalto::board::{
    adapters::memory::{InMemoryBoardRepository, RecordingMailGateway, StaticAuthorizer},
    domain::{Approval, BoardLayout, EmailAddress, Stage, UserId, Visibility},
    ports::BoardRepository,
    services::{
        BoardService, CreateProjectRequest, CreateSubtaskRequest, CreateTaskRequest,
    },
};

type Service =
    BoardService<InMemoryBoardRepository, StaticAuthorizer, RecordingMailGateway, DefaultClock>;

fn service() -> (Arc<InMemoryBoardRepository>, Arc<RecordingMailGateway>, Service) {
    let repository = Arc::new(InMemoryBoardRepository::new());
    let mail = Arc::new(RecordingMailGateway::new());
    let board = BoardService::new(
        Arc::clone(&repository),
        Arc::new(StaticAuthorizer::allow_all()),
        Arc::clone(&mail),
        Arc::new(DefaultClock),
    );
    (repository, mail, board)
}

fn email(address: &str) -> EmailAddress {
    EmailAddress::new(address).expect("address should be valid")
}

#[tokio::test]
async fn a_task_travels_the_board_from_pending_to_completed() {
    let (repository, mail, board) = service();
    let owner = UserId::new();

    let project = board
        .create_project(
            owner,
            CreateProjectRequest::new("Website relaunch", Visibility::Team, email("owner@example.com")),
        )
        .await
        .expect("project creation should succeed")
        .value;
    let columns = repository
        .columns_of_project(project.id())
        .await
        .expect("columns should load");
    let layout = BoardLayout::from_columns(&columns).expect("board should be canonical");

    let task = board
        .create_task(
            owner,
            CreateTaskRequest::new(layout.column_for(Stage::Pending), "Migrate the CMS"),
        )
        .await
        .expect("task creation should succeed")
        .value;
    let export = board
        .create_subtask(owner, CreateSubtaskRequest::new(task.id(), "Export content"))
        .await
        .expect("subtask creation should succeed")
        .value;
    let import = board
        .create_subtask(owner, CreateSubtaskRequest::new(task.id(), "Import content"))
        .await
        .expect("subtask creation should succeed")
        .value;

    let first = board
        .set_subtask_completion(owner, export.id(), true)
        .await
        .expect("completion should succeed");
    let transition = first.transition.expect("partial completion starts work");
    assert_eq!(transition.to, Stage::InProgress);

    let second = board
        .set_subtask_completion(owner, import.id(), true)
        .await
        .expect("completion should succeed");
    let transition = second.transition.expect("full completion enters review");
    assert_eq!(transition.to, Stage::Review);
    assert_eq!(second.task.approval(), Approval::Pending);

    let approved = board
        .approve_task(owner, task.id())
        .await
        .expect("approval should succeed")
        .value;
    assert_eq!(approved.approval(), Approval::Approved);
    assert_eq!(layout.stage_for(approved.column_id()), Some(Stage::Completed));

    // Seven mutations so far, each mailed to the sole watcher.
    assert_eq!(mail.sent().len(), 7);
    let feed = board
        .activity_feed(project.id())
        .await
        .expect("feed should load");
    assert_eq!(feed.len(), 7);
    assert!(feed[0].comment().contains("approved task"));

    board
        .archive_project(owner, project.id())
        .await
        .expect("archival should succeed");
    let archived = repository
        .find_project(project.id())
        .await
        .expect("lookup should succeed")
        .expect("archived project stays readable");
    assert!(archived.is_archived());
}
