//! Shared fixtures for board tests.

use std::sync::Arc;

use mockable::DefaultClock;

use crate::board::{
    adapters::memory::{InMemoryBoardRepository, RecordingMailGateway, StaticAuthorizer},
    domain::{
        BoardLayout, EmailAddress, Project, Stage, Subtask, Task, UserId, Visibility,
    },
    ports::BoardRepository,
    services::{BoardService, CreateProjectRequest, CreateSubtaskRequest, CreateTaskRequest},
};

/// Service wired to in-memory adapters.
pub type TestService =
    BoardService<InMemoryBoardRepository, StaticAuthorizer, RecordingMailGateway, DefaultClock>;

/// In-memory test harness exposing the service and its adapters.
pub struct Harness {
    pub repository: Arc<InMemoryBoardRepository>,
    pub authorizer: Arc<StaticAuthorizer>,
    pub mail: Arc<RecordingMailGateway>,
    pub service: TestService,
}

impl Harness {
    pub fn new() -> Self {
        let repository = Arc::new(InMemoryBoardRepository::new());
        let authorizer = Arc::new(StaticAuthorizer::allow_all());
        let mail = Arc::new(RecordingMailGateway::new());
        let service = BoardService::new(
            Arc::clone(&repository),
            Arc::clone(&authorizer),
            Arc::clone(&mail),
            Arc::new(DefaultClock),
        );
        Self {
            repository,
            authorizer,
            mail,
            service,
        }
    }

    /// Creates a team project owned by `owner` and returns it with its board
    /// layout.
    pub async fn project(&self, owner: UserId) -> (Project, BoardLayout) {
        let request =
            CreateProjectRequest::new("Launch", Visibility::Team, email("owner@example.com"));
        let created = self
            .service
            .create_project(owner, request)
            .await
            .expect("project creation should succeed");
        let columns = self
            .repository
            .columns_of_project(created.value.id())
            .await
            .expect("columns should load");
        let layout = BoardLayout::from_columns(&columns).expect("canonical board should be valid");
        (created.value, layout)
    }

    /// Creates a task in the pending column.
    pub async fn task(&self, actor: UserId, layout: &BoardLayout) -> Task {
        let request = CreateTaskRequest::new(layout.column_for(Stage::Pending), "Ship the release");
        self.service
            .create_task(actor, request)
            .await
            .expect("task creation should succeed")
            .value
    }

    /// Creates a subtask under `task` with the given content.
    pub async fn subtask(&self, actor: UserId, task: &Task, content: &str) -> Subtask {
        self.service
            .create_subtask(actor, CreateSubtaskRequest::new(task.id(), content))
            .await
            .expect("subtask creation should succeed")
            .value
    }

    /// Reloads a task and maps its column back to a stage.
    pub async fn stage_of(&self, task: &Task, layout: &BoardLayout) -> Stage {
        let current = self
            .repository
            .find_task(task.id())
            .await
            .expect("task lookup should succeed")
            .expect("task should exist");
        layout
            .stage_for(current.column_id())
            .expect("task column should belong to the board")
    }
}

/// Parses a known-good address.
pub fn email(address: &str) -> EmailAddress {
    EmailAddress::new(address).expect("address should be valid")
}
