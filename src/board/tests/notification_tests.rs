//! Unit tests for watcher notification fan-out.

use std::sync::Arc;

use mockable::DefaultClock;

use crate::board::{
    adapters::memory::{InMemoryBoardRepository, RecordingMailGateway},
    domain::{Activity, EmailAddress, ProjectId, TaskId, UserId, Watcher},
    ports::{BoardRepository, MailGateway, MailGatewayError, MailPayload, MailTemplate},
    services::NotificationDispatcher,
};

use super::helpers::email;

mockall::mock! {
    Gateway {}

    #[async_trait::async_trait]
    impl MailGateway for Gateway {
        async fn send(
            &self,
            recipient: &EmailAddress,
            template: MailTemplate,
            payload: &MailPayload,
        ) -> Result<(), MailGatewayError>;
    }
}

fn activity(project: ProjectId, task: Option<TaskId>) -> Activity {
    Activity::record(project, UserId::new(), task, "created a new task", &DefaultClock)
}

async fn watch(repository: &InMemoryBoardRepository, project: ProjectId, address: &str) -> UserId {
    let user = UserId::new();
    repository
        .insert_watcher(&Watcher::new(project, user, email(address)))
        .await
        .expect("watcher insert should succeed");
    user
}

#[tokio::test]
async fn zero_watchers_means_zero_sends_and_no_error() {
    let repository = Arc::new(InMemoryBoardRepository::new());
    let mail = Arc::new(RecordingMailGateway::new());
    let dispatcher = NotificationDispatcher::new(Arc::clone(&repository), Arc::clone(&mail));
    let project = ProjectId::new();

    let report = dispatcher
        .notify(project, &activity(project, None))
        .await
        .expect("dispatch should succeed");
    assert_eq!(report.sent, 0);
    assert!(report.is_clean());
    assert!(mail.sent().is_empty());
}

#[tokio::test]
async fn each_watcher_is_notified_exactly_once() {
    let repository = Arc::new(InMemoryBoardRepository::new());
    let mail = Arc::new(RecordingMailGateway::new());
    let dispatcher = NotificationDispatcher::new(Arc::clone(&repository), Arc::clone(&mail));
    let project = ProjectId::new();

    let first = watch(&repository, project, "first@example.com").await;
    watch(&repository, project, "second@example.com").await;
    // Re-enrolling an existing watcher must not double their mail.
    repository
        .insert_watcher(&Watcher::new(project, first, email("first@example.com")))
        .await
        .expect("watcher insert should succeed");

    let report = dispatcher
        .notify(project, &activity(project, None))
        .await
        .expect("dispatch should succeed");
    assert_eq!(report.sent, 2);
    assert!(report.is_clean());
    assert_eq!(mail.sent().len(), 2);
}

#[tokio::test]
async fn template_follows_the_activity_scope() {
    let repository = Arc::new(InMemoryBoardRepository::new());
    let mail = Arc::new(RecordingMailGateway::new());
    let dispatcher = NotificationDispatcher::new(Arc::clone(&repository), Arc::clone(&mail));
    let project = ProjectId::new();
    watch(&repository, project, "watcher@example.com").await;

    dispatcher
        .notify(project, &activity(project, Some(TaskId::new())))
        .await
        .expect("dispatch should succeed");
    dispatcher
        .notify(project, &activity(project, None))
        .await
        .expect("dispatch should succeed");

    let sent = mail.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].template, MailTemplate::TaskActivity);
    assert_eq!(sent[1].template, MailTemplate::ProjectActivity);
}

#[tokio::test]
async fn one_failing_recipient_never_aborts_the_fan_out() {
    let repository = Arc::new(InMemoryBoardRepository::new());
    let mail = Arc::new(RecordingMailGateway::new());
    let dispatcher = NotificationDispatcher::new(Arc::clone(&repository), Arc::clone(&mail));
    let project = ProjectId::new();

    watch(&repository, project, "bouncing@example.com").await;
    watch(&repository, project, "healthy@example.com").await;
    mail.fail_for(&email("bouncing@example.com"));

    let report = dispatcher
        .notify(project, &activity(project, None))
        .await
        .expect("dispatch should succeed despite the bounce");
    assert_eq!(report.sent, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(
        report.failures[0].recipient,
        email("bouncing@example.com")
    );
    assert!(!report.is_clean());
}

#[tokio::test]
async fn transport_failures_are_collected_not_returned() {
    let repository = Arc::new(InMemoryBoardRepository::new());
    let project = ProjectId::new();
    watch(&repository, project, "watcher@example.com").await;

    let mut gateway = MockGateway::new();
    gateway.expect_send().returning(|_, _, _| {
        Err(MailGatewayError::transport(std::io::Error::other(
            "smtp connection reset",
        )))
    });
    let dispatcher = NotificationDispatcher::new(Arc::clone(&repository), Arc::new(gateway));

    let report = dispatcher
        .notify(project, &activity(project, None))
        .await
        .expect("dispatch should succeed despite transport failure");
    assert_eq!(report.sent, 0);
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(
        report.failures[0].error,
        MailGatewayError::Transport(_)
    ));
}
