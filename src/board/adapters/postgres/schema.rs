//! Diesel schema for board persistence.

diesel::table! {
    /// Project records.
    projects (id) {
        /// Project identifier.
        id -> Uuid,
        /// Project name.
        #[max_length = 255]
        name -> Varchar,
        /// Visibility scope.
        #[max_length = 50]
        visibility -> Varchar,
        /// Optional timeline start.
        start_date -> Nullable<Timestamptz>,
        /// Optional timeline end.
        end_date -> Nullable<Timestamptz>,
        /// Completion timestamp, if completed.
        completed_at -> Nullable<Timestamptz>,
        /// Archival timestamp, if archived.
        archived_at -> Nullable<Timestamptz>,
        /// Approval marker.
        #[max_length = 50]
        approval -> Varchar,
    }
}

diesel::table! {
    /// Board columns, five per project, ordered by rank.
    columns (id) {
        /// Column identifier.
        id -> Uuid,
        /// Owning project.
        project_id -> Uuid,
        /// Display name.
        #[max_length = 255]
        name -> Varchar,
        /// Zero-based position on the board.
        rank -> Int4,
    }
}

diesel::table! {
    /// Task records.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Owning column.
        column_id -> Uuid,
        /// Content text.
        #[max_length = 255]
        content -> Varchar,
        /// Priority level.
        #[max_length = 50]
        priority -> Varchar,
        /// Optional assignee.
        assignee -> Nullable<Uuid>,
        /// Optional due date.
        due_date -> Nullable<Timestamptz>,
        /// Optional start date.
        start_date -> Nullable<Timestamptz>,
        /// Completion timestamp, if complete.
        completed_at -> Nullable<Timestamptz>,
        /// Approval marker.
        #[max_length = 50]
        approval -> Varchar,
    }
}

diesel::table! {
    /// Subtask records.
    subtasks (id) {
        /// Subtask identifier.
        id -> Uuid,
        /// Parent task.
        task_id -> Uuid,
        /// Content text.
        #[max_length = 255]
        content -> Varchar,
        /// Optional assignee.
        assignee -> Nullable<Uuid>,
        /// Optional due date.
        due_date -> Nullable<Timestamptz>,
        /// Completion timestamp, if complete.
        completed_at -> Nullable<Timestamptz>,
        /// Whether the subtask counts towards the completion ratio.
        applicable -> Bool,
    }
}

diesel::table! {
    /// Activity feed entries.
    activities (id) {
        /// Activity identifier.
        id -> Uuid,
        /// Owning project.
        project_id -> Uuid,
        /// Related task, if the entry concerns one.
        task_id -> Nullable<Uuid>,
        /// Acting user.
        user_id -> Uuid,
        /// Human-readable comment.
        comment -> Text,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Read timestamp, unset while unread.
        read_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Watcher enrolment, one row per project and user.
    watchers (project_id, user_id) {
        /// Watched project.
        project_id -> Uuid,
        /// Watching user.
        user_id -> Uuid,
        /// Delivery address.
        #[max_length = 255]
        email -> Varchar,
    }
}

diesel::joinable!(columns -> projects (project_id));
diesel::joinable!(tasks -> columns (column_id));
diesel::joinable!(subtasks -> tasks (task_id));
diesel::joinable!(activities -> projects (project_id));
diesel::joinable!(watchers -> projects (project_id));

diesel::allow_tables_to_appear_in_same_query!(
    projects, columns, tasks, subtasks, activities, watchers
);
