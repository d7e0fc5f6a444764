pub mod deadline;

pub use deadline::{
    Deadline, DeadlinePatch, ModelError, NewDeadline, NewDeadlineRequest, Priority, Status,
    UpdateDeadlineRequest,
};
