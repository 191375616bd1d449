pub mod task;
pub mod user;

pub use task::{
    BulkAction, BulkUpdateRequest, BulkUpdateResponse, PriorityBreakdown, Task, TaskInput,
    TaskPriority, TaskQuery, TaskStats, TaskUpdate,
};
pub use user::{ProfileUpdate, User, UserProfile};
