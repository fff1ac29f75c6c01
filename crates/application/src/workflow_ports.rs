mod execution;
mod repository;

pub use execution::{
    CompleteWorkflowExecutionInput, CreateWorkflowExecutionInput, SaveWorkflowInput,
    WorkflowExecutionListQuery, WorkflowExecutionRecord, WorkflowExecutionRecordStatus,
};
pub use repository::WorkflowRepository;
