pub mod approval;
pub mod employee;
pub mod role;
pub mod status;
pub mod time_off_request;

pub use approval::{NewApproval, TimeOffApproval, TransitionOutcome};
pub use employee::{Employee, EmployeeUpsert};
pub use status::{Decision, RequestStatus, StatusLabel};
pub use time_off_request::{
    EmployeeSummary, NewTimeOffRequest, RequestDraft, RequestView, RequestWithEmployee,
    TimeOffRequest, ValidatedDraft,
};
