mod jones;
mod schedule;
mod views;

pub use jones::{JonesMatrix, PolarizationSpec};
pub use schedule::{
    default_post_schedule, BranchSpec, FluxDrive, OperatorKind, OperatorPipeline,
    RecombineMode, ScheduleStep,
};
pub use views::{DerivedViews, ViewSegmentsMut};
