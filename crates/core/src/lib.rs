mod apply;
mod metadata;
mod planner;
mod sanitize;
mod template;

pub const DEFAULT_TEMPLATE: &str = "{date}_{orig_name}";

pub use apply::{apply_plan, ApplyReport, RenameFailure};
pub use metadata::FileFacts;
pub use planner::{
    generate_plan, PlanOptions, RenameCandidate, RenamePlan, RenameStats, SkippedEntry,
    IMAGE_EXTENSIONS,
};
pub use template::{parse_template, render_template, TemplateError, TemplatePart};
