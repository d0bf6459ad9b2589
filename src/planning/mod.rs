// Plan engine - turns model output into previewed, approved filesystem changes
//
// Flow per turn: the driver sends a prompt with a workspace snapshot, the
// parser turns the answer into a Plan, the renderer previews it, the approval
// controller asks the user, and the executor applies it inside the working
// directory.

pub mod approval;
pub mod driver;
pub mod executor;
pub mod parser;
pub mod prompts;
pub mod render;
pub mod sandbox;
pub mod types;
pub mod workspace;

pub use approval::{ApprovalController, LineReader, ScriptedReader, StdinReader};
pub use driver::ConversationDriver;
pub use executor::{ExecutionReport, OperationFailure, PlanExecutor};
pub use parser::parse_plan;
pub use prompts::PromptMode;
pub use render::{render_proposed_tree, render_summary, ProposalTreeNode};
pub use types::{ApplyDecision, ApplyResult, Operation, OperationKind, Plan};
pub use workspace::build_workspace_context;
