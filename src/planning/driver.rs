// Conversation driver - prompt, plan, preview, approve, execute; repeated on follow-ups
//
// One driver owns one conversation: the same client (so the same provider and
// model) answers every turn. A turn ends the conversation unless the user
// declines the plan with a follow-up prompt.

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::cli::{Output, ThinkingIndicator};
use crate::errors::TransportError;
use crate::providers::LlmClient;

use super::approval::ApprovalController;
use super::executor::PlanExecutor;
use super::parser::parse_plan;
use super::prompts::{build_plan_coercion_prompt, PromptMode};
use super::render::{render_proposed_tree, render_summary};
use super::types::{ApplyDecision, ApplyResult, Plan};
use super::workspace::build_workspace_context;

pub struct ConversationDriver {
    client: Box<dyn LlmClient>,
    output: Arc<dyn Output>,
    approvals: ApprovalController,
    executor: PlanExecutor,
    mode: PromptMode,
    cancel: CancellationToken,
    draw_spinner: bool,
}

impl ConversationDriver {
    pub fn new(
        client: Box<dyn LlmClient>,
        output: Arc<dyn Output>,
        approvals: ApprovalController,
        working_dir: impl Into<PathBuf>,
        mode: PromptMode,
    ) -> Self {
        let executor = PlanExecutor::new(working_dir, Arc::clone(&output));
        Self {
            client,
            output,
            approvals,
            executor,
            mode,
            cancel: CancellationToken::new(),
            draw_spinner: io::stdout().is_terminal(),
        }
    }

    /// Abort in-flight model calls when `token` fires.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Force the spinner on or off (it defaults to on for terminals).
    pub fn with_spinner(mut self, draw: bool) -> Self {
        self.draw_spinner = draw;
        self
    }

    pub fn mode(&self) -> PromptMode {
        self.mode
    }

    /// Run the conversation starting from `prompt`. Returns the exit code.
    pub async fn run(&mut self, prompt: &str) -> i32 {
        let mut current_prompt = prompt.trim().to_string();

        loop {
            // ── 1. Ask the model ────────────────────────────────────────────
            let context = build_workspace_context(self.executor.working_dir());
            let request = self.mode.build(&current_prompt, &context);
            let response = match self.ask(&request, "AI is thinking", "AI response ready").await {
                Ok(response) => response,
                Err(e) => {
                    self.output
                        .error(&format!("{}: {}", self.failure_label(), e));
                    return 1;
                }
            };

            // ── 2. Parse, with one coercion attempt ─────────────────────────
            let plan = self.parse_or_coerce(&current_prompt, &response).await;
            self.output.muted(&format!(
                "provider={} model={}",
                self.client.name(),
                self.client.model()
            ));

            // ── 3. Preview, approve, execute ────────────────────────────────
            let Some(plan) = plan else {
                self.show_unstructured(&response);
                return 0;
            };
            if plan.is_empty() {
                self.output.warn("No operations suggested.");
                self.output
                    .line("Try a more specific prompt or request a concrete file/folder change.");
                return 0;
            }

            let result = self.apply_plan_with_approval(&plan);
            match result.next_prompt {
                Some(next) if !next.trim().is_empty() => {
                    tracing::debug!("Continuing conversation with follow-up prompt");
                    current_prompt = next.trim().to_string();
                }
                _ => return result.exit_code,
            }
        }
    }

    /// Preview `plan`, ask for approval, and apply it if approved.
    pub fn apply_plan_with_approval(&mut self, plan: &Plan) -> ApplyResult {
        if plan.is_empty() {
            self.output.warn("No operations suggested.");
            return ApplyResult::done(0);
        }

        self.output.header("Proposed operations");
        render_summary(plan, self.output.as_ref());
        self.output.line("");
        self.output.header("Proposed tree");
        render_proposed_tree(plan, self.output.as_ref());

        match self.approvals.request_decision("Apply these operations") {
            ApplyDecision::Decline {
                next_prompt: Some(next),
            } => ApplyResult::follow_up(next),
            ApplyDecision::Decline { next_prompt: None } => {
                self.output
                    .warn("Plan was not approved. No changes were made.");
                ApplyResult::done(0)
            }
            ApplyDecision::Approve => {
                self.output.header("Applying operations");
                let report = self.executor.apply(plan, &mut self.approvals);
                if !report.failures.is_empty() {
                    tracing::warn!("{} operation(s) failed", report.failures.len());
                }
                ApplyResult::done(report.exit_code())
            }
        }
    }

    async fn parse_or_coerce(&self, user_prompt: &str, response: &str) -> Option<Plan> {
        let first_error = match parse_plan(response) {
            Ok(plan) => return Some(plan),
            Err(e) => e,
        };
        tracing::debug!("Response is not a plan ({}), asking for a rewrite", first_error);

        let coercion = build_plan_coercion_prompt(user_prompt, response);
        match self
            .ask(
                &coercion,
                "AI is restructuring response as plan",
                "Plan conversion ready",
            )
            .await
        {
            Ok(coerced) => match parse_plan(&coerced) {
                Ok(plan) => Some(plan),
                Err(e) => {
                    tracing::debug!("Coerced response still not a plan: {}", e);
                    None
                }
            },
            Err(e) => {
                tracing::warn!("Plan coercion request failed: {}", e);
                None
            }
        }
    }

    /// One model call with the spinner running; Ctrl-C wins over the call.
    async fn ask(
        &self,
        prompt: &str,
        thinking: &str,
        ready: &str,
    ) -> Result<String, TransportError> {
        let indicator =
            ThinkingIndicator::start_with(thinking, Arc::clone(&self.output), self.draw_spinner);

        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(TransportError::Cancelled),
            response = self.client.prompt(prompt) => response,
        };

        indicator
            .stop(if result.is_ok() { ready } else { "" })
            .await;
        result
    }

    fn show_unstructured(&self, response: &str) {
        if self.mode != PromptMode::Dynamic {
            self.output.warn(&format!(
                "Could not parse structured {} plan; model response:",
                self.mode.as_str()
            ));
        }
        self.output.line(response);
    }

    fn failure_label(&self) -> &'static str {
        match self.mode {
            PromptMode::Create => "create failed",
            PromptMode::Rename => "rename failed",
            PromptMode::Dynamic => "model request failed",
        }
    }
}
