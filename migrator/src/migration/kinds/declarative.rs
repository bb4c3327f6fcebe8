//! Kinds described entirely by request templates.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use super::template::{ItemsSelector, RequestTemplate, TemplateVars};
use super::{ResourceKind, TransferScope};
use crate::migration::paginator::Cursor;
use crate::migration::types::{ItemOutcome, KindTag, ResourceRef, TransferContext, TransferOutcome};
use crate::services::client::Transport;
use crate::services::errors::{MigrationError, MigrationResult};

/// Tags of this form record who a resource was inherited from
pub const PROVENANCE_PREFIX: &str = "From ";

#[derive(Debug, Clone)]
pub enum TransferPlan {
    /// One run of the steps per resource
    PerItem(Vec<TransferStep>),
    /// One run of the steps per chunk of ids, success or failure shared by the chunk
    Bulk(Vec<TransferStep>),
    /// Listed and audited, never mutated
    Unsupported { note: &'static str },
}

#[derive(Debug, Clone)]
pub enum TransferStep {
    Call(RequestTemplate),
    /// Remove the source principal from an owner set. Skipped when the new
    /// owner is the source, which would otherwise leave the resource ownerless.
    RevokePrevious(RequestTemplate),
    /// Swap any provenance tag for `From <source display name>`
    ReplaceTag {
        read: RequestTemplate,
        /// JSON pointer to the tag array in the read response
        tags_pointer: &'static str,
        /// Receives the new tag list as `{tags}`
        write: RequestTemplate,
    },
}

/// Items in `state` are reported with `note` and left alone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipRule {
    pub state: &'static str,
    pub note: &'static str,
}

#[derive(Debug, Clone)]
pub struct DeclarativeKind {
    tag: KindTag,
    page_size: usize,
    scope: TransferScope,
    list: RequestTemplate,
    selector: ItemsSelector,
    plan: TransferPlan,
    skip: Option<SkipRule>,
}

impl DeclarativeKind {
    pub fn new(
        tag: KindTag,
        page_size: usize,
        list: RequestTemplate,
        selector: ItemsSelector,
        plan: TransferPlan,
    ) -> Self {
        Self {
            tag,
            page_size: page_size.max(1),
            scope: TransferScope::PerPage,
            list,
            selector,
            plan,
            skip: None,
        }
    }

    pub fn full_result_set(mut self) -> Self {
        self.scope = TransferScope::FullResultSet;
        self
    }

    pub fn with_skip_rule(mut self, state: &'static str, note: &'static str) -> Self {
        self.skip = Some(SkipRule { state, note });
        self
    }

    pub fn plan(&self) -> &TransferPlan {
        &self.plan
    }

    pub fn skip_rule(&self) -> Option<&SkipRule> {
        self.skip.as_ref()
    }

    /// The listing template followed by every step template
    pub fn templates(&self) -> Vec<&RequestTemplate> {
        let mut templates = vec![&self.list];
        let steps: &[TransferStep] = match &self.plan {
            TransferPlan::PerItem(steps) | TransferPlan::Bulk(steps) => steps,
            TransferPlan::Unsupported { .. } => &[],
        };
        for step in steps {
            match step {
                TransferStep::Call(template) | TransferStep::RevokePrevious(template) => {
                    templates.push(template)
                }
                TransferStep::ReplaceTag { read, write, .. } => {
                    templates.push(read);
                    templates.push(write);
                }
            }
        }
        templates
    }

    fn skipped(&self, item: &ResourceRef) -> Option<TransferOutcome> {
        let rule = self.skip.as_ref()?;
        (item.state.as_deref() == Some(rule.state)).then(|| TransferOutcome::not_transferred(rule.note))
    }

    /// Run `steps` in order, stopping at the first failure
    async fn run_steps(
        &self,
        transport: &dyn Transport,
        ctx: &TransferContext,
        steps: &[TransferStep],
        vars: &TemplateVars,
        subject: &str,
    ) -> TransferOutcome {
        let total = steps.len();
        for (index, step) in steps.iter().enumerate() {
            if let Err(err) = step.run(self.tag, transport, ctx, vars).await {
                warn!(
                    kind = %self.tag,
                    subject,
                    step = index + 1,
                    total,
                    error = %err,
                    "Transfer step failed"
                );
                return TransferOutcome::failed(format!(
                    "step {}/{} ({}) failed: {}",
                    index + 1,
                    total,
                    step.describe(),
                    err
                ));
            }
        }
        TransferOutcome::transferred()
    }

    async fn transfer_each(
        &self,
        transport: &dyn Transport,
        ctx: &TransferContext,
        steps: &[TransferStep],
        items: Vec<ResourceRef>,
        max_concurrent: usize,
    ) -> Vec<ItemOutcome> {
        stream::iter(items)
            .map(|item| async move {
                let outcome = match self.skipped(&item) {
                    Some(outcome) => outcome,
                    None => {
                        let vars = TemplateVars::for_item(ctx, &item);
                        self.run_steps(transport, ctx, steps, &vars, &item.id).await
                    }
                };
                ItemOutcome::new(item, outcome)
            })
            .buffered(max_concurrent.max(1))
            .collect()
            .await
    }

    async fn transfer_bulk(
        &self,
        transport: &dyn Transport,
        ctx: &TransferContext,
        steps: &[TransferStep],
        items: Vec<ResourceRef>,
    ) -> Vec<ItemOutcome> {
        let mut outcomes: Vec<Option<TransferOutcome>> =
            items.iter().map(|item| self.skipped(item)).collect();
        let eligible: Vec<usize> = (0..items.len()).filter(|&i| outcomes[i].is_none()).collect();

        for chunk in eligible.chunks(self.page_size) {
            let batch: Vec<&ResourceRef> = chunk.iter().map(|&i| &items[i]).collect();
            let vars = TemplateVars::for_batch(ctx, &batch);
            let subject = format!("{} ids", batch.len());
            let outcome = self.run_steps(transport, ctx, steps, &vars, &subject).await;
            for &i in chunk {
                outcomes[i] = Some(outcome.clone());
            }
        }

        items
            .into_iter()
            .zip(outcomes)
            .map(|(item, outcome)| {
                let outcome =
                    outcome.unwrap_or_else(|| TransferOutcome::failed("not attempted"));
                ItemOutcome::new(item, outcome)
            })
            .collect()
    }
}

impl TransferStep {
    fn describe(&self) -> String {
        match self {
            TransferStep::Call(template) | TransferStep::RevokePrevious(template) => {
                template.to_string()
            }
            TransferStep::ReplaceTag { write, .. } => write.to_string(),
        }
    }

    async fn run(
        &self,
        kind: KindTag,
        transport: &dyn Transport,
        ctx: &TransferContext,
        vars: &TemplateVars,
    ) -> MigrationResult<()> {
        match self {
            TransferStep::Call(template) => {
                template.send(transport, vars).await?;
            }
            TransferStep::RevokePrevious(template) => {
                if ctx.is_self_transfer() {
                    debug!(kind = %kind, "New owner is the source; keeping it in the owner set");
                } else {
                    template.send(transport, vars).await?;
                }
            }
            TransferStep::ReplaceTag {
                read,
                tags_pointer,
                write,
            } => {
                let response = read.send(transport, vars).await?;
                let current = tag_list(kind, &response, tags_pointer)?;
                let provenance = format!("{}{}", PROVENANCE_PREFIX, ctx.source_display_name);

                let stale = current
                    .iter()
                    .any(|tag| tag.starts_with(PROVENANCE_PREFIX) && *tag != provenance);
                if !stale && current.contains(&provenance) {
                    return Ok(());
                }

                let mut tags: Vec<String> = current
                    .into_iter()
                    .filter(|tag| !tag.starts_with(PROVENANCE_PREFIX))
                    .collect();
                tags.push(provenance);

                let vars = vars.clone().with("tags", json!(tags));
                write.send(transport, &vars).await?;
            }
        }
        Ok(())
    }
}

fn tag_list(kind: KindTag, response: &Value, pointer: &str) -> MigrationResult<Vec<String>> {
    match response.pointer(pointer) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(tags)) => Ok(tags
            .iter()
            .filter_map(|tag| tag.as_str().map(str::to_string))
            .collect()),
        Some(_) => Err(MigrationError::InvalidResponse {
            kind,
            message: format!("expected a tag array at '{}'", pointer),
        }),
    }
}

#[async_trait]
impl ResourceKind for DeclarativeKind {
    fn tag(&self) -> KindTag {
        self.tag
    }

    fn page_size(&self) -> usize {
        self.page_size
    }

    fn scope(&self) -> TransferScope {
        self.scope
    }

    fn unsupported_note(&self) -> Option<&str> {
        match &self.plan {
            TransferPlan::Unsupported { note } => Some(*note),
            _ => None,
        }
    }

    #[instrument(skip(self, transport, ctx), fields(kind = %self.tag), err)]
    async fn list_page(
        &self,
        transport: &dyn Transport,
        ctx: &TransferContext,
        cursor: Cursor,
    ) -> MigrationResult<Vec<ResourceRef>> {
        let vars = TemplateVars::for_listing(ctx, cursor);
        let request = self.list.render(&vars)?;
        let response = transport
            .request(request.method, &request.path, request.body.as_ref())
            .await
            .map_err(|source| MigrationError::Enumeration {
                kind: self.tag,
                offset: cursor.offset,
                source,
            })?;

        let items = self.selector.select(self.tag, &response)?;
        debug!(offset = cursor.offset, count = items.len(), "Listed page");
        Ok(items)
    }

    async fn transfer(
        &self,
        transport: &dyn Transport,
        ctx: &TransferContext,
        items: Vec<ResourceRef>,
        max_concurrent: usize,
    ) -> Vec<ItemOutcome> {
        match &self.plan {
            TransferPlan::PerItem(steps) => {
                self.transfer_each(transport, ctx, steps, items, max_concurrent)
                    .await
            }
            TransferPlan::Bulk(steps) => self.transfer_bulk(transport, ctx, steps, items).await,
            TransferPlan::Unsupported { note } => items
                .into_iter()
                .map(|item| ItemOutcome::new(item, TransferOutcome::not_transferred(*note)))
                .collect(),
        }
    }
}

#[cfg(test)]
#[path = "declarative_test.rs"]
mod declarative_test;
