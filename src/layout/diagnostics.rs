use serde::Serialize;
use tracing::warn;

/// Non-fatal layout problem. The offending signal or block is skipped and
/// the rest of the diagram is still drawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Diagnostic {
    #[error("signal #{signal_id}: actor '{actor}' cannot be resolved, signal skipped")]
    UnresolvedActor { signal_id: u32, actor: String },

    #[error("signal #{signal_id}: actor '{actor}' is already created by a signal, creation skipped")]
    DuplicateActorCreation { signal_id: u32, actor: String },

    #[error("signal #{signal_id}: cannot destroy unknown actor '{actor}'")]
    DestroyUnresolved { signal_id: u32, actor: String },

    #[error("signal #{signal_id}: self-signal target '{actor}' cannot be resolved")]
    SelfSignalUnresolved { signal_id: u32, actor: String },

    #[error("block '{label}' references missing signal #{signal_id}")]
    BlockSignalMissing { label: String, signal_id: u32 },

    #[error("block '{label}' contains no drawable signal, not drawn")]
    EmptyBlock { label: String },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn push(&mut self, diagnostic: Diagnostic) {
        warn!("{diagnostic}");
        self.items.push(diagnostic);
    }

    pub fn items(&self) -> &[Diagnostic] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}
