use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub order: usize,
    pub name: String,
    /// Text drawn in the actor boxes; the name unless a participant alias gave one.
    pub label: String,
    pub created_by_signal: bool,
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LineType {
    Request,
    Response,
}

impl LineType {
    pub fn from_token(token: &str) -> Self {
        if token == "--" {
            Self::Response
        } else {
            Self::Request
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SignalKind {
    Simple,
    ActorCreation,
    ActorDeletion,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    pub id: u32,
    pub actor_a: String,
    /// Absent for `ActorDeletion`.
    pub actor_b: Option<String>,
    pub line_type: LineType,
    pub kind: SignalKind,
    pub message: String,
}

impl Signal {
    pub fn simple(
        id: u32,
        actor_a: &str,
        actor_b: &str,
        line_type: LineType,
        kind: SignalKind,
        message: &str,
    ) -> Self {
        Self {
            id,
            actor_a: actor_a.to_string(),
            actor_b: Some(actor_b.to_string()),
            line_type,
            kind,
            message: message.to_string(),
        }
    }

    pub fn destroy(id: u32, actor: &str) -> Self {
        Self {
            id,
            actor_a: actor.to_string(),
            actor_b: None,
            line_type: LineType::Request,
            kind: SignalKind::ActorDeletion,
            message: String::new(),
        }
    }

    pub fn to_same_actor(&self) -> bool {
        self.actor_b.as_deref() == Some(self.actor_a.as_str())
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.actor_b.as_deref().unwrap_or("");
        match (self.kind, self.line_type) {
            (SignalKind::ActorCreation, _) => {
                write!(f, "Signal #{}: actor '{}' creates '{}'", self.id, self.actor_a, b)
            }
            (SignalKind::ActorDeletion, _) => {
                write!(f, "Signal #{}: actor '{}' destroyed", self.id, self.actor_a)
            }
            (SignalKind::Simple, _) if self.to_same_actor() => {
                write!(f, "Self-signal #{}: '{}'", self.id, self.actor_a)
            }
            (SignalKind::Simple, LineType::Request) => {
                write!(f, "Request #{} from '{}' to '{}'", self.id, self.actor_a, b)
            }
            (SignalKind::Simple, LineType::Response) => {
                write!(f, "Response #{} from '{}' to '{}'", self.id, self.actor_a, b)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BlockKind {
    Loop,
    Opt,
    Alt,
    Par,
    Critical,
    Break,
}

impl BlockKind {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "loop" => Some(Self::Loop),
            "opt" => Some(Self::Opt),
            "alt" => Some(Self::Alt),
            "par" => Some(Self::Par),
            "critical" => Some(Self::Critical),
            "break" => Some(Self::Break),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Loop => "loop",
            Self::Opt => "opt",
            Self::Alt => "alt",
            Self::Par => "par",
            Self::Critical => "critical",
            Self::Break => "break",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockData {
    /// Nesting depth inside its stack, 0 for the outermost block.
    pub level: usize,
    pub kind: BlockKind,
    pub label: String,
    /// Index of the enclosing block in the same stack.
    pub parent: Option<usize>,
    /// Ids of the signals declared directly inside this block.
    pub signal_ids: Vec<u32>,
}

/// Blocks produced by one outermost open/close cycle, in opening order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BlockStack {
    pub blocks: Vec<BlockData>,
}

impl BlockStack {
    /// `index` itself and every block opened inside it.
    pub fn subtree(&self, index: usize) -> Vec<usize> {
        (index..self.blocks.len())
            .filter(|&candidate| self.is_within(candidate, index))
            .collect()
    }

    /// Signal ids covered by block `index`, its nested blocks included, sorted.
    pub fn covered_signal_ids(&self, index: usize) -> Vec<u32> {
        let mut ids: Vec<u32> = self
            .subtree(index)
            .into_iter()
            .flat_map(|idx| self.blocks[idx].signal_ids.iter().copied())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    pub fn last_signal_id(&self) -> Option<u32> {
        self.blocks
            .iter()
            .flat_map(|block| block.signal_ids.iter().copied())
            .max()
    }

    fn is_within(&self, candidate: usize, ancestor: usize) -> bool {
        let mut cursor = Some(candidate);
        while let Some(idx) = cursor {
            if idx == ancestor {
                return true;
            }
            cursor = self.blocks.get(idx).and_then(|block| block.parent);
        }
        false
    }
}

/// Parse result handed to the layout engine.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiagramModel {
    pub title: Option<String>,
    pub actors: BTreeMap<String, Actor>,
    pub signals: Vec<Signal>,
    pub block_stacks: Vec<BlockStack>,
    /// Statements dropped while parsing, already logged.
    pub warnings: Vec<String>,
}

impl DiagramModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the actor named `name`, creating it with the next order if needed.
    pub fn get_or_create(&mut self, name: &str, created_by_signal: bool) -> &Actor {
        let order = self.actors.len();
        self.actors.entry(name.to_string()).or_insert_with(|| Actor {
            order,
            name: name.to_string(),
            label: name.to_string(),
            created_by_signal,
        })
    }

    /// Actors in declaration order.
    pub fn actors_in_order(&self) -> Vec<&Actor> {
        let mut actors: Vec<&Actor> = self.actors.values().collect();
        actors.sort_by_key(|actor| actor.order);
        actors
    }

    pub fn signal(&self, id: u32) -> Option<&Signal> {
        self.signals.iter().find(|signal| signal.id == id)
    }

    pub fn has_title(&self) -> bool {
        self.title
            .as_deref()
            .is_some_and(|title| !title.trim().is_empty())
    }
}
