use crate::error::{Error, Result};
use crate::ir::{BlockData, BlockKind, BlockStack, DiagramModel, LineType, Signal, SignalKind};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

static INIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^%%\{\s*init\s*:\s*(\{.*\})\s*\}%%").unwrap());
static TITLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^title(?:\s*:|\s)\s*(.*)$").unwrap());
static PARTICIPANT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:participant|actor)\s+(.+)$").unwrap());
static DESTROY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^destroy\s+(.+)$").unwrap());
static SIGNAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<a>[^:>]+?)\s*(?P<line>--?)(?P<arrow>>>|>\*|>)\s*(?P<b>[^:]+?)\s*(?::(?P<msg>.*))?$",
    )
    .unwrap()
});

#[derive(Debug, Default)]
pub struct ParseOutput {
    pub model: DiagramModel,
    pub init_config: Option<serde_json::Value>,
}

/// Open/close bookkeeping for the block stack being built.
#[derive(Default)]
struct BlockBuilder {
    stack: BlockStack,
    open: Vec<usize>,
}

impl BlockBuilder {
    fn start(&mut self, kind: BlockKind, label: String) {
        let index = self.stack.blocks.len();
        self.stack.blocks.push(BlockData {
            level: self.open.len(),
            kind,
            label,
            parent: self.open.last().copied(),
            signal_ids: Vec::new(),
        });
        self.open.push(index);
    }

    /// Closes the innermost block. Returns the finished stack once the
    /// outermost block closes, or `Err(())` when nothing is open.
    fn end(&mut self) -> std::result::Result<Option<BlockStack>, ()> {
        self.open.pop().ok_or(())?;
        if self.open.is_empty() {
            return Ok(Some(std::mem::take(&mut self.stack)));
        }
        Ok(None)
    }

    fn attach(&mut self, signal_id: u32) {
        if let Some(&index) = self.open.last() {
            self.stack.blocks[index].signal_ids.push(signal_id);
        }
    }

    fn is_open(&self) -> bool {
        !self.open.is_empty()
    }
}

pub fn parse_sequence(input: &str) -> Result<ParseOutput> {
    let (lines, init_config) = preprocess_input(input);
    let mut model = DiagramModel::new();
    let mut blocks = BlockBuilder::default();
    let mut next_id: u32 = 0;

    for (line_no, line) in lines {
        let lower = line.to_ascii_lowercase();
        if lower == "sequencediagram" {
            continue;
        }

        if let Some(caps) = TITLE_RE.captures(&line) {
            let title = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
            debug!(title, "parsed title");
            model.title = Some(title.to_string());
            continue;
        }

        if lower.starts_with("note ") {
            debug!(line = line_no, "notes are not rendered; skipping");
            continue;
        }

        if let Some(caps) = PARTICIPANT_RE.captures(&line) {
            let (name, label) = parse_participant(caps.get(1).map_or("", |m| m.as_str()));
            if name.is_empty() {
                return Err(Error::Parse {
                    line: line_no,
                    message: "participant without a name".to_string(),
                });
            }
            model.get_or_create(&name, false);
            if let (Some(label), Some(actor)) = (label, model.actors.get_mut(&name)) {
                actor.label = label;
            }
            continue;
        }

        if let Some(caps) = DESTROY_RE.captures(&line) {
            let name = strip_quotes(caps.get(1).map_or("", |m| m.as_str()).trim());
            let created_by_signal = model.actors.get(&name).map(|actor| actor.created_by_signal);
            match created_by_signal {
                Some(true) => {
                    let signal = Signal::destroy(next_id, &name);
                    debug!(%signal, "parsed signal");
                    blocks.attach(next_id);
                    model.signals.push(signal);
                    next_id += 1;
                }
                Some(false) => push_warning(
                    &mut model,
                    format!(
                        "line {line_no}: unable to destroy actor '{name}' because it has not been created by a signal"
                    ),
                ),
                None => push_warning(
                    &mut model,
                    format!("line {line_no}: unable to destroy actor '{name}' because it does not exist"),
                ),
            }
            continue;
        }

        if lower == "end" {
            match blocks.end() {
                Ok(Some(stack)) => model.block_stacks.push(stack),
                Ok(None) => {}
                Err(()) => push_warning(
                    &mut model,
                    format!("line {line_no}: 'end' without an open block"),
                ),
            }
            continue;
        }

        if let Some((kind, label)) = parse_block_start(&line) {
            blocks.start(kind, label);
            continue;
        }

        if let Some(caps) = SIGNAL_RE.captures(&line) {
            let a = strip_quotes(caps["a"].trim());
            let b = strip_quotes(caps["b"].trim());
            let message = caps.name("msg").map_or("", |m| m.as_str().trim());
            let line_type = LineType::from_token(&caps["line"]);
            let kind = if &caps["arrow"] == ">*" {
                SignalKind::ActorCreation
            } else {
                SignalKind::Simple
            };
            model.get_or_create(&a, false);
            model.get_or_create(&b, kind == SignalKind::ActorCreation);
            let signal = Signal::simple(next_id, &a, &b, line_type, kind, message);
            debug!(%signal, "parsed signal");
            blocks.attach(next_id);
            model.signals.push(signal);
            next_id += 1;
            continue;
        }

        return Err(Error::Parse {
            line: line_no,
            message: format!("unrecognized statement '{line}'"),
        });
    }

    if blocks.is_open() {
        push_warning(
            &mut model,
            "block left open at end of input; closing it".to_string(),
        );
        model.block_stacks.push(blocks.stack);
    }

    Ok(ParseOutput { model, init_config })
}

fn push_warning(model: &mut DiagramModel, message: String) {
    warn!("{message}");
    model.warnings.push(message);
}

/// Trimmed, comment-free statements with their 1-based line numbers.
fn preprocess_input(input: &str) -> (Vec<(usize, String)>, Option<serde_json::Value>) {
    let mut init_config: Option<serde_json::Value> = None;
    let mut lines = Vec::new();

    for (idx, raw_line) in input.lines().enumerate() {
        let trimmed_line = raw_line.trim();
        if trimmed_line.is_empty() {
            continue;
        }
        if let Some(caps) = INIT_RE.captures(trimmed_line) {
            if let Some(json_str) = caps.get(1).map(|m| m.as_str()) {
                if let Ok(value) = serde_json::from_str::<serde_json::Value>(json_str) {
                    init_config = Some(value);
                } else if let Ok(value) = json5::from_str::<serde_json::Value>(json_str) {
                    init_config = Some(value);
                } else {
                    warn!(line = idx + 1, "ignoring unreadable init directive");
                }
            }
            continue;
        }
        if trimmed_line.starts_with("%%") {
            continue;
        }
        let without_comment = strip_trailing_comment(trimmed_line);
        if without_comment.is_empty() {
            continue;
        }
        lines.push((idx + 1, without_comment));
    }

    (lines, init_config)
}

fn parse_block_start(line: &str) -> Option<(BlockKind, String)> {
    let (keyword, rest) = match line.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest.trim()),
        None => (line, ""),
    };
    let kind = BlockKind::from_keyword(&keyword.to_ascii_lowercase())?;
    Some((kind, rest.to_string()))
}

/// `"Long name" as X` yields `("X", Some("Long name"))`.
fn parse_participant(rest: &str) -> (String, Option<String>) {
    let rest = rest.trim();
    let lower = rest.to_ascii_lowercase();
    if let Some(as_idx) = lower.find(" as ") {
        let label = strip_quotes(rest[..as_idx].trim());
        let name = strip_quotes(rest[as_idx + 4..].trim());
        return (name, Some(label));
    }
    (strip_quotes(rest), None)
}

fn strip_quotes(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.len() >= 2
        && ((trimmed.starts_with('"') && trimmed.ends_with('"'))
            || (trimmed.starts_with('\'') && trimmed.ends_with('\'')))
    {
        return trimmed[1..trimmed.len() - 1].to_string();
    }
    trimmed.to_string()
}

fn strip_trailing_comment(line: &str) -> String {
    let mut quote: Option<char> = None;
    let mut chars = line.chars().peekable();
    let mut out = String::new();
    while let Some(ch) = chars.next() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            out.push(ch);
            continue;
        }
        if ch == '"' || ch == '\'' {
            quote = Some(ch);
            out.push(ch);
            continue;
        }
        if ch == '%'
            && let Some('%') = chars.peek().copied()
        {
            break;
        }
        out.push(ch);
    }
    out.trim().to_string()
}
