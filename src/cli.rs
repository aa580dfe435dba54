use crate::config::{load_config, Config};
use crate::diagram::SequenceDiagram;
use crate::layout_dump::write_layout_dump;
use crate::render::write_output_svg;
use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{info, Level};

#[derive(Parser, Debug)]
#[command(name = "seqd", version, about = "Sequence diagram renderer in Rust")]
pub struct Args {
    /// Input file (.seq or .md) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON file (theme, themeVariables, dimensions)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Id given to the root <svg> element
    #[arg(long = "container-id", default_value = "sequence-diagram")]
    pub container_id: String,

    /// Write the computed layout as JSON
    #[arg(long = "dump-layout")]
    pub dump_layout: Option<PathBuf>,

    /// Log actors, destroyed actors and signals after drawing
    #[arg(long = "debug")]
    pub debug: bool,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Default width for PNG rasterisation
    #[arg(short = 'w', long = "width", default_value_t = 1200.0)]
    pub width: f32,

    /// Default height for PNG rasterisation
    #[arg(short = 'H', long = "height", default_value_t = 800.0)]
    pub height: f32,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Svg => "svg",
            OutputFormat::Png => "png",
        }
    }
}

pub fn run() -> Result<()> {
    let mut args = Args::parse();
    init_logging(args.verbose);

    let mut base_config = load_config(args.config.as_deref())
        .with_context(|| format!("loading config {:?}", args.config))?;
    base_config.render.width = args.width;
    base_config.render.height = args.height;

    let (input, is_markdown) = read_input(args.input.as_deref())?;
    let sources = if is_markdown {
        extract_sequence_blocks(&input)
    } else {
        vec![input]
    };
    if sources.is_empty() {
        return Err(anyhow::anyhow!("No sequence diagrams found in input"));
    }

    let outputs = if sources.len() == 1 {
        vec![args.output.take()]
    } else {
        resolve_multi_outputs(args.output.as_deref(), args.output_format, sources.len())?
            .into_iter()
            .map(Some)
            .collect()
    };
    let dumps = match &args.dump_layout {
        Some(path) if sources.len() > 1 => numbered_paths(path, "json", sources.len())
            .into_iter()
            .map(Some)
            .collect(),
        other => vec![other.clone(); sources.len()],
    };

    for ((source, output), dump) in sources.iter().zip(outputs).zip(dumps) {
        render_one(&args, &base_config, source, output.as_deref(), dump.as_deref())?;
    }
    Ok(())
}

fn render_one(
    args: &Args,
    config: &Config,
    source: &str,
    output: Option<&Path>,
    dump: Option<&Path>,
) -> Result<()> {
    let mut diagram = SequenceDiagram::new(config.clone());
    diagram.load(source)?;
    let svg = diagram.draw(&args.container_id)?;
    if args.debug {
        diagram.debug();
    }

    if let (Some(path), Some(layout), Some(model)) = (dump, diagram.layout(), diagram.model()) {
        write_layout_dump(path, layout, model)?;
        info!(path = %path.display(), "layout dump written");
    }

    match args.output_format {
        OutputFormat::Svg => write_output_svg(&svg, output)?,
        OutputFormat::Png => write_png(&svg, output, &diagram.effective_config())?,
    }
    Ok(())
}

#[cfg(feature = "png")]
fn write_png(svg: &str, output: Option<&Path>, config: &Config) -> Result<()> {
    let output = output.ok_or_else(|| anyhow::anyhow!("Output path required for png output"))?;
    crate::render::write_output_png(svg, output, &config.render, &config.theme)?;
    Ok(())
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _output: Option<&Path>, _config: &Config) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .try_init();
}

fn read_input(path: Option<&Path>) -> Result<(String, bool)> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let is_md = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| matches!(ext, "md" | "markdown"));
        return Ok((content, is_md));
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok((buf, false))
}

/// Collects the bodies of ```sequence (or ~~~sequence) fenced blocks.
fn extract_sequence_blocks(input: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut fence: Option<&str> = None;

    for line in input.lines() {
        let trimmed = line.trim();
        match fence {
            None => fence = detect_sequence_fence(trimmed),
            Some(open) if is_fence_end(trimmed, open) => {
                blocks.push(current.join("\n"));
                current.clear();
                fence = None;
            }
            Some(_) => current.push(line),
        }
    }

    blocks
}

fn detect_sequence_fence(line: &str) -> Option<&'static str> {
    ["```", "~~~"].into_iter().find(|&fence| {
        line.strip_prefix(fence)
            .map(|rest| rest.trim_start_matches(['`', '~']).trim())
            .is_some_and(|info| info.starts_with("sequence"))
    })
}

fn is_fence_end(line: &str, fence: &str) -> bool {
    line.strip_prefix(fence)
        .is_some_and(|rest| rest.trim().is_empty())
}

fn resolve_multi_outputs(output: Option<&Path>, format: OutputFormat, count: usize) -> Result<Vec<PathBuf>> {
    let base = output.ok_or_else(|| anyhow::anyhow!("Output path required for markdown input"))?;
    Ok(numbered_paths(base, format.extension(), count))
}

/// `out.svg` becomes `out-1.svg`, `out-2.svg`, ...; a directory gets
/// `diagram-N.ext` files inside it.
fn numbered_paths(base: &Path, ext: &str, count: usize) -> Vec<PathBuf> {
    if base.is_dir() {
        return (1..=count)
            .map(|idx| base.join(format!("diagram-{idx}.{ext}")))
            .collect();
    }
    let stem = base.file_stem().and_then(|s| s.to_str()).unwrap_or("diagram");
    let parent = base.parent().unwrap_or_else(|| Path::new("."));
    (1..=count)
        .map(|idx| parent.join(format!("{stem}-{idx}.{ext}")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_sequence_blocks() {
        let input = r#"
text
``` sequence
A->B: hi
```
more
~~~sequenceDiagram
title: second
B-->A: back
~~~
```rust
fn main() {}
```
"#;
        let blocks = extract_sequence_blocks(input);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0], "A->B: hi");
        assert!(blocks[1].starts_with("title: second"));
    }

    #[test]
    fn fence_end_must_be_bare() {
        assert!(is_fence_end("```", "```"));
        assert!(is_fence_end("```  ", "```"));
        assert!(!is_fence_end("```sequence", "```"));
        assert!(!is_fence_end("~~~", "```"));
    }

    #[test]
    fn numbered_outputs_keep_stem() {
        let paths = numbered_paths(Path::new("out/diagram.svg"), "svg", 2);
        assert_eq!(
            paths,
            vec![PathBuf::from("out/diagram-1.svg"), PathBuf::from("out/diagram-2.svg")]
        );
    }

    #[test]
    fn markdown_requires_output() {
        assert!(resolve_multi_outputs(None, OutputFormat::Png, 2).is_err());
    }
}
