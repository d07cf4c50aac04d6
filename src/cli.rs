use anyhow::{Context, Result, anyhow, bail};
use clap::{ArgAction, Args, Parser, ValueEnum};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use conceptmap::{ConceptMap, LayoutConfig, MindMapConfig, RootFallback};

const LOG_ENV: &str = "CONCEPTMAP_LOG";

#[derive(Debug, Clone, PartialEq, Eq)]
enum InputSource {
    Stdin,
    File(PathBuf),
}

#[derive(Debug, Clone)]
enum OutputDestination {
    Stdout,
    File(PathBuf),
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum FallbackArg {
    None,
    FirstNode,
}

impl From<FallbackArg> for RootFallback {
    fn from(value: FallbackArg) -> Self {
        match value {
            FallbackArg::None => RootFallback::None,
            FallbackArg::FirstNode => RootFallback::FirstNode,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputKind {
    Svg,
    Json,
}

impl OutputKind {
    fn extension(self) -> &'static str {
        match self {
            OutputKind::Svg => "svg",
            OutputKind::Json => "json",
        }
    }
}

/// Options shared by `render` and `layout`.
#[derive(Debug, Args)]
struct EngineArgs {
    /// Path to the concept map JSON payload. Use '-' to read from stdin.
    #[arg(short = 'i', long = "input")]
    input: Option<String>,

    /// Path to the output file. Use '-' to write to stdout.
    #[arg(short = 'o', long = "output")]
    output: Option<String>,

    /// Lay the map out as a left-to-right mind map with branch colors.
    #[arg(long = "mind-map", action = ArgAction::SetTrue)]
    mind_map: bool,

    /// JSON file with layout options (camelCase keys, e.g. areaWidth).
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Override the canvas width.
    #[arg(long = "area-width")]
    area_width: Option<f32>,

    /// Override the canvas height.
    #[arg(long = "area-height")]
    area_height: Option<f32>,

    /// Place every node once, at its first level, instead of once per incoming path.
    #[arg(long = "dedupe", action = ArgAction::SetTrue)]
    dedupe: bool,

    /// What to do when no node is free of incoming edges.
    #[arg(long = "root-fallback", value_enum)]
    root_fallback: Option<FallbackArg>,

    /// Suppress informational output.
    #[arg(short = 'q', long = "quiet", action = ArgAction::SetTrue)]
    quiet: bool,

    /// Log layout decisions to stderr.
    #[arg(short = 'v', long = "verbose", action = ArgAction::SetTrue)]
    verbose: bool,
}

#[derive(Debug, Parser)]
#[command(
    name = "conceptmap",
    about = "Lay out generated concept maps and render them to SVG."
)]
pub struct RenderArgs {
    #[command(flatten)]
    engine: EngineArgs,

    /// Background color for the rendered map.
    #[arg(short = 'b', long = "background-color", default_value = "white")]
    background_color: String,
}

#[derive(Debug, Parser)]
#[command(
    name = "conceptmap layout",
    about = "Compute node positions and edge curves and write them as JSON."
)]
pub struct LayoutArgs {
    #[command(flatten)]
    engine: EngineArgs,
}

pub fn dispatch() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(|s| s.as_str()) {
        Some("layout") => {
            let layout_args = LayoutArgs::parse_from(
                std::iter::once(args[0].clone()).chain(args.iter().skip(2).cloned()),
            );
            init_tracing(layout_args.engine.verbose);
            run_layout(layout_args)
        }
        Some("render") => {
            let render_args = RenderArgs::parse_from(
                std::iter::once(args[0].clone()).chain(args.iter().skip(2).cloned()),
            );
            init_tracing(render_args.engine.verbose);
            run_render(render_args)
        }
        _ => {
            let render_args = RenderArgs::parse_from(args);
            init_tracing(render_args.engine.verbose);
            run_render(render_args)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .try_init();
}

fn run_render(cli: RenderArgs) -> Result<()> {
    let engine = &cli.engine;
    let input_source = parse_input(engine.input.as_deref())?;
    let output_dest = parse_output(engine.output.as_deref(), &input_source, OutputKind::Svg)?;
    let map = load_map(&input_source)?;

    let svg = if engine.mind_map {
        let config = mind_map_config(engine)?;
        map.mind_map(&config)?.render_svg(&cli.background_color)?
    } else {
        let config = layout_config(engine)?;
        let layout = map.layout(&config)?;
        if layout.is_empty() && !map.is_empty() {
            tracing::warn!("no node could be placed; the output only contains the background");
        }
        layout.render_svg(&cli.background_color)?
    };

    write_output(output_dest, svg.as_bytes(), engine.quiet)
}

fn run_layout(cli: LayoutArgs) -> Result<()> {
    let engine = &cli.engine;
    let input_source = parse_input(engine.input.as_deref())?;
    let output_dest = parse_output(engine.output.as_deref(), &input_source, OutputKind::Json)?;
    let map = load_map(&input_source)?;

    let mut json = if engine.mind_map {
        map.mind_map(&mind_map_config(engine)?)?.to_json()?
    } else {
        map.layout(&layout_config(engine)?)?.to_json()?
    };
    json.push('\n');

    write_output(output_dest, json.as_bytes(), engine.quiet)
}

fn layout_config(engine: &EngineArgs) -> Result<LayoutConfig> {
    let mut config = match &engine.config {
        Some(path) => LayoutConfig::from_path(path)
            .with_context(|| format!("failed to load layout config '{}'", path.display()))?,
        None => LayoutConfig::default(),
    };

    if let Some(width) = engine.area_width {
        config.area_width = width;
    }
    if let Some(height) = engine.area_height {
        config.area_height = height;
    }
    if engine.dedupe {
        config.leveling.allow_multi_parent_duplication = false;
    }
    if let Some(fallback) = engine.root_fallback {
        config.root_fallback = fallback.into();
    }

    config.validate()?;
    Ok(config)
}

fn mind_map_config(engine: &EngineArgs) -> Result<MindMapConfig> {
    if engine.area_width.is_some() || engine.area_height.is_some() || engine.dedupe {
        bail!("--area-width, --area-height and --dedupe only apply to the concept map layout");
    }

    let mut config = match &engine.config {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read '{}'", path.display()))?;
            serde_json::from_str::<MindMapConfig>(&contents)
                .with_context(|| format!("failed to parse mind map config '{}'", path.display()))?
        }
        None => MindMapConfig::default(),
    };

    if let Some(fallback) = engine.root_fallback {
        config.root_fallback = fallback.into();
    }

    config.validate()?;
    Ok(config)
}

fn parse_input(input: Option<&str>) -> Result<InputSource> {
    match input {
        Some("-") => Ok(InputSource::Stdin),
        Some(path_str) => {
            let path = PathBuf::from(path_str);
            if !path.exists() {
                return Err(anyhow!("input file '{path_str}' does not exist"));
            }
            Ok(InputSource::File(path))
        }
        None => Ok(InputSource::Stdin),
    }
}

fn parse_output(
    output: Option<&str>,
    input: &InputSource,
    kind: OutputKind,
) -> Result<OutputDestination> {
    match output {
        Some("-") => Ok(OutputDestination::Stdout),
        Some(path_str) => {
            let path = PathBuf::from(path_str);
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    return Err(anyhow!(
                        "output directory '{}' does not exist",
                        parent.display()
                    ));
                }
            }
            Ok(OutputDestination::File(path))
        }
        None => match input {
            InputSource::File(path) => Ok(OutputDestination::File(default_output_path(path, kind))),
            InputSource::Stdin => Ok(OutputDestination::Stdout),
        },
    }
}

/// `map.json` becomes `map.svg` (or `map.layout.json` for layout output).
fn default_output_path(input: &Path, kind: OutputKind) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("concept-map");
    let name = match kind {
        OutputKind::Svg => format!("{stem}.{}", kind.extension()),
        OutputKind::Json => format!("{stem}.layout.{}", kind.extension()),
    };
    let mut path = input.to_path_buf();
    path.set_file_name(name);
    path
}

fn load_map(source: &InputSource) -> Result<ConceptMap> {
    let payload = match source {
        InputSource::Stdin => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            if buffer.trim().is_empty() {
                bail!("no concept map supplied on stdin");
            }
            buffer
        }
        InputSource::File(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read '{}'", path.display()))?;
            if contents.trim().is_empty() {
                bail!("input file '{}' was empty", path.display());
            }
            contents
        }
    };

    let map = ConceptMap::parse(&payload).context("input is not a concept map payload")?;
    tracing::info!(nodes = map.nodes.len(), edges = map.edges.len(), "loaded concept map");
    Ok(map)
}

fn write_output(dest: OutputDestination, bytes: &[u8], quiet: bool) -> Result<()> {
    match dest {
        OutputDestination::Stdout => {
            let mut stdout = io::stdout();
            stdout.write_all(bytes)?;
            stdout.flush()?;
        }
        OutputDestination::File(path) => {
            fs::write(&path, bytes)
                .with_context(|| format!("failed to write '{}'", path.display()))?;
            if !quiet {
                println!("Generated concept map -> {}", path.display());
            }
        }
    }
    Ok(())
}
