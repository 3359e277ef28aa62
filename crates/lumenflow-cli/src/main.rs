use futures::executor::block_on;
use lumenflow::balance::compute_balance;
use lumenflow::editor::EditorState;
use lumenflow::model;
use lumenflow::raster::{RasterOptions, export_png};
use lumenflow::viewport::Transform;
use lumenflow_render::adapter::LayoutAdapter;
use lumenflow_render::scene::{ChartDimensions, build_scene, layout_graph};
use serde::Serialize;
use std::io::Read;
use std::str::FromStr;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Model(lumenflow::Error),
    Layout(lumenflow::layout::Error),
    Render(lumenflow_render::Error),
    Raster(lumenflow::raster::RasterError),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Model(err) => write!(f, "{err}"),
            CliError::Layout(err) => write!(f, "{err}"),
            CliError::Render(err) => write!(f, "{err}"),
            CliError::Raster(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<lumenflow::Error> for CliError {
    fn from(value: lumenflow::Error) -> Self {
        Self::Model(value)
    }
}

impl From<lumenflow::layout::Error> for CliError {
    fn from(value: lumenflow::layout::Error) -> Self {
        Self::Layout(value)
    }
}

impl From<lumenflow_render::Error> for CliError {
    fn from(value: lumenflow_render::Error) -> Self {
        Self::Render(value)
    }
}

impl From<lumenflow::raster::RasterError> for CliError {
    fn from(value: lumenflow::raster::RasterError) -> Self {
        Self::Raster(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    #[default]
    Validate,
    Layout,
    Render,
    Sample,
}

#[derive(Debug, Clone, Copy, Default)]
enum RenderFormat {
    #[default]
    Svg,
    Png,
}

impl FromStr for RenderFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "svg" => Ok(Self::Svg),
            "png" => Ok(Self::Png),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    pretty: bool,
    title: Option<String>,
    container_width: f64,
    fullscreen: bool,
    flow_animation: bool,
    render_format: RenderFormat,
    scale: u32,
    background: Option<String>,
    out: Option<String>,
}

fn usage() -> &'static str {
    "lumenflow-cli\n\
\n\
USAGE:\n\
  lumenflow-cli [validate] [--pretty] [<rows.json>|-]\n\
  lumenflow-cli layout [--pretty] [--width <px>] [--fullscreen] [<rows.json>|-]\n\
  lumenflow-cli render [--format svg|png] [--title <text>] [--width <px>] [--fullscreen] [--flow-animation] [--scale <n>] [--background <css-color>] [--out <path>] [<rows.json>|-]\n\
  lumenflow-cli sample [--pretty]\n\
\n\
NOTES:\n\
  - Input is a JSON array of rows: {\"from\", \"to\", \"current\", \"comparison\"?}.\n\
  - If <rows.json> is omitted or '-', input is read from stdin.\n\
  - validate prints the flow-conservation report as JSON.\n\
  - render prints SVG to stdout by default; use --out to write a file.\n\
  - PNG output defaults to a filename derived from the title (or --out).\n\
  - sample prints the demo income-statement rows.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args {
        command: Command::Validate,
        container_width: 900.0,
        scale: 2,
        ..Default::default()
    };

    let mut it = argv.iter().skip(1).peekable();
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "validate" => args.command = Command::Validate,
            "layout" => args.command = Command::Layout,
            "render" => args.command = Command::Render,
            "sample" => args.command = Command::Sample,
            "--pretty" => args.pretty = true,
            "--fullscreen" => args.fullscreen = true,
            "--flow-animation" => args.flow_animation = true,
            "--title" => {
                let Some(title) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.title = Some(title.clone());
            }
            "--width" => {
                let Some(w) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.container_width =
                    w.parse::<f64>().map_err(|_| CliError::Usage(usage()))?;
            }
            "--format" => {
                let Some(fmt) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.render_format = fmt
                    .parse::<RenderFormat>()
                    .map_err(|_| CliError::Usage(usage()))?;
            }
            "--scale" => {
                let Some(scale) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.scale = scale.parse::<u32>().map_err(|_| CliError::Usage(usage()))?;
                if args.scale == 0 {
                    return Err(CliError::Usage(usage()));
                }
            }
            "--background" => {
                let Some(bg) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                if !bg.trim().is_empty() {
                    args.background = Some(bg.trim().to_string());
                }
            }
            "--out" => {
                let Some(out) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out = Some(out.clone());
            }
            other if other.starts_with('-') && other != "-" => {
                return Err(CliError::Usage(usage()));
            }
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    } else {
        serde_json::to_writer(std::io::stdout().lock(), value)?;
    }
    Ok(())
}

fn write_text(text: &str, out: Option<&str>) -> Result<(), CliError> {
    match out {
        None => {
            print!("{text}");
            Ok(())
        }
        Some(path) => {
            std::fs::write(path, text)?;
            Ok(())
        }
    }
}

fn load_rows(args: &Args) -> Result<Vec<model::LinkRow>, CliError> {
    let text = read_input(args.input.as_deref())?;
    Ok(model::rows_from_json(&text)?)
}

fn run(args: Args) -> Result<(), CliError> {
    match args.command {
        Command::Sample => write_json(&model::sample_rows(), args.pretty),
        Command::Validate => {
            let rows = load_rows(&args)?;
            write_json(&compute_balance(&rows), args.pretty)?;
            Ok(())
        }
        Command::Layout => {
            let rows = load_rows(&args)?;
            let editor = EditorState::with_rows(rows);
            let dims = ChartDimensions::from_container(args.container_width, args.fullscreen);
            let params = lumenflow::layout::LayoutParams::new(dims.extent());
            let laid_out =
                lumenflow::layout::layout(&layout_graph(editor.snapshot()), &params)?;
            write_json(&laid_out, args.pretty)?;
            Ok(())
        }
        Command::Render => {
            let rows = load_rows(&args)?;
            let mut editor = EditorState::with_rows(rows);
            if let Some(title) = args.title.clone() {
                editor.set_title(title);
            }
            editor.set_flow_animation(args.flow_animation);
            let dims = ChartDimensions::from_container(args.container_width, args.fullscreen);
            let mut adapter = LayoutAdapter::new();
            let scene = build_scene(
                editor.snapshot(),
                editor.title(),
                dims,
                Transform::IDENTITY,
                editor.flow_animation(),
                &mut adapter,
            )?;
            let markup = block_on(lumenflow::export::export_svg(&scene));

            match args.render_format {
                RenderFormat::Svg => {
                    write_text(&markup, args.out.as_deref())?;
                }
                RenderFormat::Png => {
                    let options = RasterOptions {
                        scale: args.scale,
                        background: args.background.clone(),
                    };
                    let bytes = block_on(export_png(&markup, &options))?;
                    let out = args.out.clone().unwrap_or_else(|| {
                        lumenflow::export::export_filename(editor.title(), "png")
                    });
                    if out == "-" {
                        use std::io::Write;
                        std::io::stdout().lock().write_all(&bytes)?;
                    } else {
                        std::fs::write(out, bytes)?;
                    }
                }
            }
            Ok(())
        }
    }
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    match run(args) {
        Ok(()) => {}
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
