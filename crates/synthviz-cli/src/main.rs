use serde::Serialize;
use serde_json::Value;
use std::io::{Read, Write};
use std::str::FromStr;
use synthviz::render::raster::{self, RasterError, RasterOptions};
use synthviz::render::{HeadlessError, LayoutOptions, SvgRenderOptions, sanitize_svg_id};
use synthviz::{
    EffectSeries, FigureSize, Panel, PanelSelection, PlotConfig, PlotRequest,
    SyntheticControlStudy,
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Debug)]
enum CliError {
    Usage(String),
    Io(std::io::Error),
    Study(synthviz::Error),
    Render(synthviz_render::Error),
    Headless(HeadlessError),
    Raster(RasterError),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Study(err) => write!(f, "{err}"),
            CliError::Render(err) => write!(f, "{err}"),
            CliError::Headless(err) => write!(f, "{err}"),
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

impl From<synthviz::Error> for CliError {
    fn from(value: synthviz::Error) -> Self {
        Self::Study(value)
    }
}

impl From<synthviz_render::Error> for CliError {
    fn from(value: synthviz_render::Error) -> Self {
        Self::Render(value)
    }
}

impl From<HeadlessError> for CliError {
    fn from(value: HeadlessError) -> Self {
        Self::Headless(value)
    }
}

impl From<RasterError> for CliError {
    fn from(value: RasterError) -> Self {
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
    Render,
    Layout,
    Effects,
    Panels,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum RenderFormat {
    #[default]
    Svg,
    Png,
    Jpeg,
    Pdf,
}

impl RenderFormat {
    fn extension(self) -> &'static str {
        match self {
            RenderFormat::Svg => "svg",
            RenderFormat::Png => "png",
            RenderFormat::Jpeg => "jpg",
            RenderFormat::Pdf => "pdf",
        }
    }
}

impl FromStr for RenderFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "svg" => Ok(Self::Svg),
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "pdf" => Ok(Self::Pdf),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    pretty: bool,
    panels: Vec<String>,
    figsize: Option<String>,
    dpi: Option<f64>,
    treated_label: Option<String>,
    synth_label: Option<String>,
    config_path: Option<String>,
    overrides: Vec<String>,
    render_format: RenderFormat,
    render_scale: f32,
    background: Option<String>,
    figure_id: Option<String>,
    out: Option<String>,
}

fn usage() -> String {
    "synthviz-cli\n\
\n\
USAGE:\n\
  synthviz-cli [render] [--panel <name>]... [--panels <a,b,...>] [--figsize <WxH>] [--dpi <n>] [--treated-label <text>] [--synth-label <text>] [--config <path>] [--set <key=value>]... [--format svg|png|jpg|pdf] [--scale <n>] [--background <css-color>] [--id <figure-id>] [--out <path>] [<study.json>|-]\n\
  synthviz-cli layout [--pretty] [panel and style options] [<study.json>|-]\n\
  synthviz-cli effects [--pretty] [<study.json>|-]\n\
  synthviz-cli panels\n\
\n\
NOTES:\n\
  - If <study.json> is omitted or '-', the study is read from stdin.\n\
  - Without --panel/--panels all four panels are drawn.\n\
  - render prints SVG to stdout by default; use --out to write a file.\n\
  - PNG/JPG/PDF output defaults to writing next to the input file (or ./out.<ext> for stdin).\n\
  - Set RUST_LOG (e.g. RUST_LOG=debug) for diagnostics on stderr.\n\
"
    .to_string()
}

fn next_value<'a>(
    it: &mut impl Iterator<Item = &'a String>,
    flag: &str,
) -> Result<&'a String, CliError> {
    it.next()
        .ok_or_else(|| CliError::Usage(format!("{flag} requires a value\n\n{}", usage())))
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args {
        render_scale: 1.0,
        ..Default::default()
    };

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "render" => args.command = Command::Render,
            "layout" => args.command = Command::Layout,
            "effects" => args.command = Command::Effects,
            "panels" => args.command = Command::Panels,
            "--pretty" => args.pretty = true,
            "--panel" => args.panels.push(next_value(&mut it, a)?.clone()),
            "--panels" => {
                let list = next_value(&mut it, a)?;
                args.panels.extend(
                    list.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string),
                );
            }
            "--figsize" => args.figsize = Some(next_value(&mut it, a)?.clone()),
            "--dpi" => {
                let dpi = next_value(&mut it, a)?
                    .parse::<f64>()
                    .map_err(|_| CliError::Usage(format!("--dpi expects a number\n\n{}", usage())))?;
                if !(dpi.is_finite() && dpi > 0.0) {
                    return Err(CliError::Usage(format!(
                        "--dpi must be positive\n\n{}",
                        usage()
                    )));
                }
                args.dpi = Some(dpi);
            }
            "--treated-label" => args.treated_label = Some(next_value(&mut it, a)?.clone()),
            "--synth-label" => args.synth_label = Some(next_value(&mut it, a)?.clone()),
            "--config" => args.config_path = Some(next_value(&mut it, a)?.clone()),
            "--set" => args.overrides.push(next_value(&mut it, a)?.clone()),
            "--format" => {
                args.render_format = next_value(&mut it, a)?
                    .parse::<RenderFormat>()
                    .map_err(|_| CliError::Usage(usage()))?;
            }
            "--scale" => {
                args.render_scale = next_value(&mut it, a)?
                    .parse::<f32>()
                    .map_err(|_| CliError::Usage(usage()))?;
                if !(args.render_scale.is_finite() && args.render_scale > 0.0) {
                    return Err(CliError::Usage(usage()));
                }
            }
            "--background" => {
                let bg = next_value(&mut it, a)?;
                if !bg.trim().is_empty() {
                    args.background = Some(bg.trim().to_string());
                }
            }
            "--id" => args.figure_id = Some(next_value(&mut it, a)?.clone()),
            "--out" => args.out = Some(next_value(&mut it, a)?.clone()),
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            "-" => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some("-".to_string());
            }
            other if other.starts_with('-') => {
                return Err(CliError::Usage(format!(
                    "unknown option `{other}`\n\n{}",
                    usage()
                )));
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
    let mut stdout = std::io::stdout().lock();
    if pretty {
        serde_json::to_writer_pretty(&mut stdout, value)?;
    } else {
        serde_json::to_writer(&mut stdout, value)?;
    }
    writeln!(stdout)?;
    Ok(())
}

fn write_bytes(bytes: &[u8], out: &str) -> Result<(), CliError> {
    if out == "-" {
        std::io::stdout().lock().write_all(bytes)?;
    } else {
        std::fs::write(out, bytes)?;
    }
    Ok(())
}

fn default_raster_out_path(input: Option<&str>, ext: &str) -> std::path::PathBuf {
    match input {
        Some(path) if path != "-" => std::path::PathBuf::from(path).with_extension(ext),
        _ => std::path::PathBuf::from(format!("out.{ext}")),
    }
}

fn build_request(args: &Args) -> Result<PlotRequest, CliError> {
    let mut request = PlotRequest::default();
    if !args.panels.is_empty() {
        request.panels = PanelSelection::parse(args.panels.as_slice())?;
    }
    if let Some(size) = args.figsize.as_deref() {
        request.figsize = size.parse::<FigureSize>()?;
    }
    if let Some(label) = &args.treated_label {
        request.treated_label = label.clone();
    }
    if let Some(label) = &args.synth_label {
        request.synth_label = label.clone();
    }
    Ok(request)
}

/// Config file first, then `--dpi`, then `--set` overrides in command-line order.
fn build_config(args: &Args) -> Result<PlotConfig, CliError> {
    let mut config = PlotConfig::empty_object();
    if let Some(path) = args.config_path.as_deref() {
        let text = std::fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&text)?;
        if !value.is_object() {
            return Err(CliError::Usage(format!(
                "config file `{path}` must contain a JSON object"
            )));
        }
        config.deep_merge(&value);
    }
    if let Some(dpi) = args.dpi {
        config.set_value("dpi", Value::from(dpi));
    }
    for assignment in &args.overrides {
        if config.set_from_assignment(assignment).is_none() {
            return Err(CliError::Usage(format!(
                "--set expects key=value, got `{assignment}`\n\n{}",
                usage()
            )));
        }
    }
    Ok(config)
}

fn run(args: Args) -> Result<(), CliError> {
    if let Command::Panels = args.command {
        let mut stdout = std::io::stdout().lock();
        for panel in Panel::ALL {
            writeln!(stdout, "{panel}")?;
        }
        return Ok(());
    }

    let text = read_input(args.input.as_deref())?;
    let study = SyntheticControlStudy::from_json_str(&text)?;
    tracing::debug!(
        periods = study.periods_all(),
        controls = study.n_controls(),
        placebos = study.in_space_placebos.is_some(),
        "loaded study"
    );

    match args.command {
        Command::Panels => Ok(()),
        Command::Effects => {
            let effects = EffectSeries::compute(&study)?;
            write_json(&effects, args.pretty)
        }
        Command::Layout => {
            let request = build_request(&args)?;
            let config = build_config(&args)?;
            let layout = synthviz_render::layout_study(
                &study,
                &request,
                &config,
                &LayoutOptions::default(),
            )?;
            write_json(&layout, args.pretty)
        }
        Command::Render => {
            let request = build_request(&args)?;
            let config = build_config(&args)?;
            let layout_opts = LayoutOptions::default();
            let svg_opts = SvgRenderOptions {
                figure_id: args.figure_id.as_deref().map(sanitize_svg_id),
            };

            if args.render_format == RenderFormat::Svg {
                let svg = synthviz::render::render_svg(
                    &study,
                    &request,
                    &config,
                    &layout_opts,
                    &svg_opts,
                )?;
                match args.out.as_deref() {
                    None | Some("-") => print!("{svg}"),
                    Some(path) => std::fs::write(path, svg)?,
                }
                return Ok(());
            }

            let input = raster::FigureInput {
                study: &study,
                request: &request,
                config: &config,
                layout: &layout_opts,
                svg: &svg_opts,
            };
            let raster_opts = RasterOptions {
                scale: args.render_scale,
                background: args.background.clone(),
                ..RasterOptions::default()
            };
            let bytes = match args.render_format {
                RenderFormat::Png => raster::render_png_sync(input, &raster_opts)?,
                RenderFormat::Jpeg => raster::render_jpeg_sync(input, &raster_opts)?,
                RenderFormat::Pdf | RenderFormat::Svg => raster::render_pdf_sync(input)?,
            };
            let out = args.out.clone().unwrap_or_else(|| {
                default_raster_out_path(args.input.as_deref(), args.render_format.extension())
                    .to_string_lossy()
                    .to_string()
            });
            tracing::debug!(out = %out, bytes = bytes.len(), "writing raster output");
            write_bytes(&bytes, &out)
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

fn main() {
    init_tracing();

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

    if let Err(err) = run(args) {
        eprintln!("{err}");
        let code = if matches!(err, CliError::Usage(_)) { 2 } else { 1 };
        std::process::exit(code);
    }
}
