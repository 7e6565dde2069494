use std::io::{self, Write};
use std::{fs, process};

use anyhow::{Context, Result, bail};
use crossterm::tty::IsTty;

use utfgrid_renderer::{
    config::UserConfig,
    preview::Preview,
    scene::{Engine, source::SceneDocument},
    serializer::UtfGrid,
};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

const RENDER_USAGE: &str = "utfgrid render <scene.json> [output.json] [-o KEY=VALUE]...";
const PREVIEW_USAGE: &str = "utfgrid preview <scene.json> [-o KEY=VALUE]...";
const INSPECT_USAGE: &str = "utfgrid inspect <grid.json> <row> <col>";

fn run() -> Result<()> {
    let mut args = std::env::args().skip(1);

    match args.next().as_deref() {
        Some("render") => {
            let (positional, overrides) = split_options(args)?;
            let mut positional = positional.into_iter();
            let scene_path = positional.next().context(RENDER_USAGE)?;
            let output_path = positional.next();
            render(&scene_path, output_path.as_deref(), &overrides)
        }
        Some("preview") => {
            let (positional, overrides) = split_options(args)?;
            let scene_path = positional.into_iter().next().context(PREVIEW_USAGE)?;
            preview(&scene_path, &overrides)
        }
        Some("inspect") => {
            let path = args.next().context(INSPECT_USAGE)?;
            let row = args.next().context(INSPECT_USAGE)?;
            let col = args.next().context(INSPECT_USAGE)?;
            let row: usize = row.parse().with_context(|| format!("Invalid row '{row}'"))?;
            let col: usize = col.parse().with_context(|| format!("Invalid column '{col}'"))?;
            inspect(&path, row, col)
        }
        _ => bail!(
            "utfgrid: UTFGrid feature-grid renderer\n\nUsage:\n  {RENDER_USAGE}\n  {PREVIEW_USAGE}\n  {INSPECT_USAGE}"
        ),
    }
}

/// Separate positional arguments from `-o KEY=VALUE` format options.
fn split_options(mut args: impl Iterator<Item = String>) -> Result<(Vec<String>, Vec<String>)> {
    let mut positional = Vec::new();
    let mut overrides = Vec::new();
    while let Some(arg) = args.next() {
        if arg == "-o" {
            let pair = args.next().context("-o needs a KEY=VALUE argument")?;
            overrides.push(pair);
        } else if let Some(pair) = arg.strip_prefix("-o") {
            overrides.push(pair.to_string());
        } else {
            positional.push(arg);
        }
    }
    Ok((positional, overrides))
}

fn load_scene(path: &str) -> Result<SceneDocument> {
    let json = fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))?;
    serde_json::from_str(&json).with_context(|| format!("Failed to parse {path}"))
}

fn render(scene_path: &str, output_path: Option<&str>, overrides: &[String]) -> Result<()> {
    let scene = load_scene(scene_path)?;
    let options = Engine::resolve_options(&UserConfig::load().grid, &scene, overrides)?;
    let encoder = Engine::encode(&scene, options)
        .with_context(|| format!("Failed to encode {scene_path}"))?;
    let features = encoder.interner().len();
    let (cols, rows) = (encoder.grid().cols(), encoder.grid().rows());

    match output_path {
        Some(path) => {
            let json = encoder.finalize_image()?;
            fs::write(path, &json).with_context(|| format!("Failed to write {path}"))?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            encoder.finalize_to_writer(&mut stdout)?;
            writeln!(stdout)?;
        }
    }

    eprintln!(
        "Encoded {features} features into a {cols}x{rows} grid from {scene_path} -> {}",
        output_path.unwrap_or("stdout"),
    );
    Ok(())
}

fn preview(scene_path: &str, overrides: &[String]) -> Result<()> {
    let scene = load_scene(scene_path)?;
    let options = Engine::resolve_options(&UserConfig::load().grid, &scene, overrides)?;
    let encoder = Engine::encode(&scene, options)
        .with_context(|| format!("Failed to encode {scene_path}"))?;

    let mut stdout = io::stdout();
    let preview = Preview::new(encoder.grid(), encoder.interner());
    if stdout.is_tty() {
        preview.render(&mut stdout)?;
    } else {
        preview.plain().render(&mut stdout)?;
    }
    Ok(())
}

fn inspect(path: &str, row: usize, col: usize) -> Result<()> {
    let json = fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))?;
    let grid = UtfGrid::parse(&json).with_context(|| format!("Failed to parse {path}"))?;

    let Some(id) = grid.id_at(row, col) else {
        bail!("No decodable cell at row {row}, column {col}");
    };
    match grid.key_at(row, col) {
        None if id == 0 => println!("water"),
        None => bail!("Cell {row},{col} decodes to feature {id}, which has no key"),
        Some(key) => {
            let data = grid
                .data
                .get(key)
                .map(|v| v.to_string())
                .unwrap_or_else(|| "null".into());
            println!("key: {key}");
            println!("data: {data}");
        }
    }
    Ok(())
}
