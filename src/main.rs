// Copyright 2020 TwoCookingMice

use glimmer::core::integrator::IntegratorType;
use glimmer::io::exr_utils;
use glimmer::renderers::Renderer;

use indicatif::{ProgressBar, ProgressStyle};
use std::env;
use std::path::Path;
use std::process;

const USAGE: &str = "<scene.xml> <output.exr|png> [--spp N] [--integrator ao|bsdf|path] [--threads N]";

struct Options {
    scene: String,
    output: String,
    spp: Option<u32>,
    integrator: Option<IntegratorType>,
    threads: Option<usize>,
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    if args.len() < 3 {
        return Err(format!("Usage: {} {}", args.first().map(String::as_str).unwrap_or("glimmer"), USAGE));
    }

    let mut options = Options {
        scene: args[1].clone(),
        output: args[2].clone(),
        spp: None,
        integrator: None,
        threads: None,
    };

    let mut i = 3;
    while i < args.len() {
        let value = args.get(i + 1);
        match args[i].as_str() {
            "--spp" => {
                options.spp = Some(value.and_then(|v| v.parse::<u32>().ok())
                    .ok_or("--spp expects a positive integer")?);
                i += 1;
            }
            "--integrator" => {
                let name = value.ok_or("--integrator expects a name")?;
                options.integrator = Some(name.parse::<IntegratorType>()?);
                i += 1;
            }
            "--threads" => {
                options.threads = Some(value.and_then(|v| v.parse::<usize>().ok())
                    .ok_or("--threads expects a positive integer")?);
                i += 1;
            }
            other => log::warn!("Ignoring unknown argument '{}'.", other),
        }
        i += 1;
    }
    Ok(options)
}

fn run(options: Options) -> Result<(), String> {
    let mut renderer = match options.threads {
        Some(n) => Renderer::with_threads(Default::default(), n),
        None => Renderer::default(),
    };
    renderer.set_show_progress(false);
    renderer.open_scene(&options.scene).map_err(|e| format!("failed to load scene: {}", e))?;
    if let Some(integrator_type) = options.integrator {
        renderer.change_integrator(integrator_type);
    }

    let spp = options.spp.or(renderer.samples_per_pixel()).unwrap_or(1).max(1);
    log::info!("Rendering {} frames with the '{}' integrator.", spp, renderer.integrator().integrator_type());

    let progress = ProgressBar::new(spp as u64);
    progress.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} spp")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    for _ in 0..spp {
        if !renderer.render_frame() {
            return Err("nothing to render".to_string());
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    let output = Path::new(&options.output);
    let is_exr = output.extension()
        .and_then(|e| e.to_str())
        .map_or(true, |e| e.eq_ignore_ascii_case("exr"));
    if is_exr {
        exr_utils::write_exr_to_file(renderer.image(), output).map_err(|e| e.to_string())
    } else {
        exr_utils::write_ldr_to_file(renderer.image(), output).map_err(|e| e.to_string())
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let result = parse_args(&args).and_then(run);
    if let Err(message) = result {
        eprintln!("{}", message);
        process::exit(1);
    }
}
