//! carousel – command-line carousel slide generator.
//!
//! Usage:
//!   carousel <corpus.json> [output_dir] [--settings settings.json] [--slides N] ...
//!
//! If `output_dir` is omitted the slides are written to `./carousel`.

use std::{env, fs, path::PathBuf, process};

use carousel_forge::export::{DirectorySink, ExportFormat};
use carousel_forge::fonts::FontManager;
use carousel_forge::{CarouselSettings, ContentCorpus, GenerationRequest, Generator};

struct Args {
    corpus: PathBuf,
    output: PathBuf,
    settings: CarouselSettings,
    font_file: Option<PathBuf>,
    plan_only: bool,
}

fn main() {
    env_logger::init();

    let argv: Vec<String> = env::args().collect();
    let args = match parse_args(&argv) {
        Ok(a) => a,
        Err(msg) => {
            eprintln!("Error: {msg}");
            print_usage(&argv[0]);
            process::exit(1);
        }
    };

    if let Err(e) = run(args) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(args: Args) -> carousel_forge::Result<()> {
    let corpus = ContentCorpus::from_file(&args.corpus)?;
    let request = GenerationRequest::from_settings(corpus, &args.settings)?;

    if args.plan_only {
        println!("{}", request.plan()?.to_json());
        return Ok(());
    }

    let mut fonts = FontManager::with_system_fonts();
    if let Some(path) = &args.font_file {
        fonts.load_font_everywhere(fs::read(path)?)?;
    }
    if !fonts.has_real_font(args.settings.font_family) {
        eprintln!(
            "Warning: no font found for {}; drawing placeholder glyphs",
            args.settings.font_family.name()
        );
    }

    let generator = Generator::new(fonts);
    let mut sink = DirectorySink::new(&args.output);
    let report = generator.generate(&request, &mut sink)?;

    eprintln!(
        "Wrote {} slide{} to '{}'",
        report.exported,
        if report.exported == 1 { "" } else { "s" },
        sink.dir().display()
    );
    Ok(())
}

fn parse_args(argv: &[String]) -> Result<Args, String> {
    let mut corpus: Option<PathBuf> = None;
    let mut output: Option<PathBuf> = None;
    let mut settings_path: Option<PathBuf> = None;
    let mut font_file: Option<PathBuf> = None;
    let mut plan_only = false;
    // Flag overrides are applied after the settings file is loaded.
    let mut overrides: Vec<(String, String)> = Vec::new();

    let mut iter = argv.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--help" | "-h" => {
                print_usage(&argv[0]);
                process::exit(0);
            }
            "--settings" | "-s" => settings_path = Some(PathBuf::from(value(&mut iter, arg)?)),
            "--font-file" => font_file = Some(PathBuf::from(value(&mut iter, arg)?)),
            "--slides" | "--font-size" | "--brand" | "--font" => {
                let v = value(&mut iter, arg)?;
                overrides.push((arg.clone(), v));
            }
            "--no-hashtags" | "--no-author" | "--jpeg" | "--strict" => {
                overrides.push((arg.clone(), String::new()));
            }
            "--plan-only" => plan_only = true,
            other if other.starts_with('-') => return Err(format!("unknown flag: {other}")),
            path => {
                if corpus.is_none() {
                    corpus = Some(PathBuf::from(path));
                } else if output.is_none() {
                    output = Some(PathBuf::from(path));
                } else {
                    return Err(format!("unexpected argument: {path}"));
                }
            }
        }
    }

    let corpus = corpus.ok_or("no corpus file specified")?;
    let mut settings = match settings_path {
        Some(p) => CarouselSettings::from_file(&p).map_err(|e| e.to_string())?,
        None => CarouselSettings::default(),
    };

    for (flag, v) in overrides {
        match flag.as_str() {
            "--slides" => settings.slide_count = parse_number(&flag, &v)?,
            "--font-size" => settings.font_size_pt = parse_number(&flag, &v)?,
            "--brand" => settings.brand_name = v,
            "--font" => settings.font_family = v.parse().map_err(|e| format!("{e}"))?,
            "--no-hashtags" => settings.include_hashtags = false,
            "--no-author" => settings.include_author = false,
            "--jpeg" => settings.format = ExportFormat::Jpeg,
            "--strict" => settings.strict_layout = true,
            _ => {}
        }
    }

    Ok(Args {
        corpus,
        output: output.unwrap_or_else(|| PathBuf::from("carousel")),
        settings,
        font_file,
        plan_only,
    })
}

fn value<'a>(iter: &mut impl Iterator<Item = &'a String>, flag: &str) -> Result<String, String> {
    iter.next()
        .cloned()
        .ok_or_else(|| format!("{flag} needs a value"))
}

fn parse_number(flag: &str, v: &str) -> Result<u32, String> {
    v.parse()
        .map_err(|_| format!("{flag} expects a whole number, got {v:?}"))
}

fn print_usage(prog: &str) {
    eprintln!("carousel – turn structured content into carousel slide images");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} <corpus.json> [output_dir] [flags]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!(
        "  <corpus.json>  {{\"title\", \"author\", \"keyPoints\": [...], \"hashtags\": [...]}}"
    );
    eprintln!("  [output_dir]   Where carousel-slide-<n>.png files go (default: ./carousel)");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --settings, -s FILE  JSON settings (colors, font, slide count, ...)");
    eprintln!("  --slides N           Slide count: 3, 5, 7 or 10");
    eprintln!("  --font-size N        Body font size, 12-24");
    eprintln!("  --font NAME          Inter, Roboto, Open Sans, Montserrat or Poppins");
    eprintln!("  --font-file FILE     TTF/OTF used for every family");
    eprintln!("  --brand NAME         Brand label drawn bottom-left");
    eprintln!("  --no-hashtags        Use the fallback text on the last slide");
    eprintln!("  --no-author          Leave the cover subtitle empty");
    eprintln!("  --jpeg               Write JPEG instead of PNG");
    eprintln!("  --strict             Fail on words wider than a line");
    eprintln!("  --plan-only          Print the slide plan as JSON and exit");
    eprintln!("  --help               Print this message");
}
