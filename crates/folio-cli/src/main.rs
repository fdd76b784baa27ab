use folio::render::{DiagramTheme, FolioConfig, RenderSession};
use folio::{
    AnnotationReport, ScannedAnnotation, article_title, normalize_bracket_citations,
    prepare_document, reading_time_minutes, scan_annotations,
};
use futures::executor::block_on;
use serde::Serialize;
use serde_json::Value;
use std::io::Read;
use tracing_subscriber::EnvFilter;

const MERMAID_MODULE: &str = "https://cdn.jsdelivr.net/npm/mermaid@11/dist/mermaid.esm.min.mjs";
const KATEX_MODULE: &str = "https://cdn.jsdelivr.net/npm/katex@0.16/dist/katex.mjs";
const KATEX_STYLESHEET: &str = "https://cdn.jsdelivr.net/npm/katex@0.16/dist/katex.min.css";

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Config(folio::render::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Config(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<folio::render::Error> for CliError {
    fn from(value: folio::render::Error) -> Self {
        Self::Config(value)
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
    Segments,
    Scan,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    config: Option<String>,
    theme: Option<DiagramTheme>,
    title: Option<String>,
    fragment: bool,
    pretty: bool,
    out: Option<String>,
    log: Option<String>,
}

#[derive(Serialize)]
struct ScanOut<'a> {
    report: AnnotationReport,
    annotations: &'a [ScannedAnnotation],
}

fn usage() -> &'static str {
    "folio-cli\n\
\n\
USAGE:\n\
  folio-cli [render] [--config <path>] [--theme <name>] [--title <text>] [--fragment] [--out <path>] [--log <level>] [<path>|-]\n\
  folio-cli segments [--pretty] [--out <path>] [--log <level>] [<path>|-]\n\
  folio-cli scan [--pretty] [--out <path>] [--log <level>] [<path>|-]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - render prints a standalone HTML page that typesets $math$ with KaTeX and draws diagrams with Mermaid;\n\
    --fragment prints only the article body (math stays as span.math elements).\n\
  - --config accepts .yaml, .yml or .json files; --theme overrides diagram.theme.\n\
  - segments prints the prepared segment list as JSON.\n\
  - scan prints the annotation report and every scanned tag as JSON (spans index the cleaned text).\n\
  - Log verbosity defaults to warn and can be set with FOLIO_LOG or --log.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1).peekable();
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "render" => args.command = Command::Render,
            "segments" => args.command = Command::Segments,
            "scan" => args.command = Command::Scan,
            "--pretty" => args.pretty = true,
            "--fragment" => args.fragment = true,
            "--config" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.config = Some(path.clone());
            }
            "--theme" => {
                let Some(theme) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.theme = Some(
                    theme
                        .parse::<DiagramTheme>()
                        .map_err(|_| CliError::Usage(usage()))?,
                );
            }
            "--title" => {
                let Some(title) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                if !title.trim().is_empty() {
                    args.title = Some(title.trim().to_string());
                }
            }
            "--out" => {
                let Some(out) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out = Some(out.clone());
            }
            "--log" => {
                let Some(level) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.log = Some(level.clone());
            }
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

fn init_logging(level: Option<&str>) -> Result<(), CliError> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).map_err(|_| CliError::Usage(usage()))?,
        None => EnvFilter::try_from_env("FOLIO_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
    Ok(())
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

fn load_config(args: &Args) -> Result<FolioConfig, CliError> {
    let mut config = match args.config.as_deref() {
        Some(path) => FolioConfig::from_path(path)?,
        None => FolioConfig::default(),
    };
    if let Some(theme) = args.theme {
        config.diagram.theme = theme;
    }
    Ok(config)
}

fn to_json(value: &impl Serialize, pretty: bool) -> Result<String, CliError> {
    let mut json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    json.push('\n');
    Ok(json)
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

fn render_page(title: &str, minutes: usize, body: &str, engine_config: &Value) -> String {
    let title = htmlize::escape_text(title);
    format!(
        "<!DOCTYPE html>\n\
<html lang=\"en\">\n\
<head>\n\
<meta charset=\"utf-8\" />\n\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\" />\n\
<title>{title}</title>\n\
<link rel=\"stylesheet\" href=\"{KATEX_STYLESHEET}\" />\n\
</head>\n\
<body>\n\
<article class=\"folio-article\">\n\
<p class=\"folio-reading-time\">{minutes} min read</p>\n\
{body}\
</article>\n\
<script type=\"module\">\n\
import mermaid from \"{MERMAID_MODULE}\";\n\
import katex from \"{KATEX_MODULE}\";\n\
for (const el of document.querySelectorAll(\"span.math\")) {{\n\
  katex.render(el.textContent, el, {{ displayMode: el.classList.contains(\"math-display\"), throwOnError: false }});\n\
}}\n\
mermaid.initialize({engine_config});\n\
await mermaid.run({{ querySelector: \"pre.mermaid\" }});\n\
</script>\n\
</body>\n\
</html>\n"
    )
}

fn run(args: Args) -> Result<(), CliError> {
    let text = read_input(args.input.as_deref())?;

    match args.command {
        Command::Scan => {
            let cleaned = normalize_bracket_citations(&text);
            let annotations = scan_annotations(&cleaned);
            let report = prepare_document(&text).report;
            let out = ScanOut {
                report,
                annotations: &annotations,
            };
            write_text(&to_json(&out, args.pretty)?, args.out.as_deref())
        }
        Command::Segments => {
            let segments = prepare_document(&text).segments();
            write_text(&to_json(&segments, args.pretty)?, args.out.as_deref())
        }
        Command::Render => {
            let config = load_config(&args)?;
            let mut session = RenderSession::from_config(&config);
            let body = block_on(session.render_to_html(&text));
            tracing::info!(
                generation = session.generation(),
                bytes = body.len(),
                "article rendered"
            );
            if args.fragment {
                return write_text(&body, args.out.as_deref());
            }
            let title = args
                .title
                .clone()
                .or_else(|| article_title(&text))
                .unwrap_or_else(|| "Article".to_string());
            let page = render_page(
                &title,
                reading_time_minutes(&text),
                &body,
                &config.diagram.to_engine_config(),
            );
            write_text(&page, args.out.as_deref())
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

    if let Err(err) = init_logging(args.log.as_deref()) {
        eprintln!("{err}");
        std::process::exit(2);
    }

    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
