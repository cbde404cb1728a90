use std::{
    fs,
    io::{self, Read, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use client_core::{
    load_settings, AuxiliaryControls, ConverterWidget, HttpTransport, SubmitOutcome, TargetOutcome,
};
use shared::format::{FormatId, Mode, Side};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Converts documents through a remote `/exec` conversion service.
#[derive(Parser, Debug)]
#[command(name = "acu", version)]
struct Args {
    #[arg(long, default_value = "containers")]
    mode: Mode,
    #[arg(long)]
    from: String,
    #[arg(long)]
    to: String,
    /// Input file or directory; stdin when omitted.
    #[arg(long)]
    src: Option<PathBuf>,
    /// Output file or directory; stdout when omitted.
    #[arg(long)]
    dest: Option<PathBuf>,
    #[arg(long)]
    header: bool,
    #[arg(long)]
    prettify: bool,
    /// File holding the GROK expression.
    #[arg(long)]
    express: Option<PathBuf>,
    /// File holding custom GROK patterns as a JSON object.
    #[arg(long)]
    patterns: Option<PathBuf>,
    #[arg(long)]
    hmac: Option<String>,
    #[arg(long = "format-date")]
    format_date: Option<String>,
    #[arg(long)]
    endpoint: Option<String>,
    #[arg(long)]
    log: Option<PathBuf>,
    #[arg(long = "log-level", default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args)?;

    let mut settings = load_settings();
    if let Some(endpoint) = &args.endpoint {
        settings.endpoint = endpoint.clone();
    }
    let endpoint = settings.endpoint_url()?;
    info!(%endpoint, mode = %args.mode, "starting conversion");

    let source = parse_format(args.mode, Side::Source, &args.from)?;
    let target = parse_format(args.mode, Side::Target, &args.to)?;
    let controls = read_controls(&args, source)?;

    let transport = Arc::new(HttpTransport::new(endpoint, settings.timeout()));
    let widget = ConverterWidget::new(args.mode, transport);
    widget.select_source(source).await?;
    widget.set_controls(controls).await;

    match &args.src {
        Some(src) if src.is_dir() => {
            let dest = args
                .dest
                .as_deref()
                .context("--dest directory is required when --src is a directory")?;
            convert_dir(&widget, src, dest, source, target).await?;
            Ok(())
        }
        src => {
            let text = match src {
                Some(path) => fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
                None => {
                    let mut text = String::new();
                    io::stdin()
                        .read_to_string(&mut text)
                        .context("failed to read stdin")?;
                    text
                }
            };
            widget.set_source_text(text).await;
            let result = convert_selected(&widget, target).await?;
            write_output(args.dest.as_deref(), &result)
        }
    }
}

fn init_tracing(args: &Args) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .with_context(|| format!("invalid log filter '{}'", args.log_level))?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match &args.log {
        Some(path) => {
            let file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(io::stderr).init(),
    }
    Ok(())
}

/// Exact tags win so `m` and `M` stay distinct; otherwise a case-insensitive
/// match among the formats of the given side is accepted.
fn parse_format(mode: Mode, side: Side, raw: &str) -> Result<FormatId> {
    let candidates = match side {
        Side::Source => mode.source_formats(),
        Side::Target => mode.target_formats(),
    };
    let raw = raw.trim();
    let exact = candidates.iter().find(|format| format.tag() == raw);
    let loose = || {
        candidates
            .iter()
            .find(|format| format.tag().eq_ignore_ascii_case(raw))
    };
    if let Some(format) = exact.or_else(loose) {
        return Ok(*format);
    }

    let format: FormatId = raw.parse()?;
    match side {
        Side::Source => mode.ensure_source(format)?,
        Side::Target => mode.ensure_target(format)?,
    }
    Ok(format)
}

fn read_controls(args: &Args, source: FormatId) -> Result<AuxiliaryControls> {
    let mut controls = AuxiliaryControls {
        prettify: args.prettify,
        header: args.header,
        hmac_key: args.hmac.clone().unwrap_or_default(),
        date_format: args.format_date.clone().unwrap_or_default(),
        ..AuxiliaryControls::default()
    };

    if source == FormatId::Grok {
        let path = args
            .express
            .as_deref()
            .context("Regular expression in GROK format is not set")?;
        controls.grok_expression = fs::read_to_string(path)
            .with_context(|| format!("failed to read GROK expression {}", path.display()))?
            .trim()
            .to_string();
        if controls.grok_expression.is_empty() {
            bail!("Regular expression in GROK format is not set");
        }
    }
    if let Some(path) = &args.patterns {
        controls.grok_patterns = fs::read_to_string(path)
            .with_context(|| format!("failed to read GROK patterns {}", path.display()))?;
    }
    Ok(controls)
}

/// Selecting the target submits the current source text.
async fn convert_selected(widget: &ConverterWidget, target: FormatId) -> Result<String> {
    match widget.select_target(target).await? {
        TargetOutcome::Submitted(outcome) => finish(outcome),
        TargetOutcome::Cleared => bail!("Text to convert is empty"),
    }
}

fn finish(outcome: SubmitOutcome) -> Result<String> {
    match outcome {
        SubmitOutcome::Converted(result) => Ok(result),
        SubmitOutcome::Failed(err) => {
            error!(category = ?err.category(), error = %err, "conversion failed");
            bail!("{}", err.user_message())
        }
        SubmitOutcome::Superseded => bail!("conversion was superseded"),
    }
}

fn write_output(dest: Option<&Path>, result: &str) -> Result<()> {
    match dest {
        Some(path) => fs::write(path, result)
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(result.as_bytes())?;
            if !result.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
            Ok(())
        }
    }
}

/// Per-run counts of a directory conversion.
#[derive(Debug, Default, PartialEq, Eq)]
struct BatchReport {
    converted: usize,
    skipped: usize,
    failed: usize,
}

/// Converts every file under `src` (recursively) whose extension names the
/// source format into `dest`, named after the file stem with the target tag
/// as extension. Blank files are skipped; a failing file is logged and the
/// run carries on.
async fn convert_dir(
    widget: &ConverterWidget,
    src: &Path,
    dest: &Path,
    source: FormatId,
    target: FormatId,
) -> Result<BatchReport> {
    let (Some(source_exts), Some(target_exts)) = (extensions(source), extensions(target)) else {
        bail!("directory conversion supports container formats only");
    };
    if dest.is_file() {
        bail!("destination must be a directory, not a file: {}", dest.display());
    }
    fs::create_dir_all(dest).with_context(|| format!("failed to create {}", dest.display()))?;

    let mut entries: Vec<PathBuf> = WalkDir::new(src)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.into_path()),
            Err(err) => {
                warn!(error = %err, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|path| path.is_file() && has_extension(path, source_exts))
        .collect();
    entries.sort();

    let mut report = BatchReport::default();
    for path in &entries {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                warn!(input = %path.display(), error = %err, "failed to read file");
                report.failed += 1;
                continue;
            }
        };
        if text.trim().is_empty() {
            warn!(input = %path.display(), "skipping empty file");
            report.skipped += 1;
            continue;
        }

        widget.set_source_text(text).await;
        let result = match convert_selected(widget, target).await {
            Ok(result) => result,
            Err(err) => {
                warn!(
                    input = %path.display(),
                    from = %source,
                    to = %target,
                    error = %err,
                    "conversion failed"
                );
                report.failed += 1;
                continue;
            }
        };

        let out = dest
            .join(path.file_stem().unwrap_or_default())
            .with_extension(target_exts[0]);
        if let Err(err) = fs::write(&out, result) {
            warn!(output = %out.display(), error = %err, "failed to write file");
            report.failed += 1;
            continue;
        }
        info!(input = %path.display(), output = %out.display(), "converted");
        report.converted += 1;
    }

    info!(
        converted = report.converted,
        skipped = report.skipped,
        failed = report.failed,
        dir = %src.display(),
        "directory conversion finished"
    );
    Ok(report)
}

/// File extensions of container formats: the format tag, which is also the
/// output extension, plus accepted aliases.
fn extensions(format: FormatId) -> Option<&'static [&'static str]> {
    let exts: &'static [&'static str] = match format {
        FormatId::Xml => &["xml"],
        FormatId::Json => &["json"],
        FormatId::Yaml => &["yaml", "yml"],
        FormatId::Ini => &["ini"],
        FormatId::Csv => &["csv"],
        FormatId::Cef => &["cef"],
        FormatId::Syslog => &["syslog"],
        FormatId::Grok => &["grok"],
        _ => return None,
    };
    Some(exts)
}

fn has_extension(path: &Path, exts: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| exts.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::time::Duration;
    use tokio::net::TcpListener;
    use url::Url;

    // Echoes the text back as the result; text containing "broken" is refused.
    async fn handle_exec(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        let text = body["text"].as_str().unwrap_or_default();
        if text.contains("broken") {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "JSON is broken"})),
            );
        }
        (
            StatusCode::OK,
            Json(json!({"result": format!("<converted>{}</converted>", text.trim())})),
        )
    }

    async fn spawn_exec_stub() -> Url {
        std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let app = Router::new().route("/exec", post(handle_exec));
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Url::parse(&format!("http://{addr}/exec")).expect("url")
    }

    #[tokio::test]
    async fn directory_run_skips_blank_files_and_survives_failures() {
        let endpoint = spawn_exec_stub().await;
        let src = tempfile::tempdir().expect("src dir");
        let dest = tempfile::tempdir().expect("dest dir");
        fs::create_dir_all(src.path().join("nested")).expect("nested dir");
        fs::write(src.path().join("a.json"), r#"{"a":1}"#).expect("a");
        fs::write(src.path().join("b.json"), "  \n").expect("b");
        fs::write(src.path().join("c.json"), r#"{"broken"#).expect("c");
        fs::write(src.path().join("nested/d.json"), r#"{"d":4}"#).expect("d");
        fs::write(src.path().join("e.xml"), "<e/>").expect("e");

        let transport = Arc::new(HttpTransport::new(endpoint, Duration::from_secs(5)));
        let widget = ConverterWidget::new(Mode::Containers, transport);
        widget.select_source(FormatId::Json).await.expect("json source");

        let report = convert_dir(&widget, src.path(), dest.path(), FormatId::Json, FormatId::Xml)
            .await
            .expect("batch run");

        assert_eq!(
            report,
            BatchReport {
                converted: 2,
                skipped: 1,
                failed: 1,
            }
        );
        assert_eq!(
            fs::read_to_string(dest.path().join("a.xml")).expect("a.xml"),
            r#"<converted>{"a":1}</converted>"#
        );
        assert!(dest.path().join("d.xml").is_file());
        assert!(!dest.path().join("b.xml").exists());
        assert!(!dest.path().join("c.xml").exists());
        assert!(!dest.path().join("e.xml").exists());
    }

    #[tokio::test]
    async fn directory_run_uses_format_tags_as_extensions() {
        let endpoint = spawn_exec_stub().await;
        let src = tempfile::tempdir().expect("src dir");
        let dest = tempfile::tempdir().expect("dest dir");
        fs::write(src.path().join("events.syslog"), "<34>Oct 11 22:14:15 host su: fail").expect("syslog");
        fs::write(src.path().join("other.log"), "<34>Oct 11 22:14:15 host su: fail").expect("log");

        let transport = Arc::new(HttpTransport::new(endpoint, Duration::from_secs(5)));
        let widget = ConverterWidget::new(Mode::Containers, transport);
        widget.select_source(FormatId::Syslog).await.expect("syslog source");

        let report = convert_dir(&widget, src.path(), dest.path(), FormatId::Syslog, FormatId::Csv)
            .await
            .expect("batch run");

        assert_eq!(report.converted, 1);
        assert!(dest.path().join("events.csv").is_file());
        assert!(!dest.path().join("other.csv").exists());
    }

    #[tokio::test]
    async fn directory_run_rejects_formats_without_extensions() {
        let endpoint = spawn_exec_stub().await;
        let src = tempfile::tempdir().expect("src dir");
        let transport = Arc::new(HttpTransport::new(endpoint, Duration::from_secs(5)));
        let widget = ConverterWidget::new(Mode::Hashing, transport);

        let err = convert_dir(&widget, src.path(), src.path(), FormatId::Text, FormatId::Md5)
            .await
            .expect_err("hashing has no file extensions");
        assert!(err.to_string().contains("container formats only"));
    }

    #[test]
    fn format_names_prefer_exact_tags() {
        assert_eq!(
            parse_format(Mode::Seconds, Side::Target, "M").expect("months"),
            FormatId::Months
        );
        assert_eq!(
            parse_format(Mode::Seconds, Side::Target, "m").expect("minutes"),
            FormatId::Minutes
        );
        assert_eq!(
            parse_format(Mode::Containers, Side::Source, "XML").expect("xml"),
            FormatId::Xml
        );
        assert_eq!(
            parse_format(Mode::Bytes, Side::Target, "kb").expect("kilobytes"),
            FormatId::Kilobytes
        );
    }

    #[test]
    fn formats_outside_the_mode_are_rejected() {
        assert!(parse_format(Mode::Containers, Side::Target, "grok").is_err());
        assert!(parse_format(Mode::Hashing, Side::Source, "md5").is_err());
        assert!(parse_format(Mode::Containers, Side::Source, "toml").is_err());
    }

    #[test]
    fn grok_source_requires_an_expression_file() {
        let args = Args::parse_from(["acu", "--from", "grok", "--to", "json"]);
        let err = read_controls(&args, FormatId::Grok).expect_err("no expression");
        assert_eq!(err.to_string(), "Regular expression in GROK format is not set");
    }

    #[test]
    fn controls_follow_flags() {
        let args = Args::parse_from([
            "acu", "--from", "json", "--to", "csv", "--header", "--hmac", "k",
        ]);
        let controls = read_controls(&args, FormatId::Json).expect("controls");
        assert!(controls.header);
        assert!(!controls.prettify);
        assert_eq!(controls.hmac_key, "k");
        assert_eq!(args.mode, Mode::Containers);
    }

    #[test]
    fn extensions_cover_container_formats() {
        assert!(has_extension(Path::new("a/b.YML"), extensions(FormatId::Yaml).expect("yaml")));
        assert!(!has_extension(Path::new("a/b.json"), extensions(FormatId::Xml).expect("xml")));
        assert_eq!(extensions(FormatId::Syslog), Some(&["syslog"][..]));
        assert_eq!(extensions(FormatId::Cef), Some(&["cef"][..]));
        assert_eq!(extensions(FormatId::Md5), None);
    }
}
