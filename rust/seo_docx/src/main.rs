use anyhow::{anyhow, bail, Context, Result};
use clap::{ArgAction, Parser};
use seo_headings::{
    process_docx, DocxOutput, KeywordSet, MatchPolicy, Options, Policy, PromotionMode, Report,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Turn SEO keywords found in a .docx into HTML headings."
)]
struct Args {
    /// Input Word document.
    #[arg(long)]
    docx: PathBuf,

    /// Primary keywords, one per line.
    #[arg(long)]
    primary_file: Option<PathBuf>,

    /// Secondary keywords, one per line.
    #[arg(long)]
    secondary_file: Option<PathBuf>,

    /// Additional primary keyword (repeatable).
    #[arg(long = "primary")]
    primary: Vec<String>,

    /// Additional secondary keyword (repeatable).
    #[arg(long = "secondary")]
    secondary: Vec<String>,

    /// JSON policy file; flags below override its values.
    #[arg(long)]
    policy: Option<PathBuf>,

    /// Output .html path (defaults to the input path with an .html extension).
    #[arg(long)]
    html_out: Option<PathBuf>,

    /// Output .docx path. Nothing is written when omitted.
    #[arg(long)]
    docx_out: Option<PathBuf>,

    /// Write a restructured document with keyword heading paragraphs.
    #[arg(long)]
    restructure: bool,

    /// Render headings from the document's own heading styles.
    #[arg(long)]
    use_styles: bool,

    /// Match keywords anywhere, case-sensitively.
    #[arg(long)]
    substring: bool,

    /// Promote every keyword of a paragraph instead of one.
    #[arg(long)]
    inline_spans: bool,

    /// Title of the html document.
    #[arg(long)]
    title: Option<String>,

    /// Print the transform report as JSON on stdout.
    #[arg(long)]
    report: bool,

    /// Re-parse the html and check that no paragraph text was lost.
    #[arg(long)]
    verify: bool,

    /// Log each promotion.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) -> Result<()> {
    let filter = if verbose > 0 {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow!("failed to initialize logging: {error}"))
}

/// Keyword file contents with the flag keywords appended as extra lines.
fn read_keyword_lines(file: Option<&Path>, extra: &[String]) -> Result<String> {
    let mut lines = match file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("read keywords {}", path.display()))?,
        None => String::new(),
    };
    for keyword in extra {
        lines.push('\n');
        lines.push_str(keyword);
    }
    Ok(lines)
}

fn build_options(args: &Args) -> Result<Options> {
    let mut policy = match &args.policy {
        Some(path) => Policy::load(path).with_context(|| format!("load policy {}", path.display()))?,
        None => Policy::default(),
    };
    if args.substring {
        policy.match_policy = MatchPolicy::Substring;
    }
    if args.inline_spans {
        policy.mode = PromotionMode::InlineSpans;
    }

    let mut options = Options {
        policy,
        use_styles: args.use_styles,
        verify: args.verify,
        ..Options::default()
    };
    if args.restructure {
        options.docx_output = DocxOutput::Restructured;
    }
    if let Some(title) = &args.title {
        options.title = title.clone();
    }
    Ok(options)
}

fn html_path(args: &Args) -> PathBuf {
    args.html_out
        .clone()
        .unwrap_or_else(|| args.docx.with_extension("html"))
}

fn run(args: &Args) -> Result<Report> {
    let options = build_options(args)?;
    let primary = read_keyword_lines(args.primary_file.as_deref(), &args.primary)?;
    let secondary = read_keyword_lines(args.secondary_file.as_deref(), &args.secondary)?;
    let keywords = KeywordSet::from_lines(&primary, &secondary, options.policy.match_policy);
    if keywords.is_empty() && !options.use_styles {
        info!("no keywords given; every paragraph renders as plain text");
    }

    let bytes = fs::read(&args.docx).with_context(|| format!("read {}", args.docx.display()))?;
    if bytes.is_empty() {
        bail!("{} is empty", args.docx.display());
    }
    let output = process_docx(&bytes, &keywords, &options)
        .with_context(|| format!("transform {}", args.docx.display()))?;

    let html_out = html_path(args);
    let mut artifacts: Vec<(&Path, &[u8])> = vec![(html_out.as_path(), output.html.as_bytes())];
    if let Some(docx_out) = &args.docx_out {
        artifacts.push((docx_out.as_path(), output.docx.as_slice()));
    }
    write_artifacts(&artifacts)?;

    Ok(output.report)
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

/// Write every artifact to a staging file first and move them into place only
/// once all of them were written.
fn write_artifacts(artifacts: &[(&Path, &[u8])]) -> Result<()> {
    let mut staged: Vec<PathBuf> = Vec::with_capacity(artifacts.len());
    for (path, bytes) in artifacts {
        let tmp = staging_path(path);
        if let Err(error) = fs::write(&tmp, bytes) {
            for file in staged.iter().chain(std::iter::once(&tmp)) {
                let _ = fs::remove_file(file);
            }
            return Err(error).with_context(|| format!("write {}", path.display()));
        }
        staged.push(tmp);
    }

    for (tmp, (path, _)) in staged.iter().zip(artifacts) {
        fs::rename(tmp, path).with_context(|| format!("write {}", path.display()))?;
        info!(path = %path.display(), "written");
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose)?;

    let report = run(&args)?;
    if args.report {
        println!("{}", serde_json::to_string_pretty(&report).context("serialize report")?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn write_docx(dir: &Path, paragraphs: &[&str]) -> PathBuf {
        let body: String = paragraphs
            .iter()
            .map(|t| t.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;"))
            .map(|t| format!("<w:p><w:r><w:t xml:space=\"preserve\">{t}</w:t></w:r></w:p>"))
            .collect();
        let document = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body>{body}</w:body></w:document>"
        );
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("word/document.xml", SimpleFileOptions::default()).unwrap();
        zip.write_all(document.as_bytes()).unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        let path = dir.join("input.docx");
        fs::write(&path, bytes).unwrap();
        path
    }

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("seo_docx").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn writes_html_next_to_input_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_docx(dir.path(), &["Our product roadmap includes AI features", "<script>"]);
        let args = parse(&["--docx", input.to_str().unwrap(), "--primary", "AI", "--verify"]);

        let report = run(&args).unwrap();
        let html = fs::read_to_string(dir.path().join("input.html")).unwrap();
        assert!(html.contains("includes <h2 class=\"kw-primary\">AI</h2> features"));
        assert!(html.contains("&lt;script&gt;"));
        assert_eq!(report.promoted_paragraphs, 1);
    }

    #[test]
    fn keyword_files_and_flags_are_merged() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_docx(dir.path(), &["cloud hosting", "edge compute", "AI"]);
        let secondary = dir.path().join("secondary.txt");
        fs::write(&secondary, "cloud\n\n  \n").unwrap();
        let html_out = dir.path().join("out.html");
        let args = parse(&[
            "--docx",
            input.to_str().unwrap(),
            "--secondary-file",
            secondary.to_str().unwrap(),
            "--secondary",
            "edge",
            "--html-out",
            html_out.to_str().unwrap(),
        ]);

        let report = run(&args).unwrap();
        let keywords: Vec<&str> = report.keywords.iter().map(|k| k.keyword.as_str()).collect();
        assert_eq!(keywords, vec!["cloud", "edge"]);
        let html = fs::read_to_string(html_out).unwrap();
        assert!(html.contains("<h3 class=\"kw-secondary\">cloud</h3> hosting"));
        assert!(html.contains("<h3 class=\"kw-secondary\">edge</h3> compute"));
    }

    #[test]
    fn policy_file_is_applied_and_flags_override_it() {
        let dir = tempfile::tempdir().unwrap();
        let policy = dir.path().join("policy.json");
        fs::write(&policy, r#"{"quota": 1, "mode": "inline_spans", "match_policy": "whole_word"}"#).unwrap();
        let input = write_docx(dir.path(), &["x"]);
        let args = parse(&[
            "--docx",
            input.to_str().unwrap(),
            "--policy",
            policy.to_str().unwrap(),
            "--substring",
            "--restructure",
            "--title",
            "Report",
        ]);

        let options = build_options(&args).unwrap();
        assert_eq!(options.policy.quota, 1);
        assert_eq!(options.policy.mode, PromotionMode::InlineSpans);
        assert_eq!(options.policy.match_policy, MatchPolicy::Substring);
        assert_eq!(options.docx_output, DocxOutput::Restructured);
        assert_eq!(options.title, "Report");
    }

    #[test]
    fn unknown_policy_fields_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let policy = dir.path().join("policy.json");
        fs::write(&policy, r#"{"quotas": 2}"#).unwrap();
        let args = parse(&["--docx", "in.docx", "--policy", policy.to_str().unwrap()]);
        assert!(build_options(&args).is_err());
    }

    #[test]
    fn docx_out_copies_input_unless_restructured() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_docx(dir.path(), &["AI today"]);
        let docx_out = dir.path().join("out.docx");
        let args = parse(&[
            "--docx",
            input.to_str().unwrap(),
            "--primary",
            "AI",
            "--docx-out",
            docx_out.to_str().unwrap(),
        ]);

        run(&args).unwrap();
        assert_eq!(fs::read(&docx_out).unwrap(), fs::read(&input).unwrap());
    }

    #[test]
    fn failed_docx_write_leaves_no_html_behind() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_docx(dir.path(), &["AI today"]);
        let html_out = dir.path().join("out.html");
        let docx_out = dir.path().join("missing").join("out.docx");
        let args = parse(&[
            "--docx",
            input.to_str().unwrap(),
            "--html-out",
            html_out.to_str().unwrap(),
            "--docx-out",
            docx_out.to_str().unwrap(),
        ]);

        assert!(run(&args).is_err());
        assert!(!html_out.exists());
        assert!(!staging_path(&html_out).exists());
    }

    #[test]
    fn broken_input_fails_without_writing_html() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.docx");
        fs::write(&input, b"not a zip").unwrap();
        let args = parse(&["--docx", input.to_str().unwrap()]);

        assert!(run(&args).is_err());
        assert!(!dir.path().join("broken.html").exists());
    }
}
