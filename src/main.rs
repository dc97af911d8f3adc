use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use foreign_html::styles::{document_styles, load_styles};
use foreign_html::{Dimensions, ForeignHtmlRenderer, RenderConfig};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Raw PNG bytes
    Png,
    /// `data:image/png;base64,...`
    PngDataUri,
    /// `data:image/svg+xml;base64,...` (no rasterization)
    SvgDataUri,
}

/// Render an HTML fragment and its CSS into an image via SVG foreignObject
#[derive(Debug, Parser)]
#[command(name = "foreign-html", version, about)]
struct Cli {
    /// HTML fragment to render ("-" reads stdin)
    #[arg(long, default_value = "-")]
    html: String,

    /// Stylesheet file, applied in the order given
    #[arg(long = "css", value_name = "PATH")]
    css: Vec<PathBuf>,

    /// Take the <style> and <link rel="stylesheet"> sheets of this page
    #[arg(long, value_name = "PATH")]
    styles_from: Option<PathBuf>,

    /// Base URL for relative references (defaults to the HTML file's directory)
    #[arg(long)]
    base_url: Option<String>,

    /// Image width in pixels
    #[arg(long, requires = "height")]
    width: Option<u32>,

    /// Image height in pixels
    #[arg(long, requires = "width")]
    height: Option<u32>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Png)]
    format: OutputFormat,

    /// Output file (stdout when omitted)
    #[arg(long, short)]
    out: Option<PathBuf>,

    /// Per-request timeout in milliseconds
    #[arg(long, default_value_t = 30000)]
    timeout_ms: u64,

    /// Maximum concurrent requests per phase (0 = unbounded)
    #[arg(long, default_value_t = 0)]
    concurrency: usize,

    #[arg(long)]
    user_agent: Option<String>,

    /// Extra request header as "Name: value"
    #[arg(long = "header", value_name = "HEADER")]
    headers: Vec<String>,
}

async fn read_html(source: &str) -> anyhow::Result<String> {
    if source == "-" {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("Failed to read HTML from stdin")?;
        return Ok(buf);
    }
    tokio::fs::read_to_string(source)
        .await
        .with_context(|| format!("Failed to read HTML from {}", source))
}

fn directory_url(path: &Path) -> Option<String> {
    let dir = std::fs::canonicalize(path).ok()?.parent()?.to_path_buf();
    url::Url::from_directory_path(dir).ok().map(|u| u.to_string())
}

fn build_config(cli: &Cli) -> anyhow::Result<RenderConfig> {
    let mut config = RenderConfig {
        timeout_ms: cli.timeout_ms,
        fetch_concurrency: cli.concurrency,
        ..Default::default()
    };
    if let Some(ua) = &cli.user_agent {
        config.user_agent = ua.clone();
    }
    for header in &cli.headers {
        let Some((name, value)) = header.split_once(':') else {
            bail!("Invalid header '{}', expected \"Name: value\"", header);
        };
        config.headers.insert(name.trim().to_string(), value.trim().to_string());
    }
    config.base_url = match &cli.base_url {
        Some(b) => Some(b.clone()),
        None if cli.html != "-" => directory_url(Path::new(&cli.html)),
        None => None,
    };
    if let (Some(w), Some(h)) = (cli.width, cli.height) {
        config.dimensions = Dimensions::new(w, h);
    }
    Ok(config)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = build_config(&cli)?;
    log::debug!("config: {:?}", config);

    let mut styles = Vec::new();
    if let Some(page) = &cli.styles_from {
        let text = tokio::fs::read_to_string(page)
            .await
            .with_context(|| format!("Failed to read {}", page.display()))?;
        let refs = document_styles(&text)?;
        let page_fetcher = foreign_html::HttpFetcher::new(&RenderConfig {
            base_url: config.base_url.clone().or_else(|| directory_url(page)),
            ..config.clone()
        })?;
        styles.extend(load_styles(&refs, &page_fetcher, config.fetch_concurrency).await?);
    }
    for path in &cli.css {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read stylesheet {}", path.display()))?;
        styles.push(text);
    }
    let renderer = ForeignHtmlRenderer::new(styles, config)?;

    let html = read_html(&cli.html).await?;

    let bytes = match cli.format {
        OutputFormat::Png => renderer.render_to_png(&html, None).await?,
        OutputFormat::PngDataUri => renderer.render_to_base64_png(&html, None).await?.into_bytes(),
        OutputFormat::SvgDataUri => renderer.build_svg_data_uri(&html, None).await?.into_bytes(),
    };

    match &cli.out {
        Some(path) => {
            tokio::fs::write(path, &bytes)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("wrote {} bytes to {}", bytes.len(), path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            out.write_all(&bytes)?;
            out.flush()?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("foreign-html: {:#}", e);
        std::process::exit(1);
    }
}
