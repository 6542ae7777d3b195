use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use relative_path::RelativePath;

use outline_porter_config::{Config, ImportSettings};
use outline_porter_engine::io::{ScanOptions, write_file};
use outline_porter_engine::parsing::IndentStyle;
use outline_porter_engine::{
    ImportOptions, ImportReport, MemoryHost, NotifyLevel, ParseOptions, RunOutcome, run_import,
};

#[derive(Parser, Debug)]
#[command(
    name = "outline-porter",
    version,
    about = "Import an outliner's Markdown graph into a block store"
)]
struct Cli {
    /// Graph directory to import. Defaults to `source_path` from the config file
    source: Option<PathBuf>,

    /// Where to write document.json, report.json and the uploaded assets
    #[arg(short, long, default_value = "outline-porter-out")]
    out: PathBuf,

    /// Pages per batch
    #[arg(long)]
    batch_size: Option<usize>,

    /// Pause between pages, in milliseconds
    #[arg(long)]
    page_delay_ms: Option<u64>,

    /// Config file to use instead of the default location
    #[arg(long, env = "OUTLINE_PORTER_CONFIG")]
    config: Option<PathBuf>,
}

fn import_options(settings: &ImportSettings, cli: &Cli) -> ImportOptions {
    let mut settings = settings.clone();
    if let Some(batch_size) = cli.batch_size {
        settings.batch_size = batch_size;
    }
    if let Some(page_delay_ms) = cli.page_delay_ms {
        settings.page_delay_ms = page_delay_ms;
    }
    ImportOptions {
        batch_size: settings.batch_size(),
        page_delay: Duration::from_millis(settings.page_delay_ms),
        parse: ParseOptions {
            indent: IndentStyle::new(settings.indent_width),
        },
        assets_prefix: settings.assets_prefix.clone(),
        assets_dir: settings.assets_dir.clone(),
        scan: ScanOptions {
            extensions: settings.note_extensions.clone(),
            skip_dirs: settings.skip_dirs.clone(),
        },
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);
    log::debug!("Config path: {}", config_path.display());
    let config = Config::load_from_path(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    Ok(config.unwrap_or_default())
}

/// Mirrors what the host would have shown the user.
fn replay_notifications(host: &MemoryHost) {
    for (level, message) in host.notifications() {
        match level {
            NotifyLevel::Info | NotifyLevel::Success => log::info!("{message}"),
            NotifyLevel::Warn => log::warn!("{message}"),
            NotifyLevel::Error => log::error!("{message}"),
        }
    }
}

fn write_output(out: &Path, host: &MemoryHost, report: &ImportReport) -> anyhow::Result<()> {
    let document = serde_json::to_vec_pretty(&host.document())?;
    write_file(RelativePath::new("document.json"), out, document)
        .context("writing document.json")?;
    write_file(
        RelativePath::new("report.json"),
        out,
        serde_json::to_vec_pretty(report)?,
    )
    .context("writing report.json")?;

    for asset in host.assets() {
        write_file(RelativePath::new(&asset.path), out, &asset.bytes)
            .with_context(|| format!("writing asset {}", asset.path))?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let Some(source) = cli.source.clone().or(config.source_path.clone()) else {
        bail!(
            "no source directory given and none configured in {}",
            Config::config_path().display()
        );
    };
    log::info!("Importing {}", source.display());

    let options = import_options(&config.import, &cli);
    let host = MemoryHost::new();
    let report = run_import(&source, &host, &options).await;
    replay_notifications(&host);

    write_output(&cli.out, &host, &report)?;
    log::info!(
        "{} blocks and {} assets written to {}",
        report.blocks_created,
        report.assets_uploaded,
        cli.out.display()
    );

    if let RunOutcome::Aborted { message } = &report.outcome {
        bail!("import aborted: {message}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("outline-porter").chain(args.iter().copied()))
    }

    #[test]
    fn flags_override_config() {
        let settings = ImportSettings {
            batch_size: 20,
            page_delay_ms: 5,
            indent_width: 4,
            ..ImportSettings::default()
        };

        let options = import_options(&settings, &cli(&["graph", "--batch-size", "3"]));

        assert_eq!(options.batch_size, 3);
        assert_eq!(options.page_delay, Duration::from_millis(5));
        assert_eq!(options.parse.indent, IndentStyle::new(4));
    }

    #[test]
    fn zero_batch_size_flag_is_clamped() {
        let options = import_options(
            &ImportSettings::default(),
            &cli(&["graph", "--batch-size", "0"]),
        );
        assert_eq!(options.batch_size, 1);
    }

    #[test]
    fn explicit_config_file_is_read() {
        let dir = TempDir::new().unwrap();
        let config_file = dir.path().join("porter.toml");
        fs::write(&config_file, "source_path = \"/graphs/a\"\n[import]\nbatch_size = 7\n").unwrap();

        let config = load_config(&cli(&["--config", config_file.to_str().unwrap()])).unwrap();

        assert_eq!(config.source_path, Some(PathBuf::from("/graphs/a")));
        assert_eq!(config.import.batch_size, 7);
    }

    #[tokio::test]
    async fn writes_document_report_and_assets() {
        let graph = TempDir::new().unwrap();
        fs::create_dir_all(graph.path().join("pages")).unwrap();
        fs::create_dir_all(graph.path().join("assets")).unwrap();
        fs::write(graph.path().join("pages/Foo.md"), "- hi ![p](../assets/p.png)").unwrap();
        fs::write(graph.path().join("assets/p.png"), b"png").unwrap();
        let out = TempDir::new().unwrap();

        let host = MemoryHost::new();
        let options = ImportOptions {
            page_delay: Duration::ZERO,
            ..ImportOptions::default()
        };
        let report = run_import(graph.path(), &host, &options).await;
        write_output(out.path(), &host, &report).unwrap();

        let document: serde_json::Value =
            serde_json::from_slice(&fs::read(out.path().join("document.json")).unwrap()).unwrap();
        assert_eq!(document[0]["content"][0]["v"], "Foo");
        assert_eq!(fs::read(out.path().join("assets/p.png")).unwrap(), b"png");
        assert!(out.path().join("report.json").exists());
    }
}
