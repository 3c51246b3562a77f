use clap::Parser;
use pcbcheck::image::io::resolve_test_path;
use pcbcheck::{GlobalConfig, InspectionReport, Inspector, RoiStore, Workspace};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "PCB component presence inspection (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// List the ROIs in the workspace store and exit.
    #[arg(long)]
    list_rois: bool,
    /// Exit with status 1 when the overall result is NG.
    #[arg(long)]
    fail_on_ng: bool,
    /// Enable tracing output for each inspection stage.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    golden_path: String,
    test_path: String,
    test_folder: Option<String>,
    use_latest_in_folder: bool,
    workspace_dir: String,
    write_artifacts: bool,
    /// Where to write the JSON report; defaults to `result.json` in the
    /// workspace.
    output_path: Option<String>,
    inspection: GlobalConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            golden_path: String::new(),
            test_path: String::new(),
            test_folder: None,
            use_latest_in_folder: false,
            workspace_dir: ".".to_string(),
            write_artifacts: true,
            output_path: None,
            inspection: GlobalConfig::default(),
        }
    }
}

impl Config {
    fn test_image(&self) -> PathBuf {
        let folder = self
            .test_folder
            .as_deref()
            .filter(|_| self.use_latest_in_folder)
            .map(Path::new);
        resolve_test_path(Path::new(&self.test_path), folder)
    }
}

fn list_rois(store: &RoiStore) -> Result<(), Box<dyn std::error::Error>> {
    let rois = store.load()?;
    println!("{} ROI(s) in {}", rois.len(), store.path().display());
    for (position, roi) in rois.iter().enumerate() {
        let r = roi.rect;
        println!(
            "#{} {} at {},{} {}x{}{}",
            position + 1,
            roi.name,
            r.x,
            r.y,
            r.width,
            r.height,
            if roi.overrides.is_empty() {
                ""
            } else {
                " (overrides)"
            }
        );
    }
    Ok(())
}

fn print_report(report: &InspectionReport) {
    for verdict in &report.verdicts {
        let line = InspectionReport::roi_line(verdict);
        tracing::info!("{line}");
        println!("{line}");
    }
    let summary = report.summary_line();
    tracing::info!("{summary}");
    println!("{summary}");
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("pcbcheck=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(ExitCode::SUCCESS);
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    let workspace = Workspace::new(&config.workspace_dir);

    if cli.list_rois {
        list_rois(&workspace.store())?;
        return Ok(ExitCode::SUCCESS);
    }

    if config.golden_path.is_empty() {
        return Err("golden_path must be set in the config".into());
    }
    let test_path = config.test_image();
    if test_path.as_os_str().is_empty() {
        return Err("test_path (or test_folder with use_latest_in_folder) must be set".into());
    }
    tracing::info!("golden={} test={}", config.golden_path, test_path.display());

    let rois = workspace.store().load()?;
    let inspector = Inspector::new(config.inspection.clone());
    let inspection =
        inspector.inspect_paths(Path::new(&config.golden_path), &test_path, &rois, &workspace)?;

    if config.write_artifacts {
        inspection.write_artifacts(&workspace)?;
    }
    print_report(&inspection.report);

    let json = serde_json::to_string_pretty(&inspection.report)?;
    let output = config
        .output_path
        .map(PathBuf::from)
        .unwrap_or_else(|| workspace.report_path());
    fs::write(output, json)?;

    if cli.fail_on_ng && !inspection.report.overall {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::{Config, EXAMPLE_JSON};

    #[test]
    fn example_config_parses() {
        let config: Config = serde_json::from_str(EXAMPLE_JSON).unwrap();
        assert_eq!(config.golden_path, "golden.png");
        assert!(config.inspection.validate().is_ok());
    }

    #[test]
    fn latest_in_folder_needs_flag() {
        let config: Config = serde_json::from_str(
            r#"{"test_path": "a.png", "test_folder": "/no/such/dir", "use_latest_in_folder": true}"#,
        )
        .unwrap();
        assert_eq!(config.test_image(), std::path::PathBuf::from("a.png"));
    }
}
