use std::collections::HashMap;
use std::path::PathBuf;

use clap::{error::ErrorKind, CommandFactory, Parser};
use colored::Colorize;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::api::{self, ApiClient, ApiConfig};
use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::fetch;
use crate::model::{AdvancedSearchFilters, BatteryRange};
use crate::output::{self, DashboardSnapshot, OutputFormat};
use crate::render::{Links, RenderContext, DEFAULT_GOOGLE_ADMIN_URL, DEFAULT_IIQ_URL};
use crate::storage::FileStore;
use crate::ui::toast::{ToastLevel, ToastQueue};
use crate::ui::{Tab, UiController};

fn print_banner() {
    eprintln!(
        "{} v{} - inventory dashboard client",
        "fleetview".bold(),
        env!("CARGO_PKG_VERSION")
    );
    eprintln!();
}

// Status lines go to stderr; stdout carries the rendered dashboard.
fn format_kv_line(label: &str, value: &str) {
    eprintln!(":: {:<10}: {}", label, value);
}

fn render_custom_help() -> String {
    let cmd = CliArgs::command();
    let mut out = String::new();

    out.push_str(cmd.get_name());
    if let Some(version) = cmd.get_version() {
        out.push(' ');
        out.push_str(version);
    }
    out.push('\n');

    if let Some(about) = cmd.get_about() {
        out.push_str(&about.to_string());
        out.push('\n');
    }

    if let Some(long_about) = cmd.get_long_about() {
        out.push('\n');
        out.push_str(&long_about.to_string());
        out.push('\n');
    }

    out.push('\n');
    out.push_str("Usage: ");
    out.push_str(cmd.get_name());
    out.push_str(" [OPTIONS]\n\n");

    let mut sections: Vec<(String, Vec<&clap::Arg>)> = Vec::new();
    let mut section_idx: HashMap<String, usize> = HashMap::new();

    for arg in cmd.get_arguments() {
        if arg.is_hide_set() {
            continue;
        }

        let heading = arg.get_help_heading().unwrap_or("Options").to_string();
        let idx = match section_idx.get(&heading).copied() {
            Some(i) => i,
            None => {
                sections.push((heading.clone(), Vec::new()));
                let i = sections.len() - 1;
                section_idx.insert(heading, i);
                i
            }
        };
        sections[idx].1.push(arg);
    }

    for (heading, args) in sections {
        out.push_str(&heading);
        out.push_str(":\n");

        for arg in args {
            let mut parts: Vec<String> = Vec::new();
            if let Some(short) = arg.get_short() {
                parts.push(format!("-{short}"));
            }
            if let Some(long) = arg.get_long() {
                parts.push(format!("--{long}"));
            }
            if let Some(aliases) = arg.get_visible_aliases() {
                for alias in aliases {
                    let rendered = format!("--{alias}");
                    if !parts.iter().any(|p| p == &rendered) {
                        parts.push(rendered);
                    }
                }
            }

            let mut flags = parts.join(", ");
            if arg.get_action().takes_values() {
                let value_name = arg
                    .get_value_names()
                    .and_then(|names| names.first())
                    .map(|name| name.as_str())
                    .unwrap_or("VALUE");
                flags.push_str(&format!(" <{value_name}>"));
            }

            out.push_str("  ");
            out.push_str(&flags);
            out.push('\n');

            if let Some(help) = arg.get_help() {
                let help = help.to_string();
                if !help.trim().is_empty() {
                    out.push_str("          ");
                    out.push_str(help.trim());
                    out.push('\n');
                }
            }
            out.push('\n');
        }
    }

    out
}

fn format_bool(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// What this invocation searches for. At most one per run.
#[derive(Clone, Debug, PartialEq)]
enum SearchAction {
    Devices(String),
    Users(String),
    Advanced(AdvancedSearchFilters),
    Rerun(usize),
}

impl SearchAction {
    fn describe(&self) -> String {
        match self {
            Self::Devices(q) => format!("devices '{q}'"),
            Self::Users(q) => format!("users '{q}'"),
            Self::Advanced(filters) => format!("advanced [{}]", filters.describe().join(", ")),
            Self::Rerun(n) => format!("recent #{n}"),
        }
    }
}

#[derive(Clone, Debug)]
struct RunConfig {
    api: ApiConfig,
    storage_path: PathBuf,
    render: RenderContext,
    output: Option<String>,
    output_format: OutputFormat,
    no_color: bool,
    widgets: bool,
    refresh_widgets: bool,
    search: Option<SearchAction>,
    tab: Option<Tab>,
    toggle_hero: bool,
    recent: bool,
    clear_history: bool,
    copies: Vec<(String, String)>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn filters_from_args(args: &CliArgs) -> Result<AdvancedSearchFilters, String> {
    let battery = match args.battery.as_deref() {
        Some(raw) => Some(
            BatteryRange::parse(raw).map_err(|e| format!("invalid --battery '{raw}': {e}"))?,
        ),
        None => None,
    };
    Ok(AdvancedSearchFilters {
        status: non_empty(args.status.clone()),
        model: non_empty(args.model.clone()),
        location: non_empty(args.location.clone()),
        org_unit: non_empty(args.org_unit.clone()),
        boot_mode: non_empty(args.boot_mode.clone()),
        aue_year: args.aue_year,
        repair_status: non_empty(args.repair_status.clone()),
        battery,
    })
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = args.no_color || cfg.no_color.unwrap_or(false);
    let widgets = !args.no_widgets && cfg.widgets.unwrap_or(true);

    let header = non_empty(args.header.clone().or(cfg.header));
    if let Some(raw) = header.as_deref() {
        api::parse_header(raw).map_err(|e| e.to_string())?;
    }
    let api = ApiConfig {
        base_url: non_empty(args.api_url.clone().or(cfg.api_url))
            .unwrap_or_else(|| api::DEFAULT_API_URL.to_string()),
        timeout_secs: args
            .timeout
            .or(cfg.timeout)
            .unwrap_or(api::DEFAULT_TIMEOUT_SECS),
        proxy: non_empty(args.proxy.clone().or(cfg.proxy)),
        header,
    };
    if api.timeout_secs == 0 {
        return Err("invalid timeout, expected positive integer".to_string());
    }

    let storage_path = args
        .storage
        .clone()
        .or(cfg.storage)
        .map(|p| config::expand_tilde(&p))
        .unwrap_or_else(config::default_storage_path);

    let render = RenderContext {
        links: Links {
            iiq_base: cfg.iiq_url.unwrap_or_else(|| DEFAULT_IIQ_URL.to_string()),
            google_admin_base: cfg
                .google_admin_url
                .unwrap_or_else(|| DEFAULT_GOOGLE_ADMIN_URL.to_string()),
        },
        trusted_wan_prefix: cfg
            .trusted_wan_prefix
            .unwrap_or_else(|| RenderContext::default().trusted_wan_prefix),
    };

    let output = args
        .output
        .clone()
        .or(cfg.output)
        .map(|p| config::expand_tilde_string(&p));
    let explicit_format = match args.output_format.clone().or(cfg.output_format) {
        Some(raw) => Some(
            OutputFormat::parse(&raw).ok_or_else(|| format!("invalid output format '{raw}'"))?,
        ),
        None => None,
    };
    let output_format = explicit_format
        .or_else(|| output.as_deref().and_then(output::infer_format_from_path))
        .unwrap_or(if output.is_some() {
            OutputFormat::Html
        } else {
            OutputFormat::Text
        });

    let search = if let Some(query) = args.device.clone() {
        Some(SearchAction::Devices(query))
    } else if let Some(query) = args.user.clone() {
        Some(SearchAction::Users(query))
    } else if args.has_filters() {
        Some(SearchAction::Advanced(filters_from_args(&args)?))
    } else {
        args.rerun.map(SearchAction::Rerun)
    };

    let tab = args.tab.as_deref().and_then(Tab::parse);

    let copies = args
        .copy
        .iter()
        .map(|raw| validation::parse_copy_arg(raw))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RunConfig {
        api,
        storage_path,
        render,
        output,
        output_format,
        no_color,
        widgets,
        refresh_widgets: args.refresh_widgets,
        search,
        tab,
        toggle_hero: args.toggle_hero,
        recent: args.recent,
        clear_history: args.clear_history,
        copies,
    })
}

fn print_recent(ui: &UiController<FileStore>) {
    let recent = ui.recent_searches();
    if recent.is_empty() {
        println!("No recent searches");
        return;
    }
    for (i, entry) in recent.iter().enumerate() {
        println!(
            "{:>3}. [{}] {}  {}",
            i + 1,
            entry.kind.label(),
            entry.query.bold(),
            entry.timestamp.format("%Y-%m-%d %H:%M UTC")
        );
    }
}

async fn write_output(run: &RunConfig, rendered: &[u8]) -> Result<(), String> {
    match run.output.as_ref() {
        Some(path) => {
            let mut outfile = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(path)
                .await
                .map_err(|e| format!("failed to open output file: {e}"))?;
            outfile
                .write_all(rendered)
                .await
                .map_err(|_| "failed to write output file".to_string())?;
            log::info!("wrote {} bytes to {path}", rendered.len());
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(rendered)
                .await
                .map_err(|e| format!("failed to write to stdout: {e}"))?;
            stdout
                .flush()
                .await
                .map_err(|e| format!("failed to write to stdout: {e}"))?;
        }
    }
    Ok(())
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }

    let storage = FileStore::open(run.storage_path.clone());
    let mut ui = UiController::new(storage).with_toasts(ToastQueue::echoing());

    if run.clear_history {
        ui.clear_history()
            .map_err(|e| format!("failed to clear search history: {e}"))?;
        ui.notify(ToastLevel::Info, "Search history cleared");
    }
    if run.toggle_hero {
        let collapsed = ui
            .toggle_hero()
            .map_err(|e| format!("failed to save panel state: {e}"))?;
        log::info!("hero panel collapsed={collapsed}");
    }

    // Listing history needs no backend.
    if run.recent && run.search.is_none() {
        print_recent(&ui);
        return Ok(());
    }

    print_banner();
    format_kv_line("API", &run.api.base_url);
    format_kv_line(
        "HTTP",
        &format!(
            "timeout={}s proxy={} header={}",
            run.api.timeout_secs,
            if run.api.proxy.is_some() { "on" } else { "off" },
            if run.api.header.is_some() { "on" } else { "off" },
        ),
    );
    format_kv_line(
        "Dashboard",
        &format!(
            "widgets={} refresh={} hero={}",
            format_bool(run.widgets),
            format_bool(run.refresh_widgets),
            if ui.hero_collapsed() {
                "collapsed"
            } else {
                "expanded"
            }
        ),
    );
    if let Some(search) = run.search.as_ref() {
        format_kv_line("Search", &search.describe());
    }
    format_kv_line("Storage", &run.storage_path.display().to_string());
    eprintln!();

    let client = ApiClient::new(&run.api).map_err(|e| e.to_string())?;

    fetch::initialize(&client, &mut ui, run.widgets).await;
    if run.refresh_widgets {
        fetch::refresh_widgets(&client, &mut ui).await;
    }

    match run.search.as_ref() {
        Some(SearchAction::Devices(query)) => {
            fetch::search_devices(&client, &mut ui, query).await;
        }
        Some(SearchAction::Users(query)) => {
            fetch::search_users(&client, &mut ui, query).await;
        }
        Some(SearchAction::Advanced(filters)) => {
            fetch::advanced_search(&client, &mut ui, filters).await;
        }
        Some(SearchAction::Rerun(n)) => {
            fetch::rerun(&client, &mut ui, n.saturating_sub(1)).await;
        }
        None => {}
    }

    for (label, value) in run.copies.iter() {
        ui.copy_to_clipboard(label, value);
    }

    if let Some(tab) = run.tab {
        ui.switch_tab(tab);
    }

    if run.recent {
        print_recent(&ui);
    }

    let snapshot = DashboardSnapshot::capture(&ui);
    let rendered = output::render(run.output_format, &snapshot, &run.render);
    write_output(&run, &rendered).await?;

    if let Some(path) = run.output.as_ref() {
        eprintln!();
        eprintln!(":: Completed :: dashboard written to {path} ::");
    }
    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .try_init();
}

fn load_config_for(args: &CliArgs) -> Result<ConfigFile, String> {
    if let Some(path) = args.config.as_deref() {
        return config::load_config(&config::expand_tilde(path), false);
    }
    let Some(path) = config::default_config_path() else {
        return Ok(ConfigFile::default());
    };
    if let Err(e) = config::ensure_default_config_file(&path) {
        log::warn!("{e}");
    }
    config::load_config(&path, true)
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp => {
                print!("{}", render_custom_help());
                return Ok(());
            }
            ErrorKind::DisplayVersion => {
                let cmd = CliArgs::command();
                print!("{}", cmd.render_version());
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    init_logging(args.verbose);

    let cfg = load_config_for(&args)?;
    let run = build_run_config(args, cfg)?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))
}

#[cfg(test)]
mod cli_tests {
    use super::*;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["fleetview"];
        argv.extend_from_slice(extra);
        CliArgs::parse_from(argv)
    }

    #[test]
    fn defaults_without_config() {
        let run = build_run_config(args(&[]), ConfigFile::default()).unwrap();
        assert_eq!(run.api.base_url, api::DEFAULT_API_URL);
        assert_eq!(run.api.timeout_secs, api::DEFAULT_TIMEOUT_SECS);
        assert!(run.widgets);
        assert_eq!(run.output_format, OutputFormat::Text);
        assert!(run.search.is_none());
        assert_eq!(run.render.links.iiq_base, DEFAULT_IIQ_URL);
    }

    #[test]
    fn cli_overrides_config() {
        let cfg = ConfigFile {
            api_url: Some("http://config.local:8000".to_string()),
            timeout: Some(5),
            widgets: Some(false),
            iiq_url: Some("https://iiq.example.org".to_string()),
            ..ConfigFile::default()
        };
        let run = build_run_config(
            args(&["--api-url", "http://cli.local:9000", "--timeout", "12"]),
            cfg,
        )
        .unwrap();
        assert_eq!(run.api.base_url, "http://cli.local:9000");
        assert_eq!(run.api.timeout_secs, 12);
        assert!(!run.widgets);
        assert_eq!(run.render.links.iiq_base, "https://iiq.example.org");
    }

    #[test]
    fn output_format_resolution() {
        let run = build_run_config(args(&["-o", "out.json"]), ConfigFile::default()).unwrap();
        assert_eq!(run.output_format, OutputFormat::Json);

        let run = build_run_config(args(&["-o", "dashboard"]), ConfigFile::default()).unwrap();
        assert_eq!(run.output_format, OutputFormat::Html);

        let run = build_run_config(
            args(&["-o", "out.json", "--format", "text"]),
            ConfigFile::default(),
        )
        .unwrap();
        assert_eq!(run.output_format, OutputFormat::Text);
    }

    #[test]
    fn advanced_filters_become_one_search() {
        let run = build_run_config(
            args(&["--status", "ACTIVE", "--battery", "0-30", "--model", "  "]),
            ConfigFile::default(),
        )
        .unwrap();
        let Some(SearchAction::Advanced(filters)) = run.search else {
            panic!("expected advanced search");
        };
        assert_eq!(filters.status.as_deref(), Some("ACTIVE"));
        assert_eq!(filters.battery, Some(BatteryRange { min: 0, max: 30 }));
        assert!(filters.model.is_none());
    }

    #[test]
    fn bad_header_is_rejected() {
        assert!(build_run_config(args(&["--header", "no colon"]), ConfigFile::default()).is_err());
        let run = build_run_config(
            args(&["--header", "Authorization: Bearer t", "--copy", "Serial=5CD1"]),
            ConfigFile::default(),
        )
        .unwrap();
        assert_eq!(run.copies, vec![("Serial".to_string(), "5CD1".to_string())]);
    }

    #[test]
    fn rerun_and_tab() {
        let run = build_run_config(
            args(&["--rerun", "2", "--tab", "reports", "--no-widgets"]),
            ConfigFile::default(),
        )
        .unwrap();
        assert_eq!(run.search, Some(SearchAction::Rerun(2)));
        assert_eq!(run.tab, Some(Tab::Reports));
        assert!(!run.widgets);
    }
}
