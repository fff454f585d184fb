use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "fleetview",
    version,
    about = "device and user inventory dashboard client",
    long_about = "Fleetview queries an inventory backend for devices, users and dashboard statistics and renders the results as a self-contained HTML dashboard, a JSON snapshot or a terminal summary.\n\nExamples:\n  fleetview --api-url http://inventory.local:8000 -d 5CD123\n  fleetview -U ada@school.org -o users.html\n  fleetview --status ACTIVE --battery 0-30 --format json\n  fleetview --recent\n\nTip: Use --config to persist the API URL and link settings and keep CLI invocations short."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        short = 'C',
        long = "config",
        visible_alias = "cfg",
        value_name = "FILE",
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.fleetview/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "api-url",
        visible_alias = "api",
        value_name = "URL",
        help_heading = "Input",
        help = "Base URL of the inventory backend."
    )]
    pub api_url: Option<String>,

    #[arg(
        long = "header",
        value_name = "HEADER",
        help_heading = "Input",
        help = "Extra request header forwarded to the backend (\"Key: Value\")."
    )]
    pub header: Option<String>,

    #[arg(
        long = "proxy",
        value_name = "URL",
        help_heading = "Input",
        help = "HTTP proxy for backend requests."
    )]
    pub proxy: Option<String>,

    #[arg(
        long = "timeout",
        value_name = "SECS",
        help_heading = "Input",
        help = "Per-request timeout in seconds (default 30)."
    )]
    pub timeout: Option<u64>,

    #[arg(
        long = "storage",
        value_name = "FILE",
        help_heading = "Input",
        help = "Client-side state file (defaults to ~/.fleetview/storage.json)."
    )]
    pub storage: Option<String>,

    #[arg(
        short = 'd',
        long = "device",
        visible_alias = "search",
        value_name = "QUERY",
        help_heading = "Search",
        help = "Search devices by asset tag, serial number or user."
    )]
    pub device: Option<String>,

    #[arg(
        short = 'U',
        long = "user",
        value_name = "QUERY",
        help_heading = "Search",
        help = "Search users by name, email or student id."
    )]
    pub user: Option<String>,

    #[arg(
        long = "status",
        value_name = "STATUS",
        help_heading = "Advanced Search",
        help = "Filter by device status (ACTIVE, DISABLED, DEPROVISIONED)."
    )]
    pub status: Option<String>,

    #[arg(
        long = "model",
        value_name = "MODEL",
        help_heading = "Advanced Search",
        help = "Filter by device model."
    )]
    pub model: Option<String>,

    #[arg(
        long = "location",
        value_name = "LOCATION",
        help_heading = "Advanced Search",
        help = "Filter by location."
    )]
    pub location: Option<String>,

    #[arg(
        long = "org-unit",
        visible_alias = "ou",
        value_name = "PATH",
        help_heading = "Advanced Search",
        help = "Filter by organizational unit path."
    )]
    pub org_unit: Option<String>,

    #[arg(
        long = "boot-mode",
        value_name = "MODE",
        help_heading = "Advanced Search",
        help = "Filter by boot mode (Verified, Dev)."
    )]
    pub boot_mode: Option<String>,

    #[arg(
        long = "aue-year",
        value_name = "YEAR",
        help_heading = "Advanced Search",
        help = "Filter by auto-update expiration year."
    )]
    pub aue_year: Option<i32>,

    #[arg(
        long = "repair-status",
        value_name = "STATUS",
        help_heading = "Advanced Search",
        help = "Filter by repair ticket status."
    )]
    pub repair_status: Option<String>,

    #[arg(
        long = "battery",
        value_name = "MIN-MAX",
        help_heading = "Advanced Search",
        help = "Filter by battery health range in percent, e.g. 0-30."
    )]
    pub battery: Option<String>,

    #[arg(
        long = "rerun",
        value_name = "N",
        help_heading = "Search",
        help = "Re-run entry N of the recent searches list (see --recent)."
    )]
    pub rerun: Option<usize>,

    #[arg(
        long = "no-widgets",
        help_heading = "Dashboard",
        help = "Skip loading the AUE and security widgets."
    )]
    pub no_widgets: bool,

    #[arg(
        long = "refresh-widgets",
        help_heading = "Dashboard",
        help = "Invalidate the backend widget cache and reload both widgets."
    )]
    pub refresh_widgets: bool,

    #[arg(
        long = "tab",
        value_name = "TAB",
        help_heading = "Dashboard",
        help = "Tab shown when the page opens: search, users or reports."
    )]
    pub tab: Option<String>,

    #[arg(
        long = "toggle-hero",
        help_heading = "Dashboard",
        help = "Collapse or expand the statistics panel and remember the choice."
    )]
    pub toggle_hero: bool,

    #[arg(
        long = "recent",
        help_heading = "History",
        help = "List recent device and user searches."
    )]
    pub recent: bool,

    #[arg(
        long = "clear-history",
        help_heading = "History",
        help = "Forget all recent searches."
    )]
    pub clear_history: bool,

    #[arg(
        long = "copy",
        value_name = "LABEL=VALUE",
        action = ArgAction::Append,
        help_heading = "Clipboard",
        help = "Copy VALUE to the clipboard, reporting it as LABEL (repeatable)."
    )]
    pub copy: Vec<String>,

    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write the dashboard to FILE instead of stdout."
    )]
    pub output: Option<String>,

    #[arg(
        long = "format",
        visible_alias = "output-format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format: html, json or text (inferred from --output when omitted)."
    )]
    pub output_format: Option<String>,

    #[arg(
        long = "no-color",
        visible_alias = "nc",
        help_heading = "Output",
        help = "Disable colored terminal output."
    )]
    pub no_color: bool,
}

impl CliArgs {
    /// True when any advanced-search filter flag was given.
    pub fn has_filters(&self) -> bool {
        self.status.is_some()
            || self.model.is_some()
            || self.location.is_some()
            || self.org_unit.is_some()
            || self.boot_mode.is_some()
            || self.aue_year.is_some()
            || self.repair_status.is_some()
            || self.battery.is_some()
    }
}
