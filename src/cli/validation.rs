use crate::cli::args::CliArgs;
use crate::model::BatteryRange;
use crate::output::OutputFormat;
use crate::ui::Tab;

/// Splits `LABEL=VALUE`; the value may itself contain `=`.
pub fn parse_copy_arg(raw: &str) -> Result<(String, String), String> {
    let (label, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("invalid --copy '{raw}', expected LABEL=VALUE"))?;
    let label = label.trim();
    if label.is_empty() {
        return Err(format!("invalid --copy '{raw}', label is empty"));
    }
    Ok((label.to_string(), value.trim().to_string()))
}

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(raw) = args.battery.as_deref() {
        BatteryRange::parse(raw).map_err(|e| format!("invalid --battery '{raw}': {e}"))?;
    }
    for raw in &args.copy {
        parse_copy_arg(raw)?;
    }
    if let Some(raw) = args.tab.as_deref() {
        if Tab::parse(raw).is_none() {
            return Err(format!(
                "invalid --tab '{raw}', expected search, users or reports"
            ));
        }
    }
    if let Some(raw) = args.output_format.as_deref() {
        if OutputFormat::parse(raw).is_none() {
            return Err(format!(
                "invalid --format '{raw}', expected html, json or text"
            ));
        }
    }
    if args.timeout == Some(0) {
        return Err("invalid --timeout, expected positive integer".to_string());
    }
    if args.rerun == Some(0) {
        return Err("invalid --rerun, entries are numbered from 1".to_string());
    }
    if let Some(year) = args.aue_year {
        if !(2000..=2100).contains(&year) {
            return Err(format!("invalid --aue-year '{year}'"));
        }
    }
    let actions = [
        args.device.is_some(),
        args.user.is_some(),
        args.has_filters(),
        args.rerun.is_some(),
    ];
    if actions.iter().filter(|a| **a).count() > 1 {
        return Err(
            "use only one of --device, --user, --rerun or the advanced search filters".to_string(),
        );
    }
    Ok(())
}
