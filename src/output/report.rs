use crate::model::PanelState;
use crate::render::device::device_results;
use crate::render::format::format_count;
use crate::render::html::{el, Element, Node};
use crate::render::user::user_results;
use crate::render::widgets::{aue_widget, security_widget, stats_widget};
use crate::render::RenderContext;
use crate::ui::Tab;

use super::DashboardSnapshot;

fn json_for_script_tag(value: &str) -> String {
    value.replace("</", "<\\/")
}

/// Panel body for one fetch state; `ready` only runs for loaded data.
fn panel<T>(
    state: &PanelState<T>,
    container_id: &'static str,
    loading: &str,
    idle: &str,
    ready: impl FnOnce(&T) -> Node,
) -> Node {
    let container = el("div").id(container_id).attr("data-state", state.label());
    let body: Node = match state {
        PanelState::Idle => el("div").class("panel-hint").text(idle).into(),
        PanelState::Loading => el("div")
            .class("panel-loading")
            .child(el("div").class("loading-spinner"))
            .child(el("div").class("loading-text").text(loading))
            .into(),
        PanelState::Empty(message) => el("div").class("no-results").text(message.clone()).into(),
        PanelState::Failed(message) => el("div")
            .class("error-message")
            .attr("role", "alert")
            .text(message.clone())
            .into(),
        PanelState::Ready(value) => ready(value),
    };
    container.child(body).into()
}

fn tab_bar(active: Tab) -> Node {
    el("nav")
        .class("tab-bar")
        .attr("role", "tablist")
        .children(Tab::ALL.iter().map(|tab| {
            let is_active = *tab == active;
            el("button")
                .class(if is_active { "tab-btn active" } else { "tab-btn" })
                .attr("type", "button")
                .attr("role", "tab")
                .attr("data-tab", tab.key())
                .attr("aria-selected", is_active.to_string())
                .text(tab.label())
        }))
        .into()
}

fn tab_panel(tab: Tab, active: Tab) -> Element {
    let is_active = tab == active;
    el("section")
        .id(format!("{}Tab", tab.key()))
        .class(if is_active {
            "tab-content active"
        } else {
            "tab-content"
        })
        .attr("role", "tabpanel")
        .attr_if(!is_active, "hidden", "hidden")
}

fn hero(snapshot: &DashboardSnapshot) -> Node {
    let collapsed = snapshot.hero_collapsed;
    el("section")
        .id("hero")
        .class(if collapsed { "hero collapsed" } else { "hero" })
        .attr("data-collapsed", collapsed.to_string())
        .child(
            el("div")
                .class("hero-header")
                .child(el("h1").class("hero-title").text("Device Inventory"))
                .child(
                    el("button")
                        .id("heroToggle")
                        .class("hero-toggle")
                        .attr("type", "button")
                        .attr("aria-expanded", (!collapsed).to_string())
                        .text(if collapsed { "\u{25B8}" } else { "\u{25BE}" }),
                ),
        )
        .child(
            el("div")
                .class("hero-body")
                .child(stats_widget(&snapshot.data.stats)),
        )
        .into()
}

fn recent_searches(snapshot: &DashboardSnapshot) -> Node {
    let list = if snapshot.recent_searches.is_empty() {
        el("div").class("panel-hint").text("No recent searches")
    } else {
        el("ol")
            .class("recent-list")
            .children(snapshot.recent_searches.iter().map(|entry| {
                el("li")
                    .class("recent-item")
                    .attr("data-kind", entry.kind.label())
                    .child(
                        el("span")
                            .class(format!("recent-kind recent-kind-{}", entry.kind.label()))
                            .text(entry.kind.label()),
                    )
                    .child(el("span").class("recent-query").text(entry.query.clone()))
                    .child(
                        el("time")
                            .class("recent-time")
                            .attr("datetime", entry.timestamp.to_rfc3339())
                            .text(entry.timestamp.format("%Y-%m-%d %H:%M UTC").to_string()),
                    )
            }))
    };
    el("div")
        .class("recent-searches")
        .id("recentSearches")
        .child(el("h3").class("panel-title").text("Recent Searches"))
        .child(list)
        .into()
}

fn search_info(lines: &[String]) -> Node {
    el("div")
        .id("searchInfo")
        .class("search-info")
        .children(lines.iter().map(|line| el("div").text(line.clone())))
        .into()
}

fn toasts(snapshot: &DashboardSnapshot) -> Node {
    el("div")
        .id("toastContainer")
        .class("toast-container")
        .attr("aria-live", "polite")
        .children(snapshot.toasts.iter().map(|t| {
            el("div")
                .class(t.level.css_class())
                .attr("data-toast-id", t.id.to_string())
                .text(t.message.clone())
        }))
        .into()
}

/// Dashboard body: hero, tab bar, the three tab panels and the toast container.
pub fn render_body(snapshot: &DashboardSnapshot, ctx: &RenderContext) -> Node {
    let data = &snapshot.data;
    let active = snapshot.active_tab;

    let devices = panel(
        &data.devices,
        "resultsContainer",
        "Searching devices...",
        "Search by asset tag, serial number or user to see devices.",
        |devices| device_results(devices, ctx, crate::fetch::NO_DEVICES),
    );
    let users = panel(
        &data.users,
        "userResultsContainer",
        "Searching users...",
        "Search by name, email or student id to see users.",
        |users| user_results(users, ctx),
    );

    let search = tab_panel(Tab::Search, active)
        .child(recent_searches(snapshot))
        .child(search_info(&snapshot.search_info))
        .child(devices);
    let user_tab = tab_panel(Tab::Users, active).child(users);
    let reports = tab_panel(Tab::Reports, active)
        .child(
            el("div")
                .class("widgets-header")
                .child(el("h2").text("Reports"))
                .child(
                    el("span")
                        .class("widgets-generated")
                        .text(format!(
                            "Generated {}",
                            snapshot.generated_at.format("%Y-%m-%d %H:%M UTC")
                        )),
                ),
        )
        .child(
            el("div")
                .class("widgets-grid")
                .child(aue_widget(&data.aue, snapshot.current_year()))
                .child(security_widget(&data.security)),
        );

    el("main")
        .class("dashboard")
        .child(hero(snapshot))
        .child(tab_bar(active))
        .child(search)
        .child(user_tab)
        .child(reports)
        .child(toasts(snapshot))
        .into()
}

pub fn render_html(snapshot: &DashboardSnapshot, ctx: &RenderContext) -> Vec<u8> {
    let json = serde_json::to_string(snapshot).unwrap_or_else(|_| "{}".to_string());
    let json = json_for_script_tag(&json);
    let body = render_body(snapshot, ctx).render();
    let device_count = snapshot
        .data
        .devices
        .ready()
        .map(|d| format_count(d.len() as u64))
        .unwrap_or_else(|| "0".to_string());

    let html = format!(
        r####"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8"/>
  <meta content="width=device-width, initial-scale=1.0" name="viewport"/>
  <meta name="fleetview-devices" content="{device_count}"/>
  <title>Fleetview Dashboard</title>
  <style>
    body {{ margin: 0; min-height: 100vh; background: #f8fafc; color: #0f172a; font-family: system-ui, -apple-system, 'Segoe UI', Roboto, sans-serif; }}
    .page-header {{ position: sticky; top: 0; z-index: 50; padding: 16px 32px; background: #fff; border-bottom: 1px solid #e2e8f0; }}
    .page-header h2 {{ margin: 0; font-size: 1.25rem; }}
    .dashboard {{ max-width: 1440px; margin: 0 auto; padding: 24px; }}
    .hero.collapsed .hero-body {{ display: none; }}
    .stats-grid {{ display: grid; grid-template-columns: repeat(auto-fit, minmax(140px, 1fr)); gap: 12px; }}
    .stat-card {{ padding: 16px; border-radius: 12px; background: rgba(19, 91, 236, 0.06); }}
    .stat-value {{ font-size: 1.75rem; font-weight: 700; }}
    .tab-bar {{ display: flex; gap: 8px; margin: 24px 0 16px; }}
    .tab-btn {{ padding: 8px 16px; border-radius: 8px; font-weight: 600; }}
    .tab-btn.active {{ background: #135bec; color: #fff; }}
    .tab-content[hidden] {{ display: none; }}
    .results-grid {{ display: grid; grid-template-columns: repeat(auto-fill, minmax(380px, 1fr)); gap: 16px; }}
    .device-card, .user-card {{ border: 1px solid #e2e8f0; border-radius: 12px; padding: 16px; }}
    .device-grid {{ display: grid; grid-template-columns: repeat(2, minmax(0, 1fr)); gap: 8px 16px; }}
    .device-badge {{ display: inline-block; padding: 2px 8px; border-radius: 6px; font-size: 0.75rem; font-weight: 600; margin: 2px; }}
    .badge-active {{ background: #dcfce7; color: #166534; }}
    .badge-disabled {{ background: #fee2e2; color: #991b1b; }}
    .badge-deprovisioned {{ background: #e2e8f0; color: #334155; }}
    .badge-battery-critical {{ background: #fee2e2; color: #991b1b; }}
    .badge-battery-warning {{ background: #ffedd5; color: #9a3412; }}
    .badge-battery-fair {{ background: #fef9c3; color: #854d0e; }}
    .badge-battery-good {{ background: #dcfce7; color: #166534; }}
    .badge-battery-excellent {{ background: #dbeafe; color: #1e40af; }}
    .field-warning, .wan-untrusted, .dev-mode-warning {{ color: #c2410c; font-weight: 600; }}
    [data-collapsed="true"] {{ display: none; }}
    .hero[data-collapsed="true"] {{ display: block; }}
    [data-toggle] {{ cursor: pointer; }}
    .error-message {{ background: #ffebee; color: #c62828; padding: 15px; border-radius: 8px; }}
    .no-results, .panel-hint {{ padding: 40px; text-align: center; color: #64748b; }}
    .aue-years {{ display: flex; flex-wrap: wrap; gap: 8px; }}
    .aue-year-tile {{ position: relative; padding: 12px; border-radius: 10px; min-width: 90px; text-align: center; }}
    .aue-year-tile.current-year {{ background: #fee2e2; }}
    .aue-year-tile.near-future {{ background: #ffedd5; }}
    .aue-year-tile.far-future {{ background: #dcfce7; }}
    .aue-tooltip {{ display: none; position: absolute; z-index: 10; top: 100%; left: 0; background: #0f172a; color: #fff; padding: 8px; border-radius: 8px; text-align: left; }}
    .aue-year-tile:hover .aue-tooltip {{ display: block; }}
    .toast-container {{ position: fixed; right: 20px; bottom: 20px; display: flex; flex-direction: column; gap: 8px; }}
    .toast {{ padding: 12px 16px; border-radius: 8px; color: #fff; transition: opacity 0.3s, transform 0.3s; }}
    .toast.info {{ background: #2563eb; }}
    .toast.success {{ background: #16a34a; }}
    .toast.warning {{ background: #d97706; }}
    .toast.error {{ background: #dc2626; }}
    .toast.toast-exit {{ opacity: 0; transform: translateX(20px); }}
  </style>
</head>
<body>
  <script type="application/json" id="dashboard-data">{json}</script>
  <header class="page-header">
    <h2>Fleetview</h2>
  </header>
  {body}
  {script}
</body>
</html>"####,
        script = Node::from(el("script").child(Node::markup(PAGE_SCRIPT))).render(),
    );

    html.into_bytes()
}

/// Client behaviour: tabs, collapsible sections, hero toggle, toasts and copy buttons.
const PAGE_SCRIPT: &str = r#"
(function() {
  const data = JSON.parse(document.getElementById('dashboard-data').textContent || '{}');

  const tabButtons = document.querySelectorAll('[data-tab]');
  function activate(key) {
    for (const btn of tabButtons) {
      const on = btn.getAttribute('data-tab') === key;
      btn.classList.toggle('active', on);
      btn.setAttribute('aria-selected', on ? 'true' : 'false');
    }
    for (const panel of document.querySelectorAll('.tab-content')) {
      const on = panel.id === key + 'Tab';
      panel.classList.toggle('active', on);
      panel.hidden = !on;
    }
  }
  for (const btn of tabButtons) {
    btn.addEventListener('click', function() { activate(btn.getAttribute('data-tab')); });
  }

  const hero = document.getElementById('hero');
  const heroToggle = document.getElementById('heroToggle');
  heroToggle.addEventListener('click', function() {
    const collapsed = !hero.classList.contains('collapsed');
    hero.classList.toggle('collapsed', collapsed);
    hero.setAttribute('data-collapsed', String(collapsed));
    heroToggle.setAttribute('aria-expanded', String(!collapsed));
    heroToggle.textContent = collapsed ? '▸' : '▾';
    localStorage.setItem('heroCollapsed', String(collapsed));
  });

  const toastContainer = document.getElementById('toastContainer');
  function scheduleExit(el) {
    setTimeout(function() {
      el.classList.add('toast-exit');
      setTimeout(function() { el.remove(); }, 300);
    }, 3000);
  }
  function showToast(message, level) {
    const el = document.createElement('div');
    el.className = 'toast ' + level;
    el.textContent = message;
    toastContainer.appendChild(el);
    scheduleExit(el);
  }
  for (const el of toastContainer.querySelectorAll('.toast')) scheduleExit(el);

  function legacyCopy(value) {
    const area = document.createElement('textarea');
    area.value = value;
    area.setAttribute('readonly', '');
    area.style.position = 'fixed';
    area.style.opacity = '0';
    document.body.appendChild(area);
    area.select();
    const ok = document.execCommand('copy');
    area.remove();
    if (!ok) throw new Error('execCommand copy failed');
  }
  async function copyValue(label, value) {
    if (!value || value === 'N/A' || value === 'Not assigned') {
      showToast('No ' + label + ' to copy', 'warning');
      return;
    }
    try {
      if (navigator.clipboard && window.isSecureContext) {
        try {
          await navigator.clipboard.writeText(value);
        } catch (e) {
          legacyCopy(value);
        }
      } else {
        legacyCopy(value);
      }
      showToast(label + ' copied to clipboard', 'success');
    } catch (e) {
      showToast('Failed to copy ' + label, 'error');
    }
  }

  document.addEventListener('click', function(ev) {
    const searchBtn = ev.target.closest('[data-search-device]');
    if (searchBtn) {
      ev.preventDefault();
      copyValue('Search command', 'fleetview -d ' + JSON.stringify(searchBtn.getAttribute('data-search-device')));
      return;
    }
    const copyBtn = ev.target.closest('[data-copy-value]');
    if (copyBtn) {
      ev.preventDefault();
      copyValue(copyBtn.getAttribute('data-copy-label') || 'value', copyBtn.getAttribute('data-copy-value'));
      return;
    }
    const trigger = ev.target.closest('[data-toggle]');
    if (!trigger) return;
    const target = document.getElementById(trigger.getAttribute('data-toggle'));
    if (!target) return;
    const collapsed = target.getAttribute('data-collapsed') === 'true';
    target.setAttribute('data-collapsed', collapsed ? 'false' : 'true');
    trigger.classList.toggle('expanded', collapsed);
  });

  activate(data.active_tab || 'search');
})();
"#;
