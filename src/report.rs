//! HTML report generation.
//!
//! Turns a task snapshot into one standalone HTML document: inline styles,
//! inline script, no external references. The document has five tabbed
//! sections (Overview, Key Metrics, Tasks by Status, Tasks by Person,
//! Timeline). The generation timestamp is the only input not taken from the
//! arguments, and [`generate_report_at`] lets callers pin it.

use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::Write as _;
use std::path::Path;
use std::thread::{self, JoinHandle};

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;
use crate::fields::{Priority, Status};
use crate::settings::AppSettings;
use crate::stats::{completion_rate, group_by_person, high_priority_count, overdue_by_status_count, status_counts, tasks_with_status, timeline};
use crate::task::Task;

/// Title block and options of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub title: String,
    pub subtitle: String,
    /// Add a status distribution chart to the Key Metrics section.
    pub include_charts: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            title: "Task Management Report".into(),
            subtitle: "Operational overview".into(),
            include_charts: true,
        }
    }
}

/// Generate a report stamped with the current local time.
pub fn generate_report(tasks: &[Task], settings: &AppSettings, config: &ReportConfig) -> Result<String> {
    generate_report_at(tasks, settings, config, Local::now())
}

/// Generate a report on a worker thread from an owned snapshot.
pub fn spawn_report(tasks: Vec<Task>, settings: AppSettings, config: ReportConfig) -> JoinHandle<Result<String>> {
    thread::spawn(move || generate_report(&tasks, &settings, &config))
}

/// Download name for a report generated on `date`.
pub fn report_file_name(date: NaiveDate) -> String {
    format!("taskpro-report-{}.html", date.format("%Y-%m-%d"))
}

/// Write a finished document, never leaving a partial file at `path`.
pub fn write_report(path: &Path, html: &str) -> Result<()> {
    let tmp = path.with_extension("html.tmp");
    let mut f = File::create(&tmp)?;
    f.write_all(html.as_bytes())?;
    f.flush()?;
    fs::rename(&tmp, path)?;
    info!(path = %path.display(), bytes = html.len(), "wrote report");
    Ok(())
}

/// Generate a report with an explicit generation time.
pub fn generate_report_at(
    tasks: &[Task],
    settings: &AppSettings,
    config: &ReportConfig,
    now: DateTime<Local>,
) -> Result<String> {
    let total = tasks.len();
    let counts = status_counts(tasks);
    let rate = completion_rate(counts.completed, total);
    let overdue = overdue_by_status_count(tasks);
    let user = escape(&settings.user_name);

    let mut out = String::with_capacity(16 * 1024 + total * 1024);
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    out.push_str("<meta charset=\"UTF-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    writeln!(out, "<title>{}</title>", escape(&config.title))?;
    writeln!(out, "<style>{}</style>", STYLE)?;
    out.push_str("</head>\n<body>\n<div class=\"presentation-container\">\n");

    out.push_str("<header class=\"hero-header\">\n");
    writeln!(out, "<h1>{}</h1>", escape(&config.title))?;
    writeln!(out, "<p>{}</p>", escape(&config.subtitle))?;
    writeln!(out, "<p class=\"generated\">Report generated on {}</p>", format_date(now.date_naive()))?;
    out.push_str("</header>\n");

    out.push_str("<nav class=\"nav-tabs\">\n");
    for (i, label) in SECTIONS.iter().enumerate() {
        let active = if i == 0 { " active" } else { "" };
        writeln!(out, "<button class=\"nav-tab{active}\" onclick=\"showSection({i})\">{label}</button>")?;
    }
    out.push_str("</nav>\n");

    // Overview
    section_open(&mut out, 0, "Executive Overview")?;
    out.push_str("<div class=\"overview\">\n");
    writeln!(
        out,
        "<p>This report provides a comprehensive overview of current operational tasks managed by <strong>{user}</strong>. \
         Currently tracking <strong>{total}</strong> active items with a completion rate of <strong>{rate}%</strong>.</p>"
    )?;
    if overdue > 0 {
        writeln!(
            out,
            "<p class=\"warning\"><strong>&#9888; Attention:</strong> There are {overdue} overdue tasks requiring immediate action.</p>"
        )?;
    }
    out.push_str("</div>\n</section>\n");

    // Key metrics
    section_open(&mut out, 1, "Key Performance Indicators")?;
    out.push_str("<div class=\"metrics-grid\">\n");
    metric_card(&mut out, "Total Tasks", &total.to_string(), "Active items in system", false)?;
    metric_card(&mut out, "Completion Rate", &format!("{rate}%"), "Tasks fully executed", false)?;
    metric_card(&mut out, "Overdue", &overdue.to_string(), "Items past due date", true)?;
    metric_card(&mut out, "High Priority", &high_priority_count(tasks).to_string(), "Critical &amp; High items", false)?;
    out.push_str("</div>\n");
    if config.include_charts {
        status_chart(&mut out, tasks)?;
    }
    out.push_str("</section>\n");

    // Tasks by status
    section_open(&mut out, 2, "Tasks by Status")?;
    out.push_str("<div class=\"expandable-container\">\n");
    for status in Status::REPORT_ORDER {
        let group = tasks_with_status(tasks, status);
        if group.is_empty() {
            continue;
        }
        let expanded = if status != Status::Completed { " expanded" } else { "" };
        writeln!(out, "<div class=\"expandable-card{expanded}\" data-status=\"{}\">", status.as_str())?;
        writeln!(
            out,
            "<div class=\"expandable-header\"><h3>{} ({})</h3><span class=\"toggle-icon\">&#9660;</span></div>",
            status_heading(status),
            group.len()
        )?;
        task_grid(&mut out, &group)?;
        out.push_str("</div>\n");
    }
    out.push_str("</div>\n</section>\n");

    // Tasks by person
    section_open(&mut out, 3, "Tasks by Team Member")?;
    out.push_str("<div class=\"expandable-container\">\n");
    for group in group_by_person(tasks) {
        out.push_str("<div class=\"expandable-card expanded\">\n");
        writeln!(
            out,
            "<div class=\"expandable-header\"><h3>{} <span class=\"ratio\">({}/{} Done)</span></h3><span class=\"toggle-icon\">&#9660;</span></div>",
            escape(group.person),
            group.completed(),
            group.total()
        )?;
        task_grid(&mut out, &group.tasks)?;
        out.push_str("</div>\n");
    }
    out.push_str("</div>\n</section>\n");

    // Timeline, flat on purpose: no per-day grouping here.
    section_open(&mut out, 4, "Project Timeline")?;
    out.push_str("<div class=\"timeline\">\n");
    for t in timeline(tasks) {
        let marker = if t.priority == Priority::Critical { "critical" } else { "normal" };
        writeln!(
            out,
            "<div class=\"timeline-item\"><div class=\"timeline-date\">{}</div>\
             <div class=\"timeline-body\"><span class=\"timeline-dot {marker}\"></span>\
             <div class=\"timeline-title\">{}</div><div class=\"timeline-person\">{}</div></div></div>",
            format_due(t.due_date),
            escape(&t.title),
            escape(&t.assigned_to)
        )?;
    }
    out.push_str("</div>\n</section>\n");

    out.push_str("<footer class=\"presentation-footer\">\n");
    out.push_str("<p><strong>Fincantieri Task Management Report</strong></p>\n");
    writeln!(out, "<p>Generated on {}</p>", now.format("%-m/%-d/%Y, %-I:%M:%S %p"))?;
    writeln!(out, "<p>Office Manager: {user}</p>")?;
    out.push_str("</footer>\n</div>\n");
    writeln!(out, "<script>{}</script>", SCRIPT)?;
    out.push_str("</body>\n</html>\n");

    debug!(tasks = total, bytes = out.len(), "generated report");
    Ok(out)
}

const SECTIONS: [&str; 5] = ["Overview", "Key Metrics", "Tasks by Status", "Tasks by Person", "Timeline"];

fn section_open(out: &mut String, index: usize, title: &str) -> std::fmt::Result {
    let active = if index == 0 { " active" } else { "" };
    writeln!(out, "<section id=\"section-{index}\" class=\"content-section{active}\">")?;
    writeln!(out, "<h2 class=\"section-title\">{title}</h2>")
}

fn metric_card(out: &mut String, label: &str, value: &str, description: &str, alert: bool) -> std::fmt::Result {
    let class = if alert { "value alert" } else { "value" };
    writeln!(
        out,
        "<div class=\"metric-card\"><h3>{label}</h3><span class=\"{class}\">{value}</span><span class=\"description\">{description}</span></div>"
    )
}

fn status_chart(out: &mut String, tasks: &[Task]) -> std::fmt::Result {
    let counts = status_counts(tasks);
    let total = counts.total();
    out.push_str("<div class=\"chart\">\n<h3>Status Distribution</h3>\n");
    for status in Status::REPORT_ORDER {
        let n = counts.get(status);
        let width = if total == 0 { 0.0 } else { n as f64 * 100.0 / total as f64 };
        writeln!(
            out,
            "<div class=\"chart-row\"><span class=\"chart-label\">{}</span>\
             <div class=\"chart-track\"><div class=\"chart-bar status-{}\" style=\"width: {:.1}%\"></div></div>\
             <span class=\"chart-value\">{}</span></div>",
            status_heading(status),
            status.as_str(),
            width,
            n
        )?;
    }
    out.push_str("</div>\n");
    Ok(())
}

fn task_grid(out: &mut String, tasks: &[&Task]) -> std::fmt::Result {
    out.push_str("<div class=\"expandable-content\"><div class=\"task-grid\">\n");
    for t in tasks {
        task_card(out, t)?;
    }
    out.push_str("</div></div>\n");
    Ok(())
}

fn task_card(out: &mut String, t: &Task) -> std::fmt::Result {
    writeln!(out, "<div class=\"task-card priority-{}\">", t.priority.as_str())?;
    writeln!(out, "<div class=\"task-title\">{}</div>", escape(&t.title))?;
    writeln!(out, "<div class=\"task-description\">{}</div>", escape(&t.description))?;
    writeln!(
        out,
        "<div class=\"task-meta\"><span class=\"task-meta-item\">&#128100; {}</span>\
         <span class=\"task-meta-item\">&#128197; {}</span>\
         <span class=\"task-meta-item\">&#127991; {}</span></div>",
        escape(&t.assigned_to),
        format_due(t.due_date),
        escape(&t.category)
    )?;
    if !t.subtasks.is_empty() {
        out.push_str("<div class=\"subtasks-list\">\n");
        for st in &t.subtasks {
            let done = if st.completed { " completed" } else { "" };
            writeln!(out, "<div class=\"subtask-item{done}\">{}</div>", escape(&st.title))?;
        }
        out.push_str("</div>\n");
    }
    out.push_str("</div>\n");
    Ok(())
}

/// "IN PROGRESS", "OVERDUE", ...
fn status_heading(status: Status) -> String {
    status.as_str().to_uppercase().replace('-', " ")
}

/// Locale-style date without time, e.g. `12/1/2025`.
pub fn format_date(d: NaiveDate) -> String {
    d.format("%-m/%-d/%Y").to_string()
}

fn format_due(d: Option<NaiveDate>) -> String {
    d.map(format_date).unwrap_or_default()
}

/// Escape text for HTML element content and quoted attributes.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const STYLE: &str = r#"
* { margin: 0; padding: 0; box-sizing: border-box; font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; }
:root { --primary: #2563eb; --secondary: #7c3aed; --accent: #06b6d4; --text: #333; --card: #ffffff; --shadow-light: rgba(0,0,0,0.1); --shadow-medium: rgba(0,0,0,0.2); --radius: 12px; }
body { line-height: 1.6; color: var(--text); background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); min-height: 100vh; }
.presentation-container { max-width: 1400px; margin: 40px auto; background: rgba(255,255,255,0.95); border-radius: 20px; box-shadow: 0 8px 32px var(--shadow-medium); overflow: hidden; }
.hero-header { background: linear-gradient(135deg, var(--primary), var(--secondary)); color: white; padding: 60px 40px; text-align: center; }
.hero-header h1 { font-size: 3.2em; margin-bottom: 15px; text-shadow: 2px 2px 4px rgba(0,0,0,0.2); }
.hero-header p { font-size: 1.4em; opacity: 0.95; }
.hero-header .generated { margin-top: 15px; font-size: 1.1em; }
.nav-tabs { display: flex; justify-content: center; flex-wrap: wrap; gap: 15px; padding: 20px; background: var(--card); box-shadow: 0 4px 12px var(--shadow-light); position: sticky; top: 0; z-index: 100; }
.nav-tab { background: linear-gradient(135deg, var(--primary), var(--secondary)); color: white; border: none; padding: 12px 30px; border-radius: 25px; cursor: pointer; font-size: 1em; font-weight: 600; transition: transform 0.3s ease; }
.nav-tab:hover, .nav-tab.active { transform: translateY(-3px); }
.nav-tab.active { background: var(--accent); }
.content-section { padding: 60px 40px; display: none; }
.content-section.active { display: block; animation: fadeInUp 0.6s ease-out; }
@keyframes fadeInUp { from { opacity: 0; transform: translateY(30px); } to { opacity: 1; transform: translateY(0); } }
.section-title { font-size: 2.4em; color: var(--primary); margin-bottom: 30px; text-align: center; }
.overview { font-size: 1.1em; color: #444; margin-bottom: 2rem; }
.overview .warning { color: #ef4444; margin-top: 10px; }
.metrics-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(280px, 1fr)); gap: 30px; margin: 40px 0; }
.metric-card { background: linear-gradient(135deg, rgba(255,255,255,0.9), rgba(240,244,248,0.9)); border-radius: var(--radius); padding: 30px; box-shadow: 0 8px 24px var(--shadow-light); border-left: 5px solid var(--primary); }
.metric-card h3 { color: var(--secondary); font-size: 1.3em; margin-bottom: 15px; }
.metric-card .value { font-size: 3em; font-weight: bold; color: var(--primary); display: block; margin-bottom: 10px; }
.metric-card .value.alert { color: #ef4444; }
.metric-card .description { font-size: 0.95em; color: #666; }
.chart { margin-top: 30px; }
.chart h3 { color: var(--secondary); margin-bottom: 15px; }
.chart-row { display: flex; align-items: center; gap: 15px; margin-bottom: 10px; }
.chart-label { min-width: 140px; font-weight: 600; }
.chart-track { flex: 1; background: #e5e7eb; border-radius: 8px; height: 14px; overflow: hidden; }
.chart-bar { height: 14px; border-radius: 8px; background: var(--primary); }
.chart-bar.status-overdue { background: #ef4444; }
.chart-bar.status-in-progress { background: #f59e0b; }
.chart-bar.status-completed { background: #22c55e; }
.task-grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(350px, 1fr)); gap: 25px; margin: 30px 0; }
.task-card { background: var(--card); border-radius: var(--radius); padding: 25px; box-shadow: 0 4px 20px var(--shadow-light); border-left: 5px solid; }
.task-card.priority-critical { border-left-color: #ef4444; }
.task-card.priority-high { border-left-color: #f59e0b; }
.task-card.priority-medium { border-left-color: #06b6d4; }
.task-card.priority-low { border-left-color: #94a3b8; }
.task-title { font-size: 1.4em; color: var(--primary); margin-bottom: 12px; font-weight: 600; }
.task-description { color: #555; margin-bottom: 15px; }
.task-meta { display: flex; flex-wrap: wrap; gap: 12px; margin: 15px 0; font-size: 0.9em; }
.task-meta-item { padding: 6px 12px; background: rgba(37,99,235,0.1); border-radius: 20px; color: var(--primary); font-weight: 500; }
.subtasks-list { margin-top: 15px; padding-top: 15px; border-top: 1px solid #e5e7eb; }
.subtask-item { padding: 8px 0 8px 25px; position: relative; color: #666; font-size: 0.95em; }
.subtask-item::before { content: '\2192'; position: absolute; left: 5px; color: var(--secondary); font-weight: bold; }
.subtask-item.completed { text-decoration: line-through; opacity: 0.6; }
.expandable-container { margin: 30px 0; }
.expandable-card { background: var(--card); border: 1px solid #e0e0e0; border-radius: var(--radius); margin-bottom: 20px; box-shadow: 0 4px 15px var(--shadow-light); overflow: hidden; }
.expandable-header { display: flex; justify-content: space-between; align-items: center; padding: 20px 30px; background: linear-gradient(135deg, rgba(37,99,235,0.05), rgba(124,58,237,0.05)); cursor: pointer; }
.expandable-header h3 { color: var(--primary); font-size: 1.4em; }
.expandable-header .ratio { font-size: 0.8em; font-weight: normal; opacity: 0.8; }
.toggle-icon { font-size: 1.8em; color: var(--secondary); transition: transform 0.3s ease; }
.expandable-card.expanded .toggle-icon { transform: rotate(180deg); }
.expandable-content { max-height: 0; overflow: hidden; padding: 0 30px; transition: max-height 0.5s ease, padding 0.5s ease; }
.expandable-card.expanded .expandable-content { max-height: none; padding: 25px 30px; }
.timeline { margin-top: 20px; }
.timeline-item { display: flex; gap: 20px; margin-bottom: 20px; align-items: flex-start; }
.timeline-date { min-width: 120px; font-weight: bold; color: var(--primary); }
.timeline-body { padding: 0 0 20px 20px; border-left: 2px solid #e2e8f0; position: relative; }
.timeline-dot { position: absolute; left: -6px; top: 0; width: 10px; height: 10px; border-radius: 50%; background: var(--primary); }
.timeline-dot.critical { background: #ef4444; }
.timeline-title { font-weight: 600; }
.timeline-person { color: #666; font-size: 0.9em; }
.presentation-footer { background: linear-gradient(135deg, #1e293b, #0f172a); color: white; padding: 40px; text-align: center; }
@media print { .nav-tabs { display: none; } .content-section { display: block !important; page-break-after: always; } }
"#;

const SCRIPT: &str = r#"
function showSection(index) {
  var sections = document.querySelectorAll('.content-section');
  var tabs = document.querySelectorAll('.nav-tab');
  sections.forEach(function (s) { s.classList.remove('active'); });
  tabs.forEach(function (t) { t.classList.remove('active'); });
  sections[index].classList.add('active');
  tabs[index].classList.add('active');
  sections[index].scrollIntoView({ behavior: 'smooth', block: 'start' });
}
document.querySelectorAll('.expandable-header').forEach(function (header) {
  header.addEventListener('click', function () { this.parentElement.classList.toggle('expanded'); });
});
if ('IntersectionObserver' in window) {
  var observer = new IntersectionObserver(function (entries) {
    entries.forEach(function (entry) {
      if (entry.isIntersecting) {
        entry.target.style.opacity = '1';
        entry.target.style.transform = 'translateY(0)';
      }
    });
  }, { threshold: 0.1 });
  document.querySelectorAll('.metric-card, .task-card, .expandable-card').forEach(function (el) {
    el.style.opacity = '0';
    el.style.transform = 'translateY(20px)';
    el.style.transition = 'all 0.6s ease-out';
    observer.observe(el);
  });
}
"#;
