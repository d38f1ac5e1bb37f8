use crate::assertion::EvaluationError;
use crate::error_filter::FilterDecision;
use crate::factory::{Builder, BuilderRegistry, ParamKind};
use crate::query::LoggedError;
use colored::Colorize;
use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL};
use serde::Serialize;

/// Outcome of filtering a single captured event
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    #[serde(rename = "type")]
    pub type_name: String,
    pub message: String,
    pub status_code: i64,
    #[serde(flatten)]
    pub decision: FilterDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckOutcome {
    pub fn failed(type_name: String, message: String, status_code: i64, err: &EvaluationError) -> Self {
        Self {
            type_name,
            message,
            status_code,
            decision: FilterDecision::Log,
            error: Some(err.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct RuleRow<'a> {
    builder: &'a str,
    parameters: Vec<String>,
}

pub fn create_styled_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.iter().map(|h| Cell::new(h)).collect::<Vec<_>>());
    table
}

fn truncate(text: &str, max: usize) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() > max {
        let kept: String = line.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        line.to_string()
    }
}

fn decision_label(outcome: &CheckOutcome) -> String {
    if outcome.error.is_some() {
        return "error".red().bold().to_string();
    }
    match &outcome.decision {
        FilterDecision::Log => "log".green().bold().to_string(),
        FilterDecision::Dismiss => "dismiss".yellow().bold().to_string(),
        FilterDecision::Route(notifiers) => format!(
            "{} {}",
            "route".cyan().bold(),
            notifiers.iter().cloned().collect::<Vec<_>>().join(", ")
        ),
    }
}

pub fn render_check_text(outcomes: &[CheckOutcome]) -> String {
    let mut table = create_styled_table(&["#", "Type", "Status", "Message", "Decision"]);
    for (i, outcome) in outcomes.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&outcome.type_name),
            Cell::new(outcome.status_code),
            Cell::new(truncate(&outcome.message, 60)),
            Cell::new(decision_label(outcome)),
        ]);
    }

    let dismissed = outcomes
        .iter()
        .filter(|o| o.decision != FilterDecision::Log)
        .count();
    let failed = outcomes.iter().filter(|o| o.error.is_some()).count();
    let mut out = format!("{table}\n");
    out.push_str(&format!(
        "{} event(s): {} filtered, {} logged",
        outcomes.len(),
        dismissed.to_string().yellow().bold(),
        (outcomes.len() - dismissed).to_string().green().bold()
    ));
    if failed > 0 {
        out.push_str(&format!(", {} failed", failed.to_string().red().bold()));
    }
    out.push('\n');
    for outcome in outcomes.iter().filter_map(|o| o.error.as_deref()) {
        out.push_str(&format!("{} {}\n", "error:".red().bold(), outcome));
    }
    out
}

pub fn render_query_text(matches: &[&LoggedError], total: usize) -> String {
    let mut table = create_styled_table(&["Time", "Host", "Type", "Status", "Message", "User"]);
    for entry in matches {
        table.add_row(vec![
            Cell::new(entry.time.format("%Y-%m-%d %H:%M:%S")),
            Cell::new(&entry.host_name),
            Cell::new(&entry.type_name),
            Cell::new(entry.status_code),
            Cell::new(truncate(&entry.message, 60)),
            Cell::new(&entry.user),
        ]);
    }
    format!(
        "{table}\n{} of {} error(s) matched\n",
        matches.len().to_string().green().bold(),
        total
    )
}

fn describe_parameters(builder: &Builder) -> Vec<String> {
    match builder {
        Builder::Node(_) => vec!["<node>".to_string()],
        Builder::Params { params, .. } => params
            .iter()
            .map(|param| {
                let kind = match param.kind {
                    ParamKind::ContextExpression => "path",
                    ParamKind::TypeReference => "type",
                    ParamKind::Bool => "bool",
                    ParamKind::TypeCode => "type-code",
                    ParamKind::Integer => "integer",
                    ParamKind::Text => "text",
                };
                if param.required {
                    format!("{}: {}", param.name, kind)
                } else {
                    format!("{}?: {}", param.name, kind)
                }
            })
            .collect(),
    }
}

pub fn render_rules_text(registry: &BuilderRegistry) -> String {
    let mut table = create_styled_table(&["Builder", "Parameters"]);
    for name in registry.names() {
        let params = registry.get(name).map(describe_parameters).unwrap_or_default();
        table.add_row(vec![Cell::new(name), Cell::new(params.join(", "))]);
    }
    format!("{table}\n{} builder(s)\n", registry.len())
}

pub fn render_rules_json(registry: &BuilderRegistry) -> serde_json::Result<String> {
    let rows: Vec<RuleRow<'_>> = registry
        .names()
        .into_iter()
        .map(|name| RuleRow {
            builder: name,
            parameters: registry.get(name).map(describe_parameters).unwrap_or_default(),
        })
        .collect();
    serde_json::to_string_pretty(&rows)
}
