//! Output renderers and formatting helpers for CLI commands.

use anyhow::anyhow;
use seclabel_resource::{ResourceData, ResourceSchema};
use serde::Serialize;
use serde_json::json;

use crate::cli::OutputFormat;
use crate::context::{CliError, CliResult};

/// Outcome of comparing a recorded state with a proposed one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub(crate) enum PlanOutcome {
    Create,
    NoChange,
    Replace { attributes: Vec<&'static str> },
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}

pub(crate) fn render_state(data: &ResourceData, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(data)?,
        OutputFormat::Table => {
            for line in state_lines(data) {
                println!("{line}");
            }
        }
    }
    Ok(())
}

pub(crate) fn state_lines(data: &ResourceData) -> Vec<String> {
    if !data.has_id() {
        return vec!["security label not found".to_string()];
    }
    let mut lines = vec![format!("id: {}", data.id())];
    lines.extend(
        data.attributes()
            .iter()
            .map(|(name, value)| format!("{name}: {value}")),
    );
    lines
}

pub(crate) fn render_exists(exists: bool, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&json!({ "exists": exists }))?,
        OutputFormat::Table => println!("{exists}"),
    }
    Ok(())
}

pub(crate) fn render_schema(schema: &ResourceSchema, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(schema)?,
        OutputFormat::Table => {
            println!("kind: {}", schema.kind);
            println!("{:<16} {:<8} {:<9} DESCRIPTION", "ATTRIBUTE", "REQUIRED", "FORCE_NEW");
            for attr in &schema.attributes {
                println!(
                    "{:<16} {:<8} {:<9} {}",
                    attr.name, attr.required, attr.force_new, attr.description
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn render_plan(outcome: &PlanOutcome, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(outcome)?,
        OutputFormat::Table => println!("{}", plan_summary(outcome)),
    }
    Ok(())
}

pub(crate) fn plan_summary(outcome: &PlanOutcome) -> String {
    match outcome {
        PlanOutcome::Create => "create: no label recorded in prior state".to_string(),
        PlanOutcome::NoChange => "no changes".to_string(),
        PlanOutcome::Replace { attributes } => {
            format!("replace: {} changed", attributes.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_lines_list_identity_then_attributes() {
        let data = ResourceData::with_id("skynet")
            .with_attribute("type", "ROLE")
            .with_attribute("label", "'MASKED'");
        assert_eq!(
            state_lines(&data),
            vec![
                "id: skynet".to_string(),
                "label: 'MASKED'".to_string(),
                "type: ROLE".to_string(),
            ]
        );
    }

    #[test]
    fn state_lines_report_missing_label() {
        assert_eq!(
            state_lines(&ResourceData::new()),
            vec!["security label not found".to_string()]
        );
    }

    #[test]
    fn plan_outcomes_serialise_with_action_tag() -> Result<(), serde_json::Error> {
        let replace = PlanOutcome::Replace {
            attributes: vec!["label", "name"],
        };
        assert_eq!(
            serde_json::to_value(&replace)?,
            json!({ "action": "replace", "attributes": ["label", "name"] })
        );
        assert_eq!(
            serde_json::to_value(PlanOutcome::NoChange)?,
            json!({ "action": "no_change" })
        );
        assert_eq!(plan_summary(&replace), "replace: label, name changed");
        Ok(())
    }
}
