//! Offline commands: schema printing and replacement planning.

use std::fs;
use std::path::Path;

use seclabel_resource::{ResourceData, replacement_reasons, security_label_schema};

use crate::cli::{OutputFormat, PlanArgs};
use crate::context::{CliError, CliResult};
use crate::output::{PlanOutcome, render_plan, render_schema};

pub(crate) fn handle_schema(format: OutputFormat) -> CliResult<()> {
    render_schema(&security_label_schema(), format)
}

pub(crate) fn handle_plan(args: &PlanArgs, format: OutputFormat) -> CliResult<()> {
    let prior = load_state(&args.prior)?;
    let proposed = load_state(&args.proposed)?;
    render_plan(&plan(&prior, &proposed)?, format)
}

pub(crate) fn plan(prior: &ResourceData, proposed: &ResourceData) -> CliResult<PlanOutcome> {
    if !prior.has_id() {
        return Ok(PlanOutcome::Create);
    }
    let attributes = replacement_reasons(prior, proposed)?;
    if attributes.is_empty() {
        Ok(PlanOutcome::NoChange)
    } else {
        Ok(PlanOutcome::Replace { attributes })
    }
}

fn load_state(path: &Path) -> CliResult<ResourceData> {
    let text = fs::read_to_string(path).map_err(|err| {
        CliError::validation(format!("failed to read '{}': {err}", path.display()))
    })?;
    serde_json::from_str(&text).map_err(|err| {
        CliError::validation(format!(
            "'{}' is not a valid state file: {err}",
            path.display()
        ))
    })
}
