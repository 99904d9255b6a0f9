use std::fs;
use std::path::Path;

use anyhow::Context;
use seclabel_resource::ResourceData;
use seclabel_resource::schema::{
    LABEL_ATTR, LABEL_PROVIDER_ATTR, OBJECT_NAME_ATTR, OBJECT_TYPE_ATTR,
};
use tracing::info;

use crate::cli::{CreateArgs, ExistsArgs, ImportArgs, ReadArgs};
use crate::context::{AppContext, CliError, CliResult};
use crate::output::{render_exists, render_state};

pub(crate) async fn handle_create(ctx: &AppContext, args: CreateArgs) -> CliResult<()> {
    let mut data = ResourceData::new()
        .with_attribute(LABEL_PROVIDER_ATTR, args.label_provider)
        .with_attribute(LABEL_ATTR, args.label)
        .with_attribute(OBJECT_TYPE_ATTR, args.object_type)
        .with_attribute(OBJECT_NAME_ATTR, args.name);

    ctx.resource.create(&mut data).await?;
    if let Some(path) = &args.state_out {
        write_state(path, &data)?;
    }
    render_state(&data, ctx.output)
}

pub(crate) async fn handle_read(ctx: &AppContext, args: ReadArgs) -> CliResult<()> {
    let data = refresh(ctx, args).await?;
    render_state(&data, ctx.output)
}

pub(crate) async fn handle_delete(ctx: &AppContext, args: ReadArgs) -> CliResult<()> {
    let data = refresh(ctx, args).await?;
    if !data.has_id() {
        info!("no security label to delete");
        return render_state(&data, ctx.output);
    }
    ctx.resource.delete(&data).await?;

    let mut cleared = data;
    cleared.clear_id();
    render_state(&cleared, ctx.output)
}

pub(crate) async fn handle_exists(ctx: &AppContext, args: ExistsArgs) -> CliResult<()> {
    let data = ResourceData::new()
        .with_attribute(OBJECT_TYPE_ATTR, args.object_type)
        .with_attribute(OBJECT_NAME_ATTR, args.name);
    let exists = ctx.resource.exists(&data).await?;
    render_exists(exists, ctx.output)
}

pub(crate) async fn handle_import(ctx: &AppContext, args: ImportArgs) -> CliResult<()> {
    let ImportArgs { id, state_out } = args;
    let mut data = ctx.resource.import(&id);
    ctx.resource.read(&mut data).await?;
    if !data.has_id() {
        return Err(CliError::validation(format!(
            "no security label found for '{id}'"
        )));
    }
    if let Some(path) = &state_out {
        write_state(path, &data)?;
    }
    render_state(&data, ctx.output)
}

async fn refresh(ctx: &AppContext, args: ReadArgs) -> CliResult<ResourceData> {
    let mut data = ResourceData::with_id(args.id);
    if let Some(provider) = args.label_provider {
        data.set(LABEL_PROVIDER_ATTR, provider);
    }
    ctx.resource.read(&mut data).await?;
    Ok(data)
}

fn write_state(path: &Path, data: &ResourceData) -> CliResult<()> {
    let text = serde_json::to_string_pretty(data)
        .context("failed to serialise state")
        .map_err(CliError::failure)?;
    fs::write(path, text)
        .with_context(|| format!("failed to write state to '{}'", path.display()))
        .map_err(CliError::failure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn write_state_produces_a_loadable_file() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("state.json");
        let data = ResourceData::with_id("SCHEMA:audit").with_attribute(LABEL_ATTR, "'MASKED'");

        write_state(&path, &data).map_err(|err| err.display_message())?;
        let loaded: ResourceData = serde_json::from_str(&fs::read_to_string(&path)?)?;
        assert_eq!(loaded, data);
        Ok(())
    }

    #[test]
    fn write_state_reports_unwritable_paths() {
        let path = Path::new("/nonexistent-dir/state.json");
        let err = write_state(path, &ResourceData::new()).err();
        assert_eq!(err.map(|err| err.exit_code()), Some(3));
    }
}
