// ABOUTME: Lifecycle command implementations: create, start, stop, snapshot, delete.
// ABOUTME: Parses arguments into domain types, confirms, calls the engine, reports results.

use super::prompt;
use scon::diagnostics::Diagnostics;
use scon::engine::{DeleteOption, Engine, RetentionReport};
use scon::error::Result;
use scon::output::Output;
use scon::runtime::RuntimeDriver;
use scon::types::{ContainerName, ImageRef};

pub async fn create<D: RuntimeDriver>(
    engine: &Engine<D>,
    name: &str,
    image: &str,
    output: &Output,
) -> Result<()> {
    let name = ContainerName::new(name)?;
    let image = ImageRef::parse(image)?;

    engine.create(&name, &image).await?;
    output.success(&format!("Created stateful container {name} from {image}"));
    Ok(())
}

pub async fn start<D: RuntimeDriver>(
    engine: &Engine<D>,
    name: &str,
    output: &Output,
) -> Result<()> {
    let name = ContainerName::new(name)?;

    output.progress(&format!("  → Starting {name}..."));
    let started = engine.start(&name).await?;
    output.success(&format!(
        "Started {name} ({}) from {}",
        started.container_id.short(),
        started.image
    ));
    Ok(())
}

pub async fn stop<D: RuntimeDriver>(
    engine: &Engine<D>,
    name: &str,
    force: bool,
    output: &mut Output,
) -> Result<()> {
    let name = ContainerName::new(name)?;
    if !force && !prompt::confirm(&format!("Stop {name} and save its state?"))? {
        output.success("Cancelled");
        return Ok(());
    }

    output.start_timer();
    output.progress(&format!("  → Stopping {name} and committing its state..."));
    let stopped = engine.stop(&name).await?;

    report_retention(&name, &stopped.retention, output);
    output.success(&format!("Stopped {name}, saved as {}", stopped.snapshot.name));
    Ok(())
}

pub async fn snapshot<D: RuntimeDriver>(
    engine: &Engine<D>,
    name: &str,
    tag: bool,
    output: &mut Output,
) -> Result<()> {
    let name = ContainerName::new(name)?;

    output.start_timer();
    let taken = engine.snapshot(&name, tag).await?;

    report_retention(&name, &taken.retention, output);
    let suffix = if taken.snapshot.tagged { " (tagged)" } else { "" };
    output.success(&format!("Saved {name} as {}{suffix}", taken.snapshot.name));
    Ok(())
}

pub async fn tag<D: RuntimeDriver>(
    engine: &Engine<D>,
    name: &str,
    snapshot: &str,
    tagged: bool,
    output: &Output,
) -> Result<()> {
    let name = ContainerName::new(name)?;
    let record = if tagged {
        engine.tag(&name, snapshot).await?
    } else {
        engine.untag(&name, snapshot).await?
    };

    let verb = if tagged { "Tagged" } else { "Untagged" };
    output.success(&format!("{verb} {}", record.name));
    Ok(())
}

pub async fn prune<D: RuntimeDriver>(
    engine: &Engine<D>,
    name: Option<&str>,
    output: &Output,
) -> Result<()> {
    let name = name.map(ContainerName::new).transpose()?;
    let reports = engine.prune(name.as_ref()).await?;

    let mut removed = 0;
    for (name, report) in &reports {
        for snapshot in &report.removed {
            output.progress(&format!("  → Removed {snapshot}"));
        }
        removed += report.removed.len();
        report_retention(name, report, output);
    }
    output.success(&format!("Removed {removed} snapshot(s)"));
    Ok(())
}

pub async fn delete<D: RuntimeDriver>(
    engine: &Engine<D>,
    name: &str,
    option: Option<&str>,
    force: bool,
    output: &Output,
) -> Result<()> {
    let name = ContainerName::new(name)?;
    // Fail on unknown names before asking anything.
    engine.get(&name)?;

    let option = match option {
        Some(option) => option.parse::<DeleteOption>()?,
        None => match prompt::choose_delete_option(name.as_str())? {
            Some(option) => option,
            None => {
                output.success("Cancelled");
                return Ok(());
            }
        },
    };

    if !force && !prompt::confirm(&format!("Delete {name} ({option})?"))? {
        output.success("Cancelled");
        return Ok(());
    }

    let deleted = engine.delete(&name, option).await?;
    match deleted.kept {
        Some(kept) => output.success(&format!(
            "Removed {} snapshot(s) of {name}, kept {kept}",
            deleted.removed.len()
        )),
        None => output.success(&format!(
            "Deleted {name} ({} snapshot(s) removed)",
            deleted.removed.len()
        )),
    }
    Ok(())
}

pub fn list<D: RuntimeDriver>(engine: &Engine<D>, output: &Output) -> Result<()> {
    output.containers(&engine.list()?);
    Ok(())
}

fn report_retention(name: &ContainerName, report: &RetentionReport, output: &Output) {
    let mut diag = Diagnostics::default();
    diag.record_retention(name, report);

    // Emit collected warnings
    for warning in diag.warnings() {
        output.warning(&warning.message);
    }
}
