//! When steps for derived-task lifecycle BDD scenarios.

use super::world::{DerivedTaskWorld, run_async};
use chantier::discovery::domain::WorkspaceTaskId;
use rstest_bdd_macros::when;
use uuid::Uuid;

#[when("the suggestion is accepted")]
fn accept_suggestion(world: &mut DerivedTaskWorld) -> Result<(), eyre::Report> {
    let id = world.suggestion_id()?;
    world.last_result = Some(run_async(world.service.accept(id)));
    Ok(())
}

#[when("the suggestion is rejected")]
fn reject_suggestion(world: &mut DerivedTaskWorld) -> Result<(), eyre::Report> {
    let id = world.suggestion_id()?;
    world.last_result = Some(run_async(world.service.reject(id)));
    Ok(())
}

#[when("a workspace task is created from the suggestion")]
fn create_workspace_task(world: &mut DerivedTaskWorld) -> Result<(), eyre::Report> {
    let id = world.suggestion_id()?;
    let workspace_task_id = WorkspaceTaskId::from_uuid(Uuid::new_v4());
    world.last_result = Some(run_async(world.service.mark_created(id, workspace_task_id)));
    Ok(())
}
