//! Then steps for derived-task lifecycle BDD scenarios.

use super::world::{DerivedTaskWorld, run_async};
use chantier::discovery::{
    domain::{DerivedTaskStatus, DiscoveryDomainError},
    ports::DerivedTaskRepository,
    services::DerivedTaskTriageError,
};
use rstest_bdd_macros::then;

#[then(r#"the suggestion status is "{status}""#)]
fn suggestion_status_is(world: &DerivedTaskWorld, status: String) -> Result<(), eyre::Report> {
    let expected = DerivedTaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;

    let id = world.suggestion_id()?;
    let task = run_async(world.repository.find_by_id(id))
        .map_err(|err| eyre::eyre!("lookup failed: {err}"))?
        .ok_or_else(|| eyre::eyre!("suggestion vanished from the repository"))?;

    if task.status() != expected {
        return Err(eyre::eyre!(
            "expected status {}, found {}",
            expected.as_str(),
            task.status().as_str()
        ));
    }
    Ok(())
}

#[then("a workspace task reference is recorded")]
fn workspace_task_recorded(world: &DerivedTaskWorld) -> Result<(), eyre::Report> {
    let id = world.suggestion_id()?;
    let task = run_async(world.repository.find_by_id(id))
        .map_err(|err| eyre::eyre!("lookup failed: {err}"))?
        .ok_or_else(|| eyre::eyre!("suggestion vanished from the repository"))?;

    if task.created_task_id().is_none() {
        return Err(eyre::eyre!("expected a workspace task reference, found none"));
    }
    Ok(())
}

#[then("the operation fails with an invalid transition error")]
fn operation_fails_with_invalid_transition(world: &DerivedTaskWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing operation result"))?;

    if !matches!(
        result,
        Err(DerivedTaskTriageError::Domain(
            DiscoveryDomainError::InvalidTransition { .. }
        ))
    ) {
        return Err(eyre::eyre!(
            "expected InvalidTransition error, got {result:?}"
        ));
    }
    Ok(())
}
