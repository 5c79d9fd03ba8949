use crate::engine::EngineState;
use crate::error::{Result, StatsError};
use tracing::info;

/// Schema version written by this build
pub const SCHEMA_VERSION: u32 = 1;

type Step = fn(EngineState) -> EngineState;

/// `(target version, step)` in ascending order
const STEPS: &[(u32, Step)] = &[(1, recompute_stale_metrics as Step)];

/// Version 0 records carried session metrics computed by older rules.
fn recompute_stale_metrics(mut state: EngineState) -> EngineState {
    state.refresh_metrics();
    state
}

pub fn needs_migration(state: &EngineState) -> bool {
    state.schema_version < SCHEMA_VERSION
}

/// Upgrades a decoded `EngineState` to the schema this build writes.
///
/// Each step is a pure function applied when the state's version is below the
/// step's target. A state already at the target skips the step, so migrating
/// its own output again changes nothing. Versions newer than `SCHEMA_VERSION`
/// are refused rather than truncated.
pub fn migrate(mut state: EngineState) -> Result<EngineState> {
    if state.schema_version > SCHEMA_VERSION {
        return Err(StatsError::UnsupportedSchema {
            found: state.schema_version,
            supported: SCHEMA_VERSION,
        });
    }

    for &(target, step) in STEPS {
        if state.schema_version < target {
            info!(from = state.schema_version, to = target, "migrating stats schema");
            state = step(state);
            state.schema_version = target;
        }
    }

    Ok(state)
}
