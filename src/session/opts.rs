use crate::canon::canonicalizer::CanonicalizeOpts;
use crate::optimize::reducer::ReducerOpts;

pub use crate::plan::planner::PlannerOpts;

/// Options controlling one [`crate::Optimizer`] run.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OptimizerOpts {
    /// Structural equality used to merge duplicate objects.
    pub canonicalize: CanonicalizeOpts,
    /// Container rewrites applied to the deduplicated output.
    pub reducer: ReducerOpts,
    /// Check that the output shares no identity with the input. Always on in debug builds.
    pub validate_output: bool,
}

/// Options file layout read by the `compgraph` binary.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SessionOpts {
    pub optimizer: OptimizerOpts,
    pub planner: PlannerOpts,
}

impl SessionOpts {
    pub fn from_json(s: &str) -> crate::CompgraphResult<Self> {
        serde_json::from_str(s).map_err(|e| crate::CompgraphError::serde(e.to_string()))
    }
}
