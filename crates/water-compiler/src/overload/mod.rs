//! Overload resolution.
//!
//! Candidates whose arity differs, or whose parameters cannot accept the
//! argument types, are dropped. The rest are ranked by total conversion
//! cost (see [`ranking`]). Candidates that do not fit the call site's
//! static or instance context are then filtered out, and the cheapest
//! survivor wins. Ties go to the candidate declared first.

mod ranking;

pub use ranking::signature_cost;

use crate::directory::{Member, MethodInfo, TypeDirectory};
use crate::error::UnresolvedClass;
use crate::scope::Function;
use crate::types::WaterType;

/// Anything with a parameter list.
pub trait Signature {
    fn params(&self) -> &[WaterType];
}

impl Signature for Function {
    fn params(&self) -> &[WaterType] {
        &self.ty.params
    }
}

impl Signature for MethodInfo {
    fn params(&self) -> &[WaterType] {
        &self.ty.params
    }
}

impl Signature for Member<MethodInfo> {
    fn params(&self) -> &[WaterType] {
        &self.info.ty.params
    }
}

/// The chosen overload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverloadMatch<'c, T> {
    pub candidate: &'c T,
    pub cost: u32,
}

/// Why resolution failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverloadError {
    /// No candidate accepts the argument types.
    NoApplicable,
    /// Candidates match the arguments but not the static/instance context.
    WrongContext,
    Unresolved(UnresolvedClass),
}

impl From<UnresolvedClass> for OverloadError {
    fn from(err: UnresolvedClass) -> Self {
        OverloadError::Unresolved(err)
    }
}

/// Applicable candidates with their cost, cheapest first, ties in
/// declaration order.
pub fn rank_candidates<'c, T: Signature>(
    candidates: impl IntoIterator<Item = &'c T>,
    args: &[WaterType],
    directory: &dyn TypeDirectory,
) -> Result<Vec<OverloadMatch<'c, T>>, UnresolvedClass>
where
    T: 'c,
{
    let mut ranked = Vec::new();
    for candidate in candidates {
        if let Some(cost) = signature_cost(candidate.params(), args, directory)? {
            ranked.push(OverloadMatch { candidate, cost });
        }
    }
    ranked.sort_by_key(|m| m.cost);
    Ok(ranked)
}

/// Pick the best candidate among those accepted by `context`.
pub fn resolve_overload<'c, T: Signature>(
    candidates: impl IntoIterator<Item = &'c T>,
    args: &[WaterType],
    directory: &dyn TypeDirectory,
    context: impl Fn(&T) -> bool,
) -> Result<OverloadMatch<'c, T>, OverloadError>
where
    T: 'c,
{
    let ranked = rank_candidates(candidates, args, directory)?;
    if ranked.is_empty() {
        return Err(OverloadError::NoApplicable);
    }
    let chosen = ranked
        .into_iter()
        .find(|m| context(m.candidate))
        .ok_or(OverloadError::WrongContext)?;
    tracing::trace!(cost = chosen.cost, "resolved overload");
    Ok(chosen)
}
