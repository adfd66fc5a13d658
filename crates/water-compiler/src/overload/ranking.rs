//! Conversion cost of an argument list.

use crate::directory::TypeDirectory;
use crate::error::UnresolvedClass;
use crate::types::WaterType;

/// Total cost of passing `args` to `params`, or `None` when some argument
/// is not assignable. A `void` argument never matches.
pub fn signature_cost(
    params: &[WaterType],
    args: &[WaterType],
    directory: &dyn TypeDirectory,
) -> Result<Option<u32>, UnresolvedClass> {
    if params.len() != args.len() {
        return Ok(None);
    }
    let mut cost = 0;
    for (param, arg) in params.iter().zip(args) {
        if arg.is_void() {
            return Ok(None);
        }
        if !param.is_assignable_from(arg, directory)? {
            return Ok(None);
        }
        if param != arg {
            cost += param.assign_changes_from(arg);
        }
    }
    Ok(Some(cost))
}
