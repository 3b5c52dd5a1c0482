//! Built-in scenario run when no identifier is given.
use crate::{scenario, TestContext, TestError};

/// Always succeeds.
#[scenario]
pub async fn test_dummy(_ctx: TestContext) -> Result<(), TestError> {
    Ok(())
}
