//! Nutrition assistant core: answer validation, the question wizard and the
//! transformations applied to a recommended plan.

pub mod answers;
pub mod export;
pub mod metrics;
mod numeric;
pub mod plan;
pub mod summary;
pub mod validator;
pub mod wizard;
