//! Pure domain logic: no database, no network. Every function here is a deterministic
//! transform over plain values, so it is unit-tested directly without fixtures.

pub mod coverage;
pub mod forecast;
pub mod optimizer;
pub mod schedule;

pub use coverage::{current_coverage, order_quantity, scenarios, Coverage, MAX_COVERAGE_DAYS};
pub use forecast::{forecast as run_forecast, Forecast};
pub use optimizer::{optimize, Candidate, OptimizerResult};
pub use schedule::{accepts_order_on, days_until_delivery, delivery_date, next_order_date};
