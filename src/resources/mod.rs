//! Plant resources
//!
//! - **Line**: single-lot processing line (unloading, sorting, shelling)
//! - **DryerModule**: capacity-bounded container with a three-state cycle
//! - **Dryer**: GMO-restricted group of modules with a hybrid type index

pub mod dryer;
pub mod line;

pub use dryer::*;
pub use line::*;
