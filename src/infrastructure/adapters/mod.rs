//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod ads;
pub mod content;
pub mod output;

pub use ads::*;
pub use content::*;
pub use output::*;
