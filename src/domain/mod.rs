mod cost;
mod meeting;
mod money;

pub use cost::*;
pub use meeting::*;
pub use money::*;
