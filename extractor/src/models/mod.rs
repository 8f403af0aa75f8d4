//! 数据模型

mod media;
mod record;
mod site;

pub use media::*;
pub use record::*;
pub use site::*;
