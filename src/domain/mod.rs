pub mod audience;
pub mod notice;
pub mod reaction;
pub mod section;
pub mod user;

pub use audience::*;
pub use notice::*;
pub use reaction::*;
pub use section::*;
pub use user::*;
