pub mod clear;
pub mod content;
pub mod copy;
pub mod init;
pub mod ls;
pub mod new;
pub mod rm;
pub mod stat;
pub mod version;

pub use clear::Clear;
pub use content::{Cat, Put};
pub use copy::Cp;
pub use init::Init;
pub use ls::Ls;
pub use new::{Mkdir, New};
pub use rm::Rm;
pub use stat::Stat;
pub use test::Test;
pub use version::Version;
