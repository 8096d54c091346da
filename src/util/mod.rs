pub mod paths;
pub mod platform;

pub use platform::Platform;
