pub mod mock;
pub mod ngs;
pub mod usgs;

pub use mock::MockSource;
pub use ngs::NgsSource;
pub use usgs::UsgsSource;
