pub mod driver;
pub mod page;
pub mod pool;

pub use driver::{DriverSettings, ScourDriver};
pub use page::ScourPage;
pub use pool::SessionPool;
