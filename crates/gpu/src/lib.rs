pub mod camera;
pub mod viewport;

pub use camera::*;
pub use viewport::*;
