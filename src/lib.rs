pub mod app;
pub mod enhancer;
pub mod model;
pub mod msg;
