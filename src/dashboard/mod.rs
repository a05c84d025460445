pub mod dataset;
pub mod html;
pub mod server;
pub mod view;
