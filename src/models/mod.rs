pub mod driver;
pub mod geo;
pub mod route;
pub mod session;
pub mod trip;
