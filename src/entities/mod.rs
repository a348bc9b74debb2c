pub mod booking;
pub mod driver;
pub mod invoice;
pub mod location;
pub mod route;
pub mod tenant;
pub mod user;
pub mod vehicle;
