mod common;

mod session;
mod weak_points;
