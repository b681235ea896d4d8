pub mod controller;
pub mod motorboard;
pub mod navboard;
