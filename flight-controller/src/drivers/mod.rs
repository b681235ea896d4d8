pub mod navboard;
