pub mod acceptance;
pub mod deep_window;
pub mod events;
pub mod ids;
pub mod matcher;
pub mod outcome;
pub mod precondition;
pub mod report;
pub mod window;
