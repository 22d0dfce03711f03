pub mod twse;

pub use twse::TwseClient;
