pub mod add;
pub mod dashboard;
pub mod history;
pub mod import;
pub mod voice;
