pub mod window;

pub use window::{format_publish_time, history_window, publish_time, HistoryWindow};
