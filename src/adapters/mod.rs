//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter      | Implements   | Connects to               |
//! |--------------|--------------|---------------------------|
//! | `display`    | DisplaySink  | Serial log (LCD layout)   |
//! | `status_log` | (none)       | Serial log, periodic dump |
//! | `time`       | TimePort     | ESP32 system timer        |

pub mod display;
pub mod status_log;
pub mod time;
