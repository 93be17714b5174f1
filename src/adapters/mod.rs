//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements                        | Connects to               |
//! |-------------|-----------------------------------|---------------------------|
//! | `hardware`  | every port in `NodePorts`         | the simulated board       |
//! | `log_sink`  | ReportingPort                     | Serial log output         |
//! | `network`   | NetworkPort                       | Scripted mesh stack       |
//! | `timers`    | TimerPort                         | Simulated millisecond clock |

pub mod hardware;
pub mod log_sink;
pub mod network;
pub mod timers;
