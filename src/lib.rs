//! 按钮消抖与按压计时
//!
//! 轮询数字输入，经过 4 次采样消抖后计算按压时长：
//! 在最长时间之前松开则松开时上报，按住达到最长时间则立即上报一次，
//! 必须松开后才会再次上报。多个按钮共用一个调度循环，
//! 空闲时慢速探测，有按钮按下时快速轮询。
#![cfg_attr(not(test), no_std)]

// 必须放在最前面，后面的模块才能用到日志宏
mod fmt;

pub mod button;
pub mod config;
pub mod debounce;
pub mod error;
pub mod event;
pub mod input;
pub mod scheduler;

pub use button::{Button, PollOutcome};
pub use config::{DEFAULT_MAX_DURATION_MS, TimingConfig};
pub use debounce::{Debouncer, Sample};
pub use error::{Error, Result};
pub use event::{ButtonPress, PressEvent, PressForwarder, PressHandler, PressKind};
pub use input::{DigitalInput, GpioInput, InputInfo, Polarity};
pub use scheduler::{Mode, PressScheduler};
