// 轮询时序配置
use crate::error::{Error, Result};
use embassy_time::Duration;

/// 默认最长按压时间
pub const DEFAULT_MAX_DURATION_MS: u32 = 2000;

/// 调度器时序
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimingConfig {
    /// 快速轮询的采样周期，按压时长以它为单位
    pub sample_period: Duration,
    /// 空闲时的慢速探测周期
    pub heartbeat_period: Duration,
}

impl TimingConfig {
    /// 检查配置
    pub fn validate(&self) -> Result<()> {
        if self.sample_period.as_millis() == 0 {
            return Err(Error::InvalidTiming);
        }
        if self.heartbeat_period < self.sample_period {
            return Err(Error::InvalidTiming);
        }
        // 时长按毫秒计算，周期必须能用 u32 表示
        if u32::try_from(self.sample_period.as_millis()).is_err() {
            return Err(Error::InvalidTiming);
        }
        Ok(())
    }

    pub(crate) fn sample_period_ms(&self) -> u32 {
        self.sample_period.as_millis() as u32
    }
}

impl Default for TimingConfig {
    /// 采样 10ms，探测 100ms
    fn default() -> Self {
        Self {
            sample_period: Duration::from_millis(10),
            heartbeat_period: Duration::from_millis(100),
        }
    }
}
