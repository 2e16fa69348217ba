// 消抖与按压计时状态机
//
// 每个采样周期移入一位原始电平，连续 4 次相同才算稳定。
// 稳定按下期间累计计时，达到最长时间立即上报；之前松开则在松开时上报。

use crate::error::{Error, Result};
use crate::event::{PressEvent, PressKind};

/// 只保留最近 4 次采样
const HISTORY_MASK: u8 = 0x0F;
/// 稳定按下
const STABLE_ACTIVE: u8 = 0x0F;
/// 稳定松开
const STABLE_INACTIVE: u8 = 0x00;

/// 单次采样的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Sample {
    /// 还在抖动
    Settling,
    /// 稳定松开，没有要上报的按压
    Idle,
    /// 稳定按下，尚未到上报时机
    Held,
    /// 稳定按下并刚好达到最长时间
    MaxReached(PressEvent),
    /// 按下后稳定松开
    Released(PressEvent),
}

impl Sample {
    /// 本次采样产生的事件
    pub fn event(&self) -> Option<PressEvent> {
        match self {
            Sample::MaxReached(event) | Sample::Released(event) => Some(*event),
            _ => None,
        }
    }

    /// 只有稳定松开后才能停止快速轮询
    pub fn keep_polling(&self) -> bool {
        !matches!(self, Sample::Idle | Sample::Released(_))
    }
}

/// 消抖器
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Debouncer {
    /// 最近 4 次采样，最新的在最低位
    history: u8,
    /// 按下持续的采样数，0 表示空闲
    elapsed: u32,
    max_ticks: u32,
    sample_period_ms: u32,
}

impl Debouncer {
    /// 创建消抖器
    ///
    /// 最长时间换算成采样数后至少为 2，否则无法和噪声区分
    pub fn new(max_duration_ms: u32, sample_period_ms: u32) -> Result<Self> {
        if sample_period_ms == 0 || max_duration_ms <= sample_period_ms {
            return Err(Error::InvalidMaxDuration);
        }

        let max_ticks = max_duration_ms / sample_period_ms;
        if max_ticks < 2 {
            return Err(Error::InvalidMaxDuration);
        }

        Ok(Self {
            history: STABLE_INACTIVE,
            elapsed: 0,
            max_ticks,
            sample_period_ms,
        })
    }

    /// 慢速探测发现按下时调用
    pub fn seed(&mut self) {
        self.elapsed = 1;
    }

    /// 移入一次采样
    pub fn update(&mut self, active: bool) -> Sample {
        self.history = ((self.history << 1) | active as u8) & HISTORY_MASK;

        match self.history {
            STABLE_ACTIVE => {
                // 超过最长时间后继续累加，直到松开才清零，
                // 这样松开时不会再次上报
                self.elapsed = self.elapsed.saturating_add(1);
                if self.elapsed == self.max_ticks {
                    Sample::MaxReached(self.event(PressKind::HeldMax))
                } else {
                    Sample::Held
                }
            }
            STABLE_INACTIVE => {
                let sample = if self.elapsed > 0 && self.elapsed < self.max_ticks {
                    Sample::Released(self.event(PressKind::Released))
                } else {
                    Sample::Idle
                };
                self.elapsed = 0;
                sample
            }
            _ => Sample::Settling,
        }
    }

    fn event(&self, kind: PressKind) -> PressEvent {
        PressEvent {
            kind,
            duration_ms: self.elapsed.saturating_mul(self.sample_period_ms),
        }
    }

    /// 最近 4 次采样
    pub fn history(&self) -> u8 {
        self.history
    }

    pub fn elapsed_ticks(&self) -> u32 {
        self.elapsed
    }

    pub fn max_ticks(&self) -> u32 {
        self.max_ticks
    }

    /// 最长时间，按采样周期取整
    pub fn max_duration_ms(&self) -> u32 {
        self.max_ticks * self.sample_period_ms
    }
}
