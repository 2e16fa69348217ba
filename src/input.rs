// 数字输入
use crate::error::{Error, Result};
use embedded_hal::digital::InputPin;

/// 有效电平
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// 高电平有效，配合下拉电阻
    ActiveHigh,
    /// 低电平有效，配合上拉电阻
    ActiveLow,
}

/// 输入标识
///
/// 构造后不再改变
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InputInfo {
    /// 引脚编号
    pub line: u8,
    /// 名称
    pub name: &'static str,
    /// 有效电平
    pub polarity: Polarity,
}

impl InputInfo {
    pub const fn new(line: u8, name: &'static str, polarity: Polarity) -> Self {
        Self {
            line,
            name,
            polarity,
        }
    }
}

/// 数字输入源
///
/// `is_active` 返回值已经按有效电平换算，`true` 表示按下
pub trait DigitalInput {
    /// 输入标识
    fn info(&self) -> InputInfo;

    /// 读取当前是否有效
    fn is_active(&mut self) -> Result<bool>;
}

/// 基于 embedded-hal 引脚的输入
///
/// 上下拉由创建引脚的一方配置
pub struct GpioInput<P> {
    pin: P,
    info: InputInfo,
}

impl<P: InputPin> GpioInput<P> {
    pub const fn new(pin: P, info: InputInfo) -> Self {
        Self { pin, info }
    }

    /// 取回引脚
    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: InputPin> DigitalInput for GpioInput<P> {
    fn info(&self) -> InputInfo {
        self.info
    }

    fn is_active(&mut self) -> Result<bool> {
        let level = match self.info.polarity {
            Polarity::ActiveHigh => self.pin.is_high(),
            Polarity::ActiveLow => self.pin.is_low(),
        };
        level.map_err(|_| Error::ReadFailure)
    }
}
