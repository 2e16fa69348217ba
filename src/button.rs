// 按钮：输入 + 消抖器 + 处理器
use crate::debounce::Debouncer;
use crate::error::Result;
use crate::event::{PressEvent, PressHandler};
use crate::input::{DigitalInput, InputInfo};

/// 一次快速轮询的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollOutcome {
    /// 是否还需要继续快速轮询
    pub keep_polling: bool,
    /// 需要上报的按压
    pub event: Option<PressEvent>,
}

/// 按钮
///
/// 输入和处理器由调用方持有，按钮只借用它们
pub struct Button<'a> {
    input: &'a mut dyn DigitalInput,
    handler: &'a mut dyn PressHandler,
    debouncer: Debouncer,
}

impl<'a> Button<'a> {
    pub fn new(
        input: &'a mut dyn DigitalInput,
        handler: &'a mut dyn PressHandler,
        max_duration_ms: u32,
        sample_period_ms: u32,
    ) -> Result<Self> {
        Ok(Self {
            input,
            handler,
            debouncer: Debouncer::new(max_duration_ms, sample_period_ms)?,
        })
    }

    pub fn info(&self) -> InputInfo {
        self.input.info()
    }

    pub fn debouncer(&self) -> &Debouncer {
        &self.debouncer
    }

    /// 慢速探测
    ///
    /// 不做消抖，只用来判断是否需要进入快速轮询。
    /// 按下时记 1 个采样并返回 `true`，否则不改变状态。
    pub fn quick_check(&mut self) -> Result<bool> {
        if self.input.is_active()? {
            self.debouncer.seed();
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// 快速轮询，每个采样周期调用一次
    pub fn poll(&mut self) -> Result<PollOutcome> {
        let active = self.input.is_active()?;
        let sample = self.debouncer.update(active);
        Ok(PollOutcome {
            keep_polling: sample.keep_polling(),
            event: sample.event(),
        })
    }

    /// 把按压交给处理器
    pub fn dispatch(&mut self, press: PressEvent) -> Result<()> {
        let info = self.input.info();
        self.handler.on_press(&info, press)
    }
}
