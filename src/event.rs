// 按压事件
//
// 按钮完成一次有效按压后，事件交给该按钮注册的处理器

use crate::error::{Error, Result};
use crate::input::InputInfo;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Sender;

/// 按压类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PressKind {
    /// 在最长时间之前松开，松开时上报
    Released,
    /// 按住达到最长时间，立即上报，松开时不再上报
    HeldMax,
}

/// 按压事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PressEvent {
    pub kind: PressKind,
    /// 按压时长，采样周期的整数倍
    pub duration_ms: u32,
}

/// 按压处理器
///
/// 在调度循环内被调用，必须尽快返回；耗时的工作应转交给其他任务
/// （见 [`PressForwarder`]）
pub trait PressHandler {
    fn on_press(&mut self, input: &InputInfo, press: PressEvent) -> Result<()>;
}

impl<F> PressHandler for F
where
    F: FnMut(&InputInfo, PressEvent) -> Result<()>,
{
    fn on_press(&mut self, input: &InputInfo, press: PressEvent) -> Result<()> {
        self(input, press)
    }
}

/// 通过通道转发的按压消息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonPress {
    pub input: InputInfo,
    pub press: PressEvent,
}

/// 把按压事件转发到通道的处理器
///
/// 不阻塞调度循环，通道满时返回 `Error::BufferFull`
pub struct PressForwarder<'ch, M: RawMutex, const N: usize> {
    sender: Sender<'ch, M, ButtonPress, N>,
}

impl<'ch, M: RawMutex, const N: usize> PressForwarder<'ch, M, N> {
    pub fn new(sender: Sender<'ch, M, ButtonPress, N>) -> Self {
        Self { sender }
    }
}

impl<M: RawMutex, const N: usize> PressHandler for PressForwarder<'_, M, N> {
    fn on_press(&mut self, input: &InputInfo, press: PressEvent) -> Result<()> {
        self.sender
            .try_send(ButtonPress {
                input: *input,
                press,
            })
            .map_err(|_| Error::BufferFull)
    }
}
