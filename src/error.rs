// 错误定义

/// 结果类型
pub type Result<T> = core::result::Result<T, Error>;

/// 错误类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// 最长按压时间不大于一个采样周期
    InvalidMaxDuration,
    /// 采样周期或心跳周期无效
    InvalidTiming,
    /// 缓冲区满（按钮数量超限或事件队列已满）
    BufferFull,
    /// 读取输入失败
    ReadFailure,
    /// 回调处理失败
    HandlerFailed,
}
