// 按钮调度任务
use button_press::PressScheduler;
use defmt::info;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

/// 最多按钮数量
pub const MAX_BUTTONS: usize = 4;

/// 按钮调度器
pub type Scheduler = PressScheduler<'static, MAX_BUTTONS>;

/// 停止信号
pub type StopSignal = Signal<CriticalSectionRawMutex, ()>;

/// 按钮任务
///
/// 运行调度循环，按压事件由各按钮的处理器转发到事件队列
#[embassy_executor::task]
pub async fn button_task(scheduler: &'static mut Scheduler, stop: &'static StopSignal) {
    info!("Button task started");

    scheduler.run(stop).await;

    info!("Button task stopped");
}
