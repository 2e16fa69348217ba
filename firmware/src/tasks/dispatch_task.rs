// 事件分发任务
use crate::handlers;
use button_press::ButtonPress;
use defmt::{info, warn};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver};

/// 事件队列容量
pub const PRESS_QUEUE_SIZE: usize = 32;

pub type PressMutex = CriticalSectionRawMutex;

/// 按压事件通道
pub type PressChannel = Channel<PressMutex, ButtonPress, PRESS_QUEUE_SIZE>;

/// 事件分发任务
///
/// 从事件队列接收按压并交给处理器，耗时的工作放在这里，不占用调度循环
#[embassy_executor::task]
pub async fn dispatch_task(
    press_rx: Receiver<'static, PressMutex, ButtonPress, PRESS_QUEUE_SIZE>,
) -> ! {
    info!("Dispatch task started");

    loop {
        let press = press_rx.receive().await;

        if let Err(e) = handlers::on_button_press(&press) {
            warn!("Press handling failed: {:?}", e);
        }
    }
}
