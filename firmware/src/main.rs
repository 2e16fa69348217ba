#![no_std]
#![no_main]

mod handlers;
mod tasks;

use button_press::{
    DEFAULT_MAX_DURATION_MS, GpioInput, InputInfo, Polarity, PressForwarder, PressScheduler,
    TimingConfig,
};
use defmt::{info, unwrap};
use embassy_executor::Spawner;
use embassy_stm32::Config;
use embassy_stm32::gpio::{Input, Pull};
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use embassy_time::Timer;
use static_cell::StaticCell;
use tasks::button_task::{MAX_BUTTONS, Scheduler, StopSignal};
use tasks::dispatch_task::{PRESS_QUEUE_SIZE, PressChannel, PressMutex};
use {defmt_rtt as _, panic_probe as _};

type ButtonInput = GpioInput<Input<'static>>;
type Forwarder = PressForwarder<'static, PressMutex, PRESS_QUEUE_SIZE>;

const BUTTON_UP: InputInfo = InputInfo::new(3, "ButtonUp", Polarity::ActiveLow);
const BUTTON_DOWN: InputInfo = InputInfo::new(4, "ButtonDown", Polarity::ActiveLow);

static PRESS_CHANNEL: StaticCell<PressChannel> = StaticCell::new();
static UP_INPUT: StaticCell<ButtonInput> = StaticCell::new();
static DOWN_INPUT: StaticCell<ButtonInput> = StaticCell::new();
static UP_FORWARDER: StaticCell<Forwarder> = StaticCell::new();
static DOWN_FORWARDER: StaticCell<Forwarder> = StaticCell::new();
static SCHEDULER: StaticCell<Scheduler> = StaticCell::new();
static STOP: StopSignal = Signal::new();

/// 上下拉跟随有效电平：低有效用上拉，高有效用下拉
fn pull_for(polarity: Polarity) -> Pull {
    match polarity {
        Polarity::ActiveHigh => Pull::Down,
        Polarity::ActiveLow => Pull::Up,
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) -> ! {
    let config = Config::default();
    let p = embassy_stm32::init(config);

    info!("=== Button Press Monitor ===");
    info!("Initializing...");

    // 按压事件通道
    let press_channel = PRESS_CHANNEL.init(Channel::new());

    let up = UP_INPUT.init(GpioInput::new(
        Input::new(p.PE3, pull_for(BUTTON_UP.polarity)),
        BUTTON_UP,
    ));
    let down = DOWN_INPUT.init(GpioInput::new(
        Input::new(p.PE4, pull_for(BUTTON_DOWN.polarity)),
        BUTTON_DOWN,
    ));
    let up_forwarder = UP_FORWARDER.init(PressForwarder::new(press_channel.sender()));
    let down_forwarder = DOWN_FORWARDER.init(PressForwarder::new(press_channel.sender()));

    let scheduler = SCHEDULER.init(unwrap!(PressScheduler::new(TimingConfig::default())));
    unwrap!(scheduler.add_button(up, DEFAULT_MAX_DURATION_MS, up_forwarder));
    unwrap!(scheduler.add_button(down, DEFAULT_MAX_DURATION_MS, down_forwarder));

    info!("Buttons registered: {}", scheduler.len());

    // 启动所有任务
    info!("Spawning tasks...");

    spawner.spawn(tasks::button_task::button_task(scheduler, &STOP)).unwrap();
    info!("  - Button task spawned");

    spawner.spawn(tasks::dispatch_task::dispatch_task(press_channel.receiver())).unwrap();
    info!("  - Dispatch task spawned");

    info!("=== System ready ===");

    // 主任务空转
    loop {
        Timer::after_secs(60).await;
        info!("Main: System running...");
    }
}
