// 按钮调度器
//
// 空闲时按心跳周期慢速探测，发现任一按钮按下后切换到采样周期快速轮询，
// 直到所有按钮稳定松开再回到慢速探测。整个循环在同一个任务里顺序执行。

use crate::button::Button;
use crate::config::TimingConfig;
use crate::error::{Error, Result};
use crate::event::PressHandler;
use crate::input::DigitalInput;
use embassy_futures::select::{Either, select};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Timer};
use heapless::Vec;

/// 轮询模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// 心跳周期探测
    Slow,
    /// 采样周期轮询
    Fast,
}

/// 按钮调度器
///
/// 最多管理 `N` 个按钮，按注册顺序轮询和回调
pub struct PressScheduler<'a, const N: usize> {
    buttons: Vec<Button<'a>, N>,
    timing: TimingConfig,
    mode: Mode,
}

impl<'a, const N: usize> PressScheduler<'a, N> {
    /// 创建调度器
    pub fn new(timing: TimingConfig) -> Result<Self> {
        timing.validate()?;
        Ok(Self {
            buttons: Vec::new(),
            timing,
            mode: Mode::Slow,
        })
    }

    /// 注册按钮
    pub fn add_button(
        &mut self,
        input: &'a mut dyn DigitalInput,
        max_duration_ms: u32,
        handler: &'a mut dyn PressHandler,
    ) -> Result<()> {
        let info = input.info();
        let button = Button::new(input, handler, max_duration_ms, self.timing.sample_period_ms())
            .inspect_err(|_| {
                warn!("Invalid max duration {} ms for line {}", max_duration_ms, info.line);
            })?;

        if self.buttons.push(button).is_err() {
            warn!("Too many buttons, line {} not registered", info.line);
            return Err(Error::BufferFull);
        }

        info!(
            "Button registered: line={}, name={}, max={} ms",
            info.line, info.name, max_duration_ms
        );
        Ok(())
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn timing(&self) -> TimingConfig {
        self.timing
    }

    pub fn len(&self) -> usize {
        self.buttons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty()
    }

    pub fn buttons(&self) -> &[Button<'a>] {
        &self.buttons
    }

    /// 执行一轮，返回到下一轮的间隔
    pub fn tick(&mut self) -> Duration {
        match self.mode {
            Mode::Slow => self.check_buttons(),
            Mode::Fast => self.poll_buttons(),
        }

        match self.mode {
            Mode::Slow => self.timing.heartbeat_period,
            Mode::Fast => self.timing.sample_period,
        }
    }

    /// 慢速探测所有按钮
    fn check_buttons(&mut self) {
        let mut start_polling = false;

        // 每个按钮都要探测，按下的按钮需要记下探测到的这一次
        for button in self.buttons.iter_mut() {
            match button.quick_check() {
                Ok(true) => start_polling = true,
                Ok(false) => {}
                Err(e) => {
                    warn!("Quick check failed on line {}: {:?}", button.info().line, e);
                }
            }
        }

        if start_polling {
            debug!("Press detected, switching to fast polling");
            self.mode = Mode::Fast;
        }
    }

    /// 快速轮询所有按钮并分发事件
    fn poll_buttons(&mut self) {
        let mut keep_polling = false;

        for button in self.buttons.iter_mut() {
            let outcome = match button.poll() {
                Ok(outcome) => outcome,
                Err(e) => {
                    // 这一轮跳过，下一轮重试
                    warn!("Poll failed on line {}: {:?}", button.info().line, e);
                    keep_polling = true;
                    continue;
                }
            };

            keep_polling |= outcome.keep_polling;

            if let Some(press) = outcome.event {
                let info = button.info();
                info!(
                    "Button {} ({}) pressed: {:?}, {} ms",
                    info.line, info.name, press.kind, press.duration_ms
                );

                if let Err(e) = button.dispatch(press) {
                    error!("Press handler for line {} failed: {:?}", info.line, e);
                }
            }
        }

        if !keep_polling {
            debug!("All buttons released, back to slow polling");
            self.mode = Mode::Slow;
        }
    }

    /// 调度主循环
    ///
    /// 收到 `stop` 信号后在两轮之间退出，否则一直运行
    pub async fn run<M: RawMutex>(&mut self, stop: &Signal<M, ()>) {
        info!("Press scheduler started with {} buttons", self.buttons.len());

        loop {
            let delay = self.tick();

            if let Either::Second(()) = select(Timer::after(delay), stop.wait()).await {
                info!("Press scheduler stopped");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::button::tests::Line;
    use crate::event::{PressEvent, PressKind};
    use crate::input::{InputInfo, Polarity};
    use core::cell::RefCell;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

    const UP: InputInfo = InputInfo::new(15, "ButtonUp", Polarity::ActiveLow);
    const DOWN: InputInfo = InputInfo::new(16, "ButtonDown", Polarity::ActiveLow);

    type Log = RefCell<std::vec::Vec<(u8, PressEvent)>>;

    fn recorder(log: &Log) -> impl FnMut(&InputInfo, PressEvent) -> Result<()> + '_ {
        move |info: &InputInfo, press: PressEvent| {
            log.borrow_mut().push((info.line, press));
            Ok(())
        }
    }

    fn released(duration_ms: u32) -> PressEvent {
        PressEvent {
            kind: PressKind::Released,
            duration_ms,
        }
    }

    fn held_max(duration_ms: u32) -> PressEvent {
        PressEvent {
            kind: PressKind::HeldMax,
            duration_ms,
        }
    }

    /// 一直运行到回到慢速模式，返回执行的轮数
    fn run_until_slow<const N: usize>(scheduler: &mut PressScheduler<'_, N>) -> usize {
        for n in 1..=1000 {
            scheduler.tick();
            if scheduler.mode() == Mode::Slow {
                return n;
            }
        }
        panic!("scheduler never went back to slow polling");
    }

    #[test]
    fn idle_buttons_stay_in_slow_mode() {
        let line = Line::new(false);
        let mut input = line.input(UP);
        let log = Log::default();
        let mut handler = recorder(&log);

        let mut scheduler: PressScheduler<'_, 4> =
            PressScheduler::new(TimingConfig::default()).unwrap();
        scheduler.add_button(&mut input, 2000, &mut handler).unwrap();

        for _ in 0..10 {
            assert_eq!(scheduler.tick(), Duration::from_millis(100));
            assert_eq!(scheduler.mode(), Mode::Slow);
        }
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn press_switches_to_fast_polling_on_next_heartbeat() {
        let line = Line::new(false);
        let mut input = line.input(UP);
        let log = Log::default();
        let mut handler = recorder(&log);

        let mut scheduler: PressScheduler<'_, 4> =
            PressScheduler::new(TimingConfig::default()).unwrap();
        scheduler.add_button(&mut input, 2000, &mut handler).unwrap();

        assert_eq!(scheduler.tick(), Duration::from_millis(100));
        line.set(true);
        assert_eq!(scheduler.tick(), Duration::from_millis(10));
        assert_eq!(scheduler.mode(), Mode::Fast);
        assert_eq!(scheduler.buttons()[0].debouncer().elapsed_ticks(), 1);
    }

    #[test]
    fn short_press_reports_once_on_release() {
        let line = Line::new(true);
        let mut input = line.input(UP);
        let log = Log::default();
        let mut handler = recorder(&log);

        let mut scheduler: PressScheduler<'_, 4> =
            PressScheduler::new(TimingConfig::default()).unwrap();
        scheduler.add_button(&mut input, 2000, &mut handler).unwrap();

        scheduler.tick();
        assert_eq!(scheduler.mode(), Mode::Fast);

        // 探测之后按住 50 个采样周期，前 3 个用于消抖
        for _ in 0..50 {
            scheduler.tick();
        }
        assert!(log.borrow().is_empty());

        line.set(false);
        // 松开需要 4 个采样才稳定
        assert_eq!(run_until_slow(&mut scheduler), 4);
        assert_eq!(*log.borrow(), vec![(15, released(480))]);
        assert_eq!(scheduler.tick(), Duration::from_millis(100));
    }

    #[test]
    fn long_hold_reports_once_at_max_duration() {
        let line = Line::new(true);
        let mut input = line.input(UP);
        let log = Log::default();
        let mut handler = recorder(&log);

        let mut scheduler: PressScheduler<'_, 4> =
            PressScheduler::new(TimingConfig::default()).unwrap();
        scheduler.add_button(&mut input, 2000, &mut handler).unwrap();

        scheduler.tick();
        let mut reported_at = None;
        for n in 1..=250 {
            scheduler.tick();
            if reported_at.is_none() && !log.borrow().is_empty() {
                reported_at = Some(n);
            }
        }

        // 探测记 1 个采样，消抖占 3 次轮询，第 202 次轮询时达到 200
        assert_eq!(reported_at, Some(202));
        assert_eq!(*log.borrow(), vec![(15, held_max(2000))]);
        assert_eq!(scheduler.mode(), Mode::Fast);

        line.set(false);
        run_until_slow(&mut scheduler);
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn idle_button_does_not_fire_while_other_is_pressed() {
        let up_line = Line::new(false);
        let down_line = Line::new(false);
        let mut up = up_line.input(UP);
        let mut down = down_line.input(DOWN);
        let up_log = Log::default();
        let down_log = Log::default();
        let mut up_handler = recorder(&up_log);
        let mut down_handler = recorder(&down_log);

        let mut scheduler: PressScheduler<'_, 4> =
            PressScheduler::new(TimingConfig::default()).unwrap();
        scheduler.add_button(&mut up, 2000, &mut up_handler).unwrap();
        scheduler.add_button(&mut down, 2000, &mut down_handler).unwrap();

        down_line.set(true);
        scheduler.tick();
        assert_eq!(scheduler.mode(), Mode::Fast);

        for _ in 0..20 {
            scheduler.tick();
            assert_eq!(scheduler.mode(), Mode::Fast);
        }

        down_line.set(false);
        run_until_slow(&mut scheduler);

        assert!(up_log.borrow().is_empty());
        assert_eq!(*down_log.borrow(), vec![(16, released(180))]);
    }

    #[test]
    fn events_in_one_tick_follow_registration_order() {
        let line = Line::new(true);
        let mut up = line.input(UP);
        let mut down = line.input(DOWN);
        let log = Log::default();
        let mut up_handler = recorder(&log);
        let mut down_handler = recorder(&log);

        let mut scheduler: PressScheduler<'_, 4> =
            PressScheduler::new(TimingConfig::default()).unwrap();
        scheduler.add_button(&mut down, 2000, &mut down_handler).unwrap();
        scheduler.add_button(&mut up, 2000, &mut up_handler).unwrap();

        scheduler.tick();
        for _ in 0..10 {
            scheduler.tick();
        }
        line.set(false);
        run_until_slow(&mut scheduler);

        assert_eq!(*log.borrow(), vec![(16, released(80)), (15, released(80))]);
    }

    #[test]
    fn failing_handler_does_not_stop_other_buttons() {
        let line = Line::new(true);
        let mut up = line.input(UP);
        let mut down = line.input(DOWN);
        let log = Log::default();
        let mut failing = |_: &InputInfo, _: PressEvent| -> Result<()> { Err(Error::HandlerFailed) };
        let mut down_handler = recorder(&log);

        let mut scheduler: PressScheduler<'_, 4> =
            PressScheduler::new(TimingConfig::default()).unwrap();
        scheduler.add_button(&mut up, 2000, &mut failing).unwrap();
        scheduler.add_button(&mut down, 2000, &mut down_handler).unwrap();

        scheduler.tick();
        for _ in 0..5 {
            scheduler.tick();
        }
        line.set(false);
        run_until_slow(&mut scheduler);

        assert_eq!(*log.borrow(), vec![(16, released(30))]);
        assert_eq!(scheduler.mode(), Mode::Slow);
    }

    #[test]
    fn read_failure_skips_button_and_keeps_polling() {
        let line = Line::new(true);
        let mut input = line.input(UP);
        let log = Log::default();
        let mut handler = recorder(&log);

        let mut scheduler: PressScheduler<'_, 4> =
            PressScheduler::new(TimingConfig::default()).unwrap();
        scheduler.add_button(&mut input, 2000, &mut handler).unwrap();

        scheduler.tick();
        for _ in 0..5 {
            scheduler.tick();
        }

        line.set(false);
        line.break_line(true);
        for _ in 0..10 {
            assert_eq!(scheduler.tick(), Duration::from_millis(10));
        }
        assert_eq!(scheduler.buttons()[0].debouncer().elapsed_ticks(), 3);

        line.break_line(false);
        run_until_slow(&mut scheduler);
        assert_eq!(*log.borrow(), vec![(15, released(30))]);
    }

    #[test]
    fn read_failure_in_slow_mode_is_not_a_press() {
        let line = Line::new(true);
        line.break_line(true);
        let mut input = line.input(UP);
        let log = Log::default();
        let mut handler = recorder(&log);

        let mut scheduler: PressScheduler<'_, 4> =
            PressScheduler::new(TimingConfig::default()).unwrap();
        scheduler.add_button(&mut input, 2000, &mut handler).unwrap();

        assert_eq!(scheduler.tick(), Duration::from_millis(100));
        assert_eq!(scheduler.mode(), Mode::Slow);
        assert_eq!(line.reads(), 1);
    }

    #[test]
    fn probe_glitch_reports_single_tick() {
        let line = Line::new(true);
        let mut input = line.input(UP);
        let log = Log::default();
        let mut handler = recorder(&log);

        let mut scheduler: PressScheduler<'_, 4> =
            PressScheduler::new(TimingConfig::default()).unwrap();
        scheduler.add_button(&mut input, 2000, &mut handler).unwrap();

        scheduler.tick();
        line.set(false);

        // 历史全 0，第一次轮询就稳定松开，探测记下的 1 个采样被上报
        assert_eq!(run_until_slow(&mut scheduler), 1);
        assert_eq!(*log.borrow(), vec![(15, released(10))]);
    }

    #[test]
    fn registration_is_bounded() {
        let line = Line::new(false);
        let mut up = line.input(UP);
        let mut down = line.input(DOWN);
        let log = Log::default();
        let mut up_handler = recorder(&log);
        let mut down_handler = recorder(&log);

        let mut scheduler: PressScheduler<'_, 1> =
            PressScheduler::new(TimingConfig::default()).unwrap();
        scheduler.add_button(&mut up, 2000, &mut up_handler).unwrap();
        assert_eq!(
            scheduler.add_button(&mut down, 2000, &mut down_handler),
            Err(Error::BufferFull)
        );
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn registration_rejects_short_max_duration() {
        let line = Line::new(false);
        let mut input = line.input(UP);
        let log = Log::default();
        let mut handler = recorder(&log);

        let mut scheduler: PressScheduler<'_, 4> =
            PressScheduler::new(TimingConfig::default()).unwrap();
        assert_eq!(
            scheduler.add_button(&mut input, 10, &mut handler),
            Err(Error::InvalidMaxDuration)
        );
        assert!(scheduler.is_empty());
    }

    #[test]
    fn rejects_invalid_timing() {
        let timing = TimingConfig {
            sample_period: Duration::from_millis(100),
            heartbeat_period: Duration::from_millis(10),
        };
        assert!(matches!(
            PressScheduler::<'_, 4>::new(timing),
            Err(Error::InvalidTiming)
        ));
    }

    #[test]
    fn run_returns_after_stop_signal() {
        let line = Line::new(true);
        let mut input = line.input(UP);
        let log = Log::default();
        let mut handler = recorder(&log);

        let mut scheduler: PressScheduler<'_, 4> =
            PressScheduler::new(TimingConfig::default()).unwrap();
        scheduler.add_button(&mut input, 2000, &mut handler).unwrap();

        let stop: Signal<CriticalSectionRawMutex, ()> = Signal::new();
        stop.signal(());
        embassy_futures::block_on(scheduler.run(&stop));

        // 退出前完整执行了一轮
        assert_eq!(line.reads(), 1);
        assert_eq!(scheduler.mode(), Mode::Fast);
    }
}
